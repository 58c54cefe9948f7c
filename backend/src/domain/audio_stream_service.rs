//! Audio streaming use case.
//!
//! One parametrised flow serves every stream route: resolve an identifier,
//! fetch metadata under the retry policy, open the upstream audio, start a
//! transcoder and hand both to the [`StreamPipeline`]. Routes differ only in
//! the [`StreamRoute`] they pass.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::{MediaExtractor, RequestProfile, TranscodeProfile, Transcoder};
use crate::domain::{
    AudioResponse, Error, ResponseFraming, Retrier, SearchQuery, SearchService, StreamPipeline,
    VideoId, sanitize_filename,
};

/// Title used when the upstream reports none.
pub const DEFAULT_FALLBACK_TITLE: &str = "unknown";

/// Per-route parameters of the streaming flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRoute {
    name: String,
    request_profile: RequestProfile,
    failure_hint: Option<String>,
    fallback_title: String,
    pinned_video: Option<VideoId>,
}

impl StreamRoute {
    /// Route resolving `id` or `q` with the given upstream headers.
    pub fn new(name: impl Into<String>, request_profile: RequestProfile) -> Self {
        Self {
            name: name.into(),
            request_profile,
            failure_hint: None,
            fallback_title: DEFAULT_FALLBACK_TITLE.to_owned(),
            pinned_video: None,
        }
    }

    /// Replace the metadata failure `detail` with a fixed hint.
    #[must_use]
    pub fn with_failure_hint(mut self, hint: impl Into<String>) -> Self {
        self.failure_hint = Some(hint.into());
        self
    }

    /// Title used in the attachment name when the upstream has none.
    #[must_use]
    pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
        self.fallback_title = title.into();
        self
    }

    /// Ignore request parameters and always stream `id`.
    #[must_use]
    pub fn pinned_to(mut self, id: VideoId) -> Self {
        self.pinned_video = Some(id);
        self
    }

    /// Route name for log lines.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Upstream header profile.
    pub fn request_profile(&self) -> &RequestProfile {
        &self.request_profile
    }

    /// Fixed metadata failure hint, if any.
    pub fn failure_hint(&self) -> Option<&str> {
        self.failure_hint.as_deref()
    }

    /// Attachment name fallback.
    pub fn fallback_title(&self) -> &str {
        self.fallback_title.as_str()
    }

    /// Identifier streamed regardless of parameters.
    pub fn pinned_video(&self) -> Option<&VideoId> {
        self.pinned_video.as_ref()
    }
}

/// Raw query parameters of a stream request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamRequest {
    /// Media identifier; takes precedence over `q`.
    pub id: Option<String>,
    /// Free-text query resolved through search.
    pub q: Option<String>,
}

/// Orchestrates search, extraction and transcoding for one request.
#[derive(Clone)]
pub struct AudioStreamService {
    search: SearchService,
    extractor: Arc<dyn MediaExtractor>,
    transcoder: Arc<dyn Transcoder>,
    retrier: Retrier,
    profile: TranscodeProfile,
}

impl AudioStreamService {
    /// Wire the service to its collaborators.
    pub fn new(
        search: SearchService,
        extractor: Arc<dyn MediaExtractor>,
        transcoder: Arc<dyn Transcoder>,
        retrier: Retrier,
        profile: TranscodeProfile,
    ) -> Self {
        Self {
            search,
            extractor,
            transcoder,
            retrier,
            profile,
        }
    }

    /// Stream transcoded audio for `request` along `route`.
    ///
    /// # Errors
    /// Returns a structured error for every failure observed before the
    /// first encoded byte; later failures abort the returned body instead.
    pub async fn stream(
        &self,
        route: &StreamRoute,
        request: StreamRequest,
    ) -> Result<AudioResponse, Error> {
        let id = self.resolve(route, request).await?;
        info!(route = route.name(), video_id = %id, "streaming audio");

        let profile = route.request_profile();
        let media = self
            .retrier
            .run("fetch media info", || self.extractor.fetch_info(&id, profile))
            .await
            .map_err(|error| {
                warn!(route = route.name(), video_id = %id, error = %error, "media info unavailable");
                let detail = route
                    .failure_hint()
                    .map_or_else(|| error.to_string(), str::to_owned);
                Error::upstream_fetch_failed("failed to get video info from upstream")
                    .with_detail(detail)
            })?;

        let framing = ResponseFraming {
            content_type: self.profile.content_type(),
            filename: self.filename(media.title_or(route.fallback_title()), route),
        };

        let source = self
            .extractor
            .open_audio(&media, profile)
            .await
            .map_err(|error| {
                Error::upstream_stream_failed("error fetching media from upstream")
                    .with_detail(error.to_string())
            })?;
        let session = self.transcoder.start(&self.profile).await.map_err(|error| {
            Error::transcode_failed("transcoding failed").with_detail(error.to_string())
        })?;

        StreamPipeline::new(source, session, framing).start().await
    }

    async fn resolve(&self, route: &StreamRoute, request: StreamRequest) -> Result<VideoId, Error> {
        if let Some(pinned) = route.pinned_video() {
            return Ok(pinned.clone());
        }
        let StreamRequest { id, q } = request;
        let id = id.filter(|raw| !raw.is_empty());
        let query = q.as_deref().and_then(|raw| SearchQuery::parse(raw).ok());

        let raw = match (id, query) {
            (Some(id), _) => id,
            (None, Some(query)) => {
                let candidate = self
                    .search
                    .first_candidate(&query)
                    .await
                    .map_err(|error| {
                        Error::upstream_fetch_failed("search failed").with_detail(error.to_string())
                    })?
                    .ok_or_else(|| Error::not_found("no video found for query"))?;
                info!(route = route.name(), query = %query, video_id = %candidate.id, "resolved query");
                candidate.id
            }
            (None, None) => return Err(Error::invalid_request("missing id or q param")),
        };

        VideoId::parse(&raw).map_err(|error| {
            warn!(route = route.name(), raw_id = %raw, "invalid video id");
            Error::invalid_request("invalid video id").with_detail(error.to_string())
        })
    }

    fn filename(&self, title: &str, route: &StreamRoute) -> String {
        let mut stem = sanitize_filename(title);
        if stem.trim().is_empty() {
            stem = sanitize_filename(route.fallback_title());
        }
        format!("{stem}.{}", self.profile.extension())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use futures_util::StreamExt;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::domain::ports::{
        DisabledSearchCache, MediaExtractorError, MediaSearch, MediaSearchError,
        MockMediaExtractor, SourceStreamError, TranscodeError,
    };
    use crate::domain::{ErrorCode, RetryPolicy};
    use crate::test_support::{
        EchoTranscoder, RecordingSleeper, ScriptedTranscoder, StubExtractor, StubSearch, candidate,
        sample_info, source_stream,
    };

    const ID: &str = "dQw4w9WgXcQ";

    struct Harness {
        search: Arc<StubSearch>,
        extractor: Arc<StubExtractor>,
        sleeper: Arc<RecordingSleeper>,
        service: AudioStreamService,
    }

    fn harness_with(
        search: StubSearch,
        extractor: StubExtractor,
        transcoder: Arc<dyn Transcoder>,
    ) -> Harness {
        let search = Arc::new(search);
        let extractor = Arc::new(extractor);
        let sleeper = Arc::new(RecordingSleeper::default());
        let retrier = Retrier::with_sleeper(RetryPolicy::default(), sleeper.clone());
        let search_backend: Arc<dyn MediaSearch> = search.clone();
        let service = AudioStreamService::new(
            SearchService::new(search_backend, Arc::new(DisabledSearchCache), 5),
            extractor.clone(),
            transcoder,
            retrier,
            TranscodeProfile::default(),
        );
        Harness {
            search,
            extractor,
            sleeper,
            service,
        }
    }

    fn audio() -> Vec<Result<Bytes, SourceStreamError>> {
        vec![Ok(Bytes::from_static(b"audio-bytes"))]
    }

    #[fixture]
    fn route() -> StreamRoute {
        StreamRoute::new("stream", RequestProfile::browser())
    }

    fn by_id(id: &str) -> StreamRequest {
        StreamRequest {
            id: Some(id.to_owned()),
            q: None,
        }
    }

    fn by_query(q: &str) -> StreamRequest {
        StreamRequest {
            id: None,
            q: Some(q.to_owned()),
        }
    }

    async fn body_bytes(response: AudioResponse) -> Vec<u8> {
        response
            .into_body()
            .map(|item| item.expect("no abort"))
            .collect::<Vec<_>>()
            .await
            .concat()
    }

    #[rstest]
    #[tokio::test]
    async fn missing_parameters_are_rejected(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(Some("Song"), audio()),
            Arc::new(EchoTranscoder),
        );

        let err = h
            .service
            .stream(&route, by_query("   "))
            .await
            .expect_err("blank query rejected");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "missing id or q param");
        assert_eq!(h.search.calls(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_id_is_rejected_without_fetching(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(Some("Song"), audio()),
            Arc::new(EchoTranscoder),
        );

        let err = h
            .service
            .stream(&route, by_id("not-an-id"))
            .await
            .expect_err("invalid id rejected");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "invalid video id");
        assert!(h.extractor.fetches().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn query_resolves_first_candidate(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(vec![candidate(ID), candidate("OXm4-3Er8po")]),
            StubExtractor::serving(Some("Song / Title: Live! (2024)"), audio()),
            Arc::new(EchoTranscoder),
        );

        let response = h
            .service
            .stream(&route, by_query("  artist title "))
            .await
            .expect("streams");

        assert_eq!(h.search.queries(), vec!["artist title".to_owned()]);
        assert_eq!(h.extractor.fetches(), vec![(ID.to_owned(), "browser".to_owned())]);
        assert_eq!(response.framing().filename, "Song  Title Live (2024).mp3");
        assert_eq!(response.framing().content_type, "audio/mpeg");
        assert_eq!(body_bytes(response).await, b"audio-bytes");
    }

    #[rstest]
    #[tokio::test]
    async fn id_takes_precedence_over_query(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(vec![candidate("OXm4-3Er8po")]),
            StubExtractor::serving(Some("Song"), audio()),
            Arc::new(EchoTranscoder),
        );
        let request = StreamRequest {
            id: Some(ID.to_owned()),
            q: Some("ignored".to_owned()),
        };

        h.service.stream(&route, request).await.expect("streams");

        assert_eq!(h.search.calls(), 0);
        assert_eq!(h.extractor.fetches()[0].0, ID);
    }

    #[rstest]
    #[tokio::test]
    async fn empty_search_is_not_found(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(Some("Song"), audio()),
            Arc::new(EchoTranscoder),
        );

        let err = h
            .service
            .stream(&route, by_query("nothing"))
            .await
            .expect_err("not found");

        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.message(), "no video found for query");
    }

    #[rstest]
    #[tokio::test]
    async fn search_failure_is_upstream_fetch_failure(route: StreamRoute) {
        let h = harness_with(
            StubSearch::failing(MediaSearchError::backend("yt-dlp exited with status 1")),
            StubExtractor::serving(Some("Song"), audio()),
            Arc::new(EchoTranscoder),
        );

        let err = h
            .service
            .stream(&route, by_query("song"))
            .await
            .expect_err("search fails");

        assert_eq!(err.code(), ErrorCode::UpstreamFetchFailed);
        assert!(err.detail().is_some_and(|d| d.contains("status 1")));
    }

    #[rstest]
    #[tokio::test]
    async fn metadata_recovers_within_retry_budget(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(Some("Song"), audio())
                .failing_first(2, MediaExtractorError::unavailable("HTTP 429")),
            Arc::new(EchoTranscoder),
        );

        h.service.stream(&route, by_id(ID)).await.expect("third attempt succeeds");

        assert_eq!(h.extractor.fetches().len(), 3);
        assert_eq!(
            h.sleeper.recorded(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn exhausted_metadata_retries_surface_last_cause(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(Some("Song"), audio())
                .always_failing(MediaExtractorError::unavailable("HTTP 429")),
            Arc::new(EchoTranscoder),
        );

        let err = h
            .service
            .stream(&route, by_id(ID))
            .await
            .expect_err("all attempts fail");

        assert_eq!(err.code(), ErrorCode::UpstreamFetchFailed);
        assert_eq!(err.message(), "failed to get video info from upstream");
        assert_eq!(err.detail(), Some("media unavailable: HTTP 429"));
        assert_eq!(h.extractor.fetches().len(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn failure_hint_replaces_detail() {
        let route = StreamRoute::new("stream-alt", RequestProfile::browser_with_client_hints())
            .with_failure_hint("try again later");
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(Some("Song"), audio())
                .always_failing(MediaExtractorError::unavailable("sign in to confirm")),
            Arc::new(EchoTranscoder),
        );

        let err = h
            .service
            .stream(&route, by_id(ID))
            .await
            .expect_err("fails");

        assert_eq!(err.detail(), Some("try again later"));
        assert!(
            h.extractor
                .fetches()
                .iter()
                .all(|(_, profile)| profile == "browser-client-hints")
        );
    }

    #[rstest]
    #[tokio::test]
    async fn pinned_route_ignores_parameters() {
        let pinned = VideoId::parse("OXm4-3Er8po").expect("valid id");
        let route = StreamRoute::new("stream-fixed", RequestProfile::browser())
            .pinned_to(pinned)
            .with_fallback_title("fixed-track");
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(None, audio()),
            Arc::new(EchoTranscoder),
        );

        let response = h
            .service
            .stream(&route, StreamRequest::default())
            .await
            .expect("streams");

        assert_eq!(h.extractor.fetches()[0].0, "OXm4-3Er8po");
        assert_eq!(response.framing().filename, "fixed-track.mp3");
    }

    #[rstest]
    #[tokio::test]
    async fn title_whitespace_is_kept_in_filename(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(Some("  Song "), audio()),
            Arc::new(EchoTranscoder),
        );

        let response = h.service.stream(&route, by_id(ID)).await.expect("streams");

        assert_eq!(response.framing().filename, "  Song .mp3");
    }

    #[rstest]
    #[tokio::test]
    async fn unprintable_title_uses_fallback(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(Some("日本語"), audio()),
            Arc::new(EchoTranscoder),
        );

        let response = h.service.stream(&route, by_id(ID)).await.expect("streams");

        assert_eq!(response.framing().filename, "unknown.mp3");
    }

    #[rstest]
    #[tokio::test]
    async fn open_failure_is_upstream_stream_failure(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(Some("Song"), audio())
                .open_failing(MediaExtractorError::transport("HTTP 403")),
            Arc::new(EchoTranscoder),
        );

        let err = h
            .service
            .stream(&route, by_id(ID))
            .await
            .expect_err("open fails");

        assert_eq!(err.code(), ErrorCode::UpstreamStreamFailed);
    }

    #[rstest]
    #[tokio::test]
    async fn transcoder_refusal_is_transcode_failure(route: StreamRoute) {
        let h = harness_with(
            StubSearch::returning(Vec::new()),
            StubExtractor::serving(Some("Song"), audio()),
            Arc::new(ScriptedTranscoder::refusing(TranscodeError::unavailable(
                "all transcoder slots busy",
            ))),
        );

        let err = h
            .service
            .stream(&route, by_id(ID))
            .await
            .expect_err("no transcoder");

        assert_eq!(err.code(), ErrorCode::TranscodeFailed);
        assert!(err.detail().is_some_and(|d| d.contains("slots busy")));
    }

    #[rstest]
    #[tokio::test]
    async fn download_uses_the_route_request_profile() {
        let route = StreamRoute::new("stream-alt", RequestProfile::browser_with_client_hints());
        let mut extractor = MockMediaExtractor::new();
        extractor
            .expect_fetch_info()
            .times(1)
            .returning(|id, _| Ok(sample_info(id, Some("Song"))));
        extractor
            .expect_open_audio()
            .withf(|_, profile| profile.name() == "browser-client-hints")
            .times(1)
            .returning(|_, _| Ok(source_stream(audio())));
        let search_backend: Arc<dyn MediaSearch> = Arc::new(StubSearch::returning(Vec::new()));
        let service = AudioStreamService::new(
            SearchService::new(search_backend, Arc::new(DisabledSearchCache), 5),
            Arc::new(extractor),
            Arc::new(EchoTranscoder),
            Retrier::with_sleeper(RetryPolicy::default(), Arc::new(RecordingSleeper::default())),
            TranscodeProfile::default(),
        );

        let response = service.stream(&route, by_id(ID)).await.expect("streams");

        assert_eq!(body_bytes(response).await, b"audio-bytes");
    }
}
