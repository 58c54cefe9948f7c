//! Search, extraction and transcoding doubles.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::domain::ports::{
    AudioByteStream, MediaExtractor, MediaExtractorError, MediaSearch, MediaSearchError,
    RequestProfile, SourceStreamError, TranscodeError, TranscodeProfile, TranscodeSession,
    Transcoder,
};
use crate::domain::{AudioLocator, Candidate, MediaInfo, SearchQuery, VideoId};

/// Source stream replaying `items` in order.
pub fn source_stream(items: Vec<Result<Bytes, SourceStreamError>>) -> AudioByteStream {
    stream::iter(items).boxed()
}

/// Candidate with a title derived from the id.
pub fn candidate(id: &str) -> Candidate {
    Candidate::new(id, format!("Title {id}"), Some("Channel".to_owned()), Some(213), None)
}

/// Metadata for `id` pointing at a dummy download URL.
pub fn sample_info(id: &VideoId, title: Option<&str>) -> MediaInfo {
    MediaInfo {
        id: id.clone(),
        title: title.map(str::to_owned),
        author: Some("Channel".to_owned()),
        duration_seconds: Some(213),
        audio: AudioLocator {
            url: format!("https://media.invalid/{id}"),
            headers: Vec::new(),
            container: Some("webm".to_owned()),
            content_length: None,
        },
    }
}

/// Search double with a fixed answer.
pub struct StubSearch {
    outcome: Result<Vec<Candidate>, MediaSearchError>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl StubSearch {
    pub fn returning(results: Vec<Candidate>) -> Self {
        Self::with_outcome(Ok(results))
    }

    pub fn failing(error: MediaSearchError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<Vec<Candidate>, MediaSearchError>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        match self.queries.lock() {
            Ok(queries) => queries.clone(),
            Err(_) => panic!("queries mutex"),
        }
    }
}

#[async_trait]
impl MediaSearch for StubSearch {
    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<Candidate>, MediaSearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.queries.lock() {
            Ok(mut queries) => queries.push(query.as_str().to_owned()),
            Err(_) => panic!("queries mutex"),
        }
        self.outcome
            .clone()
            .map(|results| results.into_iter().take(limit).collect())
    }
}

/// Extraction double failing a configurable number of metadata fetches.
pub struct StubExtractor {
    title: Option<String>,
    failures_before_success: usize,
    fetch_error: MediaExtractorError,
    audio: Vec<Result<Bytes, SourceStreamError>>,
    open_error: Option<MediaExtractorError>,
    fetches: Mutex<Vec<(String, String)>>,
}

impl StubExtractor {
    /// Succeeds on the first fetch and serves `audio` as the source.
    pub fn serving(title: Option<&str>, audio: Vec<Result<Bytes, SourceStreamError>>) -> Self {
        Self {
            title: title.map(str::to_owned),
            failures_before_success: 0,
            fetch_error: MediaExtractorError::transport("unused"),
            audio,
            open_error: None,
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// Fails the first `failures` fetches with `error`.
    #[must_use]
    pub fn failing_first(mut self, failures: usize, error: MediaExtractorError) -> Self {
        self.failures_before_success = failures;
        self.fetch_error = error;
        self
    }

    /// Fails every fetch with `error`.
    #[must_use]
    pub fn always_failing(self, error: MediaExtractorError) -> Self {
        self.failing_first(usize::MAX, error)
    }

    /// Fails `open_audio` with `error`.
    #[must_use]
    pub fn open_failing(mut self, error: MediaExtractorError) -> Self {
        self.open_error = Some(error);
        self
    }

    /// `(id, profile name)` of every fetch, in order.
    pub fn fetches(&self) -> Vec<(String, String)> {
        match self.fetches.lock() {
            Ok(fetches) => fetches.clone(),
            Err(_) => panic!("fetches mutex"),
        }
    }
}

#[async_trait]
impl MediaExtractor for StubExtractor {
    async fn fetch_info(
        &self,
        id: &VideoId,
        profile: &RequestProfile,
    ) -> Result<MediaInfo, MediaExtractorError> {
        let attempt = match self.fetches.lock() {
            Ok(mut fetches) => {
                fetches.push((id.as_str().to_owned(), profile.name().to_owned()));
                fetches.len()
            }
            Err(_) => panic!("fetches mutex"),
        };
        if attempt <= self.failures_before_success {
            return Err(self.fetch_error.clone());
        }
        Ok(sample_info(id, self.title.as_deref()))
    }

    async fn open_audio(
        &self,
        _info: &MediaInfo,
        _profile: &RequestProfile,
    ) -> Result<AudioByteStream, MediaExtractorError> {
        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }
        Ok(source_stream(self.audio.clone()))
    }
}

/// Transcoder whose output ignores its input and replays a script.
pub struct ScriptedTranscoder {
    outcome: Result<Vec<Result<Bytes, TranscodeError>>, TranscodeError>,
}

impl ScriptedTranscoder {
    pub fn emitting(output: Vec<Result<Bytes, TranscodeError>>) -> Self {
        Self { outcome: Ok(output) }
    }

    pub fn refusing(error: TranscodeError) -> Self {
        Self {
            outcome: Err(error),
        }
    }
}

#[async_trait]
impl Transcoder for ScriptedTranscoder {
    async fn start(&self, _profile: &TranscodeProfile) -> Result<TranscodeSession, TranscodeError> {
        let output = self.outcome.clone()?;
        Ok(TranscodeSession {
            input: Box::pin(tokio::io::sink()),
            output: stream::iter(output).boxed(),
        })
    }
}

/// Transcoder that copies its input to its output unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTranscoder;

#[async_trait]
impl Transcoder for EchoTranscoder {
    async fn start(&self, _profile: &TranscodeProfile) -> Result<TranscodeSession, TranscodeError> {
        let (writer, reader) = tokio::io::duplex(64 * 1024);
        Ok(TranscodeSession {
            input: Box::pin(writer),
            output: read_chunks(reader),
        })
    }
}

fn read_chunks<R>(reader: R) -> BoxStream<'static, Result<Bytes, TranscodeError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    stream::unfold(Some(reader), |reader| async move {
        let mut reader = reader?;
        let mut buf = BytesMut::with_capacity(8 * 1024);
        match reader.read_buf(&mut buf).await {
            Ok(0) => None,
            Ok(_) => Some((Ok(buf.freeze()), Some(reader))),
            Err(error) => Some((Err(TranscodeError::io(error.to_string())), None)),
        }
    })
    .boxed()
}
