//! yt-dlp backed search and extraction adapters.
//!
//! Search and metadata go through the yt-dlp binary (`--dump-json`); the
//! audio itself is downloaded over HTTP from the direct format URL yt-dlp
//! reports, so the proxy never buffers a whole file.

mod command;
mod dto;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use self::command::{CommandFailure, preview, run};
use self::dto::{SearchEntryDto, VideoInfoDto};
use crate::domain::ports::{
    AudioByteStream, MediaExtractor, MediaExtractorError, MediaSearch, MediaSearchError,
    RequestProfile, SourceStreamError,
};
use crate::domain::{Candidate, MediaInfo, SearchQuery, VideoId};

/// Format selector preferring audio-only streams.
const AUDIO_FORMAT: &str = "bestaudio[vcodec=none]/bestaudio";

/// yt-dlp adapter implementing both [`MediaSearch`] and [`MediaExtractor`].
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    client: Client,
}

impl YtDlp {
    /// Build an adapter invoking `binary`; audio downloads give up on
    /// connecting after `connect_timeout`.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(binary: impl Into<PathBuf>, connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self {
            binary: binary.into(),
            client,
        })
    }
}

#[async_trait]
impl MediaSearch for YtDlp {
    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<Candidate>, MediaSearchError> {
        let stdout = run(&self.binary, search_args(query, limit))
            .await
            .map_err(|failure| MediaSearchError::backend(failure.describe()))?;
        let candidates = parse_search_output(&stdout)?;
        info!(query = %query, results = candidates.len(), "search completed");
        Ok(candidates.into_iter().take(limit).collect())
    }
}

#[async_trait]
impl MediaExtractor for YtDlp {
    async fn fetch_info(
        &self,
        id: &VideoId,
        profile: &RequestProfile,
    ) -> Result<MediaInfo, MediaExtractorError> {
        let stdout = run(&self.binary, info_args(id, profile))
            .await
            .map_err(map_command_failure)?;
        let dto: VideoInfoDto = serde_json::from_slice(&stdout).map_err(|error| {
            MediaExtractorError::decode(format!("invalid yt-dlp JSON payload: {error}"))
        })?;
        let info = dto
            .into_media_info(id)
            .map_err(MediaExtractorError::no_audio_format)?;
        debug!(
            video_id = %id,
            container = info.audio.container.as_deref().unwrap_or("unknown"),
            "media info resolved"
        );
        Ok(info)
    }

    async fn open_audio(
        &self,
        info: &MediaInfo,
        profile: &RequestProfile,
    ) -> Result<AudioByteStream, MediaExtractorError> {
        let headers = header_map(profile.headers().iter().chain(info.audio.headers.iter()));
        let response = self
            .client
            .get(info.audio.url.as_str())
            .headers(headers)
            .send()
            .await
            .map_err(|error| MediaExtractorError::transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(map_status_error(status, &body));
        }
        debug!(
            video_id = %info.id,
            content_length = ?response.content_length().or(info.audio.content_length),
            "audio download opened"
        );
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|error| SourceStreamError::transport(error.to_string())))
            .boxed())
    }
}

fn search_args(query: &SearchQuery, limit: usize) -> Vec<String> {
    vec![
        "--dump-json".to_owned(),
        "--flat-playlist".to_owned(),
        "--no-warnings".to_owned(),
        "--skip-download".to_owned(),
        format!("ytsearch{limit}:{query}"),
    ]
}

fn info_args(id: &VideoId, profile: &RequestProfile) -> Vec<String> {
    let mut args = vec![
        "--dump-json".to_owned(),
        "--no-playlist".to_owned(),
        "--no-warnings".to_owned(),
        "-f".to_owned(),
        AUDIO_FORMAT.to_owned(),
    ];
    for (name, value) in profile.headers() {
        args.push("--add-header".to_owned());
        args.push(format!("{name}:{value}"));
    }
    args.push("--".to_owned());
    args.push(id.watch_url());
    args
}

fn parse_search_output(stdout: &[u8]) -> Result<Vec<Candidate>, MediaSearchError> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str::<SearchEntryDto>(line).map_err(|error| {
                MediaSearchError::decode(format!("invalid yt-dlp search line: {error}"))
            })
        })
        .filter_map(|entry| entry.map(SearchEntryDto::into_candidate).transpose())
        .collect()
}

/// Later pairs replace earlier ones with the same name.
fn header_map<'a, I>(pairs: I) -> HeaderMap
where
    I: IntoIterator<Item = &'a (String, String)>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => debug!(header = %name, "skipping unrepresentable header"),
        }
    }
    headers
}

fn map_command_failure(failure: CommandFailure) -> MediaExtractorError {
    if failure.is_unavailable() {
        MediaExtractorError::unavailable(failure.describe())
    } else {
        MediaExtractorError::transport(failure.describe())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> MediaExtractorError {
    let body_preview = preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::GONE => {
            MediaExtractorError::unavailable(message)
        }
        _ => MediaExtractorError::transport(message),
    }
}
