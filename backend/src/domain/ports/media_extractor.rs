//! Driven port mapping an identifier to metadata and an audio byte stream.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use super::define_port_error;
use crate::domain::{MediaInfo, VideoId};

define_port_error! {
    /// Errors surfaced while resolving or opening a media item.
    pub enum MediaExtractorError {
        /// The extractor could not be run or reached.
        Transport => "extraction transport failed",
        /// The upstream refused or does not have the item.
        Unavailable => "media unavailable",
        /// The extractor answered with an undecodable payload.
        Decode => "extraction output decode failed",
        /// The item has no downloadable audio format.
        NoAudioFormat => "no audio format available",
    }
}

define_port_error! {
    /// Failures of an already opened audio stream.
    pub enum SourceStreamError {
        /// The download broke mid-transfer.
        Transport => "upstream stream broke",
    }
}

/// Audio elementary stream as produced by the extractor.
pub type AudioByteStream = BoxStream<'static, Result<Bytes, SourceStreamError>>;

/// Named set of HTTP headers sent to the upstream when resolving and
/// downloading media.
///
/// The header set is deployment configuration, not protocol: upstreams change
/// what they accept, so routes carry whichever profile currently works.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestProfile {
    name: String,
    headers: Vec<(String, String)>,
}

impl RequestProfile {
    /// Build a profile from header pairs.
    pub fn new(name: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            headers,
        }
    }

    /// Desktop browser headers used by the default route.
    pub fn browser() -> Self {
        Self::new(
            "browser",
            vec![
                header(
                    "User-Agent",
                    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
                ),
                header(
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                ),
                header("Accept-Language", "en-US,en;q=0.9"),
                header("Upgrade-Insecure-Requests", "1"),
            ],
        )
    }

    /// Browser headers plus referer and web-client identification.
    pub fn browser_with_client_hints() -> Self {
        let mut profile = Self::browser();
        profile.name = "browser-client-hints".to_owned();
        profile.headers.extend([
            header("Referer", "https://www.youtube.com/"),
            header("X-YouTube-Client-Name", "1"),
            header("X-YouTube-Client-Version", "2.20210721.00.00"),
        ]);
        profile
    }

    /// Profile name for log lines.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Header pairs in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

fn header(name: &str, value: &str) -> (String, String) {
    (name.to_owned(), value.to_owned())
}

/// Media extraction capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Resolve metadata and the audio download location for `id`.
    async fn fetch_info(
        &self,
        id: &VideoId,
        profile: &RequestProfile,
    ) -> Result<MediaInfo, MediaExtractorError>;

    /// Open the audio elementary stream described by `info`.
    async fn open_audio(
        &self,
        info: &MediaInfo,
        profile: &RequestProfile,
    ) -> Result<AudioByteStream, MediaExtractorError>;
}
