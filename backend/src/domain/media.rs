//! Media identifiers, search candidates and response naming helpers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const VIDEO_ID_LEN: usize = 11;
const FILENAME_MAX_CHARS: usize = 200;
const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Opaque token naming one media item on the extraction service.
///
/// ## Invariants
/// - exactly eleven characters drawn from `[A-Za-z0-9_-]`.
///
/// # Examples
/// ```
/// use audio_proxy::domain::VideoId;
///
/// let id = VideoId::parse("dQw4w9WgXcQ").expect("valid id");
/// assert_eq!(id.as_str(), "dQw4w9WgXcQ");
/// assert!(VideoId::parse("not an id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

/// Reasons an identifier is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoIdValidationError {
    /// Identifier is empty.
    #[error("video id must not be empty")]
    Empty,
    /// Identifier does not have the expected length.
    #[error("video id must be 11 characters, got {0}")]
    Length(usize),
    /// Identifier contains characters outside `[A-Za-z0-9_-]`.
    #[error("video id contains invalid characters")]
    InvalidCharacters,
}

impl VideoId {
    /// Validate a raw identifier.
    pub fn parse(raw: &str) -> Result<Self, VideoIdValidationError> {
        if raw.is_empty() {
            return Err(VideoIdValidationError::Empty);
        }
        let length = raw.chars().count();
        if length != VIDEO_ID_LEN {
            return Err(VideoIdValidationError::Length(length));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(VideoIdValidationError::InvalidCharacters);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Canonical watch page URL for the identifier.
    pub fn watch_url(&self) -> String {
        format!("{WATCH_URL_PREFIX}{}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Free-text search query, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchQuery(String);

/// Reasons a query is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchQueryValidationError {
    /// Query is empty once trimmed.
    #[error("search query must not be empty")]
    Empty,
}

impl SearchQuery {
    /// Trim and validate a raw query.
    pub fn parse(raw: &str) -> Result<Self, SearchQueryValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SearchQueryValidationError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the trimmed query text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Key under which results for this query are cached.
    pub fn cache_key(&self) -> String {
        format!("search:{}", self.0)
    }
}

impl std::fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Media identifier, as reported by the search backend.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Channel or uploader name.
    pub author: Option<String>,
    /// Duration in whole seconds.
    pub seconds: Option<u64>,
    /// Duration rendered as `m:ss` or `h:mm:ss`.
    pub timestamp: Option<String>,
    /// Watch page URL.
    pub url: String,
    /// Thumbnail image URL.
    pub thumbnail: Option<String>,
}

impl Candidate {
    /// Build a candidate, deriving `url` and `timestamp` from the other fields.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: Option<String>,
        seconds: Option<u64>,
        thumbnail: Option<String>,
    ) -> Self {
        let id = id.into();
        Self {
            url: format!("{WATCH_URL_PREFIX}{id}"),
            id,
            title: title.into(),
            author,
            timestamp: seconds.map(format_timestamp),
            seconds,
            thumbnail,
        }
    }
}

/// Where the audio elementary stream of a media item can be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioLocator {
    /// Direct download URL of the audio-only format.
    pub url: String,
    /// Headers the extraction service requires on the download request.
    pub headers: Vec<(String, String)>,
    /// Container MIME type or extension reported by the extractor.
    pub container: Option<String>,
    /// Size of the download in bytes, when known.
    pub content_length: Option<u64>,
}

/// Metadata and audio location for one media item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    /// Identifier the metadata belongs to.
    pub id: VideoId,
    /// Display title, when the extractor reports one.
    pub title: Option<String>,
    /// Channel or uploader name.
    pub author: Option<String>,
    /// Duration in whole seconds.
    pub duration_seconds: Option<u64>,
    /// Location of the audio elementary stream.
    pub audio: AudioLocator,
}

impl MediaInfo {
    /// Title to name the response after, or `fallback` when none is usable.
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(fallback)
    }
}

/// Strip every character outside `[A-Za-z0-9_\-.()\[\] ]` and cap the result
/// at 200 characters.
///
/// # Examples
/// ```
/// use audio_proxy::domain::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a/b:c"), "abc");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')' | '[' | ']' | ' '))
        .take(FILENAME_MAX_CHARS)
        .collect()
}

/// Render a duration as `m:ss`, or `h:mm:ss` from one hour upwards.
pub fn format_timestamp(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("dQw4w9WgXcQ")]
    #[case("OXm4-3Er8po")]
    #[case("a_b-c_d-e_f")]
    fn accepts_well_formed_ids(#[case] raw: &str) {
        assert_eq!(VideoId::parse(raw).expect("valid id").as_str(), raw);
    }

    #[rstest]
    #[case("", VideoIdValidationError::Empty)]
    #[case("short", VideoIdValidationError::Length(5))]
    #[case("dQw4w9WgXcQx", VideoIdValidationError::Length(12))]
    #[case("dQw4w9WgX!Q", VideoIdValidationError::InvalidCharacters)]
    #[case("dQw4w9 gXcQ", VideoIdValidationError::InvalidCharacters)]
    fn rejects_malformed_ids(#[case] raw: &str, #[case] expected: VideoIdValidationError) {
        assert_eq!(VideoId::parse(raw).expect_err("invalid id"), expected);
    }

    #[rstest]
    fn query_is_trimmed() {
        let query = SearchQuery::parse("  artist title \n").expect("valid query");
        assert_eq!(query.as_str(), "artist title");
        assert_eq!(query.cache_key(), "search:artist title");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_query_is_rejected(#[case] raw: &str) {
        assert_eq!(
            SearchQuery::parse(raw).expect_err("blank query"),
            SearchQueryValidationError::Empty
        );
    }

    #[rstest]
    fn sanitize_strips_disallowed_characters() {
        assert_eq!(
            sanitize_filename("Song / Title: Live! (2024)"),
            "Song  Title Live (2024)"
        );
    }

    #[rstest]
    fn sanitize_keeps_brackets_dots_and_dashes() {
        assert_eq!(
            sanitize_filename("[Official] track_01 - v1.2 (remix)"),
            "[Official] track_01 - v1.2 (remix)"
        );
    }

    #[rstest]
    fn sanitize_caps_length() {
        let long = "a".repeat(450);
        assert_eq!(sanitize_filename(&long).len(), 200);
    }

    #[rstest]
    fn sanitize_drops_non_ascii() {
        assert_eq!(sanitize_filename("Café 日本"), "Caf ");
    }

    #[rstest]
    #[case(0, "0:00")]
    #[case(59, "0:59")]
    #[case(213, "3:33")]
    #[case(3_600, "1:00:00")]
    #[case(3_725, "1:02:05")]
    fn renders_timestamps(#[case] seconds: u64, #[case] expected: &str) {
        assert_eq!(format_timestamp(seconds), expected);
    }

    #[rstest]
    fn candidate_derives_url_and_timestamp() {
        let candidate = Candidate::new("dQw4w9WgXcQ", "Song", None, Some(213), None);
        assert_eq!(candidate.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(candidate.timestamp.as_deref(), Some("3:33"));
    }

    #[rstest]
    #[case(Some("  Title "), "  Title ")]
    #[case(Some("   "), "unknown")]
    #[case(None, "unknown")]
    fn title_falls_back_when_blank(#[case] title: Option<&str>, #[case] expected: &str) {
        let info = MediaInfo {
            id: VideoId::parse("dQw4w9WgXcQ").expect("valid id"),
            title: title.map(str::to_owned),
            author: None,
            duration_seconds: None,
            audio: AudioLocator::default(),
        };
        assert_eq!(info.title_or("unknown"), expected);
    }
}
