//! DTOs for decoding `yt-dlp --dump-json` output.
//!
//! The adapter decodes into these transport DTOs first, then maps into domain
//! records in one pass.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::{AudioLocator, Candidate, MediaInfo, VideoId};

/// One line of `--flat-playlist` search output.
#[derive(Debug, Deserialize)]
pub(super) struct SearchEntryDto {
    pub(super) id: Option<String>,
    pub(super) title: Option<String>,
    pub(super) channel: Option<String>,
    pub(super) uploader: Option<String>,
    pub(super) duration: Option<f64>,
    pub(super) thumbnail: Option<String>,
    #[serde(default)]
    pub(super) thumbnails: Vec<ThumbnailDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ThumbnailDto {
    pub(super) url: String,
}

/// Full metadata of one video with a single selected format.
#[derive(Debug, Deserialize)]
pub(super) struct VideoInfoDto {
    pub(super) title: Option<String>,
    pub(super) channel: Option<String>,
    pub(super) uploader: Option<String>,
    pub(super) duration: Option<f64>,
    pub(super) url: Option<String>,
    pub(super) ext: Option<String>,
    pub(super) filesize: Option<u64>,
    pub(super) filesize_approx: Option<u64>,
    #[serde(default)]
    pub(super) http_headers: BTreeMap<String, String>,
}

impl SearchEntryDto {
    /// `None` for entries without an identifier (channels, playlists).
    pub(super) fn into_candidate(self) -> Option<Candidate> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let thumbnail = self
            .thumbnails
            .into_iter()
            .next_back()
            .map(|thumb| thumb.url)
            .or(self.thumbnail);
        Some(Candidate::new(
            id,
            self.title.unwrap_or_default(),
            self.channel.or(self.uploader),
            self.duration.and_then(whole_seconds),
            thumbnail,
        ))
    }
}

impl VideoInfoDto {
    pub(super) fn into_media_info(self, id: &VideoId) -> Result<MediaInfo, String> {
        let url = self
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| format!("no direct audio URL reported for {id}"))?;
        Ok(MediaInfo {
            id: id.clone(),
            title: self.title,
            author: self.channel.or(self.uploader),
            duration_seconds: self.duration.and_then(whole_seconds),
            audio: AudioLocator {
                url,
                headers: self.http_headers.into_iter().collect(),
                container: self.ext,
                content_length: self.filesize.or(self.filesize_approx),
            },
        })
    }
}

fn whole_seconds(duration: f64) -> Option<u64> {
    (duration.is_finite() && duration >= 0.0).then(|| duration.round() as u64)
}
