//! Proxy settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `AUDIO_PROXY_*` environment variables and an
//! optional configuration file. `search_limit` has a loader default; the
//! other fields are optional and the accessors apply their defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use audio_proxy::domain::ports::TranscodeProfile;
use audio_proxy::domain::{DEFAULT_FALLBACK_TITLE, RetryPolicy, VideoId, VideoIdValidationError};
use audio_proxy::outbound::cache::DEFAULT_SEARCH_CACHE_TTL;
use mockable::Env;
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_PORT: u16 = 3000;
const PORT_ENV: &str = "PORT";
const DEFAULT_YTDLP: &str = "yt-dlp";
const DEFAULT_FFMPEG: &str = "ffmpeg";
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;
const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5000;
const DEFAULT_SEARCH_LIMIT: usize = 5;
const DEFAULT_BITRATE_KBPS: u32 = 128;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FIXED_STREAM_ID: &str = "OXm4-3Er8po";
const DEFAULT_MAX_TRANSCODES: usize = 8;

/// Runtime configuration of the proxy.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "AUDIO_PROXY")]
pub struct ProxySettings {
    /// Interface to bind.
    pub host: Option<IpAddr>,
    /// Port to bind. Falls back to `PORT`, then 3000.
    pub port: Option<u16>,
    /// Path or name of the `yt-dlp` executable.
    pub ytdlp_path: Option<PathBuf>,
    /// Path or name of the `ffmpeg` executable.
    pub ffmpeg_path: Option<PathBuf>,
    /// Metadata fetch attempts, including the first.
    pub retry_max_attempts: Option<u32>,
    /// Backoff before the second attempt.
    pub retry_base_delay_ms: Option<u64>,
    /// Backoff cap.
    pub retry_max_delay_ms: Option<u64>,
    /// Search result lifetime in the cache.
    pub search_cache_ttl_secs: Option<u64>,
    /// Maximum candidates per search.
    #[ortho_config(default = 5)]
    pub search_limit: usize,
    /// Output bitrate in kbit/s.
    pub audio_bitrate_kbps: Option<u32>,
    /// Connect timeout of the upstream audio download.
    pub upstream_timeout_secs: Option<u64>,
    /// Video streamed by `/stream-fixed`.
    pub fixed_stream_id: Option<String>,
    /// Attachment name used by `/stream-fixed` when the title is unusable.
    pub fixed_fallback_title: Option<String>,
    /// Upper bound on concurrently running transcoders.
    pub max_concurrent_transcodes: Option<usize>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            ytdlp_path: None,
            ffmpeg_path: None,
            retry_max_attempts: None,
            retry_base_delay_ms: None,
            retry_max_delay_ms: None,
            search_cache_ttl_secs: None,
            search_limit: DEFAULT_SEARCH_LIMIT,
            audio_bitrate_kbps: None,
            upstream_timeout_secs: None,
            fixed_stream_id: None,
            fixed_fallback_title: None,
            max_concurrent_transcodes: None,
        }
    }
}

impl ProxySettings {
    /// Socket address to bind, consulting `PORT` when no port is configured.
    pub fn bind_addr(&self, env: &impl Env) -> SocketAddr {
        let port = self
            .port
            .or_else(|| env.string(PORT_ENV).and_then(|raw| raw.trim().parse().ok()))
            .unwrap_or(DEFAULT_PORT);
        SocketAddr::new(self.host.unwrap_or(DEFAULT_HOST), port)
    }

    pub fn ytdlp_path(&self) -> PathBuf {
        self.ytdlp_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_YTDLP))
    }

    pub fn ffmpeg_path(&self) -> PathBuf {
        self.ffmpeg_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG))
    }

    /// Backoff policy for metadata fetches.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS),
            Duration::from_millis(self.retry_base_delay_ms.unwrap_or(DEFAULT_RETRY_BASE_DELAY_MS)),
            Duration::from_millis(self.retry_max_delay_ms.unwrap_or(DEFAULT_RETRY_MAX_DELAY_MS)),
        )
    }

    pub fn search_cache_ttl(&self) -> Duration {
        self.search_cache_ttl_secs
            .map_or(DEFAULT_SEARCH_CACHE_TTL, Duration::from_secs)
    }

    pub fn search_limit(&self) -> usize {
        self.search_limit
    }

    /// MP3 output profile at the configured bitrate.
    pub fn transcode_profile(&self) -> TranscodeProfile {
        TranscodeProfile {
            bitrate_kbps: self.audio_bitrate_kbps.unwrap_or(DEFAULT_BITRATE_KBPS),
            ..TranscodeProfile::default()
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(
            self.upstream_timeout_secs
                .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        )
    }

    /// Identifier pinned to `/stream-fixed`.
    ///
    /// # Errors
    /// Returns the validation error when the configured id is malformed.
    pub fn fixed_stream_id(&self) -> Result<VideoId, VideoIdValidationError> {
        VideoId::parse(
            self.fixed_stream_id
                .as_deref()
                .unwrap_or(DEFAULT_FIXED_STREAM_ID),
        )
    }

    pub fn fixed_fallback_title(&self) -> &str {
        self.fixed_fallback_title
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_TITLE)
    }

    pub fn max_concurrent_transcodes(&self) -> usize {
        self.max_concurrent_transcodes
            .unwrap_or(DEFAULT_MAX_TRANSCODES)
    }
}
