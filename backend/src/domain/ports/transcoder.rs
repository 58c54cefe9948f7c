//! Driven port for the audio transcoding subprocess.
//!
//! A session is a pair of pipes: the caller writes source bytes into
//! `input` and reads encoded bytes from `output`. Dropping the session
//! terminates the underlying process.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use tokio::io::AsyncWrite;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the transcoder.
    pub enum TranscodeError {
        /// No transcoder slot or binary is available.
        Unavailable => "transcoder unavailable",
        /// The transcoder exited abnormally.
        Process => "transcoder process failed",
        /// Reading from or writing to the transcoder pipes failed.
        Io => "transcoder pipe failed",
    }
}

/// Output audio codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioCodec {
    /// MPEG-1 Layer III.
    #[default]
    Mp3,
}

impl AudioCodec {
    /// MIME type of the encoded stream.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
        }
    }

    /// File extension used in attachment names.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
        }
    }
}

/// Encoding parameters for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeProfile {
    /// Output codec.
    pub codec: AudioCodec,
    /// Constant bitrate in kbit/s.
    pub bitrate_kbps: u32,
    /// Drop any video track in the input.
    pub strip_video: bool,
}

impl Default for TranscodeProfile {
    fn default() -> Self {
        Self {
            codec: AudioCodec::Mp3,
            bitrate_kbps: 128,
            strip_video: true,
        }
    }
}

impl TranscodeProfile {
    /// MIME type of the encoded stream.
    pub fn content_type(&self) -> &'static str {
        self.codec.content_type()
    }

    /// File extension used in attachment names.
    pub fn extension(&self) -> &'static str {
        self.codec.extension()
    }
}

/// Writable end feeding source bytes to the transcoder.
pub type TranscodeInput = Pin<Box<dyn AsyncWrite + Send>>;

/// Encoded output. A trailing `Err` reports abnormal termination.
pub type TranscodeOutput = BoxStream<'static, Result<Bytes, TranscodeError>>;

/// One running transcode.
pub struct TranscodeSession {
    /// Source sink; shut it down to signal end of input.
    pub input: TranscodeInput,
    /// Encoded byte stream.
    pub output: TranscodeOutput,
}

impl std::fmt::Debug for TranscodeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscodeSession").finish_non_exhaustive()
    }
}

/// Transcoding capability.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Start a new session.
    async fn start(&self, profile: &TranscodeProfile) -> Result<TranscodeSession, TranscodeError>;
}
