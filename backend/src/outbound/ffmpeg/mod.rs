//! ffmpeg subprocess transcoder.
//!
//! Each session is one `ffmpeg` child reading the source on stdin and
//! writing the encoded stream on stdout. A semaphore bounds how many run at
//! once; the permit and the child live as long as the output stream, and
//! dropping the stream kills the child.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info};

use crate::domain::ports::{
    AudioCodec, TranscodeError, TranscodeOutput, TranscodeProfile, TranscodeSession, Transcoder,
};

const READ_CHUNK_BYTES: usize = 16 * 1024;
const STDERR_TAIL_LINES: usize = 8;

/// Transcoder spawning one ffmpeg process per session.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    permits: Arc<Semaphore>,
}

impl FfmpegTranscoder {
    /// Run `binary`, allowing at most `max_concurrent` live sessions.
    pub fn new(binary: impl Into<PathBuf>, max_concurrent: usize) -> Self {
        Self {
            binary: binary.into(),
            permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Sessions that can still be started right now.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn start(&self, profile: &TranscodeProfile) -> Result<TranscodeSession, TranscodeError> {
        let permit = Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|_| TranscodeError::unavailable("all transcoder slots are busy"))?;

        let mut child = Command::new(&self.binary)
            .args(ffmpeg_args(profile))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| TranscodeError::unavailable(format!("failed to start ffmpeg: {error}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TranscodeError::io("ffmpeg stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TranscodeError::io("ffmpeg stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TranscodeError::io("ffmpeg stderr was not captured"))?;

        info!(pid = ?child.id(), bitrate_kbps = profile.bitrate_kbps, "ffmpeg started");
        let stderr_tail = tokio::spawn(stderr_tail(stderr).in_current_span());
        let running = Running {
            child,
            stdout,
            stderr_tail: Some(stderr_tail),
            _permit: permit,
        };
        Ok(TranscodeSession {
            input: Box::pin(stdin),
            output: output_stream(running),
        })
    }
}

fn ffmpeg_args(profile: &TranscodeProfile) -> Vec<String> {
    let (encoder, muxer) = match profile.codec {
        AudioCodec::Mp3 => ("libmp3lame", "mp3"),
    };
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-i", "pipe:0"]
        .into_iter()
        .map(str::to_owned)
        .collect();
    if profile.strip_video {
        args.push("-vn".to_owned());
    }
    args.extend([
        "-c:a".to_owned(),
        encoder.to_owned(),
        "-b:a".to_owned(),
        format!("{}k", profile.bitrate_kbps),
        "-f".to_owned(),
        muxer.to_owned(),
        "pipe:1".to_owned(),
    ]);
    args
}

struct Running {
    child: Child,
    stdout: ChildStdout,
    stderr_tail: Option<JoinHandle<String>>,
    _permit: OwnedSemaphorePermit,
}

impl Running {
    async fn finish(mut self) -> Result<(), TranscodeError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|error| TranscodeError::io(error.to_string()))?;
        let tail = match self.stderr_tail.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        if status.success() {
            debug!("ffmpeg finished");
            return Ok(());
        }
        Err(TranscodeError::process(if tail.is_empty() {
            format!("ffmpeg exited with {status}")
        } else {
            format!("ffmpeg exited with {status}: {tail}")
        }))
    }
}

fn output_stream(running: Running) -> TranscodeOutput {
    stream::unfold(Some(running), |running| async move {
        let mut running = running?;
        let mut buf = BytesMut::with_capacity(READ_CHUNK_BYTES);
        match running.stdout.read_buf(&mut buf).await {
            Ok(0) => running.finish().await.err().map(|error| (Err(error), None)),
            Ok(_) => Some((Ok(buf.freeze()), Some(running))),
            Err(error) => Some((Err(TranscodeError::io(error.to_string())), None)),
        }
    })
    .boxed()
}

/// Forward stderr to the log and keep the last few lines for the failure
/// cause.
async fn stderr_tail(stderr: ChildStderr) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(line = %line, "ffmpeg stderr");
        if tail.len() == STDERR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into_iter().collect::<Vec<_>>().join("; ")
}
