//! yt-dlp subprocess invocation.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

/// Why a yt-dlp run produced no usable output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum CommandFailure {
    /// The binary could not be started.
    Spawn(String),
    /// The process exited unsuccessfully.
    Exit { status: String, stderr: String },
}

impl CommandFailure {
    pub(super) fn describe(&self) -> String {
        match self {
            Self::Spawn(message) => format!("failed to run yt-dlp: {message}"),
            Self::Exit { status, stderr } if stderr.is_empty() => {
                format!("yt-dlp exited with {status}")
            }
            Self::Exit { status, stderr } => format!("yt-dlp exited with {status}: {stderr}"),
        }
    }

    /// Whether stderr says the upstream refused or lacks the item.
    pub(super) fn is_unavailable(&self) -> bool {
        const MARKERS: [&str; 6] = [
            "Video unavailable",
            "Private video",
            "Sign in to confirm",
            "This video is not available",
            "HTTP Error 403",
            "HTTP Error 429",
        ];
        match self {
            Self::Spawn(_) => false,
            Self::Exit { stderr, .. } => MARKERS.iter().any(|marker| stderr.contains(marker)),
        }
    }
}

/// Run `binary` with `args` and return its stdout.
pub(super) async fn run<I, S>(binary: &Path, args: I) -> Result<Vec<u8>, CommandFailure>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|error| CommandFailure::Spawn(error.to_string()))?;

    if output.status.success() {
        debug!(bytes = output.stdout.len(), "yt-dlp finished");
        return Ok(output.stdout);
    }
    Err(CommandFailure::Exit {
        status: output.status.to_string(),
        stderr: preview(&output.stderr),
    })
}

/// Whitespace-compacted, length-capped rendering of process or HTTP output.
pub(super) fn preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 240;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let head = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{head}...")
    } else {
        head
    }
}
