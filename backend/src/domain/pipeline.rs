//! Stream pipeline controller.
//!
//! Copies an audio source into a transcoder session and exposes the encoded
//! output as a response body. The controller is one task awaiting whichever
//! of {source failure, transcoder failure, transcoder completion, output
//! chunk} happens first, so every failure is classified exactly once.
//!
//! Whether a failure becomes a structured [`Error`] or an aborted body is
//! decided by [`PipelineState`]: before the first encoded chunk exists the
//! caller still owns the response status, afterwards only termination is
//! possible.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream};
use futures_util::{FutureExt, StreamExt};
use thiserror::Error as ThisError;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::Error;
use super::ports::{AudioByteStream, TranscodeInput, TranscodeOutput, TranscodeSession};

/// Two-valued flag recording whether response transmission has begun.
///
/// ## Invariants
/// - transitions only from "not sent" to "sent", at most once.
#[derive(Debug, Clone, Default)]
pub struct PipelineState(Arc<AtomicBool>);

impl PipelineState {
    /// Fresh state with headers not yet sent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the response has committed to a streaming body.
    pub fn headers_sent(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Flip to "sent". Returns `true` only for the call that performed the
    /// transition.
    pub fn mark_headers_sent(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

/// Failure observed while the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PipelineFailure {
    /// The upstream audio stream broke.
    #[error("source stream failed: {0}")]
    Source(String),
    /// The transcoder failed or exited abnormally.
    #[error("transcoding failed: {0}")]
    Transcode(String),
}

impl PipelineFailure {
    /// Structured error reported while headers are still unsent.
    pub fn into_error(self) -> Error {
        match self {
            Self::Source(cause) => {
                Error::upstream_stream_failed("error fetching media from upstream")
                    .with_detail(cause)
            }
            Self::Transcode(cause) => Error::transcode_failed("transcoding failed").with_detail(cause),
        }
    }
}

/// Terminal body item once headers are sent; the HTTP layer drops the
/// connection on it, leaving the client with a truncated download.
#[derive(Debug, ThisError)]
#[error("audio stream aborted after headers were sent: {0}")]
pub struct PipelineAborted(pub PipelineFailure);

/// Response framing decided before any body bytes flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFraming {
    /// MIME type of the body.
    pub content_type: &'static str,
    /// Sanitised attachment name including extension.
    pub filename: String,
}

impl ResponseFraming {
    /// `Content-Disposition` header value.
    ///
    /// # Examples
    /// ```
    /// use audio_proxy::domain::ResponseFraming;
    ///
    /// let framing = ResponseFraming {
    ///     content_type: "audio/mpeg",
    ///     filename: "Song.mp3".into(),
    /// };
    /// assert_eq!(framing.content_disposition(), "inline; filename=\"Song.mp3\"");
    /// ```
    pub fn content_disposition(&self) -> String {
        format!("inline; filename=\"{}\"", self.filename)
    }
}

enum Event {
    Chunk(Bytes),
    Failed(PipelineFailure),
    Completed,
}

enum Step {
    Fed(Result<(), PipelineFailure>),
    Output(Option<Result<Bytes, super::ports::TranscodeError>>),
}

struct Wiring {
    feed: Option<BoxFuture<'static, Result<(), PipelineFailure>>>,
    output: TranscodeOutput,
}

impl Wiring {
    fn new(source: AudioByteStream, session: TranscodeSession) -> Self {
        let TranscodeSession { input, output } = session;
        Self {
            feed: Some(feed(source, input).boxed()),
            output,
        }
    }

    async fn next_event(&mut self) -> Event {
        loop {
            let step = match self.feed.as_mut() {
                Some(feed) => tokio::select! {
                    biased;
                    result = feed => Step::Fed(result),
                    item = self.output.next() => Step::Output(item),
                },
                None => Step::Output(self.output.next().await),
            };
            match step {
                Step::Fed(Ok(())) => self.feed = None,
                Step::Fed(Err(failure)) => {
                    self.feed = None;
                    return Event::Failed(failure);
                }
                Step::Output(Some(Ok(chunk))) if chunk.is_empty() => {}
                Step::Output(Some(Ok(chunk))) => return Event::Chunk(chunk),
                Step::Output(Some(Err(error))) => {
                    return Event::Failed(PipelineFailure::Transcode(error.to_string()));
                }
                Step::Output(None) => return Event::Completed,
            }
        }
    }
}

async fn feed(mut source: AudioByteStream, mut input: TranscodeInput) -> Result<(), PipelineFailure> {
    while let Some(item) = source.next().await {
        let chunk = item.map_err(|error| PipelineFailure::Source(error.to_string()))?;
        if let Err(error) = input.write_all(&chunk).await {
            // The transcoder reports its own failure on the output side.
            debug!(error = %error, "transcoder closed its input early");
            return Ok(());
        }
    }
    if let Err(error) = input.shutdown().await {
        debug!(error = %error, "closing transcoder input failed");
    }
    Ok(())
}

/// One request's pipeline, not yet started.
pub struct StreamPipeline {
    source: AudioByteStream,
    session: TranscodeSession,
    framing: ResponseFraming,
    state: PipelineState,
}

impl StreamPipeline {
    /// Pair a source with a transcoder session.
    pub fn new(source: AudioByteStream, session: TranscodeSession, framing: ResponseFraming) -> Self {
        Self {
            source,
            session,
            framing,
            state: PipelineState::new(),
        }
    }

    /// Handle on the state shared with the response body.
    pub fn state(&self) -> PipelineState {
        self.state.clone()
    }

    /// Run until the first encoded chunk, completion or failure.
    ///
    /// # Errors
    /// Returns the structured error for a failure observed before any
    /// encoded byte exists; the state is left "not sent".
    pub async fn start(self) -> Result<AudioResponse, Error> {
        let Self {
            source,
            session,
            framing,
            state,
        } = self;
        let mut wiring = Wiring::new(source, session);
        match wiring.next_event().await {
            Event::Chunk(first) => {
                state.mark_headers_sent();
                debug!(filename = %framing.filename, bytes = first.len(), "first encoded chunk ready");
                Ok(AudioResponse {
                    framing,
                    state,
                    body: body(first, wiring),
                })
            }
            Event::Completed => {
                state.mark_headers_sent();
                info!(filename = %framing.filename, "transcoder produced no output");
                Ok(AudioResponse {
                    framing,
                    state,
                    body: stream::empty().boxed(),
                })
            }
            Event::Failed(failure) => {
                warn!(error = %failure, "pipeline failed before streaming began");
                Err(failure.into_error())
            }
        }
    }
}

fn body(first: Bytes, wiring: Wiring) -> BoxStream<'static, Result<Bytes, PipelineAborted>> {
    let rest = stream::unfold(Some(wiring), |wiring| async move {
        let mut wiring = wiring?;
        match wiring.next_event().await {
            Event::Chunk(chunk) => Some((Ok(chunk), Some(wiring))),
            Event::Completed => {
                debug!("audio stream completed");
                None
            }
            Event::Failed(failure) => {
                warn!(error = %failure, "aborting response after headers were sent");
                Some((Err(PipelineAborted(failure)), None))
            }
        }
    });
    stream::once(async move { Ok(first) }).chain(rest).boxed()
}

/// Committed streaming response.
pub struct AudioResponse {
    framing: ResponseFraming,
    state: PipelineState,
    body: BoxStream<'static, Result<Bytes, PipelineAborted>>,
}

impl std::fmt::Debug for AudioResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioResponse")
            .field("framing", &self.framing)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AudioResponse {
    /// Headers to send with the body.
    pub fn framing(&self) -> &ResponseFraming {
        &self.framing
    }

    /// State shared with the running pipeline.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Encoded body. Dropping it cancels the source download and the
    /// transcoder.
    pub fn into_body(self) -> BoxStream<'static, Result<Bytes, PipelineAborted>> {
        self.body
    }
}
