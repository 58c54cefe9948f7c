//! Request correlation identifier.
//!
//! The HTTP tracing middleware scopes one [`TraceId`] around each request so
//! log lines and error payloads produced while serving it can be joined up.
//! Task-local values do not follow `tokio::spawn`; wrap spawned work in
//! [`TraceId::scope`] when the identifier must travel with it.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static CURRENT_TRACE_ID: TraceId;
}

/// UUID naming one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Mint a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identifier of the request currently being served, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT_TRACE_ID.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` visible through [`TraceId::current`].
    ///
    /// # Examples
    /// ```
    /// use audio_proxy::domain::TraceId;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let id = TraceId::generate();
    /// let seen = TraceId::scope(id, async { TraceId::current() }).await;
    /// assert_eq!(seen, Some(id));
    /// # });
    /// ```
    pub async fn scope<Fut>(trace_id: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        CURRENT_TRACE_ID.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
