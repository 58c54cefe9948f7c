//! Audio proxy library modules.
//!
//! The crate follows a hexagonal layout: [`domain`] holds the use cases and
//! ports, [`inbound`] adapts HTTP onto them and [`outbound`] implements the
//! ports with `yt-dlp`, `ffmpeg` and an in-memory cache.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
