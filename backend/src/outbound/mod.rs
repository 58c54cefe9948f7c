//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **ytdlp**: search and media extraction via the yt-dlp binary, with audio
//!   downloaded over HTTP by reqwest
//! - **ffmpeg**: transcoding via an ffmpeg child process per request
//! - **cache**: process-local TTL cache of search results
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod cache;
pub mod ffmpeg;
pub mod ytdlp;
