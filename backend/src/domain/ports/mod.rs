//! Domain ports for the external capabilities the proxy consumes.
//!
//! The domain owns request and response shapes; outbound adapters in
//! `crate::outbound` translate them to yt-dlp, HTTP and ffmpeg calls.

mod macros;
pub(crate) use macros::define_port_error;

mod media_extractor;
mod media_search;
mod search_cache;
mod transcoder;

#[cfg(test)]
pub use media_extractor::MockMediaExtractor;
pub use media_extractor::{
    AudioByteStream, MediaExtractor, MediaExtractorError, RequestProfile, SourceStreamError,
};
#[cfg(test)]
pub use media_search::MockMediaSearch;
pub use media_search::{MediaSearch, MediaSearchError};
pub use search_cache::{DisabledSearchCache, SearchCache, SearchCacheError};
pub use transcoder::{
    AudioCodec, TranscodeError, TranscodeInput, TranscodeOutput, TranscodeProfile,
    TranscodeSession, Transcoder,
};
