//! Builders wiring the outbound adapters into HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::info;

use audio_proxy::domain::{AudioStreamService, Retrier, SearchService};
use audio_proxy::inbound::http::state::{HttpState, StreamRoutes};
use audio_proxy::outbound::cache::InMemorySearchCache;
use audio_proxy::outbound::ffmpeg::FfmpegTranscoder;
use audio_proxy::outbound::ytdlp::YtDlp;

use super::ProxySettings;

/// Route set with the fixed route pinned to the configured id.
fn build_routes(settings: &ProxySettings) -> std::io::Result<StreamRoutes> {
    let fixed = settings.fixed_stream_id().map_err(|err| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid fixed_stream_id: {err}"),
        )
    })?;
    let mut routes = StreamRoutes::new(fixed);
    routes.fixed = routes
        .fixed
        .with_fallback_title(settings.fixed_fallback_title());
    Ok(routes)
}

/// Build the HTTP state from settings.
///
/// # Errors
/// Returns [`std::io::Error`] when the fixed stream id is malformed or the
/// download client cannot be constructed.
pub(super) fn build_http_state(settings: &ProxySettings) -> std::io::Result<web::Data<HttpState>> {
    let ytdlp = Arc::new(
        YtDlp::new(settings.ytdlp_path(), settings.upstream_timeout())
            .map_err(|err| std::io::Error::other(format!("download client: {err}")))?,
    );
    let cache = Arc::new(InMemorySearchCache::new(
        settings.search_cache_ttl(),
        Arc::new(DefaultClock),
    ));
    let transcoder = Arc::new(FfmpegTranscoder::new(
        settings.ffmpeg_path(),
        settings.max_concurrent_transcodes(),
    ));

    let search = SearchService::new(ytdlp.clone(), cache, settings.search_limit());
    let streams = AudioStreamService::new(
        search.clone(),
        ytdlp,
        transcoder,
        Retrier::new(settings.retry_policy()),
        settings.transcode_profile(),
    );
    let routes = build_routes(settings)?;

    info!(
        ytdlp = %settings.ytdlp_path().display(),
        ffmpeg = %settings.ffmpeg_path().display(),
        fixed_stream_id = %routes
            .fixed
            .pinned_video()
            .map(ToString::to_string)
            .unwrap_or_default(),
        "http state built"
    );
    Ok(web::Data::new(HttpState::new(search, streams, routes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_route_uses_configured_id_and_fallback() {
        let settings = ProxySettings {
            fixed_stream_id: Some("dQw4w9WgXcQ".to_owned()),
            fixed_fallback_title: Some("radio".to_owned()),
            ..ProxySettings::default()
        };

        let routes = build_routes(&settings).expect("routes");

        assert_eq!(
            routes.fixed.pinned_video().map(|id| id.as_str()),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(routes.fixed.fallback_title(), "radio");
        assert_eq!(routes.standard.fallback_title(), "unknown");
    }

    #[test]
    fn malformed_fixed_id_fails_startup() {
        let settings = ProxySettings {
            fixed_stream_id: Some("not/valid".to_owned()),
            ..ProxySettings::default()
        };

        let err = build_routes(&settings).expect_err("invalid id");

        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
