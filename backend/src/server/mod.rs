//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ProxySettings;

use state_builders::build_http_state;

use actix_cors::Cors;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultEnv;
use tracing::info;

use audio_proxy::Trace;
#[cfg(debug_assertions)]
use audio_proxy::doc::ApiDoc;
use audio_proxy::inbound::http::health::{HealthState, health, live, ready};
use audio_proxy::inbound::http::search::search;
use audio_proxy::inbound::http::state::HttpState;
use audio_proxy::inbound::http::stream::{stream, stream_alt, stream_fixed};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .wrap(Cors::permissive())
        .service(search)
        .service(stream)
        .service(stream_alt)
        .service(stream_fixed)
        .service(health)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server from settings.
///
/// # Parameters
/// - `health_state`: shared readiness state, marked ready once the listener is bound.
/// - `settings`: loaded [`ProxySettings`].
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when the state cannot be built or binding
/// the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    settings: &ProxySettings,
) -> std::io::Result<Server> {
    let http_state = build_http_state(settings)?;
    let bind_addr = settings.bind_addr(&DefaultEnv::new());
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || build_app(server_health_state.clone(), http_state.clone()))
        .bind(bind_addr)?
        .run();

    info!(%bind_addr, "audio proxy listening");
    health_state.mark_ready();
    Ok(server)
}
