//! Proxy entry-point: loads settings, initialises logging and runs the
//! HTTP server.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use audio_proxy::inbound::http::health::HealthState;
use server::{ProxySettings, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ProxySettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load proxy settings: {err}"))?;
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), &settings)
        .wrap_err("failed to start HTTP server")?;

    let result = server.await;
    health_state.mark_unhealthy();
    result.wrap_err("HTTP server terminated")
}
