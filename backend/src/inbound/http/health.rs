//! Health endpoints: a status report plus liveness and readiness probes for
//! orchestration and load balancers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use actix_web::{HttpResponse, get, http::header, web};
use chrono::SecondsFormat;
use mockable::{Clock, DefaultClock};
use serde::Serialize;
use utoipa::ToSchema;

/// Shared health state for readiness and liveness checks.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    started: Instant,
    clock: Arc<dyn Clock>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Health state reporting timestamps from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            started: Instant::now(),
            clock,
        }
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state. When false, liveness probes emit 503.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn report(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            timestamp: self.clock.utc().to_rfc3339_opts(SecondsFormat::Millis, true),
            uptime: self.started.elapsed().as_secs_f64(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Process status report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthReport {
    /// Always `"ok"` while the process answers.
    #[schema(example = "ok")]
    pub status: &'static str,
    /// Current time, RFC 3339 in UTC.
    #[schema(example = "2024-05-01T12:00:00.000Z")]
    pub timestamp: String,
    /// Seconds since the process started.
    pub uptime: f64,
    /// Crate version.
    #[schema(example = "1.0.0")]
    pub version: &'static str,
}

/// Status report with timestamp, uptime and version.
#[utoipa::path(
    get,
    path = "/health",
    tags = ["health"],
    responses(
        (status = 200, description = "Process status", body = HealthReport)
    )
)]
#[get("/health")]
pub async fn health(state: web::Data<HealthState>) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(state.report())
}

/// Readiness probe. Return 200 when dependencies are initialised and the
/// server can handle traffic; return 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once
/// draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test as actix_test};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::test_support::MutableClock;

    #[actix_web::test]
    async fn report_uses_clock_and_package_version() {
        let clock = MutableClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        );
        let state = web::Data::new(HealthState::with_clock(Arc::new(clock)));
        let app = actix_test::init_service(App::new().app_data(state).service(health)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/health").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["timestamp"], "2024-05-01T12:00:00.000Z");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["uptime"].as_f64().expect("uptime is a number") >= 0.0);
    }

    #[rstest]
    #[case(false, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(true, StatusCode::OK)]
    #[actix_web::test]
    async fn readiness_follows_state(#[case] ready_flag: bool, #[case] expected: StatusCode) {
        let state = web::Data::new(HealthState::new());
        if ready_flag {
            state.mark_ready();
        }
        let app = actix_test::init_service(App::new().app_data(state).service(ready)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;

        assert_eq!(res.status(), expected);
        assert_eq!(
            res.headers()
                .get(header::CACHE_CONTROL)
                .and_then(|value| value.to_str().ok()),
            Some("no-store")
        );
    }

    #[actix_web::test]
    async fn liveness_fails_once_unhealthy() {
        let state = web::Data::new(HealthState::new());
        state.mark_unhealthy();
        let app = actix_test::init_service(App::new().app_data(state).service(live)).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/health/live").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
