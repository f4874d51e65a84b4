//! Freelance Radar binary entrypoint.
//! Boots the Axum HTTP server: API routes, Prometheus metrics and, when
//! `STATIC_DIR` is set, the built front-end.

use freelance_radar::{api, telemetry::Metrics, AppState};
use shuttle_axum::ShuttleAxum;
use tower_http::services::ServeDir;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    freelance_radar::init_tracing();

    let state = AppState::from_env()?;
    let metrics = Metrics::init(state.aggregator.registry().len())?;

    let mut router = api::router(state).merge(metrics.router());
    if let Ok(dir) = std::env::var("STATIC_DIR") {
        tracing::info!(%dir, "serving static front-end");
        router = router.fallback_service(ServeDir::new(dir));
    }

    Ok(router.into())
}
