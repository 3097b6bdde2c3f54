//! Report pipeline service: binary entrypoint.
//! Loads configuration, starts the job worker and serves the HTTP API.

use report_pipeline::config::AppConfig;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    report_pipeline::init_tracing();

    let cfg = AppConfig::from_env()?;
    let (router, _worker) = report_pipeline::build_app(&cfg)?;

    Ok(router.into())
}
