// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod crawl;
pub mod error;
pub mod jobs;
pub mod llm;
pub mod metrics;
pub mod prompts;
pub mod report;
pub mod sanitize;

pub use crate::error::{ReportError, Result};
pub use crate::report::{ReportGenerator, ReportResult};

use shuttle_axum::axum::Router;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::jobs::{InMemoryReportStore, JobQueue, JobRunner, RetryPolicy};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter; `LOG_FORMAT=json` switches to JSON lines. A subscriber that is
/// already installed (e.g. by the hosting runtime) is left alone.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("report_pipeline=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

/// Wire config → generator → runner → queue → router. The returned handle is
/// the queue's worker task.
pub fn build_app(cfg: &AppConfig) -> anyhow::Result<(Router, JoinHandle<()>)> {
    let generator = Arc::new(ReportGenerator::from_config(cfg)?);
    let store = Arc::new(InMemoryReportStore::new());
    let runner = Arc::new(JobRunner::new(
        generator,
        store,
        RetryPolicy::from_config(&cfg.jobs),
    ));
    let (queue, worker) = JobQueue::spawn(runner);

    let metrics = crate::metrics::Metrics::init()?;
    let router = api::create_router(api::AppState::new(queue)).merge(metrics.router());

    info!(
        primary = %cfg.llm.primary_backend(),
        search = cfg.crawl.tavily_api_key.is_some(),
        max_attempts = cfg.jobs.max_attempts,
        "report pipeline ready"
    );
    Ok((router, worker))
}
