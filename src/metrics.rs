use anyhow::Context;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use shuttle_axum::axum::{routing::get, Router};

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process and describe the
    /// pipeline's metrics. Later calls reuse the installed recorder.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new()
                    .install_recorder()
                    .context("prometheus: install recorder")?;
                describe();
                Ok::<_, anyhow::Error>(handle)
            })?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!("report_jobs_total", "Report jobs by terminal status");
    describe_counter!("report_fetch_total", "Source fetches by status");
    describe_counter!("report_sources_total", "Per-source analyses by status");
    describe_counter!(
        "report_llm_fallback_total",
        "Model calls that fell back to the secondary backend"
    );
    describe_counter!(
        "report_self_correction_total",
        "Summaries that needed a correction round trip"
    );
    describe_histogram!("report_job_duration_ms", "Wall time per report job in ms");
}
