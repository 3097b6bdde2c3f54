// src/jobs/runner.rs
//! Drives one job through the pipeline with job-level retries.

use async_trait::async_trait;
use chrono::Utc;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use super::{FinalReport, JobStatus, ReportJob, ReportSection, ReportStore};
use crate::config::JobConfig;
use crate::error::Result;
use crate::report::{ProgressSink, ReportGenerator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&JobConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &JobConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            delay: Duration::from_secs(cfg.retry_delay_secs),
        }
    }

    /// Same attempt budget, no wait between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
        }
    }
}

/// Forwards stage boundaries to the store.
struct StoreProgress<'a> {
    store: &'a dyn ReportStore,
    report_id: &'a str,
}

#[async_trait]
impl ProgressSink for StoreProgress<'_> {
    async fn enter(&self, status: JobStatus) -> Result<()> {
        self.store.set_status(self.report_id, status).await?;
        Ok(())
    }
}

pub struct JobRunner {
    generator: Arc<ReportGenerator>,
    store: Arc<dyn ReportStore>,
    policy: RetryPolicy,
}

impl JobRunner {
    pub fn new(
        generator: Arc<ReportGenerator>,
        store: Arc<dyn ReportStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            generator,
            store,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    /// Run `job` to a terminal status.
    ///
    /// A job that is already terminal is skipped and its status returned.
    /// Retryable failures are attempted again up to the policy's budget; the
    /// last error is returned after the report is marked `failed`.
    pub async fn run(&self, job: &ReportJob) -> Result<JobStatus> {
        let report_id = job.report_id.as_str();
        if let Some(status) = self.store.get_status(report_id).await? {
            if status.is_terminal() {
                info!(report_id, %status, "job already finished, skipping redelivery");
                return Ok(status);
            }
        }

        let t0 = Instant::now();
        let mut attempt = 1;
        loop {
            info!(report_id, user_id = %job.user_id, attempt, "report job started");
            match self.attempt(job).await {
                Ok(status) => {
                    let ms = t0.elapsed().as_millis() as u64;
                    info!(report_id, %status, attempt, ms, "report job finished");
                    counter!("report_jobs_total", "status" => status.as_str()).increment(1);
                    histogram!("report_job_duration_ms").record(ms as f64);
                    return Ok(status);
                }
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    warn!(
                        report_id,
                        attempt,
                        error = %e,
                        retry_in_secs = self.policy.delay.as_secs(),
                        "report job attempt failed, retrying"
                    );
                    if !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => {
                    error!(report_id, attempt, error = %e, "report generation failed");
                    if let Err(store_err) = self.store.set_status(report_id, JobStatus::Failed).await {
                        error!(report_id, error = %store_err, "failed to record failed status");
                    }
                    counter!("report_jobs_total", "status" => JobStatus::Failed.as_str())
                        .increment(1);
                    histogram!("report_job_duration_ms").record(t0.elapsed().as_millis() as f64);
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(&self, job: &ReportJob) -> Result<JobStatus> {
        let report_id = job.report_id.as_str();
        let progress = StoreProgress {
            store: self.store.as_ref(),
            report_id,
        };
        let result = self
            .generator
            .generate(
                &job.config.source_refs(),
                &job.config.keywords,
                &job.config.viewpoint,
                &progress,
            )
            .await?;

        for (i, sa) in result.sources.iter().enumerate() {
            self.store
                .upsert_section(ReportSection {
                    report_id: report_id.to_string(),
                    url: sa.url.clone(),
                    content: sa.analysis.clone(),
                    status: sa.status,
                    sort_order: i,
                })
                .await?;
        }

        let status = JobStatus::classify(result.success_count(), result.sources.len());
        self.store
            .finish(
                report_id,
                FinalReport {
                    status,
                    executive_summary: result.summary,
                    action_item: result.action_item,
                    completed_at: Utc::now(),
                },
            )
            .await?;
        Ok(status)
    }
}
