// src/jobs/queue.rs
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::{JobRunner, JobStatus, ReportJob, ReportStore};
use crate::error::{ReportError, Result};

/// In-process job queue. Each received job runs on its own task so one slow
/// report does not hold up the rest.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<ReportJob>,
    store: Arc<dyn ReportStore>,
}

impl JobQueue {
    /// Start the worker loop. It exits once every `JobQueue` handle is dropped.
    pub fn spawn(runner: Arc<JobRunner>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<ReportJob>();
        let store = runner.store().clone();

        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let runner = runner.clone();
                tokio::spawn(async move {
                    if let Err(e) = runner.run(&job).await {
                        error!(report_id = %job.report_id, error = %e, "report job gave up");
                    }
                });
            }
            debug!("job queue closed");
        });

        (Self { tx, store }, worker)
    }

    /// Mark the report `pending` and hand the job to the worker.
    pub async fn enqueue(&self, job: ReportJob) -> Result<()> {
        self.store.set_status(&job.report_id, JobStatus::Pending).await?;
        debug!(report_id = %job.report_id, "report job enqueued");
        self.tx
            .send(job)
            .map_err(|_| ReportError::JobExecution("job queue is closed".into()))
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }
}
