// src/jobs/mod.rs
//! In-process job execution: status state machine, report store, retrying
//! runner and an mpsc-backed queue.

pub mod queue;
pub mod runner;
pub mod status;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::report::SourceRef;

pub use queue::JobQueue;
pub use runner::{JobRunner, RetryPolicy};
pub use status::JobStatus;
pub use store::{FinalReport, InMemoryReportStore, ReportSection, ReportStore, StoredReport};

/// One configured source. Only `url` reaches the pipeline; any other fields
/// a caller sends are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub url: String,
}

/// User configuration captured when the job was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub keywords: Vec<String>,
    pub viewpoint: String,
    pub sources: Vec<SourceConfig>,
    #[serde(default, alias = "schedule")]
    pub schedule_cron: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ConfigSnapshot {
    pub fn source_refs(&self) -> Vec<SourceRef> {
        self.sources
            .iter()
            .map(|s| SourceRef { url: s.url.clone() })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportJob {
    pub report_id: String,
    pub user_id: String,
    pub config: ConfigSnapshot,
}
