// src/jobs/store.rs
//! Report persistence keyed by report id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::JobStatus;
use crate::error::{ReportError, Result};
use crate::report::{ActionItem, AnalysisStatus, ExecutiveSummary};

/// Per-source row. `content` holds the analysis on success, `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub report_id: String,
    pub url: String,
    pub content: Option<String>,
    pub status: AnalysisStatus,
    pub sort_order: usize,
}

/// Terminal write for a job that produced a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReport {
    pub status: JobStatus,
    pub executive_summary: ExecutiveSummary,
    pub action_item: ActionItem,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredReport {
    pub report_id: String,
    pub status: JobStatus,
    pub executive_summary: Option<ExecutiveSummary>,
    pub action_item: Option<ActionItem>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Ordered by `sort_order`.
    pub sections: Vec<ReportSection>,
}

/// Status writes return whether they were applied. A write the state machine
/// refuses is not an error; callers just move on.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn get_status(&self, report_id: &str) -> Result<Option<JobStatus>>;
    async fn set_status(&self, report_id: &str, status: JobStatus) -> Result<bool>;
    /// Insert or replace the row at `(report_id, sort_order)`.
    async fn upsert_section(&self, section: ReportSection) -> Result<()>;
    async fn finish(&self, report_id: &str, report: FinalReport) -> Result<bool>;
    async fn get_report(&self, report_id: &str) -> Result<Option<StoredReport>>;
}

#[derive(Debug)]
struct Record {
    report: StoredReport,
    history: Vec<JobStatus>,
}

impl Record {
    fn new(report_id: &str) -> Self {
        Self {
            report: StoredReport {
                report_id: report_id.to_string(),
                status: JobStatus::Pending,
                executive_summary: None,
                action_item: None,
                completed_at: None,
                sections: Vec::new(),
            },
            history: vec![JobStatus::Pending],
        }
    }

    fn advance(&mut self, next: JobStatus) -> bool {
        let cur = self.report.status;
        if !cur.can_transition_to(next) {
            debug!(report_id = %self.report.report_id, from = %cur, to = %next, "status write ignored");
            return false;
        }
        if cur != next {
            self.report.status = next;
            self.history.push(next);
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    inner: Mutex<HashMap<String, Record>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Record>>> {
        self.inner
            .lock()
            .map_err(|_| ReportError::Store("report store mutex poisoned".into()))
    }

    /// Every distinct status the report has passed through, oldest first.
    pub fn status_history(&self, report_id: &str) -> Vec<JobStatus> {
        self.lock()
            .ok()
            .and_then(|m| m.get(report_id).map(|r| r.history.clone()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn get_status(&self, report_id: &str) -> Result<Option<JobStatus>> {
        Ok(self.lock()?.get(report_id).map(|r| r.report.status))
    }

    async fn set_status(&self, report_id: &str, status: JobStatus) -> Result<bool> {
        let mut map = self.lock()?;
        let rec = map
            .entry(report_id.to_string())
            .or_insert_with(|| Record::new(report_id));
        Ok(rec.advance(status))
    }

    async fn upsert_section(&self, section: ReportSection) -> Result<()> {
        let mut map = self.lock()?;
        let rec = map
            .entry(section.report_id.clone())
            .or_insert_with(|| Record::new(&section.report_id));
        let sections = &mut rec.report.sections;
        match sections.binary_search_by_key(&section.sort_order, |s| s.sort_order) {
            Ok(i) => sections[i] = section,
            Err(i) => sections.insert(i, section),
        }
        Ok(())
    }

    async fn finish(&self, report_id: &str, report: FinalReport) -> Result<bool> {
        let mut map = self.lock()?;
        let rec = map
            .entry(report_id.to_string())
            .or_insert_with(|| Record::new(report_id));
        if rec.report.status.is_terminal() || !rec.advance(report.status) {
            debug!(report_id, status = %rec.report.status, "finish ignored, report already terminal");
            return Ok(false);
        }
        rec.report.executive_summary = Some(report.executive_summary);
        rec.report.action_item = Some(report.action_item);
        rec.report.completed_at = Some(report.completed_at);
        Ok(true)
    }

    async fn get_report(&self, report_id: &str) -> Result<Option<StoredReport>> {
        Ok(self.lock()?.get(report_id).map(|r| r.report.clone()))
    }
}
