// src/error.rs
//! Error taxonomy shared by the pipeline stages and the job runner.

use thiserror::Error;

use crate::llm::Backend;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReportError {
    /// Sanitizer rejection. The job never starts.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Per-source fetch failure. Normally captured into a `FetchResult`.
    #[error("fetch failed: {0}")]
    FetchFailure(String),

    #[error("{backend} invocation failed: {message}")]
    ModelInvocation { backend: Backend, message: String },

    #[error("all source analyses failed, cannot generate report")]
    NoValidSources,

    #[error("job execution failed: {0}")]
    JobExecution(String),

    #[error("report store error: {0}")]
    Store(String),
}

impl ReportError {
    pub fn model(backend: Backend, message: impl Into<String>) -> Self {
        Self::ModelInvocation {
            backend,
            message: message.into(),
        }
    }

    /// Whether the job-level retry policy should run the job again.
    ///
    /// Only a sanitizer rejection is final; `NoValidSources` usually means
    /// every source was briefly unreachable, so it is attempted again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidInput(_))
    }
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;
