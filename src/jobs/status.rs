// src/jobs/status.rs
//! Job status state machine.
//!
//! `pending → collecting → analyzing → synthesizing → {completed | partial | failed}`.
//! Progress is forward-only; `failed` is reachable from any non-terminal
//! state; nothing leaves a terminal state.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Collecting,
    Analyzing,
    Synthesizing,
    Completed,
    Partial,
    Failed,
}

impl JobStatus {
    fn rank(&self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Collecting => 1,
            JobStatus::Analyzing => 2,
            JobStatus::Synthesizing => 3,
            JobStatus::Completed | JobStatus::Partial | JobStatus::Failed => 4,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Partial | JobStatus::Failed
        )
    }

    /// Whether a write of `next` may replace `self`. Re-writing the current
    /// value is allowed so replays stay idempotent.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next.rank() > self.rank()
    }

    /// Terminal status from per-source outcomes.
    pub fn classify(success: usize, total: usize) -> JobStatus {
        if success == 0 {
            JobStatus::Failed
        } else if success < total {
            JobStatus::Partial
        } else {
            JobStatus::Completed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Collecting => "collecting",
            JobStatus::Analyzing => "analyzing",
            JobStatus::Synthesizing => "synthesizing",
            JobStatus::Completed => "completed",
            JobStatus::Partial => "partial",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::JobStatus::*;
    use super::*;

    #[test]
    fn forward_only() {
        assert!(Pending.can_transition_to(Collecting));
        assert!(Collecting.can_transition_to(Synthesizing));
        assert!(Analyzing.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Analyzing.can_transition_to(Collecting));
        assert!(!Synthesizing.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states_are_final() {
        for t in [Completed, Partial, Failed] {
            assert!(t.is_terminal());
            assert!(t.can_transition_to(t));
            for other in [Pending, Collecting, Analyzing, Synthesizing, Completed, Partial, Failed] {
                if other != t {
                    assert!(!t.can_transition_to(other), "{t} -> {other}");
                }
            }
        }
    }

    #[test]
    fn classify_by_success_ratio() {
        assert_eq!(JobStatus::classify(0, 3), Failed);
        assert_eq!(JobStatus::classify(1, 3), Partial);
        assert_eq!(JobStatus::classify(3, 3), Completed);
        assert_eq!(JobStatus::classify(0, 0), Failed);
    }
}
