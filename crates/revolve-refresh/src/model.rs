//! Domain models for refresh runs.
//!
//! # Design
//! - Keep request/report types lightweight and serialisable.
//! - Step records form an append-only ledger; the report is the ledger plus
//!   run identity and timing.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five pipeline steps plus the trailing session release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Force the target database offline.
    TakeOffline,
    /// Unmount the backing path.
    Unmount,
    /// Copy the source volume over the target volume.
    CopyVolume,
    /// Remount the backing path.
    Remount,
    /// Bring the target database back online.
    BringOnline,
    /// Release the copy-session token.
    ReleaseSession,
}

impl StepKind {
    /// Stable machine-readable step name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TakeOffline => "take_offline",
            Self::Unmount => "unmount",
            Self::CopyVolume => "copy_volume",
            Self::Remount => "remount",
            Self::BringOnline => "bring_online",
            Self::ReleaseSession => "release_session",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Status recorded for a step within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step began executing.
    Started,
    /// The step finished successfully.
    Completed,
    /// The step failed; the run aborts after recording this.
    Failed,
    /// The step was not applicable for this run.
    Skipped,
}

impl StepStatus {
    /// Stable machine-readable status name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// One entry in a run's step ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step the record belongs to.
    pub step: StepKind,
    /// Status at the time of recording.
    pub status: StepStatus,
    /// Optional human-readable detail.
    pub detail: Option<String>,
    /// When the record was written.
    pub recorded_at: DateTime<Utc>,
}

/// Immutable inputs describing one refresh operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Name of the database being refreshed.
    pub database: String,
    /// Filesystem path bound to the target volume.
    pub mount_path: PathBuf,
    /// Volume whose content is copied.
    pub source_volume: String,
    /// Volume that receives the copy.
    pub target_volume: String,
    /// Whether the target volume's existing content may be discarded.
    pub overwrite: bool,
}

/// Structured outcome of a successful refresh run.
///
/// Failed runs surface a [`crate::error::RefreshError`] instead; the error
/// names the step that failed and carries the underlying cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Identifier of the run.
    pub run_id: Uuid,
    /// Echo of the request the run executed.
    pub request: RefreshRequest,
    /// Ordered step ledger.
    pub steps: Vec<StepRecord>,
    /// Copy-session identifier obtained from the array, if any.
    pub session: Option<String>,
    /// Whether releasing the copy session failed (recorded, never escalated).
    pub cleanup_failed: bool,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl RefreshReport {
    /// Latest recorded status for the given step, if any.
    #[must_use]
    pub fn step_status(&self, step: StepKind) -> Option<StepStatus> {
        self.steps
            .iter()
            .rev()
            .find(|record| record.step == step)
            .map(|record| record.status)
    }
}

/// Handle for a copy session created by the array.
///
/// The orchestrator is the single owner; the token is released exactly once
/// per run in which one was obtained, on success and failure paths alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw session identifier returned by the array.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw session identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_names_are_stable() {
        assert_eq!(StepKind::TakeOffline.as_str(), "take_offline");
        assert_eq!(StepKind::CopyVolume.as_str(), "copy_volume");
        assert_eq!(StepKind::ReleaseSession.as_str(), "release_session");
        assert_eq!(StepStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn report_returns_latest_step_status() {
        let request = RefreshRequest {
            database: "TestDB".to_string(),
            mount_path: PathBuf::from("/data/TestDB"),
            source_volume: "prod-vol".to_string(),
            target_volume: "test-vol".to_string(),
            overwrite: true,
        };
        let now = Utc::now();
        let report = RefreshReport {
            run_id: Uuid::new_v4(),
            request,
            steps: vec![
                StepRecord {
                    step: StepKind::TakeOffline,
                    status: StepStatus::Started,
                    detail: None,
                    recorded_at: now,
                },
                StepRecord {
                    step: StepKind::TakeOffline,
                    status: StepStatus::Completed,
                    detail: None,
                    recorded_at: now,
                },
            ],
            session: None,
            cleanup_failed: false,
            started_at: now,
            finished_at: now,
        };

        assert_eq!(
            report.step_status(StepKind::TakeOffline),
            Some(StepStatus::Completed)
        );
        assert_eq!(report.step_status(StepKind::Unmount), None);
    }

    #[test]
    fn session_token_round_trips() {
        let token = SessionToken::new("sess-0042");
        assert_eq!(token.as_str(), "sess-0042");
        assert_eq!(token.to_string(), "sess-0042");
    }
}
