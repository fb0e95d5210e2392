//! # Design
//!
//! - Structured, constant-message errors for the refresh pipeline.
//! - Every variant names the exact pipeline step that failed so an operator
//!   can infer the real-world state from the error alone (e.g. a remount
//!   failure implies the database is still safely offline).
//! - Preserve source errors without interpolating context into messages.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::StepKind;

/// Result type for refresh runs.
pub type RefreshResult<T> = Result<T, RefreshError>;

/// Database availability transitions the pipeline can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbTransition {
    /// Forcing the database offline (step 1).
    Offline,
    /// Bringing the database online (step 5).
    Online,
}

impl DbTransition {
    /// Stable machine-readable transition name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Online => "online",
        }
    }
}

/// Mount-layer operations the pipeline can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountDirection {
    /// Unmounting the backing path (step 2).
    Unmount,
    /// Remounting the backing path (step 4).
    Mount,
}

impl MountDirection {
    /// Stable machine-readable operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unmount => "unmount",
            Self::Mount => "mount",
        }
    }
}

/// Fatal failures of a refresh run.
///
/// Session cleanup failures are deliberately absent: by the time cleanup runs
/// the primary outcome is already determined, so they are recorded on the
/// report and logged instead of raised.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The database controller could not perform the requested transition.
    #[error("database transition failed")]
    DatabaseTransition {
        /// Which transition was requested.
        transition: DbTransition,
        /// Target database name.
        database: String,
        /// Underlying controller error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The mount manager could not perform the requested operation.
    #[error("mount operation failed")]
    MountOperation {
        /// Which operation was requested.
        operation: MountDirection,
        /// Mount path involved in the failure.
        path: PathBuf,
        /// Underlying mount error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The volume store rejected or aborted the copy.
    #[error("volume copy failed")]
    VolumeCopy {
        /// Volume the data was copied from.
        source_volume: String,
        /// Volume the data was copied onto.
        target_volume: String,
        /// Underlying array error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RefreshError {
    pub(crate) fn database(
        transition: DbTransition,
        database: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::DatabaseTransition {
            transition,
            database: database.into(),
            source: source.into(),
        }
    }

    pub(crate) fn mount(
        operation: MountDirection,
        path: impl Into<PathBuf>,
        source: anyhow::Error,
    ) -> Self {
        Self::MountOperation {
            operation,
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn volume_copy(
        source_volume: impl Into<String>,
        target_volume: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        Self::VolumeCopy {
            source_volume: source_volume.into(),
            target_volume: target_volume.into(),
            source: source.into(),
        }
    }

    /// The pipeline step this failure occurred at.
    #[must_use]
    pub const fn step(&self) -> StepKind {
        match self {
            Self::DatabaseTransition {
                transition: DbTransition::Offline,
                ..
            } => StepKind::TakeOffline,
            Self::DatabaseTransition {
                transition: DbTransition::Online,
                ..
            } => StepKind::BringOnline,
            Self::MountOperation {
                operation: MountDirection::Unmount,
                ..
            } => StepKind::Unmount,
            Self::MountOperation {
                operation: MountDirection::Mount,
                ..
            } => StepKind::Remount,
            Self::VolumeCopy { .. } => StepKind::CopyVolume,
        }
    }
}
