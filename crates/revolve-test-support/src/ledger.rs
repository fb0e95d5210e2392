//! Call-order recording shared by the fake collaborators.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// One collaborator call observed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRecord {
    /// `DatabaseController::take_offline` was invoked.
    TakeOffline {
        /// Database name passed to the call.
        database: String,
    },
    /// `MountManager::unmount` was invoked.
    Unmount {
        /// Path passed to the call.
        path: PathBuf,
    },
    /// `VolumeStore::copy_volume` was invoked.
    CopyVolume {
        /// Source volume passed to the call.
        source: String,
        /// Target volume passed to the call.
        target: String,
        /// Overwrite flag passed to the call.
        overwrite: bool,
    },
    /// `MountManager::mount` was invoked.
    Mount {
        /// Path passed to the call.
        path: PathBuf,
    },
    /// `DatabaseController::bring_online` was invoked.
    BringOnline {
        /// Database name passed to the call.
        database: String,
    },
    /// `VolumeStore::invalidate_session` was invoked.
    InvalidateSession {
        /// Session token passed to the call.
        token: String,
    },
}

/// Shared, ordered record of every collaborator call in a run.
#[derive(Clone, Default)]
pub struct CallLedger {
    inner: Arc<Mutex<Vec<CallRecord>>>,
}

impl CallLedger {
    /// Construct an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call record.
    ///
    /// # Panics
    ///
    /// Panics if the ledger mutex has been poisoned.
    pub fn push(&self, record: CallRecord) {
        self.inner
            .lock()
            .expect("call ledger mutex poisoned")
            .push(record);
    }

    /// Snapshot the recorded calls in invocation order.
    ///
    /// # Panics
    ///
    /// Panics if the ledger mutex has been poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.inner
            .lock()
            .expect("call ledger mutex poisoned")
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_preserves_invocation_order() {
        let ledger = CallLedger::new();
        ledger.push(CallRecord::TakeOffline {
            database: "TestDB".to_string(),
        });
        ledger.push(CallRecord::Unmount {
            path: PathBuf::from("/data/TestDB"),
        });

        let calls = ledger.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], CallRecord::TakeOffline { .. }));
        assert!(matches!(calls[1], CallRecord::Unmount { .. }));
    }

    #[test]
    fn clones_share_the_same_record() {
        let ledger = CallLedger::new();
        let clone = ledger.clone();
        clone.push(CallRecord::BringOnline {
            database: "TestDB".to_string(),
        });
        assert_eq!(ledger.calls().len(), 1);
    }
}
