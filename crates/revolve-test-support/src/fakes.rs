//! Instrumented fake collaborators with failure injection.
//!
//! Each fake records its calls in a shared [`CallLedger`] and tracks the
//! external state it stands in for, so tests can assert both call order and
//! the real-world state a run leaves behind.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;
use revolve_refresh::{DatabaseController, MountManager, SessionToken, VolumeStore};

use crate::ledger::{CallLedger, CallRecord};

/// Session identifier handed out by [`FakeVolumeStore`].
pub const FAKE_SESSION_TOKEN: &str = "sess-0042";

/// Availability of the fake database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseState {
    /// The database accepts connections.
    Online,
    /// The database has been forced offline.
    Offline,
}

/// Mount status of the fake mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    /// The path is mounted.
    Mounted,
    /// The path has been unmounted.
    Unmounted,
}

/// Fake [`DatabaseController`] tracking availability transitions.
pub struct FakeDatabaseController {
    ledger: CallLedger,
    state: Arc<Mutex<DatabaseState>>,
    fail_offline: bool,
    fail_online: bool,
}

impl FakeDatabaseController {
    /// Construct a fake starting in the [`DatabaseState::Online`] state.
    #[must_use]
    pub fn new(ledger: CallLedger) -> Self {
        Self {
            ledger,
            state: Arc::new(Mutex::new(DatabaseState::Online)),
            fail_offline: false,
            fail_online: false,
        }
    }

    /// Make `take_offline` fail, as if the database were mid-failover.
    #[must_use]
    pub const fn fail_offline(mut self) -> Self {
        self.fail_offline = true;
        self
    }

    /// Make `bring_online` fail.
    #[must_use]
    pub const fn fail_online(mut self) -> Self {
        self.fail_online = true;
        self
    }

    /// Current availability of the fake database.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex has been poisoned.
    #[must_use]
    pub fn state(&self) -> DatabaseState {
        *self.state.lock().expect("database state mutex poisoned")
    }
}

#[async_trait]
impl DatabaseController for FakeDatabaseController {
    async fn take_offline(&self, name: &str) -> Result<()> {
        self.ledger.push(CallRecord::TakeOffline {
            database: name.to_string(),
        });
        if self.fail_offline {
            bail!("database '{name}' is mid-failover and cannot be forced offline");
        }
        *self.state.lock().expect("database state mutex poisoned") = DatabaseState::Offline;
        Ok(())
    }

    async fn bring_online(&self, name: &str) -> Result<()> {
        self.ledger.push(CallRecord::BringOnline {
            database: name.to_string(),
        });
        if self.fail_online {
            bail!("database '{name}' refused to come online");
        }
        *self.state.lock().expect("database state mutex poisoned") = DatabaseState::Online;
        Ok(())
    }
}

/// Fake [`MountManager`] tracking the mount state of one path.
pub struct FakeMountManager {
    ledger: CallLedger,
    state: Arc<Mutex<MountState>>,
    fail_unmount: bool,
    fail_mount: bool,
}

impl FakeMountManager {
    /// Construct a fake starting in the [`MountState::Mounted`] state.
    #[must_use]
    pub fn new(ledger: CallLedger) -> Self {
        Self {
            ledger,
            state: Arc::new(Mutex::new(MountState::Mounted)),
            fail_unmount: false,
            fail_mount: false,
        }
    }

    /// Make `unmount` fail, as if stale handles kept the mount busy.
    #[must_use]
    pub const fn fail_unmount(mut self) -> Self {
        self.fail_unmount = true;
        self
    }

    /// Make `mount` fail.
    #[must_use]
    pub const fn fail_mount(mut self) -> Self {
        self.fail_mount = true;
        self
    }

    /// Current mount state of the fake path.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex has been poisoned.
    #[must_use]
    pub fn state(&self) -> MountState {
        *self.state.lock().expect("mount state mutex poisoned")
    }
}

#[async_trait]
impl MountManager for FakeMountManager {
    async fn unmount(&self, path: &Path) -> Result<()> {
        self.ledger.push(CallRecord::Unmount {
            path: path.to_path_buf(),
        });
        if self.fail_unmount {
            bail!("umount: {}: target is busy", path.display());
        }
        *self.state.lock().expect("mount state mutex poisoned") = MountState::Unmounted;
        Ok(())
    }

    async fn mount(&self, path: &Path) -> Result<()> {
        self.ledger.push(CallRecord::Mount {
            path: path.to_path_buf(),
        });
        if self.fail_mount {
            bail!("mount: {}: can't find in fstab", path.display());
        }
        *self.state.lock().expect("mount state mutex poisoned") = MountState::Mounted;
        Ok(())
    }
}

/// Fake [`VolumeStore`] handing out a fixed session token.
pub struct FakeVolumeStore {
    ledger: CallLedger,
    invalidated: Arc<Mutex<u32>>,
    fail_copy: bool,
    fail_invalidate: bool,
}

impl FakeVolumeStore {
    /// Construct a fake that succeeds on every call.
    #[must_use]
    pub fn new(ledger: CallLedger) -> Self {
        Self {
            ledger,
            invalidated: Arc::new(Mutex::new(0)),
            fail_copy: false,
            fail_invalidate: false,
        }
    }

    /// Make `copy_volume` fail before a session is created.
    #[must_use]
    pub const fn fail_copy(mut self) -> Self {
        self.fail_copy = true;
        self
    }

    /// Make `invalidate_session` fail.
    #[must_use]
    pub const fn fail_invalidate(mut self) -> Self {
        self.fail_invalidate = true;
        self
    }

    /// Number of `invalidate_session` calls observed, successful or not.
    ///
    /// # Panics
    ///
    /// Panics if the counter mutex has been poisoned.
    #[must_use]
    pub fn invalidated(&self) -> u32 {
        *self
            .invalidated
            .lock()
            .expect("invalidation counter mutex poisoned")
    }
}

#[async_trait]
impl VolumeStore for FakeVolumeStore {
    async fn copy_volume(
        &self,
        source: &str,
        target: &str,
        overwrite: bool,
    ) -> Result<SessionToken> {
        self.ledger.push(CallRecord::CopyVolume {
            source: source.to_string(),
            target: target.to_string(),
            overwrite,
        });
        if self.fail_copy {
            bail!("array rejected copy of '{source}' onto '{target}'");
        }
        Ok(SessionToken::new(FAKE_SESSION_TOKEN))
    }

    async fn invalidate_session(&self, token: &SessionToken) -> Result<()> {
        self.ledger.push(CallRecord::InvalidateSession {
            token: token.as_str().to_string(),
        });
        *self
            .invalidated
            .lock()
            .expect("invalidation counter mutex poisoned") += 1;
        if self.fail_invalidate {
            bail!("session '{token}' is unknown to the array");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fakes_record_calls_and_track_state() -> Result<()> {
        let ledger = CallLedger::new();
        let database = FakeDatabaseController::new(ledger.clone());
        let mounts = FakeMountManager::new(ledger.clone());

        database.take_offline("TestDB").await?;
        mounts.unmount(Path::new("/data/TestDB")).await?;

        assert_eq!(database.state(), DatabaseState::Offline);
        assert_eq!(mounts.state(), MountState::Unmounted);
        assert_eq!(ledger.calls().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn failure_injection_leaves_state_untouched() {
        let ledger = CallLedger::new();
        let database = FakeDatabaseController::new(ledger.clone()).fail_offline();

        let err = database
            .take_offline("TestDB")
            .await
            .expect_err("injected failure expected");
        assert!(err.to_string().contains("mid-failover"));
        assert_eq!(database.state(), DatabaseState::Online);
    }

    #[tokio::test]
    async fn volume_store_counts_invalidations() -> Result<()> {
        let ledger = CallLedger::new();
        let volumes = FakeVolumeStore::new(ledger);

        let token = volumes.copy_volume("prod-vol", "test-vol", true).await?;
        assert_eq!(token.as_str(), FAKE_SESSION_TOKEN);
        volumes.invalidate_session(&token).await?;
        assert_eq!(volumes.invalidated(), 1);
        Ok(())
    }
}
