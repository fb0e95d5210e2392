//! External-system collaborator traits.
//!
//! # Design
//! - Each trait mirrors exactly the contract the pipeline relies on; anything
//!   else an adapter can do (connection pooling, authentication, retries) is
//!   the adapter's own concern.
//! - Calls may block for an externally-bounded duration; the pipeline imposes
//!   no timeout of its own.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::SessionToken;

/// Controls the availability of the target database.
#[async_trait]
pub trait DatabaseController: Send + Sync {
    /// Force the named database offline, rolling back in-flight work
    /// immediately. All writers must be detached when this returns.
    async fn take_offline(&self, name: &str) -> Result<()>;

    /// Bring the named database back online.
    async fn bring_online(&self, name: &str) -> Result<()>;
}

/// Manages the mount point backing the target database.
#[async_trait]
pub trait MountManager: Send + Sync {
    /// Unmount the given path. A busy mount is an error, not a retry signal.
    async fn unmount(&self, path: &Path) -> Result<()>;

    /// Mount the given path.
    async fn mount(&self, path: &Path) -> Result<()>;
}

/// Drives the storage array's volume-management API.
#[async_trait]
pub trait VolumeStore: Send + Sync {
    /// Copy `source` onto `target`, optionally overwriting existing content.
    /// Returns the copy-session token the caller must later release.
    async fn copy_volume(
        &self,
        source: &str,
        target: &str,
        overwrite: bool,
    ) -> Result<SessionToken>;

    /// Release a copy-session token obtained from [`VolumeStore::copy_volume`].
    async fn invalidate_session(&self, token: &SessionToken) -> Result<()>;
}
