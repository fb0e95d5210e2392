//! Mount manager that drives the platform `mount`/`umount` binaries.
//!
//! The managed path is expected to carry an fstab entry, so both tools take
//! the path as their only argument. A non-zero exit is surfaced with the
//! tool's stderr; a busy unmount in particular must reach the operator
//! unmodified, since retrying it blind could mask a writer leak.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use revolve_refresh::MountManager;
use tokio::process::Command;
use tracing::debug;

/// Mount manager backed by the platform mount tooling.
pub struct CommandMountManager {
    mount_bin: String,
    umount_bin: String,
}

impl CommandMountManager {
    /// Construct a manager using the system `mount` and `umount` binaries.
    #[must_use]
    pub fn new() -> Self {
        Self::with_binaries("mount", "umount")
    }

    /// Construct a manager with explicit binaries (used by configuration and
    /// by tests that must not touch real mounts).
    #[must_use]
    pub fn with_binaries(mount_bin: impl Into<String>, umount_bin: impl Into<String>) -> Self {
        Self {
            mount_bin: mount_bin.into(),
            umount_bin: umount_bin.into(),
        }
    }
}

impl Default for CommandMountManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MountManager for CommandMountManager {
    async fn unmount(&self, path: &Path) -> Result<()> {
        run_tool(&self.umount_bin, path).await
    }

    async fn mount(&self, path: &Path) -> Result<()> {
        run_tool(&self.mount_bin, path).await
    }
}

async fn run_tool(binary: &str, path: &Path) -> Result<()> {
    let output = Command::new(binary)
        .arg(path)
        .output()
        .await
        .with_context(|| format!("failed to spawn '{binary}'"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "'{binary} {}' exited with {}: {}",
            path.display(),
            output.status,
            stderr.trim()
        );
    }

    debug!(binary, path = %path.display(), "mount tool succeeded");
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_tool_exit_is_ok() -> Result<()> {
        let manager = CommandMountManager::with_binaries("true", "true");
        manager.unmount(Path::new("/data/TestDB")).await?;
        manager.mount(Path::new("/data/TestDB")).await?;
        Ok(())
    }

    #[tokio::test]
    async fn nonzero_exit_is_surfaced_with_status() {
        let manager = CommandMountManager::with_binaries("false", "false");
        let err = manager
            .unmount(Path::new("/data/TestDB"))
            .await
            .expect_err("non-zero exit should fail");
        let message = err.to_string();
        assert!(message.contains("exited with"), "message: {message}");
        assert!(message.contains("/data/TestDB"), "message: {message}");
    }

    #[tokio::test]
    async fn stderr_is_captured_in_the_error() {
        // `cat` on a missing file exits non-zero and reports on stderr,
        // standing in for a busy mount's diagnostics.
        let manager = CommandMountManager::with_binaries("cat", "cat");
        let err = manager
            .mount(Path::new("/definitely/missing/file"))
            .await
            .expect_err("missing file should fail");
        assert!(
            err.to_string().contains("No such file"),
            "stderr should be preserved: {err}"
        );
    }

    #[tokio::test]
    async fn missing_binary_reports_spawn_failure() {
        let manager = CommandMountManager::with_binaries("revolve-no-such-tool", "ditto");
        let err = manager
            .mount(Path::new("/data/TestDB"))
            .await
            .expect_err("missing binary should fail");
        assert!(err.to_string().contains("failed to spawn"));
    }
}
