//! PostgreSQL database controller for the refresh pipeline.
//!
//! Forcing a database "offline" in PostgreSQL terms means disallowing new
//! connections and terminating every live backend of the target, which rolls
//! back in-flight transactions immediately and releases the storage handles
//! the refresh needs. Bringing it back online re-allows connections. Both
//! statements run against a maintenance database — never the target itself,
//! which is unreachable for most of the run.
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

use anyhow::{Context, Result};
use async_trait::async_trait;
use revolve_refresh::DatabaseController;
use sqlx::PgPool;
use sqlx::AssertSqlSafe;
use sqlx::postgres::PgPoolOptions;
use tracing::debug;

/// Database controller backed by a PostgreSQL maintenance connection.
#[derive(Clone, Debug)]
pub struct PgDatabaseController {
    pool: PgPool,
}

impl PgDatabaseController {
    /// Connect lazily to the maintenance database at `admin_url`.
    ///
    /// The pool is small on purpose; the controller issues a handful of
    /// administrative statements per run.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn connect(admin_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_lazy(admin_url)
            .context("failed to configure maintenance database pool")?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseController for PgDatabaseController {
    async fn take_offline(&self, name: &str) -> Result<()> {
        sqlx::query(AssertSqlSafe(allow_connections_statement(name, false)))
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to disallow connections to database '{name}'"))?;

        // In-flight transactions roll back when their backends terminate;
        // correctness requires every writer detached before the filesystem is
        // touched.
        let terminated = sqlx::query(TERMINATE_BACKENDS_STATEMENT)
            .bind(name)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to terminate backends of database '{name}'"))?;
        debug!(
            database = name,
            backends = terminated.rows_affected(),
            "database forced offline"
        );
        Ok(())
    }

    async fn bring_online(&self, name: &str) -> Result<()> {
        sqlx::query(AssertSqlSafe(allow_connections_statement(name, true)))
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to re-allow connections to database '{name}'"))?;
        debug!(database = name, "database brought online");
        Ok(())
    }
}

const TERMINATE_BACKENDS_STATEMENT: &str = "SELECT pg_terminate_backend(pid) \
     FROM pg_stat_activity \
     WHERE datname = $1 AND pid <> pg_backend_pid()";

/// Render the `ALTER DATABASE` statement toggling connection admission.
///
/// Database names cannot be bound as parameters in DDL, so the identifier is
/// quoted here.
fn allow_connections_statement(name: &str, allow: bool) -> String {
    format!(
        "ALTER DATABASE {} WITH ALLOW_CONNECTIONS {}",
        quote_ident(name),
        allow
    )
}

/// Quote a PostgreSQL identifier, doubling any embedded quotes.
fn quote_ident(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for ch in name.chars() {
        if ch == '"' {
            quoted.push('"');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
