//! Configuration surface for the Revolve refresh tool.
//!
//! Layout: `model.rs` (typed settings), `loader.rs` (TOML file + environment
//! overrides), `validate.rs` (field-level validation), `error.rs` (typed
//! errors).
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

/// Typed configuration errors.
pub mod error;
/// File and environment loading.
pub mod loader;
/// Typed configuration models.
pub mod model;
/// Field-level validation helpers.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{from_toml_str, load};
pub use model::{ArraySettings, DatabaseSettings, LoggingSettings, MountSettings, Settings};
pub use validate::validate;
