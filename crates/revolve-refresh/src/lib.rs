//! Core refresh orchestration for Revolve.
//!
//! The pipeline coordinates three collaborators — a database controller, a
//! mount manager, and an array volume store — into one strictly ordered
//! refresh operation: take the target database offline, unmount its backing
//! path, copy the production volume over the target volume, remount, bring
//! the database back online, and release the copy session. Each step's
//! postcondition is the next step's precondition; a failure stops forward
//! progress and is reported with the exact step that failed.
//!
//! Layout: `collaborators.rs` (external-system traits), `model.rs`
//! (requests, step records, reports), `service.rs` (the pipeline),
//! `error.rs` (failure taxonomy).
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

/// External-system collaborator traits.
pub mod collaborators;
/// Failure taxonomy for refresh runs.
pub mod error;
/// Requests, step records, and run reports.
pub mod model;
/// The refresh pipeline.
pub mod service;

pub use collaborators::{DatabaseController, MountManager, VolumeStore};
pub use error::{DbTransition, MountDirection, RefreshError, RefreshResult};
pub use model::{
    RefreshReport, RefreshRequest, SessionToken, StepKind, StepRecord, StepStatus,
};
pub use service::RefreshService;
