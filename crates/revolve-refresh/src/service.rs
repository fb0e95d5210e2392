//! The refresh pipeline.
//!
//! # Design
//! - Five strictly ordered steps; each step's postcondition is the next
//!   step's precondition, so nothing runs once a step has failed.
//! - No retries and no compensation: a failed unmount or copy is surfaced to
//!   the operator, never papered over.
//! - The copy session is an owned resource; releasing it is attempted on both
//!   success and failure paths, and its failure never replaces the primary
//!   outcome.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use revolve_events::{Event, EventBus};
use revolve_telemetry::Metrics;
use tracing::{info, warn};
use uuid::Uuid;

use crate::collaborators::{DatabaseController, MountManager, VolumeStore};
use crate::error::{DbTransition, MountDirection, RefreshError, RefreshResult};
use crate::model::{
    RefreshReport, RefreshRequest, SessionToken, StepKind, StepRecord, StepStatus,
};

/// Orchestrates one refresh run against the three collaborators.
#[derive(Clone)]
pub struct RefreshService {
    database: Arc<dyn DatabaseController>,
    mounts: Arc<dyn MountManager>,
    volumes: Arc<dyn VolumeStore>,
    events: EventBus,
    metrics: Metrics,
}

/// Mutable per-run state: the step ledger plus the session handle.
struct RunLedger {
    run_id: Uuid,
    steps: Vec<StepRecord>,
    session: Option<SessionToken>,
    cleanup_failed: bool,
}

impl RunLedger {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            steps: Vec::new(),
            session: None,
            cleanup_failed: false,
        }
    }

    fn record(&mut self, step: StepKind, status: StepStatus, detail: Option<String>) {
        self.steps.push(StepRecord {
            step,
            status,
            detail,
            recorded_at: Utc::now(),
        });
    }
}

impl RefreshService {
    /// Construct a service over the given collaborators.
    #[must_use]
    pub fn new(
        database: Arc<dyn DatabaseController>,
        mounts: Arc<dyn MountManager>,
        volumes: Arc<dyn VolumeStore>,
        events: EventBus,
        metrics: Metrics,
    ) -> Self {
        Self {
            database,
            mounts,
            volumes,
            events,
            metrics,
        }
    }

    /// Execute one refresh run.
    ///
    /// On success the target database is refreshed and back online. On
    /// failure the returned error names the step that stopped the run; no
    /// later step has had any side effect. The copy session, when one was
    /// obtained, has been released (or its release failure recorded) either
    /// way.
    ///
    /// Concurrent runs against the same target are undefined; mutual
    /// exclusion is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns the typed failure of the first step that did not complete.
    pub async fn run(&self, request: &RefreshRequest) -> RefreshResult<RefreshReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut ledger = RunLedger::new(run_id);

        let _ = self.events.publish(Event::RunStarted {
            run_id,
            database: request.database.clone(),
            mount_path: request.mount_path.display().to_string(),
            source_volume: request.source_volume.clone(),
            target_volume: request.target_volume.clone(),
        });
        info!(
            run_id = %run_id,
            database = %request.database,
            source_volume = %request.source_volume,
            target_volume = %request.target_volume,
            "refresh run starting"
        );

        let outcome = self.execute_pipeline(request, &mut ledger).await;

        self.release_session(&mut ledger).await;

        let report = RefreshReport {
            run_id,
            request: request.clone(),
            steps: ledger.steps,
            session: ledger.session.map(|token| token.as_str().to_string()),
            cleanup_failed: ledger.cleanup_failed,
            started_at,
            finished_at: Utc::now(),
        };

        match outcome {
            Ok(()) => {
                self.metrics.inc_run_outcome("completed");
                let _ = self.events.publish(Event::RunCompleted { run_id });
                info!(run_id = %run_id, database = %request.database, "refresh run completed");
                Ok(report)
            }
            Err(error) => {
                self.metrics.inc_run_outcome("failed");
                let _ = self.events.publish(Event::RunFailed {
                    run_id,
                    step: error.step().as_str().to_string(),
                    message: error_chain(&error),
                });
                warn!(
                    run_id = %run_id,
                    step = error.step().as_str(),
                    "refresh run failed"
                );
                Err(error)
            }
        }
    }

    async fn execute_pipeline(
        &self,
        request: &RefreshRequest,
        ledger: &mut RunLedger,
    ) -> RefreshResult<()> {
        self.execute_step(
            ledger,
            StepKind::TakeOffline,
            Some(format!("database={}", request.database)),
            self.database.take_offline(&request.database),
            |source| RefreshError::database(DbTransition::Offline, &request.database, source),
        )
        .await?;

        self.execute_step(
            ledger,
            StepKind::Unmount,
            Some(format!("path={}", request.mount_path.display())),
            self.mounts.unmount(&request.mount_path),
            |source| RefreshError::mount(MountDirection::Unmount, &request.mount_path, source),
        )
        .await?;

        let token = self
            .execute_step(
                ledger,
                StepKind::CopyVolume,
                Some(format!(
                    "source={} target={} overwrite={}",
                    request.source_volume, request.target_volume, request.overwrite
                )),
                self.volumes.copy_volume(
                    &request.source_volume,
                    &request.target_volume,
                    request.overwrite,
                ),
                |source| {
                    RefreshError::volume_copy(
                        &request.source_volume,
                        &request.target_volume,
                        source,
                    )
                },
            )
            .await?;
        ledger.session = Some(token);

        self.execute_step(
            ledger,
            StepKind::Remount,
            Some(format!("path={}", request.mount_path.display())),
            self.mounts.mount(&request.mount_path),
            |source| RefreshError::mount(MountDirection::Mount, &request.mount_path, source),
        )
        .await?;

        self.execute_step(
            ledger,
            StepKind::BringOnline,
            Some(format!("database={}", request.database)),
            self.database.bring_online(&request.database),
            |source| RefreshError::database(DbTransition::Online, &request.database, source),
        )
        .await?;

        Ok(())
    }

    /// Run a single step, recording its lifecycle in the ledger, the event
    /// bus, and the metrics registry.
    async fn execute_step<T, Fut, E>(
        &self,
        ledger: &mut RunLedger,
        step: StepKind,
        detail: Option<String>,
        op: Fut,
        wrap: E,
    ) -> RefreshResult<T>
    where
        Fut: Future<Output = anyhow::Result<T>>,
        E: FnOnce(anyhow::Error) -> RefreshError,
    {
        let run_id = ledger.run_id;
        let _ = self.events.publish(Event::StepStarted {
            run_id,
            step: step.as_str().to_string(),
        });
        self.record(ledger, step, StepStatus::Started, None);

        match op.await {
            Ok(value) => {
                let _ = self.events.publish(Event::StepCompleted {
                    run_id,
                    step: step.as_str().to_string(),
                    detail: detail.clone(),
                });
                self.record(ledger, step, StepStatus::Completed, detail);
                Ok(value)
            }
            Err(source) => {
                let error = wrap(source);
                let message = error_chain(&error);
                let _ = self.events.publish(Event::StepFailed {
                    run_id,
                    step: step.as_str().to_string(),
                    message: message.clone(),
                });
                self.record(ledger, step, StepStatus::Failed, Some(message));
                Err(error)
            }
        }
    }

    /// Best-effort release of the copy session. Failures are logged and
    /// recorded; the run's primary outcome is already determined by the time
    /// this executes and must not be overwritten.
    async fn release_session(&self, ledger: &mut RunLedger) {
        let run_id = ledger.run_id;
        let Some(token) = ledger.session.clone() else {
            self.record(
                ledger,
                StepKind::ReleaseSession,
                StepStatus::Skipped,
                Some("no copy session obtained".to_string()),
            );
            return;
        };

        let _ = self.events.publish(Event::StepStarted {
            run_id,
            step: StepKind::ReleaseSession.as_str().to_string(),
        });
        self.record(ledger, StepKind::ReleaseSession, StepStatus::Started, None);

        match self.volumes.invalidate_session(&token).await {
            Ok(()) => {
                let detail = format!("session={token}");
                let _ = self.events.publish(Event::StepCompleted {
                    run_id,
                    step: StepKind::ReleaseSession.as_str().to_string(),
                    detail: Some(detail.clone()),
                });
                self.record(
                    ledger,
                    StepKind::ReleaseSession,
                    StepStatus::Completed,
                    Some(detail),
                );
            }
            Err(error) => {
                let message = format!("{error:#}");
                warn!(
                    run_id = %run_id,
                    session = %token,
                    "copy session release failed: {message}"
                );
                self.metrics.inc_session_cleanup_failure();
                ledger.cleanup_failed = true;
                let _ = self.events.publish(Event::SessionCleanupFailed {
                    run_id,
                    message: message.clone(),
                });
                self.record(
                    ledger,
                    StepKind::ReleaseSession,
                    StepStatus::Failed,
                    Some(message),
                );
            }
        }
    }

    fn record(
        &self,
        ledger: &mut RunLedger,
        step: StepKind,
        status: StepStatus,
        detail: Option<String>,
    ) {
        ledger.record(step, status, detail);
        self.metrics
            .inc_refresh_step(step.as_str(), status.as_str());
    }
}

/// Render the full cause chain of a refresh error.
fn error_chain(error: &RefreshError) -> String {
    use std::error::Error as _;

    let mut rendered = error.to_string();
    let mut cause = error.source();
    while let Some(current) = cause {
        rendered.push_str(": ");
        rendered.push_str(&current.to_string());
        cause = current.source();
    }
    rendered
}
