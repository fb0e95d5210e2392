//! Dependency wiring for the refresh run.
//!
//! The wiring order mirrors the run's needs: logging first so adapter
//! construction is observable, then metrics and the event bus, then the three
//! collaborators, then the service over all of them.

use std::sync::Arc;

use anyhow::{Context, Result};
use revolve_array::HttpVolumeStore;
use revolve_config::Settings;
use revolve_db::PgDatabaseController;
use revolve_events::{Event, EventBus};
use revolve_mount::CommandMountManager;
use revolve_refresh::RefreshService;
use revolve_telemetry::{LogFormat, LoggingConfig, Metrics, TelemetryResult, init_logging};
use tokio::task::JoinHandle;

/// Everything a run command needs beyond the parsed settings.
pub(crate) struct Runtime {
    pub(crate) events: EventBus,
    pub(crate) metrics: Metrics,
    pub(crate) service: RefreshService,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime").finish_non_exhaustive()
    }
}

/// Install the tracing subscriber according to the logging settings.
pub(crate) fn init_logging_from(settings: &Settings) -> TelemetryResult<()> {
    init_logging(&LoggingConfig {
        level: &settings.logging.level,
        format: LogFormat::from_config(settings.logging.format.as_deref()),
    })
}

/// Build the collaborators and the refresh service from validated settings.
pub(crate) fn build(settings: &Settings) -> Result<Runtime> {
    let metrics = Metrics::new().context("failed to build metrics registry")?;
    let events = EventBus::new();

    let database = Arc::new(
        PgDatabaseController::connect(&settings.database.admin_url)
            .context("failed to construct database controller")?,
    );
    let mounts = Arc::new(CommandMountManager::with_binaries(
        &settings.mount.mount_bin,
        &settings.mount.umount_bin,
    ));
    let volumes = Arc::new(
        HttpVolumeStore::new(&settings.array.endpoint, &settings.array.api_token)
            .context("failed to construct array client")?,
    );

    let service = RefreshService::new(database, mounts, volumes, events.clone(), metrics.clone());

    Ok(Runtime {
        events,
        metrics,
        service,
    })
}

/// Render step progress to stderr while the run executes.
pub(crate) fn spawn_progress_printer(events: &EventBus) -> JoinHandle<()> {
    let mut stream = events.subscribe(Some(0));
    tokio::spawn(async move {
        while let Some(envelope) = stream.next().await {
            match envelope.event {
                Event::StepStarted { step, .. } => eprintln!("  -> {step}"),
                Event::StepCompleted { step, detail, .. } => {
                    let suffix = detail.map(|d| format!(" ({d})")).unwrap_or_default();
                    eprintln!("  ok {step}{suffix}");
                }
                Event::StepFailed { step, message, .. } => eprintln!("  !! {step}: {message}"),
                Event::SessionCleanupFailed { message, .. } => {
                    eprintln!("  !! release_session: {message}");
                }
                _ => {}
            }
        }
    })
}
