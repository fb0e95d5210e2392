//! Report rendering for the `run` command.

use clap::ValueEnum;
use revolve_refresh::RefreshReport;

use crate::cli::{CliError, CliResult};

/// Output formats for the run report.
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Table,
    /// Machine-readable JSON document.
    Json,
}

/// Render the run report to stdout.
pub(crate) fn render_report(report: &RefreshReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(report)
                .map_err(|err| CliError::failure(anyhow::anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!("run:      {}", report.run_id);
            println!("database: {}", report.request.database);
            println!("mount:    {}", report.request.mount_path.display());
            println!(
                "volumes:  {} -> {}{}",
                report.request.source_volume,
                report.request.target_volume,
                if report.request.overwrite {
                    " (overwrite)"
                } else {
                    ""
                }
            );
            if let Some(session) = &report.session {
                println!("session:  {session}");
            }
            println!("steps:");
            for record in &report.steps {
                let detail = record.detail.as_deref().unwrap_or("");
                println!(
                    "  {:<16} {:<10} {detail}",
                    record.step.as_str(),
                    record.status.as_str()
                );
            }
            if report.cleanup_failed {
                println!("warning:  copy session release failed; see the step ledger");
            }
            let duration = report.finished_at - report.started_at;
            println!("duration: {}s", duration.num_seconds());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use revolve_refresh::{RefreshRequest, StepKind, StepRecord, StepStatus};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn sample_report() -> RefreshReport {
        let now = Utc::now();
        RefreshReport {
            run_id: Uuid::new_v4(),
            request: RefreshRequest {
                database: "TestDB".to_string(),
                mount_path: PathBuf::from("/data/TestDB"),
                source_volume: "prod-vol".to_string(),
                target_volume: "test-vol".to_string(),
                overwrite: true,
            },
            steps: vec![StepRecord {
                step: StepKind::TakeOffline,
                status: StepStatus::Completed,
                detail: Some("database=TestDB".to_string()),
                recorded_at: now,
            }],
            session: Some("sess-17".to_string()),
            cleanup_failed: false,
            started_at: now,
            finished_at: now,
        }
    }

    #[test]
    fn json_report_round_trips_step_names() {
        let report = sample_report();
        let text = serde_json::to_string_pretty(&report).expect("serialise report");
        assert!(text.contains(&report.run_id.to_string()));
        assert!(text.contains(r#""step": "take_offline""#));
        assert!(text.contains(r#""status": "completed""#));
    }

    #[test]
    fn render_report_accepts_both_formats() {
        let report = sample_report();
        render_report(&report, OutputFormat::Table).expect("table rendering");
        render_report(&report, OutputFormat::Json).expect("json rendering");
    }
}
