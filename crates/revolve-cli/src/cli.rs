//! Command-line surface for the refresh tool.
//!
//! `run` executes one refresh against the configured target; `check`
//! validates the configuration without touching anything. Validation problems
//! exit with code 2, failed runs with code 3, so automation can distinguish
//! "fix your input" from "inspect the target".

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use revolve_config::{ConfigError, Settings};
use revolve_refresh::{RefreshError, RefreshRequest};

use crate::bootstrap;
use crate::output::{self, OutputFormat};

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub(crate) async fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Run(args) => handle_run(&cli.config, cli.output, args).await,
        Command::Check => handle_check(&cli.config),
    }
}

#[derive(Parser)]
#[command(
    name = "revolve",
    about = "Refresh a non-production database from a storage-array clone of a production volume"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "REVOLVE_CONFIG",
        default_value = "revolve.toml",
        help = "Path to the configuration file"
    )]
    config: PathBuf,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for the run report"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute one refresh run against the configured target.
    ///
    /// Running two refreshes against the same target concurrently is
    /// undefined; serialise runs externally.
    Run(RunArgs),
    /// Validate the configuration file and exit.
    Check,
}

#[derive(Args, Default)]
struct RunArgs {
    #[arg(long, help = "Override the target database name")]
    database: Option<String>,
    #[arg(long, help = "Override the mount path backing the target database")]
    mount_path: Option<PathBuf>,
    #[arg(long, help = "Override the volume the data is copied from")]
    source_volume: Option<String>,
    #[arg(long, help = "Override the volume the data is copied onto")]
    target_volume: Option<String>,
    #[arg(
        long,
        help = "Refuse to discard the target volume's existing content"
    )]
    no_overwrite: bool,
    #[arg(long, help = "Print Prometheus metrics text after the run")]
    metrics: bool,
}

async fn handle_run(config: &Path, format: OutputFormat, args: RunArgs) -> CliResult<()> {
    let mut settings = load_settings(config)?;
    apply_run_overrides(&mut settings, &args);
    revolve_config::validate(&settings).map_err(|err| config_error(config, err))?;

    bootstrap::init_logging_from(&settings)
        .map_err(|err| CliError::failure(anyhow::Error::new(err)))?;
    let runtime = bootstrap::build(&settings).map_err(CliError::failure)?;

    let printer = if matches!(format, OutputFormat::Table) {
        Some(bootstrap::spawn_progress_printer(&runtime.events))
    } else {
        None
    };

    let request = request_from(&settings);
    let result = runtime.service.run(&request).await;

    if let Some(printer) = printer {
        printer.abort();
    }

    match result {
        Ok(report) => {
            output::render_report(&report, format)?;
            if args.metrics {
                let rendered = runtime
                    .metrics
                    .render()
                    .map_err(|err| CliError::failure(anyhow::Error::new(err)))?;
                println!("{rendered}");
            }
            Ok(())
        }
        Err(error) => Err(CliError::refresh(error)),
    }
}

fn handle_check(config: &Path) -> CliResult<()> {
    let settings = load_settings(config)?;
    println!(
        "configuration OK: database '{}' on {} <- volume '{}' over '{}'",
        settings.database.name,
        settings.mount.path.display(),
        settings.array.source_volume,
        settings.array.target_volume,
    );
    Ok(())
}

fn load_settings(config: &Path) -> CliResult<Settings> {
    revolve_config::load(config).map_err(|err| config_error(config, err))
}

fn config_error(config: &Path, err: ConfigError) -> CliError {
    match err {
        ConfigError::Io { path, source } => CliError::validation(format!(
            "cannot read configuration file '{}': {source}",
            path.display()
        )),
        ConfigError::Parse { path, source } => CliError::validation(format!(
            "configuration file '{}' is not valid TOML: {source}",
            path.display()
        )),
        ConfigError::InvalidField {
            field,
            reason,
            value,
        } => {
            let rendered_value = value
                .map(|value| format!(" (value: '{value}')"))
                .unwrap_or_default();
            CliError::validation(format!(
                "invalid setting '{field}' in '{}': {reason}{rendered_value}",
                config.display()
            ))
        }
    }
}

fn apply_run_overrides(settings: &mut Settings, args: &RunArgs) {
    if let Some(database) = &args.database {
        settings.database.name = database.clone();
    }
    if let Some(mount_path) = &args.mount_path {
        settings.mount.path = mount_path.clone();
    }
    if let Some(source_volume) = &args.source_volume {
        settings.array.source_volume = source_volume.clone();
    }
    if let Some(target_volume) = &args.target_volume {
        settings.array.target_volume = target_volume.clone();
    }
    if args.no_overwrite {
        settings.array.overwrite = false;
    }
}

fn request_from(settings: &Settings) -> RefreshRequest {
    RefreshRequest {
        database: settings.database.name.clone(),
        mount_path: settings.mount.path.clone(),
        source_volume: settings.array.source_volume.clone(),
        target_volume: settings.array.target_volume.clone(),
        overwrite: settings.array.overwrite,
    }
}

#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    fn refresh(error: RefreshError) -> Self {
        let step = error.step();
        Self::Failure(anyhow!(
            "refresh failed at step '{step}': {:#}",
            anyhow::Error::new(error)
        ))
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revolve_config::from_toml_str;

    const SAMPLE: &str = r#"
[database]
admin_url = "postgres://ops@db.internal/postgres"
name = "TestDB"

[mount]
path = "/data/TestDB"

[array]
endpoint = "https://array.internal"
api_token = "28a21f21"
source_volume = "prod-vol"
target_volume = "test-vol"
"#;

    #[test]
    fn cli_parses_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "revolve",
            "run",
            "--database",
            "StageDB",
            "--target-volume",
            "stage-vol",
            "--no-overwrite",
        ])
        .expect("arguments should parse");

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.database.as_deref(), Some("StageDB"));
                assert_eq!(args.target_volume.as_deref(), Some("stage-vol"));
                assert!(args.no_overwrite);
                assert!(!args.metrics);
            }
            Command::Check => panic!("expected the run command"),
        }
    }

    #[test]
    fn cli_parses_check_with_config_path() {
        let cli = Cli::try_parse_from(["revolve", "check", "--config", "/etc/revolve.toml"])
            .expect("arguments should parse");
        assert_eq!(cli.config, PathBuf::from("/etc/revolve.toml"));
        assert!(matches!(cli.command, Command::Check));
    }

    #[test]
    fn run_overrides_are_applied_to_settings() {
        let mut settings = from_toml_str(SAMPLE).expect("sample settings");
        let args = RunArgs {
            database: Some("StageDB".to_string()),
            mount_path: Some(PathBuf::from("/data/StageDB")),
            source_volume: None,
            target_volume: Some("stage-vol".to_string()),
            no_overwrite: true,
            metrics: false,
        };

        apply_run_overrides(&mut settings, &args);

        assert_eq!(settings.database.name, "StageDB");
        assert_eq!(settings.mount.path, PathBuf::from("/data/StageDB"));
        assert_eq!(settings.array.source_volume, "prod-vol");
        assert_eq!(settings.array.target_volume, "stage-vol");
        assert!(!settings.array.overwrite);
    }

    #[test]
    fn request_mirrors_settings() {
        let settings = from_toml_str(SAMPLE).expect("sample settings");
        let request = request_from(&settings);
        assert_eq!(request.database, "TestDB");
        assert_eq!(request.mount_path, PathBuf::from("/data/TestDB"));
        assert_eq!(request.source_volume, "prod-vol");
        assert_eq!(request.target_volume, "test-vol");
        assert!(request.overwrite);
    }

    #[test]
    fn exit_codes_distinguish_validation_from_failure() {
        assert_eq!(CliError::validation("bad flag").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow!("boom")).exit_code(), 3);
    }

    #[test]
    fn config_errors_render_the_offending_field() {
        let err = config_error(
            &PathBuf::from("revolve.toml"),
            ConfigError::InvalidField {
                field: "array.target_volume",
                reason: "same_as_source",
                value: Some("prod-vol".to_string()),
            },
        );
        let message = err.display_message();
        assert!(message.contains("array.target_volume"), "message: {message}");
        assert!(message.contains("same_as_source"), "message: {message}");
        assert_eq!(err.exit_code(), 2);
    }
}
