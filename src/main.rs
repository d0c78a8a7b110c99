//! zpool-create
//!
//! Creates storage pools on a JBOD appliance from a layout file.
//!
//! ```text
//! zpool-create [-c layouts.json] [--layout NAME] [--yes] [--dry-run]
//! ```

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zpool_create::layout::DEFAULT_CONFIG_PATH;
use zpool_create::{
    CommandRunner, ConsolePrompter, Error, Orchestrator, OrchestratorConfig, PoolCommandBuilder,
    RunOutcome,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Storage Pool Creator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Layout configuration file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long, env = "ZPOOL_CREATE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Layout to create, instead of choosing interactively
    #[arg(long)]
    layout: Option<String>,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Validate the layout and print the commands without creating pools
    #[arg(long)]
    dry_run: bool,

    /// Directory pools are mounted under
    #[arg(long, default_value = "/volumes")]
    mount_root: String,

    /// Timeout in seconds for each pool creation (none by default)
    #[arg(long)]
    create_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(&args);

    info!("Storage Pool Creator {}", zpool_create::VERSION);

    let config = OrchestratorConfig {
        config_path: args.config.clone(),
        layout: args.layout.clone(),
        assume_yes: args.yes,
        dry_run: args.dry_run,
        create_timeout: args.create_timeout_secs.map(Duration::from_secs),
        ..Default::default()
    };

    let mut orchestrator = Orchestrator::new(config, CommandRunner::new(), ConsolePrompter::stdio())
        .with_builder(PoolCommandBuilder::with_mount_root(args.mount_root.as_str()));

    // Dropping the run on interrupt kills the running command's process group
    let code = tokio::select! {
        result = orchestrator.run() => match result {
            Ok(RunOutcome::Declined { .. }) => 0,
            Ok(RunOutcome::Completed(summary)) => {
                if args.log_json {
                    match serde_json::to_string(&summary) {
                        Ok(json) => info!(summary = %json, "Run summary"),
                        Err(e) => warn!("Cannot serialize run summary: {}", e),
                    }
                } else {
                    for (pool, command) in &summary.pools {
                        info!("{}: {}", pool, command);
                    }
                }
                0
            }
            Err(e) => {
                report(&e);
                e.exit_code()
            }
        },
        _ = tokio::signal::ctrl_c() => {
            error!("Killed by user");
            1
        }
    };

    std::process::exit(code);
}

fn report(err: &Error) {
    error!(kind = ?err.kind(), "{}", err);
    if err.needs_layout_review() {
        error!("Invalid configuration file and/or slot placement");
        error!("Please review the configuration file AND slotmap");
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}
