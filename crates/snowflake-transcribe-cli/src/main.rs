//! snowflake-transcribe CLI - Snowflake account metadata replication.

use clap::{Parser, Subcommand};
use snowflake_transcribe::drivers::{self, SnowflakeSession};
use snowflake_transcribe::{
    CategoryOutcome, Config, ErrorPolicy, HealthCheckResult, ObjectCategory, ReplicationReport,
    RollbackReport, TranscribeError,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "snowflake-transcribe")]
#[command(about = "Replicate account metadata between Snowflake accounts")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy every object category from source to target
    Copy {
        /// Generate and report statements without executing them
        #[arg(long)]
        dry_run: bool,

        /// Also replicate roles granted to other roles
        #[arg(long)]
        include_role_grants: bool,

        /// Stop at the first statement the target rejects
        #[arg(long)]
        abort_on_error: bool,

        /// Write the rollback statements of this run to a SQL file
        #[arg(long)]
        rollback_script: Option<PathBuf>,

        /// Drop everything the run created once it finishes
        #[arg(long)]
        teardown: bool,
    },

    /// Copy a single object category
    Category {
        /// databases, users, roles, warehouses, user_role_grants,
        /// role_role_grants or role_object_grants
        name: String,

        /// Generate and report statements without executing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Test both account connections
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), TranscribeError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| TranscribeError::Config(e.to_string()))?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Copy {
            dry_run,
            include_role_grants,
            abort_on_error,
            rollback_script,
            teardown,
        } => {
            // Apply overrides
            if dry_run {
                config.replication.dry_run = true;
            }
            if include_role_grants {
                config.replication.include_role_role_grants = true;
            }
            if abort_on_error {
                config.replication.on_error = ErrorPolicy::Abort;
            }

            let mut session = drivers::connect(&config).await?;
            let result = session.copy_account().await;

            // Rendered before teardown: covers whatever was created, even
            // when the run stopped early.
            let script = session.rollback_script();
            let rollback = if teardown && result.is_ok() {
                Some(session.drop_added_objects().await)
            } else {
                None
            };
            session.close().await;

            if let Some(ref path) = rollback_script {
                match std::fs::write(path, script) {
                    Ok(()) => info!("Wrote rollback script to {:?}", path),
                    // The run error is the one to report.
                    Err(e) if result.is_err() => {
                        warn!("Failed to write rollback script to {:?}: {}", path, e)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            let report = result?;

            if cli.output_json {
                let output = serde_json::json!({
                    "replication": report,
                    "rollback": rollback,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_report(&report);
                if let Some(ref rollback) = rollback {
                    print_rollback(rollback);
                }
            }

            if let Some(rollback) = rollback {
                rollback.ensure_success()?;
            }
        }

        Commands::Category { name, dry_run } => {
            let category: ObjectCategory = name.parse()?;
            if dry_run {
                config.replication.dry_run = true;
            }

            let mut session = drivers::connect(&config).await?;
            let result = session.replicate(category).await;
            session.close().await;
            let outcome = result?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_category(&outcome);
            }
        }

        Commands::HealthCheck => {
            let session: SnowflakeSession = drivers::connect(&config).await?;
            let result = session.health_check().await;
            session.close().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_health(&result);
            }

            if !result.healthy {
                let failed = if result.source.connected {
                    &result.target
                } else {
                    &result.source
                };
                return Err(TranscribeError::connection(
                    &failed.account,
                    "health check failed",
                ));
            }
        }
    }

    Ok(())
}

fn print_report(report: &ReplicationReport) {
    let status_msg = if report.dry_run {
        "Dry run completed!"
    } else {
        "Account copy completed!"
    };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", report.run_id);
    println!("  Duration: {:.2}s", report.duration_seconds);
    for outcome in &report.categories {
        print_category(outcome);
    }
    println!(
        "\n  Total: {} executed, {} failed",
        report.total_created(),
        report.total_failed()
    );
}

fn print_category(outcome: &CategoryOutcome) {
    let skipped = outcome.skipped_reserved + outcome.skipped_unsupported;
    if outcome.planned > 0 {
        println!(
            "  {:<20} {} planned, {} skipped",
            outcome.category, outcome.planned, skipped
        );
    } else {
        println!(
            "  {:<20} {} created, {} failed, {} skipped",
            outcome.category, outcome.created, outcome.failed, skipped
        );
    }
    for failure in outcome.failures() {
        println!("    ✗ {}", failure.object);
    }
}

fn print_rollback(report: &RollbackReport) {
    println!("\nRollback:");
    println!("  Dropped: {}", report.dropped);
    if report.failed > 0 {
        println!("  Failed: {}", report.failed);
        for failure in report.statements.iter().filter(|s| s.is_failed()) {
            println!("    ✗ {}", failure.sql);
        }
    }
}

fn print_health(result: &HealthCheckResult) {
    println!("Health Check Results:");
    for (side, endpoint) in [("Source", &result.source), ("Target", &result.target)] {
        println!(
            "  {} ({}): {} ({}ms)",
            side,
            endpoint.account,
            if endpoint.connected { "OK" } else { "FAILED" },
            endpoint.latency_ms
        );
        if let Some(ref err) = endpoint.error {
            println!("    Error: {}", err);
        }
    }
    println!(
        "\n  Overall: {}",
        if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
    );
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
