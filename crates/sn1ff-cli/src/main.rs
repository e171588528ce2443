//! sn1ff-check - report monitoring check results through the sn1ff collector
//!
//! Usage:
//!   sn1ff-check run --status OKAY --ttl 300 --line "disk ok"   Begin, append, end
//!   sn1ff-check begin                                           Open a record, print its handle
//!   sn1ff-check end --handle <H> --status OKAY --ttl 300        Submit an open record
//!   sn1ff-check sweep                                           Remove orphaned records
//!   sn1ff-check init-config                                     Write the default config

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sn1ff_collector::{CollectorClient, CommandCollector};
use sn1ff_core::config::DEFAULT_CONFIG_PATH;
use sn1ff_core::{CheckConfig, RecordHandle, Sn1ffError, Status, Ttl};
use sn1ff_session::{sweep_orphans, CheckSession};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "sn1ff-check")]
#[command(author, version, about = "Report monitoring check results to sn1ff")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a record, append observations and submit it
    Run {
        /// Check status (ALRT, WARN, OKAY, NONE)
        #[arg(short, long)]
        status: String,

        /// Minutes the status stays fresh
        #[arg(short, long, allow_negative_numbers = true)]
        ttl: i64,

        /// Observation line to append (repeatable)
        #[arg(short, long = "line", value_name = "TEXT")]
        lines: Vec<String>,

        /// Also append every line read from stdin
        #[arg(long)]
        stdin: bool,

        /// Submit to this remote sn1ff server instead of the configured one
        #[arg(long)]
        remote_host: Option<String>,
    },

    /// Open a record and print its handle
    Begin,

    /// Submit a record opened earlier
    End {
        /// Record handle printed by `begin`
        #[arg(short = 'f', long)]
        handle: String,

        /// Check status (ALRT, WARN, OKAY, NONE)
        #[arg(short, long)]
        status: String,

        /// Minutes the status stays fresh
        #[arg(short, long, allow_negative_numbers = true)]
        ttl: i64,

        /// Submit to this remote sn1ff server instead of the configured one
        #[arg(long)]
        remote_host: Option<String>,
    },

    /// Remove records that were opened but never submitted
    Sweep {
        /// Record directory (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Minimum age in minutes of a record to remove
        #[arg(long)]
        max_age_mins: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration file
    InitConfig {
        /// Destination (defaults to --config)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(e) = &result {
        eprintln!("ERROR: {:#}", e);
    }
    ExitCode::from(exit_code(&result))
}

/// Exit code for a finished command
///
/// Errors carry the code of the failing phase through any context layers.
fn exit_code(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            let code = e
                .downcast_ref::<Sn1ffError>()
                .map_or(1, Sn1ffError::exit_code);
            u8::try_from(code).unwrap_or(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = CheckConfig::load_or_default(&cli.config)?;

    // Setup logging; RUST_LOG wins over the config file
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.log.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            status,
            ttl,
            lines,
            stdin,
            remote_host,
        } => cmd_run(config, status, ttl, lines, stdin, remote_host).await,
        Commands::Begin => cmd_begin(config).await,
        Commands::End {
            handle,
            status,
            ttl,
            remote_host,
        } => cmd_end(config, handle, status, ttl, remote_host).await,
        Commands::Sweep {
            dir,
            max_age_mins,
            json,
        } => cmd_sweep(config, dir, max_age_mins, json).await,
        Commands::InitConfig { path } => cmd_init_config(path.unwrap_or(cli.config)),
    }
}

fn collector(mut config: CheckConfig, remote_host: Option<String>) -> Result<CommandCollector> {
    if remote_host.is_some() {
        config.collector.remote_host = remote_host;
    }
    Ok(CommandCollector::resolve(&config.collector)?)
}

async fn read_stdin_lines() -> Result<Vec<String>> {
    let mut reader = BufReader::new(tokio::io::stdin()).lines();
    let mut lines = Vec::new();
    while let Some(line) = reader.next_line().await? {
        lines.push(line);
    }
    Ok(lines)
}

async fn cmd_run(
    config: CheckConfig,
    status: String,
    ttl: i64,
    mut lines: Vec<String>,
    stdin: bool,
    remote_host: Option<String>,
) -> Result<()> {
    if stdin {
        let input = read_stdin_lines()
            .await
            .context("Cannot read observations from stdin")?;
        lines.extend(input);
    }

    report_check(
        || collector(config, remote_host),
        &status,
        ttl,
        &lines,
        &mut std::io::stdout(),
    )
    .await?;
    Ok(())
}

/// Begin a record, append `lines`, end it, then print the handle to `out`
///
/// Status and TTL are checked before the collector is built or contacted.
async fn report_check<C, F, W>(
    make_collector: F,
    status: &str,
    ttl: i64,
    lines: &[String],
    out: &mut W,
) -> Result<RecordHandle>
where
    C: CollectorClient,
    F: FnOnce() -> Result<C>,
    W: Write,
{
    let status = Status::new(status)?;
    let ttl = Ttl::new(ttl)?;

    let mut session = CheckSession::new(make_collector()?);

    let handle = session
        .begin()
        .await
        .context("Cannot begin sn1ff check results file")?;
    info!("sn1ff check results file created -> {}", handle);

    for line in lines {
        session
            .append(line)
            .await
            .with_context(|| format!("Cannot append to sn1ff check results file {}", handle))?;
    }

    if let Err(e) = session.submit(&status, ttl).await {
        error!("Record {} was not submitted", handle);
        return Err(e).with_context(|| {
            format!(
                "Cannot end sn1ff check results file; resubmit with: \
                 sn1ff-check end --handle {} --status {} --ttl {}",
                handle, status, ttl
            )
        });
    }

    info!("Completed sn1ff check results file and sent it to the sn1ff server");
    writeln!(out, "{}", handle)?;
    Ok(handle)
}

async fn cmd_begin(config: CheckConfig) -> Result<()> {
    let mut session = CheckSession::new(collector(config, None)?);
    let handle = session
        .begin()
        .await
        .context("Cannot begin sn1ff check results file")?;
    println!("{}", handle);
    Ok(())
}

async fn cmd_end(
    config: CheckConfig,
    handle: String,
    status: String,
    ttl: i64,
    remote_host: Option<String>,
) -> Result<()> {
    let handle = RecordHandle::parse(handle)?;
    let mut session = CheckSession::resume(collector(config, remote_host)?, handle.clone());
    session
        .end(&status, ttl)
        .await
        .with_context(|| format!("Cannot end sn1ff check results file {}", handle))?;
    info!("Submitted {}", handle);
    Ok(())
}

async fn cmd_sweep(
    mut config: CheckConfig,
    dir: Option<PathBuf>,
    max_age_mins: Option<u64>,
    json: bool,
) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => config.records.resolve_dir()?,
    };
    if let Some(mins) = max_age_mins {
        config.records.orphan_max_age_mins = mins;
    }
    let max_age = config.records.orphan_max_age();

    let report = sweep_orphans(&dir, max_age)
        .await
        .with_context(|| format!("Cannot sweep record directory {}", dir.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{}: {} records scanned, {} removed, {} failed",
            report.dir.display(),
            report.scanned,
            report.removed.len(),
            report.failed
        );
        for path in &report.removed {
            println!("  removed {}", path.display());
        }
    }
    Ok(())
}

fn cmd_init_config(path: PathBuf) -> Result<()> {
    CheckConfig::write_default(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
