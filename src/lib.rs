// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod output;
pub mod types;
pub mod watch;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{CliArgs, PrintFormat};
use crate::config::{discover_config_path, load_from_path, Configuration, RawConfiguration};
use crate::engine::{run_session, LockRegistry, Services, SessionOutcome};
use crate::exec::SystemBackends;
use crate::output::Reporter;
use crate::watch::path_utils::absolute;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config discovery, loading and CLI overrides
/// - the shared services (lock registry, reporter, backend factory)
/// - the session loop (a new session after every config reload)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let reporter = Arc::new(Reporter::stdio(args.quiet));
    let cwd = std::env::current_dir().context("reading the working directory")?;
    let config_path = discover_config_path(args.config.as_deref(), &cwd);

    if args.print_config {
        let raw = effective_raw(&args, config_path.as_deref(), &reporter)?;
        Configuration::try_from(raw.clone())?;
        return print_config(&raw, args.print_config_format);
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; shutting down");
            shutdown.cancel();
        });
    }

    let services = Services {
        locks: Arc::new(LockRegistry::new()),
        reporter: reporter.clone(),
        backends: Arc::new(SystemBackends),
    };

    supervise_sessions(
        || session_config(&args, config_path.as_deref(), &reporter),
        &services,
        &shutdown,
    )
    .await
}

/// Run sessions back to back until `shutdown` fires.
///
/// `load` is called before every session. A failure on the first call is
/// returned; a later failure is reported as an error record and the last
/// good configuration is used again.
pub async fn supervise_sessions<F>(
    mut load: F,
    services: &Services,
    shutdown: &CancellationToken,
) -> Result<()>
where
    F: FnMut() -> Result<Configuration>,
{
    let mut last_good: Option<Configuration> = None;
    loop {
        let config = match (load(), last_good.take()) {
            (Ok(config), _) => config,
            (Err(err), Some(previous)) => {
                warn!(error = %err, "reload failed; keeping previous configuration");
                services.reporter.error(format!("{err:#}"));
                previous
            }
            (Err(err), None) => return Err(err),
        };

        let outcome = run_session(&config, services, shutdown).await?;
        last_good = Some(config);
        if outcome == SessionOutcome::Shutdown {
            break;
        }
    }
    Ok(())
}

/// File configuration (if any) with the CLI flags layered on top.
fn effective_raw(
    args: &CliArgs,
    config_path: Option<&Path>,
    reporter: &Reporter,
) -> Result<RawConfiguration> {
    let mut raw = match config_path {
        Some(path) => load_from_path(path)
            .with_context(|| format!("loading config file {}", path.display()))?,
        None => RawConfiguration::default(),
    };
    args.apply_overrides(&mut raw, reporter);
    Ok(raw)
}

fn session_config(
    args: &CliArgs,
    config_path: Option<&Path>,
    reporter: &Reporter,
) -> Result<Configuration> {
    let raw = effective_raw(args, config_path, reporter)?;
    let mut config = Configuration::try_from(raw)?;
    config.source = config_path.map(absolute);
    Ok(config)
}

fn print_config(raw: &RawConfiguration, format: PrintFormat) -> Result<()> {
    let rendered = match format {
        PrintFormat::Json => serde_json::to_string_pretty(raw)? + "\n",
        PrintFormat::Yaml => serde_yaml::to_string(raw)?,
    };
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
