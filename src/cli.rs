// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Flags are layered over the configuration file by
//! [`CliArgs::apply_overrides`] at the start of every session, so a reload
//! keeps honouring them.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{RawAction, RawConfiguration, RawDockerRun, RawExec, RawFilter, RawHttpGet, RawShell};
use crate::output::Reporter;
use crate::types::{ActionKind, Operation, Signal};

/// Command-line arguments for `watchfs`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchfs",
    version,
    about = "Run commands, containers or HTTP requests when files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Config file (YAML, JSON or TOML).
    ///
    /// Default: the first of watchfs.yaml, watchfs.yml, watchfs.json,
    /// watchfs.toml, nodemon.json in the working directory.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Extension to watch (repeatable).
    #[arg(long = "ext", value_name = "EXT")]
    pub ext: Vec<String>,

    /// Extensions to watch (CSV).
    #[arg(short = 'e', long = "exts", value_name = "CSV", value_delimiter = ',')]
    pub exts: Vec<String>,

    /// Path to watch (repeatable). Replaces the paths from the config file.
    #[arg(long = "watch", value_name = "PATH")]
    pub watch: Vec<String>,

    /// Paths to watch (CSV).
    #[arg(short = 'w', long = "watches", value_name = "CSV", value_delimiter = ',')]
    pub watches: Vec<String>,

    /// Path or glob to ignore (repeatable).
    #[arg(short = 'i', long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Extension to ignore (repeatable).
    #[arg(long = "ignore-ext", value_name = "EXT")]
    pub ignore_ext: Vec<String>,

    /// Extensions to ignore (CSV).
    #[arg(long = "ignore-exts", value_name = "CSV", value_delimiter = ',')]
    pub ignore_exts: Vec<String>,

    /// Filesystem operation to watch for (chmod, create, remove, rename, write).
    #[arg(long = "op", value_name = "OP")]
    pub op: Vec<Operation>,

    /// Filesystem operations to watch for (CSV).
    #[arg(long = "ops", value_name = "CSV", value_delimiter = ',')]
    pub ops: Vec<Operation>,

    /// Filesystem operation to ignore.
    #[arg(long = "ignore-op", value_name = "OP")]
    pub ignore_op: Vec<Operation>,

    /// Filesystem operations to ignore (CSV).
    #[arg(long = "ignore-ops", value_name = "CSV", value_delimiter = ',')]
    pub ignore_ops: Vec<Operation>,

    /// Signal sent to a running action when a new change arrives.
    #[arg(short = 's', long, value_name = "SIGNAL")]
    pub signal: Option<Signal>,

    /// Kind of the action built from the trailing arguments.
    #[arg(short = 'a', long, value_enum, default_value_t = ActionKind::Exec)]
    pub action: ActionKind,

    /// Print the effective configuration and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Format used by --print-config.
    #[arg(long, value_enum, default_value_t = PrintFormat::Yaml)]
    pub print_config_format: PrintFormat,

    /// Do not print filesystem events to stdout.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHFS_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Command for the default action.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PrintFormat {
    Json,
    Yaml,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

impl CliArgs {
    /// Layer the flags over a configuration read from disk.
    ///
    /// List flags for extensions, operations and paths replace the file's
    /// values; ignore flags append. Trailing arguments add a default action
    /// of the `--action` kind.
    pub fn apply_overrides(&self, raw: &mut RawConfiguration, reporter: &Reporter) {
        if !self.ext.is_empty() {
            raw.exts = self.ext.clone();
        }
        if !self.exts.is_empty() {
            raw.ext = Some(self.exts.join(","));
        }

        if !self.watch.is_empty() {
            raw.paths = self.watch.clone();
        }
        raw.paths.extend(
            self.watches
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        );

        if !self.op.is_empty() {
            raw.ops = op_names(&self.op);
        }
        if !self.ops.is_empty() {
            raw.op = Some(op_names(&self.ops).join(","));
        }

        if !self.ignore_ext.is_empty() {
            raw.ignores.push(RawFilter {
                exts: self.ignore_ext.clone(),
                ..RawFilter::default()
            });
        }
        if !self.ignore_exts.is_empty() {
            raw.ignores.push(RawFilter {
                ext: Some(self.ignore_exts.join(",")),
                ..RawFilter::default()
            });
        }
        if !self.ignore_op.is_empty() {
            raw.ignores.push(RawFilter {
                ops: op_names(&self.ignore_op),
                ..RawFilter::default()
            });
        }
        if !self.ignore_ops.is_empty() {
            raw.ignores.push(RawFilter {
                op: Some(op_names(&self.ignore_ops).join(",")),
                ..RawFilter::default()
            });
        }

        raw.ignore.extend(self.ignore.iter().cloned());

        if let Some(signal) = self.signal {
            raw.signal = Some(signal.name().to_string());
        }

        if let Some(action) = self.default_action(reporter) {
            raw.actions.push(action);
        }
    }

    fn default_action(&self, reporter: &Reporter) -> Option<RawAction> {
        let (first, rest) = self.command.split_first()?;
        let mut action = RawAction::default();
        match self.action {
            ActionKind::Exec => {
                action.exec = Some(RawExec {
                    command: self.command.clone(),
                    ..RawExec::default()
                });
            }
            ActionKind::Shell => {
                let command = shlex::try_join(self.command.iter().map(String::as_str))
                    .unwrap_or_else(|_| self.command.join(" "));
                action.shell = Some(RawShell {
                    command,
                    ..RawShell::default()
                });
            }
            ActionKind::DockerRun => {
                action.docker_run = Some(RawDockerRun {
                    image: first.clone(),
                    command: Some(rest.to_vec()),
                    ..RawDockerRun::default()
                });
            }
            ActionKind::HttpGet => {
                if !rest.is_empty() {
                    reporter.error(format!(
                        "too many arguments for action '{}': {:?}",
                        self.action, self.command
                    ));
                }
                action.http_get = Some(RawHttpGet { url: first.clone() });
            }
        }
        Some(action)
    }
}

fn op_names(ops: &[Operation]) -> Vec<String> {
    ops.iter().map(|op| op.as_str().to_string()).collect()
}
