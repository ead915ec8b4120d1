// src/config/validate.rs

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::duration::parse_delay;
use crate::config::model::{DelaySetting, RawAction, RawConfiguration, RawFilter, ShellSetting};
use crate::config::settings::{
    default_shell, Action, BackendSpec, Configuration, ContainerSpec, ExecSpec, HttpGetSpec,
    ShellSpec, Volume,
};
use crate::errors::{Result, WatchfsError};
use crate::types::{Operation, Signal, DEFAULT_SIGNAL};
use crate::watch::{Filter, GlobList};

/// Warning emitted when no watch root is configured.
pub const NO_PATHS_WARNING: &str = "no paths to watch specified. watching the current directory.";

impl TryFrom<RawConfiguration> for Configuration {
    type Error = WatchfsError;

    fn try_from(raw: RawConfiguration) -> std::result::Result<Self, Self::Error> {
        canonicalize(&raw)
    }
}

fn canonicalize(raw: &RawConfiguration) -> Result<Configuration> {
    let mut warnings = Vec::new();

    let watch_paths = watch_paths(raw, &mut warnings);

    let filter = compile_filter(
        &RawFilter {
            ext: raw.ext.clone(),
            exts: raw.exts.clone(),
            op: raw.op.clone(),
            ops: raw.ops.clone(),
            ..RawFilter::default()
        },
        "top-level filter",
    )?;

    let ignores = raw
        .ignores
        .iter()
        .enumerate()
        .map(|(i, f)| compile_filter(f, &format!("ignores[{i}]")))
        .collect::<Result<Vec<_>>>()?;

    let ignore_globs = GlobList::new(raw.ignore.clone())
        .map_err(|e| WatchfsError::ConfigError(format!("ignore: {e}")))?;

    let delay = delay_of(raw.delay.as_ref(), Duration::ZERO, "delay")?;

    let signal = match &raw.signal {
        Some(name) => signal_or_default(name, "signal", &mut warnings),
        None => DEFAULT_SIGNAL,
    };

    let shell = match &raw.shell {
        Some(ShellSetting::Argv(argv)) if !argv.is_empty() => argv.clone(),
        Some(ShellSetting::Line(line)) if !line.trim().is_empty() => split_words(line),
        _ => default_shell(),
    };

    let mut actions = Vec::with_capacity(raw.actions.len() + raw.exec_map.len());
    for (index, action) in raw.actions.iter().enumerate() {
        actions.push(compile_action(index, action, delay, &mut warnings)?);
    }
    for (ext, command) in raw.exec_map.iter() {
        actions.push(exec_map_action(ext, command, delay)?);
    }

    Ok(Configuration {
        source: None,
        watch_paths,
        filter,
        ignores,
        ignore_globs,
        env: raw.env.clone(),
        delay,
        signal,
        shell,
        actions,
        watch_self: raw.watch_self.unwrap_or(true),
        warnings,
    })
}

fn watch_paths(raw: &RawConfiguration, warnings: &mut Vec<String>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = raw
        .paths
        .iter()
        .chain(raw.watch.iter())
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect();
    // First occurrence wins.
    let mut seen = HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));

    if paths.is_empty() {
        warnings.push(NO_PATHS_WARNING.to_string());
        paths.push(PathBuf::from("."));
    }
    paths
}

fn compile_action(
    index: usize,
    raw: &RawAction,
    default_delay: Duration,
    warnings: &mut Vec<String>,
) -> Result<Action> {
    let backend = backend_of(index, raw)?;
    let name = raw
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("{}#{}", backend.kind(), index));

    let filter = compile_filter(&raw.filter, &format!("action '{name}'"))?;
    let ignore = match &raw.ignore {
        Some(f) => Some(compile_filter(f, &format!("action '{name}' ignore"))?),
        None => None,
    };
    let delay = delay_of(raw.delay.as_ref(), default_delay, &format!("action '{name}' delay"))?;
    let signal = raw
        .signal
        .as_deref()
        .map(|s| signal_or_default(s, &format!("action '{name}' signal"), warnings));

    let mut locks: Vec<String> = raw
        .locks
        .iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    locks.sort();
    locks.dedup();

    Ok(Action {
        name,
        filter,
        ignore,
        delay,
        locks,
        signal,
        run_on_start: raw.run_on_start.unwrap_or(true),
        backend,
    })
}

fn backend_of(index: usize, raw: &RawAction) -> Result<BackendSpec> {
    let mut found = Vec::new();

    if let Some(exec) = &raw.exec {
        if exec.command.is_empty() {
            return Err(config_error(index, "exec.command must not be empty"));
        }
        found.push(BackendSpec::Exec(ExecSpec {
            command: exec.command.clone(),
            env: exec.env.clone(),
            ignore_signals: exec.ignore_signals,
        }));
    }
    if let Some(shell) = &raw.shell {
        if shell.command.trim().is_empty() {
            return Err(config_error(index, "shell.command must not be empty"));
        }
        found.push(BackendSpec::Shell(ShellSpec {
            command: shell.command.clone(),
            env: shell.env.clone(),
            ignore_signals: shell.ignore_signals,
        }));
    }
    if let Some(docker) = &raw.docker_run {
        if docker.image.trim().is_empty() {
            return Err(config_error(index, "dockerRun.image must not be empty"));
        }
        found.push(BackendSpec::ContainerRun(ContainerSpec {
            runtime: docker
                .runtime
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "docker".to_string()),
            image: docker.image.clone(),
            entrypoint: docker.entrypoint.clone(),
            command: docker.command.clone(),
            env: docker.env.clone(),
            extra_args: docker.extra_args.clone(),
            workdir: docker.workdir.clone(),
            volumes: docker
                .volumes
                .iter()
                .map(|v| Volume {
                    kind: v
                        .kind
                        .clone()
                        .filter(|k| !k.is_empty())
                        .unwrap_or_else(|| "bind".to_string()),
                    source: v.source.clone(),
                    target: v.target.clone(),
                })
                .collect(),
            ignore_signals: docker.ignore_signals,
        }));
    }
    if let Some(http) = &raw.http_get {
        if http.url.trim().is_empty() {
            return Err(config_error(index, "httpGet.url must not be empty"));
        }
        found.push(BackendSpec::HttpGet(HttpGetSpec {
            url: http.url.trim().to_string(),
        }));
    }

    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(config_error(
            index,
            "must define one of exec, shell, dockerRun or httpGet",
        )),
        n => Err(config_error(
            index,
            &format!("defines {n} backends; exactly one of exec, shell, dockerRun or httpGet is allowed"),
        )),
    }
}

fn exec_map_action(ext: &str, command: &str, delay: Duration) -> Result<Action> {
    let tokens = split_words(command);
    if tokens.is_empty() {
        return Err(WatchfsError::ConfigError(format!(
            "execMap entry '{ext}' has an empty command"
        )));
    }
    let filter = Filter::new([ext], [], Vec::<String>::new())?;

    Ok(Action {
        name: format!("execMap.{ext}"),
        filter,
        ignore: None,
        delay,
        locks: Vec::new(),
        signal: None,
        run_on_start: true,
        backend: BackendSpec::Exec(ExecSpec {
            command: tokens,
            ..ExecSpec::default()
        }),
    })
}

/// Compile a raw filter, merging the CSV and list spellings.
pub fn compile_filter(raw: &RawFilter, context: &str) -> Result<Filter> {
    let exts: Vec<String> = split_csv(raw.ext.as_deref())
        .chain(raw.exts.iter().cloned())
        .collect();

    let ops = split_csv(raw.op.as_deref())
        .chain(raw.ops.iter().cloned())
        .filter(|o| !o.trim().is_empty())
        .map(|o| {
            o.parse::<Operation>()
                .map_err(|e| WatchfsError::ConfigError(format!("{context}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let patterns: Vec<String> = raw
        .paths
        .iter()
        .chain(raw.watch.iter())
        .filter(|p| !p.trim().is_empty())
        .cloned()
        .collect();

    Filter::new(exts, ops, patterns)
        .map_err(|e| WatchfsError::ConfigError(format!("{context}: {e}")))
}

fn split_csv(csv: Option<&str>) -> impl Iterator<Item = String> + '_ {
    csv.into_iter()
        .flat_map(|s| s.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Split a command line with shell word rules; an unparsable line is kept
/// as a single word.
pub fn split_words(line: &str) -> Vec<String> {
    shlex::split(line).unwrap_or_else(|| vec![line.to_string()])
}

fn delay_of(setting: Option<&DelaySetting>, default: Duration, context: &str) -> Result<Duration> {
    match setting {
        None => Ok(default),
        Some(DelaySetting::Millis(ms)) => Ok(Duration::from_millis(*ms)),
        Some(DelaySetting::Text(text)) => {
            parse_delay(text).map_err(|e| WatchfsError::ConfigError(format!("{context}: {e}")))
        }
    }
}

fn signal_or_default(name: &str, context: &str, warnings: &mut Vec<String>) -> Signal {
    match name.parse::<Signal>() {
        Ok(sig) => sig,
        Err(_) => {
            warnings.push(format!(
                "{context}: unknown signal '{name}', using {DEFAULT_SIGNAL}"
            ));
            DEFAULT_SIGNAL
        }
    }
}

fn config_error(index: usize, message: &str) -> WatchfsError {
    WatchfsError::ConfigError(format!("actions[{index}]: {message}"))
}
