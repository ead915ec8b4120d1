// src/exec/command.rs

//! `exec` and `shell` backends.

use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;

use crate::config::{ExecSpec, ShellSpec};
use crate::errors::ActionError;
use crate::exec::process::{CommandLine, SupervisedProcess};
use crate::types::Signal;

/// Runs `command[0]` with `command[1..]` as arguments.
#[derive(Debug)]
pub struct ExecBackend {
    process: SupervisedProcess,
}

impl ExecBackend {
    pub fn new(spec: &ExecSpec, global_env: &BTreeMap<String, String>, signal: Signal) -> Self {
        let line = CommandLine::from_argv(&spec.command)
            .unwrap_or_else(|| CommandLine {
                program: String::new(),
                args: Vec::new(),
                env: Vec::new(),
            })
            .with_env(merged_env(global_env, &spec.env));
        Self {
            process: SupervisedProcess::new(line, signal, spec.ignore_signals),
        }
    }

    pub fn process(&self) -> &SupervisedProcess {
        &self.process
    }

    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ActionError> {
        self.process.run(cancel).await
    }
}

/// Runs one command string through the configured shell (`sh -c` style).
#[derive(Debug)]
pub struct ShellBackend {
    process: SupervisedProcess,
}

impl ShellBackend {
    pub fn new(
        spec: &ShellSpec,
        shell: &[String],
        global_env: &BTreeMap<String, String>,
        signal: Signal,
    ) -> Self {
        let line = shell_line(shell, &spec.command).with_env(merged_env(global_env, &spec.env));
        Self {
            process: SupervisedProcess::new(line, signal, spec.ignore_signals),
        }
    }

    pub fn process(&self) -> &SupervisedProcess {
        &self.process
    }

    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ActionError> {
        self.process.run(cancel).await
    }
}

/// `shell[0] shell[1..] command`, defaulting to `sh -c` for an empty shell.
pub fn shell_line(shell: &[String], command: &str) -> CommandLine {
    let (program, flags) = match shell.split_first() {
        Some((program, flags)) => (program.clone(), flags.to_vec()),
        None => ("sh".to_string(), vec!["-c".to_string()]),
    };
    let mut args = flags;
    args.push(command.to_string());
    CommandLine {
        program,
        args,
        env: Vec::new(),
    }
}

/// Global variables first, then the action's own, so action values win.
pub fn merged_env(
    global: &BTreeMap<String, String>,
    action: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    global
        .iter()
        .chain(action.iter())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn action_env_overrides_global_env() {
        let env = merged_env(&map(&[("A", "global"), ("B", "b")]), &map(&[("A", "action")]));
        let resolved: BTreeMap<_, _> = env.into_iter().collect();
        assert_eq!(resolved.get("A").map(String::as_str), Some("action"));
        assert_eq!(resolved.get("B").map(String::as_str), Some("b"));
    }

    #[test]
    fn shell_command_is_appended_to_the_shell_invocation() {
        let line = shell_line(&["bash".into(), "-ec".into()], "make test");
        assert_eq!(line.program, "bash");
        assert_eq!(line.args, vec!["-ec".to_string(), "make test".to_string()]);

        let fallback = shell_line(&[], "ls");
        assert_eq!(fallback.program, "sh");
        assert_eq!(fallback.args, vec!["-c".to_string(), "ls".to_string()]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exec_backend_passes_merged_environment() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("env.txt");
        let spec = ExecSpec {
            command: vec![
                "sh".into(),
                "-c".into(),
                format!("printf '%s %s' \"$A\" \"$B\" > '{}'", out.display()),
            ],
            env: map(&[("B", "from-action")]),
            ignore_signals: false,
        };
        let backend = ExecBackend::new(&spec, &map(&[("A", "from-global"), ("B", "x")]), Signal::Kill);
        backend.run(CancellationToken::new()).await.unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "from-global from-action");
    }
}
