// src/exec/container.rs

//! `dockerRun` backend: runs an image through a container runtime CLI.
//!
//! Signals are forwarded to the runtime client process, which relays them to
//! the container (`--init` keeps that relay well-behaved).

use std::collections::BTreeMap;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::config::ContainerSpec;
use crate::errors::ActionError;
use crate::exec::process::{CommandLine, SupervisedProcess};
use crate::types::Signal;
use crate::watch::path_utils::absolute;

#[derive(Debug)]
pub struct ContainerBackend {
    process: SupervisedProcess,
}

impl ContainerBackend {
    pub fn new(spec: &ContainerSpec, global_env: &BTreeMap<String, String>, signal: Signal) -> Self {
        let line = CommandLine {
            program: spec.runtime.clone(),
            args: container_args(spec, global_env),
            env: Vec::new(),
        };
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

/// Arguments passed to the runtime:
/// `run --init --rm -t -a stdout -a stderr [--entrypoint E] [-e K=V]...
/// [--mount type=T,source=S,target=D]... [--workdir W] <extraArgs> <image> <command>`.
///
/// Bind-mount sources are made absolute.
pub fn container_args(spec: &ContainerSpec, global_env: &BTreeMap<String, String>) -> Vec<String> {
    let mut args: Vec<String> = ["run", "--init", "--rm", "-t", "-a", "stdout", "-a", "stderr"]
        .into_iter()
        .map(String::from)
        .collect();

    if let Some(entrypoint) = &spec.entrypoint {
        args.push("--entrypoint".into());
        args.push(entrypoint.clone());
    }

    for (key, value) in global_env.iter().chain(spec.env.iter()) {
        args.push("-e".into());
        args.push(format!("{key}={value}"));
    }

    for volume in &spec.volumes {
        let source = if volume.kind == "bind" {
            absolute(Path::new(&volume.source)).to_string_lossy().into_owned()
        } else {
            volume.source.clone()
        };
        args.push("--mount".into());
        args.push(format!(
            "type={},source={},target={}",
            volume.kind, source, volume.target
        ));
    }

    if let Some(workdir) = &spec.workdir {
        args.push("--workdir".into());
        args.push(workdir.clone());
    }

    args.extend(spec.extra_args.iter().cloned());
    args.push(spec.image.clone());
    if let Some(command) = &spec.command {
        args.extend(command.iter().cloned());
    }
    args
}
