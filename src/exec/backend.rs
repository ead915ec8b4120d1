// src/exec/backend.rs

//! Action backend abstraction.
//!
//! Pipelines talk to an [`ActionBackend`] rather than to a concrete process
//! runner, so tests can swap in a recording fake while production uses the
//! [`Backend`] sum type built from the configuration.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{Action, BackendSpec, Configuration};
use crate::errors::ActionError;
use crate::exec::command::{ExecBackend, ShellBackend};
use crate::exec::container::ContainerBackend;
use crate::exec::http::HttpGetBackend;
use crate::types::ActionKind;
use crate::watch::Event;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Run/notify capability shared by every backend kind.
pub trait ActionBackend: Send + Sync {
    /// Perform the side effect once. Returns when the process (or request)
    /// finishes, or promptly after `cancel` fires.
    fn run(&self, cancel: CancellationToken) -> BoxFuture<'_, Result<(), ActionError>>;

    /// Tell the backend about an event that arrived while a run is pending.
    ///
    /// `Ok(true)` means the event was acknowledged (a signal was delivered,
    /// or the backend ignores signals); `Ok(false)` means there was nothing
    /// to signal.
    fn notify<'a>(&'a self, event: &'a Event) -> BoxFuture<'a, Result<bool, ActionError>>;
}

/// Production backends.
#[derive(Debug)]
pub enum Backend {
    Exec(ExecBackend),
    Shell(ShellBackend),
    ContainerRun(ContainerBackend),
    HttpGet(HttpGetBackend),
}

impl Backend {
    /// Build the backend for `action`, resolving its signal against the
    /// global one and passing the global environment and shell.
    pub fn from_spec(action: &Action, config: &Configuration) -> Self {
        let signal = action.effective_signal(config.signal);
        match &action.backend {
            BackendSpec::Exec(spec) => Backend::Exec(ExecBackend::new(spec, &config.env, signal)),
            BackendSpec::Shell(spec) => {
                Backend::Shell(ShellBackend::new(spec, &config.shell, &config.env, signal))
            }
            BackendSpec::ContainerRun(spec) => {
                Backend::ContainerRun(ContainerBackend::new(spec, &config.env, signal))
            }
            BackendSpec::HttpGet(spec) => Backend::HttpGet(HttpGetBackend::new(spec)),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Backend::Exec(_) => ActionKind::Exec,
            Backend::Shell(_) => ActionKind::Shell,
            Backend::ContainerRun(_) => ActionKind::DockerRun,
            Backend::HttpGet(_) => ActionKind::HttpGet,
        }
    }
}

impl ActionBackend for Backend {
    fn run(&self, cancel: CancellationToken) -> BoxFuture<'_, Result<(), ActionError>> {
        Box::pin(async move {
            match self {
                Backend::Exec(b) => b.run(cancel).await,
                Backend::Shell(b) => b.run(cancel).await,
                Backend::ContainerRun(b) => b.run(cancel).await,
                Backend::HttpGet(b) => b.run(cancel).await,
            }
        })
    }

    fn notify<'a>(&'a self, _event: &'a Event) -> BoxFuture<'a, Result<bool, ActionError>> {
        Box::pin(async move {
            match self {
                Backend::Exec(b) => b.process().forward_signal().await,
                Backend::Shell(b) => b.process().forward_signal().await,
                Backend::ContainerRun(b) => b.process().forward_signal().await,
                Backend::HttpGet(_) => Ok(false),
            }
        })
    }
}

/// Builds the backend of each action when a session starts.
pub trait BackendFactory: Send + Sync {
    fn build(&self, action: &Action, config: &Configuration) -> Arc<dyn ActionBackend>;
}

/// Factory producing the real [`Backend`] variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBackends;

impl BackendFactory for SystemBackends {
    fn build(&self, action: &Action, config: &Configuration) -> Arc<dyn ActionBackend> {
        Arc::new(Backend::from_spec(action, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExecSpec, HttpGetSpec};
    use crate::types::{Operation, Signal};
    use crate::watch::Filter;
    use std::time::Duration;

    fn action(backend: BackendSpec, signal: Option<Signal>) -> Action {
        Action {
            name: "a".into(),
            filter: Filter::empty(),
            ignore: None,
            delay: Duration::ZERO,
            locks: Vec::new(),
            signal,
            run_on_start: false,
            backend,
        }
    }

    fn exec() -> BackendSpec {
        BackendSpec::Exec(ExecSpec {
            command: vec!["true".into()],
            ..ExecSpec::default()
        })
    }

    #[test]
    fn signal_resolution_prefers_action_override() {
        let mut config = Configuration::default();
        config.signal = Signal::Hup;

        let Backend::Exec(b) = Backend::from_spec(&action(exec(), Some(Signal::Int)), &config) else {
            panic!("expected exec backend");
        };
        assert_eq!(b.process().signal(), Signal::Int);

        let Backend::Exec(b) = Backend::from_spec(&action(exec(), None), &config) else {
            panic!("expected exec backend");
        };
        assert_eq!(b.process().signal(), Signal::Hup);

        let Backend::Exec(b) = Backend::from_spec(&action(exec(), None), &Configuration::default())
        else {
            panic!("expected exec backend");
        };
        assert_eq!(b.process().signal(), Signal::Kill);
    }

    #[tokio::test]
    async fn http_backend_never_signals() {
        let backend = Backend::from_spec(
            &action(
                BackendSpec::HttpGet(HttpGetSpec {
                    url: "localhost".into(),
                }),
                None,
            ),
            &Configuration::default(),
        );
        assert_eq!(backend.kind(), ActionKind::HttpGet);
        let event = Event::new("a.go", Operation::Write);
        assert!(!backend.notify(&event).await.unwrap());
    }
}
