// src/engine/session.rs

//! Session supervisor.
//!
//! A session owns one watcher and one pipeline per action. It ends when its
//! cancellation token fires, either because the configuration file was
//! written (reload) or because the process-wide shutdown token was
//! cancelled. Before returning, every pipeline task has exited and the
//! watcher has been dropped.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::engine::locks::LockRegistry;
use crate::engine::pipeline::{ActionPipeline, PipelineServices};
use crate::errors::Result;
use crate::exec::BackendFactory;
use crate::output::Reporter;
use crate::types::Operation;
use crate::watch::{
    events_from_notify, register_tree, DirectoryWatcher, Event, EventRouter, WalkExclusions,
};

/// Long-lived services handed to every session.
#[derive(Clone)]
pub struct Services {
    pub locks: Arc<LockRegistry>,
    pub reporter: Arc<Reporter>,
    pub backends: Arc<dyn BackendFactory>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("locks", &self.locks)
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

impl Services {
    fn pipeline_services(&self) -> PipelineServices {
        PipelineServices {
            locks: self.locks.clone(),
            reporter: self.reporter.clone(),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The configuration file changed; start a fresh session.
    Reload,
    /// The process is shutting down.
    Shutdown,
}

#[derive(Serialize)]
struct WatcherFailure {
    message: String,
}

pub const RELOAD_MESSAGE: &str = "reloading watchfs configuration";

/// Run one session until reload or shutdown.
///
/// Only watcher construction failure is returned as an error; everything
/// else is reported through the [`Reporter`] and the session keeps going.
pub async fn run_session(
    config: &Configuration,
    services: &Services,
    shutdown: &CancellationToken,
) -> Result<SessionOutcome> {
    let (mut watcher, streams) = DirectoryWatcher::new()?;
    let session = shutdown.child_token();
    let reporter = services.reporter.clone();

    for warning in &config.warnings {
        reporter.warning(warning);
    }

    let exclusions = WalkExclusions {
        globs: &config.ignore_globs,
        ignores: &config.ignores,
    };
    for root in &config.watch_paths {
        let count = register_tree(&mut watcher, root, exclusions, &reporter);
        debug!(root = ?root, directories = count, "registered watch root");
    }

    let mut tasks = JoinSet::new();
    let pipeline_services = services.pipeline_services();
    let pipelines: Vec<ActionPipeline> = config
        .actions
        .iter()
        .map(|action| {
            let backend = services.backends.build(action, config);
            ActionPipeline::spawn(action, backend, &pipeline_services, &session, &mut tasks)
        })
        .collect();

    tasks.spawn(report_watch_errors(
        streams.errors,
        reporter.clone(),
        session.clone(),
    ));

    info!(
        actions = pipelines.len(),
        roots = config.watch_paths.len(),
        "session started"
    );

    let router = EventRouter::new(config);
    let mut raw_events = streams.events;

    loop {
        let raw = tokio::select! {
            biased;
            _ = session.cancelled() => break,
            raw = raw_events.recv() => match raw {
                Some(raw) => raw,
                None => {
                    warn!("watcher event stream closed unexpectedly");
                    break;
                }
            },
        };

        for event in events_from_notify(raw) {
            if matches!(event.op, Operation::Create | Operation::Rename) && event.path.is_dir() {
                register_tree(&mut watcher, &event.path, exclusions, &reporter);
            }

            if router.is_config_write(&event) {
                reporter.info(RELOAD_MESSAGE);
                session.cancel();
            }

            dispatch(&router, &pipelines, &reporter, event).await;
        }
    }

    // Stop watching before tearing the pipelines down.
    session.cancel();
    drop(watcher);
    drop(pipelines);
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "session task panicked");
        }
    }

    let outcome = if shutdown.is_cancelled() {
        SessionOutcome::Shutdown
    } else {
        SessionOutcome::Reload
    };
    info!(?outcome, "session ended");
    Ok(outcome)
}

async fn dispatch(
    router: &EventRouter<'_>,
    pipelines: &[ActionPipeline],
    reporter: &Reporter,
    event: Event,
) {
    if !router.passes_global(&event) {
        return;
    }
    for index in router.matching_actions(&event) {
        if let Some(pipeline) = pipelines.get(index) {
            debug!(
                action = %pipeline.name(),
                path = ?event.path,
                time = %event.timestamp(),
                "dispatching event"
            );
            pipeline.offer(event.clone()).await;
        }
    }
    reporter.event(&event);
}

async fn report_watch_errors(
    mut errors: mpsc::UnboundedReceiver<notify::Error>,
    reporter: Arc<Reporter>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            err = errors.recv() => match err {
                Some(err) => reporter.error(WatcherFailure { message: err.to_string() }),
                None => break,
            },
        }
    }
}
