// src/engine/pipeline.rs

//! Per-action debounce-and-run pipeline.
//!
//! Each action gets two tasks for the lifetime of a session:
//!
//! - the **intake loop** receives matching events from a one-slot channel,
//!   debounces them, forwards the settled event to the backend via
//!   `notify` and then requests a run;
//! - the **run loop** executes runs strictly one at a time, holding the
//!   action's named locks for the duration of each run.
//!
//! Run requests travel over a capacity-1 channel, so a request made while
//! one is already pending coalesces with it. When the intake slot itself is
//! full, an offered event bypasses it and goes straight to `notify`.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Action;
use crate::engine::debounce::Debouncer;
use crate::engine::locks::LockRegistry;
use crate::errors::ActionError;
use crate::exec::ActionBackend;
use crate::output::{ActionFailure, Reporter};
use crate::types::ActionKind;
use crate::watch::Event;

/// Services shared by every pipeline of a session.
#[derive(Debug, Clone)]
pub struct PipelineServices {
    pub locks: Arc<LockRegistry>,
    pub reporter: Arc<Reporter>,
}

/// Handle the session uses to feed one action.
pub struct ActionPipeline {
    label: Arc<ActionLabel>,
    intake: mpsc::Sender<Event>,
    backend: Arc<dyn ActionBackend>,
    reporter: Arc<Reporter>,
}

#[derive(Debug)]
struct ActionLabel {
    name: String,
    kind: ActionKind,
}

impl ActionLabel {
    fn report(&self, reporter: &Reporter, err: &ActionError) {
        warn!(action = %self.name, error = %err, "action failed");
        reporter.error(ActionFailure {
            message: err.to_string(),
            action: &self.name,
            kind: self.kind.as_str(),
        });
    }
}

impl ActionPipeline {
    /// Start the intake and run loops of `action` on `tasks`.
    ///
    /// Both loops stop when `cancel` fires; the intake loop also stops once
    /// this handle is dropped.
    pub fn spawn(
        action: &Action,
        backend: Arc<dyn ActionBackend>,
        services: &PipelineServices,
        cancel: &CancellationToken,
        tasks: &mut JoinSet<()>,
    ) -> Self {
        let label = Arc::new(ActionLabel {
            name: action.name.clone(),
            kind: action.kind(),
        });
        let (intake_tx, intake_rx) = mpsc::channel::<Event>(1);
        let (run_tx, run_rx) = mpsc::channel::<()>(1);

        if action.run_on_start {
            // Fresh channel with capacity 1: cannot be full.
            let _ = run_tx.try_send(());
        }

        tasks.spawn(intake_loop(IntakeLoop {
            label: label.clone(),
            events: intake_rx,
            debouncer: Debouncer::new(action.delay),
            backend: backend.clone(),
            run_requests: run_tx,
            reporter: services.reporter.clone(),
            cancel: cancel.clone(),
        }));

        tasks.spawn(run_loop(RunLoop {
            label: label.clone(),
            requests: run_rx,
            lock_names: action.locks.clone(),
            locks: services.locks.clone(),
            backend: backend.clone(),
            reporter: services.reporter.clone(),
            cancel: cancel.clone(),
        }));

        Self {
            label,
            intake: intake_tx,
            backend,
            reporter: services.reporter.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.label.name
    }

    /// Hand a matching event to the action.
    ///
    /// Never blocks on the intake loop: if its slot is occupied, the event
    /// is delivered to the backend as a notification instead.
    pub async fn offer(&self, event: Event) {
        match self.intake.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                debug!(action = %self.label.name, path = ?event.path, "intake full; notifying backend");
                if let Err(err) = self.backend.notify(&event).await {
                    self.label.report(&self.reporter, &err);
                }
            }
            Err(TrySendError::Closed(_)) => {
                debug!(action = %self.label.name, "intake closed; dropping event");
            }
        }
    }
}

struct IntakeLoop {
    label: Arc<ActionLabel>,
    events: mpsc::Receiver<Event>,
    debouncer: Debouncer,
    backend: Arc<dyn ActionBackend>,
    run_requests: mpsc::Sender<()>,
    reporter: Arc<Reporter>,
    cancel: CancellationToken,
}

async fn intake_loop(mut this: IntakeLoop) {
    loop {
        let first = tokio::select! {
            biased;
            _ = this.cancel.cancelled() => break,
            next = this.events.recv() => match next {
                Some(event) => event,
                None => break,
            },
        };

        let Some(event) = this
            .debouncer
            .settle(first, &mut this.events, &this.cancel)
            .await
        else {
            break;
        };

        match this.backend.notify(&event).await {
            Ok(true) => debug!(action = %this.label.name, "notified running process"),
            Ok(false) => {}
            Err(err) => this.label.report(&this.reporter, &err),
        }

        match this.run_requests.try_send(()) {
            Ok(()) => debug!(action = %this.label.name, path = ?event.path, "run requested"),
            Err(TrySendError::Full(())) => {
                debug!(action = %this.label.name, "run already pending; coalesced")
            }
            Err(TrySendError::Closed(())) => break,
        }
    }
    debug!(action = %this.label.name, "intake loop finished");
}

struct RunLoop {
    label: Arc<ActionLabel>,
    requests: mpsc::Receiver<()>,
    lock_names: Vec<String>,
    locks: Arc<LockRegistry>,
    backend: Arc<dyn ActionBackend>,
    reporter: Arc<Reporter>,
    cancel: CancellationToken,
}

async fn run_loop(mut this: RunLoop) {
    loop {
        tokio::select! {
            biased;
            _ = this.cancel.cancelled() => break,
            request = this.requests.recv() => {
                if request.is_none() {
                    break;
                }
            }
        }

        let guards = tokio::select! {
            biased;
            _ = this.cancel.cancelled() => break,
            guards = this.locks.acquire_all(&this.lock_names) => guards,
        };

        info!(action = %this.label.name, kind = %this.label.kind, "running action");
        let result = this.backend.run(this.cancel.clone()).await;
        guards.release();

        if let Err(err) = result {
            this.label.report(&this.reporter, &err);
        }
    }
    debug!(action = %this.label.name, "run loop finished");
}
