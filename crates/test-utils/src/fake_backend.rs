use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use watchfs::config::{Action, Configuration};
use watchfs::errors::ActionError;
use watchfs::exec::{ActionBackend, BackendFactory, BoxFuture};
use watchfs::watch::Event;

/// Tracks how many runs are in flight and the highest overlap seen.
#[derive(Debug, Default)]
pub struct OverlapProbe {
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl OverlapProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A fake backend that:
/// - records how many runs started and finished
/// - counts notifications
/// - "runs" for a fixed duration (or until cancelled)
/// - optionally fails every run.
#[derive(Debug)]
pub struct RecordingBackend {
    name: String,
    run_time: Duration,
    fail: bool,
    started: AtomicUsize,
    finished: AtomicUsize,
    notified: AtomicUsize,
    own: OverlapProbe,
    shared: Option<Arc<OverlapProbe>>,
}

impl RecordingBackend {
    pub fn new(name: &str, run_time: Duration) -> Self {
        Self {
            name: name.to_string(),
            run_time,
            fail: false,
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            notified: AtomicUsize::new(0),
            own: OverlapProbe::default(),
            shared: None,
        }
    }

    /// Also report run windows to a probe shared with other backends.
    pub fn with_shared_probe(mut self, probe: Arc<OverlapProbe>) -> Self {
        self.shared = Some(probe);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runs_started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn runs_finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn notifications(&self) -> usize {
        self.notified.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.own.active() > 0
    }

    /// Highest number of simultaneous runs of this backend.
    pub fn max_overlap(&self) -> usize {
        self.own.max_active()
    }
}

impl ActionBackend for RecordingBackend {
    fn run(&self, cancel: CancellationToken) -> BoxFuture<'_, Result<(), ActionError>> {
        Box::pin(async move {
            self.own.enter();
            if let Some(shared) = &self.shared {
                shared.enter();
            }
            self.started.fetch_add(1, Ordering::SeqCst);

            tokio::select! {
                _ = tokio::time::sleep(self.run_time) => {}
                _ = cancel.cancelled() => {}
            }

            if let Some(shared) = &self.shared {
                shared.exit();
            }
            self.own.exit();
            self.finished.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                Err(ActionError::ExitStatus {
                    program: self.name.clone(),
                    status: "exit status: 1".to_string(),
                })
            } else {
                Ok(())
            }
        })
    }

    fn notify<'a>(&'a self, _event: &'a Event) -> BoxFuture<'a, Result<bool, ActionError>> {
        Box::pin(async move {
            self.notified.fetch_add(1, Ordering::SeqCst);
            Ok(self.is_running())
        })
    }
}

/// Backend factory handing out [`RecordingBackend`]s and remembering every
/// one it built (one per action per session).
#[derive(Debug)]
pub struct RecordingFactory {
    run_time: Duration,
    shared: Option<Arc<OverlapProbe>>,
    built: Mutex<Vec<Arc<RecordingBackend>>>,
}

impl RecordingFactory {
    pub fn new(run_time: Duration) -> Self {
        Self {
            run_time,
            shared: None,
            built: Mutex::new(Vec::new()),
        }
    }

    pub fn with_shared_probe(mut self, probe: Arc<OverlapProbe>) -> Self {
        self.shared = Some(probe);
        self
    }

    /// Every backend built for the action called `name`, oldest first.
    pub fn built_for(&self, name: &str) -> Vec<Arc<RecordingBackend>> {
        self.built
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.name() == name)
            .cloned()
            .collect()
    }

    pub fn latest(&self, name: &str) -> Option<Arc<RecordingBackend>> {
        self.built_for(name).pop()
    }
}

impl BackendFactory for RecordingFactory {
    fn build(&self, action: &Action, _config: &Configuration) -> Arc<dyn ActionBackend> {
        let mut backend = RecordingBackend::new(&action.name, self.run_time);
        if let Some(probe) = &self.shared {
            backend = backend.with_shared_probe(probe.clone());
        }
        let backend = Arc::new(backend);
        self.built.lock().unwrap().push(backend.clone());
        backend
    }
}
