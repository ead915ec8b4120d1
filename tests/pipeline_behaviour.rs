// tests/pipeline_behaviour.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use watchfs::config::Action;
use watchfs::engine::{ActionPipeline, LockRegistry, PipelineServices};
use watchfs::types::Operation;
use watchfs::watch::Event;
use watchfs_test_utils::buffer::{capturing_reporter, SharedBuffer};
use watchfs_test_utils::builders::ActionBuilder;
use watchfs_test_utils::fake_backend::RecordingBackend;
use watchfs_test_utils::{eventually, with_timeout};

struct Harness {
    pipeline: ActionPipeline,
    backend: Arc<RecordingBackend>,
    stderr: SharedBuffer,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

impl Harness {
    fn start(action: Action, backend: RecordingBackend) -> Self {
        let (reporter, _stdout, stderr) = capturing_reporter(false);
        let services = PipelineServices {
            locks: Arc::new(LockRegistry::new()),
            reporter: Arc::new(reporter),
        };
        let backend = Arc::new(backend);
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        let pipeline =
            ActionPipeline::spawn(&action, backend.clone(), &services, &cancel, &mut tasks);
        Self {
            pipeline,
            backend,
            stderr,
            cancel,
            tasks,
        }
    }

    async fn write(&self, path: &str) {
        self.pipeline.offer(Event::new(path, Operation::Write)).await;
    }

    async fn shutdown(mut self) -> Arc<RecordingBackend> {
        self.cancel.cancel();
        drop(self.pipeline);
        with_timeout(async {
            while let Some(joined) = self.tasks.join_next().await {
                joined.unwrap();
            }
        })
        .await;
        self.backend
    }
}

#[tokio::test(start_paused = true)]
async fn burst_of_events_is_debounced_into_one_run() {
    let action = ActionBuilder::exec(&["go", "build"])
        .name("build")
        .delay_ms(100)
        .run_on_start(false)
        .compile();
    let harness = Harness::start(action, RecordingBackend::new("build", Duration::from_millis(10)));

    for i in 0..5 {
        harness.write(&format!("src/file{i}.go")).await;
        sleep(Duration::from_millis(20)).await;
    }
    sleep(Duration::from_millis(500)).await;

    assert_eq!(harness.backend.runs_started(), 1);
    assert_eq!(harness.backend.notifications(), 1);

    let backend = harness.shutdown().await;
    assert_eq!(backend.runs_finished(), 1);
}

#[tokio::test(start_paused = true)]
async fn events_during_a_run_coalesce_into_one_follow_up() {
    let action = ActionBuilder::exec(&["go", "test"])
        .name("test")
        .delay_ms(0)
        .compile();
    let harness = Harness::start(action, RecordingBackend::new("test", Duration::from_millis(200)));

    eventually(|| harness.backend.is_running()).await;
    for i in 0..10 {
        harness.write(&format!("pkg/file{i}.go")).await;
        sleep(Duration::from_millis(10)).await;
    }
    sleep(Duration::from_secs(1)).await;

    assert_eq!(harness.backend.runs_started(), 2);
    assert_eq!(harness.backend.max_overlap(), 1);
    assert!(harness.backend.notifications() >= 1);

    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn no_run_without_events_when_run_on_start_is_off() {
    let action = ActionBuilder::exec(&["make"])
        .name("make")
        .run_on_start(false)
        .compile();
    let harness = Harness::start(action, RecordingBackend::new("make", Duration::from_millis(10)));

    sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.backend.runs_started(), 0);

    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failing_runs_are_reported_and_the_pipeline_keeps_going() {
    let action = ActionBuilder::exec(&["false"])
        .name("lint")
        .delay_ms(0)
        .compile();
    let harness = Harness::start(
        action,
        RecordingBackend::new("lint", Duration::from_millis(10)).failing(),
    );

    eventually(|| harness.backend.runs_finished() == 1).await;
    harness.write("main.go").await;
    eventually(|| harness.backend.runs_finished() == 2).await;
    sleep(Duration::from_millis(50)).await;

    let errors: Vec<serde_json::Value> = harness
        .stderr
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(errors.len(), 2, "{errors:?}");
    for record in &errors {
        assert_eq!(record["error"]["action"], "lint");
        assert_eq!(record["error"]["kind"], "exec");
        assert!(record["error"]["message"].as_str().unwrap().contains("exit status"));
    }

    harness.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_an_in_flight_run_and_joins_every_task() {
    let action = ActionBuilder::exec(&["sleep", "60"]).name("serve").compile();
    let harness = Harness::start(action, RecordingBackend::new("serve", Duration::from_secs(60)));

    eventually(|| harness.backend.is_running()).await;
    let backend = harness.shutdown().await;

    assert_eq!(backend.runs_started(), 1);
    assert_eq!(backend.runs_finished(), 1);
    assert!(!backend.is_running());
}
