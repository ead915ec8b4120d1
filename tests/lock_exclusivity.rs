// tests/lock_exclusivity.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use watchfs::engine::{ActionPipeline, LockRegistry, PipelineServices};
use watchfs_test_utils::buffer::capturing_reporter;
use watchfs_test_utils::builders::ActionBuilder;
use watchfs_test_utils::fake_backend::{OverlapProbe, RecordingBackend};
use watchfs_test_utils::{eventually, with_timeout};

/// Start two run-on-start actions sharing a probe and report the highest
/// number of simultaneous runs.
async fn peak_overlap(lock: Option<&str>) -> usize {
    let (reporter, _stdout, _stderr) = capturing_reporter(true);
    let services = PipelineServices {
        locks: Arc::new(LockRegistry::new()),
        reporter: Arc::new(reporter),
    };
    let probe = OverlapProbe::new();
    let cancel = CancellationToken::new();
    let mut tasks = JoinSet::new();

    let mut pipelines = Vec::new();
    let mut backends = Vec::new();
    for name in ["commit-hook", "changelog"] {
        let mut builder = ActionBuilder::shell("git status").name(name);
        if let Some(lock) = lock {
            builder = builder.lock(lock);
        }
        let backend = Arc::new(
            RecordingBackend::new(name, Duration::from_millis(150)).with_shared_probe(probe.clone()),
        );
        pipelines.push(ActionPipeline::spawn(
            &builder.compile(),
            backend.clone(),
            &services,
            &cancel,
            &mut tasks,
        ));
        backends.push(backend);
    }

    eventually(|| backends.iter().all(|b| b.runs_finished() == 1)).await;

    cancel.cancel();
    drop(pipelines);
    with_timeout(async {
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }
    })
    .await;

    probe.max_active()
}

#[tokio::test(start_paused = true)]
async fn actions_sharing_a_lock_never_overlap() {
    assert_eq!(peak_overlap(Some("git")).await, 1);
}

#[tokio::test(start_paused = true)]
async fn unlocked_actions_run_concurrently() {
    assert_eq!(peak_overlap(None).await, 2);
}
