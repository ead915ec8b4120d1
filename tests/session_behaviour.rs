// tests/session_behaviour.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use watchfs::config::{load_and_validate, Configuration};
use watchfs::engine::{run_session, LockRegistry, Services, SessionOutcome, RELOAD_MESSAGE};
use watchfs::errors::Result;
use watchfs::exec::{BackendFactory, SystemBackends};
use watchfs::supervise_sessions;
use watchfs_test_utils::buffer::{capturing_reporter, SharedBuffer};
use watchfs_test_utils::builders::{ActionBuilder, ConfigurationBuilder};
use watchfs_test_utils::fake_backend::RecordingFactory;
use watchfs_test_utils::{eventually, init_tracing, with_timeout};

/// Time for the session task to register its watches.
const SETTLE: Duration = Duration::from_millis(300);

struct Session {
    handle: JoinHandle<Result<SessionOutcome>>,
    shutdown: CancellationToken,
    stdout: SharedBuffer,
    stderr: SharedBuffer,
}

impl Session {
    async fn start(config: Configuration, backends: Arc<dyn BackendFactory>) -> Self {
        let (services, stdout, stderr) = services(backends);
        let shutdown = CancellationToken::new();
        let handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { run_session(&config, &services, &shutdown).await })
        };
        sleep(SETTLE).await;
        Self {
            handle,
            shutdown,
            stdout,
            stderr,
        }
    }

    async fn finished(self) -> SessionOutcome {
        with_timeout(self.handle).await.unwrap().unwrap()
    }

    async fn stop(self) -> SessionOutcome {
        self.shutdown.cancel();
        self.finished().await
    }
}

fn services(backends: Arc<dyn BackendFactory>) -> (Services, SharedBuffer, SharedBuffer) {
    init_tracing();
    let (reporter, stdout, stderr) = capturing_reporter(false);
    let services = Services {
        locks: Arc::new(LockRegistry::new()),
        reporter: Arc::new(reporter),
        backends,
    };
    (services, stdout, stderr)
}

fn go_project(root: &Path) -> Configuration {
    ConfigurationBuilder::new()
        .watch(root)
        .action(
            ActionBuilder::exec(&["go", "build"])
                .name("build")
                .ext("go")
                .delay_ms(100)
                .run_on_start(false)
                .build(),
        )
        .build()
}

#[tokio::test(flavor = "multi_thread")]
async fn writing_a_matching_file_runs_the_action_once_and_reports_the_event() {
    let dir = tempfile::tempdir().unwrap();
    let main_go = dir.path().join("main.go");
    std::fs::write(&main_go, "package main\n").unwrap();

    let factory = Arc::new(RecordingFactory::new(Duration::from_millis(10)));
    let session = Session::start(go_project(dir.path()), factory.clone()).await;

    std::fs::write(&main_go, "package main\n\nfunc main() {}\n").unwrap();
    eventually(|| factory.latest("build").is_some_and(|b| b.runs_finished() == 1)).await;
    sleep(SETTLE).await;

    let backend = factory.latest("build").unwrap();
    assert_eq!(backend.runs_started(), 1);

    let records: Vec<serde_json::Value> = session
        .stdout
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert!(
        records.iter().any(|record| record["op"] == "write"
            && record["path"].as_str().is_some_and(|p| p.ends_with("main.go"))),
        "{records:?}"
    );

    assert_eq!(session.stop().await, SessionOutcome::Shutdown);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_matching_files_do_not_trigger_the_action() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(RecordingFactory::new(Duration::from_millis(10)));
    let session = Session::start(go_project(dir.path()), factory.clone()).await;

    std::fs::write(dir.path().join("README.md"), "# notes\n").unwrap();
    sleep(SETTLE * 2).await;

    assert_eq!(factory.latest("build").unwrap().runs_started(), 0);
    assert_eq!(session.stop().await, SessionOutcome::Shutdown);
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread")]
async fn shell_action_runs_for_real() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let out = outside.path().join("out.txt");

    let config = ConfigurationBuilder::new()
        .watch(dir.path())
        .action(
            ActionBuilder::shell(&format!("echo hi >> '{}'", out.display()))
                .name("echo")
                .ext("go")
                .delay_ms(100)
                .run_on_start(false)
                .build(),
        )
        .build();
    let session = Session::start(config, Arc::new(SystemBackends)).await;

    std::fs::write(dir.path().join("main.go"), "package main\n").unwrap();
    eventually(|| out.exists()).await;
    sleep(SETTLE).await;

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "hi\n");
    assert_eq!(session.stop().await, SessionOutcome::Shutdown);
}

#[tokio::test(flavor = "multi_thread")]
async fn new_directories_are_watched_as_they_appear() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(RecordingFactory::new(Duration::from_millis(10)));
    let session = Session::start(go_project(dir.path()), factory.clone()).await;

    let nested = dir.path().join("pkg").join("util");
    std::fs::create_dir_all(&nested).unwrap();
    sleep(SETTLE).await;
    std::fs::write(nested.join("strings.go"), "package util\n").unwrap();

    eventually(|| factory.latest("build").is_some_and(|b| b.runs_finished() >= 1)).await;
    assert_eq!(session.stop().await, SessionOutcome::Shutdown);
}

fn write_config(path: &Path, watched: &Path, action: &str) {
    let yaml = format!(
        r#"
paths: ['{watched}']
actions:
  - name: {action}
    exts: [go]
    exec:
      command: [go, run, .]
"#,
        watched = watched.display(),
    );
    std::fs::write(path, yaml).unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn writing_the_config_file_reloads_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("watchfs.yaml");
    write_config(&config_path, dir.path(), "first");

    let factory = Arc::new(RecordingFactory::new(Duration::from_secs(60)));
    let session = Session::start(load_and_validate(&config_path).unwrap(), factory.clone()).await;
    eventually(|| factory.latest("first").is_some_and(|b| b.is_running())).await;

    write_config(&config_path, dir.path(), "second");
    let stderr = session.stderr.clone();
    assert_eq!(session.finished().await, SessionOutcome::Reload);

    let first = factory.latest("first").unwrap();
    assert_eq!(first.runs_finished(), 1, "long run cancelled by the reload");
    assert!(stderr.contents().contains(RELOAD_MESSAGE), "{}", stderr.contents());

    let reloaded = load_and_validate(&config_path).unwrap();
    assert_eq!(reloaded.actions[0].name, "second");
    let session = Session::start(reloaded, factory.clone()).await;
    eventually(|| factory.latest("second").is_some_and(|b| b.runs_started() == 1)).await;
    assert_eq!(session.stop().await, SessionOutcome::Shutdown);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_ends_an_idle_session() {
    let dir = tempfile::tempdir().unwrap();
    let factory = Arc::new(RecordingFactory::new(Duration::from_millis(10)));
    let session = Session::start(go_project(dir.path()), factory).await;
    assert_eq!(session.stop().await, SessionOutcome::Shutdown);
}

fn reader(path: PathBuf) -> impl FnMut() -> anyhow::Result<Configuration> {
    move || load_and_validate(&path).map_err(anyhow::Error::from)
}

fn error_records(buffer: &SharedBuffer) -> Vec<serde_json::Value> {
    buffer
        .lines()
        .iter()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
        .filter(|record| record.get("error").is_some())
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn broken_config_on_reload_keeps_the_previous_actions() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("watchfs.yaml");
    write_config(&config_path, dir.path(), "first");

    let factory = Arc::new(RecordingFactory::new(Duration::from_millis(10)));
    let (services, _stdout, stderr) = services(factory.clone());
    let shutdown = CancellationToken::new();
    let handle = {
        let shutdown = shutdown.clone();
        let load = reader(config_path.clone());
        tokio::spawn(async move { supervise_sessions(load, &services, &shutdown).await })
    };

    eventually(|| factory.latest("first").is_some_and(|b| b.runs_finished() == 1)).await;
    sleep(SETTLE).await;
    assert!(error_records(&stderr).is_empty());

    std::fs::write(&config_path, "actions: [unclosed\n").unwrap();
    eventually(|| factory.built_for("first").len() >= 2).await;
    eventually(|| factory.latest("first").is_some_and(|b| b.runs_finished() == 1)).await;

    let errors = error_records(&stderr);
    assert!(!errors.is_empty(), "{}", stderr.contents());
    assert!(stderr.contents().contains(RELOAD_MESSAGE));

    shutdown.cancel();
    with_timeout(handle).await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn broken_config_on_first_load_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("watchfs.yaml");
    std::fs::write(&config_path, "actions: [unclosed\n").unwrap();

    let factory = Arc::new(RecordingFactory::new(Duration::from_millis(10)));
    let (services, _stdout, stderr) = services(factory.clone());
    let shutdown = CancellationToken::new();

    let result = with_timeout(supervise_sessions(reader(config_path), &services, &shutdown)).await;

    assert!(result.is_err());
    assert!(factory.built_for("first").is_empty());
    assert!(error_records(&stderr).is_empty());
}
