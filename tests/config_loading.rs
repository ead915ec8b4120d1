// tests/config_loading.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use watchfs::config::{
    discover_config_path, load_and_validate, loader::parse_str, BackendSpec, ConfigFormat,
    Configuration,
};
use watchfs::errors::WatchfsError;
use watchfs::types::{ActionKind, Signal};

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

fn yaml(contents: &str) -> Result<Configuration, WatchfsError> {
    Configuration::try_from(parse_str(contents, ConfigFormat::Yaml)?)
}

fn config_error(contents: &str) -> String {
    match yaml(contents) {
        Err(WatchfsError::ConfigError(message)) => message,
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn yaml_demo_loads_every_backend_kind() {
    let config = load_and_validate(demo("watchfs.yaml")).unwrap();

    let kinds: Vec<ActionKind> = config.actions.iter().map(|a| a.kind()).collect();
    assert_eq!(
        kinds,
        vec![ActionKind::Exec, ActionKind::Shell, ActionKind::DockerRun, ActionKind::HttpGet]
    );
    assert_eq!(config.signal, Signal::Term);
    assert_eq!(config.delay, Duration::from_millis(250));
    assert_eq!(config.actions[0].delay, Duration::from_millis(250));
    assert_eq!(config.actions[1].delay, Duration::from_secs(1));
    assert_eq!(config.actions[0].locks, vec!["go-build".to_string()]);
    assert!(!config.actions[3].run_on_start);
    assert!(config.actions[2].ignore.is_some());
    assert_eq!(config.source.as_deref(), Some(demo("watchfs.yaml").as_path()));
    assert!(config.warnings.is_empty());

    match &config.actions[2].backend {
        BackendSpec::ContainerRun(spec) => {
            assert_eq!(spec.runtime, "docker");
            assert_eq!(spec.volumes[0].kind, "bind");
        }
        other => panic!("unexpected backend {other:?}"),
    }
}

#[test]
fn nodemon_demo_maps_exec_map_to_an_action() {
    let config = load_and_validate(demo("nodemon.json")).unwrap();

    assert_eq!(config.watch_paths, vec![PathBuf::from("src")]);
    assert_eq!(config.signal, Signal::Hup);
    assert_eq!(config.delay, Duration::from_millis(2500));
    assert_eq!(config.actions.len(), 1);

    let action = &config.actions[0];
    assert_eq!(action.name, "execMap.js");
    assert!(action.filter.extensions().contains("js"));
    match &action.backend {
        BackendSpec::Exec(spec) => {
            assert_eq!(spec.command, vec!["node", "--enable-source-maps", "src/index.js"])
        }
        other => panic!("unexpected backend {other:?}"),
    }
}

#[test]
fn toml_demo_loads() {
    let config = load_and_validate(demo("watchfs.toml")).unwrap();
    assert_eq!(config.actions[0].name, "check");
    assert_eq!(config.actions[0].delay, Duration::from_millis(500));
    assert!(config.filter.extensions().contains("rs"));
}

#[test]
fn discovery_prefers_explicit_path_then_known_names() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(discover_config_path(None, dir.path()), None);

    std::fs::write(dir.path().join("nodemon.json"), "{}").unwrap();
    std::fs::write(dir.path().join("watchfs.json"), "{}").unwrap();
    assert_eq!(
        discover_config_path(None, dir.path()),
        Some(dir.path().join("watchfs.json"))
    );

    let explicit = dir.path().join("custom.yml");
    assert_eq!(
        discover_config_path(Some(&explicit), dir.path()),
        Some(explicit.clone())
    );
}

#[test]
fn missing_explicit_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, WatchfsError::IoError(_)), "{err}");
}

#[test]
fn action_with_two_backends_is_rejected() {
    let message = config_error(
        r#"
actions:
  - exec: {command: [make]}
    httpGet: {url: localhost}
"#,
    );
    assert!(message.contains("actions[0]"), "{message}");
    assert!(message.contains("2 backends"), "{message}");
}

#[test]
fn action_without_backend_is_rejected() {
    let message = config_error("actions:\n  - exts: [go]\n");
    assert!(message.contains("actions[0]"), "{message}");
}

#[test]
fn unknown_operation_is_rejected() {
    let message = config_error(
        r#"
actions:
  - exec: {command: [make]}
    ops: [write, touch]
"#,
    );
    assert!(message.contains("touch"), "{message}");
}

#[test]
fn invalid_glob_and_delay_are_rejected() {
    config_error("ignore: ['[unclosed']\n");
    config_error("delay: 5 parsecs\n");
    config_error(
        r#"
actions:
  - exec: {command: [make]}
    paths: ['src/[']
"#,
    );
}

#[test]
fn unknown_signal_falls_back_to_kill_with_a_warning() {
    let config = yaml(
        r#"
signal: SIGBOGUS
actions:
  - exec: {command: [make]}
    signal: NOPE
"#,
    )
    .unwrap();
    assert_eq!(config.signal, Signal::Kill);
    assert_eq!(config.actions[0].signal, Some(Signal::Kill));
    assert_eq!(config.warnings.len(), 3, "{:?}", config.warnings);
}
