// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::RawConfiguration;
use crate::config::settings::Configuration;
use crate::errors::Result;
use crate::watch::path_utils::absolute;

/// File names probed in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_BASENAMES: [&str; 5] = [
    "watchfs.yaml",
    "watchfs.yml",
    "watchfs.json",
    "watchfs.toml",
    "nodemon.json",
];

/// On-disk format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn of(path: &Path) -> Self {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("json") => ConfigFormat::Json,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Load a configuration file and return the raw model.
///
/// This only deserializes; names, globs and durations are checked by
/// converting the result into a [`Configuration`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfiguration> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents, ConfigFormat::of(path))
}

pub fn parse_str(contents: &str, format: ConfigFormat) -> Result<RawConfiguration> {
    if contents.trim().is_empty() {
        return Ok(RawConfiguration::default());
    }
    let raw = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
        ConfigFormat::Json => serde_json::from_str(contents)?,
        ConfigFormat::Toml => toml::from_str(contents)?,
    };
    Ok(raw)
}

/// Load a configuration file and canonicalise it, recording the file's
/// absolute path for self-reload detection.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Configuration> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let mut config = Configuration::try_from(raw)?;
    config.source = Some(absolute(path));
    Ok(config)
}

/// Resolve which configuration file to use.
///
/// An explicit path wins (even if it does not exist yet, so the caller gets a
/// proper IO error). Otherwise the first existing default basename in `dir`
/// is used, or `None` when there is no file at all.
pub fn discover_config_path(explicit: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    DEFAULT_CONFIG_BASENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::DelaySetting;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ConfigFormat::of(Path::new("nodemon.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::of(Path::new("watchfs.TOML")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::of(Path::new("watchfs.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::of(Path::new("watchfs")), ConfigFormat::Yaml);
    }

    #[test]
    fn yaml_actions_parse_with_inline_filters() {
        let raw = parse_str(
            r#"
paths: ["."]
delay: 250
actions:
  - exec:
      command: [go, test]
    exts: [go]
    locks: [git]
    delay: 1s
"#,
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(raw.delay, Some(DelaySetting::Millis(250)));
        let action = &raw.actions[0];
        assert_eq!(action.filter.exts, vec!["go".to_string()]);
        assert_eq!(action.locks, vec!["git".to_string()]);
        assert_eq!(action.delay, Some(DelaySetting::Text("1s".into())));
        assert_eq!(
            action.exec.as_ref().map(|e| e.command.clone()),
            Some(vec!["go".to_string(), "test".to_string()])
        );
    }

    #[test]
    fn nodemon_json_keys_are_understood() {
        let raw = parse_str(
            r#"{"watch": ["src"], "ext": "js,json", "ignore": ["*.test.js"], "delay": 2500, "signal": "SIGTERM"}"#,
            ConfigFormat::Json,
        )
        .unwrap();
        assert_eq!(raw.watch, vec!["src".to_string()]);
        assert_eq!(raw.ext.as_deref(), Some("js,json"));
        let cfg = Configuration::try_from(raw).unwrap();
        assert!(cfg.filter.extensions().contains("json"));
        assert_eq!(cfg.delay, std::time::Duration::from_millis(2500));
    }

    #[test]
    fn empty_file_is_an_empty_configuration() {
        assert_eq!(parse_str("  \n", ConfigFormat::Toml).unwrap(), RawConfiguration::default());
    }
}
