use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use watchfs::config::{
    Action, Configuration, DelaySetting, RawAction, RawConfiguration, RawExec, RawFilter,
    RawShell,
};

/// Builder for `Configuration` to simplify test setup.
///
/// Goes through the same raw model and validation as a config file.
pub struct ConfigurationBuilder {
    raw: RawConfiguration,
    source: Option<PathBuf>,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfiguration::default(),
            source: None,
        }
    }

    pub fn watch(mut self, path: impl AsRef<Path>) -> Self {
        self.raw.paths.push(path.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn ext(mut self, ext: &str) -> Self {
        self.raw.exts.push(ext.to_string());
        self
    }

    pub fn ignore_glob(mut self, pattern: &str) -> Self {
        self.raw.ignore.push(pattern.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.raw.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.raw.delay = Some(DelaySetting::Millis(ms));
        self
    }

    pub fn signal(mut self, name: &str) -> Self {
        self.raw.signal = Some(name.to_string());
        self
    }

    pub fn action(mut self, action: RawAction) -> Self {
        self.raw.actions.push(action);
        self
    }

    /// Record the file this configuration pretends to come from.
    pub fn source(mut self, path: impl AsRef<Path>) -> Self {
        self.source = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn raw(&self) -> &RawConfiguration {
        &self.raw
    }

    pub fn build(self) -> Configuration {
        let mut config =
            Configuration::try_from(self.raw).expect("Failed to build valid config from builder");
        config.source = self.source.map(|p| watchfs::watch::path_utils::absolute(&p));
        config
    }
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RawAction`.
pub struct ActionBuilder {
    action: RawAction,
}

impl ActionBuilder {
    pub fn exec(command: &[&str]) -> Self {
        Self {
            action: RawAction {
                exec: Some(RawExec {
                    command: command.iter().map(|s| s.to_string()).collect(),
                    env: BTreeMap::new(),
                    ignore_signals: false,
                }),
                ..RawAction::default()
            },
        }
    }

    pub fn shell(command: &str) -> Self {
        Self {
            action: RawAction {
                shell: Some(RawShell {
                    command: command.to_string(),
                    ..RawShell::default()
                }),
                ..RawAction::default()
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.action.name = Some(name.to_string());
        self
    }

    pub fn ext(mut self, ext: &str) -> Self {
        self.action.filter.exts.push(ext.to_string());
        self
    }

    pub fn op(mut self, op: &str) -> Self {
        self.action.filter.ops.push(op.to_string());
        self
    }

    pub fn path(mut self, pattern: &str) -> Self {
        self.action.filter.paths.push(pattern.to_string());
        self
    }

    pub fn ignore(mut self, filter: RawFilter) -> Self {
        self.action.ignore = Some(filter);
        self
    }

    pub fn lock(mut self, name: &str) -> Self {
        self.action.locks.push(name.to_string());
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.action.delay = Some(DelaySetting::Millis(ms));
        self
    }

    pub fn signal(mut self, name: &str) -> Self {
        self.action.signal = Some(name.to_string());
        self
    }

    pub fn run_on_start(mut self, val: bool) -> Self {
        self.action.run_on_start = Some(val);
        self
    }

    pub fn build(self) -> RawAction {
        self.action
    }

    /// Validate a lone action into its canonical form.
    pub fn compile(self) -> Action {
        ConfigurationBuilder::new()
            .action(self.build())
            .build()
            .actions
            .remove(0)
    }
}
