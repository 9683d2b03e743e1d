//! Settings schema for pssh
//!
//! Defines the structure and defaults for `config.json`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::Environment;

/// Current settings file version
pub const SETTINGS_VERSION: u32 = 1;

/// Main settings structure for pssh
///
/// Serialized to/from `~/.pssh/config.json`. Paths left out of the file
/// are filled in from the [`Environment`] on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Settings file version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// JSON store files merged to build the SSH config, in order
    #[serde(default)]
    pub json_config_paths: Vec<PathBuf>,

    /// Where `import` writes by default
    #[serde(default)]
    pub json_import_path: PathBuf,

    /// The SSH config file `export` writes
    #[serde(default)]
    pub ssh_config_path: PathBuf,

    /// Script copied to hosts during `init-host`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_script: Option<PathBuf>,

    /// Git remote (`git@...`) the config directory is synced with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<String>,

    /// Copy each file to `<file>.bak` before changing it
    #[serde(default = "default_backup")]
    pub backup: bool,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_backup() -> bool {
    true
}

impl Settings {
    /// Defaults for the given environment
    pub fn defaults(env: &Environment) -> Self {
        let mut settings = Self {
            version: SETTINGS_VERSION,
            json_config_paths: Vec::new(),
            json_import_path: PathBuf::new(),
            ssh_config_path: PathBuf::new(),
            cli_script: None,
            sync: None,
            backup: true,
        };
        settings.fill_defaults(env);
        settings
    }

    /// Fill empty paths with defaults and expand `~`
    pub fn fill_defaults(&mut self, env: &Environment) {
        if self.json_config_paths.is_empty() {
            self.json_config_paths = vec![
                env.config_dir.join("ssh_config_work.json"),
                env.config_dir.join("ssh_config_personal.json"),
            ];
        }
        if self.json_import_path.as_os_str().is_empty() {
            self.json_import_path = env.config_dir.join("ssh_config_imported.json");
        }
        if self.ssh_config_path.as_os_str().is_empty() {
            self.ssh_config_path = env.home_dir.join(".ssh").join("config");
        }
        if self.cli_script.is_none() {
            let script = env.config_dir.join("ssh_cli.sh");
            if script.is_file() {
                self.cli_script = Some(script);
            }
        }

        self.json_config_paths = self
            .json_config_paths
            .iter()
            .map(|p| env.expand(p))
            .collect();
        self.json_import_path = env.expand(&self.json_import_path);
        self.ssh_config_path = env.expand(&self.ssh_config_path);
        self.cli_script = self.cli_script.as_ref().map(|p| env.expand(p));
    }

    /// The sync remote, when it is a git SSH URL
    pub fn sync_remote(&self) -> Option<&str> {
        self.sync
            .as_deref()
            .map(str::trim)
            .filter(|s| s.starts_with("git@"))
    }
}
