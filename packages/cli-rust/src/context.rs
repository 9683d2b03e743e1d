//! State shared by every command

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context as _, Result};
use pssh_core::{ConfigStore, Environment, Settings};

use crate::output::ConsoleReporter;

/// Settings plus global flags, handed to each command
pub struct Context {
    pub env: Environment,
    pub settings: Settings,
    pub settings_path: PathBuf,
    pub quiet: bool,
    pub verbose: u8,
    reporter: Rc<ConsoleReporter>,
}

impl Context {
    pub fn new(
        env: Environment,
        settings: Settings,
        settings_path: PathBuf,
        quiet: bool,
        verbose: u8,
    ) -> Self {
        Self {
            env,
            settings,
            settings_path,
            quiet,
            verbose,
            reporter: Rc::new(ConsoleReporter::new(verbose)),
        }
    }

    /// Empty store reporting through the console
    pub fn store(&self) -> ConfigStore {
        ConfigStore::new().with_reporter(self.reporter.clone())
    }

    /// Store loaded from `paths`, merged in order
    pub fn load(&self, paths: &[PathBuf]) -> Result<ConfigStore> {
        let mut store = self.store();
        store.read_json(paths)?;
        Ok(store)
    }

    /// Resolve `~` in a path given on the command line
    pub fn path(&self, path: &Path) -> PathBuf {
        self.env.expand(path)
    }

    /// Paths given on the command line, or `defaults` when none were
    pub fn paths_or(&self, given: &[PathBuf], defaults: &[PathBuf]) -> Vec<PathBuf> {
        if given.is_empty() {
            defaults.to_vec()
        } else {
            given.iter().map(|p| self.path(p)).collect()
        }
    }

    /// Copy `path` to `path.bak` before it changes, when backups are on
    pub fn backup(&self, path: &Path) -> Result<()> {
        if !self.settings.backup || !path.is_file() {
            return Ok(());
        }
        let backup_path = backup_path(path);
        fs::copy(path, &backup_path)
            .with_context(|| format!("Failed to create backup at: {}", backup_path.display()))?;
        tracing::debug!("Created backup: {}", backup_path.display());
        Ok(())
    }

    /// Print a line unless quiet
    pub fn say(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            println!("{message}");
        }
    }
}

/// `file.json` -> `file.json.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(dir: &Path, backup: bool) -> Context {
        let env = Environment::new(dir, dir.join(".pssh"));
        let settings = Settings {
            backup,
            ..Settings::defaults(&env)
        };
        let settings_path = env.settings_path();
        Context::new(env, settings, settings_path, true, 0)
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/tmp/work.json")),
            PathBuf::from("/tmp/work.json.bak")
        );
    }

    #[test]
    fn test_backup_copies_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("work.json");
        fs::write(&file, "{}").unwrap();

        context(dir.path(), true).backup(&file).unwrap();
        assert_eq!(fs::read_to_string(backup_path(&file)).unwrap(), "{}");

        // Missing files have nothing to back up
        context(dir.path(), true)
            .backup(&dir.path().join("missing.json"))
            .unwrap();
    }

    #[test]
    fn test_backup_respects_setting() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("work.json");
        fs::write(&file, "{}").unwrap();

        context(dir.path(), false).backup(&file).unwrap();
        assert!(!backup_path(&file).exists());
    }

    #[test]
    fn test_paths_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), true);
        let defaults = ctx.settings.json_config_paths.clone();
        assert_eq!(ctx.paths_or(&[], &defaults), defaults);

        let given = vec![PathBuf::from("~/other.json")];
        assert_eq!(
            ctx.paths_or(&given, &defaults),
            vec![dir.path().join("other.json")]
        );
    }
}
