//! Path resolution for pssh
//!
//! Everything that depends on the user's home directory goes through an
//! [`Environment`], so tests and callers can point pssh somewhere else.
//! - Linux/macOS: `~/.pssh/`
//! - Windows: `%APPDATA%\pssh\`

use std::path::{Path, PathBuf};

/// Name of the settings file inside the config directory
pub const SETTINGS_FILE: &str = "config.json";

/// Directories pssh reads from and writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub home_dir: PathBuf,
    pub config_dir: PathBuf,
}

impl Environment {
    pub fn new(home_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            config_dir: config_dir.into(),
        }
    }

    /// Locate the current user's directories
    ///
    /// Returns `None` when no home directory can be determined.
    pub fn detect() -> Option<Self> {
        let dirs = directories::BaseDirs::new()?;
        let home_dir = dirs.home_dir().to_path_buf();

        #[cfg(target_os = "windows")]
        let config_dir = dirs.config_dir().join("pssh");
        #[cfg(not(target_os = "windows"))]
        let config_dir = home_dir.join(".pssh");

        Some(Self {
            home_dir,
            config_dir,
        })
    }

    /// Full path to the settings file: `{config_dir}/config.json`
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }

    /// Expand a leading `~` to the home directory
    pub fn expand(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match path.strip_prefix("~") {
            Ok(rest) => self.home_dir.join(rest),
            Err(_) => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_returns_pssh_dir() {
        let env = Environment::detect().unwrap();
        assert!(env.config_dir.ends_with(".pssh") || env.config_dir.ends_with("pssh"));
        assert!(env.settings_path().ends_with("config.json"));
    }

    #[test]
    fn test_expand_home() {
        let env = Environment::new("/home/amy", "/home/amy/.pssh");
        assert_eq!(
            env.expand("~/.ssh/config"),
            PathBuf::from("/home/amy/.ssh/config")
        );
        assert_eq!(env.expand("~"), PathBuf::from("/home/amy"));
        assert_eq!(env.expand("/etc/ssh"), PathBuf::from("/etc/ssh"));
        assert_eq!(env.expand("~amy/x"), PathBuf::from("~amy/x"));
    }
}
