//! Settings management for pssh
//!
//! Handles loading and saving the JSONC settings file.
//! Creates a default file if missing, rejects unknown fields.

pub mod paths;
pub mod schema;

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jsonc_parser::parse_to_serde_value;

pub use paths::{Environment, SETTINGS_FILE};
pub use schema::{SETTINGS_VERSION, Settings};

/// Ensure the config directory exists
///
/// Creates `~/.pssh/` if it doesn't exist and returns its path.
pub fn ensure_config_dir(env: &Environment) -> Result<PathBuf> {
    let config_dir = &env.config_dir;
    if !config_dir.exists() {
        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;
        tracing::info!("Created config directory: {}", config_dir.display());
    }
    Ok(config_dir.clone())
}

/// Load settings from `path`, or from the environment's default location
///
/// If the file doesn't exist, writes and returns the defaults.
/// Supports JSONC (JSON with comments).
pub fn load_settings(env: &Environment, path: Option<&Path>) -> Result<Settings> {
    let settings_path = path.map_or_else(|| env.settings_path(), Path::to_path_buf);

    if !settings_path.exists() {
        tracing::info!(
            "Settings file not found, creating default at: {}",
            settings_path.display()
        );
        let settings = Settings::defaults(env);
        save_settings(&settings, &settings_path)?;
        return Ok(settings);
    }

    let mut file = File::open(&settings_path)
        .with_context(|| format!("Failed to open settings file: {}", settings_path.display()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .with_context(|| format!("Failed to read settings file: {}", settings_path.display()))?;

    let parsed_value = parse_to_serde_value(&contents, &Default::default())
        .map_err(|e| anyhow::anyhow!("Invalid JSONC in settings file: {}", e))?
        .ok_or_else(|| anyhow::anyhow!("Settings file is empty"))?;

    let mut settings: Settings = serde_json::from_value(parsed_value).with_context(|| {
        format!(
            "Invalid settings in {}. Check for unknown fields or invalid values.",
            settings_path.display()
        )
    })?;
    settings.fill_defaults(env);

    tracing::debug!("Loaded settings from: {}", settings_path.display());
    Ok(settings)
}

/// Save settings to `path`
///
/// Creates a backup of an existing file (`config.json.bak`) and the parent
/// directory when needed.
pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if path.exists() {
        let backup_path = path.with_extension("json.bak");
        fs::copy(path, &backup_path)
            .with_context(|| format!("Failed to create backup at: {}", backup_path.display()))?;
        tracing::debug!("Created settings backup: {}", backup_path.display());
    }

    let json =
        serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create settings file: {}", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("Failed to write settings file: {}", path.display()))?;

    tracing::debug!("Saved settings to: {}", path.display());
    Ok(())
}
