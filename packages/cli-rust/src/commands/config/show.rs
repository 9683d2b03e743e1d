//! Config show subcommand
//!
//! Displays current settings in table or JSON format.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Color, Table};
use pssh_core::Settings;

use crate::context::Context;

/// Show current settings
pub fn cmd_config_show(ctx: &Context, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&ctx.settings)?);
        return Ok(());
    }

    println!("{}", settings_table(&ctx.settings));
    if !ctx.quiet {
        println!();
        println!("Settings file: {}", ctx.settings_path.display());
    }
    Ok(())
}

fn settings_table(settings: &Settings) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Key", "Value"]);

    table.add_row(vec![
        Cell::new("version"),
        Cell::new(settings.version.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("json_config_paths"),
        Cell::new(format_paths(&settings.json_config_paths)),
    ]);
    table.add_row(vec![
        Cell::new("json_import_path"),
        Cell::new(settings.json_import_path.display()),
    ]);
    table.add_row(vec![
        Cell::new("ssh_config_path"),
        Cell::new(settings.ssh_config_path.display()),
    ]);
    table.add_row(vec![
        Cell::new("cli_script"),
        Cell::new(format_optional(
            settings.cli_script.as_ref().map(|p| p.display().to_string()),
        )),
    ]);
    table.add_row(vec![
        Cell::new("sync"),
        match (&settings.sync, settings.sync_remote()) {
            (Some(_), None) => Cell::new(format_optional(settings.sync.clone())).fg(Color::Yellow),
            _ => Cell::new(format_optional(settings.sync.clone())),
        },
    ]);
    table.add_row(vec![
        Cell::new("backup"),
        Cell::new(settings.backup.to_string()),
    ]);
    table
}

fn format_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "(none)".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an optional value for display
fn format_optional(value: Option<String>) -> String {
    match value {
        Some(s) if !s.is_empty() => s,
        _ => "(not set)".to_string(),
    }
}
