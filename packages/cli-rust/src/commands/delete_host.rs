//! pssh delete-host - Remove a host from every JSON file holding it

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use console::style;
use dialoguer::Confirm;

use super::export::export_defaults;
use super::sync::sync;
use crate::context::Context;
use crate::output::alias_style;

/// Arguments for delete-host command
#[derive(Args)]
pub struct DeleteHostArgs {
    /// Alias of the host to delete
    pub alias: String,

    /// JSON file(s) to delete from (default: all json_config_paths)
    pub paths: Vec<PathBuf>,

    /// Skip confirmation prompt
    #[arg(long, short)]
    pub force: bool,
}

pub fn cmd_delete_host(args: &DeleteHostArgs, ctx: &Context) -> Result<()> {
    let paths = ctx.paths_or(&args.paths, &ctx.settings.json_config_paths);

    if !args.force && !ctx.quiet {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to delete the config for '{}'?",
                args.alias
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    sync(ctx)?;

    let mut deleted_from = Vec::new();
    for path in &paths {
        if !path.is_file() {
            continue;
        }
        let mut store = ctx.load(std::slice::from_ref(path))?;
        if store.delete_host(&args.alias) {
            ctx.backup(path)?;
            store.clean()?;
            store.write_json(path)?;
            deleted_from.push(path.clone());
        }
    }

    if deleted_from.is_empty() {
        bail!("Host '{}' not found in config files", args.alias);
    }

    export_defaults(ctx)?;
    sync(ctx)?;

    if !ctx.quiet {
        for path in &deleted_from {
            println!(
                "{} Host {} removed from {}",
                style("Deleted:").green(),
                alias_style(&args.alias),
                path.display()
            );
        }
    }
    Ok(())
}
