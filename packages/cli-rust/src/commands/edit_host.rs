//! pssh edit-host - Edit one host as JSONC in your editor

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use console::style;
use dialoguer::{Confirm, Editor};
use pssh_core::host::parse_host_json;

use super::export::export_defaults;
use super::sync::sync;
use crate::context::Context;
use crate::output::alias_style;

/// Arguments for edit-host command
#[derive(Args)]
pub struct EditHostArgs {
    /// Alias of the host to edit
    pub alias: String,

    /// JSON file(s) to look in (default: first of json_config_paths holding the alias)
    pub paths: Vec<PathBuf>,
}

pub fn cmd_edit_host(args: &EditHostArgs, ctx: &Context) -> Result<()> {
    let paths = ctx.paths_or(&args.paths, &ctx.settings.json_config_paths);

    sync(ctx)?;

    let mut found = None;
    for path in &paths {
        if !path.is_file() {
            continue;
        }
        let store = ctx.load(std::slice::from_ref(path))?;
        if store.get_host(&args.alias).is_some() {
            found = Some((path.clone(), store));
            break;
        }
    }
    let Some((path, mut store)) = found else {
        bail!("Host '{}' not found in config files", args.alias);
    };

    let original = match store.get_host(&args.alias) {
        Some((_, host)) => host.clone(),
        None => bail!("Host '{}' not found in {}", args.alias, path.display()),
    };

    let origin = PathBuf::from(format!("{}.hjson", args.alias));
    let mut text = store.host_json(&args.alias)?;
    let edited = loop {
        let Some(result) = Editor::new().extension(".hjson").edit(&text)? else {
            ctx.say("Edit aborted - no changes saved.");
            return Ok(());
        };
        text = result;

        match parse_host_json(&text, &origin) {
            Ok(Some(host)) => break host,
            Ok(None) => eprintln!("{} Nothing left to save", style("Warning:").yellow()),
            Err(e) => eprintln!(
                "{} Invalid JSON - check your syntax: {e}",
                style("Warning:").yellow()
            ),
        }

        let keep_editing = Confirm::new()
            .with_prompt("Keep editing?")
            .default(true)
            .interact()?;
        if !keep_editing {
            return Ok(());
        }
    };

    if edited == original {
        ctx.say("No changes.");
        return Ok(());
    }

    store.set_host(&args.alias, edited);
    ctx.backup(&path)?;
    store.clean()?;
    store.write_json(&path)?;

    export_defaults(ctx)?;
    sync(ctx)?;

    if !ctx.quiet {
        println!(
            "{} Host {} saved to {}",
            style("Updated:").green(),
            alias_style(&args.alias),
            path.display()
        );
    }
    Ok(())
}
