//! pssh import - Read an SSH config into a JSON store file

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;

use crate::context::Context;

/// Arguments for import command
#[derive(Args)]
pub struct ImportArgs {
    /// Target JSON file (default: json_import_path)
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Source SSH config file (default: ssh_config_path)
    #[arg(short, long)]
    pub source: Option<PathBuf>,
}

pub fn cmd_import(args: &ImportArgs, ctx: &Context) -> Result<()> {
    let target = args
        .target
        .as_deref()
        .map_or_else(|| ctx.settings.json_import_path.clone(), |p| ctx.path(p));
    let source = args
        .source
        .as_deref()
        .map_or_else(|| ctx.settings.ssh_config_path.clone(), |p| ctx.path(p));

    ctx.backup(&target)?;

    let mut store = ctx.store();
    store.read_ssh(&source)?;
    store.clean()?;
    store.write_json(&target)?;

    if !ctx.quiet {
        println!(
            "{} {} host(s) - see JSON in {}",
            style("Import complete:").green(),
            store.hosts().len(),
            style(target.display()).yellow()
        );
    }
    Ok(())
}
