//! pssh export - Write JSON store files out as an SSH config

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::context::Context;

/// Arguments for export command
#[derive(Args)]
pub struct ExportArgs {
    /// Source JSON file(s), merged in order (default: json_config_paths)
    #[arg(short, long = "source")]
    pub sources: Vec<PathBuf>,

    /// Target SSH config file (default: ssh_config_path)
    #[arg(short, long)]
    pub target: Option<PathBuf>,
}

pub fn cmd_export(args: &ExportArgs, ctx: &Context) -> Result<()> {
    let sources = ctx.paths_or(&args.sources, &ctx.settings.json_config_paths);
    let target = args
        .target
        .as_deref()
        .map_or_else(|| ctx.settings.ssh_config_path.clone(), |p| ctx.path(p));
    export(ctx, &sources, &target)?;
    ctx.say("Export complete");
    Ok(())
}

/// Load `sources`, clean, and write the SSH config to `target`
pub fn export(ctx: &Context, sources: &[PathBuf], target: &std::path::Path) -> Result<()> {
    tracing::debug!("Exporting {} file(s) to {}", sources.len(), target.display());
    ctx.backup(target)?;

    let mut store = ctx.load(sources)?;
    store.write_ssh(target)?;
    Ok(())
}

/// Export the default JSON files to the default SSH config
pub fn export_defaults(ctx: &Context) -> Result<()> {
    export(
        ctx,
        &ctx.settings.json_config_paths,
        &ctx.settings.ssh_config_path,
    )
}
