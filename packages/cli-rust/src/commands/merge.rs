//! pssh merge - Merge hosts from one JSON file into another

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;

use crate::context::Context;

/// Arguments for merge command
#[derive(Args)]
pub struct MergeArgs {
    /// JSON file to merge from
    pub source: PathBuf,

    /// JSON file to merge into
    pub target: PathBuf,

    /// JSON file that receives conflicting hosts as overrides
    pub overrides: PathBuf,
}

pub fn cmd_merge(args: &MergeArgs, ctx: &Context) -> Result<()> {
    let source_path = ctx.path(&args.source);
    let target_path = ctx.path(&args.target);
    let override_path = ctx.path(&args.overrides);

    ctx.backup(&target_path)?;
    ctx.backup(&override_path)?;

    ctx.say("Merging config...");
    let source = ctx.load(std::slice::from_ref(&source_path))?;
    let mut target = ctx.load(std::slice::from_ref(&target_path))?;
    let mut overrides = ctx.load(std::slice::from_ref(&override_path))?;

    let summary = source.merge(&mut target, &mut overrides)?;

    target.clean()?;
    target.write_json(&target_path)?;
    overrides.clean()?;
    overrides.write_json(&override_path)?;

    if !ctx.quiet {
        println!(
            "{} {} added, {} already present, {} conflict(s)",
            style("Merge complete:").green(),
            summary.inserted,
            summary.unchanged,
            summary.conflicts
        );
        if summary.conflicts > 0 {
            println!(
                "  {} Review the overrides in {}",
                style("Tip:").cyan(),
                style(override_path.display()).yellow()
            );
        }
    }
    Ok(())
}
