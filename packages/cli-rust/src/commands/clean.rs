//! pssh clean - Clean JSON store files in place

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;

use crate::context::Context;
use crate::output::StepSpinner;

/// Arguments for clean command
#[derive(Args)]
pub struct CleanArgs {
    /// JSON file(s) to clean (default: json_config_paths)
    pub paths: Vec<PathBuf>,
}

pub fn cmd_clean(args: &CleanArgs, ctx: &Context) -> Result<()> {
    let paths = ctx.paths_or(&args.paths, &ctx.settings.json_config_paths);
    let mut all_exportable = true;

    for path in &paths {
        if !path.is_file() {
            tracing::debug!("Skipping missing file {}", path.display());
            continue;
        }
        ctx.backup(path)?;

        let spinner = StepSpinner::start(&format!("Cleaning {}", path.display()), ctx.quiet);
        let mut store = ctx.load(std::slice::from_ref(path))?;
        let exportable = spinner.suspend(|| store.clean())?;
        store.write_json(path)?;

        if exportable {
            spinner.success(&format!("Cleaned {}", path.display()));
        } else {
            all_exportable = false;
            spinner.fail(&format!("Cleaned {} with warnings", path.display()));
        }
    }

    if !all_exportable && !ctx.quiet {
        eprintln!(
            "  {} Fix the warnings above before exporting.",
            style("Tip:").cyan()
        );
    }
    ctx.say("Clean complete");
    Ok(())
}
