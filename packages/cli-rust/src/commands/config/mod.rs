//! Config subcommand implementations
//!
//! Provides `pssh config` subcommands for viewing settings.

mod show;

use anyhow::Result;
use clap::{Args, Subcommand};

pub use show::cmd_config_show;

use crate::context::Context;

/// Configuration command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Output as JSON instead of table format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

/// Settings subcommands
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show current settings
    Show {
        /// Output as JSON instead of table format
        #[arg(long)]
        json: bool,
    },
    /// Print the settings file path
    Path,
}

/// Handle config command
///
/// Defaults to Show when no subcommand is given.
pub fn cmd_config(args: &ConfigArgs, ctx: &Context) -> Result<()> {
    match &args.command {
        Some(ConfigSubcommands::Show { json }) => cmd_config_show(ctx, *json),
        Some(ConfigSubcommands::Path) => {
            println!("{}", ctx.settings_path.display());
            Ok(())
        }
        None => cmd_config_show(ctx, args.json),
    }
}
