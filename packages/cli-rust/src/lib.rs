//! pssh CLI - Manage SSH hosts in JSON and export them to ~/.ssh/config
//!
//! This module contains the CLI implementation used by the `pssh` binary.

mod commands;
mod context;
mod output;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use pssh_core::{Environment, get_version, get_version_long, load_settings};
use tracing_subscriber::EnvFilter;

use crate::context::Context;

/// Manage SSH hosts in JSON and export them to ~/.ssh/config
#[derive(Parser)]
#[command(name = "pssh")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage SSH hosts in JSON and export them to ~/.ssh/config", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Increase verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Settings file to use instead of ~/.pssh/config.json
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new SSH host - interactive, or specify options
    Add(commands::AddArgs),
    /// Clean JSON config files
    Clean(commands::CleanArgs),
    /// Export JSON config to the SSH config file
    Export(commands::ExportArgs),
    /// Import SSH config data into JSON
    Import(commands::ImportArgs),
    /// Delete a host from the JSON config files
    DeleteHost(commands::DeleteHostArgs),
    /// Edit a host in your editor
    EditHost(commands::EditHostArgs),
    /// Copy SSH keys and CLI tools to a host
    InitHost(commands::InitHostArgs),
    /// Merge hosts from one JSON file into another
    Merge(commands::MergeArgs),
    /// Search for hosts
    Search(commands::SearchArgs),
    /// List all hosts
    List(commands::ListArgs),
    /// Sync config files with the git remote in "sync"
    Sync(commands::SyncArgs),
    /// Show settings
    Config(commands::ConfigArgs),
}

/// Log filter: warn by default, more with each -v; RUST_LOG wins
fn log_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        _ => "debug",
    };
    EnvFilter::new(level)
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose, cli.quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let env = Environment::detect().ok_or_else(|| {
        anyhow::anyhow!("Could not determine home directory. Ensure HOME is set.")
    })?;
    let settings_path = cli
        .config
        .as_deref()
        .map_or_else(|| env.settings_path(), |p| env.expand(p));

    let settings = match load_settings(&env, Some(&settings_path)) {
        Ok(settings) => settings,
        Err(e) => {
            show_settings_error(&e, &settings_path);
            std::process::exit(1);
        }
    };

    if cli.verbose > 0 {
        eprintln!(
            "{} Settings: {}",
            style("[info]").cyan(),
            settings_path.display()
        );
        eprintln!(
            "{} Config dir: {}",
            style("[info]").cyan(),
            env.config_dir.display()
        );
    }

    let ctx = Context::new(env, settings, settings_path, cli.quiet, cli.verbose);

    let result = match &cli.command {
        Some(Commands::Add(args)) => commands::cmd_add(args, &ctx),
        Some(Commands::Clean(args)) => commands::cmd_clean(args, &ctx),
        Some(Commands::Export(args)) => commands::cmd_export(args, &ctx),
        Some(Commands::Import(args)) => commands::cmd_import(args, &ctx),
        Some(Commands::DeleteHost(args)) => commands::cmd_delete_host(args, &ctx),
        Some(Commands::EditHost(args)) => commands::cmd_edit_host(args, &ctx),
        Some(Commands::InitHost(args)) => commands::cmd_init_host(args, &ctx),
        Some(Commands::Merge(args)) => commands::cmd_merge(args, &ctx),
        Some(Commands::Search(args)) => commands::cmd_search(args, &ctx),
        Some(Commands::List(args)) => commands::cmd_list(args, &ctx),
        Some(Commands::Sync(args)) => commands::cmd_sync(args, &ctx),
        Some(Commands::Config(args)) => commands::cmd_config(args, &ctx),
        None => {
            if !cli.quiet {
                let version = if cli.verbose > 0 {
                    get_version_long()
                } else {
                    get_version()
                };
                println!("{} {}", style("pssh").cyan().bold(), style(version).dim());
                println!();
                println!("Run {} for available commands.", style("--help").green());
            }
            Ok(())
        }
    };

    if let Err(e) = &result {
        eprintln!("{} {e:#}", style("Error:").red().bold());
        std::process::exit(1);
    }
    result
}

/// Display a rich error for an unreadable settings file
fn show_settings_error(err: &anyhow::Error, settings_path: &Path) {
    eprintln!("{} Settings error", style("Error:").red().bold());
    eprintln!();
    eprintln!("  {err:#}");
    eprintln!();
    eprintln!("  Settings file: {}", style(settings_path.display()).yellow());
    eprintln!();
    eprintln!(
        "  {} Check the file for syntax errors or unknown fields.",
        style("Tip:").cyan()
    );
    eprintln!(
        "  {} Delete it to have pssh write fresh defaults.",
        style("Tip:").cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "pssh", "-vv", "add", "--hostname", "example.com", "--user", "amy", "--port", "2222",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Commands::Add(_))));

        let cli = Cli::try_parse_from(["pssh", "merge", "a.json", "b.json", "c.json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Merge(_))));

        let cli = Cli::try_parse_from(["pssh", "delete-host", "web", "--force"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::DeleteHost(_))));

        assert!(Cli::try_parse_from(["pssh", "search"]).is_err());
    }
}
