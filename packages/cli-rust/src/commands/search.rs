//! pssh search / pssh list - Find hosts across the JSON store files

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, Table};
use console::style;
use pssh_core::HostRecord;

use crate::context::Context;

/// Arguments for search command
#[derive(Args)]
pub struct SearchArgs {
    /// Term(s) to search for
    #[arg(required = true)]
    pub terms: Vec<String>,

    /// JSON file(s) to search (default: json_config_paths)
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// Print aliases only (for scripting)
    #[arg(long)]
    pub names_only: bool,
}

/// Arguments for list command
#[derive(Args)]
pub struct ListArgs {
    /// JSON file(s) to list (default: json_config_paths)
    #[arg(short, long = "file")]
    pub files: Vec<PathBuf>,

    /// Print aliases only (for scripting)
    #[arg(long)]
    pub names_only: bool,
}

pub fn cmd_search(args: &SearchArgs, ctx: &Context) -> Result<()> {
    let query = args.terms.join(" ");
    show(ctx, &args.files, &query, args.names_only)
}

pub fn cmd_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    show(ctx, &args.files, "", args.names_only)
}

fn show(ctx: &Context, files: &[PathBuf], query: &str, names_only: bool) -> Result<()> {
    let paths = ctx.paths_or(files, &ctx.settings.json_config_paths);
    let store = ctx.load(&paths)?;
    let results = store.search(query);

    if results.is_empty() {
        if !names_only {
            ctx.say("No results found");
        }
        return Ok(());
    }

    if names_only || ctx.quiet {
        for (_, host) in &results {
            println!("{}", host.pssh.alias);
        }
        return Ok(());
    }

    println!("{}", results_table(&results));
    println!();
    println!(
        "  {} {}",
        style(format!("{} host(s).", results.len())).dim(),
        style("Connect with: ssh <alias>").dim()
    );
    Ok(())
}

fn results_table(results: &[(String, HostRecord)]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Alias", "Destination", "Key"]);

    for (key, host) in results {
        let alias = &host.pssh.alias;
        let key_cell = if key == alias {
            Cell::new("")
        } else {
            Cell::new(key).fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(alias).fg(Color::Cyan),
            Cell::new(host.destination()),
            key_cell,
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shows_destination_and_differing_keys() {
        let results = vec![
            (
                "web".to_string(),
                HostRecord::new("10.0.0.1")
                    .with_alias("web")
                    .with_user("deploy")
                    .with_port(2222),
            ),
            (
                "old-db".to_string(),
                HostRecord::new("10.0.0.2").with_alias("db"),
            ),
        ];

        let rendered = results_table(&results).to_string();
        assert!(rendered.contains("deploy@10.0.0.1:2222"));
        assert!(rendered.contains("old-db"));
        assert!(rendered.contains("db"));
    }
}
