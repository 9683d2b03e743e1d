//! pssh add - Add a new SSH host, prompting for anything not given

use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use clap::Args;
use console::style;
use dialoguer::Input;
use pssh_core::host::{DEFAULT_PORT, canonicalize};
use pssh_core::{AddOutcome, HostRecord, HostSearch};

use super::export::export_defaults;
use super::init_host::{InitChoices, init_host, select_file};
use super::sync::sync;
use crate::context::Context;
use crate::output::{alias_style, outcome_label, rule};

/// Arguments for add command
#[derive(Args)]
pub struct AddArgs {
    /// JSON file to add the host to (default: pick from json_config_paths)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Hostname - domain or IP
    #[arg(long)]
    pub hostname: Option<String>,

    /// SSH username
    #[arg(short, long)]
    pub user: Option<String>,

    /// Alias to reach the host by (default: the user, made unique)
    #[arg(short, long)]
    pub alias: Option<String>,

    /// SSH port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Add even when a host with the same hostname and user exists
    #[arg(long)]
    pub force: bool,

    /// Skip the key copy / CLI setup prompts afterwards
    #[arg(long)]
    pub no_init: bool,
}

pub fn cmd_add(args: &AddArgs, ctx: &Context) -> Result<()> {
    sync(ctx)?;

    rule(ctx.quiet);
    ctx.say("ADDING SSH HOST");
    rule(ctx.quiet);

    let target = match &args.file {
        Some(path) => ctx.path(path),
        None => select_file(ctx, "Config File")?,
    };
    let mut store = ctx.load(std::slice::from_ref(&target))?;

    // Hostname
    let raw_hostname = match &args.hostname {
        Some(hostname) => {
            ctx.say(format!("HostName (URL/IP): {hostname}"));
            hostname.trim().to_string()
        }
        None => Input::<String>::new()
            .with_prompt("HostName (URL/IP)")
            .interact_text()?
            .trim()
            .to_string(),
    };
    if raw_hostname.is_empty() {
        bail!("A hostname is required");
    }
    let canonical = canonicalize(store.resolver(), &raw_hostname, true, true);
    if let Some(warning) = &canonical.warning {
        eprintln!("{} {warning}", style("Warning:").yellow());
    }
    let hostname = canonical.hostname;
    if hostname != raw_hostname {
        ctx.say(format!(" ({hostname})"));
    }

    // User
    let user = match &args.user {
        Some(user) => {
            ctx.say(format!("User: {user}"));
            user.trim().to_string()
        }
        None => {
            let existing = store.find(&HostSearch {
                hostname: Some(&hostname),
                ..HostSearch::default()
            });
            if !existing.hostname.is_empty() {
                let users: Vec<&str> = existing.hostname.keys().map(String::as_str).collect();
                ctx.say(format!(
                    "NOTE: existing users configured for this hostname: ({})",
                    users.join(", ")
                ));
            }
            Input::<String>::new()
                .with_prompt("User")
                .default(whoami::username())
                .interact_text()?
                .trim()
                .to_string()
        }
    };
    if user.is_empty() {
        bail!("A user is required");
    }

    // Alias
    let alias = match &args.alias {
        Some(alias) => {
            ctx.say(format!("Alias: {alias}"));
            alias.trim().to_string()
        }
        None => Input::<String>::new()
            .with_prompt("Alias")
            .default(store.auto_alias(&user))
            .interact_text()?
            .trim()
            .to_string(),
    };

    // Port
    let port = match args.port {
        Some(port) => {
            ctx.say(format!("Port: {port}"));
            port
        }
        None => Input::<u16>::new()
            .with_prompt("Port")
            .default(DEFAULT_PORT)
            .interact_text()?,
    };

    rule(ctx.quiet);
    ctx.say(format!("- adding host to {}...", target.display()));

    let host = HostRecord::new(hostname).with_user(user).with_port(port);
    let outcome = store.add(&alias, host, args.force)?;

    if let AddOutcome::Conflict {
        existing_key,
        override_host,
    } = &outcome
    {
        eprintln!(
            "{} Host {} already exists with different settings:",
            outcome_label(&outcome),
            alias_style(existing_key)
        );
        eprintln!("{}", serde_json::to_string_pretty(override_host)?);
        eprintln!();
        eprintln!(
            "  {} Use {} to add it anyway, or {} to change the existing host.",
            style("Tip:").cyan(),
            style("--force").green(),
            style(format!("pssh edit-host {existing_key}")).green()
        );
        bail!("Unable to add host - conflict in {}", target.display());
    }

    let key = init_target(&outcome)
        .ok_or_else(|| anyhow!("Unable to add host - no key for {alias}"))?
        .to_string();

    ctx.backup(&target)?;
    store.clean()?;
    store.write_json(&target)?;

    export_defaults(ctx)?;
    sync(ctx)?;

    if !ctx.quiet {
        println!("{} {}", outcome_label(&outcome), alias_style(&key));
    }

    if !args.no_init && !ctx.quiet {
        let choices = InitChoices {
            team_config: Some(target.clone()),
            ..InitChoices::default()
        };
        init_host(ctx, &key, choices)?;
    }

    rule(ctx.quiet);
    ctx.say("Done!");
    Ok(())
}

/// Alias to initialize after an add: the key the host ended up under
fn init_target(outcome: &AddOutcome) -> Option<&str> {
    outcome.key()
}
