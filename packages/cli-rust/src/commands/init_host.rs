//! pssh init-host - Copy SSH keys (and optional CLI tools) to a host

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context as _, Result, bail};
use clap::Args;
use console::style;
use dialoguer::{Confirm, Select};

use crate::context::Context;
use crate::output::alias_style;

/// Appends stdin to authorized_keys on the remote side
const REMOTE_APPEND: &str = "mkdir -p ~/.ssh && cat >> ~/.ssh/authorized_keys \
                             && chmod 700 ~/.ssh && chmod 600 ~/.ssh/authorized_keys";

/// Arguments for init-host command
#[derive(Args)]
pub struct InitHostArgs {
    /// Alias of the host to initialize
    pub alias: String,

    /// Copy your SSH key to the host
    #[arg(long)]
    pub copy_key: bool,

    /// Copy all team SSH keys to the host
    #[arg(long)]
    pub team_keys: bool,

    /// JSON file holding the team key settings
    #[arg(long)]
    pub team_config: Option<PathBuf>,

    /// Set up server CLI tools using cli_script
    #[arg(long)]
    pub cli: bool,
}

/// What to do on the host; `None` means ask
#[derive(Debug, Default, Clone)]
pub struct InitChoices {
    pub copy_key: Option<bool>,
    pub team_keys: Option<bool>,
    pub team_config: Option<PathBuf>,
    pub cli: Option<bool>,
}

impl From<&InitHostArgs> for InitChoices {
    fn from(args: &InitHostArgs) -> Self {
        let any = args.copy_key || args.team_keys || args.cli;
        // Any explicit flag means "only what was asked for"
        let pick = |flag: bool| if any { Some(flag) } else { None };
        Self {
            copy_key: pick(args.copy_key),
            team_keys: pick(args.team_keys),
            team_config: args.team_config.clone(),
            cli: pick(args.cli),
        }
    }
}

pub fn cmd_init_host(args: &InitHostArgs, ctx: &Context) -> Result<()> {
    init_host(ctx, &args.alias, InitChoices::from(args))
}

/// Copy keys to the host and run the CLI script, asking where unsure
pub fn init_host(ctx: &Context, alias: &str, choices: InitChoices) -> Result<()> {
    let copy_key = match choices.copy_key {
        Some(choice) => choice,
        None => ask(ctx, "Copy key?", true)?,
    };

    if copy_key || choices.team_keys == Some(true) {
        let team_keys = match choices.team_keys {
            Some(choice) => choice,
            None => ask(ctx, "Copy all team keys?", false)?,
        };

        let block = if team_keys {
            let config_path = match &choices.team_config {
                Some(path) => ctx.path(path),
                None => select_file(ctx, "Config for team keys")?,
            };
            let store = ctx.load(std::slice::from_ref(&config_path))?;
            let block = store.authorized_keys_block()?;
            if block.is_none() {
                eprintln!(
                    "{} No team key config found, copying your key instead",
                    style("Warning:").yellow()
                );
            }
            block
        } else {
            None
        };

        ctx.say("Enter ssh password for this host if prompted");
        match block {
            Some(block) => append_authorized_keys(alias, &block)?,
            None => run("ssh-copy-id", &[alias])?,
        }
    }

    let script = ctx.settings.cli_script.as_deref().filter(|p| p.is_file());
    let cli = match (choices.cli, script) {
        (Some(choice), _) => choice,
        (None, Some(_)) => ask(ctx, "Set up server cli tools?", false)?,
        (None, None) => false,
    };
    if cli {
        let Some(script) = script else {
            bail!("No cli_script configured. Set \"cli_script\" in the settings file.");
        };
        run_script(script, alias)?;
    }

    if !ctx.quiet {
        println!("{} Host {} initialized", style("Done:").green(), alias_style(alias));
    }
    Ok(())
}

/// Yes/no prompt; quiet mode answers no
fn ask(ctx: &Context, prompt: &str, default: bool) -> Result<bool> {
    if ctx.quiet {
        return Ok(false);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Pick one of the configured JSON files
pub fn select_file(ctx: &Context, prompt: &str) -> Result<PathBuf> {
    let paths = &ctx.settings.json_config_paths;
    match paths.as_slice() {
        [] => bail!("No json_config_paths configured"),
        [only] => Ok(only.clone()),
        _ if ctx.quiet => Ok(paths[0].clone()),
        _ => {
            let items: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            let index = Select::new()
                .with_prompt(prompt)
                .items(&items)
                .default(0)
                .interact()?;
            Ok(paths[index].clone())
        }
    }
}

fn append_authorized_keys(alias: &str, block: &str) -> Result<()> {
    let mut child = Command::new("ssh")
        .arg(alias)
        .arg(REMOTE_APPEND)
        .stdin(Stdio::piped())
        .spawn()
        .context("Failed to run ssh. Is it installed and on your PATH?")?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(block.as_bytes())?;
        stdin.write_all(b"\n")?;
    }

    let status = child.wait()?;
    if !status.success() {
        bail!("Copying team keys to '{alias}' failed ({status})");
    }
    Ok(())
}

fn run_script(script: &Path, alias: &str) -> Result<()> {
    let script = script.to_string_lossy();
    run("bash", &[script.as_ref(), alias])
}

fn run(program: &str, args: &[&str]) -> Result<()> {
    tracing::debug!("Running {program} {}", args.join(" "));
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run {program}. Is it installed and on your PATH?"))?;
    if !status.success() {
        bail!("{program} failed ({status})");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(copy_key: bool, team_keys: bool, cli: bool) -> InitHostArgs {
        InitHostArgs {
            alias: "web".to_string(),
            copy_key,
            team_keys,
            team_config: None,
            cli,
        }
    }

    #[test]
    fn test_no_flags_means_ask() {
        let choices = InitChoices::from(&args(false, false, false));
        assert_eq!(choices.copy_key, None);
        assert_eq!(choices.team_keys, None);
        assert_eq!(choices.cli, None);
    }

    #[test]
    fn test_flags_answer_everything() {
        let choices = InitChoices::from(&args(false, true, false));
        assert_eq!(choices.copy_key, Some(false));
        assert_eq!(choices.team_keys, Some(true));
        assert_eq!(choices.cli, Some(false));
    }
}
