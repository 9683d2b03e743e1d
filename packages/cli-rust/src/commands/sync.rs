//! pssh sync - Sync the config directory with a git remote

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context as _, Result, bail};
use clap::Args;
use pssh_core::config::ensure_config_dir;
use pssh_core::host::STAMP_FORMAT;

use crate::context::Context;
use crate::output::StepSpinner;

/// Name of the git remote pssh manages
const REMOTE: &str = "sync";
const BRANCH: &str = "master";

/// Arguments for sync command
#[derive(Args)]
pub struct SyncArgs {}

pub fn cmd_sync(_args: &SyncArgs, ctx: &Context) -> Result<()> {
    if ctx.settings.sync.as_deref().is_none_or(|s| s.trim().is_empty()) {
        ctx.say("Sync is not configured. Set \"sync\" to a git@ URL in the settings file.");
        return Ok(());
    }
    sync(ctx)
}

/// Pull, commit and push the config directory when `sync` is set
///
/// Does nothing when sync isn't configured.
pub fn sync(ctx: &Context) -> Result<()> {
    let Some(remote) = ctx.settings.sync_remote() else {
        if ctx.settings.sync.as_deref().is_some_and(|s| !s.trim().is_empty()) {
            tracing::warn!("Only git@ sync URLs are supported, skipping sync");
        }
        return Ok(());
    };

    let dir = &ensure_config_dir(&ctx.env)?;
    let spinner = StepSpinner::start("Syncing...", ctx.quiet);

    if !dir.join(".git").is_dir() {
        spinner.update("Initializing git repository...");
        require(git(dir, &["init"])?, "git init")?;
        require(git(dir, &["remote", "add", REMOTE, remote])?, "git remote add")?;
    }

    spinner.update("Pulling...");
    let pulled = git(dir, &["pull", REMOTE, BRANCH])?;
    if !pulled.status.success() {
        // Fails on a brand new remote with no branch yet
        tracing::warn!("git pull failed: {}", stderr(&pulled));
    }

    let ignore_path = dir.join(".gitignore");
    if !ignore_path.is_file() {
        let contents = gitignore_contents(dir, &ctx.settings.json_config_paths);
        fs::write(&ignore_path, contents)
            .with_context(|| format!("Failed to write {}", ignore_path.display()))?;
    }

    spinner.update("Pushing...");
    require(git(dir, &["add", ".", "--all"])?, "git add")?;

    let stamp = chrono::Local::now().format(STAMP_FORMAT).to_string();
    let message = format!("Automatic sync commit - {stamp}");
    let committed = git(dir, &["commit", "-m", &message])?;
    if !committed.status.success() {
        tracing::debug!("Nothing committed: {}", stderr(&committed));
    }

    match require(git(dir, &["push", REMOTE, BRANCH])?, "git push") {
        Ok(()) => {
            spinner.success("Synced");
            Ok(())
        }
        Err(e) => {
            spinner.fail("Sync failed");
            Err(e)
        }
    }
}

/// Ignore everything except the shared files: the first JSON config and
/// the CLI script
fn gitignore_contents(config_dir: &Path, json_config_paths: &[PathBuf]) -> String {
    let mut contents = String::from("*\n!.gitignore\n!ssh_cli.sh\n");
    if let Some(shared) = json_config_paths
        .first()
        .and_then(|p| p.strip_prefix(config_dir).ok())
    {
        contents.push_str(&format!("!/{}\n", shared.display()));
    }
    contents
}

fn git(dir: &Path, args: &[&str]) -> Result<Output> {
    tracing::debug!("git {}", args.join(" "));
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .context("Failed to run git. Is it installed and on your PATH?")
}

fn require(output: Output, what: &str) -> Result<()> {
    if output.status.success() {
        Ok(())
    } else {
        bail!("{what} failed: {}", stderr(&output))
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
