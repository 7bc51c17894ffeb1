//! `outlook-sync`: copy one Outlook calendar into a relational table.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;
mod logging;
mod menu;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use outlooksync_domain::constants::EXIT_FATAL;
use outlooksync_domain::SyncError;
use outlooksync_infra::{load_from_env, load_store_from_env, LoadOptions};
use tracing::{debug, error};

use crate::cli::{Cli, Command};
use crate::commands::App;

const DEFAULT_ENV_FILES: [&str; 2] = [".env.local", ".env"];

fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = load_env_files(cli.env_file.as_deref());
    logging::init(cli.log_format);

    let code = match loaded.and_then(|files| {
        debug!(?files, "environment files loaded");
        run(&cli)
    }) {
        Ok(code) => code,
        Err(err) => report_failure(&err),
    };

    ExitCode::from(code)
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: &Cli) -> anyhow::Result<u8> {
    let mut stdout = std::io::stdout().lock();

    match cli.selected_command() {
        Command::InitDb => {
            let store = load_store_from_env()?;
            commands::init_db(&store, &mut stdout).await
        }
        Command::Sync => build_app(cli)?.sync(&mut stdout).await,
        Command::Calendars => build_app(cli)?.calendars(&mut stdout).await,
        Command::Users => build_app(cli)?.users(&mut stdout).await,
        Command::Whoami => build_app(cli)?.whoami(&mut stdout).await,
        Command::Menu => {
            let app = build_app(cli)?;
            let mut stdin = std::io::stdin().lock();
            menu::run(&app, &mut stdin, &mut stdout).await
        }
    }
}

fn build_app(cli: &Cli) -> anyhow::Result<App> {
    let options = LoadOptions { auth_mode: cli.auth.into(), mailbox: cli.mailbox.clone() };
    let config = load_from_env(&options)?;
    Ok(App::build(&config, cli.policy())?)
}

/// Load `--env-file`, or `.env.local` then `.env` when present.
///
/// Variables already set in the environment are never overridden, so earlier
/// files win over later ones.
fn load_env_files(explicit: Option<&Path>) -> anyhow::Result<Vec<String>> {
    if let Some(path) = explicit {
        dotenvy::from_path(path).map_err(|e| {
            SyncError::Config(format!("cannot read env file {}: {e}", path.display()))
        })?;
        return Ok(vec![path.display().to_string()]);
    }

    let mut loaded = Vec::new();
    for name in DEFAULT_ENV_FILES {
        match dotenvy::from_filename(name) {
            Ok(path) => loaded.push(path.display().to_string()),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(SyncError::Config(format!("cannot read env file {name}: {e}")).into())
            }
        }
    }
    Ok(loaded)
}

/// Print the failed stage and pick the exit code.
fn report_failure(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SyncError>() {
        Some(sync) => {
            error!(stage = sync.stage(), error = %sync, "outlook-sync failed");
            eprintln!("outlook-sync: {} failed: {}", sync.stage(), sync.message());
        }
        None => {
            error!(error = %err, "outlook-sync failed");
            eprintln!("outlook-sync: {err:#}");
        }
    }
    EXIT_FATAL
}
