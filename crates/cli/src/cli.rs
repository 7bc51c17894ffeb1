//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use outlooksync_core::WriteFailurePolicy;
use outlooksync_domain::AuthMode;

/// Copy an Outlook calendar into the `outlook_event` table.
#[derive(Parser, Debug)]
#[command(name = "outlook-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// How to obtain the Graph token
    #[arg(long, value_enum, default_value_t = AuthArg::App, global = true)]
    pub auth: AuthArg,

    /// Mailbox to synchronise (overrides USER_ID)
    #[arg(long, global = true)]
    pub mailbox: Option<String>,

    /// Abort the run at the first row that cannot be written
    #[arg(long, global = true)]
    pub fail_fast: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Load variables from this file instead of `.env.local` and `.env`
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,
}

impl Cli {
    pub fn selected_command(&self) -> Command {
        self.command.unwrap_or(Command::Sync)
    }

    pub fn policy(&self) -> WriteFailurePolicy {
        if self.fail_fast {
            WriteFailurePolicy::Abort
        } else {
            WriteFailurePolicy::Continue
        }
    }
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run one full sync (default)
    Sync,
    /// List the mailbox's calendars
    Calendars,
    /// List the first 25 directory users
    Users,
    /// Show the signed-in user (device code only)
    Whoami,
    /// Create the event table if it does not exist
    InitDb,
    /// Interactive menu
    Menu,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthArg {
    /// Client credentials (CLIENT_ID, CLIENT_SECRET, TENANT_ID)
    App,
    /// Device code sign-in (CLIENT_ID, AUTH_TENANT, GRAPH_USER_SCOPES)
    Device,
}

impl From<AuthArg> for AuthMode {
    fn from(value: AuthArg) -> Self {
        match value {
            AuthArg::App => AuthMode::AppOnly,
            AuthArg::Device => AuthMode::DeviceCode,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}
