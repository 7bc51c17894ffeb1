//! Development automation tasks for the `OutlookSync` workspace.
//!
//! Run with: `cargo xtask <command>`
//!
//! This is a CLI tool for developers, so `println!` and `eprintln!` are
//! intentionally used for user-facing output rather than structured logging.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fmt::Write as _;
use std::path::Path;
use std::process::{Command, ExitCode};
use std::{env, fs};

use anyhow::{anyhow, Context};

/// Variables read by `outlook-sync`, with a placeholder and a short note.
const ENV_VARS: &[(&str, &str, &str)] = &[
    ("CLIENT_ID", "00000000-0000-0000-0000-000000000000", "App registration id"),
    ("TENANT_ID", "00000000-0000-0000-0000-000000000000", "Tenant for --auth app"),
    ("CLIENT_SECRET", "", "Client secret for --auth app"),
    ("AUTH_TENANT", "common", "Tenant for --auth device (falls back to TENANT_ID)"),
    ("GRAPH_USER_SCOPES", "User.Read,Calendars.Read", "Comma-separated scopes for --auth device"),
    ("USER_ID", "someone@example.com", "Mailbox to synchronise (or pass --mailbox)"),
    ("OUTLOOKSYNC_STORE", "postgres", "postgres or sqlite"),
    ("A2DAM_HOST", "localhost", "Postgres host"),
    ("A2DAM_PORT", "5432", "Postgres port"),
    ("A2DAM_USER", "outlook_sync", "Postgres user"),
    ("A2DAM_PASSWORD", "", "Postgres password"),
    ("A2DAM_DBNAME", "a2dam", "Postgres database"),
    ("A2DAM_SSLMODE", "disable", "disable or require"),
    ("OUTLOOKSYNC_SQLITE_PATH", "outlook_events.db", "SQLite file when OUTLOOKSYNC_STORE=sqlite"),
];

fn main() -> ExitCode {
    let task = env::args().nth(1);

    let result = match task.as_deref() {
        Some("ci") => run_ci(),
        Some("fmt") => run_fmt(),
        Some("clippy") => run_clippy(),
        Some("test") => run_test(),
        Some("audit") => run_audit(),
        Some("env-template") => write_env_template(Path::new(".env.example")),
        Some("help") | None => {
            print_help();
            Ok(())
        }
        Some(unknown) => {
            eprintln!("Unknown task: {unknown}");
            eprintln!();
            print_help();
            Err(anyhow!("Unknown task"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Task failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("OutlookSync Development Tasks");
    println!();
    println!("USAGE:");
    println!("    cargo xtask <TASK>");
    println!();
    println!("TASKS:");
    println!("    ci            Run all CI checks (fmt, clippy, test)");
    println!("    fmt           Check Rust code formatting");
    println!("    clippy        Run Clippy lints");
    println!("    test          Run all tests");
    println!("    audit         Audit dependencies for security vulnerabilities");
    println!("    env-template  Write .env.example with every supported variable");
    println!("    help          Show this help message");
}

/// Run all CI checks in sequence
fn run_ci() -> anyhow::Result<()> {
    println!("==> Running CI checks...\n");

    println!("==> Step 1/3: Checking Rust format...");
    run_fmt()?;

    println!("\n==> Step 2/3: Running Clippy...");
    run_clippy()?;

    println!("\n==> Step 3/3: Running tests...");
    run_test()?;

    println!("\n✓ All CI checks passed!");
    Ok(())
}

/// Check Rust code formatting
fn run_fmt() -> anyhow::Result<()> {
    let status = Command::new("cargo").args(["fmt", "--all", "--", "--check"]).status()?;

    if !status.success() {
        anyhow::bail!("Format check failed. Run 'cargo fmt --all' to fix.");
    }

    Ok(())
}

/// Run Clippy lints
fn run_clippy() -> anyhow::Result<()> {
    let status = Command::new("cargo")
        .args(["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("Clippy run failed. See output above."))
    }
}

/// Run all workspace tests
fn run_test() -> anyhow::Result<()> {
    let status = Command::new("cargo").args(["test", "--workspace"]).status()?;

    if !status.success() {
        anyhow::bail!("Tests failed");
    }

    Ok(())
}

/// Audit dependencies for security vulnerabilities
fn run_audit() -> anyhow::Result<()> {
    let check_installed = Command::new("cargo").args(["audit", "--version"]).output();

    if check_installed.is_err() || !check_installed.as_ref().is_ok_and(|o| o.status.success()) {
        eprintln!("cargo-audit is not installed.");
        eprintln!("Install it with: cargo install cargo-audit");
        anyhow::bail!("cargo-audit not found");
    }

    let status = Command::new("cargo").args(["audit"]).status()?;

    if !status.success() {
        anyhow::bail!("cargo-audit found vulnerabilities");
    }

    Ok(())
}

/// Write a commented `.env` template; refuses to overwrite an existing file.
fn write_env_template(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists, remove it first", path.display());
    }

    let mut content = String::from(
        "# outlook-sync configuration\n\
         # Copy to .env (or .env.local, which takes precedence) and fill in.\n\n",
    );
    for (name, placeholder, note) in ENV_VARS {
        let _ = writeln!(content, "# {note}");
        let _ = writeln!(content, "{name}={placeholder}");
    }

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {} ({} variables)", path.display(), ENV_VARS.len());
    Ok(())
}
