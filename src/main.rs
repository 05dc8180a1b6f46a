//! rbsync - sync runbook files with a runbook automation service.
//!
//! Exports runbooks from the service into a directory and imports local
//! edits back, creating or patching runbooks as needed.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rbsync::core::{Config, RemoteConfig, RemoteOverrides};
use rbsync::integrations::rba::format_create_report;
use rbsync::runbook::{export_runbooks, import_runbooks, ExportOptions, ImportOptions};
use rbsync::RbaClient;

/// Sync a directory of runbook files with a runbook automation service
#[derive(Parser)]
#[command(name = "rbsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Host and port of the RBA API
    #[arg(long, global = true, env = "NOI_HOST")]
    host: Option<String>,

    /// API key user
    #[arg(long, global = true, env = "NOI_API_KEY_USER")]
    user: Option<String>,

    /// API key password
    #[arg(long, global = true, env = "NOI_API_KEY_PW", hide_env_values = true)]
    password: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the runbooks into a directory
    Export {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,

        /// Write step descriptions to separate HTML files
        #[arg(long = "splithtml", alias = "split-html")]
        split_html: bool,
    },

    /// Import the runbooks from a directory
    Import {
        /// Source directory (defaults to current directory)
        path: Option<PathBuf>,

        /// Publish created and patched runbooks
        #[arg(long)]
        publish: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    // Pick up NOI_* variables from a local .env before clap reads the environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    let overrides = RemoteOverrides { host: cli.host, user: cli.user, password: cli.password };

    match cli.command {
        Commands::Export { path, split_html } => {
            let remote = resolve_remote(overrides)?;
            let dir = resolve_dir(path.as_deref())?;
            cmd_export(&remote, &dir, split_html)?;
        }
        Commands::Import { path, publish } => {
            let remote = resolve_remote(overrides)?;
            let dir = resolve_dir(path.as_deref())?;
            cmd_import(&remote, &dir, publish)?;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

/// Resolve connection settings from flags, environment and config file.
fn resolve_remote(overrides: RemoteOverrides) -> Result<RemoteConfig> {
    let config = Config::load()?;
    Ok(config.remote(overrides)?)
}

/// Resolve the runbook directory, which must already exist.
fn resolve_dir(path: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let dir = path.map_or_else(|| cwd.clone(), |p| cwd.join(p));

    if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }
    Ok(dir)
}

/// Export runbooks from the service.
fn cmd_export(remote: &RemoteConfig, dir: &Path, split_html: bool) -> Result<()> {
    let client = RbaClient::new(remote)?;

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;

    let summary = rt.block_on(export_runbooks(&client, dir, ExportOptions { split_html }))?;

    for filename in &summary.written {
        println!("Wrote {filename}");
    }
    if split_html {
        println!("{} step file(s) written", summary.step_files);
    }
    println!("Export operation completed");
    Ok(())
}

/// Import runbooks into the service.
fn cmd_import(remote: &RemoteConfig, dir: &Path, publish: bool) -> Result<()> {
    let client = RbaClient::new(remote)?;

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;

    let summary = rt.block_on(import_runbooks(&client, dir, ImportOptions { publish }))?;

    if let Some(ref report) = summary.create_report {
        println!("{}", format_create_report(report));
    }
    println!("{} runbook(s) created", summary.created);
    println!("{} runbook(s) patched", summary.patched);
    if !summary.failed.is_empty() {
        eprintln!("{} patch(es) failed: {}", summary.failed.len(), summary.failed.join(", "));
    }
    println!("{} runbook(s) unchanged", summary.unchanged);
    println!("Import operation completed");
    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "rbsync", &mut io::stdout());
}
