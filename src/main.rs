// Copyright 2026 Dropwatch Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use dropwatch::cli;

#[derive(Parser)]
#[command(
    name = "dropwatch",
    about = "Dropwatch — watches future lunch-calendar dates and alerts when they unlock",
    version,
    after_help = "Run 'dropwatch <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the upcoming date window and notify on changes
    Check {
        /// Report every date instead of diffing against stored state
        #[arg(long)]
        summary: bool,
        /// Send a heartbeat message even when nothing changed
        #[arg(long)]
        heartbeat: bool,
    },
    /// Visit a single date page, save diagnostics, and report what was seen
    Probe {
        /// Day offset from today (0 = today, 1 = tomorrow)
        #[arg(long, default_value = "0")]
        offset: i64,
    },
    /// Inspect or clear persisted per-date state
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// List persisted records
    List,
    /// Remove persisted records (all, or one date)
    Clear {
        /// Only clear the record for this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("DROPWATCH_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("DROPWATCH_QUIET", "1");
    }

    let default_level = if cli.verbose { "dropwatch=debug" } else { "dropwatch=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check { summary, heartbeat } => cli::check_cmd::run(summary, heartbeat).await,
        Commands::Probe { offset } => cli::probe_cmd::run(offset).await,
        Commands::State { action } => match action {
            StateAction::List => cli::state_cmd::run_list(),
            StateAction::Clear { date } => cli::state_cmd::run_clear(date),
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "dropwatch", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli::output::is_quiet() && !cli::output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
