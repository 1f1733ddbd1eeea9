mod alias;
mod audit;
mod commands;
mod config;
mod diagnostics;
mod error;
mod index;
mod info;
mod repair;
mod report;
mod resolver;
mod scanner;
mod strategy;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

/// Exit code for configuration and runtime errors.
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "doclink", version, about = "Link-integrity audit and repair for markdown")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Root of the documentation tree
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum AliasCommands {
    /// Record that links to <FROM> now belong at <TO>
    Add {
        /// Old root-relative target
        from: String,
        /// Current root-relative target
        to: String,
    },
    /// List configured aliases
    List,
    /// Remove an alias
    Remove {
        /// Old root-relative target
        from: String,
    },
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the alias table used by the repair engine
    Alias {
        #[command(subcommand)]
        command: AliasCommands,
    },
    /// Audit links and write the audit reports
    Audit,
    /// Audit links without writing anything (exit 0 clean, 1 broken, 2 unreadable)
    Check {
        /// Print the full audit report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Repair broken links in place
    Fix {
        /// Use the persisted audit report instead of auditing first
        #[arg(long)]
        from_report: bool,
    },
    /// Print a reference card and the current state
    Info {
        /// Emit JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let root = cli.root;
    let result = match cli.command {
        Commands::Alias { command } => run_alias(&root, command),
        Commands::Audit => commands::audit(&root),
        Commands::Check { json } => commands::check(&root, json),
        Commands::Fix { from_report } => commands::fix(&root, from_report),
        Commands::Info { json } => {
            info::run(&root, json);
            Ok(ExitCode::SUCCESS)
        },
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(EXIT_ERROR)
        },
    };
}

/// Dispatch an alias subcommand.
///
/// # Errors
///
/// Returns errors from config reading or editing.
fn run_alias(root: &std::path::Path, command: AliasCommands) -> Result<ExitCode, error::Error> {
    match command {
        AliasCommands::Add { from, to } => alias::cmd_add(root, &from, &to)?,
        AliasCommands::List => alias::cmd_list(root)?,
        AliasCommands::Remove { from } => alias::cmd_remove(root, &from)?,
    }
    return Ok(ExitCode::SUCCESS);
}

/// Install a stderr subscriber. `-v` raises the level; `RUST_LOG` adds directives.
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}
