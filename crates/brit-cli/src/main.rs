//! # brit CLI entry point
//!
//! Parses arguments, installs the tracing subscriber, loads the config, and
//! dispatches to the handlers in [`brit_cli::commands`].

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use brit_cli::commands::{
    run_action, run_check, run_list, run_policy, run_repair, ActionArgs, CheckArgs, ListArgs,
    PolicyArgs, RepairArgs,
};
use brit_cli::config::BritConfig;
use brit_policy::WorkflowAction;

/// BRIT object publication and review tool.
#[derive(Parser, Debug)]
#[command(name = "brit", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the YAML configuration (default: ./brit.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List records with their publication status.
    List(ListArgs),
    /// Print the policy flags of a user on a record as JSON.
    Policy(PolicyArgs),
    /// Run the prepublish check on a record.
    Check(CheckArgs),
    /// Submit a record for review (private/declined -> review).
    Submit(ActionArgs),
    /// Withdraw a record from review (review/declined -> private).
    Withdraw(ActionArgs),
    /// Approve a record under review (review -> published).
    Approve(ActionArgs),
    /// Reject a record under review (review -> declined).
    Reject(ActionArgs),
    /// Archive a published record (published -> archived).
    Archive(ActionArgs),
    /// Repair review stamps that drifted from their status.
    Repair(RepairArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match BritConfig::load(cli.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let result = match &cli.command {
        Commands::List(args) => run_list(args, &config),
        Commands::Policy(args) => run_policy(args, &config),
        Commands::Check(args) => run_check(args, &config),
        Commands::Submit(args) => run_action(WorkflowAction::Submit, args, &config),
        Commands::Withdraw(args) => run_action(WorkflowAction::Withdraw, args, &config),
        Commands::Approve(args) => run_action(WorkflowAction::Approve, args, &config),
        Commands::Reject(args) => run_action(WorkflowAction::Reject, args, &config),
        Commands::Archive(args) => run_action(WorkflowAction::Archive, args, &config),
        Commands::Repair(args) => run_repair(args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
