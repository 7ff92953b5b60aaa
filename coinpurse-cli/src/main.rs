//! Coinpurse CLI - every linked bank account in one transaction list

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{institutions, summary, transactions, ConnectionArgs};
use output::OutputFormat;

/// Coinpurse - every linked bank account in one transaction list
#[derive(Parser)]
#[command(name = "coinpurse", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Log progress to stderr (overridden by COINPURSE_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve access tokens and list the linked institutions
    Institutions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List transactions from every institution, oldest first
    Transactions {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        since: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Output as JSON (shorthand for --format json)
        #[arg(long, conflicts_with = "format")]
        json: bool,
        /// Fetch institutions in parallel
        #[arg(long)]
        concurrent: bool,
    },

    /// Per-institution transaction counts and totals
    Summary {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        since: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    commands::init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let connection = cli.connection;
    match cli.command {
        Commands::Institutions { json } => institutions::run(&connection, json),
        Commands::Transactions { since, format, json, concurrent } => {
            let fmt = if json { OutputFormat::Json } else { format };
            transactions::run(&connection, &since, fmt, concurrent)
        }
        Commands::Summary { since, json } => summary::run(&connection, &since, json),
    }
}
