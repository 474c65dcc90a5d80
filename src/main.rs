//! Multisig wallet CLI
//!
//! Deploys M-of-N wallets and drives batch transfers through them against an
//! in-process token environment.

use clap::{Parser, Subcommand};
use multisig_wallet::cli::{self, BatchOptions};
use multisig_wallet::executor::{DEFAULT_BATCH_GAS_LIMIT, DEFAULT_GAS_LIMIT_PER_CALL};

#[derive(Parser)]
#[command(name = "multisig")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "M-of-N multisig wallet with atomic batch execution", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a wallet for freshly generated owners
    Deploy {
        /// Number of owners
        #[arg(short, long, default_value = "3")]
        owners: usize,

        /// Confirmations required to execute
        #[arg(short, long, default_value = "2")]
        threshold: usize,
    },

    /// Submit, confirm and execute a batch of token transfers
    Batch {
        /// Number of owners
        #[arg(short, long, default_value = "3")]
        owners: usize,

        /// Confirmations required to execute
        #[arg(short, long, default_value = "2")]
        threshold: usize,

        /// Number of recipients in the batch
        #[arg(short, long, default_value = "200")]
        recipients: usize,

        /// Whole tokens sent to each recipient
        #[arg(short, long, default_value = "10")]
        amount: u128,

        /// Leave this many transfers unfunded
        #[arg(long, default_value = "0")]
        underfund: usize,

        /// Execute from the final confirmation
        #[arg(long)]
        immediate: bool,

        /// Gas limit for each call
        #[arg(long, default_value_t = DEFAULT_GAS_LIMIT_PER_CALL)]
        gas_per_call: u64,

        /// Gas limit for the whole batch
        #[arg(long, default_value_t = DEFAULT_BATCH_GAS_LIMIT)]
        batch_gas: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy { owners, threshold } => {
            cli::cmd_deploy(owners, threshold)?;
        }

        Commands::Batch {
            owners,
            threshold,
            recipients,
            amount,
            underfund,
            immediate,
            gas_per_call,
            batch_gas,
        } => {
            let options = BatchOptions {
                owners,
                threshold,
                recipients,
                amount,
                underfund,
                immediate,
                gas_per_call,
                batch_gas,
            };
            let report = cli::cmd_batch(&options)?;
            if !report.executed {
                return Err(format!("tx {} was not executed", report.index).into());
            }
        }
    }

    Ok(())
}
