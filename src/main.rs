//! Multisig gate CLI application
//!
//! A command-line interface for an M-of-N authorization gate.

use clap::{Args, Parser, Subcommand};
use multisig_gate::cli::{self, AppState};
use multisig_gate::config::GateConfig;
use multisig_gate::gate::{Principal, TxId};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisig-gate")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "An M-of-N multi-party authorization gate", long_about = None)]
struct Cli {
    /// Data directory for gate storage
    #[arg(short, long, default_value = ".gate_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Who is acting
#[derive(Args)]
struct Caller {
    /// Act as this principal
    #[arg(long = "as", value_name = "PRINCIPAL", conflicts_with = "key")]
    principal: Option<String>,

    /// Act as the owner holding this hex private key
    #[arg(long, value_name = "HEX")]
    key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new gate
    Init {
        /// Owner principal (repeat for each owner)
        #[arg(short, long = "owner", required_unless_present = "config")]
        owners: Vec<String>,

        /// Approvals required before execution
        #[arg(short, long, required_unless_present = "config")]
        threshold: Option<usize>,

        /// Optional label for the gate
        #[arg(short, long)]
        label: Option<String>,

        /// Read owners and threshold from a JSON file instead
        #[arg(short, long, conflicts_with_all = ["owners", "threshold"])]
        config: Option<PathBuf>,

        /// Overwrite an existing gate
        #[arg(long)]
        force: bool,
    },

    /// Generate a new owner key
    Keygen,

    /// Deposit value into the gate's vault
    Deposit {
        /// Depositor
        #[arg(short, long)]
        from: String,

        /// Amount to deposit
        #[arg(short, long)]
        amount: u64,
    },

    /// Propose a transaction
    Submit {
        #[command(flatten)]
        caller: Caller,

        /// Recipient
        #[arg(long)]
        to: String,

        /// Amount to send
        #[arg(short, long)]
        amount: u64,

        /// Hex call data delivered with the transfer
        #[arg(short, long)]
        payload: Option<String>,
    },

    /// Approve a transaction
    Approve {
        #[command(flatten)]
        caller: Caller,

        /// Transaction id
        #[arg(short, long)]
        id: TxId,
    },

    /// Execute a transaction that reached quorum
    Execute {
        #[command(flatten)]
        caller: Caller,

        /// Transaction id
        #[arg(short, long)]
        id: TxId,
    },

    /// Show one transaction
    Show {
        /// Transaction id
        #[arg(short, long)]
        id: TxId,
    },

    /// List transactions
    List {
        /// Only transactions not yet executed
        #[arg(long)]
        pending: bool,
    },

    /// Show owners and threshold
    Owners,

    /// Show vault balance
    Balance,

    /// Print the audit journal
    Events {
        /// Only events for this transaction
        #[arg(short, long)]
        id: Option<TxId>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need a loaded gate
    match &cli.command {
        Commands::Init {
            owners,
            threshold,
            label,
            config,
            force,
        } => {
            let config = match config {
                Some(path) => GateConfig::load(path)?,
                None => GateConfig::new(owners.clone(), threshold.unwrap_or(0), label.clone()),
            };
            return cli::cmd_init(&cli.data_dir, &config, *force);
        }
        Commands::Keygen => return cli::cmd_keygen(),
        Commands::Events { id } => return cli::cmd_events(&cli.data_dir, *id),
        _ => {}
    }

    let mut state = AppState::load(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. } | Commands::Keygen | Commands::Events { .. } => unreachable!(),

        Commands::Deposit { from, amount } => {
            let from = Principal::parse(&from)?;
            cli::cmd_deposit(&mut state, &from, amount)?;
        }

        Commands::Submit {
            caller,
            to,
            amount,
            payload,
        } => {
            let caller = resolve(&caller)?;
            cli::cmd_submit(&mut state, &caller, &to, amount, payload.as_deref())?;
        }

        Commands::Approve { caller, id } => {
            let caller = resolve(&caller)?;
            cli::cmd_approve(&mut state, &caller, id)?;
        }

        Commands::Execute { caller, id } => {
            let caller = resolve(&caller)?;
            cli::cmd_execute(&mut state, &caller, id)?;
        }

        Commands::Show { id } => cli::cmd_show(&state, id)?,
        Commands::List { pending } => cli::cmd_list(&state, pending)?,
        Commands::Owners => cli::cmd_owners(&state)?,
        Commands::Balance => cli::cmd_balance(&state)?,
    }

    Ok(())
}

fn resolve(caller: &Caller) -> cli::CliResult<Principal> {
    cli::resolve_caller(caller.principal.as_deref(), caller.key.as_deref())
}
