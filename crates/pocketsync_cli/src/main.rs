//! PocketSync CLI
//!
//! Command-line client for a local PocketSync budget database.
//!
//! # Commands
//!
//! - `sync` - Push pending changes and pull the server's data
//! - `tx` - Add, list and remove transactions
//! - `cat` - Add, list and remove categories
//! - `status` - Show how many rows wait for the server

mod commands;

use clap::{Parser, Subcommand};
use commands::Format;
use pocketsync_model::{EntryType, MonthFilter};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Offline-first budget tracking from the command line.
#[derive(Parser)]
#[command(name = "pocketsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local database file
    #[arg(global = true, short, long, default_value = "pocketsync.db")]
    db: PathBuf,

    /// Base URL of the budget API
    #[arg(global = true, short, long, env = "POCKETSYNC_SERVER")]
    server: Option<String>,

    /// JSON configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Never contact the server; writes are kept for the next sync
    #[arg(global = true, long)]
    offline: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Push pending changes and pull the server's data
    Sync {
        /// Only pull transactions of this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<MonthFilter>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },

    /// Manage transactions
    #[command(subcommand)]
    Tx(TxCommand),

    /// Manage categories
    #[command(subcommand)]
    Cat(CatCommand),

    /// Show row counts per sync state
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum TxCommand {
    /// Record a transaction
    Add {
        /// Amount, e.g. 12.50
        amount: Decimal,

        /// INCOME, EXPENSE or SAVINGS
        #[arg(long = "type", default_value = "EXPENSE")]
        entry_type: EntryType,

        /// Category id
        #[arg(long)]
        category: String,

        /// Date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        date: Option<String>,

        /// Free-text note
        #[arg(long)]
        description: Option<String>,
    },

    /// List transactions
    List {
        /// Only this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<MonthFilter>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },

    /// Delete transactions
    Rm {
        /// Transaction ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CatCommand {
    /// Create a category
    Add {
        /// Display name
        name: String,

        /// INCOME, EXPENSE or SAVINGS
        #[arg(long = "type", default_value = "EXPENSE")]
        entry_type: EntryType,

        /// Colour as an ARGB integer
        #[arg(long)]
        color: Option<i64>,

        /// Icon name
        #[arg(long)]
        icon: Option<String>,
    },

    /// List categories
    List {
        /// Include inactive categories
        #[arg(short, long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },

    /// Delete categories
    Rm {
        /// Category ids
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays parseable
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("PocketSync CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let engine = commands::open_engine(&commands::Options {
        db: cli.db,
        server: cli.server,
        config: cli.config,
        offline: cli.offline,
    })?;

    match cli.command {
        Commands::Sync { month, format } => commands::sync::run(&engine, month, format).await?,
        Commands::Tx(TxCommand::Add {
            amount,
            entry_type,
            category,
            date,
            description,
        }) => {
            let draft = commands::transactions::Draft {
                amount,
                entry_type,
                category,
                date,
                description,
            };
            commands::transactions::add(&engine, draft).await?;
        }
        Commands::Tx(TxCommand::List { month, format }) => {
            commands::transactions::list(&engine, month, format)?;
        }
        Commands::Tx(TxCommand::Rm { ids }) => commands::transactions::remove(&engine, &ids).await?,
        Commands::Cat(CatCommand::Add {
            name,
            entry_type,
            color,
            icon,
        }) => {
            commands::categories::add(&engine, name, entry_type, color, icon).await?;
        }
        Commands::Cat(CatCommand::List { all, format }) => {
            commands::categories::list(&engine, all, format)?;
        }
        Commands::Cat(CatCommand::Rm { ids }) => commands::categories::remove(&engine, &ids).await?,
        Commands::Status { format } => commands::status::run(&engine, format)?,
        Commands::Version => {}
    }

    Ok(())
}
