//! # mimir-sync CLI
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mimir-sync tickets fetch` | Fetch incidents from the helpdesk and print them |
//! | `mimir-sync tickets upload` | Fetch incidents and insert them as ticket objects |
//! | `mimir-sync tickets list` | List ticket objects in the vector store |
//! | `mimir-sync accelerators store` | Enrich accelerators from a JSON file and store them |
//! | `mimir-sync accelerators assign-ids` | Give every stored accelerator a random UUID |
//! | `mimir-sync accelerators get <id>` | Show one stored accelerator |
//! | `mimir-sync accelerators delete <id>` | Delete one stored accelerator |
//! | `mimir-sync check` | Show which credentials are set and the resolved config |
//!
//! ## Examples
//!
//! ```bash
//! # Generate descriptions and store accelerators
//! mimir-sync accelerators store --file ./accelerators.json
//!
//! # Copy the latest 10 incidents into the Ticket class
//! mimir-sync tickets upload --config ./config/mimir.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use mimir_sync::config::{self, Config};
use mimir_sync::credentials::Credentials;
use mimir_sync::logging::{init_logging, LogFormat};
use mimir_sync::{accelerators, status, tickets};

#[derive(Parser)]
#[command(
    name = "mimir-sync",
    about = "Sync helpdesk tickets and enriched accelerators into a vector database",
    version
)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dotenv file loaded before reading credentials (ignored if missing).
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format; overrides `[logging].format`.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Helpdesk ticket operations.
    Tickets {
        #[command(subcommand)]
        action: TicketAction,
    },

    /// Accelerator operations.
    Accelerators {
        #[command(subcommand)]
        action: AcceleratorAction,
    },

    /// Show credential status and the resolved configuration.
    Check,
}

#[derive(Subcommand)]
enum TicketAction {
    /// Fetch incidents and print them as JSON. Nothing is written.
    Fetch,

    /// Fetch incidents and insert one ticket object per incident.
    ///
    /// Ensures the ticket class exists first. If the helpdesk request fails,
    /// no write of any kind is attempted.
    Upload,

    /// List ticket objects stored in the vector store.
    List,
}

#[derive(Subcommand)]
enum AcceleratorAction {
    /// Generate descriptions for accelerators in a JSON file and store them.
    ///
    /// Entries missing `name` or `url` are skipped. A fixed delay follows
    /// each processed entry.
    Store {
        /// JSON file with a top-level `accelerators` array.
        #[arg(long, default_value = "accelerators.json")]
        file: PathBuf,
    },

    /// Add the identifier property and assign a random UUID to every object.
    ///
    /// By default existing identifiers are overwritten on every run.
    AssignIds {
        /// Leave objects that already have a non-empty identifier untouched.
        #[arg(long)]
        skip_existing: bool,
    },

    /// Show one stored accelerator by its vector store id.
    Get {
        id: String,
    },

    /// Delete one stored accelerator by its vector store id.
    Delete {
        id: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.env_file.exists() {
        dotenvy::from_path(&cli.env_file).ok();
    }

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => {
            let cfg = Config::default();
            config::validate(&cfg)?;
            cfg
        }
    };

    init_logging(&cfg.logging, cli.verbose, cli.log_format);
    let credentials = Credentials::from_env();

    match cli.command {
        Commands::Tickets { action } => match action {
            TicketAction::Fetch => tickets::run_fetch_tickets(&cfg, &credentials).await?,
            TicketAction::Upload => tickets::run_upload_tickets(&cfg, &credentials).await?,
            TicketAction::List => tickets::run_list_tickets(&cfg, &credentials).await?,
        },
        Commands::Accelerators { action } => match action {
            AcceleratorAction::Store { file } => {
                accelerators::run_store_accelerators(&cfg, &credentials, &file).await?;
            }
            AcceleratorAction::AssignIds { skip_existing } => {
                accelerators::run_assign_ids(&cfg, &credentials, skip_existing).await?;
            }
            AcceleratorAction::Get { id } => {
                accelerators::run_get_accelerator(&cfg, &credentials, &id).await?;
            }
            AcceleratorAction::Delete { id } => {
                accelerators::run_delete_accelerator(&cfg, &credentials, &id).await?;
            }
        },
        Commands::Check => status::run_check(&cfg, &credentials)?,
    }

    Ok(())
}
