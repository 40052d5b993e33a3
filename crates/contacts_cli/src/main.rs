//! Contacts CLI
//!
//! Command-line tool for the contacts sync service.
//!
//! # Commands
//!
//! - `init` - Create a database directory
//! - `inspect` - Display contact counts and metadata
//! - `create` / `update` / `trash` - Mutate a user's contacts
//! - `list` - Print a user's live contacts
//! - `delta` - Print what changed since a cursor
//!
//! Results are printed to stdout in the service's JSON wire shapes. Errors
//! are printed to stderr as an error body and the process exits non-zero.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use commands::Context;
use contacts_core::{HistoryId, StorageConfig};
use contacts_sync_protocol::{DeltaRequest, WireMessage};
use error::CliResult;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Contacts service command-line tool.
#[derive(Parser)]
#[command(name = "contacts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Time limit for each transaction, in milliseconds
    #[arg(global = true, long)]
    timeout_ms: Option<u64>,

    /// Commit with full fsync instead of WAL-normal durability
    #[arg(global = true, long)]
    full_sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database directory
    Init,

    /// Display contact counts and metadata
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Create a contact
    Create {
        /// Owning user id
        #[arg(short, long)]
        user: i64,

        /// Email address
        #[arg(long)]
        email: Option<String>,

        /// First name
        #[arg(long)]
        first_name: Option<String>,

        /// Last name
        #[arg(long)]
        last_name: Option<String>,

        /// JSON request body; replaces the attribute flags
        #[arg(long, conflicts_with_all = ["email", "first_name", "last_name"])]
        body: Option<String>,
    },

    /// List a user's live contacts, newest first
    List {
        /// Owning user id
        #[arg(short, long)]
        user: i64,
    },

    /// Show what changed since a cursor
    Delta {
        /// Owning user id
        #[arg(short, long)]
        user: i64,

        /// Last history id seen; 0 for everything
        #[arg(short, long, default_value = "0")]
        cursor: u64,
    },

    /// Replace a contact's attributes
    Update {
        /// Owning user id
        #[arg(short, long)]
        user: i64,

        /// Contact uuid
        #[arg(long, required_unless_present = "body")]
        uuid: Option<String>,

        /// Email address
        #[arg(long)]
        email: Option<String>,

        /// First name
        #[arg(long)]
        first_name: Option<String>,

        /// Last name
        #[arg(long)]
        last_name: Option<String>,

        /// JSON request body; replaces the other flags
        #[arg(long, conflicts_with_all = ["uuid", "email", "first_name", "last_name"])]
        body: Option<String>,
    },

    /// Trash contacts by uuid
    Trash {
        /// Owning user id
        #[arg(short, long)]
        user: i64,

        /// Contact uuids
        #[arg(required_unless_present = "body")]
        uuids: Vec<String>,

        /// JSON array of uuids; replaces the positional list
        #[arg(long, conflicts_with = "uuids")]
        body: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --verbose. Logs go to stderr so stdout
    // stays machine-readable.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            let body = err
                .response()
                .encode()
                .unwrap_or_else(|_| err.to_string());
            eprintln!("{body}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let ctx = Context {
        path: cli.path,
        config: storage_config(cli.timeout_ms, cli.full_sync),
    };

    match cli.command {
        Commands::Init => commands::print_json(&commands::init::run(&ctx)?),
        Commands::Inspect { format } => {
            let result = commands::inspect::run(&ctx)?;
            match format.as_str() {
                "json" => commands::print_json(&result),
                _ => {
                    commands::inspect::print_text(&result);
                    Ok(())
                }
            }
        }
        Commands::Create {
            user,
            email,
            first_name,
            last_name,
            body,
        } => {
            let request = commands::create::request(body.as_deref(), email, first_name, last_name)?;
            commands::print_json(&commands::create::run(&ctx, user, &request)?)
        }
        Commands::List { user } => commands::print_json(&commands::list::run(&ctx, user)?),
        Commands::Delta { user, cursor } => {
            let request = DeltaRequest::new(HistoryId::new(cursor));
            commands::print_json(&commands::delta::run(&ctx, user, request)?)
        }
        Commands::Update {
            user,
            uuid,
            email,
            first_name,
            last_name,
            body,
        } => {
            let request =
                commands::update::request(body.as_deref(), uuid, email, first_name, last_name)?;
            commands::print_json(&commands::update::run(&ctx, user, &request)?)
        }
        Commands::Trash { user, uuids, body } => {
            let request = commands::trash::request(body.as_deref(), uuids)?;
            commands::print_json(&commands::trash::run(&ctx, user, &request)?)
        }
        Commands::Version => {
            println!("Contacts CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Contacts Core v{}", contacts_core::VERSION);
            Ok(())
        }
    }
}

fn storage_config(timeout_ms: Option<u64>, full_sync: bool) -> StorageConfig {
    let mut config = StorageConfig::new();
    if let Some(ms) = timeout_ms {
        let limit = Duration::from_millis(ms);
        config = config.write_timeout(limit).read_timeout(limit);
    }
    if full_sync {
        config = config.synchronous(contacts_core::Synchronous::Full);
    }
    config
}
