//! Petstore Admin - command-line front end for petstore-core.
//!
//! Every invocation restores the persisted session, runs one command, and
//! exits. Log output goes to stderr so stdout stays scriptable.

mod commands;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use petstore_core::{FileStore, PetStatus, PetstoreApi, SessionManager, Settings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

/// Environment variable holding the login password, so it stays out of shell history.
const PASSWORD_VAR: &str = "PETSTORE_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "petstore-admin")]
#[command(about = "Administer pets in a Petstore catalog")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// State file (defaults to the platform config directory)
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the session
    Login {
        username: String,
        /// Prompted for on stdin when not set
        #[arg(long, env = PASSWORD_VAR, hide_env_values = true)]
        password: Option<String>,
    },

    /// Create a remote account, then log in with it
    Signup {
        username: String,
        /// Prompted for on stdin when not set
        #[arg(long, env = PASSWORD_VAR, hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        phone: String,
    },

    /// Forget the current session
    Logout,

    /// Show who is logged in
    Whoami,

    /// List pets for a status, filtered by name
    List {
        /// Status filter; remembered for the next run
        #[arg(short, long)]
        status: Option<PetStatus>,

        /// Case-insensitive name search
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one pet
    Show { id: i64 },

    /// Edit a pet; unspecified fields keep their current value
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Replace the photo URLs (repeatable)
        #[arg(long = "photo-url")]
        photo_urls: Vec<String>,
        /// Comma-separated tag names
        #[arg(long)]
        tags: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let settings = Settings::from_env()?;
    debug!("Using API base URL {}", settings.base_url);

    let store = match &args.state_file {
        Some(path) => FileStore::open(path)?,
        None => FileStore::open_default()?,
    };
    debug!("State file: {}", store.path().display());
    let store = Arc::new(store);

    let api = PetstoreApi::from_settings(&settings)?;
    let session = SessionManager::new(settings.fixed_credentials.clone(), api, store.clone());

    commands::run(args.command, session, store).await
}
