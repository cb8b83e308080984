//! docs-assistant - chat-style document assistant client
//!
//! Talks to a document assistant backend, or to an in-process mock of it
//! with simulated latency and failures.

mod api;
mod commands;
mod config;
mod format;
mod models;
mod store;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use store::AppStore;

#[derive(Parser)]
#[command(name = "docs-assistant")]
#[command(about = "Chat with your documents from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the in-process mock backend
    #[arg(long, global = true, conflicts_with = "real")]
    mock: bool,

    /// Use the HTTP backend at the configured base URL
    #[arg(long, global = true)]
    real: bool,

    /// Seed for the mock data set (reproducible ids and contents)
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a bearer token for the HTTP backend
    Login {
        /// Access token
        #[arg(short, long)]
        token: String,

        /// Token lifetime in seconds
        #[arg(long)]
        expires_in: Option<u64>,
    },

    /// Clear the stored token
    Logout,

    /// Show backend selection and credential state
    Status,

    /// Show the current user
    Whoami,

    /// List chats, most recently updated first
    Chats {
        /// Case-insensitive match on title or last message
        #[arg(short, long)]
        search: Option<String>,

        /// Page size
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Cursor from a previous listing
        #[arg(long)]
        cursor: Option<String>,

        /// Follow cursors until the last page
        #[arg(long)]
        all: bool,
    },

    /// Start a new chat
    NewChat {
        /// Chat title (defaults to "New conversation")
        title: Option<String>,
    },

    /// Read messages from a chat
    Read {
        /// Chat ID (from `chats` output)
        chat_id: String,
    },

    /// Send a message and print the assistant's reply
    Send {
        /// Chat ID (from `chats` output)
        #[arg(short, long)]
        to: String,

        /// Message content
        message: String,
    },

    /// List folders
    Folders,

    /// List files in a folder
    Files {
        /// Folder ID (from `folders` output)
        folder_id: String,
    },

    /// Upload a file to a folder
    Upload {
        /// Folder ID (from `folders` output)
        folder_id: String,

        /// File to upload
        path: PathBuf,

        /// MIME type (guessed from the extension if omitted)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Delete a file
    Delete {
        /// File ID (from `files` output)
        file_id: String,
    },

    /// Download a file
    Download {
        /// File ID (from `files` output)
        file_id: String,

        /// Output path (defaults to the file ID)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Run a short scripted session against the selected backend
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = Config::load()?;
    if cli.mock {
        config.use_mock_api = true;
    }
    if cli.real {
        config.use_mock_api = false;
    }
    if cli.seed.is_some() {
        config.mock_seed = cli.seed;
    }

    match &cli.command {
        Commands::Login { token, expires_in } => {
            config.set_auth_token(token.clone(), *expires_in);
            config.save()?;
            tracing::info!("Token saved");
            return Ok(());
        }
        Commands::Logout => {
            config.clear_auth_token();
            config.save()?;
            tracing::info!("Logged out");
            return Ok(());
        }
        Commands::Status => return commands::status(&config),
        _ => {}
    }

    let store = AppStore::new(api::connect(&config)?);

    match cli.command {
        Commands::Whoami => commands::whoami(&store).await?,
        Commands::Chats {
            search,
            limit,
            cursor,
            all,
        } => commands::list_chats(&store, search, limit, cursor, all).await?,
        Commands::NewChat { title } => commands::new_chat(&store, title.as_deref()).await?,
        Commands::Read { chat_id } => commands::read_messages(&store, &chat_id).await?,
        Commands::Send { to, message } => {
            tracing::info!("Sending message...");
            commands::send_message(&store, &to, &message).await?;
        }
        Commands::Folders => commands::list_folders(&store).await?,
        Commands::Files { folder_id } => commands::list_files(&store, &folder_id).await?,
        Commands::Upload {
            folder_id,
            path,
            mime,
        } => commands::upload(&store, &folder_id, &path, mime).await?,
        Commands::Delete { file_id } => commands::delete(&store, &file_id).await?,
        Commands::Download { file_id, out } => {
            commands::download(&store, &file_id, out).await?
        }
        Commands::Demo => {
            commands::demo(&store).await?;
            store.auth.logout();
        }
        Commands::Login { .. } | Commands::Logout | Commands::Status => {}
    }

    Ok(())
}
