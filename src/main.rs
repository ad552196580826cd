use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docket::config::{DocketConfig, LogFormat};
use docket::model::EntityKind;
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "docket")]
#[command(version, about = "Keep a list page's selection in step with its navigation state")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to docket.toml. Defaults to ./docket.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format: text or json. Overrides docket.toml.
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by commands that read a fixture collection.
#[derive(clap::Args, Clone, Debug)]
pub struct CollectionArgs {
    /// JSON file holding an array of entities
    #[arg(long)]
    pub fixture: PathBuf,

    /// Entity kind to list: chat, lead, invoice
    #[arg(long, default_value = "chat")]
    pub kind: EntityKind,

    /// Only entities with this status
    #[arg(long)]
    pub status: Option<String>,

    /// Only entities with this topic
    #[arg(long)]
    pub topic: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the collection, page by page
    List {
        #[command(flatten)]
        collection: CollectionArgs,

        /// Only entities for this counterpart
        #[arg(long)]
        counterpart: Option<String>,

        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: usize,

        /// Load every page
        #[arg(long)]
        all: bool,

        /// Page size. Overrides DOCKET_PAGE_SIZE and docket.toml.
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Resolve a navigation query against the collection
    Resolve {
        #[command(flatten)]
        collection: CollectionArgs,

        /// Navigation query, e.g. "?recipientId=C&topic=42" or "id=3"
        #[arg(long, default_value = "")]
        query: String,

        /// Write created entities back to the fixture file
        #[arg(long)]
        save: bool,

        /// Seconds to wait for the selection to settle
        #[arg(long, default_value = "5")]
        timeout: u64,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any problems
    Validate,
    /// Initialize a default docket.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let work_dir = std::env::current_dir().context("Failed to get current directory")?;

    let page_size = match &cli.command {
        Commands::List { page_size, .. } => *page_size,
        _ => None,
    };
    let config = DocketConfig::load(cli.config.as_deref(), &work_dir)?
        .with_env(|key| std::env::var(key).ok())?
        .with_cli_args(cli.verbose, cli.log_format, page_size);
    docket::logging::init(&config.log_level(), config.log_format())?;

    match &cli.command {
        Commands::List {
            collection,
            counterpart,
            pages,
            all,
            ..
        } => {
            cmd::cmd_list(&config, collection, counterpart.as_deref(), *pages, *all).await?;
        }
        Commands::Resolve {
            collection,
            query,
            save,
            timeout,
        } => {
            cmd::cmd_resolve(&config, collection, query, *save, *timeout).await?;
        }
        Commands::Config { command } => {
            cmd::cmd_config(&work_dir, &config, command.clone())?;
        }
    }

    Ok(())
}
