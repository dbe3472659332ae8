//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dialer_core::RecordId;
use url::Url;

use crate::commands;

/// Operator console for outbound calling campaigns
#[derive(Parser, Debug)]
#[command(name = "dialer")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the backend base URL
    #[arg(long, global = true)]
    pub base_url: Option<Url>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct Credentials {
    #[arg(long, env = "DIALER_USERNAME")]
    pub username: String,

    #[arg(long, env = "DIALER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Which campaign and list to work on; the most urgent ones by default
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    #[arg(long)]
    pub campaign: Option<RecordId>,

    #[arg(long)]
    pub list: Option<RecordId>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a configuration file with default values
    InitConfig {
        /// Where to write it (defaults to the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// List the active campaigns and their lists
    Campaigns {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Show the call queue of a list
    Queue {
        #[command(flatten)]
        credentials: Credentials,

        #[command(flatten)]
        selection: Selection,
    },
    /// Call the current contact once
    Dial {
        #[command(flatten)]
        credentials: Credentials,

        #[command(flatten)]
        selection: Selection,

        /// Skip this many contacts before dialing
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },
    /// Dial the queue automatically until it is empty (Ctrl+C stops)
    Auto {
        #[command(flatten)]
        credentials: Credentials,

        #[command(flatten)]
        selection: Selection,

        /// Delay between calls in milliseconds
        #[arg(long)]
        pacing_ms: Option<u64>,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = commands::GlobalOptions {
        config: cli.config,
        base_url: cli.base_url,
    };

    match cli.command {
        Commands::InitConfig { path, force } => commands::init_config::execute(path, force),
        Commands::Campaigns { credentials } => commands::campaigns::execute(&options, &credentials).await,
        Commands::Queue { credentials, selection } => {
            commands::queue::execute(&options, &credentials, &selection).await
        }
        Commands::Dial {
            credentials,
            selection,
            skip,
        } => commands::dial::execute(&options, &credentials, &selection, skip).await,
        Commands::Auto {
            credentials,
            selection,
            pacing_ms,
        } => commands::auto::execute(&options, &credentials, &selection, pacing_ms).await,
    }
}
