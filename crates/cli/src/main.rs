//! Dialer operator console
//!
//! Command-line front end for `dialer-core`: browse the campaigns assigned to
//! the operator, inspect a list's call queue and place calls by hand or with
//! the paced auto-dialer.

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let default_filter = if cli.verbose { "dialer_core=debug,dialer=debug" } else { "dialer_core=info,dialer=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(e) = cli::run(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
