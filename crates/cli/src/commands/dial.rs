//! `dialer dial`

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

use super::{load_config, GlobalOptions, OperatorSession};
use crate::cli::{Credentials, Selection};
use crate::output;

pub async fn execute(
    options: &GlobalOptions,
    credentials: &Credentials,
    selection: &Selection,
    skip: usize,
) -> Result<()> {
    let session = OperatorSession::open(load_config(options)?, credentials).await?;
    session.select(selection).await?;
    let dialer = session.console.dialer();

    for _ in 0..skip {
        let skipped = dialer.skip().context("nothing left to skip")?;
        info!("Skipped {}", skipped.display_name());
    }

    let contact = session
        .console
        .snapshot()
        .current_contact
        .context("no contact left to call in the selected list")?;
    println!(
        "Calling {} at {}...",
        contact.display_name().bold(),
        contact.phone_number().unwrap_or_default()
    );

    let result = dialer.dial(&contact).await;
    match &result {
        Ok(receipt) => println!(
            "{} call id {}",
            "Call placed:".green().bold(),
            receipt.uuid.as_deref().unwrap_or("-")
        ),
        Err(e) => println!("{} {}", "Call failed:".red().bold(), e),
    }
    println!("{}", output::selection_summary(&session.console.snapshot()));

    session.close().await;
    result?;
    Ok(())
}
