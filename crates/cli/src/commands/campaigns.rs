//! `dialer campaigns`

use anyhow::Result;
use colored::Colorize;

use super::{load_config, GlobalOptions, OperatorSession};
use crate::cli::Credentials;
use crate::output;

pub async fn execute(options: &GlobalOptions, credentials: &Credentials) -> Result<()> {
    let session = OperatorSession::open(load_config(options)?, credentials).await?;
    let snapshot = session.console.snapshot();

    let scope = if session.operator.is_admin() { "all campaigns" } else { "assigned campaigns" };
    println!("{} ({})", "Active campaigns".bold(), scope);
    if snapshot.campaigns.is_empty() {
        println!("No active campaigns.");
    } else {
        let selected = snapshot.selected_campaign.as_ref().map(|c| c.id);
        println!("{}", output::campaigns_table(&snapshot.campaigns, selected));
    }

    if let Some(campaign) = &snapshot.selected_campaign {
        println!("\n{} {}", "Lists of".bold(), campaign.display_name().bold());
        if snapshot.lists.is_empty() {
            println!("No active lists.");
        } else {
            let selected = snapshot.selected_list.as_ref().map(|l| l.id);
            println!("{}", output::lists_table(&snapshot.lists, selected));
        }
    }

    session.close().await;
    Ok(())
}
