//! `dialer queue`

use anyhow::Result;

use super::{load_config, GlobalOptions, OperatorSession};
use crate::cli::{Credentials, Selection};
use crate::output;

pub async fn execute(options: &GlobalOptions, credentials: &Credentials, selection: &Selection) -> Result<()> {
    let session = OperatorSession::open(load_config(options)?, credentials).await?;
    session.select(selection).await?;

    let snapshot = session.console.snapshot();
    println!("{}", output::selection_summary(&snapshot));
    if snapshot.contacts.is_empty() {
        println!("The list has no contacts.");
    } else {
        println!("{}", output::contacts_table(&snapshot));
    }

    session.close().await;
    Ok(())
}
