//! `dialer auto`

use std::time::Duration;

use anyhow::Result;
use colored::Colorize;
use dialer_core::{AutoStopReason, DialerEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::{load_config, GlobalOptions, OperatorSession};
use crate::cli::{Credentials, Selection};
use crate::output;

pub async fn execute(
    options: &GlobalOptions,
    credentials: &Credentials,
    selection: &Selection,
    pacing_ms: Option<u64>,
) -> Result<()> {
    let mut config = load_config(options)?;
    if let Some(pacing_ms) = pacing_ms {
        config = config.with_pacing_delay(Duration::from_millis(pacing_ms));
    }
    let session = OperatorSession::open(config, credentials).await?;
    session.select(selection).await?;
    println!("{}", output::selection_summary(&session.console.snapshot()));

    let mut events = session.console.events();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Missed {} dialer events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let dialer = session.console.dialer();
    let mut run = dialer.start_auto();
    info!("Auto-dial running, press Ctrl+C to stop");
    let result = tokio::select! {
        result = &mut run => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Stopping auto-dial");
            dialer.stop();
            run.await?
        }
    };
    printer.abort();

    let summary = output::selection_summary(&session.console.snapshot());
    session.close().await;

    let outcome = result?;
    let reason = match &outcome.reason {
        AutoStopReason::Stopped => "stopped".yellow(),
        AutoStopReason::QueueExhausted => "queue exhausted".green(),
        AutoStopReason::CallFailed(reason) => format!("call failed: {}", reason).red(),
        AutoStopReason::Busy => "a call was already in progress".red(),
    };
    println!("Auto-dial finished after {} calls ({})", outcome.calls_placed, reason);
    println!("{}", summary);
    Ok(())
}

fn print_event(event: &DialerEvent) {
    match event {
        DialerEvent::CallStarted { number, .. } => println!("  {} {}", "calling".yellow(), number),
        DialerEvent::CallPlaced { number, call_uuid, .. } => println!(
            "  {} {} ({})",
            "placed".green(),
            number,
            call_uuid.as_deref().unwrap_or("-")
        ),
        DialerEvent::CallFailed { number, reason, .. } => {
            println!("  {} {}: {}", "failed".red(), number, reason)
        }
        _ => {}
    }
}
