//! Manual and automatic dialing
//!
//! [`DialerLoop`] places calls to contacts of the selected list through the
//! [`DialerBackend`]. A successful call records the number in the called
//! registry and advances the current contact; a failed call leaves the number
//! unmarked so it can be retried.
//!
//! Auto-mode repeats "call the current contact, wait the pacing delay" until
//! the queue is exhausted, a call fails or [`DialerLoop::stop`] is invoked.
//! Stopping during the pacing delay wakes the loop immediately; stopping
//! while a call is in flight lets that call finish but prevents the next one.
//!
//! ```text
//!            dial()                 call ok, auto on, next contact
//!   Idle ───────────► Dialing ─────────────────────────────► PacingDelay
//!    ▲                  │  │                                     │
//!    │   call ok/failed │  │ stop()                      delay   │
//!    └──────────────────┘  ▼                             elapsed │
//!                       Stopped ◄──────── stop() ────────────────┤
//!                                                   Dialing ◄────┘
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::model::{CallReceipt, CallRequest, Contact};
use crate::api::DialerBackend;
use crate::config::DialerConfig;
use crate::error::{DialerError, DialerResult};
use crate::events::{AutoStopReason, DialerEvent};
use crate::store::{DialCompletion, DialOrigin, DialerStore};

/// How an auto-dial session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoOutcome {
    pub calls_placed: usize,
    pub reason: AutoStopReason,
}

pub struct DialerLoop {
    backend: Arc<dyn DialerBackend>,
    store: Arc<DialerStore>,
    config: Arc<DialerConfig>,
}

impl DialerLoop {
    pub fn new(backend: Arc<dyn DialerBackend>, store: Arc<DialerStore>, config: Arc<DialerConfig>) -> Self {
        Self { backend, store, config }
    }

    /// Call `contact` once.
    ///
    /// Rejected while auto-mode is on or another call is in flight.
    pub async fn dial(&self, contact: &Contact) -> DialerResult<CallReceipt> {
        let (receipt, _) = self.place(contact, DialOrigin::Manual).await?;
        Ok(receipt)
    }

    /// Call the current contact once
    pub async fn dial_current(&self) -> DialerResult<CallReceipt> {
        let contact = self
            .store
            .snapshot()
            .current_contact
            .ok_or(DialerError::NoCurrentContact)?;
        self.dial(&contact).await
    }

    /// Mark the current contact as called without dialing it
    pub fn skip(&self) -> DialerResult<Contact> {
        let skipped = self.store.skip_current()?;
        info!("Skipped contact {}", skipped.id);
        self.store.emit(DialerEvent::ContactSkipped {
            contact_id: skipped.id,
            number: skipped.phone_number().map(str::to_string),
        });
        Ok(skipped)
    }

    /// Turn auto-mode off and cancel a pending pacing delay.
    ///
    /// Returns whether an auto session was running.
    pub fn stop(&self) -> bool {
        let stopped = self.store.stop_auto();
        if stopped {
            info!("Auto-dial stop requested");
        }
        stopped
    }

    /// Run auto-mode on the current task until it ends.
    ///
    /// Returns [`AutoStopReason::Busy`] without doing anything when a call is
    /// already in flight or another session is running. Only an expired
    /// session is returned as an error; other call failures end the loop with
    /// [`AutoStopReason::CallFailed`].
    pub async fn run_auto(&self) -> DialerResult<AutoOutcome> {
        let Some(session) = self.store.begin_auto() else {
            debug!("Auto-dial not started: dialer busy");
            return Ok(AutoOutcome { calls_placed: 0, reason: AutoStopReason::Busy });
        };
        info!("Auto-dial session {} started", session.id);
        self.store.emit(DialerEvent::AutoStarted);

        let pacing = self.config.pacing_delay();
        let mut calls_placed = 0;
        let result = loop {
            if session.cancel.is_cancelled() || !self.store.auto_active(session.id) {
                break Ok(AutoStopReason::Stopped);
            }
            let Some(contact) = self.store.snapshot().current_contact else {
                break Ok(AutoStopReason::QueueExhausted);
            };

            match self.place(&contact, DialOrigin::Auto(session.id)).await {
                Ok((_, DialCompletion::Applied { continue_auto: true, .. })) => calls_placed += 1,
                Ok((_, DialCompletion::Applied { next: None, .. })) => {
                    calls_placed += 1;
                    break Ok(AutoStopReason::QueueExhausted);
                }
                Ok((_, DialCompletion::Applied { .. } | DialCompletion::Stale)) => {
                    calls_placed += 1;
                    break Ok(AutoStopReason::Stopped);
                }
                // Stopped or replaced between the check above and the dial
                Err(DialerError::AutoModeActive) => break Ok(AutoStopReason::Stopped),
                Err(e @ DialerError::SessionExpired) => break Err(e),
                Err(e) => break Ok(AutoStopReason::CallFailed(e.to_string())),
            }

            tokio::select! {
                _ = session.cancel.cancelled() => break Ok(AutoStopReason::Stopped),
                _ = tokio::time::sleep(pacing) => {}
            }
        };

        let reason = match &result {
            Ok(reason) => reason.clone(),
            Err(e) => AutoStopReason::CallFailed(e.to_string()),
        };
        self.store.finish_auto(session.id, reason == AutoStopReason::Stopped);
        info!(
            "Auto-dial session {} finished after {} calls: {:?}",
            session.id, calls_placed, reason
        );
        self.store.emit(DialerEvent::AutoFinished { calls_placed, reason });

        result.map(|reason| AutoOutcome { calls_placed, reason })
    }

    /// Spawn [`run_auto`](Self::run_auto) and return immediately
    pub fn start_auto(self: &Arc<Self>) -> JoinHandle<DialerResult<AutoOutcome>> {
        let dialer = Arc::clone(self);
        tokio::spawn(async move { dialer.run_auto().await })
    }

    async fn place(&self, contact: &Contact, origin: DialOrigin) -> DialerResult<(CallReceipt, DialCompletion)> {
        let number = contact
            .phone_number()
            .ok_or_else(|| DialerError::call_failed("", format!("contact {} has no phone number", contact.id)))?;
        let request = CallRequest::outbound(number, &self.config)?;

        let ticket = self.store.begin_dial(origin)?;
        self.store.emit(DialerEvent::CallStarted {
            contact_id: contact.id,
            number: number.to_string(),
        });
        debug!("Dialing {} for contact {}", number, contact.id);

        match self.backend.place_call(&request).await {
            Ok(receipt) => {
                let completion = self.store.complete_dial(ticket, number, origin);
                if completion != DialCompletion::Stale {
                    self.store.emit(DialerEvent::CallPlaced {
                        contact_id: contact.id,
                        number: number.to_string(),
                        call_uuid: receipt.uuid.clone(),
                    });
                }
                Ok((receipt, completion))
            }
            Err(e) => {
                warn!("Call to {} failed: {}", number, e);
                let reason = e.to_string();
                self.store.fail_dial(ticket, &reason);
                self.store.emit(DialerEvent::CallFailed {
                    contact_id: contact.id,
                    number: number.to_string(),
                    reason: reason.clone(),
                });
                match e {
                    DialerError::SessionExpired => Err(e),
                    _ => Err(DialerError::call_failed(number, reason)),
                }
            }
        }
    }
}
