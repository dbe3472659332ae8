//! Console state container
//!
//! [`DialerStore`] owns everything the dialer module knows during a session:
//! the campaign/list/contact caches, the [`CalledRegistry`], the dialer phase
//! and the auto-mode flag. Every mutation happens in one short critical
//! section and is followed by publishing a fresh [`DialerSnapshot`] on a
//! `watch` channel. Readers either take a one-shot copy with
//! [`DialerStore::snapshot`] or subscribe to changes; nobody outside this
//! module touches the mutable state.
//!
//! # Selection tokens
//!
//! Selecting a campaign or a list clears everything downstream *and* bumps the
//! selection token in the same critical section, before the new fetch is
//! issued. Results of fetches and calls carry the token they were started
//! under; the store discards them if the selection has moved on since.
//!
//! # Auto sessions
//!
//! Each auto-dial run gets an [`AutoSession`] with its own id and
//! cancellation token. [`DialerStore::stop_auto`] cancels the current session;
//! a loop that wakes up after being replaced can no longer dial or change the
//! auto-mode flag of its successor.
//!
//! # Calls in flight
//!
//! At most one call is outstanding. [`DialerStore::begin_dial`] hands out a
//! [`DialTicket`] and the phase stays `Dialing` until that ticket is settled
//! through [`DialerStore::complete_dial`] or [`DialerStore::fail_dial`], even
//! across selection changes and [`DialerStore::reset`].

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::model::{Campaign, Contact, ContactList};
use crate::error::{DialerError, DialerResult};
use crate::events::DialerEvent;
use crate::registry::CalledRegistry;
use crate::selector::ContactSelector;

/// Where the dialer state machine currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialerPhase {
    /// No call in flight, auto-mode off
    #[default]
    Idle,
    /// A call request is in flight
    Dialing,
    /// Auto-mode is waiting before the next call
    PacingDelay,
    /// An auto session was stopped explicitly; otherwise the same as `Idle`
    Stopped,
}

impl DialerPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle | Self::Stopped)
    }
}

impl std::fmt::Display for DialerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Dialing => write!(f, "dialing"),
            Self::PacingDelay => write!(f, "pacing"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Identifies the campaign/list selection an asynchronous result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionToken(u64);

/// Immutable view of the console state
#[derive(Debug, Clone, Default)]
pub struct DialerSnapshot {
    /// Active campaigns, soonest to expire first
    pub campaigns: Vec<Campaign>,
    pub selected_campaign: Option<Campaign>,
    /// Active lists of the selected campaign
    pub lists: Vec<ContactList>,
    pub selected_list: Option<ContactList>,
    /// Contacts of the selected list, in server order
    pub contacts: Vec<Contact>,
    /// Next contact the dialer will offer
    pub current_contact: Option<Contact>,
    pub called: CalledRegistry,
    pub phase: DialerPhase,
    pub auto_mode: bool,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl DialerSnapshot {
    /// Dialable contacts left in the selected list
    pub fn remaining(&self) -> usize {
        ContactSelector::remaining(&self.contacts, &self.called)
    }
}

/// Claim on the single call slot, returned by [`DialerStore::begin_dial`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialTicket {
    call_id: u64,
    selection: SelectionToken,
}

impl DialTicket {
    /// Selection the call was placed under
    pub fn selection(&self) -> SelectionToken {
        self.selection
    }
}

/// Handle of one auto-dial run
#[derive(Debug, Clone)]
pub struct AutoSession {
    pub id: u64,
    pub cancel: CancellationToken,
}

/// Who is asking to dial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialOrigin {
    Manual,
    Auto(u64),
}

/// What happened when a successful call result was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialCompletion {
    Applied {
        next: Option<Contact>,
        /// Auto-mode is still on and there is a next contact
        continue_auto: bool,
    },
    /// The selection changed while the call was in flight
    Stale,
}

struct StoreState {
    snapshot: DialerSnapshot,
    selection: u64,
    auto: Option<AutoSession>,
    next_auto_id: u64,
    call: Option<u64>,
    next_call_id: u64,
    loading: usize,
}

impl StoreState {
    fn refresh_current(&mut self) {
        self.snapshot.current_contact =
            ContactSelector::next(&self.snapshot.contacts, &self.snapshot.called).cloned();
    }

    /// Turn auto-mode off and cancel the running session, if any.
    ///
    /// Returns whether a session was running.
    fn stop_auto(&mut self) -> bool {
        self.snapshot.auto_mode = false;
        match self.auto.take() {
            Some(session) => {
                session.cancel.cancel();
                if self.snapshot.phase != DialerPhase::Dialing {
                    self.snapshot.phase = DialerPhase::Stopped;
                }
                true
            }
            None => false,
        }
    }

    fn is_current(&self, token: SelectionToken) -> bool {
        self.selection == token.0
    }

    fn auto_session_active(&self, id: u64) -> bool {
        self.snapshot.auto_mode && self.auto.as_ref().is_some_and(|session| session.id == id)
    }

    /// Release the call slot held by `ticket`.
    ///
    /// Returns whether the ticket still owned it.
    fn settle_call(&mut self, ticket: DialTicket) -> bool {
        if self.call != Some(ticket.call_id) {
            return false;
        }
        self.call = None;
        if self.snapshot.phase == DialerPhase::Dialing {
            self.snapshot.phase = DialerPhase::Idle;
        }
        true
    }
}

pub struct DialerStore {
    state: Mutex<StoreState>,
    snapshots: watch::Sender<DialerSnapshot>,
    events: broadcast::Sender<DialerEvent>,
}

impl DialerStore {
    pub fn new(event_buffer: usize) -> Self {
        let (snapshots, _) = watch::channel(DialerSnapshot::default());
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            state: Mutex::new(StoreState {
                snapshot: DialerSnapshot::default(),
                selection: 0,
                auto: None,
                next_auto_id: 1,
                call: None,
                next_call_id: 1,
                loading: 0,
            }),
            snapshots,
            events,
        }
    }

    /// Current state, without subscribing
    pub fn snapshot(&self) -> DialerSnapshot {
        self.state.lock().snapshot.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DialerSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<DialerEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: DialerEvent) {
        // No subscriber is not an error
        let _ = self.events.send(event);
    }

    pub fn selection_token(&self) -> SelectionToken {
        SelectionToken(self.state.lock().selection)
    }

    pub fn is_current(&self, token: SelectionToken) -> bool {
        self.state.lock().is_current(token)
    }

    fn update<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let mut state = self.state.lock();
        let result = f(&mut state);
        self.snapshots.send_replace(state.snapshot.clone());
        result
    }

    // ===== NAVIGATION =====

    /// Mark a fetch as running until the guard is dropped.
    ///
    /// Guards nest; `loading` stays set while any of them is alive.
    pub fn track_loading(&self) -> LoadingGuard<'_> {
        self.update(|state| {
            state.loading += 1;
            state.snapshot.loading = true;
        });
        LoadingGuard { store: self }
    }

    fn finish_loading(&self) {
        self.update(|state| {
            state.loading = state.loading.saturating_sub(1);
            state.snapshot.loading = state.loading > 0;
        });
    }

    pub fn clear_error(&self) {
        self.update(|state| state.snapshot.last_error = None);
    }

    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|state| state.snapshot.last_error = Some(message.clone()));
        self.emit(DialerEvent::Error { message });
    }

    /// Forget everything: the operator left the dialer module.
    ///
    /// A call still in flight keeps the phase at `Dialing` until it settles;
    /// its result is discarded.
    pub fn reset(&self) {
        self.update(|state| {
            state.stop_auto();
            state.selection += 1;
            state.snapshot = DialerSnapshot {
                phase: if state.call.is_some() { DialerPhase::Dialing } else { DialerPhase::Idle },
                loading: state.loading > 0,
                ..DialerSnapshot::default()
            };
        });
    }

    /// Replace the campaign cache wholesale
    pub fn set_campaigns(&self, campaigns: Vec<Campaign>) {
        self.update(|state| state.snapshot.campaigns = campaigns);
    }

    /// Select `campaign`, clearing every list/contact/dialer field first
    pub fn select_campaign(&self, campaign: Campaign) -> SelectionToken {
        self.update(|state| {
            state.stop_auto();
            state.selection += 1;
            let snapshot = &mut state.snapshot;
            snapshot.selected_campaign = Some(campaign);
            snapshot.lists.clear();
            snapshot.selected_list = None;
            snapshot.contacts.clear();
            snapshot.current_contact = None;
            snapshot.called.clear();
            SelectionToken(state.selection)
        })
    }

    /// Store the lists of the selection `token` was issued for.
    ///
    /// Returns `false` and changes nothing if the selection has moved on.
    pub fn apply_lists(&self, token: SelectionToken, lists: Vec<ContactList>) -> bool {
        self.update(|state| {
            if !state.is_current(token) {
                debug!("Discarding {} lists fetched for a superseded selection", lists.len());
                return false;
            }
            state.snapshot.lists = lists;
            true
        })
    }

    /// Select `list`, clearing contacts, current contact and registry first
    pub fn select_list(&self, list: ContactList) -> SelectionToken {
        self.update(|state| Self::reset_to_list(state, list))
    }

    /// Like [`select_list`](Self::select_list), but only while `expected` is
    /// still the current selection.
    pub fn select_list_after(&self, expected: SelectionToken, list: ContactList) -> Option<SelectionToken> {
        self.update(|state| state.is_current(expected).then(|| Self::reset_to_list(state, list)))
    }

    fn reset_to_list(state: &mut StoreState, list: ContactList) -> SelectionToken {
        state.stop_auto();
        state.selection += 1;
        let snapshot = &mut state.snapshot;
        snapshot.selected_list = Some(list);
        snapshot.contacts.clear();
        snapshot.current_contact = None;
        snapshot.called.clear();
        SelectionToken(state.selection)
    }

    /// Store the contacts of the selection `token` was issued for and
    /// recompute the current contact.
    pub fn apply_contacts(&self, token: SelectionToken, contacts: Vec<Contact>) -> bool {
        self.update(|state| {
            if !state.is_current(token) {
                debug!("Discarding {} contacts fetched for a superseded selection", contacts.len());
                return false;
            }
            state.snapshot.contacts = contacts;
            state.refresh_current();
            true
        })
    }

    // ===== DIALER =====

    /// Claim the call slot and move to `Dialing` if the origin allows it
    pub fn begin_dial(&self, origin: DialOrigin) -> DialerResult<DialTicket> {
        self.update(|state| {
            if state.call.is_some() {
                return Err(DialerError::CallInProgress);
            }
            match origin {
                DialOrigin::Manual if state.snapshot.auto_mode => return Err(DialerError::AutoModeActive),
                DialOrigin::Auto(id) if !state.auto_session_active(id) => {
                    return Err(DialerError::AutoModeActive);
                }
                _ => {}
            }
            let call_id = state.next_call_id;
            state.next_call_id += 1;
            state.call = Some(call_id);
            state.snapshot.phase = DialerPhase::Dialing;
            state.snapshot.last_error = None;
            Ok(DialTicket {
                call_id,
                selection: SelectionToken(state.selection),
            })
        })
    }

    /// Apply a confirmed call: mark the number, pick the next contact and
    /// decide whether the auto loop goes on.
    pub fn complete_dial(&self, ticket: DialTicket, number: &str, origin: DialOrigin) -> DialCompletion {
        self.update(|state| {
            if !state.settle_call(ticket) || !state.is_current(ticket.selection) {
                info!("Call to {} completed after the selection changed; result discarded", number);
                return DialCompletion::Stale;
            }

            state.snapshot.called.mark_called(number);
            state.refresh_current();
            let next = state.snapshot.current_contact.clone();
            let continue_auto = match origin {
                DialOrigin::Auto(id) => state.auto_session_active(id) && next.is_some(),
                DialOrigin::Manual => false,
            };
            state.snapshot.phase = if continue_auto {
                DialerPhase::PacingDelay
            } else {
                DialerPhase::Idle
            };
            DialCompletion::Applied { next, continue_auto }
        })
    }

    /// Apply a failed call: auto-mode off, back to `Idle`, number unmarked.
    ///
    /// A failure for a superseded selection only releases the call slot.
    pub fn fail_dial(&self, ticket: DialTicket, reason: &str) {
        self.update(|state| {
            if !state.settle_call(ticket) || !state.is_current(ticket.selection) {
                debug!("Discarding failure of a call placed for a superseded selection");
                return;
            }
            state.stop_auto();
            state.snapshot.phase = DialerPhase::Idle;
            state.snapshot.last_error = Some(reason.to_string());
        });
    }

    /// Mark the current contact as called without dialing it.
    ///
    /// Returns the skipped contact.
    pub fn skip_current(&self) -> DialerResult<Contact> {
        self.update(|state| {
            if state.call.is_some() {
                return Err(DialerError::CallInProgress);
            }
            let skipped = state.snapshot.current_contact.clone().ok_or(DialerError::NoCurrentContact)?;
            if let Some(number) = skipped.phone_number() {
                state.snapshot.called.mark_called(number);
            }
            state.refresh_current();
            Ok(skipped)
        })
    }

    /// Start an auto session, unless a call is in flight or one is running
    pub fn begin_auto(&self) -> Option<AutoSession> {
        self.update(|state| {
            if state.call.is_some() || state.auto.is_some() {
                return None;
            }
            let session = AutoSession {
                id: state.next_auto_id,
                cancel: CancellationToken::new(),
            };
            state.next_auto_id += 1;
            state.auto = Some(session.clone());
            state.snapshot.auto_mode = true;
            Some(session)
        })
    }

    /// Whether `id` is still the running auto session
    pub fn auto_active(&self, id: u64) -> bool {
        self.state.lock().auto_session_active(id)
    }

    /// Tear the session down once its loop exits.
    ///
    /// Leaves auto-mode alone if a newer session has taken over.
    pub fn finish_auto(&self, id: u64, stopped: bool) {
        self.update(|state| {
            if state.auto.as_ref().is_some_and(|session| session.id == id) {
                state.auto = None;
                state.snapshot.auto_mode = false;
            }
            if state.snapshot.phase == DialerPhase::PacingDelay {
                state.snapshot.phase = DialerPhase::Idle;
            }
            if stopped && state.snapshot.phase == DialerPhase::Idle {
                state.snapshot.phase = DialerPhase::Stopped;
            }
        });
    }

    /// Clear auto-mode and cancel a pending pacing delay.
    ///
    /// A call already in flight completes; the loop does not continue.
    pub fn stop_auto(&self) -> bool {
        self.update(|state| state.stop_auto())
    }
}

/// Keeps [`DialerSnapshot::loading`] set while alive
pub struct LoadingGuard<'a> {
    store: &'a DialerStore,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.finish_loading();
    }
}
