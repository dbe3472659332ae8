//! Event types published by the dialer
//!
//! Two kinds of notifications leave the crate:
//!
//! - [`SessionEvent`]s from the [`SessionGuard`](crate::session::SessionGuard),
//!   most importantly [`SessionEvent::Expired`], which an interactive front end
//!   uses to send the operator back to the login screen.
//! - [`DialerEvent`]s from the console store: selection changes, placed and
//!   failed calls, skipped contacts and the lifecycle of the auto-dial loop.
//!
//! Both travel over `tokio::sync::broadcast` channels. State itself is not
//! carried in events; subscribe to the snapshot channel for that.
//!
//! # Examples
//!
//! ```rust
//! use dialer_core::events::DialerEvent;
//!
//! let event = DialerEvent::CallPlaced {
//!     contact_id: 12,
//!     number: "+39061234567".to_string(),
//!     call_uuid: None,
//! };
//! assert!(!event.is_error());
//! ```

use crate::api::model::RecordId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The credential was renewed in place
    Refreshed,
    /// Renewal failed; the operator must authenticate again
    Expired {
        reason: String,
    },
    LoggedIn {
        user_id: RecordId,
    },
    LoggedOut,
}

/// Why an auto-dial session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoStopReason {
    /// `stop()` was called, directly or through a selection change
    Stopped,
    /// No dialable contact is left in the selected list
    QueueExhausted,
    /// A call failed; the number was left unmarked
    CallFailed(String),
    /// A call was already in flight, so the loop did not start
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialerEvent {
    CampaignsLoaded {
        count: usize,
    },
    CampaignSelected {
        campaign_id: RecordId,
    },
    ListsLoaded {
        campaign_id: RecordId,
        count: usize,
    },
    ListSelected {
        list_id: RecordId,
    },
    ContactsLoaded {
        list_id: RecordId,
        count: usize,
    },
    CallStarted {
        contact_id: RecordId,
        number: String,
    },
    CallPlaced {
        contact_id: RecordId,
        number: String,
        call_uuid: Option<String>,
    },
    CallFailed {
        contact_id: RecordId,
        number: String,
        reason: String,
    },
    ContactSkipped {
        contact_id: RecordId,
        number: Option<String>,
    },
    AutoStarted,
    AutoFinished {
        calls_placed: usize,
        reason: AutoStopReason,
    },
    /// A fetch or call failed; cached state was left untouched
    Error {
        message: String,
    },
}

impl DialerEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::CallFailed { .. } | Self::Error { .. })
    }
}
