//! # Dialer Core - Operator Console Coordination Layer
//!
//! This crate drives the outbound-calling side of a CRM operator console:
//! - **Session**: cookie-based HTTP access with single-flight session refresh
//! - **Navigation**: active campaigns, their contact lists and the contacts
//! - **Dialing**: manual calls, skips and a paced auto-dial loop
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dialer_core::{DialerConfig, DialerConsole};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DialerConfig::load(None)?;
//!     let console = DialerConsole::connect(config)?;
//!
//!     let session = console.session().expect("REST console has a session");
//!     let operator = session.login("mario", "secret").await?;
//!     console.navigator().load_active_campaigns(&operator).await?;
//!
//!     let outcome = console.dialer().run_auto().await?;
//!     println!("{} calls placed ({:?})", outcome.calls_placed, outcome.reason);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   front end ──► DialerConsole ──► CampaignNavigator ──┐
//!                     │         └─► DialerLoop ─────────┤ DialerBackend
//!                     ▼                                 ▼
//!                 DialerStore                      RestBackend
//!              (snapshots, events)                      │
//!                                                  SessionGuard ──► CRM API
//! ```
//!
//! All mutable console state lives in the [`DialerStore`]; the navigator and
//! the dialer loop change it through short critical sections and front ends
//! observe it through `watch` snapshots and broadcast [`DialerEvent`]s.

pub mod api;
pub mod config;
pub mod console;
pub mod dialer;
pub mod error;
pub mod events;
pub mod navigator;
pub mod registry;
pub mod selector;
pub mod session;
pub mod single_flight;
pub mod store;

// Re-export main types
pub use api::{
    CallReceipt, CallRequest, Campaign, CampaignListLink, CampaignScope, Contact, ContactList, DialerBackend,
    OperatorIdentity, RecordId, RecordStatus, RestBackend, Role,
};
pub use config::{DialerConfig, DEFAULT_PACING_DELAY_MS};
pub use console::DialerConsole;
pub use dialer::{AutoOutcome, DialerLoop};
pub use error::{DialerError, DialerResult};
pub use events::{AutoStopReason, DialerEvent, SessionEvent};
pub use navigator::CampaignNavigator;
pub use registry::CalledRegistry;
pub use selector::ContactSelector;
pub use session::{ApiRequest, SessionGuard};
pub use single_flight::SingleFlight;
pub use store::{DialerPhase, DialerSnapshot, DialerStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    pub use crate::{
        AutoOutcome, AutoStopReason, Campaign, Contact, ContactList, DialerBackend, DialerConfig, DialerConsole,
        DialerError, DialerEvent, DialerPhase, DialerResult, DialerSnapshot, OperatorIdentity,
    };
}
