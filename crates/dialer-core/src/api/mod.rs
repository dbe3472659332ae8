//! Backend access for the dialer
//!
//! The coordination logic never talks HTTP directly. It goes through the
//! [`DialerBackend`] trait, which [`RestBackend`] implements on top of the
//! session-guarded HTTP client. Tests and alternative front ends can provide
//! their own implementation.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ CampaignNavigator/DialerLoop │
//! └──────────────┬───────────────┘
//!                │ DialerBackend
//! ┌──────────────▼───────────────┐
//! │         RestBackend          │
//! └──────────────┬───────────────┘
//!                │ SessionGuard::execute
//! ┌──────────────▼───────────────┐
//! │      CRM REST endpoints      │
//! └──────────────────────────────┘
//! ```

pub mod envelope;
pub mod model;
pub mod rest;

use async_trait::async_trait;

use crate::error::DialerResult;

pub use envelope::{read_envelope, Envelope};
pub use model::{
    CallEndpoint, CallReceipt, CallRequest, Campaign, CampaignListLink, CampaignScope, Contact,
    ContactList, OperatorIdentity, RecordId, RecordStatus, Role,
};
pub use rest::RestBackend;

/// Data and call operations the dialer needs from the CRM backend
#[async_trait]
pub trait DialerBackend: Send + Sync {
    /// Campaigns visible in `scope`, in backend order
    async fn fetch_campaigns(&self, scope: CampaignScope) -> DialerResult<Vec<Campaign>>;

    /// Lists linked to a campaign, in link order
    async fn fetch_campaign_lists(&self, campaign_id: RecordId) -> DialerResult<Vec<CampaignListLink>>;

    /// The full list catalog
    async fn fetch_list_catalog(&self) -> DialerResult<Vec<ContactList>>;

    /// Contacts of a list, in backend order
    async fn fetch_contacts(&self, list_id: RecordId) -> DialerResult<Vec<Contact>>;

    /// Ask the voice provider to place an outbound call
    async fn place_call(&self, request: &CallRequest) -> DialerResult<CallReceipt>;
}
