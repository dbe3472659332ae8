//! REST implementation of [`DialerBackend`]

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::model::{
    CallReceipt, CallRequest, Campaign, CampaignListLink, CampaignScope, Contact, ContactList, Listing, RecordId,
};
use super::DialerBackend;
use crate::error::DialerResult;
use crate::session::{ApiRequest, SessionGuard};

const VOICE_CALLS_PATH: &str = "/api/voice/calls";

/// CRM backend reached over HTTP through a [`SessionGuard`]
pub struct RestBackend {
    session: Arc<SessionGuard>,
}

impl RestBackend {
    pub fn new(session: Arc<SessionGuard>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<SessionGuard> {
        &self.session
    }

    fn campaigns_path(scope: CampaignScope) -> String {
        match scope {
            CampaignScope::All => "/api/campagne".to_string(),
            CampaignScope::AssignedTo(operator_id) => {
                format!("/api/operatori/{}/campagne?dettagli=true", operator_id)
            }
        }
    }
}

#[async_trait]
impl DialerBackend for RestBackend {
    async fn fetch_campaigns(&self, scope: CampaignScope) -> DialerResult<Vec<Campaign>> {
        let campaigns: Vec<Campaign> = self
            .session
            .fetch(ApiRequest::get(Self::campaigns_path(scope)))
            .await?
            .unwrap_or_default();
        debug!("Fetched {} campaigns for {:?}", campaigns.len(), scope);
        Ok(campaigns)
    }

    async fn fetch_campaign_lists(&self, campaign_id: RecordId) -> DialerResult<Vec<CampaignListLink>> {
        let links: Vec<CampaignListLink> = self
            .session
            .fetch(ApiRequest::get(format!("/api/campagne/{}/liste", campaign_id)))
            .await?
            .unwrap_or_default();
        Ok(links)
    }

    async fn fetch_list_catalog(&self) -> DialerResult<Vec<ContactList>> {
        let listing: Option<Listing<ContactList>> = self.session.fetch(ApiRequest::get("/api/liste")).await?;
        Ok(listing.map(Listing::into_items).unwrap_or_default())
    }

    async fn fetch_contacts(&self, list_id: RecordId) -> DialerResult<Vec<Contact>> {
        let contacts: Vec<Contact> = self
            .session
            .fetch(ApiRequest::get(format!("/api/liste/{}/contatti", list_id)))
            .await?
            .unwrap_or_default();
        debug!("Fetched {} contacts for list {}", contacts.len(), list_id);
        Ok(contacts)
    }

    async fn place_call(&self, request: &CallRequest) -> DialerResult<CallReceipt> {
        let body = serde_json::to_value(request)?;
        let receipt: Option<CallReceipt> = self
            .session
            .fetch(ApiRequest::post(VOICE_CALLS_PATH).with_json(body))
            .await?;
        let receipt = receipt.unwrap_or_default();
        info!(
            "Voice provider accepted call to {} (uuid: {})",
            request.destination(),
            receipt.uuid.as_deref().unwrap_or("-")
        );
        Ok(receipt)
    }
}
