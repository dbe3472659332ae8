//! Shared helpers for dialer-core integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::sync::Notify;

use dialer_core::{
    CallReceipt, CallRequest, Campaign, CampaignListLink, CampaignScope, Contact, ContactList, DialerBackend,
    DialerConfig, DialerConsole, DialerError, DialerResult, RecordId, RecordStatus,
};

/// In-memory backend with per-list fetch gates and scripted call failures
#[derive(Default)]
pub struct FakeBackend {
    campaigns: Mutex<Vec<Campaign>>,
    links: Mutex<HashMap<RecordId, Vec<CampaignListLink>>>,
    catalog: Mutex<Vec<ContactList>>,
    contacts: Mutex<HashMap<RecordId, Vec<Contact>>>,
    contact_gates: Mutex<HashMap<RecordId, Arc<Notify>>>,
    call_gate: Mutex<Option<Arc<Notify>>>,
    failing_numbers: Mutex<HashSet<String>>,
    campaigns_unavailable: Mutex<bool>,
    scopes: Mutex<Vec<CampaignScope>>,
    contact_requests: Mutex<Vec<RecordId>>,
    calls: Mutex<Vec<String>>,
    pending_calls: Mutex<usize>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_campaigns(&self, campaigns: Vec<Campaign>) {
        *self.campaigns.lock() = campaigns;
    }

    pub fn with_lists(&self, campaign_id: RecordId, lists: Vec<ContactList>) {
        let links = lists
            .iter()
            .map(|list| CampaignListLink { id: None, campaign_id: Some(campaign_id), list_id: list.id })
            .collect();
        self.links.lock().insert(campaign_id, links);
        self.catalog.lock().extend(lists);
    }

    pub fn with_catalog_entry(&self, list: ContactList) {
        self.catalog.lock().push(list);
    }

    pub fn with_links(&self, campaign_id: RecordId, list_ids: &[RecordId]) {
        let links = list_ids
            .iter()
            .map(|&list_id| CampaignListLink { id: None, campaign_id: Some(campaign_id), list_id })
            .collect();
        self.links.lock().insert(campaign_id, links);
    }

    pub fn with_contacts(&self, list_id: RecordId, contacts: Vec<Contact>) {
        self.contacts.lock().insert(list_id, contacts);
    }

    /// Hold contact fetches for `list_id` until the returned gate is notified
    pub fn gate_contacts(&self, list_id: RecordId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.contact_gates.lock().insert(list_id, Arc::clone(&gate));
        gate
    }

    /// Hold every call until the returned gate is notified
    pub fn gate_calls(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.call_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn fail_calls_to(&self, number: &str) {
        self.failing_numbers.lock().insert(number.to_string());
    }

    /// Answer every campaign fetch with a server error
    pub fn fail_campaign_fetches(&self) {
        *self.campaigns_unavailable.lock() = true;
    }

    pub fn scopes(&self) -> Vec<CampaignScope> {
        self.scopes.lock().clone()
    }

    pub fn contact_requests(&self) -> Vec<RecordId> {
        self.contact_requests.lock().clone()
    }

    /// Numbers the provider accepted a call for, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn pending_calls(&self) -> usize {
        *self.pending_calls.lock()
    }
}

#[async_trait]
impl DialerBackend for FakeBackend {
    async fn fetch_campaigns(&self, scope: CampaignScope) -> DialerResult<Vec<Campaign>> {
        self.scopes.lock().push(scope);
        if *self.campaigns_unavailable.lock() {
            return Err(DialerError::server(503, "campaign service unavailable"));
        }
        Ok(self.campaigns.lock().clone())
    }

    async fn fetch_campaign_lists(&self, campaign_id: RecordId) -> DialerResult<Vec<CampaignListLink>> {
        Ok(self.links.lock().get(&campaign_id).cloned().unwrap_or_default())
    }

    async fn fetch_list_catalog(&self) -> DialerResult<Vec<ContactList>> {
        Ok(self.catalog.lock().clone())
    }

    async fn fetch_contacts(&self, list_id: RecordId) -> DialerResult<Vec<Contact>> {
        self.contact_requests.lock().push(list_id);
        let gate = self.contact_gates.lock().get(&list_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.contacts
            .lock()
            .get(&list_id)
            .cloned()
            .ok_or_else(|| DialerError::server(404, format!("list {} not found", list_id)))
    }

    async fn place_call(&self, request: &CallRequest) -> DialerResult<CallReceipt> {
        let number = request.destination().to_string();
        *self.pending_calls.lock() += 1;
        let gate = self.call_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        *self.pending_calls.lock() -= 1;

        if self.failing_numbers.lock().contains(&number) {
            return Err(DialerError::server(502, "voice provider unavailable"));
        }
        self.calls.lock().push(number.clone());
        Ok(CallReceipt {
            uuid: Some(format!("call-{}", number)),
            status: Some("started".to_string()),
            ..CallReceipt::default()
        })
    }
}

pub fn campaign(id: RecordId, end_date: Option<&str>) -> Campaign {
    Campaign {
        id,
        name: Some(format!("Campaign {}", id)),
        status: RecordStatus::Active,
        start_date: None,
        end_date: end_date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
    }
}

pub fn list(id: RecordId, status: RecordStatus) -> ContactList {
    ContactList {
        id,
        name: Some(format!("List {}", id)),
        status,
        contact_count: None,
    }
}

pub fn config() -> DialerConfig {
    DialerConfig::new("https://crm.example.com".parse().unwrap()).with_pacing_delay(Duration::from_millis(2_000))
}

pub fn console(backend: &Arc<FakeBackend>) -> Arc<DialerConsole> {
    Arc::new(DialerConsole::with_backend(config(), Arc::clone(backend) as Arc<dyn DialerBackend>))
}

/// Yield until `condition` holds, for tasks spawned on the test runtime
pub async fn until(mut condition: impl FnMut() -> bool) {
    while !condition() {
        tokio::task::yield_now().await;
    }
}
