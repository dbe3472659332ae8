//! Campaign → list → contacts navigation
//!
//! The navigator loads what the operator may work on and cascades selections
//! down the hierarchy: loading campaigns selects the most urgent one,
//! selecting a campaign loads its active lists and selects the first, and
//! selecting a list loads its contacts. Each step resets everything below it
//! in the [`DialerStore`] before fetching, so a slow response for a previous
//! selection is discarded instead of overwriting the new one.
//!
//! Failed fetches are recorded as the store's last error and surfaced as a
//! [`DialerEvent::Error`]; the cached collections are left as they were.
//! The snapshot's `loading` flag stays set until the whole cascade settles.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::model::{Campaign, CampaignScope, ContactList, OperatorIdentity, RecordId};
use crate::api::DialerBackend;
use crate::error::DialerResult;
use crate::events::DialerEvent;
use crate::store::{DialerStore, SelectionToken};

pub struct CampaignNavigator {
    backend: Arc<dyn DialerBackend>,
    store: Arc<DialerStore>,
}

impl CampaignNavigator {
    pub fn new(backend: Arc<dyn DialerBackend>, store: Arc<DialerStore>) -> Self {
        Self { backend, store }
    }

    /// Active campaigns ordered by end date, soonest first.
    ///
    /// Campaigns without an end date go last; ties keep server order.
    pub fn active_by_urgency(campaigns: Vec<Campaign>) -> Vec<Campaign> {
        let mut active: Vec<Campaign> = campaigns.into_iter().filter(Campaign::is_active).collect();
        active.sort_by(|a, b| match (a.end_date, b.end_date) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        active
    }

    /// Load the campaigns `identity` may see and select the most urgent one.
    ///
    /// Administrators see every campaign, operators only their assignments.
    pub async fn load_active_campaigns(&self, identity: &OperatorIdentity) -> DialerResult<Vec<Campaign>> {
        let scope = CampaignScope::for_identity(identity);
        let _loading = self.store.track_loading();
        let fetched = self.backend.fetch_campaigns(scope).await;

        let campaigns = match fetched {
            Ok(campaigns) => Self::active_by_urgency(campaigns),
            Err(e) => {
                warn!("Failed to load campaigns for operator {}: {}", identity.user_id, e);
                self.store.record_error(e.to_string());
                return Err(e);
            }
        };

        info!("Loaded {} active campaigns for operator {}", campaigns.len(), identity.user_id);
        self.store.set_campaigns(campaigns.clone());
        self.store.emit(DialerEvent::CampaignsLoaded { count: campaigns.len() });

        if let Some(first) = campaigns.first() {
            self.select_campaign(first.clone()).await?;
        }
        Ok(campaigns)
    }

    /// Make `campaign` current, load its active lists and select the first.
    pub async fn select_campaign(&self, campaign: Campaign) -> DialerResult<()> {
        let campaign_id = campaign.id;
        let token = self.store.select_campaign(campaign);
        self.store.emit(DialerEvent::CampaignSelected { campaign_id });
        debug!("Selected campaign {}", campaign_id);

        let _loading = self.store.track_loading();
        let fetched = tokio::try_join!(
            self.backend.fetch_campaign_lists(campaign_id),
            self.backend.fetch_list_catalog()
        );

        let (links, catalog) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Failed to load lists for campaign {}: {}", campaign_id, e);
                if self.store.is_current(token) {
                    self.store.record_error(e.to_string());
                }
                return Err(e);
            }
        };

        let mut catalog: HashMap<_, ContactList> = catalog.into_iter().map(|list| (list.id, list)).collect();
        let mut seen = HashSet::new();
        let lists: Vec<ContactList> = links
            .into_iter()
            .filter(|link| seen.insert(link.list_id))
            .filter_map(|link| catalog.remove(&link.list_id))
            .filter(ContactList::is_active)
            .collect();

        let first = lists.first().cloned();
        let count = lists.len();
        if !self.store.apply_lists(token, lists) {
            return Ok(());
        }
        self.store.emit(DialerEvent::ListsLoaded { campaign_id, count });
        debug!("Campaign {} has {} active lists", campaign_id, count);

        match first {
            Some(list) => self.select_list_within(token, list).await,
            None => Ok(()),
        }
    }

    /// Make `list` current and load its contacts.
    ///
    /// The called registry starts empty for the new list.
    pub async fn select_list(&self, list: ContactList) -> DialerResult<()> {
        let list_id = list.id;
        let token = self.store.select_list(list);
        self.store.emit(DialerEvent::ListSelected { list_id });
        let _loading = self.store.track_loading();
        self.load_contacts(token, list_id).await
    }

    /// Fetch the contacts of the selected list again, keeping the registry
    pub async fn reload_contacts(&self) -> DialerResult<()> {
        let Some(list) = self.store.snapshot().selected_list else {
            debug!("No list selected; nothing to reload");
            return Ok(());
        };
        let token = self.store.selection_token();
        let _loading = self.store.track_loading();
        self.load_contacts(token, list.id).await
    }

    async fn select_list_within(&self, campaign_token: SelectionToken, list: ContactList) -> DialerResult<()> {
        let list_id = list.id;
        match self.store.select_list_after(campaign_token, list) {
            Some(token) => {
                self.store.emit(DialerEvent::ListSelected { list_id });
                self.load_contacts(token, list_id).await
            }
            None => Ok(()),
        }
    }

    async fn load_contacts(&self, token: SelectionToken, list_id: RecordId) -> DialerResult<()> {
        let fetched = self.backend.fetch_contacts(list_id).await;

        match fetched {
            Ok(contacts) => {
                let count = contacts.len();
                if self.store.apply_contacts(token, contacts) {
                    info!("Loaded {} contacts for list {}", count, list_id);
                    self.store.emit(DialerEvent::ContactsLoaded { list_id, count });
                }
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load contacts for list {}: {}", list_id, e);
                if self.store.is_current(token) {
                    self.store.record_error(e.to_string());
                }
                Err(e)
            }
        }
    }
}
