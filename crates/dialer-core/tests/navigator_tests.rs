//! Campaign, list and contact navigation against an in-memory backend

mod common;

use std::sync::Arc;

use common::{campaign, console, list, until, FakeBackend};
use dialer_core::{CampaignScope, Contact, DialerError, DialerEvent, OperatorIdentity, RecordStatus};

#[tokio::test]
async fn test_loads_campaigns_by_urgency_and_cascades_selection() {
    let backend = FakeBackend::new();
    backend.with_campaigns(vec![
        campaign(1, Some("2024-05-01")),
        campaign(2, None),
        campaign(3, Some("2024-03-01")),
    ]);
    backend.with_lists(3, vec![list(30, RecordStatus::Active), list(31, RecordStatus::Active)]);
    backend.with_contacts(30, vec![Contact::new(1, Some("+39061")), Contact::new(2, Some("+39062"))]);
    let console = console(&backend);

    let campaigns = console
        .navigator()
        .load_active_campaigns(&OperatorIdentity::admin(1))
        .await
        .unwrap();

    let ids: Vec<_> = campaigns.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);

    let snapshot = console.snapshot();
    assert_eq!(snapshot.selected_campaign.map(|c| c.id), Some(3));
    assert_eq!(snapshot.lists.len(), 2);
    assert_eq!(snapshot.selected_list.map(|l| l.id), Some(30));
    assert_eq!(snapshot.contacts.len(), 2);
    assert_eq!(snapshot.current_contact.map(|c| c.id), Some(1));
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_scope_depends_on_role() {
    let backend = FakeBackend::new();
    let console = console(&backend);

    console
        .navigator()
        .load_active_campaigns(&OperatorIdentity::admin(1))
        .await
        .unwrap();
    console
        .navigator()
        .load_active_campaigns(&OperatorIdentity::operator(42))
        .await
        .unwrap();

    assert_eq!(backend.scopes(), vec![CampaignScope::All, CampaignScope::AssignedTo(42)]);
    assert!(console.snapshot().selected_campaign.is_none());
}

#[tokio::test]
async fn test_lists_follow_link_order_and_skip_inactive() {
    let backend = FakeBackend::new();
    backend.with_catalog_entry(list(10, RecordStatus::Active));
    backend.with_catalog_entry(list(11, RecordStatus::Closed));
    backend.with_catalog_entry(list(12, RecordStatus::Active));
    backend.with_links(5, &[12, 11, 99, 10, 12]);
    backend.with_contacts(12, vec![]);
    let console = console(&backend);

    console.navigator().select_campaign(campaign(5, None)).await.unwrap();

    let snapshot = console.snapshot();
    let ids: Vec<_> = snapshot.lists.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![12, 10]);
    assert_eq!(snapshot.selected_list.map(|l| l.id), Some(12));
    assert!(snapshot.current_contact.is_none());
}

#[tokio::test]
async fn test_selecting_a_list_resets_registry() {
    let backend = FakeBackend::new();
    backend.with_contacts(1, vec![Contact::new(1, Some("100")), Contact::new(2, Some("200"))]);
    backend.with_contacts(2, vec![Contact::new(3, Some("100"))]);
    let console = console(&backend);

    console.navigator().select_list(list(1, RecordStatus::Active)).await.unwrap();
    console.dialer().dial_current().await.unwrap();
    assert!(console.snapshot().called.contains("100"));

    console.navigator().select_list(list(2, RecordStatus::Active)).await.unwrap();
    let snapshot = console.snapshot();
    assert!(snapshot.called.is_empty());
    assert_eq!(snapshot.current_contact.map(|c| c.id), Some(3));
}

#[tokio::test]
async fn test_reload_keeps_registry() {
    let backend = FakeBackend::new();
    backend.with_contacts(1, vec![Contact::new(1, Some("100")), Contact::new(2, Some("200"))]);
    let console = console(&backend);

    console.navigator().select_list(list(1, RecordStatus::Active)).await.unwrap();
    console.dialer().skip().unwrap();

    backend.with_contacts(
        1,
        vec![
            Contact::new(1, Some("100")),
            Contact::new(2, Some("200")),
            Contact::new(3, Some("300")),
        ],
    );
    console.navigator().reload_contacts().await.unwrap();

    let snapshot = console.snapshot();
    assert_eq!(snapshot.contacts.len(), 3);
    assert!(snapshot.called.contains("100"));
    assert_eq!(snapshot.current_contact.as_ref().map(|c| c.id), Some(2));
    assert_eq!(snapshot.remaining(), 2);
}

#[tokio::test]
async fn test_stale_contact_fetch_is_discarded() {
    let backend = FakeBackend::new();
    backend.with_contacts(1, vec![Contact::new(1, Some("111"))]);
    backend.with_contacts(2, vec![Contact::new(2, Some("222"))]);
    let slow = backend.gate_contacts(1);
    let console = console(&backend);

    let first = {
        let console = Arc::clone(&console);
        tokio::spawn(async move { console.navigator().select_list(list(1, RecordStatus::Active)).await })
    };
    until(|| backend.contact_requests().contains(&1)).await;

    console.navigator().select_list(list(2, RecordStatus::Active)).await.unwrap();
    slow.notify_one();
    first.await.unwrap().unwrap();

    let snapshot = console.snapshot();
    assert_eq!(snapshot.selected_list.map(|l| l.id), Some(2));
    let ids: Vec<_> = snapshot.contacts.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2]);
    assert_eq!(snapshot.current_contact.map(|c| c.id), Some(2));
}

#[tokio::test]
async fn test_contact_fetch_failure_is_recorded() {
    let backend = FakeBackend::new();
    backend.with_contacts(1, vec![Contact::new(1, Some("111"))]);
    let console = console(&backend);
    let mut events = console.events();

    console.navigator().select_list(list(1, RecordStatus::Active)).await.unwrap();
    // list 7 has no contacts registered, so the fake answers 404
    let result = console.navigator().select_list(list(7, RecordStatus::Active)).await;

    assert!(matches!(result, Err(DialerError::Server { status: 404, .. })));
    let snapshot = console.snapshot();
    assert!(snapshot.last_error.as_deref().unwrap_or_default().contains("list 7 not found"));
    assert!(!snapshot.loading);

    let mut saw_error = false;
    while let Ok(event) = events.try_recv() {
        saw_error |= matches!(event, DialerEvent::Error { .. });
    }
    assert!(saw_error);
}

#[tokio::test]
async fn test_failed_campaign_reload_keeps_cached_navigation() {
    let backend = FakeBackend::new();
    backend.with_campaigns(vec![campaign(3, Some("2024-03-01")), campaign(4, None)]);
    backend.with_lists(3, vec![list(30, RecordStatus::Active), list(31, RecordStatus::Active)]);
    backend.with_contacts(30, vec![Contact::new(1, Some("+39061"))]);
    let console = console(&backend);
    let operator = OperatorIdentity::operator(42);

    console.navigator().load_active_campaigns(&operator).await.unwrap();
    let before = console.snapshot();
    assert!(before.last_error.is_none());

    backend.fail_campaign_fetches();
    let result = console.navigator().load_active_campaigns(&operator).await;
    assert!(matches!(result, Err(DialerError::Server { status: 503, .. })));

    let after = console.snapshot();
    let campaign_ids = |s: &dialer_core::DialerSnapshot| s.campaigns.iter().map(|c| c.id).collect::<Vec<_>>();
    let list_ids = |s: &dialer_core::DialerSnapshot| s.lists.iter().map(|l| l.id).collect::<Vec<_>>();
    assert_eq!(campaign_ids(&after), campaign_ids(&before));
    assert_eq!(list_ids(&after), vec![30, 31]);
    assert_eq!(after.selected_campaign.as_ref().map(|c| c.id), Some(3));
    assert_eq!(after.selected_list.as_ref().map(|l| l.id), Some(30));
    assert_eq!(after.contacts.len(), 1);
    assert!(after.last_error.as_deref().unwrap_or_default().contains("campaign service unavailable"));
    assert!(!after.loading);
}

#[tokio::test]
async fn test_loading_spans_the_whole_cascade() {
    let backend = FakeBackend::new();
    backend.with_campaigns(vec![campaign(3, None)]);
    backend.with_lists(3, vec![list(30, RecordStatus::Active)]);
    backend.with_contacts(30, vec![Contact::new(1, Some("+39061"))]);
    let gate = backend.gate_contacts(30);
    let console = console(&backend);

    let load = {
        let console = Arc::clone(&console);
        tokio::spawn(async move {
            console
                .navigator()
                .load_active_campaigns(&OperatorIdentity::admin(1))
                .await
        })
    };
    until(|| backend.contact_requests().contains(&30)).await;

    let snapshot = console.snapshot();
    assert_eq!(snapshot.lists.len(), 1);
    assert!(snapshot.contacts.is_empty());
    assert!(snapshot.loading);

    gate.notify_one();
    load.await.unwrap().unwrap();
    let snapshot = console.snapshot();
    assert_eq!(snapshot.contacts.len(), 1);
    assert!(!snapshot.loading);
}
