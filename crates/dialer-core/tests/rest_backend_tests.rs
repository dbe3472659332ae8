//! REST backend endpoints and payloads

use std::sync::Arc;

use serde_json::json;
use tracing_test::traced_test;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dialer_core::{
    CallRequest, CampaignScope, DialerBackend, DialerConfig, DialerConsole, DialerError, OperatorIdentity,
    RestBackend, SessionGuard,
};

fn backend_for(server: &MockServer) -> (RestBackend, DialerConfig) {
    let config = DialerConfig::new(server.uri().parse().unwrap());
    let guard = Arc::new(SessionGuard::new(&config).unwrap());
    (RestBackend::new(guard), config)
}

fn envelope(out: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "out": out, "err": false, "log": null }))
}

#[tokio::test]
async fn test_operator_campaigns_use_assignment_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/operatori/5/campagne"))
        .and(query_param("dettagli", "true"))
        .respond_with(envelope(json!([{ "id": 3, "stato": 1 }])))
        .expect(1)
        .mount(&server)
        .await;

    let (backend, _) = backend_for(&server);
    let campaigns = backend.fetch_campaigns(CampaignScope::AssignedTo(5)).await.unwrap();

    assert_eq!(campaigns.len(), 1);
    assert!(campaigns[0].is_active());
}

#[tokio::test]
async fn test_list_catalog_reads_paged_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/liste"))
        .respond_with(envelope(json!({
            "items": [
                { "id": 10, "nome": "Roma", "stato": 1 },
                { "id": "11", "nome": "Milano", "stato": 2 }
            ],
            "total": 2
        })))
        .mount(&server)
        .await;

    let (backend, _) = backend_for(&server);
    let lists = backend.fetch_list_catalog().await.unwrap();

    let ids: Vec<_> = lists.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert!(!lists[1].is_active());
}

#[tokio::test]
async fn test_campaign_links_and_contacts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/campagne/4/liste"))
        .respond_with(envelope(json!([{ "id": 1, "campagnaId": 4, "listaId": "10" }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/liste/10/contatti"))
        .respond_with(envelope(json!([
            { "id": 1, "nome": "Anna", "cognome": "Rossi", "telefono": "+39061", "blacklist": null },
            { "id": 2, "ragioneSociale": "ACME srl", "telefono": "", "blacklist": true }
        ])))
        .mount(&server)
        .await;

    let (backend, _) = backend_for(&server);
    let links = backend.fetch_campaign_lists(4).await.unwrap();
    assert_eq!(links[0].list_id, 10);

    let contacts = backend.fetch_contacts(10).await.unwrap();
    assert_eq!(contacts[0].display_name(), "Anna Rossi");
    assert_eq!(contacts[0].phone_number(), Some("+39061"));
    assert_eq!(contacts[1].display_name(), "ACME srl");
    assert_eq!(contacts[1].phone_number(), None);
    assert!(contacts[1].is_blacklisted());
}

#[tokio::test]
#[traced_test]
async fn test_place_call_posts_provider_payload() {
    let server = MockServer::start().await;
    let (backend, config) = backend_for(&server);
    let answer_url = format!("{}/api/voice/webhook/answer", server.uri());

    Mock::given(method("POST"))
        .and(path("/api/voice/calls"))
        .and(body_partial_json(json!({
            "to": [{ "type": "phone", "number": "+39061234" }],
            "from": { "type": "phone", "number": "+390000000000" },
            "answer_url": [answer_url]
        })))
        .respond_with(envelope(json!({
            "uuid": "63f61863-4a51",
            "status": "started",
            "direction": "outbound",
            "conversation_uuid": "CON-f972836a"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = CallRequest::outbound("+39061234", &config).unwrap();
    let receipt = backend.place_call(&request).await.unwrap();

    assert_eq!(receipt.uuid.as_deref(), Some("63f61863-4a51"));
    assert_eq!(receipt.conversation_uuid.as_deref(), Some("CON-f972836a"));
    assert!(logs_contain("Voice provider accepted call to +39061234"));
}

#[tokio::test]
async fn test_rejected_envelope_surfaces_log_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/voice/calls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "out": null,
            "err": true,
            "log": "numero non valido"
        })))
        .mount(&server)
        .await;

    let (backend, config) = backend_for(&server);
    let request = CallRequest::outbound("abc", &config).unwrap();
    let result = backend.place_call(&request).await;

    assert_eq!(result, Err(DialerError::server(200, "numero non valido")));
}

#[tokio::test]
async fn test_console_over_rest_dials_first_contact() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/campagne"))
        .respond_with(envelope(json!([{ "id": 1, "stato": 1 }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/campagne/1/liste"))
        .respond_with(envelope(json!([{ "listaId": 10 }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/liste"))
        .respond_with(envelope(json!({ "items": [{ "id": 10, "stato": 1 }] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/liste/10/contatti"))
        .respond_with(envelope(json!([{ "id": 7, "telefono": "+39067" }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/voice/calls"))
        .respond_with(envelope(json!({ "uuid": "u-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let console = DialerConsole::connect(DialerConfig::new(server.uri().parse()?))?;
    console
        .navigator()
        .load_active_campaigns(&OperatorIdentity::admin(1))
        .await?;
    let receipt = console.dialer().dial_current().await?;

    assert_eq!(receipt.uuid.as_deref(), Some("u-1"));
    let snapshot = console.snapshot();
    assert!(snapshot.called.contains("+39067"));
    assert!(snapshot.current_contact.is_none());
    Ok(())
}
