//! Wire and domain types for campaigns, lists, contacts and calls
//!
//! The backend speaks Italian field names (`stato`, `dataFine`, `telefono`,
//! ...); the types here rename them to English on the Rust side and normalise
//! the loose parts of the payloads (numeric-or-string identifiers, nullable
//! flags, blank phone numbers).

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::DialerConfig;
use crate::error::DialerResult;

/// Backend identifier for campaigns, lists, contacts and operators
pub type RecordId = i64;

/// Lifecycle status shared by campaigns and lists.
///
/// Sent as an integer code on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RecordStatus {
    Draft,
    Active,
    Closed,
    /// A code this client does not know about; never treated as active
    Other(i64),
}

impl From<i64> for RecordStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Draft,
            1 => Self::Active,
            2 => Self::Closed,
            other => Self::Other(other),
        }
    }
}

impl From<RecordStatus> for i64 {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Draft => 0,
            RecordStatus::Active => 1,
            RecordStatus::Closed => 2,
            RecordStatus::Other(code) => code,
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Active => write!(f, "active"),
            Self::Closed => write!(f, "closed"),
            Self::Other(code) => write!(f, "status {}", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(deserialize_with = "lenient_id")]
    pub id: RecordId,
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(rename = "stato")]
    pub status: RecordStatus,
    #[serde(rename = "dataInizio", default)]
    pub start_date: Option<NaiveDate>,
    /// Campaigns without an end date never expire
    #[serde(rename = "dataFine", default)]
    pub end_date: Option<NaiveDate>,
}

impl Campaign {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("campaign #{}", self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactList {
    #[serde(deserialize_with = "lenient_id")]
    pub id: RecordId,
    #[serde(rename = "nome", default)]
    pub name: Option<String>,
    #[serde(rename = "stato")]
    pub status: RecordStatus,
    #[serde(rename = "contattiCount", default)]
    pub contact_count: Option<u64>,
}

impl ContactList {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("list #{}", self.id))
    }
}

/// Campaign-to-list association record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignListLink {
    #[serde(default, deserialize_with = "lenient_opt_id")]
    pub id: Option<RecordId>,
    #[serde(rename = "campagnaId", default, deserialize_with = "lenient_opt_id")]
    pub campaign_id: Option<RecordId>,
    #[serde(rename = "listaId", deserialize_with = "lenient_id")]
    pub list_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(deserialize_with = "lenient_id")]
    pub id: RecordId,
    #[serde(rename = "nome", default)]
    pub first_name: Option<String>,
    #[serde(rename = "cognome", default)]
    pub last_name: Option<String>,
    #[serde(rename = "ragioneSociale", default)]
    pub company: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub blacklist: Option<bool>,
}

impl Contact {
    pub fn new(id: RecordId, phone: Option<&str>) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            company: None,
            phone: phone.map(str::to_string),
            blacklist: None,
        }
    }

    pub fn blacklisted(mut self) -> Self {
        self.blacklist = Some(true);
        self
    }

    /// Phone number, if present and not blank
    pub fn phone_number(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    pub fn is_blacklisted(&self) -> bool {
        self.blacklist.unwrap_or(false)
    }

    pub fn display_name(&self) -> String {
        let person = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !person.is_empty() {
            person
        } else if let Some(company) = &self.company {
            company.clone()
        } else {
            format!("contact #{}", self.id)
        }
    }
}

/// Operator role as reported by the auth endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Other(String),
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        if role.eq_ignore_ascii_case("ADMIN") {
            Self::Admin
        } else {
            Self::Other(role)
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => "ADMIN".to_string(),
            Role::Other(role) => role,
        }
    }
}

/// The authenticated operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorIdentity {
    #[serde(rename = "userId", deserialize_with = "lenient_id")]
    pub user_id: RecordId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "ruolo")]
    pub role: Role,
}

impl OperatorIdentity {
    pub fn admin(user_id: RecordId) -> Self {
        Self { user_id, username: None, role: Role::Admin }
    }

    pub fn operator(user_id: RecordId) -> Self {
        Self { user_id, username: None, role: Role::Other("OPERATORE".to_string()) }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Which campaigns an operator is allowed to see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignScope {
    /// Every campaign (administrators)
    All,
    /// Only the campaigns assigned to this operator
    AssignedTo(RecordId),
}

impl CampaignScope {
    pub fn for_identity(identity: &OperatorIdentity) -> Self {
        if identity.is_admin() {
            Self::All
        } else {
            Self::AssignedTo(identity.user_id)
        }
    }
}

/// Paginated collection as returned by catalog endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Page { items: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Self::Page { items } | Self::Bare(items) => items,
        }
    }
}

/// Party of an outbound call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEndpoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
}

impl CallEndpoint {
    pub fn phone(number: impl Into<String>) -> Self {
        Self { kind: "phone".to_string(), number: number.into() }
    }
}

/// Body of `POST /api/voice/calls`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub to: Vec<CallEndpoint>,
    pub from: CallEndpoint,
    pub answer_url: Vec<String>,
    pub event_url: Vec<String>,
}

impl CallRequest {
    /// Outbound call from the configured origin number to `number`
    pub fn outbound(number: &str, config: &DialerConfig) -> DialerResult<Self> {
        Ok(Self {
            to: vec![CallEndpoint::phone(number)],
            from: CallEndpoint::phone(config.origin_number.clone()),
            answer_url: vec![config.answer_url()?.to_string()],
            event_url: vec![config.event_url()?.to_string()],
        })
    }

    pub fn destination(&self) -> &str {
        self.to.first().map(|e| e.number.as_str()).unwrap_or_default()
    }
}

/// What the voice provider reported back for a created call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReceipt {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(rename = "conversationUuid", alias = "conversation_uuid", default)]
    pub conversation_uuid: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

fn parse_id<E: serde::de::Error>(raw: NumberOrString) -> Result<RecordId, E> {
    match raw {
        NumberOrString::Number(id) => Ok(id),
        NumberOrString::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| E::custom(format!("invalid identifier '{}'", text))),
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RecordId, D::Error> {
    parse_id(NumberOrString::deserialize(deserializer)?)
}

fn lenient_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RecordId>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(raw) => parse_id(raw).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_campaign_decodes_backend_fields() {
        let campaign: Campaign = serde_json::from_value(json!({
            "id": 7,
            "nome": "Spring renewals",
            "stato": 1,
            "dataInizio": "2024-01-15",
            "dataFine": "2024-05-01",
            "tipo": "outbound"
        }))
        .unwrap();

        assert!(campaign.is_active());
        assert_eq!(campaign.end_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(campaign.display_name(), "Spring renewals");
    }

    #[test]
    fn test_unknown_status_code_is_not_active() {
        let list: ContactList = serde_json::from_value(json!({ "id": 1, "stato": 9 })).unwrap();
        assert_eq!(list.status, RecordStatus::Other(9));
        assert!(!list.is_active());
    }

    #[test]
    fn test_link_accepts_string_identifiers() {
        let link: CampaignListLink =
            serde_json::from_value(json!({ "id": "3", "campagnaId": 1, "listaId": "42" })).unwrap();
        assert_eq!(link.list_id, 42);
        assert_eq!(link.id, Some(3));
    }

    #[test]
    fn test_contact_with_blank_phone_has_no_number() {
        let contact: Contact =
            serde_json::from_value(json!({ "id": 1, "telefono": "  ", "blacklist": null })).unwrap();
        assert_eq!(contact.phone_number(), None);
        assert!(!contact.is_blacklisted());
    }

    #[test]
    fn test_scope_follows_role() {
        assert_eq!(CampaignScope::for_identity(&OperatorIdentity::admin(1)), CampaignScope::All);
        assert_eq!(
            CampaignScope::for_identity(&OperatorIdentity::operator(5)),
            CampaignScope::AssignedTo(5)
        );
    }

    #[test]
    fn test_call_request_wire_shape() {
        let config = DialerConfig::new("https://crm.example.com".parse().unwrap());
        let request = CallRequest::outbound("+39061234", &config).unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["to"][0]["type"], "phone");
        assert_eq!(value["to"][0]["number"], "+39061234");
        assert_eq!(value["from"]["type"], "phone");
        assert_eq!(value["from"]["number"], "+390000000000");
        assert_eq!(value["answer_url"][0], "https://crm.example.com/api/voice/webhook/answer");
        assert_eq!(value["event_url"][0], "https://crm.example.com/api/voice/webhook/event");
        assert_eq!(request.destination(), "+39061234");
    }

    #[test]
    fn test_listing_accepts_page_and_bare_array() {
        let page: Listing<ContactList> =
            serde_json::from_value(json!({ "items": [{ "id": 1, "stato": 1 }], "total": 1 })).unwrap();
        assert_eq!(page.into_items().len(), 1);

        let bare: Listing<ContactList> = serde_json::from_value(json!([{ "id": 2, "stato": 0 }])).unwrap();
        assert_eq!(bare.into_items()[0].id, 2);
    }
}
