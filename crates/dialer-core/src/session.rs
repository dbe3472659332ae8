//! Session-guarded HTTP access
//!
//! Every request the console sends goes through [`SessionGuard::execute`].
//! The credential is a cookie held by the client's cookie store; when it
//! expires the backend answers `401 Unauthorized`. The guard then renews the
//! session with `POST /api/auth/refresh` and re-issues the original request
//! once.
//!
//! # Refresh deduplication
//!
//! Many requests can hit an expired session at the same moment (the navigator
//! fetches links and the list catalog back to back, the dialer may be placing
//! a call). Only one refresh call may reach the backend. The guard routes all
//! renewals through a [`SingleFlight`] under one key: the first caller starts
//! the refresh, later callers join it, and the registration clears when it
//! settles so the next expiry starts a new one.
//!
//! ```text
//!  caller A ──401──► refresh (starts) ─────┐
//!  caller B ──401──► refresh (joins)  ─────┼──► settle ──► A, B retry once
//!  caller C ──401──► refresh (joins)  ─────┘
//! ```
//!
//! If the refresh fails every waiter gets [`DialerError::SessionExpired`] and
//! a [`SessionEvent::Expired`] is broadcast once.
//!
//! Requests under `/api/auth/` are never refreshed: a 401 from the login or
//! refresh endpoints is returned to the caller as is.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::envelope::read_envelope;
use crate::api::model::OperatorIdentity;
use crate::config::DialerConfig;
use crate::error::{DialerError, DialerResult};
use crate::events::SessionEvent;
use crate::single_flight::SingleFlight;

const AUTH_PATH_PREFIX: &str = "/api/auth/";
const REFRESH_PATH: &str = "/api/auth/refresh";
const LOGIN_PATH: &str = "/api/auth/login";
const SESSION_PATH: &str = "/api/auth/session";
const LOGOUT_PATH: &str = "/api/auth/logout";

const REFRESH_KEY: &str = "session-refresh";

/// A request that can be issued more than once
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path and query relative to the base URL, e.g. `/api/liste`
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::GET, path: path.into(), body: None }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self { method: Method::POST, path: path.into(), body: None }
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Whether this request belongs to the authentication flow itself
    pub fn is_auth_flow(&self) -> bool {
        self.path.starts_with(AUTH_PATH_PREFIX)
    }
}

pub struct SessionGuard {
    http: reqwest::Client,
    base_url: Url,
    refresh: SingleFlight<&'static str, Result<(), String>>,
    refreshes: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionGuard {
    pub fn new(config: &DialerConfig) -> DialerResult<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DialerError::config(format!("failed to build HTTP client: {}", e)))?;
        let (events, _) = broadcast::channel(config.event_buffer);

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            refresh: SingleFlight::new(),
            refreshes: AtomicU64::new(0),
            events,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Number of refresh calls this guard has sent
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.in_flight(&REFRESH_KEY)
    }

    /// Issue `request`, renewing the session once if it has expired.
    ///
    /// The returned response may still carry an error status; only a failed
    /// renewal turns into [`DialerError::SessionExpired`].
    pub async fn execute(&self, request: ApiRequest) -> DialerResult<Response> {
        let response = self.send_once(&request).await?;
        if response.status() != StatusCode::UNAUTHORIZED || request.is_auth_flow() {
            return Ok(response);
        }

        debug!("{} {} returned 401, renewing session", request.method, request.path);
        self.refresh().await?;
        self.send_once(&request).await
    }

    /// Execute `request` and decode the envelope's `out` payload
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> DialerResult<Option<T>> {
        let response = self.execute(request).await?;
        read_envelope(response).await
    }

    /// Renew the session, sharing an in-flight renewal if there is one
    pub async fn refresh(&self) -> DialerResult<()> {
        let url = self.url_for(REFRESH_PATH)?;
        let http = self.http.clone();
        let events = self.events.clone();
        let refreshes = &self.refreshes;

        let outcome = self
            .refresh
            .run(REFRESH_KEY, move || {
                refreshes.fetch_add(1, Ordering::SeqCst);
                info!("Session expired, sending refresh");
                async move {
                    let outcome = match http.post(url).send().await {
                        Ok(response) if response.status().is_success() => Ok(()),
                        Ok(response) => Err(format!("refresh rejected with HTTP {}", response.status().as_u16())),
                        Err(e) => Err(format!("refresh request failed: {}", e)),
                    };
                    match &outcome {
                        Ok(()) => {
                            info!("Session refreshed");
                            let _ = events.send(SessionEvent::Refreshed);
                        }
                        Err(reason) => {
                            warn!("Session could not be renewed: {}", reason);
                            let _ = events.send(SessionEvent::Expired { reason: reason.clone() });
                        }
                    }
                    outcome
                }
            })
            .await;

        outcome.map_err(|_| DialerError::SessionExpired)
    }

    /// Authenticate with username and password; the session cookie is kept
    /// by the client for every later request.
    pub async fn login(&self, username: &str, password: &str) -> DialerResult<OperatorIdentity> {
        let request = ApiRequest::post(LOGIN_PATH).with_json(serde_json::json!({
            "username": username,
            "password": password,
        }));
        let identity: OperatorIdentity = self
            .fetch(request)
            .await?
            .ok_or_else(|| DialerError::InvalidResponse("login returned no user".to_string()))?;

        info!("Logged in as user {}", identity.user_id);
        let _ = self.events.send(SessionEvent::LoggedIn { user_id: identity.user_id });
        Ok(identity)
    }

    /// The operator bound to the current session
    pub async fn current_user(&self) -> DialerResult<OperatorIdentity> {
        self.fetch(ApiRequest::get(SESSION_PATH))
            .await?
            .ok_or_else(|| DialerError::InvalidResponse("session returned no user".to_string()))
    }

    pub async fn logout(&self) -> DialerResult<()> {
        let response = self.send_once(&ApiRequest::post(LOGOUT_PATH)).await?;
        read_envelope::<serde_json::Value>(response).await?;
        let _ = self.events.send(SessionEvent::LoggedOut);
        Ok(())
    }

    fn url_for(&self, path: &str) -> DialerResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn send_once(&self, request: &ApiRequest) -> DialerResult<Response> {
        let url = self.url_for(&request.path)?;
        let mut builder = self.http.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        debug!("{} {} -> {}", request.method, request.path, response.status());
        Ok(response)
    }
}
