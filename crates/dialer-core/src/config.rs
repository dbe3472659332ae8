//! Configuration for the dialer console
//!
//! [`DialerConfig`] carries everything the console needs to reach the
//! backend and to place calls: the API base URL, the origin number presented
//! to the voice provider, where the provider should deliver its answer/event
//! callbacks, and the pacing policy of the auto-dial loop.
//!
//! Configuration can be built in code with the fluent `with_*` setters or
//! loaded in layers with [`DialerConfig::load`]: built-in defaults, then an
//! optional TOML file, then `DIALER_*` environment variables.
//!
//! # Examples
//!
//! ```rust
//! use dialer_core::DialerConfig;
//! use std::time::Duration;
//!
//! let config = DialerConfig::new("https://crm.example.com".parse().unwrap())
//!     .with_origin_number("+390612345678")
//!     .with_pacing_delay(Duration::from_secs(5));
//!
//! assert_eq!(config.pacing_delay(), Duration::from_secs(5));
//! assert!(config.validate().is_ok());
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DialerError, DialerResult};

/// Reference inter-call delay of the auto-dial loop
pub const DEFAULT_PACING_DELAY_MS: u64 = 2_000;

/// Environment prefix for configuration overrides (`DIALER_BASE_URL`, ...)
pub const ENV_PREFIX: &str = "DIALER";

const ANSWER_WEBHOOK_PATH: &str = "/api/voice/webhook/answer";
const EVENT_WEBHOOK_PATH: &str = "/api/voice/webhook/event";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DialerConfig {
    /// Base URL of the CRM backend (e.g. "https://crm.example.com")
    pub base_url: Url,

    /// Number presented as the caller to the voice provider
    pub origin_number: String,

    /// Base URL the voice provider calls back on.
    ///
    /// Defaults to `base_url` when unset.
    pub callback_base_url: Option<Url>,

    /// Delay between two automatic calls, in milliseconds
    pub pacing_delay_ms: u64,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Capacity of the event broadcast channel
    pub event_buffer: usize,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://127.0.0.1:8080").expect("static URL is valid"),
            origin_number: "+390000000000".to_string(),
            callback_base_url: None,
            pacing_delay_ms: DEFAULT_PACING_DELAY_MS,
            request_timeout_secs: 30,
            user_agent: format!("dialer-console/{}", env!("CARGO_PKG_VERSION")),
            event_buffer: 64,
        }
    }
}

impl DialerConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Later layers win. Environment keys use the `DIALER_` prefix, e.g.
    /// `DIALER_BASE_URL` or `DIALER_PACING_DELAY_MS`.
    pub fn load(path: Option<&Path>) -> DialerResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        tracing::debug!("Loaded dialer configuration for {}", config.base_url);
        Ok(config)
    }

    pub fn with_origin_number(mut self, number: impl Into<String>) -> Self {
        self.origin_number = number.into();
        self
    }

    pub fn with_callback_base_url(mut self, url: Url) -> Self {
        self.callback_base_url = Some(url);
        self
    }

    pub fn with_pacing_delay(mut self, delay: Duration) -> Self {
        self.pacing_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// URL the voice provider fetches call instructions from
    pub fn answer_url(&self) -> DialerResult<Url> {
        Ok(self.callback_base().join(ANSWER_WEBHOOK_PATH)?)
    }

    /// URL the voice provider posts call progress events to
    pub fn event_url(&self) -> DialerResult<Url> {
        Ok(self.callback_base().join(EVENT_WEBHOOK_PATH)?)
    }

    fn callback_base(&self) -> &Url {
        self.callback_base_url.as_ref().unwrap_or(&self.base_url)
    }

    pub fn validate(&self) -> DialerResult<()> {
        match self.base_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(DialerError::config(format!(
                    "base_url must use http or https, got '{}'",
                    other
                )))
            }
        }
        if self.origin_number.trim().is_empty() {
            return Err(DialerError::config("origin_number must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(DialerError::config("request_timeout_secs must be greater than zero"));
        }
        if self.event_buffer == 0 {
            return Err(DialerError::config("event_buffer must be greater than zero"));
        }
        Ok(())
    }
}
