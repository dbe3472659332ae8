//! Response envelope decoding
//!
//! Backend handlers answer with `{ "out": ..., "err": bool, "log": string }`.
//! Some failures (proxies, auth filters) come back as a raw body with just an
//! HTTP status, so the decoder falls back to `HTTP <status>` when there is no
//! envelope to read a message from.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DialerError, DialerResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "Option::default")]
    pub out: Option<T>,
    #[serde(default)]
    pub err: Option<bool>,
    #[serde(default)]
    pub log: Option<String>,
}

impl<T> Envelope<T> {
    pub fn is_error(&self) -> bool {
        self.err.unwrap_or(false)
    }
}

/// Turn an HTTP response into the envelope's `out` payload.
///
/// A non-2xx status or `err: true` becomes [`DialerError::Server`] carrying the
/// envelope's `log` message.
pub async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> DialerResult<Option<T>> {
    let status = response.status().as_u16();
    let success = response.status().is_success();
    let body = response.bytes().await?;
    decode_envelope(status, success, &body)
}

pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    success: bool,
    body: &[u8],
) -> DialerResult<Option<T>> {
    if !success {
        let message = serde_json::from_slice::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|envelope| envelope.log)
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Err(DialerError::server(status, message));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let envelope: Envelope<T> = serde_json::from_slice(body)?;
    if envelope.is_error() {
        let message = envelope.log.unwrap_or_else(|| "request rejected".to_string());
        return Err(DialerError::server(status, message));
    }
    Ok(envelope.out)
}
