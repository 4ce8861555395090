//! HTTP request handling shared by the axum and ESP-IDF servers.
//!
//! `HttpApiHandler` holds the business logic of every route. The
//! platform servers call it with the raw request body and translate the
//! [`ApiResult`] into their own response type.
//!
//! # Routes
//!
//! | Route | Device | Body | Reply |
//! |-------|--------|------|-------|
//! | `GET /relay_getconfig` | relay | - | settings document |
//! | `GET /switch_getconfig` | switch | - | settings document |
//! | `POST /sr_setconfig` | both | settings document | `Save settings...` |
//! | `POST /relay_switch` | relay | `{"relay":0}` | `on` / `off` |
//! | `GET /relay_getstate` | relay | - | `{"relays":[...]}` |
//! | `POST /remote_switch` | switch | `{"relay":0}` | `ok` / `no` |

use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::settings::{json, SettingsDocument};

use super::shared::{RelayDevice, SharedDevice, SwitchDevice};

/// Reply body of a successful `POST /sr_setconfig`.
pub const SAVE_SETTINGS_REPLY: &str = "Save settings...";

// ============================================================================
// API Response Types
// ============================================================================

/// Result of an API operation.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiResult {
    /// Success with JSON body.
    Ok(String),
    /// Success with plain text body.
    Text(String),
    /// Error with status code and message.
    Error(u16, String),
}

impl ApiResult {
    /// Create a JSON success response.
    pub fn ok(json: impl Into<String>) -> Self {
        Self::Ok(json.into())
    }

    /// Create a plain text success response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(body.into())
    }

    /// Create an error response.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::Error(status, message.into())
    }

    /// Create a bad request (400) error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Error(400, message.into())
    }

    /// Check if this is a success response.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Error(..))
    }

    /// Response body.
    pub fn body(&self) -> &str {
        match self {
            Self::Ok(body) | Self::Text(body) | Self::Error(_, body) => body,
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        match self {
            Self::Ok(_) | Self::Text(_) => 200,
            Self::Error(status, _) => *status,
        }
    }

    /// Content type header value.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Ok(_) => "application/json",
            Self::Text(_) | Self::Error(..) => "text/plain",
        }
    }

    fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::Ok(body),
            Err(e) => Self::error(500, e.to_string()),
        }
    }
}

// Axum integration: allow ApiResult to be returned directly from handlers
#[cfg(feature = "web")]
impl axum::response::IntoResponse for ApiResult {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{header, StatusCode};

        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let content_type = self.content_type();
        let body = match self {
            Self::Ok(body) | Self::Text(body) | Self::Error(_, body) => body,
        };

        (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
    }
}

// ============================================================================
// Request Parsing
// ============================================================================

/// Relay index from a `{"relay": n}` body. The index may be a number or a
/// numeric string.
pub fn parse_relay_index(body: &[u8]) -> Option<usize> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("relay")? {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ============================================================================
// HTTP API Handler
// ============================================================================

/// Route logic for one shared device.
pub struct HttpApiHandler<D> {
    device: Arc<SharedDevice<D>>,
}

impl<D> Clone for HttpApiHandler<D> {
    fn clone(&self) -> Self {
        Self {
            device: Arc::clone(&self.device),
        }
    }
}

impl<D> HttpApiHandler<D> {
    /// Create a handler for `device`.
    pub fn new(device: Arc<SharedDevice<D>>) -> Self {
        Self { device }
    }

    /// Shared device.
    pub fn device(&self) -> &Arc<SharedDevice<D>> {
        &self.device
    }
}

impl<D: RelayDevice> HttpApiHandler<D> {
    /// GET /relay_getconfig
    pub fn handle_relay_get_config(&self) -> ApiResult {
        let settings = self.device.with_device(|d| d.settings());
        match json::relay_to_vec(&settings) {
            Ok(bytes) => ApiResult::ok(String::from_utf8_lossy(&bytes)),
            Err(e) => ApiResult::error(500, e.to_string()),
        }
    }

    /// POST /sr_setconfig on a relay device.
    pub fn handle_relay_set_config(&self, body: &[u8]) -> ApiResult {
        match json::document_from_slice(body) {
            Ok(SettingsDocument::Relay(settings)) => {
                info!("relay settings received");
                saved_reply(self.device.with_device(|d| d.apply_settings(&settings)))
            }
            Ok(SettingsDocument::Switch(_)) => {
                ApiResult::bad_request("settings are for a switch module")
            }
            Err(e) => ApiResult::bad_request(e.to_string()),
        }
    }

    /// POST /relay_switch
    ///
    /// A missing body or index, or an index out of range, replies `off`.
    pub fn handle_relay_switch(&self, body: &[u8]) -> ApiResult {
        let state = parse_relay_index(body)
            .and_then(|index| self.device.with_device(|d| d.switch_relay(index)))
            .unwrap_or_default();
        ApiResult::text(state.as_str())
    }

    /// GET /relay_getstate
    pub fn handle_relay_get_state(&self) -> ApiResult {
        ApiResult::json(&self.device.with_device(|d| d.state_report()))
    }
}

impl<D: SwitchDevice> HttpApiHandler<D> {
    /// GET /switch_getconfig
    pub fn handle_switch_get_config(&self) -> ApiResult {
        let settings = self.device.with_device(|d| d.settings());
        match json::switch_to_vec(&settings) {
            Ok(bytes) => ApiResult::ok(String::from_utf8_lossy(&bytes)),
            Err(e) => ApiResult::error(500, e.to_string()),
        }
    }

    /// POST /sr_setconfig on a switch device.
    pub fn handle_switch_set_config(&self, body: &[u8]) -> ApiResult {
        match json::document_from_slice(body) {
            Ok(SettingsDocument::Switch(settings)) => {
                info!("switch settings received");
                saved_reply(self.device.with_device(|d| d.apply_settings(&settings)))
            }
            Ok(SettingsDocument::Relay(_)) => {
                ApiResult::bad_request("settings are for a relay module")
            }
            Err(e) => ApiResult::bad_request(e.to_string()),
        }
    }

    /// POST /remote_switch
    ///
    /// Replies `ok` once a command was attempted, whether or not it was sent
    /// (the buzzer reports failures). A missing body or index replies `no`.
    pub fn handle_remote_switch(&self, body: &[u8]) -> ApiResult {
        let Some(index) = parse_relay_index(body) else {
            return ApiResult::text("no");
        };
        if let Err(e) = self.device.with_device(|d| d.switch_relay(index)) {
            debug!("remote switch {}: {}", index, e);
        }
        ApiResult::text("ok")
    }
}

fn saved_reply(saved: bool) -> ApiResult {
    if saved {
        ApiResult::text(SAVE_SETTINGS_REPLY)
    } else {
        ApiResult::error(500, "settings applied but not saved")
    }
}

// ============================================================================
// Tests
// ============================================================================
