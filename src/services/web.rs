//! Axum HTTP surface for relay and switch devices.
//!
//! Relay device routes:
//! - GET `/relay_getconfig` - Settings document
//! - POST `/sr_setconfig` - Apply and save a settings document
//! - POST `/relay_switch` - Toggle a local relay `{"relay": 0}`
//! - GET `/relay_getstate` - Live relay states
//!
//! Switch device routes:
//! - GET `/switch_getconfig` - Settings document
//! - POST `/sr_setconfig` - Apply and save a settings document
//! - POST `/remote_switch` - Toggle a remote relay `{"relay": 0}`

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use log::info;
use tower_http::cors::{Any, CorsLayer};

use crate::config::WebConfig;

use super::http_handler::{ApiResult, HttpApiHandler};
use super::shared::{RelayDevice, SharedDevice, SwitchDevice};

// ============================================================================
// Relay Handlers
// ============================================================================

async fn relay_get_config<D: RelayDevice + Send + 'static>(
    State(handler): State<HttpApiHandler<D>>,
) -> ApiResult {
    handler.handle_relay_get_config()
}

async fn relay_set_config<D: RelayDevice + Send + 'static>(
    State(handler): State<HttpApiHandler<D>>,
    body: Bytes,
) -> ApiResult {
    handler.handle_relay_set_config(&body)
}

async fn relay_switch<D: RelayDevice + Send + 'static>(
    State(handler): State<HttpApiHandler<D>>,
    body: Bytes,
) -> ApiResult {
    handler.handle_relay_switch(&body)
}

async fn relay_get_state<D: RelayDevice + Send + 'static>(
    State(handler): State<HttpApiHandler<D>>,
) -> ApiResult {
    handler.handle_relay_get_state()
}

// ============================================================================
// Switch Handlers
// ============================================================================

async fn switch_get_config<D: SwitchDevice + Send + 'static>(
    State(handler): State<HttpApiHandler<D>>,
) -> ApiResult {
    handler.handle_switch_get_config()
}

async fn switch_set_config<D: SwitchDevice + Send + 'static>(
    State(handler): State<HttpApiHandler<D>>,
    body: Bytes,
) -> ApiResult {
    handler.handle_switch_set_config(&body)
}

async fn remote_switch<D: SwitchDevice + Send + 'static>(
    State(handler): State<HttpApiHandler<D>>,
    body: Bytes,
) -> ApiResult {
    handler.handle_remote_switch(&body)
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            cors_permissive: true,
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

fn finish(router: Router, config: &WebServerConfig) -> Router {
    let router = router.fallback(not_found);
    if config.cors_permissive {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Build the router of a relay device.
pub fn relay_router<D: RelayDevice + Send + 'static>(
    device: Arc<SharedDevice<D>>,
    config: &WebServerConfig,
) -> Router {
    let router = Router::new()
        .route("/relay_getconfig", get(relay_get_config::<D>))
        .route("/sr_setconfig", post(relay_set_config::<D>))
        .route("/relay_switch", post(relay_switch::<D>))
        .route("/relay_getstate", get(relay_get_state::<D>))
        .with_state(HttpApiHandler::new(device));
    finish(router, config)
}

/// Build the router of a switch device.
pub fn switch_router<D: SwitchDevice + Send + 'static>(
    device: Arc<SharedDevice<D>>,
    config: &WebServerConfig,
) -> Router {
    let router = Router::new()
        .route("/switch_getconfig", get(switch_get_config::<D>))
        .route("/sr_setconfig", post(switch_set_config::<D>))
        .route("/remote_switch", post(remote_switch::<D>))
        .with_state(HttpApiHandler::new(device));
    finish(router, config)
}

/// Serve `router` until the process ends.
pub async fn serve(router: Router, config: &WebServerConfig) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("web server listening on http://{}", config.addr);
    axum::serve(listener, router).await
}
