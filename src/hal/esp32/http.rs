//! HTTP API on the ESP-IDF server.
//!
//! Same routes and replies as the axum routers in `services::web`; every
//! route forwards the raw body to [`HttpApiHandler`].
//!
//! ```ignore
//! use std::sync::Arc;
//! use sr_control::config::WebConfig;
//! use sr_control::hal::esp32::Esp32HttpServer;
//! use sr_control::services::SharedDevice;
//!
//! let shared = Arc::new(SharedDevice::new(relays));
//! let _server = Esp32HttpServer::relay(&WebConfig::default(), Arc::clone(&shared))?;
//! ```

use std::sync::Arc;

use esp_idf_hal::io::{Read, Write};
use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::EspIOError;
use log::info;

use crate::config::WebConfig;
use crate::services::{ApiResult, HttpApiHandler, RelayDevice, SharedDevice, SwitchDevice};
use crate::settings::MAX_SETTINGS_SIZE;

/// Running HTTP server. Dropping it stops the server.
pub struct Esp32HttpServer {
    _server: EspHttpServer<'static>,
}

fn read_body(req: &mut Request<&mut EspHttpConnection<'_>>) -> Result<Vec<u8>, EspIOError> {
    let mut body = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        let n = req.read(&mut chunk)?;
        if n == 0 || body.len() + n > MAX_SETTINGS_SIZE {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Ok(body)
}

fn respond(req: Request<&mut EspHttpConnection<'_>>, result: ApiResult) -> Result<(), EspIOError> {
    let headers = [("Content-Type", result.content_type())];
    let mut resp = req.into_response(result.status(), None, &headers)?;
    resp.write_all(result.body().as_bytes())?;
    Ok(())
}

fn start(config: &WebConfig) -> anyhow::Result<EspHttpServer<'static>> {
    let server_config = Configuration {
        http_port: config.port,
        ..Default::default()
    };
    let server = EspHttpServer::new(&server_config)?;
    info!("http server listening on port {}", config.port);
    Ok(server)
}

impl Esp32HttpServer {
    /// Serve the relay module routes.
    pub fn relay<D: RelayDevice + Send + 'static>(
        config: &WebConfig,
        device: Arc<SharedDevice<D>>,
    ) -> anyhow::Result<Self> {
        let mut server = start(config)?;
        let api = HttpApiHandler::new(device);

        let h = api.clone();
        server.fn_handler("/relay_getconfig", Method::Get, move |req| {
            respond(req, h.handle_relay_get_config())
        })?;

        let h = api.clone();
        server.fn_handler("/sr_setconfig", Method::Post, move |mut req| {
            let body = read_body(&mut req)?;
            respond(req, h.handle_relay_set_config(&body))
        })?;

        let h = api.clone();
        server.fn_handler("/relay_switch", Method::Post, move |mut req| {
            let body = read_body(&mut req)?;
            respond(req, h.handle_relay_switch(&body))
        })?;

        let h = api;
        server.fn_handler("/relay_getstate", Method::Get, move |req| {
            respond(req, h.handle_relay_get_state())
        })?;

        Ok(Self { _server: server })
    }

    /// Serve the switch module routes.
    pub fn switch<D: SwitchDevice + Send + 'static>(
        config: &WebConfig,
        device: Arc<SharedDevice<D>>,
    ) -> anyhow::Result<Self> {
        let mut server = start(config)?;
        let api = HttpApiHandler::new(device);

        let h = api.clone();
        server.fn_handler("/switch_getconfig", Method::Get, move |req| {
            respond(req, h.handle_switch_get_config())
        })?;

        let h = api.clone();
        server.fn_handler("/sr_setconfig", Method::Post, move |mut req| {
            let body = read_body(&mut req)?;
            respond(req, h.handle_switch_set_config(&body))
        })?;

        let h = api;
        server.fn_handler("/remote_switch", Method::Post, move |mut req| {
            let body = read_body(&mut req)?;
            respond(req, h.handle_remote_switch(&body))
        })?;

        Ok(Self { _server: server })
    }
}
