//! Host services around a relay or switch device.
//!
//! - `shared`: `SharedDevice<D>`, a mutex-guarded device shared by the host
//!   loop and the HTTP server, plus the `RelayDevice`/`SwitchDevice` traits
//! - `http_handler`: route logic shared by the axum and ESP-IDF servers
//! - `web` (feature `web`): axum routers
//!
//! # Shared Device Pattern
//!
//! ```ignore
//! use std::sync::Arc;
//! use sr_control::services::{relay_router, SharedDevice, WebServerConfig};
//!
//! let shared = Arc::new(SharedDevice::new(relays));
//! let router = relay_router(Arc::clone(&shared), &WebServerConfig::default());
//!
//! // host loop
//! loop {
//!     shared.tick();
//!     std::thread::sleep(std::time::Duration::from_millis(5));
//! }
//! ```

pub mod http_handler;
pub mod shared;

#[cfg(feature = "web")]
pub mod web;

pub use http_handler::*;
pub use shared::*;

#[cfg(feature = "web")]
pub use web::*;
