//! # sr-control
//!
//! Firmware core for small WiFi relay and switch modules that find and
//! drive each other over a UDP broadcast protocol.
//!
//! ## Features
//!
//! - **Relay modules**: named outputs switched by UDP commands, local
//!   buttons, or the HTTP API, with optional state restore after reboot
//! - **Switch modules**: buttons bound to remote relays by name, with
//!   periodic broadcast discovery and per-relay address resolution
//! - **Button handling**: debounce, click, double click, long click and
//!   click series for push buttons and toggle switches
//! - **Settings**: one JSON document per role, edited over HTTP and kept in
//!   a file or in NVS
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - hardware, network, and storage abstractions
//! - `protocol` - UDP wire envelope
//! - `button` - debounce and click detection
//! - `relay` / `switch` - the two device controllers
//! - `settings` / `config` - persisted documents and build-time defaults
//! - `hal` - concrete implementations (mock, host, embedded-hal, esp32)
//! - `services` - shared device wrapper and HTTP API (std)
//!
//! ## Example
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use sr_control::{
//!     hal::{MockFeedback, MockRelay, MockStore, MockTransport},
//!     traits::{ActiveLevel, NoButton},
//!     RelayControl, RelayState,
//! };
//!
//! let udp = MockTransport::new(Ipv4Addr::new(192, 168, 1, 40));
//! let mut relays: RelayControl<MockRelay, _, _, _, NoButton> =
//!     RelayControl::new(4, udp, MockStore::new(), MockFeedback::new());
//! relays.add_relay("relay1", MockRelay::new(), ActiveLevel::Low, "Lamp").unwrap();
//! relays.start();
//!
//! relays.switch_relay(0);
//! assert_eq!(relays.relay_state(0), RelayState::On);
//! // active low: on drives the pin low
//! assert!(!relays.relay(0).unwrap().output().high);
//!
//! // main loop
//! relays.tick(20);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Debounce, click, double click, long click and click series detection.
pub mod button;
/// Build-time defaults for desktop and ESP32.
pub mod config;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// UDP wire envelope shared by relays and switches.
pub mod protocol;
/// Relay device controller.
pub mod relay;
/// Persisted settings documents.
pub mod settings;
/// Switch device controller.
pub mod switch;
/// Core traits for hardware, network, and storage.
pub mod traits;

/// Shared device wrapper and HTTP API (std only).
#[cfg(feature = "std")]
pub mod services;

// Re-exports for convenience
pub use button::{Button, ButtonConfig, ButtonEvent, ButtonState, ContactType, InputType, LongClickMode};
pub use protocol::{Command, Envelope, RelayState, ANY_RELAY};
pub use relay::{AddError, RelayControl, RelayEntry};
pub use settings::{RelayRecord, RelaySettings, StateReport, SwitchRecord, SwitchSettings};
pub use switch::{RemoteRelay, SendError, SwitchControl};
pub use traits::{
    ActiveLevel, Beep, ButtonInput, Clock, Datagram, Feedback, Link, NoButton, RelayOutput,
    SettingsStore, StaticLink, Transport,
};
