//! Concrete implementations of the traits in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: test doubles for desktop development
//! - `buzzer`: beep sequencing shared by buzzer drivers, and a logging `Feedback`
//! - `host` (feature `std`): `UdpTransport`
//! - `file_store` (feature `std`): `JsonFileStore`
//! - `digital` (feature `embedded-hal`): relays and buttons on `embedded-hal` pins
//! - `esp32` (feature `esp32`): ESP-IDF clock, buzzer, NVS, WiFi, HTTP

pub mod mock;

mod buzzer;

#[cfg(feature = "std")]
mod file_store;
#[cfg(feature = "std")]
mod host;

#[cfg(feature = "embedded-hal")]
mod digital;

#[cfg(feature = "esp32")]
pub mod esp32;

pub use buzzer::{BeepSequencer, LogFeedback};
pub use mock::*;

#[cfg(feature = "std")]
pub use file_store::{FileStoreError, JsonFileStore};
#[cfg(feature = "std")]
pub use host::UdpTransport;

#[cfg(feature = "embedded-hal")]
pub use digital::{InputPinButton, OutputPinRelay};

#[cfg(feature = "esp32")]
pub use esp32::*;
