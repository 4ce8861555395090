//! ESP32 hardware support for relay and switch modules.
//!
//! Relays and buttons use the generic `embedded-hal` adapters
//! ([`OutputPinRelay`](crate::hal::OutputPinRelay),
//! [`InputPinButton`](crate::hal::InputPinButton)) over `PinDriver`; this
//! module adds what is specific to ESP-IDF.
//!
//! | Type | Role |
//! |------|------|
//! | [`Esp32Clock`] | `Clock` from the high resolution timer |
//! | [`Esp32Buzzer`] | non-blocking beep `Feedback` |
//! | [`EspNvsStore`] | `SettingsStore` in the NVS partition |
//! | [`Esp32Wifi`] | station `Link` (feature `wifi`) |
//! | [`Esp32HttpServer`] | HTTP API (feature `wifi`) |

mod buzzer;
mod clock;
mod nvs_store;

pub use buzzer::Esp32Buzzer;
pub use clock::Esp32Clock;
pub use nvs_store::{EspNvsStore, NvsStoreError, NVS_NAMESPACE};

#[cfg(feature = "wifi")]
mod http;
#[cfg(feature = "wifi")]
mod wifi;
#[cfg(feature = "wifi")]
pub use http::Esp32HttpServer;
#[cfg(feature = "wifi")]
pub use wifi::Esp32Wifi;
