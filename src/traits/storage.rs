//! Settings persistence trait.
//!
//! Persistence is synchronous and best-effort: the controllers log a failed
//! save and carry on with their in-memory state, which stays authoritative.

use crate::settings::{RelaySettings, SwitchSettings};

/// Load/save pair for relay and switch settings documents.
///
/// Each document lives under its own configurable identifier (a file path,
/// an NVS key, ...). `Ok(None)` from a load means nothing has been stored
/// yet, which is not an error.
pub trait SettingsStore {
    /// Error type for storage operations.
    type Error: core::fmt::Debug;

    /// Load the relay module document.
    fn load_relay_settings(&mut self) -> Result<Option<RelaySettings>, Self::Error>;

    /// Persist the relay module document.
    fn save_relay_settings(&mut self, settings: &RelaySettings) -> Result<(), Self::Error>;

    /// Load the switch module document.
    fn load_switch_settings(&mut self) -> Result<Option<SwitchSettings>, Self::Error>;

    /// Persist the switch module document.
    fn save_switch_settings(&mut self, settings: &SwitchSettings) -> Result<(), Self::Error>;
}
