//! Shared device wrapper for the host loop and the HTTP handlers.
//!
//! `SharedDevice` puts one relay or switch controller behind a `Mutex`, so the
//! tick loop and the HTTP server threads never touch it concurrently. Every
//! core operation therefore stays serialized, exactly as on a single-threaded
//! device loop.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sr_control::services::SharedDevice;
//!
//! let shared = Arc::new(SharedDevice::new(relays));
//!
//! // Host loop
//! shared.tick();
//!
//! // HTTP handler
//! let report = shared.with_device(|d| d.state_report());
//! ```

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use crate::config::log_level;
use crate::protocol::RelayState;
use crate::relay::RelayControl;
use crate::settings::{RelaySettings, StateReport, SwitchSettings};
use crate::switch::{SendError, SwitchControl};
use crate::traits::{ButtonInput, Feedback, RelayOutput, SettingsStore, Transport};

// ============================================================================
// Device Traits
// ============================================================================

/// Anything driven by the host loop.
pub trait Device {
    /// Run one loop iteration.
    fn tick(&mut self, now_ms: u64);
}

/// What the HTTP surface needs from a relay device.
pub trait RelayDevice: Device {
    /// Current settings document.
    fn settings(&self) -> RelaySettings;

    /// Load and persist a settings document. Returns `false` if the save
    /// failed (the new settings are still in effect).
    fn apply_settings(&mut self, settings: &RelaySettings) -> bool;

    /// Toggle a local relay.
    fn switch_relay(&mut self, index: usize) -> Option<RelayState>;

    /// Live relay states.
    fn state_report(&self) -> StateReport;
}

/// What the HTTP surface needs from a switch device.
pub trait SwitchDevice: Device {
    /// Current settings document.
    fn settings(&self) -> SwitchSettings;

    /// Load and persist a settings document. Returns `false` if the save
    /// failed (the new settings are still in effect).
    fn apply_settings(&mut self, settings: &SwitchSettings) -> bool;

    /// Toggle a remote relay.
    fn switch_relay(&mut self, index: usize) -> Result<(), SendError>;
}

impl<O, T, S, F, B> Device for RelayControl<O, T, S, F, B>
where
    O: RelayOutput,
    T: Transport,
    S: SettingsStore,
    F: Feedback,
    B: ButtonInput,
{
    fn tick(&mut self, now_ms: u64) {
        RelayControl::tick(self, now_ms);
    }
}

impl<O, T, S, F, B> RelayDevice for RelayControl<O, T, S, F, B>
where
    O: RelayOutput,
    T: Transport,
    S: SettingsStore,
    F: Feedback,
    B: ButtonInput,
{
    fn settings(&self) -> RelaySettings {
        RelayControl::settings(self)
    }

    fn apply_settings(&mut self, settings: &RelaySettings) -> bool {
        match RelayControl::apply_settings(self, settings) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("relay settings save failed: {:?}", e);
                false
            }
        }
    }

    fn switch_relay(&mut self, index: usize) -> Option<RelayState> {
        RelayControl::switch_relay(self, index)
    }

    fn state_report(&self) -> StateReport {
        RelayControl::state_report(self)
    }
}

impl<T, S, F, B> Device for SwitchControl<T, S, F, B>
where
    T: Transport,
    S: SettingsStore,
    F: Feedback,
    B: ButtonInput,
{
    fn tick(&mut self, now_ms: u64) {
        SwitchControl::tick(self, now_ms);
    }
}

impl<T, S, F, B> SwitchDevice for SwitchControl<T, S, F, B>
where
    T: Transport,
    S: SettingsStore,
    F: Feedback,
    B: ButtonInput,
{
    fn settings(&self) -> SwitchSettings {
        SwitchControl::settings(self)
    }

    fn apply_settings(&mut self, settings: &SwitchSettings) -> bool {
        match SwitchControl::apply_settings(self, settings) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("switch settings save failed: {:?}", e);
                false
            }
        }
    }

    fn switch_relay(&mut self, index: usize) -> Result<(), SendError> {
        SwitchControl::switch_relay(self, index)
    }
}

// ============================================================================
// Shared Device
// ============================================================================

/// A device shared between the host loop and the HTTP server.
///
/// All timestamps come from the same `start_time`, so button debouncing and
/// the discovery timer see one monotonic clock no matter which thread ticks.
pub struct SharedDevice<D> {
    device: Mutex<D>,
    start_time: Instant,
}

impl<D> SharedDevice<D> {
    /// Wrap a device. The clock starts now.
    pub fn new(device: D) -> Self {
        Self {
            device: Mutex::new(device),
            start_time: Instant::now(),
        }
    }

    /// Milliseconds since the wrapper was created.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Time base of [`now_ms`](Self::now_ms).
    #[inline]
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Turn log output on or off. The switch is the logger's max level, so
    /// it applies to the whole process.
    pub fn set_log_enabled(&self, enabled: bool) {
        log::set_max_level(log_level(enabled));
    }

    /// Whether log output is on.
    pub fn log_enabled(&self) -> bool {
        log::max_level() != log::LevelFilter::Off
    }

    /// Run `f` with exclusive access to the device.
    ///
    /// A panic in an earlier holder does not lock the device out; its state
    /// is still used.
    pub fn with_device<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut D) -> R,
    {
        let mut guard = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl<D: Device> SharedDevice<D> {
    /// Run one loop iteration at the current time.
    pub fn tick(&self) {
        let now_ms = self.now_ms();
        self.with_device(|device| device.tick(now_ms));
    }
}
