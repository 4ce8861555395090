//! Switch device: discovers remote relays and sends them commands.
//!
//! [`SwitchControl`] holds a fixed-capacity set of [`RemoteRelay`] bindings.
//! A binding is *resolved* (`found`) only between a discovery response
//! naming it and the next command or discovery broadcast:
//!
//! ```text
//!                 "respond" response for name
//!   UNRESOLVED  ----------------------------->  RESOLVED
//!       ^                                          |
//!       +------ discover() / command sent ---------+
//! ```
//!
//! A command for an unresolved binding is dropped. The switch signals
//! "not found" on the buzzer and broadcasts a discovery, so the next press
//! (after the relay answers) goes through.
//!
//! # Example
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use sr_control::hal::{MockFeedback, MockStore, MockTransport};
//! use sr_control::switch::{SendError, SwitchControl};
//! use sr_control::traits::NoButton;
//!
//! let udp = MockTransport::new(Ipv4Addr::new(192, 168, 1, 10));
//! let mut switch: SwitchControl<_, _, _, NoButton> =
//!     SwitchControl::new(2, udp, MockStore::new(), MockFeedback::new());
//! switch.add_relay("relay1").unwrap();
//!
//! // never discovered
//! assert_eq!(switch.switch_relay(0), Err(SendError::NotFound));
//!
//! let relay = Ipv4Addr::new(192, 168, 1, 40);
//! switch.transport_mut().push_incoming(
//!     br#"{"name":"relay1","descr":"Lamp","for":"respond","resp":"ok"}"#,
//!     relay,
//!     None,
//! );
//! switch.tick(0);
//! assert!(switch.relay(0).unwrap().is_found());
//! assert_eq!(switch.switch_relay(0), Ok(()));
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::net::Ipv4Addr;

use log::{debug, info, warn};

use crate::button::{Button, ButtonEvent};
use crate::config::{long_string, short_string, DiscoveryConfig, LongString, ShortString};
use crate::protocol::{decode, encode_command, Command, ANY_RELAY};
use crate::relay::AddError;
use crate::settings::{normalize_page, SwitchRecord, SwitchSettings};
use crate::traits::{
    Beep, ButtonInput, Datagram, Feedback, NoButton, SettingsStore, Transport,
};

// ============================================================================
// Errors
// ============================================================================

/// Why a command was not sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendError {
    /// No network connectivity.
    Disconnected,
    /// The binding is not resolved; a discovery was broadcast instead.
    NotFound,
    /// Index out of range, free slot, or unknown name.
    NoSuchRelay,
    /// Only `switch`, `set_on`, and `set_off` can be sent.
    UnsupportedCommand,
    /// The transport refused the datagram.
    Transport,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Disconnected => f.write_str("network disconnected"),
            SendError::NotFound => f.write_str("relay not found"),
            SendError::NoSuchRelay => f.write_str("no such relay"),
            SendError::UnsupportedCommand => f.write_str("command cannot be sent"),
            SendError::Transport => f.write_str("send failed"),
        }
    }
}

// ============================================================================
// Remote Relay
// ============================================================================

/// One remote relay a switch device knows about.
pub struct RemoteRelay<B = NoButton> {
    name: ShortString,
    description: LongString,
    address: Ipv4Addr,
    found: bool,
    button: Option<Button<B>>,
}

impl<B: ButtonInput> RemoteRelay<B> {
    /// Target relay name. Empty for a free slot.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description from the last discovery response.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Address from the last discovery response. Only meaningful while
    /// [`is_found`](Self::is_found).
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    /// True between a discovery response and the next command or discovery.
    pub fn is_found(&self) -> bool {
        self.found
    }

    /// True if the slot is unused.
    pub fn is_free(&self) -> bool {
        self.name.is_empty()
    }

    /// Bound local button, if any.
    pub fn button(&self) -> Option<&Button<B>> {
        self.button.as_ref()
    }
}

// ============================================================================
// Switch Control
// ============================================================================

/// Switch device controller.
///
/// # Type Parameters
///
/// - `T`: UDP transport ([`Transport`])
/// - `S`: settings store ([`SettingsStore`])
/// - `F`: buzzer ([`Feedback`])
/// - `B`: button input ([`ButtonInput`]), [`NoButton`] if none are wired
pub struct SwitchControl<T, S, F, B = NoButton> {
    relays: Vec<RemoteRelay<B>>,
    capacity: usize,
    transport: T,
    store: S,
    feedback: F,
    description: LongString,
    config_page: LongString,
    wifi_page: LongString,
    discovery: DiscoveryConfig,
    check_timer_ms: u64,
}

impl<T, S, F, B> SwitchControl<T, S, F, B>
where
    T: Transport,
    S: SettingsStore,
    F: Feedback,
    B: ButtonInput,
{
    /// Create a controller with room for `capacity` bindings.
    pub fn new(capacity: usize, transport: T, store: S, feedback: F) -> Self {
        Self {
            relays: Vec::with_capacity(capacity),
            capacity,
            transport,
            store,
            feedback,
            description: LongString::new(),
            config_page: long_string("/relay_config"),
            wifi_page: LongString::new(),
            discovery: DiscoveryConfig::default(),
            check_timer_ms: 0,
        }
    }

    /// Set the module description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = long_string(description);
        self
    }

    /// Set the configuration page paths written into the settings document.
    pub fn with_pages(mut self, config_page: &str, wifi_page: &str) -> Self {
        self.config_page = long_string(&normalize_page(config_page));
        self.wifi_page = long_string(&normalize_page(wifi_page));
        self
    }

    /// Set the discovery interval and error beep counts.
    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Add a binding without a local button. Returns its index.
    pub fn add_relay(&mut self, name: &str) -> Result<usize, AddError> {
        self.insert(name, None)
    }

    /// Add a binding triggered by a local button. Returns its index.
    pub fn add_relay_with_button(&mut self, name: &str, button: Button<B>) -> Result<usize, AddError> {
        self.insert(name, Some(button))
    }

    fn insert(&mut self, name: &str, button: Option<Button<B>>) -> Result<usize, AddError> {
        if name.is_empty() {
            return Err(AddError::EmptyName);
        }
        if self.index_of(name).is_some() {
            return Err(AddError::Duplicate);
        }

        let binding = RemoteRelay {
            name: short_string(name),
            description: LongString::new(),
            address: Ipv4Addr::UNSPECIFIED,
            found: false,
            button,
        };

        match self.relays.iter().position(RemoteRelay::is_free) {
            Some(i) => {
                self.relays[i] = binding;
                Ok(i)
            }
            None if self.relays.len() < self.capacity => {
                self.relays.push(binding);
                Ok(self.relays.len() - 1)
            }
            None => Err(AddError::Full),
        }
    }

    /// Number of slots in use, free ones included.
    pub fn relay_count(&self) -> usize {
        self.relays.len()
    }

    /// Maximum number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Binding at `index`.
    pub fn relay(&self, index: usize) -> Option<&RemoteRelay<B>> {
        self.relays.get(index)
    }

    /// All bindings.
    pub fn relays(&self) -> &[RemoteRelay<B>] {
        &self.relays
    }

    /// Index of the binding for `name`. Empty names never match.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.relays.iter().position(|r| r.name.as_str() == name)
    }

    /// Module description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the module description.
    pub fn set_description(&mut self, description: &str) {
        self.description = long_string(description);
    }

    /// Rename a binding. An empty name frees the slot and clears its
    /// description.
    ///
    /// Returns `false` if out of range or another slot already has the name.
    pub fn set_relay_name(&mut self, index: usize, name: &str) -> bool {
        if index >= self.relays.len() {
            return false;
        }
        if matches!(self.index_of(name), Some(other) if other != index) {
            return false;
        }
        let binding = &mut self.relays[index];
        if binding.name.as_str() != name {
            binding.found = false;
        }
        binding.name = short_string(name);
        if name.is_empty() {
            binding.description.clear();
        }
        true
    }

    /// Interval between periodic discovery broadcasts.
    pub fn check_interval(&self) -> u32 {
        self.discovery.check_interval_ms
    }

    /// Set the interval between periodic discovery broadcasts.
    pub fn set_check_interval(&mut self, ms: u32) {
        self.discovery.check_interval_ms = ms;
    }

    // ========================================================================
    // Discovery
    // ========================================================================

    /// Load saved settings, broadcast the first discovery, and arm the
    /// periodic timer.
    pub fn start(&mut self, now_ms: u64) {
        match self.store.load_switch_settings() {
            Ok(Some(settings)) => {
                self.load_settings(&settings);
                info!("switch settings loaded");
            }
            Ok(None) => {
                info!("no switch settings stored, saving defaults");
                self.persist();
            }
            Err(e) => warn!("switch settings load failed, using defaults: {:?}", e),
        }

        if let Err(e) = self.discover() {
            warn!("initial discovery failed: {}", e);
        }
        self.check_timer_ms = now_ms;
    }

    /// Mark every binding unresolved and broadcast a discovery request.
    pub fn discover(&mut self) -> Result<(), SendError> {
        for binding in &mut self.relays {
            binding.found = false;
        }

        let payload =
            encode_command(ANY_RELAY, &Command::Respond).map_err(|_| SendError::Transport)?;
        let to = self.transport.broadcast_address();
        debug!("discovery broadcast to {}", to);
        self.transport.send(to, &payload).map_err(|e| {
            warn!("discovery to {} failed: {:?}", to, e);
            SendError::Transport
        })
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Send `switch`, `set_on`, or `set_off` to the binding at `index`.
    ///
    /// Without connectivity the "disconnected" beep sounds and nothing is
    /// sent. For an unresolved binding the "not found" beep sounds and a
    /// discovery is broadcast instead. A sent command leaves the binding
    /// unresolved until the relay is discovered again.
    pub fn send_command(&mut self, index: usize, command: Command) -> Result<(), SendError> {
        if !command.changes_state() {
            return Err(SendError::UnsupportedCommand);
        }
        if !self.transport.is_connected() {
            self.feedback
                .signal(Beep::Error(self.discovery.disconnected_beeps));
            return Err(SendError::Disconnected);
        }
        let Some(binding) = self.relays.get_mut(index).filter(|r| !r.is_free()) else {
            return Err(SendError::NoSuchRelay);
        };

        if !binding.found {
            info!("{}: not found", binding.name);
            self.feedback
                .signal(Beep::Error(self.discovery.not_found_beeps));
            // a failed broadcast is already logged; the caller sees NotFound
            let _ = self.discover();
            return Err(SendError::NotFound);
        }

        binding.found = false;
        let (name, to) = (binding.name.clone(), binding.address);
        let payload = encode_command(&name, &command).map_err(|_| SendError::Transport)?;
        info!("{}: {} -> {}", name, command, to);
        self.transport.send(to, &payload).map_err(|e| {
            warn!("{}: send to {} failed: {:?}", name, to, e);
            SendError::Transport
        })
    }

    /// Send a command to the binding for `name`.
    pub fn send_command_by_name(&mut self, name: &str, command: Command) -> Result<(), SendError> {
        let index = self.index_of(name).ok_or(SendError::NoSuchRelay)?;
        self.send_command(index, command)
    }

    /// Toggle the remote relay at `index`.
    pub fn switch_relay(&mut self, index: usize) -> Result<(), SendError> {
        self.send_command(index, Command::Switch)
    }

    /// Toggle the remote relay for `name`.
    pub fn switch_relay_by_name(&mut self, name: &str) -> Result<(), SendError> {
        self.send_command_by_name(name, Command::Switch)
    }

    /// Force the remote relay at `index` on or off.
    pub fn set_relay_state(&mut self, index: usize, on: bool) -> Result<(), SendError> {
        self.send_command(index, Command::set(on))
    }

    /// Force the remote relay for `name` on or off.
    pub fn set_relay_state_by_name(&mut self, name: &str, on: bool) -> Result<(), SendError> {
        self.send_command_by_name(name, Command::set(on))
    }

    /// Force relays on or off as a group.
    ///
    /// With `self_only`, each bound relay gets its own command (free slots
    /// are skipped, and the first error is returned after trying them all).
    /// Otherwise one `any_relay` broadcast reaches every relay in range,
    /// bound or not.
    pub fn set_state_for_all(&mut self, on: bool, self_only: bool) -> Result<(), SendError> {
        if self_only {
            let mut result = Ok(());
            for index in 0..self.relays.len() {
                if self.relays[index].is_free() {
                    continue;
                }
                if let Err(e) = self.set_relay_state(index, on) {
                    result = result.and(Err(e));
                }
            }
            return result;
        }

        if !self.transport.is_connected() {
            self.feedback
                .signal(Beep::Error(self.discovery.disconnected_beeps));
            return Err(SendError::Disconnected);
        }
        let command = Command::set(on);
        let payload = encode_command(ANY_RELAY, &command).map_err(|_| SendError::Transport)?;
        let to = self.transport.broadcast_address();
        info!("{}: {} -> {}", ANY_RELAY, command, to);
        self.transport.send(to, &payload).map_err(|e| {
            warn!("group command to {} failed: {:?}", to, e);
            SendError::Transport
        })
    }

    // ========================================================================
    // Loop
    // ========================================================================

    /// Run one iteration of the device loop.
    ///
    /// Polls every button (a DOWN edge clicks and toggles the remote relay),
    /// advances the buzzer, runs the periodic discovery when due, then
    /// handles at most one inbound datagram.
    pub fn tick(&mut self, now_ms: u64) {
        for index in 0..self.relays.len() {
            let pressed = self.relays[index]
                .button
                .as_mut()
                .is_some_and(|b| b.poll(now_ms) == ButtonEvent::Down);
            if pressed {
                self.feedback.signal(Beep::Click);
                if let Err(e) = self.switch_relay(index) {
                    debug!("button {}: {}", index, e);
                }
            }
        }

        self.feedback.update(now_ms);

        if now_ms.saturating_sub(self.check_timer_ms) >= u64::from(self.discovery.check_interval_ms)
        {
            let _ = self.discover();
            self.check_timer_ms = now_ms;
        }

        if let Some(datagram) = self.transport.poll_incoming() {
            self.handle_datagram(&datagram);
        }
    }

    /// Handle one inbound datagram (a relay's response).
    pub fn handle_datagram(&mut self, datagram: &Datagram) {
        if datagram.to == Some(self.transport.broadcast_address()) {
            debug!("ignoring broadcast from {}", datagram.from);
            return;
        }
        let envelope = match decode(&datagram.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("dropping datagram from {}: {}", datagram.from, e);
                return;
            }
        };
        let Some(for_command) = envelope.for_command else {
            debug!("ignoring datagram without response from {}", datagram.from);
            return;
        };

        let Some(index) = self.index_of(&envelope.name) else {
            info!(
                "Module {}, {} response - {}",
                envelope.name, envelope.descr, envelope.resp
            );
            return;
        };

        let binding = &mut self.relays[index];
        binding.found = true;
        if for_command == Command::Respond {
            binding.description = envelope.descr;
            binding.address = datagram.from;
            info!("{}: found at {}", binding.name, binding.address);
        } else {
            info!("{}: {} response - {}", binding.name, for_command, envelope.resp);
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Apply a settings document to the slots, by position.
    ///
    /// Addresses are not loaded; discovery owns them. A renamed binding
    /// becomes unresolved. An entry with an empty name also clears its
    /// description.
    pub fn load_settings(&mut self, settings: &SwitchSettings) {
        self.description = long_string(&settings.module);

        for (index, record) in settings.relays.iter().enumerate().take(self.relays.len()) {
            let name = if matches!(self.index_of(&record.name), Some(other) if other != index) {
                warn!("duplicate binding {} at slot {}", record.name, index);
                ""
            } else {
                record.name.as_str()
            };
            let binding = &mut self.relays[index];
            if binding.name.as_str() != name {
                binding.found = false;
            }
            binding.name = short_string(name);
            binding.description = if name.is_empty() {
                LongString::new()
            } else {
                long_string(&record.descr)
            };
        }
    }

    /// Current settings document.
    pub fn settings(&self) -> SwitchSettings {
        SwitchSettings {
            module: self.description.to_string(),
            wificonf: self.wifi_page.to_string(),
            relconf: self.config_page.to_string(),
            relays: self
                .relays
                .iter()
                .map(|r| SwitchRecord {
                    name: r.name.to_string(),
                    descr: r.description.to_string(),
                    addr: if r.address.is_unspecified() {
                        String::new()
                    } else {
                        r.address.to_string()
                    },
                })
                .collect(),
        }
    }

    /// Load a settings document and persist it.
    pub fn apply_settings(&mut self, settings: &SwitchSettings) -> Result<(), S::Error> {
        self.load_settings(settings);
        self.save_settings()
    }

    /// Persist the current settings.
    pub fn save_settings(&mut self) -> Result<(), S::Error> {
        let settings = self.settings();
        self.store.save_switch_settings(&settings)
    }

    fn persist(&mut self) {
        if let Err(e) = self.save_settings() {
            warn!("switch settings save failed: {:?}", e);
        }
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    /// UDP transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable UDP transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Settings store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable settings store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Buzzer.
    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    /// Mutable buzzer.
    pub fn feedback_mut(&mut self) -> &mut F {
        &mut self.feedback
    }

    /// Mutable button of the binding at `index`.
    pub fn button_mut(&mut self, index: usize) -> Option<&mut Button<B>> {
        self.relays.get_mut(index).and_then(|r| r.button.as_mut())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::button::ButtonConfig;
    use crate::hal::{MockButton, MockFeedback, MockStore, MockTransport};

    type TestSwitch = SwitchControl<MockTransport, MockStore, MockFeedback, MockButton>;

    const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);
    const BROADCAST: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 255);
    const RELAY: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 40);

    fn device() -> TestSwitch {
        let mut switch =
            SwitchControl::new(3, MockTransport::new(LOCAL), MockStore::new(), MockFeedback::new())
                .with_description("Desk");
        switch.add_relay("relay1").unwrap();
        switch.add_relay("relay2").unwrap();
        switch
    }

    fn found(switch: &mut TestSwitch, name: &str) {
        let payload = alloc::format!(
            r#"{{"name":"{}","descr":"Lamp","for":"respond","resp":"ok"}}"#,
            name
        );
        switch
            .transport_mut()
            .push_incoming(payload.as_bytes(), RELAY, None);
        let now = switch.check_timer_ms;
        switch.tick(now);
    }

    #[test]
    fn discover_broadcasts_and_resets() {
        let mut switch = device();
        found(&mut switch, "relay1");
        assert!(switch.relay(0).unwrap().is_found());

        switch.discover().unwrap();
        assert!(!switch.relay(0).unwrap().is_found());
        let (to, env) = switch.transport().sent_envelopes().pop().unwrap();
        assert_eq!(to, BROADCAST);
        assert!(env.targets_all());
        assert_eq!(env.command, Some(Command::Respond));
    }

    #[test]
    fn respond_resolves_binding() {
        let mut switch = device();
        found(&mut switch, "relay2");
        let binding = switch.relay(1).unwrap();
        assert!(binding.is_found());
        assert_eq!(binding.address(), RELAY);
        assert_eq!(binding.description(), "Lamp");
        assert!(!switch.relay(0).unwrap().is_found());
    }

    #[test]
    fn command_consumes_resolution() {
        let mut switch = device();
        found(&mut switch, "relay1");
        switch.transport_mut().take_sent();

        assert_eq!(switch.switch_relay(0), Ok(()));
        let (to, env) = switch.transport().sent_envelopes().pop().unwrap();
        assert_eq!(to, RELAY);
        assert_eq!(env.name.as_str(), "relay1");
        assert_eq!(env.command, Some(Command::Switch));
        assert!(!switch.relay(0).unwrap().is_found());

        switch.transport_mut().take_sent();
        assert_eq!(switch.switch_relay(0), Err(SendError::NotFound));
        let sent = switch.transport().sent_envelopes();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, BROADCAST);
        assert_eq!(switch.feedback().errors(), alloc::vec![2]);
    }

    #[test]
    fn disconnected_sends_nothing() {
        let mut switch = device();
        found(&mut switch, "relay1");
        switch.transport_mut().take_sent();
        switch.transport_mut().connected = false;

        assert_eq!(switch.switch_relay(0), Err(SendError::Disconnected));
        assert_eq!(switch.set_state_for_all(true, false), Err(SendError::Disconnected));
        assert!(switch.transport().sent.is_empty());
        assert_eq!(switch.feedback().errors(), alloc::vec![3, 3]);
        assert!(switch.relay(0).unwrap().is_found());
    }

    #[test]
    fn out_of_range_is_silent() {
        let mut switch = device();
        let count = switch.relay_count();
        assert_eq!(switch.switch_relay(count), Err(SendError::NoSuchRelay));
        assert_eq!(switch.switch_relay_by_name("garage"), Err(SendError::NoSuchRelay));
        assert!(switch.transport().sent.is_empty());
        assert!(switch.feedback().signals.is_empty());
    }

    #[test]
    fn only_state_commands_are_sent() {
        let mut switch = device();
        assert_eq!(
            switch.send_command(0, Command::Respond),
            Err(SendError::UnsupportedCommand)
        );
    }

    #[test]
    fn transport_failure_is_reported() {
        let mut switch = device();
        found(&mut switch, "relay1");
        switch.transport_mut().fail_sends = true;
        assert_eq!(switch.set_relay_state(0, true), Err(SendError::Transport));
        assert!(!switch.relay(0).unwrap().is_found());
    }

    #[test]
    fn group_broadcast_ignores_bindings() {
        let mut switch = device();
        switch.set_state_for_all(false, false).unwrap();
        let (to, env) = switch.transport().sent_envelopes().pop().unwrap();
        assert_eq!(to, BROADCAST);
        assert!(env.targets_all());
        assert_eq!(env.command, Some(Command::SetOff));
    }

    #[test]
    fn group_per_binding() {
        let mut switch = device();
        found(&mut switch, "relay1");
        switch.transport_mut().take_sent();

        // relay2 unresolved: relay1 still gets its command
        assert_eq!(switch.set_state_for_all(true, true), Err(SendError::NotFound));
        let sent = switch.transport().sent_envelopes();
        assert_eq!(sent[0].0, RELAY);
        assert_eq!(sent[0].1.command, Some(Command::SetOn));
    }

    #[test]
    fn broadcast_echo_is_ignored() {
        let mut switch = device();
        switch.transport_mut().push_incoming(
            br#"{"name":"relay1","descr":"x","for":"respond","resp":"ok"}"#,
            LOCAL,
            Some(BROADCAST),
        );
        switch.tick(0);
        assert!(!switch.relay(0).unwrap().is_found());
    }

    #[test]
    fn state_response_marks_found_only() {
        let mut switch = device();
        found(&mut switch, "relay1");
        switch.transport_mut().push_incoming(
            br#"{"name":"relay1","descr":"Other","for":"switch","resp":"on"}"#,
            Ipv4Addr::new(192, 168, 1, 99),
            None,
        );
        switch.tick(1);
        let binding = switch.relay(0).unwrap();
        assert!(binding.is_found());
        assert_eq!(binding.address(), RELAY);
        assert_eq!(binding.description(), "Lamp");
    }

    #[test]
    fn periodic_discovery() {
        let mut switch = device();
        switch.set_check_interval(1000);
        switch.start(0);
        assert_eq!(switch.transport_mut().take_sent().len(), 1);

        switch.tick(999);
        assert!(switch.transport().sent.is_empty());
        switch.tick(1000);
        assert_eq!(switch.transport_mut().take_sent().len(), 1);
        switch.tick(1500);
        assert!(switch.transport().sent.is_empty());
    }

    #[test]
    fn start_saves_defaults() {
        let mut switch = device();
        switch.start(0);
        let saved = switch.store().switch.clone().unwrap();
        assert_eq!(saved.module, "Desk");
        assert_eq!(saved.relays[1].name, "relay2");
        assert_eq!(saved.relays[1].addr, "");
    }

    #[test]
    fn load_clears_description_of_free_slots() {
        let mut switch = device();
        found(&mut switch, "relay1");
        switch.load_settings(&SwitchSettings {
            module: "Hall switch".into(),
            relays: alloc::vec![
                SwitchRecord { name: "relay1".into(), descr: "Lamp".into(), addr: "10.0.0.9".into() },
                SwitchRecord { name: "".into(), descr: "stale".into(), addr: "".into() },
            ],
            ..Default::default()
        });
        assert_eq!(switch.description(), "Hall switch");
        // same name keeps its resolution, address is not loaded
        assert!(switch.relay(0).unwrap().is_found());
        assert_eq!(switch.relay(0).unwrap().address(), RELAY);
        assert!(switch.relay(1).unwrap().is_free());
        assert_eq!(switch.relay(1).unwrap().description(), "");
    }

    #[test]
    fn settings_include_addresses() {
        let mut switch = device();
        found(&mut switch, "relay1");
        let settings = switch.settings();
        assert_eq!(settings.relays[0].addr, "192.168.1.40");
    }

    #[test]
    fn button_press_clicks_and_sends() {
        let mut switch: TestSwitch =
            SwitchControl::new(1, MockTransport::new(LOCAL), MockStore::new(), MockFeedback::new());
        let button = Button::new(MockButton::new(true), ButtonConfig::default());
        switch.add_relay_with_button("relay1", button).unwrap();
        found(&mut switch, "relay1");
        switch.transport_mut().take_sent();

        switch.button_mut(0).unwrap().input_mut().level = false;
        switch.tick(10);
        assert_eq!(switch.feedback().signals, alloc::vec![Beep::Click]);
        let (to, env) = switch.transport().sent_envelopes().pop().unwrap();
        assert_eq!(to, RELAY);
        assert_eq!(env.command, Some(Command::Switch));
    }
}
