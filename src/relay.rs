//! Relay device: named local outputs driven by UDP commands and buttons.
//!
//! [`RelayControl`] owns a fixed-capacity set of [`RelayEntry`] slots. Each
//! slot has a unique network name, an output pin with its active level, and
//! an optional local button. A slot with an empty name is free.
//!
//! # Protocol handling
//!
//! | Inbound `command` | Target | Effect | Reply per matched entry |
//! |-------------------|--------|--------|-------------------------|
//! | `respond` | name or `any_relay` | none | `resp: "ok"` |
//! | `switch` | name or `any_relay` | toggle | `resp: "on"/"off"` |
//! | `set_on` / `set_off` | name or `any_relay` | force | `resp: "on"/"off"` |
//! | anything else | - | none | `resp: "unknown command"` |
//!
//! Replies go back to the sender. A name that matches no entry is dropped
//! without a reply. A datagram without a `command` field (for example another
//! relay's response) is ignored.
//!
//! # Example
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use sr_control::hal::{MockFeedback, MockRelay, MockStore, MockTransport};
//! use sr_control::protocol::RelayState;
//! use sr_control::relay::RelayControl;
//! use sr_control::traits::{ActiveLevel, NoButton};
//!
//! let udp = MockTransport::new(Ipv4Addr::new(192, 168, 1, 40));
//! let mut relays: RelayControl<MockRelay, _, _, _, NoButton> =
//!     RelayControl::new(2, udp, MockStore::new(), MockFeedback::new());
//! relays.add_relay("relay1", MockRelay::new(), ActiveLevel::High, "Lamp").unwrap();
//!
//! let from = Ipv4Addr::new(192, 168, 1, 10);
//! relays.transport_mut().push_incoming(br#"{"name":"relay1","command":"switch"}"#, from, None);
//! relays.tick(0);
//!
//! assert_eq!(relays.relay_state(0), RelayState::On);
//! assert_eq!(relays.transport().sent.len(), 1);
//! ```

use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt::{self, Write as _};

use log::{debug, info, warn};

use crate::button::{Button, ButtonEvent};
use crate::config::{long_string, short_string, LongString, ShortString};
use crate::protocol::{
    decode, encode_response, Command, Envelope, RelayState, RESP_OK, RESP_UNKNOWN,
};
use crate::settings::{normalize_page, RelayRecord, RelaySettings, StateReport};
use crate::traits::{
    ActiveLevel, Beep, ButtonInput, Datagram, Feedback, NoButton, RelayOutput, SettingsStore,
    Transport,
};

// ============================================================================
// Errors
// ============================================================================

/// Why a relay or binding could not be added.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddError {
    /// Every slot is taken.
    Full,
    /// Another slot already uses the name.
    Duplicate,
    /// Names must not be empty; an empty name marks a free slot.
    EmptyName,
}

impl fmt::Display for AddError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddError::Full => f.write_str("no free slot"),
            AddError::Duplicate => f.write_str("name already in use"),
            AddError::EmptyName => f.write_str("name is empty"),
        }
    }
}

// ============================================================================
// Relay Entry
// ============================================================================

/// One physical output on a relay device.
pub struct RelayEntry<O, B = NoButton> {
    name: ShortString,
    description: LongString,
    output: O,
    level: ActiveLevel,
    last: bool,
    button: Option<Button<B>>,
}

impl<O: RelayOutput, B: ButtonInput> RelayEntry<O, B> {
    /// Network name. Empty for a free slot.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable label.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Logic level that means ON.
    pub fn active_level(&self) -> ActiveLevel {
        self.level
    }

    /// Last state written, as read back after the write.
    pub fn last_state(&self) -> bool {
        self.last
    }

    /// True if the slot is unused.
    pub fn is_free(&self) -> bool {
        self.name.is_empty()
    }

    /// Output driver.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Bound local button, if any.
    pub fn button(&self) -> Option<&Button<B>> {
        self.button.as_ref()
    }

    /// Live state from the output read-back.
    pub fn state(&self) -> RelayState {
        RelayState::from_on(self.level.is_on(self.output.is_set_high()))
    }

    fn write(&mut self, on: bool) {
        if let Err(e) = self.output.set_level(self.level.level_for(on)) {
            warn!("{}: output write failed: {:?}", self.name, e);
        }
    }
}

// ============================================================================
// Relay Control
// ============================================================================

/// Relay device controller.
///
/// # Type Parameters
///
/// - `O`: relay output driver ([`RelayOutput`])
/// - `T`: UDP transport ([`Transport`])
/// - `S`: settings store ([`SettingsStore`])
/// - `F`: buzzer ([`Feedback`])
/// - `B`: button input ([`ButtonInput`]), [`NoButton`] if none are wired
///
/// Relays must be added before [`start`](Self::start), which loads the saved
/// names and states onto the slots by position.
pub struct RelayControl<O, T, S, F, B = NoButton> {
    relays: Vec<RelayEntry<O, B>>,
    capacity: usize,
    transport: T,
    store: S,
    feedback: F,
    description: LongString,
    save_state: bool,
    config_page: LongString,
    wifi_page: LongString,
}

impl<O, T, S, F, B> RelayControl<O, T, S, F, B>
where
    O: RelayOutput,
    T: Transport,
    S: SettingsStore,
    F: Feedback,
    B: ButtonInput,
{
    /// Create a controller with room for `capacity` relays.
    pub fn new(capacity: usize, transport: T, store: S, feedback: F) -> Self {
        Self {
            relays: Vec::with_capacity(capacity),
            capacity,
            transport,
            store,
            feedback,
            description: LongString::new(),
            save_state: false,
            config_page: long_string("/relay_config"),
            wifi_page: LongString::new(),
        }
    }

    /// Set the module description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = long_string(description);
        self
    }

    /// Persist state on every change and restore it at start.
    pub fn with_save_state(mut self, save_state: bool) -> Self {
        self.save_state = save_state;
        self
    }

    /// Set the configuration page paths written into the settings document.
    pub fn with_pages(mut self, config_page: &str, wifi_page: &str) -> Self {
        self.config_page = long_string(&normalize_page(config_page));
        self.wifi_page = long_string(&normalize_page(wifi_page));
        self
    }

    // ========================================================================
    // Slots
    // ========================================================================

    /// Add a relay without a local button. Returns its index.
    ///
    /// The output is driven OFF immediately.
    pub fn add_relay(
        &mut self,
        name: &str,
        output: O,
        level: ActiveLevel,
        description: &str,
    ) -> Result<usize, AddError> {
        self.insert(name, output, level, description, None)
    }

    /// Add a relay toggled by a local button. Returns its index.
    pub fn add_relay_with_button(
        &mut self,
        name: &str,
        output: O,
        level: ActiveLevel,
        description: &str,
        button: Button<B>,
    ) -> Result<usize, AddError> {
        self.insert(name, output, level, description, Some(button))
    }

    fn insert(
        &mut self,
        name: &str,
        output: O,
        level: ActiveLevel,
        description: &str,
        button: Option<Button<B>>,
    ) -> Result<usize, AddError> {
        if name.is_empty() {
            return Err(AddError::EmptyName);
        }
        if self.index_of(name).is_some() {
            return Err(AddError::Duplicate);
        }

        let mut entry = RelayEntry {
            name: short_string(name),
            description: long_string(description),
            output,
            level,
            last: false,
            button,
        };
        entry.write(false);

        let index = match self.relays.iter().position(RelayEntry::is_free) {
            Some(i) => {
                self.relays[i] = entry;
                i
            }
            None if self.relays.len() < self.capacity => {
                self.relays.push(entry);
                self.relays.len() - 1
            }
            None => return Err(AddError::Full),
        };
        debug!("relay {} added at slot {}", name, index);
        Ok(index)
    }

    /// Number of slots in use, free ones included.
    pub fn relay_count(&self) -> usize {
        self.relays.len()
    }

    /// Maximum number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slot at `index`.
    pub fn relay(&self, index: usize) -> Option<&RelayEntry<O, B>> {
        self.relays.get(index)
    }

    /// All slots.
    pub fn relays(&self) -> &[RelayEntry<O, B>] {
        &self.relays
    }

    /// Index of the relay called `name`. Empty names never match.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.relays.iter().position(|r| r.name.as_str() == name)
    }

    // ========================================================================
    // Local Control
    // ========================================================================

    /// Live state of a relay. Out of range reads as OFF.
    pub fn relay_state(&self, index: usize) -> RelayState {
        self.relays
            .get(index)
            .map(RelayEntry::state)
            .unwrap_or_default()
    }

    /// Live state of a relay by name. Unknown names read as OFF.
    pub fn relay_state_by_name(&self, name: &str) -> RelayState {
        self.index_of(name)
            .map(|i| self.relay_state(i))
            .unwrap_or_default()
    }

    /// Toggle a relay. Returns the new state, or `None` if out of range.
    pub fn switch_relay(&mut self, index: usize) -> Option<RelayState> {
        let on = !self.relays.get(index)?.state().is_on();
        self.set_relay_state(index, on)
    }

    /// Toggle a relay by name.
    pub fn switch_relay_by_name(&mut self, name: &str) -> Option<RelayState> {
        let index = self.index_of(name)?;
        self.switch_relay(index)
    }

    /// Force a relay on or off. Returns the new state, or `None` if out of
    /// range.
    ///
    /// The output is always written, even when it already has the level.
    /// With save-state enabled the settings are persisted; a failed save is
    /// logged and otherwise ignored.
    pub fn set_relay_state(&mut self, index: usize, on: bool) -> Option<RelayState> {
        let entry = self.relays.get_mut(index)?;
        entry.write(on);
        let state = entry.state();
        entry.last = state.is_on();
        info!("{}: state - {}", entry.name, state);

        if self.save_state {
            self.persist();
        }
        Some(state)
    }

    /// Force a relay on or off by name.
    pub fn set_relay_state_by_name(&mut self, name: &str, on: bool) -> Option<RelayState> {
        let index = self.index_of(name)?;
        self.set_relay_state(index, on)
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Module description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the module description.
    pub fn set_description(&mut self, description: &str) {
        self.description = long_string(description);
    }

    /// Whether state is persisted and restored.
    pub fn save_state(&self) -> bool {
        self.save_state
    }

    /// Enable or disable state persistence.
    pub fn set_save_state(&mut self, save_state: bool) {
        self.save_state = save_state;
    }

    /// Name of the relay at `index`.
    pub fn relay_name(&self, index: usize) -> Option<&str> {
        self.relays.get(index).map(|r| r.name.as_str())
    }

    /// Rename a relay. An empty name frees the slot.
    ///
    /// Returns `false` if out of range or another slot already has the name.
    pub fn set_relay_name(&mut self, index: usize, name: &str) -> bool {
        if index >= self.relays.len() {
            return false;
        }
        if matches!(self.index_of(name), Some(other) if other != index) {
            return false;
        }
        self.relays[index].name = short_string(name);
        true
    }

    /// Description of the relay at `index`.
    pub fn relay_description(&self, index: usize) -> Option<&str> {
        self.relays.get(index).map(|r| r.description.as_str())
    }

    /// Set a relay's description. Returns `false` if out of range.
    pub fn set_relay_description(&mut self, index: usize, description: &str) -> bool {
        match self.relays.get_mut(index) {
            Some(entry) => {
                entry.description = long_string(description);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Load saved settings and restore relay states.
    ///
    /// With nothing stored yet, the current settings are saved. A load
    /// failure keeps the current settings.
    pub fn start(&mut self) {
        match self.store.load_relay_settings() {
            Ok(Some(settings)) => {
                self.load_settings(&settings);
                if self.save_state {
                    for entry in self.relays.iter_mut().filter(|r| r.last && !r.is_free()) {
                        entry.write(true);
                    }
                }
                info!("relay settings loaded");
            }
            Ok(None) => {
                info!("no relay settings stored, saving defaults");
                self.persist();
            }
            Err(e) => warn!("relay settings load failed, using defaults: {:?}", e),
        }
    }

    /// Apply a settings document to the slots, by position.
    ///
    /// Entries past the slot count are ignored. An entry whose name is
    /// already used by another slot frees its own slot.
    pub fn load_settings(&mut self, settings: &RelaySettings) {
        self.description = long_string(&settings.module);
        self.save_state = settings.save_state;

        for (index, record) in settings.relays.iter().enumerate().take(self.relays.len()) {
            let name = if matches!(self.index_of(&record.name), Some(other) if other != index) {
                warn!("duplicate relay name {} at slot {}", record.name, index);
                ""
            } else {
                record.name.as_str()
            };
            let entry = &mut self.relays[index];
            entry.name = short_string(name);
            entry.description = long_string(&record.descr);
            entry.last = record.last;
        }
    }

    /// Current settings document.
    pub fn settings(&self) -> RelaySettings {
        RelaySettings {
            module: self.description.to_string(),
            save_state: self.save_state,
            wificonf: self.wifi_page.to_string(),
            relconf: self.config_page.to_string(),
            relays: self
                .relays
                .iter()
                .map(|r| RelayRecord {
                    name: r.name.to_string(),
                    descr: r.description.to_string(),
                    last: r.last,
                })
                .collect(),
        }
    }

    /// Load a settings document and persist it.
    pub fn apply_settings(&mut self, settings: &RelaySettings) -> Result<(), S::Error> {
        self.load_settings(settings);
        self.save_settings()
    }

    /// Persist the current settings.
    pub fn save_settings(&mut self) -> Result<(), S::Error> {
        let settings = self.settings();
        self.store.save_relay_settings(&settings)
    }

    fn persist(&mut self) {
        if let Err(e) = self.save_settings() {
            warn!("relay settings save failed: {:?}", e);
        }
    }

    /// Live state of every slot.
    pub fn state_report(&self) -> StateReport {
        StateReport {
            relays: self
                .relays
                .iter()
                .map(|r| RelayRecord {
                    name: r.name.to_string(),
                    descr: r.description.to_string(),
                    last: r.state().is_on(),
                })
                .collect(),
        }
    }

    // ========================================================================
    // Protocol
    // ========================================================================

    /// Run one iteration of the device loop.
    ///
    /// Polls every button (a DOWN edge clicks and toggles its relay), advances
    /// the buzzer, then handles at most one inbound datagram.
    pub fn tick(&mut self, now_ms: u64) {
        for index in 0..self.relays.len() {
            let pressed = self.relays[index]
                .button
                .as_mut()
                .is_some_and(|b| b.poll(now_ms) == ButtonEvent::Down);
            if pressed {
                self.feedback.signal(Beep::Click);
                self.switch_relay(index);
            }
        }

        self.feedback.update(now_ms);

        if let Some(datagram) = self.transport.poll_incoming() {
            self.handle_datagram(&datagram);
        }
    }

    /// Handle one inbound datagram.
    pub fn handle_datagram(&mut self, datagram: &Datagram) {
        let envelope = match decode(&datagram.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("dropping datagram from {}: {}", datagram.from, e);
                return;
            }
        };
        let Some(command) = envelope.command.clone() else {
            debug!("ignoring datagram without command from {}", datagram.from);
            return;
        };
        debug!(
            "command {} for {} from {}",
            command, envelope.name, datagram.from
        );

        match command {
            Command::Respond => {
                for index in self.targets(&envelope) {
                    self.reply(datagram, index, &command, RESP_OK);
                }
            }
            Command::Switch | Command::SetOn | Command::SetOff => {
                for index in self.targets(&envelope) {
                    let state = match command {
                        Command::SetOn => self.set_relay_state(index, true),
                        Command::SetOff => self.set_relay_state(index, false),
                        _ => self.switch_relay(index),
                    };
                    if let Some(state) = state {
                        self.reply(datagram, index, &command, state.as_str());
                    }
                }
            }
            Command::Unknown(ref raw) => {
                let mut name: heapless::String<16> = heapless::String::new();
                let _ = write!(name, "{}", self.transport.local_address());
                let descr = self.description.clone();
                self.send_reply(datagram, &name, &descr, raw, RESP_UNKNOWN);
            }
        }
    }

    fn targets(&self, envelope: &Envelope) -> Vec<usize> {
        if envelope.targets_all() {
            (0..self.relays.len())
                .filter(|&i| !self.relays[i].is_free())
                .collect()
        } else {
            self.index_of(&envelope.name).into_iter().collect()
        }
    }

    fn reply(&mut self, datagram: &Datagram, index: usize, command: &Command, resp: &str) {
        let entry = &self.relays[index];
        let (name, descr) = (entry.name.clone(), entry.description.clone());
        self.send_reply(datagram, &name, &descr, command.as_str(), resp);
    }

    fn send_reply(
        &mut self,
        datagram: &Datagram,
        name: &str,
        descr: &str,
        for_command: &str,
        resp: &str,
    ) {
        let payload = match encode_response(name, descr, for_command, resp) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("{}: reply not sent: {}", name, e);
                return;
            }
        };
        if let Err(e) = self.transport.send(datagram.from, &payload) {
            warn!("{}: reply to {} failed: {:?}", name, datagram.from, e);
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

    /// Mutable output of the relay at `index`.
    pub fn output_mut(&mut self, index: usize) -> Option<&mut O> {
        self.relays.get_mut(index).map(|r| &mut r.output)
    }

    /// Mutable button of the relay at `index`.
    pub fn button_mut(&mut self, index: usize) -> Option<&mut Button<B>> {
        self.relays.get_mut(index).and_then(|r| r.button.as_mut())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use core::net::Ipv4Addr;

    use super::*;
    use crate::button::ButtonConfig;
    use crate::hal::{MockButton, MockFeedback, MockRelay, MockStore, MockTransport};

    type TestRelays = RelayControl<MockRelay, MockTransport, MockStore, MockFeedback, MockButton>;

    const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 40);
    const PEER: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);

    fn device(store: MockStore) -> TestRelays {
        let mut relays = RelayControl::new(
            3,
            MockTransport::new(LOCAL),
            store,
            MockFeedback::new(),
        )
        .with_description("Hall");
        relays
            .add_relay("relay1", MockRelay::new(), ActiveLevel::High, "Lamp")
            .unwrap();
        relays
            .add_relay("relay2", MockRelay::new(), ActiveLevel::Low, "Fan")
            .unwrap();
        relays
    }

    fn receive(relays: &mut TestRelays, payload: &[u8]) {
        relays.transport_mut().push_incoming(payload, PEER, None);
        relays.tick(0);
    }

    #[test]
    fn add_drives_output_off() {
        let relays = device(MockStore::new());
        assert!(!relays.relay(0).unwrap().output().high);
        // active-low OFF is a high pin
        assert!(relays.relay(1).unwrap().output().high);
        assert_eq!(relays.relay_state(1), RelayState::Off);
    }

    #[test]
    fn add_rejects_duplicates_and_overflow() {
        let mut relays = device(MockStore::new());
        assert_eq!(
            relays.add_relay("relay1", MockRelay::new(), ActiveLevel::High, ""),
            Err(AddError::Duplicate)
        );
        assert_eq!(
            relays.add_relay("", MockRelay::new(), ActiveLevel::High, ""),
            Err(AddError::EmptyName)
        );
        assert_eq!(
            relays.add_relay("relay3", MockRelay::new(), ActiveLevel::High, ""),
            Ok(2)
        );
        assert_eq!(
            relays.add_relay("relay4", MockRelay::new(), ActiveLevel::High, ""),
            Err(AddError::Full)
        );
    }

    #[test]
    fn add_reuses_free_slot() {
        let mut relays = device(MockStore::new());
        assert!(relays.set_relay_name(0, ""));
        assert_eq!(
            relays.add_relay("porch", MockRelay::new(), ActiveLevel::High, ""),
            Ok(0)
        );
    }

    #[test]
    fn index_bound_is_exclusive() {
        let mut relays = device(MockStore::new());
        let count = relays.relay_count();
        assert_eq!(relays.switch_relay(count), None);
        assert_eq!(relays.set_relay_state(count, true), None);
        assert_eq!(relays.relay_state(count), RelayState::Off);
        assert!(relays.switch_relay(count - 1).is_some());
    }

    #[test]
    fn set_state_writes_every_time() {
        let mut relays = device(MockStore::new());
        relays.set_relay_state(0, true);
        relays.set_relay_state(0, true);
        let out = relays.relay(0).unwrap().output();
        assert_eq!(out.transitions, 1);
        // add_relay + two explicit writes
        assert_eq!(out.writes, 3);
        assert!(relays.relay(0).unwrap().last_state());
    }

    #[test]
    fn save_state_persists_changes() {
        let mut relays = device(MockStore::new()).with_save_state(true);
        relays.switch_relay_by_name("relay2");
        assert_eq!(relays.store().relay_saves, 1);
        let saved = relays.store().relay.clone().unwrap();
        assert!(saved.relays[1].last);
        assert!(saved.save_state);
    }

    #[test]
    fn failed_save_keeps_state() {
        let mut relays = device(MockStore::new()).with_save_state(true);
        relays.store_mut().fail_saves = true;
        assert_eq!(relays.set_relay_state(0, true), Some(RelayState::On));
        assert_eq!(relays.relay_state(0), RelayState::On);
    }

    #[test]
    fn start_saves_defaults_when_empty() {
        let mut relays = device(MockStore::new());
        relays.start();
        let saved = relays.store().relay.clone().unwrap();
        assert_eq!(saved.module, "Hall");
        assert_eq!(saved.relays.len(), 2);
    }

    #[test]
    fn start_restores_saved_state() {
        let stored = RelaySettings {
            module: "Kitchen".into(),
            save_state: true,
            relays: alloc::vec![
                RelayRecord { name: "a".into(), descr: "A".into(), last: false },
                RelayRecord { name: "b".into(), descr: "B".into(), last: true },
            ],
            ..Default::default()
        };
        let mut relays = device(MockStore::with_relay(stored));
        relays.start();
        assert_eq!(relays.description(), "Kitchen");
        assert_eq!(relays.relay_name(1), Some("b"));
        assert_eq!(relays.relay_state_by_name("b"), RelayState::On);
        assert_eq!(relays.relay_state_by_name("a"), RelayState::Off);
    }

    #[test]
    fn start_keeps_defaults_on_load_error() {
        let mut store = MockStore::new();
        store.fail_loads = true;
        let mut relays = device(store);
        relays.start();
        assert_eq!(relays.description(), "Hall");
        assert_eq!(relays.store().relay_saves, 0);
    }

    #[test]
    fn load_frees_duplicate_names() {
        let mut relays = device(MockStore::new());
        relays.load_settings(&RelaySettings {
            relays: alloc::vec![
                RelayRecord { name: "x".into(), ..Default::default() },
                RelayRecord { name: "x".into(), ..Default::default() },
            ],
            ..Default::default()
        });
        assert_eq!(relays.relay_name(0), Some("x"));
        assert_eq!(relays.relay_name(1), Some(""));
    }

    #[test]
    fn respond_named_and_broadcast() {
        let mut relays = device(MockStore::new());
        receive(&mut relays, br#"{"name":"relay2","command":"respond"}"#);
        let sent = relays.transport().sent_envelopes();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, PEER);
        assert_eq!(sent[0].1.name.as_str(), "relay2");
        assert_eq!(sent[0].1.descr.as_str(), "Fan");
        assert_eq!(sent[0].1.resp.as_str(), RESP_OK);

        relays.transport_mut().take_sent();
        receive(&mut relays, br#"{"name":"any_relay","command":"respond"}"#);
        assert_eq!(relays.transport().sent.len(), 2);
    }

    #[test]
    fn broadcast_skips_free_slots() {
        let mut relays = device(MockStore::new());
        relays.set_relay_name(0, "");
        receive(&mut relays, br#"{"name":"any_relay","command":"set_on"}"#);
        let sent = relays.transport().sent_envelopes();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.name.as_str(), "relay2");
        assert_eq!(relays.relay_state(0), RelayState::Off);
    }

    #[test]
    fn unknown_name_is_dropped() {
        let mut relays = device(MockStore::new());
        receive(&mut relays, br#"{"name":"garage","command":"switch"}"#);
        assert!(relays.transport().sent.is_empty());
        assert_eq!(relays.relay_state(0), RelayState::Off);
    }

    #[test]
    fn set_commands_force_state() {
        let mut relays = device(MockStore::new());
        receive(&mut relays, br#"{"name":"relay1","command":"set_off"}"#);
        assert_eq!(relays.relay_state(0), RelayState::Off);
        receive(&mut relays, br#"{"name":"relay1","command":"set_on"}"#);
        receive(&mut relays, br#"{"name":"relay1","command":"set_on"}"#);
        assert_eq!(relays.relay_state(0), RelayState::On);
        let last = relays.transport().sent_envelopes().pop().unwrap().1;
        assert_eq!(last.for_command, Some(Command::SetOn));
        assert_eq!(last.resp.as_str(), "on");
    }

    #[test]
    fn unknown_command_gets_diagnostic() {
        let mut relays = device(MockStore::new());
        receive(&mut relays, br#"{"name":"relay1","command":"bogus"}"#);
        let (to, env) = relays.transport().sent_envelopes().pop().unwrap();
        assert_eq!(to, PEER);
        assert_eq!(env.name.as_str(), "192.168.1.40");
        assert_eq!(env.descr.as_str(), "Hall");
        assert_eq!(env.for_command, Some(Command::parse("bogus")));
        assert_eq!(env.resp.as_str(), RESP_UNKNOWN);
    }

    #[test]
    fn responses_and_garbage_are_ignored() {
        let mut relays = device(MockStore::new());
        receive(&mut relays, br#"{"name":"relay1","descr":"x","for":"respond","resp":"ok"}"#);
        receive(&mut relays, b"\x00\x01garbage");
        assert!(relays.transport().sent.is_empty());
    }

    #[test]
    fn one_datagram_per_tick() {
        let mut relays = device(MockStore::new());
        let cmd = br#"{"name":"relay1","command":"switch"}"#;
        relays.transport_mut().push_incoming(cmd, PEER, None);
        relays.transport_mut().push_incoming(cmd, PEER, None);
        relays.tick(0);
        assert_eq!(relays.relay_state(0), RelayState::On);
        relays.tick(1);
        assert_eq!(relays.relay_state(0), RelayState::Off);
    }

    #[test]
    fn button_press_clicks_and_toggles() {
        let mut relays: TestRelays = RelayControl::new(
            1,
            MockTransport::new(LOCAL),
            MockStore::new(),
            MockFeedback::new(),
        );
        // pull-up wiring: pressed reads low
        let button = Button::new(MockButton::new(true), ButtonConfig::default());
        relays
            .add_relay_with_button("relay1", MockRelay::new(), ActiveLevel::High, "", button)
            .unwrap();

        relays.tick(0);
        relays.button_mut(0).unwrap().input_mut().level = false;
        relays.tick(10);
        assert_eq!(relays.relay_state(0), RelayState::On);
        assert_eq!(relays.feedback().signals, alloc::vec![Beep::Click]);

        relays.tick(20);
        assert_eq!(relays.relay_state(0), RelayState::On);
    }

    #[test]
    fn state_report_reads_hardware() {
        let mut relays = device(MockStore::new());
        relays.output_mut(0).unwrap().high = true;
        let report = relays.state_report();
        assert!(report.relays[0].last);
        assert!(!relays.relay(0).unwrap().last_state());
    }
}
