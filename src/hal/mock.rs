//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for all hardware, network, and storage
//! traits, enabling development and testing on desktop without a board or a
//! network.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockRelay`] | [`RelayOutput`] | Tracks level, writes, and transitions |
//! | [`MockButton`] | [`ButtonInput`] | Settable pin level |
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockTransport`] | [`Transport`] | Captures sends, queued receives |
//! | [`MockStore`] | [`SettingsStore`] | In-memory settings, injectable failures |
//! | [`MockFeedback`] | [`Feedback`] | Records beeps |
//!
//! # Example
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use sr_control::hal::MockTransport;
//! use sr_control::traits::Transport;
//!
//! let mut udp = MockTransport::new(Ipv4Addr::new(192, 168, 1, 10));
//! udp.send(Ipv4Addr::new(192, 168, 1, 20), b"{}").unwrap();
//! assert_eq!(udp.sent.len(), 1);
//! ```
//!
//! [`RelayOutput`]: crate::traits::RelayOutput
//! [`ButtonInput`]: crate::traits::ButtonInput
//! [`Clock`]: crate::traits::Clock
//! [`Transport`]: crate::traits::Transport
//! [`SettingsStore`]: crate::traits::SettingsStore
//! [`Feedback`]: crate::traits::Feedback

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::net::Ipv4Addr;

use crate::protocol::{decode, Envelope};
use crate::settings::{RelaySettings, SwitchSettings};
use crate::traits::{
    Beep, ButtonInput, Clock, Datagram, Feedback, RelayOutput, SettingsStore, Transport,
};

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock relay output for testing.
///
/// # Example
///
/// ```rust
/// use sr_control::hal::MockRelay;
/// use sr_control::traits::RelayOutput;
///
/// let mut relay = MockRelay::new();
/// relay.set_level(true).unwrap();
/// relay.set_level(true).unwrap();
///
/// assert!(relay.high);
/// assert_eq!(relay.writes, 2);
/// assert_eq!(relay.transitions, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockRelay {
    /// Level currently driven.
    pub high: bool,
    /// Number of `set_level` calls.
    pub writes: usize,
    /// Number of writes that changed the level.
    pub transitions: usize,
}

impl MockRelay {
    /// Creates a relay output driven low.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RelayOutput for MockRelay {
    type Error = ();

    fn set_level(&mut self, high: bool) -> Result<(), ()> {
        if self.high != high {
            self.transitions += 1;
        }
        self.high = high;
        self.writes += 1;
        Ok(())
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Mock button pin.
#[derive(Debug, Default)]
pub struct MockButton {
    /// Level the pin reads.
    pub level: bool,
    /// Number of reads.
    pub reads: usize,
}

impl MockButton {
    /// Creates a pin reading `level`.
    pub fn new(level: bool) -> Self {
        Self { level, reads: 0 }
    }
}

impl ButtonInput for MockButton {
    fn is_high(&mut self) -> bool {
        self.reads += 1;
        self.level
    }
}

/// Mock clock for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use sr_control::hal::MockClock;
/// use sr_control::traits::Clock;
///
/// let mut clock = MockClock::new();
/// clock.set(1000);
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: u64,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self { current_ms: 0 }
    }

    /// Sets the current time in milliseconds.
    pub fn set(&mut self, ms: u64) {
        self.current_ms = ms;
    }

    /// Advances time by `ms` milliseconds.
    pub fn advance(&mut self, ms: u64) {
        self.current_ms += ms;
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms
    }
}

/// Mock buzzer recording every signal.
#[derive(Debug, Default)]
pub struct MockFeedback {
    /// Signals in order.
    pub signals: Vec<Beep>,
}

impl MockFeedback {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Error beep counts, in order, ignoring clicks.
    pub fn errors(&self) -> Vec<u8> {
        self.signals
            .iter()
            .filter_map(|b| match b {
                Beep::Error(n) => Some(*n),
                Beep::Click => None,
            })
            .collect()
    }
}

impl Feedback for MockFeedback {
    fn signal(&mut self, beep: Beep) {
        self.signals.push(beep);
    }
}

// ============================================================================
// Network Mock
// ============================================================================

/// Mock UDP transport.
///
/// Sends are captured in [`sent`](Self::sent); datagrams pushed with
/// [`push_incoming`](Self::push_incoming) come out of `poll_incoming` in
/// FIFO order.
#[derive(Debug)]
pub struct MockTransport {
    /// Local address.
    pub local: Ipv4Addr,
    /// Broadcast address reported to the controller.
    pub broadcast: Ipv4Addr,
    /// Connectivity reported to the controller.
    pub connected: bool,
    /// Make every `send` fail.
    pub fail_sends: bool,
    /// Captured `(destination, payload)` pairs.
    pub sent: Vec<(Ipv4Addr, Vec<u8>)>,
    /// Pending inbound datagrams.
    pub incoming: VecDeque<Datagram>,
}

impl MockTransport {
    /// Connected transport on a /24 network.
    pub fn new(local: Ipv4Addr) -> Self {
        let o = local.octets();
        Self {
            local,
            broadcast: Ipv4Addr::new(o[0], o[1], o[2], 255),
            connected: true,
            fail_sends: false,
            sent: Vec::new(),
            incoming: VecDeque::new(),
        }
    }

    /// Queue an inbound datagram.
    ///
    /// Payloads longer than a datagram are dropped.
    pub fn push_incoming(&mut self, payload: &[u8], from: Ipv4Addr, to: Option<Ipv4Addr>) {
        if let Some(d) = Datagram::new(payload, from, to) {
            self.incoming.push_back(d);
        }
    }

    /// Drain captured sends.
    pub fn take_sent(&mut self) -> Vec<(Ipv4Addr, Vec<u8>)> {
        core::mem::take(&mut self.sent)
    }

    /// Captured sends decoded as envelopes.
    pub fn sent_envelopes(&self) -> Vec<(Ipv4Addr, Envelope)> {
        self.sent
            .iter()
            .filter_map(|(to, bytes)| decode(bytes).ok().map(|e| (*to, e)))
            .collect()
    }
}

impl Transport for MockTransport {
    type Error = ();

    fn local_address(&self) -> Ipv4Addr {
        self.local
    }

    fn broadcast_address(&self) -> Ipv4Addr {
        self.broadcast
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send(&mut self, to: Ipv4Addr, payload: &[u8]) -> Result<(), ()> {
        if self.fail_sends {
            return Err(());
        }
        self.sent.push((to, payload.to_vec()));
        Ok(())
    }

    fn poll_incoming(&mut self) -> Option<Datagram> {
        self.incoming.pop_front()
    }
}

// ============================================================================
// Storage Mock
// ============================================================================

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MockStore {
    /// Stored relay document.
    pub relay: Option<RelaySettings>,
    /// Stored switch document.
    pub switch: Option<SwitchSettings>,
    /// Make loads fail (simulates a corrupt file).
    pub fail_loads: bool,
    /// Make saves fail (simulates a full or read-only filesystem).
    pub fail_saves: bool,
    /// Successful relay saves.
    pub relay_saves: usize,
    /// Successful switch saves.
    pub switch_saves: usize,
}

impl MockStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with a relay document.
    pub fn with_relay(settings: RelaySettings) -> Self {
        Self {
            relay: Some(settings),
            ..Self::default()
        }
    }

    /// Store pre-loaded with a switch document.
    pub fn with_switch(settings: SwitchSettings) -> Self {
        Self {
            switch: Some(settings),
            ..Self::default()
        }
    }
}

/// Failure injected by [`MockStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockStoreError;

impl SettingsStore for MockStore {
    type Error = MockStoreError;

    fn load_relay_settings(&mut self) -> Result<Option<RelaySettings>, MockStoreError> {
        if self.fail_loads {
            return Err(MockStoreError);
        }
        Ok(self.relay.clone())
    }

    fn save_relay_settings(&mut self, settings: &RelaySettings) -> Result<(), MockStoreError> {
        if self.fail_saves {
            return Err(MockStoreError);
        }
        self.relay = Some(settings.clone());
        self.relay_saves += 1;
        Ok(())
    }

    fn load_switch_settings(&mut self) -> Result<Option<SwitchSettings>, MockStoreError> {
        if self.fail_loads {
            return Err(MockStoreError);
        }
        Ok(self.switch.clone())
    }

    fn save_switch_settings(&mut self, settings: &SwitchSettings) -> Result<(), MockStoreError> {
        if self.fail_saves {
            return Err(MockStoreError);
        }
        self.switch = Some(settings.clone());
        self.switch_saves += 1;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
