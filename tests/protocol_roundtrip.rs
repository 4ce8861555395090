//! Relay and switch modules talking over an in-memory network

use std::net::Ipv4Addr;

use sr_control::hal::{MockButton, MockFeedback, MockRelay, MockStore, MockTransport};
use sr_control::protocol::RESP_UNKNOWN;
use sr_control::traits::{ActiveLevel, Beep, NoButton};
use sr_control::{
    Button, ButtonConfig, Command, RelayControl, RelayState, SendError, SwitchControl,
};

const SWITCH_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);
const HALL_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 40);
const PORCH_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 41);

type Relays = RelayControl<MockRelay, MockTransport, MockStore, MockFeedback, NoButton>;
type Switch = SwitchControl<MockTransport, MockStore, MockFeedback, MockButton>;

fn relay_module(ip: Ipv4Addr, name: &str, descr: &str) -> Relays {
    let mut relays: Relays = RelayControl::new(
        2,
        MockTransport::new(ip),
        MockStore::new(),
        MockFeedback::new(),
    );
    relays
        .add_relay(name, MockRelay::new(), ActiveLevel::High, descr)
        .unwrap();
    relays.start();
    relays
}

fn switch_module(names: &[&str]) -> Switch {
    let mut switch: Switch = SwitchControl::new(
        names.len(),
        MockTransport::new(SWITCH_IP),
        MockStore::new(),
        MockFeedback::new(),
    );
    for name in names {
        // pull-up, normally open: high is released
        let button = Button::new(MockButton::new(true), ButtonConfig::default());
        switch.add_relay_with_button(name, button).unwrap();
    }
    switch
}

/// One switch and its relays on a /24 subnet.
struct Network {
    switch: Switch,
    relays: Vec<Relays>,
}

impl Network {
    fn new() -> Self {
        Self {
            switch: switch_module(&["hall", "porch"]),
            relays: vec![
                relay_module(HALL_IP, "hall", "Hall light"),
                relay_module(PORCH_IP, "porch", "Porch light"),
            ],
        }
    }

    /// Start the switch and deliver its first discovery round.
    fn started() -> Self {
        let mut net = Self::new();
        net.switch.start(0);
        net.settle(0);
        net
    }

    /// Deliver datagrams in both directions until nothing is in flight.
    fn settle(&mut self, now: u64) {
        for _ in 0..10 {
            let outbound = self.switch.transport_mut().take_sent();
            let mut moved = !outbound.is_empty();

            for (to, bytes) in outbound {
                for relays in &mut self.relays {
                    let udp = relays.transport();
                    if to == udp.local || to == udp.broadcast {
                        relays
                            .transport_mut()
                            .push_incoming(&bytes, SWITCH_IP, Some(to));
                    }
                }
            }

            for relays in &mut self.relays {
                while !relays.transport().incoming.is_empty() {
                    relays.tick(now);
                }
                let from = relays.transport().local;
                for (to, bytes) in relays.transport_mut().take_sent() {
                    moved = true;
                    if to == SWITCH_IP {
                        self.switch
                            .transport_mut()
                            .push_incoming(&bytes, from, Some(to));
                    }
                }
            }

            while !self.switch.transport().incoming.is_empty() {
                self.switch.tick(now);
            }

            if !moved {
                return;
            }
        }
        panic!("network did not settle");
    }

    fn hall(&self) -> &Relays {
        &self.relays[0]
    }

    fn porch(&self) -> &Relays {
        &self.relays[1]
    }
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn discovery_resolves_every_binding() {
    let net = Network::started();

    let hall = net.switch.relay(0).unwrap();
    assert!(hall.is_found());
    assert_eq!(hall.address(), HALL_IP);
    assert_eq!(hall.description(), "Hall light");

    let porch = net.switch.relay(1).unwrap();
    assert!(porch.is_found());
    assert_eq!(porch.address(), PORCH_IP);
}

#[test]
fn discovery_is_one_broadcast() {
    let mut net = Network::new();
    net.switch.start(0);

    let sent = net.switch.transport().sent_envelopes();
    assert_eq!(sent.len(), 1);
    let (to, envelope) = &sent[0];
    assert_eq!(*to, Ipv4Addr::new(192, 168, 1, 255));
    assert!(envelope.targets_all());
    assert_eq!(envelope.command, Some(Command::Respond));
}

#[test]
fn unbound_relay_is_not_resolved() {
    let mut net = Network::new();
    net.relays.push(relay_module(Ipv4Addr::new(192, 168, 1, 42), "garage", ""));
    net.switch.start(0);
    net.settle(0);

    assert_eq!(net.switch.index_of("garage"), None);
    assert!(net.switch.relay(0).unwrap().is_found());
}

#[test]
fn periodic_discovery_runs_on_interval() {
    let mut net = Network::started();
    net.switch.tick(1_000);
    assert!(net.switch.transport().sent.is_empty());

    net.switch.tick(30_000);
    let sent = net.switch.transport().sent_envelopes();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.command, Some(Command::Respond));
}

// ============================================================================
// Remote Switching
// ============================================================================

#[test]
fn switch_toggles_remote_relay() {
    let mut net = Network::started();

    net.switch.switch_relay(0).unwrap();
    net.settle(10);
    assert_eq!(net.hall().relay_state(0), RelayState::On);
    assert!(net.hall().relay(0).unwrap().output().high);
    assert_eq!(net.porch().relay_state(0), RelayState::Off);

    // the relay's answer resolves the binding again
    assert!(net.switch.relay(0).unwrap().is_found());

    net.switch.switch_relay(0).unwrap();
    net.settle(20);
    assert_eq!(net.hall().relay_state(0), RelayState::Off);
}

#[test]
fn button_press_switches_remote_relay() {
    let mut net = Network::started();

    net.switch.tick(5);
    net.switch.button_mut(1).unwrap().input_mut().level = false;
    net.switch.tick(10);
    assert_eq!(net.switch.feedback().signals, [Beep::Click]);

    net.settle(15);
    assert_eq!(net.porch().relay_state(0), RelayState::On);
    assert_eq!(net.hall().relay_state(0), RelayState::Off);
}

#[test]
fn one_command_per_resolution() {
    let mut net = Network::started();

    assert_eq!(net.switch.switch_relay(0), Ok(()));
    // no answer yet: dropped, beeped, rediscovered
    assert_eq!(net.switch.switch_relay(0), Err(SendError::NotFound));
    assert_eq!(net.switch.feedback().errors(), [2]);

    let commands: Vec<_> = net
        .switch
        .transport()
        .sent_envelopes()
        .into_iter()
        .filter_map(|(_, e)| e.command)
        .collect();
    assert_eq!(commands, [Command::Switch, Command::Respond]);

    net.settle(10);
    assert_eq!(net.hall().relay_state(0), RelayState::On);
    assert!(net.switch.relay(0).unwrap().is_found());
}

#[test]
fn set_state_is_idempotent() {
    let mut net = Network::started();

    net.switch.set_relay_state(0, true).unwrap();
    net.settle(10);
    net.switch.set_relay_state(0, true).unwrap();
    net.settle(20);

    assert_eq!(net.hall().relay_state(0), RelayState::On);
    assert_eq!(net.hall().relay(0).unwrap().output().transitions, 1);
}

#[test]
fn group_command_reaches_every_relay() {
    let mut net = Network::started();

    net.switch.set_state_for_all(true, false).unwrap();
    let sent = net.switch.transport().sent_envelopes();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.targets_all());

    net.settle(10);
    assert_eq!(net.hall().relay_state(0), RelayState::On);
    assert_eq!(net.porch().relay_state(0), RelayState::On);
}

#[test]
fn per_binding_group_command() {
    let mut net = Network::started();

    net.switch.set_state_for_all(true, true).unwrap();
    assert_eq!(net.switch.transport().sent.len(), 2);

    net.settle(10);
    assert_eq!(net.hall().relay_state(0), RelayState::On);
    assert_eq!(net.porch().relay_state(0), RelayState::On);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn disconnected_switch_sends_nothing() {
    let mut net = Network::started();
    net.switch.transport_mut().connected = false;

    assert_eq!(net.switch.switch_relay(0), Err(SendError::Disconnected));
    assert_eq!(net.switch.feedback().errors(), [3]);
    assert!(net.switch.transport().sent.is_empty());
}

#[test]
fn unknown_slot_is_rejected() {
    let mut net = Network::started();
    assert_eq!(net.switch.switch_relay(5), Err(SendError::NoSuchRelay));
    assert_eq!(
        net.switch.send_command(0, Command::Respond),
        Err(SendError::UnsupportedCommand)
    );
    assert!(net.switch.transport().sent.is_empty());
}

#[test]
fn unknown_command_gets_diagnostic_reply() {
    let mut relays = relay_module(HALL_IP, "hall", "Hall light");
    relays.set_description("Hallway");
    relays
        .transport_mut()
        .push_incoming(br#"{"name":"hall","command":"blink"}"#, SWITCH_IP, None);
    relays.tick(0);

    assert_eq!(relays.relay_state(0), RelayState::Off);
    let sent = relays.transport().sent_envelopes();
    assert_eq!(sent.len(), 1);
    let (to, reply) = &sent[0];
    assert_eq!(*to, SWITCH_IP);
    assert_eq!(reply.name.as_str(), "192.168.1.40");
    assert_eq!(reply.descr.as_str(), "Hallway");
    assert_eq!(reply.resp.as_str(), RESP_UNKNOWN);
    assert_eq!(reply.for_command.as_ref().map(|c| c.as_str()), Some("blink"));
}

#[test]
fn relay_state_survives_restart() {
    let mut relays = relay_module(HALL_IP, "hall", "Hall light").with_save_state(true);
    relays.set_relay_state(0, true);
    let saved = relays.store().relay.clone().unwrap();
    assert!(saved.relays[0].last);

    let mut rebooted: Relays = RelayControl::new(
        2,
        MockTransport::new(HALL_IP),
        MockStore::with_relay(saved),
        MockFeedback::new(),
    );
    rebooted
        .add_relay("relay1", MockRelay::new(), ActiveLevel::High, "")
        .unwrap();
    rebooted.start();

    assert_eq!(rebooted.relay_name(0), Some("hall"));
    assert_eq!(rebooted.relay_state(0), RelayState::On);
    assert!(rebooted.relay(0).unwrap().output().high);
}
