//! Wire envelope of the relay/switch UDP protocol.
//!
//! Every datagram is one flat JSON object. Two shapes are used:
//!
//! ```text
//! command   (switch -> relay)  {"name":"relay1","command":"switch"}
//! response  (relay -> switch)  {"name":"relay1","descr":"Lamp","for":"switch","resp":"on"}
//! ```
//!
//! `name` may be the sentinel [`ANY_RELAY`], addressing every relay in range.
//! `resp` is `"ok"` for discovery, `"on"`/`"off"` after a state change, or a
//! free-text diagnostic such as `"unknown command"`.
//!
//! Decoding is tolerant: missing or `null` fields come back empty. A buffer
//! that is not a JSON object yields [`CodecError::Invalid`] and the caller
//! drops the datagram.
//!
//! # Example
//!
//! ```rust
//! use sr_control::protocol::{decode, encode_command, Command, ANY_RELAY};
//!
//! let bytes = encode_command(ANY_RELAY, &Command::Respond).unwrap();
//! assert_eq!(&bytes[..], br#"{"name":"any_relay","command":"respond"}"#);
//!
//! let env = decode(&bytes).unwrap();
//! assert!(env.targets_all());
//! assert_eq!(env.command, Some(Command::Respond));
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{long_string, LongString};
use crate::traits::network::{Payload, MAX_DATAGRAM};

/// Name that addresses every relay in range.
pub const ANY_RELAY: &str = "any_relay";

/// Response value for a successful discovery.
pub const RESP_OK: &str = "ok";

/// Response value for a command the relay does not understand.
pub const RESP_UNKNOWN: &str = "unknown command";

// ============================================================================
// Command
// ============================================================================

/// Command carried in the `command` (or echoed in the `for`) field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Discovery: report name and description.
    Respond,
    /// Toggle.
    Switch,
    /// Force on.
    SetOn,
    /// Force off.
    SetOff,
    /// Anything else, kept verbatim for the diagnostic reply.
    Unknown(LongString),
}

impl Command {
    /// Decode a wire string.
    pub fn parse(s: &str) -> Self {
        match s {
            "respond" => Command::Respond,
            "switch" => Command::Switch,
            "set_on" => Command::SetOn,
            "set_off" => Command::SetOff,
            other => Command::Unknown(long_string(other)),
        }
    }

    /// Wire string.
    pub fn as_str(&self) -> &str {
        match self {
            Command::Respond => "respond",
            Command::Switch => "switch",
            Command::SetOn => "set_on",
            Command::SetOff => "set_off",
            Command::Unknown(s) => s.as_str(),
        }
    }

    /// `set_on` or `set_off` for a target state.
    pub const fn set(on: bool) -> Self {
        if on {
            Command::SetOn
        } else {
            Command::SetOff
        }
    }

    /// True for `switch`, `set_on`, and `set_off`.
    pub fn changes_state(&self) -> bool {
        matches!(self, Command::Switch | Command::SetOn | Command::SetOff)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Relay State
// ============================================================================

/// Logical relay state as reported on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RelayState {
    /// `"off"`
    #[default]
    Off,
    /// `"on"`
    On,
}

impl RelayState {
    /// State from a boolean.
    #[inline]
    pub const fn from_on(on: bool) -> Self {
        if on {
            RelayState::On
        } else {
            RelayState::Off
        }
    }

    /// True when on.
    #[inline]
    pub const fn is_on(self) -> bool {
        matches!(self, RelayState::On)
    }

    /// Wire string.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            RelayState::On => "on",
            RelayState::Off => "off",
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Codec failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecError {
    /// Not a JSON object, or a field has the wrong type.
    Invalid,
    /// Encoded message does not fit in a datagram.
    Overflow,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Invalid => f.write_str("invalid datagram"),
            CodecError::Overflow => f.write_str("message exceeds datagram size"),
        }
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// Decoded datagram. Absent text fields are empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Relay name, or [`ANY_RELAY`].
    pub name: LongString,
    /// Relay description (responses).
    pub descr: LongString,
    /// Command (command datagrams).
    pub command: Option<Command>,
    /// Command being answered (responses).
    pub for_command: Option<Command>,
    /// Result value (responses).
    pub resp: LongString,
}

impl Envelope {
    /// True if the name is the broadcast sentinel.
    pub fn targets_all(&self) -> bool {
        self.name.as_str() == ANY_RELAY
    }
}

#[derive(Deserialize)]
struct WireIn {
    #[serde(default)]
    name: Option<LongString>,
    #[serde(default)]
    descr: Option<LongString>,
    #[serde(default)]
    command: Option<LongString>,
    #[serde(default, rename = "for")]
    for_command: Option<LongString>,
    #[serde(default)]
    resp: Option<LongString>,
}

#[derive(Serialize)]
struct CommandOut<'a> {
    name: &'a str,
    command: &'a str,
}

#[derive(Serialize)]
struct ResponseOut<'a> {
    name: &'a str,
    descr: &'a str,
    #[serde(rename = "for")]
    for_command: &'a str,
    resp: &'a str,
}

/// Decode a received datagram.
pub fn decode(bytes: &[u8]) -> Result<Envelope, CodecError> {
    let (wire, _) =
        serde_json_core::from_slice::<WireIn>(bytes).map_err(|_| CodecError::Invalid)?;
    Ok(Envelope {
        name: wire.name.unwrap_or_default(),
        descr: wire.descr.unwrap_or_default(),
        command: wire.command.as_deref().map(Command::parse),
        for_command: wire.for_command.as_deref().map(Command::parse),
        resp: wire.resp.unwrap_or_default(),
    })
}

/// Encode a command datagram.
pub fn encode_command(name: &str, command: &Command) -> Result<Payload, CodecError> {
    let out = CommandOut {
        name,
        command: command.as_str(),
    };
    serde_json_core::to_vec::<_, MAX_DATAGRAM>(&out).map_err(|_| CodecError::Overflow)
}

/// Encode a response datagram.
pub fn encode_response(
    name: &str,
    descr: &str,
    for_command: &str,
    resp: &str,
) -> Result<Payload, CodecError> {
    let out = ResponseOut {
        name,
        descr,
        for_command,
        resp,
    };
    serde_json_core::to_vec::<_, MAX_DATAGRAM>(&out).map_err(|_| CodecError::Overflow)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_strings() {
        for cmd in [
            Command::Respond,
            Command::Switch,
            Command::SetOn,
            Command::SetOff,
        ] {
            assert_eq!(Command::parse(cmd.as_str()), cmd);
        }
        assert_eq!(Command::parse("bogus"), Command::Unknown(long_string("bogus")));
        assert_eq!(Command::set(true), Command::SetOn);
        assert!(!Command::Respond.changes_state());
    }

    #[test]
    fn response_field_order() {
        let bytes = encode_response("relay1", "Lamp", "switch", "on").unwrap();
        assert_eq!(
            &bytes[..],
            br#"{"name":"relay1","descr":"Lamp","for":"switch","resp":"on"}"#
        );
    }

    #[test]
    fn decode_response() {
        let env = decode(br#"{"name":"relay1","descr":"Lamp","for":"respond","resp":"ok"}"#)
            .unwrap();
        assert_eq!(env.name.as_str(), "relay1");
        assert_eq!(env.descr.as_str(), "Lamp");
        assert_eq!(env.for_command, Some(Command::Respond));
        assert_eq!(env.resp.as_str(), RESP_OK);
        assert_eq!(env.command, None);
    }

    #[test]
    fn missing_and_null_fields_are_empty() {
        let env = decode(br#"{"name":null,"command":"switch"}"#).unwrap();
        assert!(env.name.is_empty());
        assert!(env.descr.is_empty());
        assert!(env.resp.is_empty());
        assert_eq!(env.command, Some(Command::Switch));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let env = decode(br#"{"name":"r","command":"set_on","seq":7}"#).unwrap();
        assert_eq!(env.command, Some(Command::SetOn));
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(decode(b"not json"), Err(CodecError::Invalid));
        assert_eq!(decode(b""), Err(CodecError::Invalid));
        assert_eq!(decode(br#"{"name":5}"#), Err(CodecError::Invalid));
    }

    #[test]
    fn oversized_message_overflows() {
        let long = "x".repeat(120);
        assert_eq!(
            encode_response(&long, &long, "respond", "ok"),
            Err(CodecError::Overflow)
        );
    }

    #[test]
    fn non_ascii_description_survives() {
        let bytes = encode_response("relay1", "Розетка у окна", "respond", "ok").unwrap();
        let env = decode(&bytes).unwrap();
        assert_eq!(env.descr.as_str(), "Розетка у окна");
    }
}
