//! Persisted configuration documents for relay and switch modules.
//!
//! The same JSON shape is used for the settings file, for
//! `GET /relay_getconfig` / `GET /switch_getconfig`, and for the body of
//! `POST /sr_setconfig`:
//!
//! ```text
//! {"module":"Hall","for":"relay","save_state":1,"wificonf":"","relconf":"/relay_config",
//!  "relays":[{"name":"relay1","descr":"Lamp","last":0}]}
//!
//! {"module":"Hall switch","for":"switch","wificonf":"","relconf":"/relay_config",
//!  "relays":[{"name":"relay1","descr":"Lamp","addr":"192.168.1.40"}]}
//! ```
//!
//! Flags are written as `0`/`1` and read back from either numbers or bools.
//! Missing or `null` strings read as empty.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Deserializer, Serialize};

/// Largest settings document accepted from storage.
pub const MAX_SETTINGS_SIZE: usize = 4096;

/// Default settings file for relay modules.
pub const DEFAULT_RELAY_FILE: &str = "relay.json";

/// Default settings file for switch modules.
pub const DEFAULT_SWITCH_FILE: &str = "switch.json";

// ============================================================================
// Relay Settings
// ============================================================================

/// One relay entry as persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRecord {
    /// Network name of the relay.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Human-readable label.
    #[serde(default, deserialize_with = "lenient_string")]
    pub descr: String,
    /// Last logical state (`true` = on).
    #[serde(default, with = "flag")]
    pub last: bool,
}

/// Settings document of a relay module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Module description.
    #[serde(default, deserialize_with = "lenient_string")]
    pub module: String,
    /// Persist relay state on every change and restore it at start.
    #[serde(default, with = "flag")]
    pub save_state: bool,
    /// Path of the WiFi configuration page, if any.
    #[serde(default, deserialize_with = "lenient_string")]
    pub wificonf: String,
    /// Path of the relay configuration page.
    #[serde(default, deserialize_with = "lenient_string")]
    pub relconf: String,
    /// Relay entries, by slot.
    #[serde(default)]
    pub relays: Vec<RelayRecord>,
}

// ============================================================================
// Switch Settings
// ============================================================================

/// One remote relay binding as persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRecord {
    /// Name of the remote relay.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Last discovered description.
    #[serde(default, deserialize_with = "lenient_string")]
    pub descr: String,
    /// Last discovered address, dotted quad.
    #[serde(default, deserialize_with = "lenient_string")]
    pub addr: String,
}

/// Settings document of a switch module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchSettings {
    /// Module description.
    #[serde(default, deserialize_with = "lenient_string")]
    pub module: String,
    /// Path of the WiFi configuration page, if any.
    #[serde(default, deserialize_with = "lenient_string")]
    pub wificonf: String,
    /// Path of the relay configuration page.
    #[serde(default, deserialize_with = "lenient_string")]
    pub relconf: String,
    /// Bindings, by slot.
    #[serde(default)]
    pub relays: Vec<SwitchRecord>,
}

// ============================================================================
// Live State Report
// ============================================================================

/// Live relay states for UI polling: `{"relays":[{"name","descr","last"}]}`.
///
/// `last` carries the state read back from hardware.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReport {
    /// One record per relay slot.
    pub relays: Vec<RelayRecord>,
}

// ============================================================================
// Tagged Documents
// ============================================================================

/// A settings document dispatched on its `"for"` field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "for", rename_all = "lowercase")]
pub enum SettingsDocument {
    /// `"for": "relay"`
    Relay(RelaySettings),
    /// `"for": "switch"`
    Switch(SwitchSettings),
}

/// Borrowed form of [`SettingsDocument`] for serialization.
#[derive(Serialize)]
#[serde(tag = "for", rename_all = "lowercase")]
pub enum DocumentRef<'a> {
    /// Relay document.
    Relay(&'a RelaySettings),
    /// Switch document.
    Switch(&'a SwitchSettings),
}

/// Ensure a page path starts with `/`. Empty stays empty.
pub fn normalize_page(path: &str) -> String {
    let mut out = String::new();
    if !path.is_empty() && !path.starts_with('/') {
        out.push('/');
    }
    out.push_str(path);
    out
}

/// Longest key NVS accepts.
pub const MAX_STORAGE_KEY: usize = 15;

/// Storage key for a settings file name: the file stem without directories
/// or extension, cut to [`MAX_STORAGE_KEY`] bytes.
///
/// `"/spiffs/relay.json"` becomes `"relay"`.
pub fn storage_key(file: &str) -> &str {
    let name = file.rsplit('/').next().unwrap_or(file);
    let stem = match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    };
    let mut end = stem.len().min(MAX_STORAGE_KEY);
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    &stem[..end]
}

// ============================================================================
// JSON helpers (std)
// ============================================================================

/// JSON encoding of settings documents.
#[cfg(feature = "std")]
pub mod json {
    use super::*;

    /// Serialize a relay document, including its `"for"` tag.
    pub fn relay_to_vec(settings: &RelaySettings) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&DocumentRef::Relay(settings))
    }

    /// Serialize a switch document, including its `"for"` tag.
    pub fn switch_to_vec(settings: &SwitchSettings) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&DocumentRef::Switch(settings))
    }

    /// Parse a relay document. The `"for"` tag is not required.
    pub fn relay_from_slice(bytes: &[u8]) -> serde_json::Result<RelaySettings> {
        serde_json::from_slice(bytes)
    }

    /// Parse a switch document. The `"for"` tag is not required.
    pub fn switch_from_slice(bytes: &[u8]) -> serde_json::Result<SwitchSettings> {
        serde_json::from_slice(bytes)
    }

    /// Parse a document posted to `/sr_setconfig`.
    pub fn document_from_slice(bytes: &[u8]) -> serde_json::Result<SettingsDocument> {
        serde_json::from_slice(bytes)
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `0`/`1` flag encoding.
mod flag {
    use core::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }

    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a bool or a number")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<bool, E> {
            Ok(v != 0.0)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            Ok(matches!(v, "1" | "true" | "on"))
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }

        fn visit_none<E: de::Error>(self) -> Result<bool, E> {
            Ok(false)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
