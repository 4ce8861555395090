//! Settings documents kept in the ESP-IDF NVS partition.
//!
//! Each document is one blob under its own key, serialized with the same
//! JSON layout the HTTP API uses.

use std::fmt;

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sys::EspError;
use log::debug;

use crate::settings::{
    json, storage_key, RelaySettings, SwitchSettings, DEFAULT_RELAY_FILE, DEFAULT_SWITCH_FILE,
    MAX_SETTINGS_SIZE,
};
use crate::traits::SettingsStore;

/// NVS namespace used by [`EspNvsStore::new`].
pub const NVS_NAMESPACE: &str = "sr_control";

/// NVS store failure.
#[derive(Debug)]
pub enum NvsStoreError {
    /// The NVS driver reported an error.
    Esp(EspError),
    /// The stored blob is not a valid settings document.
    Json(serde_json::Error),
    /// The serialized document exceeds [`MAX_SETTINGS_SIZE`].
    TooLarge(usize),
    /// The storage keys are empty or collide.
    Key(String),
}

impl fmt::Display for NvsStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NvsStoreError::Esp(e) => write!(f, "nvs: {}", e),
            NvsStoreError::Json(e) => write!(f, "settings document: {}", e),
            NvsStoreError::TooLarge(n) => {
                write!(f, "settings document is {} bytes (max {})", n, MAX_SETTINGS_SIZE)
            }
            NvsStoreError::Key(key) => write!(f, "unusable settings key '{}'", key),
        }
    }
}

impl std::error::Error for NvsStoreError {}

impl From<EspError> for NvsStoreError {
    fn from(e: EspError) -> Self {
        NvsStoreError::Esp(e)
    }
}

impl From<serde_json::Error> for NvsStoreError {
    fn from(e: serde_json::Error) -> Self {
        NvsStoreError::Json(e)
    }
}

/// Settings store over an open NVS namespace.
pub struct EspNvsStore {
    nvs: EspNvs<NvsDefault>,
    relay_key: String,
    switch_key: String,
}

impl EspNvsStore {
    /// Open [`NVS_NAMESPACE`] read-write with the default keys.
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, NvsStoreError> {
        Self::with_keys(partition, DEFAULT_RELAY_FILE, DEFAULT_SWITCH_FILE)
    }

    /// Open [`NVS_NAMESPACE`] read-write, keeping the documents under the
    /// keys derived from the given file names (see [`storage_key`]).
    pub fn with_keys(
        partition: EspDefaultNvsPartition,
        relay_file: &str,
        switch_file: &str,
    ) -> Result<Self, NvsStoreError> {
        Self::with_namespace(partition, NVS_NAMESPACE, relay_file, switch_file)
    }

    /// Open `namespace` read-write.
    pub fn with_namespace(
        partition: EspDefaultNvsPartition,
        namespace: &str,
        relay_file: &str,
        switch_file: &str,
    ) -> Result<Self, NvsStoreError> {
        let relay_key = storage_key(relay_file).to_owned();
        let switch_key = storage_key(switch_file).to_owned();
        if relay_key.is_empty() || switch_key.is_empty() || relay_key == switch_key {
            return Err(NvsStoreError::Key(format!("{}/{}", relay_key, switch_key)));
        }
        debug!("nvs: {} keys {} / {}", namespace, relay_key, switch_key);
        Ok(Self {
            nvs: EspNvs::new(partition, namespace, true)?,
            relay_key,
            switch_key,
        })
    }

    /// Keys of the relay and switch documents.
    pub fn keys(&self) -> (&str, &str) {
        (&self.relay_key, &self.switch_key)
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, NvsStoreError> {
        let len = match self.nvs.blob_len(key)? {
            Some(len) => len,
            None => return Ok(None),
        };
        if len > MAX_SETTINGS_SIZE {
            return Err(NvsStoreError::TooLarge(len));
        }
        let mut buffer = vec![0u8; len];
        debug!("nvs: reading {} ({} bytes)", key, len);
        Ok(self.nvs.get_blob(key, &mut buffer)?.map(<[u8]>::to_vec))
    }

    fn write(&mut self, key: &str, payload: &[u8]) -> Result<(), NvsStoreError> {
        if payload.len() > MAX_SETTINGS_SIZE {
            return Err(NvsStoreError::TooLarge(payload.len()));
        }
        self.nvs.set_blob(key, payload)?;
        Ok(())
    }
}

impl SettingsStore for EspNvsStore {
    type Error = NvsStoreError;

    fn load_relay_settings(&mut self) -> Result<Option<RelaySettings>, NvsStoreError> {
        match self.read(&self.relay_key)? {
            Some(bytes) => Ok(Some(json::relay_from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_relay_settings(&mut self, settings: &RelaySettings) -> Result<(), NvsStoreError> {
        let payload = json::relay_to_vec(settings)?;
        let key = self.relay_key.clone();
        self.write(&key, &payload)
    }

    fn load_switch_settings(&mut self) -> Result<Option<SwitchSettings>, NvsStoreError> {
        match self.read(&self.switch_key)? {
            Some(bytes) => Ok(Some(json::switch_from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_switch_settings(&mut self, settings: &SwitchSettings) -> Result<(), NvsStoreError> {
        let payload = json::switch_to_vec(settings)?;
        let key = self.switch_key.clone();
        self.write(&key, &payload)
    }
}
