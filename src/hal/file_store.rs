//! Settings documents stored as JSON files.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::settings::{
    json, RelaySettings, SwitchSettings, DEFAULT_RELAY_FILE, DEFAULT_SWITCH_FILE,
    MAX_SETTINGS_SIZE,
};
use crate::traits::SettingsStore;

/// File store failure.
#[derive(Debug)]
pub enum FileStoreError {
    /// Open, read, or write failed.
    Io(io::Error),
    /// The file is not a valid settings document.
    Json(serde_json::Error),
    /// The file exceeds [`MAX_SETTINGS_SIZE`].
    TooLarge(u64),
}

impl fmt::Display for FileStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStoreError::Io(e) => write!(f, "settings file: {}", e),
            FileStoreError::Json(e) => write!(f, "settings document: {}", e),
            FileStoreError::TooLarge(n) => {
                write!(f, "settings file is {} bytes (max {})", n, MAX_SETTINGS_SIZE)
            }
        }
    }
}

impl std::error::Error for FileStoreError {}

impl From<io::Error> for FileStoreError {
    fn from(e: io::Error) -> Self {
        FileStoreError::Io(e)
    }
}

impl From<serde_json::Error> for FileStoreError {
    fn from(e: serde_json::Error) -> Self {
        FileStoreError::Json(e)
    }
}

/// One JSON file per document.
///
/// Writes replace the whole file; the last writer wins.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    relay_path: PathBuf,
    switch_path: PathBuf,
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_RELAY_FILE, DEFAULT_SWITCH_FILE)
    }
}

impl JsonFileStore {
    /// Store using the given file paths.
    pub fn new(relay_path: impl Into<PathBuf>, switch_path: impl Into<PathBuf>) -> Self {
        Self {
            relay_path: relay_path.into(),
            switch_path: switch_path.into(),
        }
    }

    /// Store with the default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(DEFAULT_RELAY_FILE), dir.join(DEFAULT_SWITCH_FILE))
    }

    /// Relay document path.
    pub fn relay_path(&self) -> &Path {
        &self.relay_path
    }

    /// Switch document path.
    pub fn switch_path(&self) -> &Path {
        &self.switch_path
    }
}

fn read_limited(path: &Path) -> Result<Option<Vec<u8>>, FileStoreError> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if size > MAX_SETTINGS_SIZE as u64 {
        return Err(FileStoreError::TooLarge(size));
    }
    debug!("reading {}", path.display());
    Ok(Some(fs::read(path)?))
}

impl SettingsStore for JsonFileStore {
    type Error = FileStoreError;

    fn load_relay_settings(&mut self) -> Result<Option<RelaySettings>, FileStoreError> {
        match read_limited(&self.relay_path)? {
            Some(bytes) => Ok(Some(json::relay_from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_relay_settings(&mut self, settings: &RelaySettings) -> Result<(), FileStoreError> {
        fs::write(&self.relay_path, json::relay_to_vec(settings)?)?;
        Ok(())
    }

    fn load_switch_settings(&mut self) -> Result<Option<SwitchSettings>, FileStoreError> {
        match read_limited(&self.switch_path)? {
            Some(bytes) => Ok(Some(json::switch_from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_switch_settings(&mut self, settings: &SwitchSettings) -> Result<(), FileStoreError> {
        fs::write(&self.switch_path, json::switch_to_vec(settings)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RelayRecord;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sr-control-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_is_none() {
        let mut store = JsonFileStore::in_dir(scratch_dir("missing"));
        assert!(store.load_relay_settings().unwrap().is_none());
        assert!(store.load_switch_settings().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let mut store = JsonFileStore::in_dir(scratch_dir("roundtrip"));
        let settings = RelaySettings {
            module: "Hall".into(),
            save_state: true,
            relays: vec![RelayRecord {
                name: "relay1".into(),
                descr: "Lamp".into(),
                last: true,
            }],
            ..Default::default()
        };
        store.save_relay_settings(&settings).unwrap();
        assert_eq!(store.load_relay_settings().unwrap(), Some(settings));

        let text = fs::read_to_string(store.relay_path()).unwrap();
        assert!(text.contains(r#""for":"relay""#));
    }

    #[test]
    fn corrupt_file_is_json_error() {
        let dir = scratch_dir("corrupt");
        let mut store = JsonFileStore::in_dir(&dir);
        fs::write(store.switch_path(), b"{not json").unwrap();
        assert!(matches!(
            store.load_switch_settings(),
            Err(FileStoreError::Json(_))
        ));
    }

    #[test]
    fn oversized_file_is_refused() {
        let dir = scratch_dir("oversized");
        let mut store = JsonFileStore::in_dir(&dir);
        fs::write(store.relay_path(), vec![b' '; MAX_SETTINGS_SIZE + 1]).unwrap();
        assert!(matches!(
            store.load_relay_settings(),
            Err(FileStoreError::TooLarge(_))
        ));
    }
}
