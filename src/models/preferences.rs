//! Persisted display preferences.
//!
//! Preferences live in a flat string key/value store (browser local storage in a web
//! deployment, a JSON file or memory here). [`PreferenceStore`] puts typed values
//! and defaults on top of any [`PreferenceStorage`] and writes through on every change.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::observer::SessionObserver;

const PREFERENCES_FILENAME: &str = "preferences.json";

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceKey {
    BoardVisible,
    PiecesVisible,
    BoardSizePercent,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 3] = [
        PreferenceKey::BoardVisible,
        PreferenceKey::PiecesVisible,
        PreferenceKey::BoardSizePercent,
    ];

    /// Key under which the value is persisted
    pub fn storage_key(self) -> &'static str {
        match self {
            PreferenceKey::BoardVisible => "showBoard",
            PreferenceKey::PiecesVisible => "showPieces",
            PreferenceKey::BoardSizePercent => "boardSize",
        }
    }

    pub fn default_value(self) -> PreferenceValue {
        match self {
            PreferenceKey::BoardVisible | PreferenceKey::PiecesVisible => PreferenceValue::Flag(true),
            PreferenceKey::BoardSizePercent => PreferenceValue::Percent(100.0),
        }
    }

    fn parse(self, raw: &str) -> Option<PreferenceValue> {
        match self {
            PreferenceKey::BoardVisible | PreferenceKey::PiecesVisible => {
                raw.trim().parse::<bool>().ok().map(PreferenceValue::Flag)
            }
            PreferenceKey::BoardSizePercent => raw
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|p| p.is_finite())
                .map(|p| PreferenceValue::Percent(p.clamp(0.0, 100.0))),
        }
    }

    fn accepts(self, value: PreferenceValue) -> bool {
        match (self, value) {
            (PreferenceKey::BoardVisible | PreferenceKey::PiecesVisible, PreferenceValue::Flag(_)) => {
                true
            }
            // NaN and infinity have no board width
            (PreferenceKey::BoardSizePercent, PreferenceValue::Percent(p)) => p.is_finite(),
            _ => false,
        }
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub enum PreferenceValue {
    Flag(bool),
    Percent(f32),
}

impl PreferenceValue {
    pub fn as_flag(self) -> Option<bool> {
        match self {
            PreferenceValue::Flag(b) => Some(b),
            PreferenceValue::Percent(_) => None,
        }
    }

    pub fn as_percent(self) -> Option<f32> {
        match self {
            PreferenceValue::Percent(p) => Some(p),
            PreferenceValue::Flag(_) => None,
        }
    }
}

impl fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceValue::Flag(b) => write!(f, "{b}"),
            PreferenceValue::Percent(p) => write!(f, "{p}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to write preferences to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("value {value} does not fit preference {key}")]
    TypeMismatch {
        key: PreferenceKey,
        value: PreferenceValue,
    },
}

/// Raw string storage behind the preference store
pub trait PreferenceStorage {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory storage. Clones share the same entries, so a store rebuilt from a clone
/// sees everything written before (a simulated reload).
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file storage, rewritten on every change
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open the file at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => {
                    info!("loaded preferences from {:?}", path);
                    entries
                }
                Err(e) => {
                    warn!("failed to parse preferences at {:?}: {}. Using defaults.", path, e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no preferences file at {:?}. Using defaults.", path);
                BTreeMap::new()
            }
            Err(e) => {
                warn!("failed to read preferences at {:?}: {}. Using defaults.", path, e);
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    /// `preferences.json` in the platform config directory, or the working directory
    /// when there is none
    pub fn default_path() -> PathBuf {
        match ProjectDirs::from("org", "chess-sync", "chess-sync") {
            Some(dirs) => dirs.config_dir().join(PREFERENCES_FILENAME),
            None => PathBuf::from(PREFERENCES_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStorage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Typed preferences with documented defaults
pub struct PreferenceStore<S> {
    storage: S,
    observer: Option<Rc<dyn SessionObserver>>,
}

impl<S: PreferenceStorage> PreferenceStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Rc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Current value, or the default when unset or unparsable
    pub fn get(&self, key: PreferenceKey) -> PreferenceValue {
        self.storage
            .read(key.storage_key())
            .and_then(|raw| key.parse(&raw))
            .unwrap_or_else(|| key.default_value())
    }

    /// Store a value and tell the observer about it
    pub fn set(&mut self, key: PreferenceKey, value: PreferenceValue) -> Result<(), StorageError> {
        if !key.accepts(value) {
            return Err(StorageError::TypeMismatch { key, value });
        }
        let value = match value {
            PreferenceValue::Percent(p) => PreferenceValue::Percent(p.clamp(0.0, 100.0)),
            flag => flag,
        };
        self.storage.write(key.storage_key(), &value.to_string())?;
        if let Some(observer) = &self.observer {
            observer.on_preference_changed(key, value);
        }
        Ok(())
    }

    pub fn board_visible(&self) -> bool {
        self.get(PreferenceKey::BoardVisible).as_flag().unwrap_or(true)
    }

    pub fn pieces_visible(&self) -> bool {
        self.get(PreferenceKey::PiecesVisible).as_flag().unwrap_or(true)
    }

    pub fn board_size_percent(&self) -> f32 {
        self.get(PreferenceKey::BoardSizePercent)
            .as_percent()
            .unwrap_or(100.0)
    }

    pub fn set_board_visible(&mut self, visible: bool) -> Result<(), StorageError> {
        self.set(PreferenceKey::BoardVisible, PreferenceValue::Flag(visible))
    }

    pub fn set_pieces_visible(&mut self, visible: bool) -> Result<(), StorageError> {
        self.set(PreferenceKey::PiecesVisible, PreferenceValue::Flag(visible))
    }

    pub fn set_board_size_percent(&mut self, percent: f32) -> Result<(), StorageError> {
        self.set(PreferenceKey::BoardSizePercent, PreferenceValue::Percent(percent))
    }
}
