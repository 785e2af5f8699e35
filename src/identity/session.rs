use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, warn};

use super::principal::Identity;

/// Fixed key of the durable slot holding the serialized identity.
pub const SESSION_KEY: &str = "current_session";

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("slot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("slot encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable key-value slot backing the session across restarts.
pub trait SessionSlot: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, SlotError>;
    fn store(&self, key: &str, value: &str) -> Result<(), SlotError>;
    fn remove(&self, key: &str) -> Result<(), SlotError>;
}

/// Slot persisted as a single file; the key is only used for logging since one
/// file holds one slot.
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
}

impl SessionSlot for FileSlot {
    fn load(&self, key: &str) -> Result<Option<String>, SlotError> {
        if !self.path.exists() { return Ok(None); }
        let s = std::fs::read_to_string(&self.path)?;
        debug!(target: "session", key, path = %self.path.display(), "slot.load");
        Ok(Some(s))
    }

    fn store(&self, key: &str, value: &str) -> Result<(), SlotError> {
        if let Some(dir) = self.path.parent() { std::fs::create_dir_all(dir).ok(); }
        // write-then-rename so a crash never leaves a half-written slot
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(target: "session", key, path = %self.path.display(), "slot.store");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SlotError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => { debug!(target: "session", key, "slot.remove"); Ok(()) }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub struct MemorySlot {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySlot {
    pub fn new() -> Self { Self::default() }

    /// Pre-populate the slot, e.g. with data written by a previous process.
    pub fn with_value(key: &str, value: &str) -> Self {
        let slot = Self::default();
        slot.values.lock().insert(key.to_string(), value.to_string());
        slot
    }

    pub fn raw(&self, key: &str) -> Option<String> { self.values.lock().get(key).cloned() }
}

impl SessionSlot for MemorySlot {
    fn load(&self, key: &str) -> Result<Option<String>, SlotError> { Ok(self.values.lock().get(key).cloned()) }

    fn store(&self, key: &str, value: &str) -> Result<(), SlotError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SlotError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

impl<T: SessionSlot + ?Sized> SessionSlot for std::sync::Arc<T> {
    fn load(&self, key: &str) -> Result<Option<String>, SlotError> { (**self).load(key) }
    fn store(&self, key: &str, value: &str) -> Result<(), SlotError> { (**self).store(key, value) }
    fn remove(&self, key: &str) -> Result<(), SlotError> { (**self).remove(key) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub identity: Option<Identity>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool { self.identity.is_some() }
}

/// Holds the single session of this process. Storage failures never escape:
/// they are logged and the store degrades to "no session".
pub struct SessionStore {
    current: RwLock<Session>,
    slot: Box<dyn SessionSlot>,
}

impl SessionStore {
    /// Open the store and hydrate it from the slot. Unreadable or malformed
    /// data is treated as logged out.
    pub fn open(slot: Box<dyn SessionSlot>) -> Self {
        let identity = match slot.load(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Identity>(&raw) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!(target: "session", "ignoring malformed session slot: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(target: "session", "session slot unreadable: {}", e);
                None
            }
        };
        if let Some(id) = &identity { debug!(target: "session", email = %id.email, "session.rehydrated"); }
        Self { current: RwLock::new(Session { identity }), slot }
    }

    pub fn get(&self) -> Session { self.current.read().clone() }

    pub fn set(&self, identity: Identity) {
        let encoded = serde_json::to_string(&identity).map_err(SlotError::from);
        *self.current.write() = Session { identity: Some(identity) };
        if let Err(e) = encoded.and_then(|s| self.slot.store(SESSION_KEY, &s)) {
            warn!(target: "session", "session slot write failed: {}", e);
        }
    }

    pub fn clear(&self) {
        *self.current.write() = Session::default();
        if let Err(e) = self.slot.remove(SESSION_KEY) {
            warn!(target: "session", "session slot remove failed: {}", e);
        }
    }
}
