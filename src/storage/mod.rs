//! # Session Storage
//!
//! Pluggable persistence for per-user [`Session`]s.
//!
//! - [`MemorySessionStore`] - ephemeral map, lost on restart
//! - [`SledSessionStore`] - durable sled database with versioned bincode records
//!
//! The engine only needs "read the latest session for a user" and "replace it"; it serializes
//! access per user itself, so stores do not have to provide read-modify-write transactions.

pub mod errors;
pub mod sled_store;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::game::Session;

pub use errors::StoreError;
pub use sled_store::SledSessionStore;

/// Session persistence used by the game engine.
pub trait SessionStore: Send + Sync {
    /// Fetch the session for `user_id`, or a fresh default when none was stored yet.
    fn get_session(&self, user_id: &str) -> Result<Session, StoreError>;

    /// Replace the stored session for `user_id`. Later reads must observe this write.
    fn put_session(&self, user_id: &str, session: &Session) -> Result<(), StoreError>;

    /// Number of stored sessions.
    fn session_count(&self) -> Result<usize, StoreError>;
}

/// In-process session map.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_session(&self, user_id: &str) -> Result<Session, StoreError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| StoreError::Unavailable("session map lock poisoned".into()))?;
        Ok(guard.get(user_id).cloned().unwrap_or_default())
    }

    fn put_session(&self, user_id: &str, session: &Session) -> Result<(), StoreError> {
        let mut guard = self
            .sessions
            .write()
            .map_err(|_| StoreError::Unavailable("session map lock poisoned".into()))?;
        guard.insert(user_id.to_string(), session.clone());
        Ok(())
    }

    fn session_count(&self) -> Result<usize, StoreError> {
        let guard = self
            .sessions
            .read()
            .map_err(|_| StoreError::Unavailable("session map lock poisoned".into()))?;
        Ok(guard.len())
    }
}

/// Open the store selected by `[storage]`. Failing to open a durable store is fatal at startup.
pub fn open_session_store(config: &StorageConfig) -> Result<Arc<dyn SessionStore>, StoreError> {
    match config.backend {
        StorageBackend::Memory => {
            info!("storage: in-memory sessions (not persisted across restarts)");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        StorageBackend::Sled => {
            let path = config.sessions_path();
            let store = SledSessionStore::open(&path)?;
            info!("storage: sled sessions at {}", path.display());
            Ok(Arc::new(store))
        }
    }
}
