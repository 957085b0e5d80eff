use std::path::Path;

use sled::IVec;

use super::errors::StoreError;
use super::SessionStore;
use crate::game::Session;

const TREE_SESSIONS: &str = "sessions";

/// Version byte written in front of every encoded session. Bump when `Session` changes shape.
pub const SESSION_SCHEMA_VERSION: u8 = 1;

/// Sled-backed persistence for player sessions.
///
/// Records are stored under `sessions:<user_id>` as one schema-version byte followed by the
/// bincode encoding of [`Session`]. The version is checked before decoding so an old record is
/// reported as [`StoreError::SchemaMismatch`] rather than decoded into garbage.
pub struct SledSessionStore {
    _db: sled::Db,
    sessions: sled::Tree,
}

impl SledSessionStore {
    /// Open (or create) the session database rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path.as_ref())?;
        let db = sled::open(path.as_ref())?;
        let sessions = db.open_tree(TREE_SESSIONS)?;
        Ok(Self { _db: db, sessions })
    }

    fn session_key(user_id: &str) -> Vec<u8> {
        format!("sessions:{}", user_id).into_bytes()
    }

    fn encode(session: &Session) -> Result<Vec<u8>, StoreError> {
        let body = bincode::serialize(session)?;
        let mut bytes = Vec::with_capacity(body.len() + 1);
        bytes.push(SESSION_SCHEMA_VERSION);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    fn decode(user_id: &str, bytes: IVec) -> Result<Session, StoreError> {
        let Some((&version, body)) = bytes.split_first() else {
            return Err(StoreError::Corrupt(user_id.to_string()));
        };
        if version != SESSION_SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                user: user_id.to_string(),
                expected: SESSION_SCHEMA_VERSION,
                found: version,
            });
        }
        Ok(bincode::deserialize::<Session>(body)?)
    }
}

impl SessionStore for SledSessionStore {
    fn get_session(&self, user_id: &str) -> Result<Session, StoreError> {
        let key = Self::session_key(user_id);
        let Some(bytes) = self.sessions.get(&key)? else {
            return Ok(Session::default());
        };
        Self::decode(user_id, bytes)
    }

    fn put_session(&self, user_id: &str, session: &Session) -> Result<(), StoreError> {
        let key = Self::session_key(user_id);
        let bytes = Self::encode(session)?;
        self.sessions.insert(key, bytes)?;
        self.sessions.flush()?;
        Ok(())
    }

    fn session_count(&self) -> Result<usize, StoreError> {
        Ok(self.sessions.scan_prefix(b"sessions:").count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SledSessionStore::open(dir.path()).unwrap();
            let mut s = Session::default();
            s.start_round(Some("開花結果".into()));
            s.accept_user_word("果實纍纍");
            store.put_session("U123", &s).unwrap();
        }
        let store = SledSessionStore::open(dir.path()).unwrap();
        let s = store.get_session("U123").unwrap();
        assert!(s.active);
        assert_eq!(s.last_word.as_deref(), Some("果實纍纍"));
        assert!(s.is_used("開花結果"));
        assert_eq!(s.score, 1);
        assert_eq!(store.get_session("U124").unwrap(), Session::default());
        assert_eq!(store.session_count().unwrap(), 1);
    }

    #[test]
    fn unknown_user_gets_default_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledSessionStore::open(dir.path()).unwrap();
        assert_eq!(store.get_session("nobody").unwrap(), Session::default());
        assert_eq!(store.session_count().unwrap(), 0);
    }

    #[test]
    fn schema_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledSessionStore::open(dir.path()).unwrap();
        store
            .sessions
            .insert(SledSessionStore::session_key("old"), vec![99u8, 0, 0])
            .unwrap();
        match store.get_session("old") {
            Err(StoreError::SchemaMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, SESSION_SCHEMA_VERSION);
                assert_eq!(found, 99);
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }

        store
            .sessions
            .insert(SledSessionStore::session_key("empty"), Vec::<u8>::new())
            .unwrap();
        assert!(matches!(
            store.get_session("empty"),
            Err(StoreError::Corrupt(_))
        ));
    }
}
