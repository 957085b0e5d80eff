use thiserror::Error;

/// Errors that can arise while reading or writing player sessions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when a stored record carries an unexpected schema version.
    #[error("schema mismatch for session {user}: expected {expected}, got {found}")]
    SchemaMismatch {
        user: String,
        expected: u8,
        found: u8,
    },

    /// Returned when a stored record is empty or truncated.
    #[error("corrupt session record for {0}")]
    Corrupt(String),

    /// The store cannot serve requests (poisoned lock, closed database).
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
