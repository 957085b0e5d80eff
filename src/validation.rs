//! Input validation for decoded inbound chat messages.

/// Longest accepted platform user id, in bytes. LINE ids are 33 bytes; other platforms stay well below this.
pub const MAX_USER_ID_LEN: usize = 128;

/// Longest word the game will consider, in characters. Longer plays are rejected as not a word.
pub const MAX_WORD_CHARS: usize = 64;

/// User id validation errors with helpful messages
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UserIdError {
    #[error("User id is empty")]
    Empty,

    #[error("User id is too long (maximum {max} bytes)")]
    TooLong { max: usize },

    #[error("User id contains whitespace or control characters")]
    InvalidCharacters,
}

/// Validate an opaque platform user id before it is used as a session key.
///
/// Ids are treated as case-sensitive tokens: no trimming or case folding is applied, since
/// platforms such as LINE distinguish ids by exact bytes.
pub fn validate_user_id(user_id: &str) -> Result<(), UserIdError> {
    if user_id.is_empty() {
        return Err(UserIdError::Empty);
    }
    if user_id.len() > MAX_USER_ID_LEN {
        return Err(UserIdError::TooLong {
            max: MAX_USER_ID_LEN,
        });
    }
    if user_id
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(UserIdError::InvalidCharacters);
    }
    Ok(())
}

/// Normalize incoming chat text: trim surrounding whitespace, including the ideographic
/// space U+3000 that CJK keyboards insert. The text is never shortened.
pub fn normalize_message(text: &str) -> String {
    text.trim().to_string()
}
