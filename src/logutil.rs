//! Logging helpers that keep chat text and platform identifiers readable on a single log line.

use std::fmt::Write;

/// Longest preview of user text written to the log, in characters.
const MAX_PREVIEW_CHARS: usize = 120;

/// Escape user-supplied chat text for single-line logging.
///
/// Newlines, carriage returns, tabs and backslashes are escaped; other control characters
/// become `\xNN` (or `\u{..}` above 0xFF). CJK text passes through untouched. Text longer than
/// [`MAX_PREVIEW_CHARS`] characters is cut with an ellipsis.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW_CHARS * 4) + 4);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW_CHARS {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() && (c as u32) <= 0xFF => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c if c.is_control() => {
                let _ = write!(&mut out, "\\u{{{:X}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Shorten a platform user id for log lines. Chat platforms hand out long opaque ids
/// (e.g. `U` followed by 32 hex digits); the first and last four characters are enough to
/// correlate lines without filling the log.
pub fn short_user(user_id: &str) -> String {
    let count = user_id.chars().count();
    if count <= 12 {
        return escape_log(user_id);
    }
    let head: String = user_id.chars().take(4).collect();
    let tail: String = user_id.chars().skip(count - 4).collect();
    format!("{}…{}", escape_log(&head), escape_log(&tail))
}
