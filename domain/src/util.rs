//! Shared utility functions.

use sha2::{Digest, Sha256};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Milliseconds in one day, for telemetry lookback windows.
pub const DAY_MILLIS: u64 = 86_400_000;

/// Shorten text for log lines, cutting on a UTF-8 boundary and appending `...`.
pub fn preview(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Hex SHA-256 digest of `parts`, each separated by a unit separator.
///
/// Used for ids and cache keys that must survive restarts.
pub fn digest_hex(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\x1f");
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
