//! Online presence derived from `users.last_active_at`.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};

/// Timestamp layout written by SQLite's `CURRENT_TIMESTAMP` (UTC).
pub const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Whether a user last seen at `last_active` counts as online at `now`.
///
/// A missing or unparseable timestamp is offline.
pub fn is_online(last_active: Option<&str>, now: NaiveDateTime, threshold: Duration) -> bool {
    let Some(raw) = last_active else {
        return false;
    };
    match NaiveDateTime::parse_from_str(raw, SQLITE_TIMESTAMP) {
        Ok(seen) => now.signed_duration_since(seen) <= threshold,
        Err(_) => false,
    }
}

/// Map every `(user_id, last_active_at)` pair to its online flag.
pub fn online_map(
    activity: Vec<(i64, Option<String>)>,
    now: NaiveDateTime,
    threshold: Duration,
) -> BTreeMap<i64, bool> {
    activity
        .into_iter()
        .map(|(id, seen)| (id, is_online(seen.as_deref(), now, threshold)))
        .collect()
}
