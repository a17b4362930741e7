//! Shared application state injected into every Axum handler.

use chrono::Duration;

use crate::password::PasswordHasher;
use crate::policy::FieldPolicy;
use crate::store::Datastore;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-backed or plain values) so that
/// Axum can clone the state for each request without copying expensive data.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Handle to the SQLite datastore.
    pub store: Datastore,
    /// Seals and reveals the encrypted columns.
    pub policy: FieldPolicy,
    /// Hashes and verifies account passwords.
    pub passwords: PasswordHasher,
    /// How recently a user must have been active to count as online.
    pub online_threshold: Duration,
}

impl AppState {
    /// Create a new [`AppState`] from its collaborators.
    pub fn new(
        store: Datastore,
        policy: FieldPolicy,
        passwords: PasswordHasher,
        online_threshold: Duration,
    ) -> Self {
        Self {
            store,
            policy,
            passwords,
            online_threshold,
        }
    }
}

#[cfg(test)]
impl Default for AppState {
    /// An in-memory datastore, a fixed test key and cheap password hashing.
    fn default() -> Self {
        Self::new(
            Datastore::in_memory().unwrap(),
            crate::policy::test_policy(),
            PasswordHasher::fast(),
            Duration::seconds(300),
        )
    }
}
