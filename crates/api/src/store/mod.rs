//! SQLite-backed persistence for accounts, posts, messages and the social graph.
//!
//! # Responsibilities
//!
//! - Own the single [`rusqlite::Connection`] behind a mutex.
//! - Create each table the first time a query touches it ([`schema`]).
//! - Map rows to the response types in [`common::protocol`].
//!
//! # Module invariants
//!
//! - Sensitive columns are written and read as opaque strings; sealing and
//!   revealing happen in [`crate::policy`], never here.
//! - The connection lock is never held across an `.await`.

pub mod friends;
pub mod likes;
pub mod messages;
pub mod posts;
pub mod schema;
pub mod users;

pub use friends::FriendStatus;
pub use users::{NewUser, ProfileChange};

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;
use thiserror::Error;

use schema::Table;

/// Errors produced by the datastore.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Any failure reported by SQLite.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Whether SQLite rejected the write on a `UNIQUE` or `CHECK` constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

struct Inner {
    conn: Connection,
    ensured: HashSet<Table>,
}

/// Shared handle to the SQLite database.
///
/// Cloning is cheap; all clones use the same connection.
#[derive(Clone)]
pub struct Datastore {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datastore").finish_non_exhaustive()
    }
}

impl Datastore {
    /// Open (or create) the database file at `path`.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self::from_connection(conn))
    }

    /// A fresh in-memory database.
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                conn,
                ensured: HashSet::new(),
            })),
        }
    }

    /// Run `f` against the connection after making sure `tables` exist.
    pub(crate) fn with<T>(
        &self,
        tables: &[Table],
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> StoreResult<T> {
        let mut guard = self.inner.lock();
        let Inner { conn, ensured } = &mut *guard;
        for table in tables {
            if !ensured.contains(table) {
                schema::ensure(conn, *table)?;
                ensured.insert(*table);
            }
        }
        Ok(f(conn)?)
    }

    /// Whether the database answers a trivial query.
    pub fn ping(&self) -> bool {
        self.with(&[], |conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .is_ok()
    }
}

/// Placeholders for an `IN (...)` clause with `n` parameters, numbered from
/// `first`.
pub(crate) fn placeholders(first: usize, n: usize) -> String {
    (first..first + n)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_in_memory() {
        let store = Datastore::in_memory().unwrap();
        assert!(store.ping());
    }

    #[test]
    fn clones_share_the_connection() {
        let store = Datastore::in_memory().unwrap();
        let id = fixtures::user(&store, "Deniz");
        let clone = store.clone();
        assert!(clone.user_by_id(id).unwrap().is_some());
    }

    #[test]
    fn unique_violation_is_detected() {
        let store = Datastore::in_memory().unwrap();
        fixtures::user(&store, "Deniz");
        let err = store
            .insert_user(&NewUser {
                full_name: "Deniz",
                email: "deniz@example.com",
                phone: "1",
                password_hash: "x",
                gender: "x",
                age: 1,
                location: "",
                bio: None,
            })
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn placeholders_are_numbered() {
        assert_eq!(placeholders(2, 3), "?2, ?3, ?4");
        assert_eq!(placeholders(1, 1), "?1");
    }

    #[test]
    fn debug_does_not_expose_connection() {
        let store = Datastore::in_memory().unwrap();
        assert_eq!(format!("{store:?}"), "Datastore { .. }");
    }
}
