//! `friend_requests` table. An accepted request is a friendship.

use std::fmt;
use std::str::FromStr;

use common::protocol::{Friend, FriendRequest};
use rusqlite::{params, OptionalExtension};

use super::{schema::Table, Datastore, StoreResult};

const FRIEND_TABLES: &[Table] = &[Table::Users, Table::FriendRequests];

/// Lifecycle state of a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FriendStatus::Pending => "pending",
            FriendStatus::Accepted => "accepted",
            FriendStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for FriendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FriendStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendStatus::Pending),
            "accepted" => Ok(FriendStatus::Accepted),
            "rejected" => Ok(FriendStatus::Rejected),
            other => Err(format!("unknown friend request status {other:?}")),
        }
    }
}

fn status_from_sql(idx: usize, raw: String) -> rusqlite::Result<FriendStatus> {
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })
}

/// A stored friend request without user details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRecord {
    pub id: i64,
    pub requester_id: i64,
    pub receiver_id: i64,
    pub status: FriendStatus,
}

impl Datastore {
    /// The request sent by `requester_id` to `receiver_id`, if any.
    pub fn request_between(
        &self,
        requester_id: i64,
        receiver_id: i64,
    ) -> StoreResult<Option<RequestRecord>> {
        self.with(&[Table::FriendRequests], |conn| {
            conn.query_row(
                "SELECT id, requester_id, receiver_id, status FROM friend_requests
                 WHERE requester_id = ?1 AND receiver_id = ?2",
                params![requester_id, receiver_id],
                |row| {
                    Ok(RequestRecord {
                        id: row.get(0)?,
                        requester_id: row.get(1)?,
                        receiver_id: row.get(2)?,
                        status: status_from_sql(3, row.get(3)?)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn request_by_id(&self, id: i64) -> StoreResult<Option<RequestRecord>> {
        self.with(&[Table::FriendRequests], |conn| {
            conn.query_row(
                "SELECT id, requester_id, receiver_id, status FROM friend_requests WHERE id = ?1",
                params![id],
                |row| {
                    Ok(RequestRecord {
                        id: row.get(0)?,
                        requester_id: row.get(1)?,
                        receiver_id: row.get(2)?,
                        status: status_from_sql(3, row.get(3)?)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Create a pending request, replacing a stale rejected one between the
    /// same pair.
    pub fn insert_friend_request(&self, requester_id: i64, receiver_id: i64) -> StoreResult<i64> {
        self.with(&[Table::FriendRequests], |conn| {
            conn.execute(
                "INSERT INTO friend_requests (requester_id, receiver_id, status)
                 VALUES (?1, ?2, 'pending')
                 ON CONFLICT (requester_id, receiver_id) DO UPDATE SET
                     status = 'pending',
                     created_at = CURRENT_TIMESTAMP,
                     updated_at = CURRENT_TIMESTAMP",
                params![requester_id, receiver_id],
            )?;
            conn.query_row(
                "SELECT id FROM friend_requests WHERE requester_id = ?1 AND receiver_id = ?2",
                params![requester_id, receiver_id],
                |row| row.get(0),
            )
        })
    }

    pub fn accept_friend_request(&self, id: i64) -> StoreResult<usize> {
        self.with(&[Table::FriendRequests], |conn| {
            conn.execute(
                "UPDATE friend_requests SET status = 'accepted', updated_at = CURRENT_TIMESTAMP
                 WHERE id = ?1",
                params![id],
            )
        })
    }

    pub fn delete_friend_request(&self, id: i64) -> StoreResult<usize> {
        self.with(&[Table::FriendRequests], |conn| {
            conn.execute("DELETE FROM friend_requests WHERE id = ?1", params![id])
        })
    }

    /// Delete every request left in the `rejected` state.
    pub fn delete_rejected_requests(&self) -> StoreResult<usize> {
        self.with(&[Table::FriendRequests], |conn| {
            conn.execute("DELETE FROM friend_requests WHERE status = 'rejected'", [])
        })
    }

    /// Pending requests received by `user_id`, newest first. `bio` is sealed.
    pub fn pending_requests_for(&self, user_id: i64) -> StoreResult<Vec<FriendRequest>> {
        self.with(FRIEND_TABLES, |conn| {
            let mut stmt = conn.prepare(
                "SELECT fr.id, u.id, fr.requester_id, u.full_name, u.age, u.location, u.bio,
                        fr.status, fr.created_at
                 FROM friend_requests fr
                 JOIN users u ON u.id = fr.requester_id
                 WHERE fr.receiver_id = ?1 AND fr.status = 'pending'
                 ORDER BY fr.created_at DESC, fr.id DESC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(FriendRequest {
                    request_id: row.get(0)?,
                    user_id: row.get(1)?,
                    requester_id: row.get(2)?,
                    full_name: row.get(3)?,
                    age: row.get(4)?,
                    location: row.get(5)?,
                    bio: row.get(6)?,
                    status: row.get(7)?,
                    created_at: row.get(8)?,
                })
            })?;
            rows.collect()
        })
    }

    /// Accepted friends of `user_id` in either direction, most recent
    /// friendship first. `bio` is sealed.
    pub fn friends_of(&self, user_id: i64) -> StoreResult<Vec<Friend>> {
        self.with(FRIEND_TABLES, |conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.full_name, u.age, u.location, u.bio
                 FROM friend_requests fr
                 JOIN users u ON u.id = CASE WHEN fr.requester_id = ?1
                                             THEN fr.receiver_id
                                             ELSE fr.requester_id END
                 WHERE (fr.requester_id = ?1 OR fr.receiver_id = ?1)
                   AND fr.status = 'accepted'
                 ORDER BY fr.updated_at DESC, fr.id DESC",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                let id: i64 = row.get(0)?;
                Ok(Friend {
                    user_id: id,
                    friend_id: id,
                    full_name: row.get(1)?,
                    age: row.get(2)?,
                    location: row.get(3)?,
                    bio: row.get(4)?,
                })
            })?;
            rows.collect()
        })
    }

    #[cfg(test)]
    pub(crate) fn force_request_status(&self, id: i64, status: FriendStatus) -> StoreResult<usize> {
        self.with(&[Table::FriendRequests], |conn| {
            conn.execute(
                "UPDATE friend_requests SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
        })
    }
}
