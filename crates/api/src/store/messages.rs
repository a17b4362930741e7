//! `messages` and `message_likes` tables, plus the conversation list.

use common::protocol::{Conversation, Message};
use rusqlite::{params, OptionalExtension, Row};

use super::{schema::Table, Datastore, StoreResult};

const MESSAGE_TABLES: &[Table] = &[Table::Users, Table::Messages, Table::MessageLikes];

/// Messages joined with both participants, like count and the viewer's like (`?1`).
const MESSAGE_SELECT: &str = "
    SELECT m.id, m.sender_id, m.receiver_id, s.full_name, r.full_name, m.message,
           m.is_read, m.edited_at, m.created_at,
           (SELECT COUNT(*) FROM message_likes ml WHERE ml.message_id = m.id),
           EXISTS(SELECT 1 FROM message_likes ml WHERE ml.message_id = m.id AND ml.user_id = ?1)
    FROM messages m
    JOIN users s ON s.id = m.sender_id
    JOIN users r ON r.id = m.receiver_id";

/// Sender and receiver of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participants {
    pub sender_id: i64,
    pub receiver_id: i64,
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        sender_name: row.get(3)?,
        receiver_name: row.get(4)?,
        message: row.get(5)?,
        is_read: row.get(6)?,
        edited_at: row.get(7)?,
        created_at: row.get(8)?,
        likes_count: row.get(9)?,
        is_liked: row.get(10)?,
    })
}

impl Datastore {
    /// Insert a message whose body is already sealed.
    pub fn insert_message(&self, sender_id: i64, receiver_id: i64, body: &str) -> StoreResult<i64> {
        self.with(&[Table::Messages], |conn| {
            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, message) VALUES (?1, ?2, ?3)",
                params![sender_id, receiver_id, body],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// A single message as seen by `viewer`.
    pub fn message_by_id(&self, id: i64, viewer: i64) -> StoreResult<Option<Message>> {
        self.with(MESSAGE_TABLES, |conn| {
            conn.query_row(
                &format!("{MESSAGE_SELECT} WHERE m.id = ?2"),
                params![viewer, id],
                message_from_row,
            )
            .optional()
        })
    }

    /// The thread between `viewer` and `other`, oldest first, without the
    /// messages `viewer` has deleted.
    pub fn thread(&self, viewer: i64, other: i64) -> StoreResult<Vec<Message>> {
        self.with(MESSAGE_TABLES, |conn| {
            let mut stmt = conn.prepare(&format!(
                "{MESSAGE_SELECT}
                 WHERE ((m.sender_id = ?1 AND m.receiver_id = ?2)
                     OR (m.sender_id = ?2 AND m.receiver_id = ?1))
                   AND NOT ((m.sender_id = ?1 AND m.is_deleted_for_sender = 1)
                         OR (m.receiver_id = ?1 AND m.is_deleted_for_receiver = 1))
                 ORDER BY m.created_at ASC, m.id ASC"
            ))?;
            let rows = stmt.query_map(params![viewer, other], message_from_row)?;
            rows.collect()
        })
    }

    /// Mark every unread message from `sender` to `reader` as read.
    pub fn mark_read(&self, reader: i64, sender: i64) -> StoreResult<usize> {
        self.with(&[Table::Messages], |conn| {
            conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE receiver_id = ?1 AND sender_id = ?2 AND is_read = 0",
                params![reader, sender],
            )
        })
    }

    pub fn message_participants(&self, id: i64) -> StoreResult<Option<Participants>> {
        self.with(&[Table::Messages], |conn| {
            conn.query_row(
                "SELECT sender_id, receiver_id FROM messages WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Participants {
                        sender_id: row.get(0)?,
                        receiver_id: row.get(1)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Replace the (sealed) body of a message and stamp `edited_at`.
    pub fn update_message(&self, id: i64, body: &str) -> StoreResult<usize> {
        self.with(&[Table::Messages], |conn| {
            conn.execute(
                "UPDATE messages SET message = ?1, edited_at = CURRENT_TIMESTAMP WHERE id = ?2",
                params![body, id],
            )
        })
    }

    /// Hide a message from both participants.
    pub fn delete_message_for_both(&self, id: i64) -> StoreResult<usize> {
        self.with(&[Table::Messages], |conn| {
            conn.execute(
                "UPDATE messages SET is_deleted_for_sender = 1, is_deleted_for_receiver = 1
                 WHERE id = ?1",
                params![id],
            )
        })
    }

    /// Hide a message from its receiver only.
    pub fn delete_message_for_receiver(&self, id: i64) -> StoreResult<usize> {
        self.with(&[Table::Messages], |conn| {
            conn.execute(
                "UPDATE messages SET is_deleted_for_receiver = 1 WHERE id = ?1",
                params![id],
            )
        })
    }

    /// Like or unlike a message. Returns `(is_liked, likes_count)`.
    pub fn toggle_message_like(&self, message_id: i64, user_id: i64) -> StoreResult<(bool, i64)> {
        self.with(&[Table::MessageLikes], |conn| {
            let removed = conn.execute(
                "DELETE FROM message_likes WHERE message_id = ?1 AND user_id = ?2",
                params![message_id, user_id],
            )?;
            if removed == 0 {
                conn.execute(
                    "INSERT INTO message_likes (message_id, user_id) VALUES (?1, ?2)",
                    params![message_id, user_id],
                )?;
            }
            let count = conn.query_row(
                "SELECT COUNT(*) FROM message_likes WHERE message_id = ?1",
                params![message_id],
                |row| row.get(0),
            )?;
            Ok((removed == 0, count))
        })
    }

    /// Everyone `user_id` has exchanged messages with.
    ///
    /// `last_message` is the newest message written by the other user, still
    /// sealed. Entries are ordered by that message's time, newest first; a
    /// partner who never wrote back sorts last.
    pub fn conversations(&self, user_id: i64) -> StoreResult<Vec<Conversation>> {
        let mut conversations = self.with(&[Table::Users, Table::Messages], |conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.full_name, u.email,
                        (SELECT m.message FROM messages m
                          WHERE m.sender_id = u.id AND m.receiver_id = ?1
                          ORDER BY m.created_at DESC, m.id DESC LIMIT 1),
                        (SELECT m.created_at FROM messages m
                          WHERE m.sender_id = u.id AND m.receiver_id = ?1
                          ORDER BY m.created_at DESC, m.id DESC LIMIT 1),
                        (SELECT COUNT(*) FROM messages m
                          WHERE m.sender_id = u.id AND m.receiver_id = ?1 AND m.is_read = 0)
                 FROM users u
                 WHERE u.id IN (
                     SELECT CASE WHEN sender_id = ?1 THEN receiver_id ELSE sender_id END
                     FROM messages
                     WHERE sender_id = ?1 OR receiver_id = ?1
                 )",
            )?;
            let rows = stmt.query_map(params![user_id], |row| {
                Ok(Conversation {
                    other_user_id: row.get(0)?,
                    other_user_name: row.get(1)?,
                    other_user_email: row.get(2)?,
                    last_message: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    last_message_time: row.get(4)?,
                    unread_count: row.get(5)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;

        conversations.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(conversations)
    }

    /// The raw stored value of `messages.message`.
    #[cfg(test)]
    pub(crate) fn raw_message_body(&self, id: i64) -> StoreResult<String> {
        self.with(&[Table::Messages], |conn| {
            conn.query_row(
                "SELECT message FROM messages WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures;

    fn pair(store: &Datastore) -> (i64, i64) {
        (fixtures::user(store, "Ayse"), fixtures::user(store, "Berk"))
    }

    #[test]
    fn thread_contains_both_directions() {
        let store = Datastore::in_memory().unwrap();
        let (a, b) = pair(&store);
        let m1 = store.insert_message(a, b, "hi").unwrap();
        let m2 = store.insert_message(b, a, "hey").unwrap();
        let thread = store.thread(a, b).unwrap();
        assert_eq!(thread.iter().map(|m| m.id).collect::<Vec<_>>(), [m1, m2]);
        assert_eq!(thread[0].sender_name, "Ayse");
        assert_eq!(thread[0].receiver_name, "Berk");
        assert!(!thread[1].is_read);
    }

    #[test]
    fn mark_read_only_touches_incoming() {
        let store = Datastore::in_memory().unwrap();
        let (a, b) = pair(&store);
        let outgoing = store.insert_message(a, b, "hi").unwrap();
        let incoming = store.insert_message(b, a, "hey").unwrap();
        assert_eq!(store.mark_read(a, b).unwrap(), 1);
        assert!(store.message_by_id(incoming, a).unwrap().unwrap().is_read);
        assert!(!store.message_by_id(outgoing, a).unwrap().unwrap().is_read);
    }

    #[test]
    fn sender_delete_hides_for_both() {
        let store = Datastore::in_memory().unwrap();
        let (a, b) = pair(&store);
        let id = store.insert_message(a, b, "oops").unwrap();
        store.delete_message_for_both(id).unwrap();
        assert!(store.thread(a, b).unwrap().is_empty());
        assert!(store.thread(b, a).unwrap().is_empty());
    }

    #[test]
    fn receiver_delete_hides_for_receiver_only() {
        let store = Datastore::in_memory().unwrap();
        let (a, b) = pair(&store);
        let id = store.insert_message(a, b, "keep").unwrap();
        store.delete_message_for_receiver(id).unwrap();
        assert_eq!(store.thread(a, b).unwrap().len(), 1);
        assert!(store.thread(b, a).unwrap().is_empty());
    }

    #[test]
    fn edit_sets_edited_at() {
        let store = Datastore::in_memory().unwrap();
        let (a, b) = pair(&store);
        let id = store.insert_message(a, b, "draft").unwrap();
        assert!(store.message_by_id(id, a).unwrap().unwrap().edited_at.is_none());
        assert_eq!(store.update_message(id, "final").unwrap(), 1);
        let edited = store.message_by_id(id, a).unwrap().unwrap();
        assert_eq!(edited.message, "final");
        assert!(edited.edited_at.is_some());
    }

    #[test]
    fn message_like_toggles() {
        let store = Datastore::in_memory().unwrap();
        let (a, b) = pair(&store);
        let id = store.insert_message(a, b, "hi").unwrap();
        assert_eq!(store.toggle_message_like(id, b).unwrap(), (true, 1));
        assert!(store.message_by_id(id, b).unwrap().unwrap().is_liked);
        assert!(!store.message_by_id(id, a).unwrap().unwrap().is_liked);
        assert_eq!(store.toggle_message_like(id, b).unwrap(), (false, 0));
    }

    #[test]
    fn participants_lookup() {
        let store = Datastore::in_memory().unwrap();
        let (a, b) = pair(&store);
        let id = store.insert_message(a, b, "hi").unwrap();
        assert_eq!(
            store.message_participants(id).unwrap(),
            Some(Participants {
                sender_id: a,
                receiver_id: b
            })
        );
        assert_eq!(store.message_participants(id + 1).unwrap(), None);
    }

    #[test]
    fn conversations_show_last_incoming_message() {
        let store = Datastore::in_memory().unwrap();
        let (a, b) = pair(&store);
        let c = fixtures::user(&store, "Cem");
        store.insert_message(b, a, "first from berk").unwrap();
        store.insert_message(b, a, "second from berk").unwrap();
        store.insert_message(a, b, "reply from ayse").unwrap();
        store.insert_message(a, c, "ayse to cem").unwrap();

        let convs = store.conversations(a).unwrap();
        assert_eq!(convs.len(), 2);
        assert_eq!(convs[0].other_user_id, b);
        assert_eq!(convs[0].last_message, "second from berk");
        assert_eq!(convs[0].unread_count, 2);
        // Cem never wrote back.
        assert_eq!(convs[1].other_user_id, c);
        assert_eq!(convs[1].last_message, "");
        assert_eq!(convs[1].last_message_time, None);
        assert_eq!(convs[1].unread_count, 0);
    }
}
