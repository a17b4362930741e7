//! Table definitions, created lazily the first time a repository touches them.

use rusqlite::Connection;

/// Every table owned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Posts,
    PostLikes,
    Comments,
    Shares,
    Messages,
    MessageLikes,
    Likes,
    FriendRequests,
}

impl Table {
    fn create_sql(self) -> &'static str {
        match self {
            Table::Users => {
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    full_name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    phone TEXT NOT NULL,
                    password TEXT NOT NULL,
                    gender TEXT NOT NULL,
                    age INTEGER NOT NULL,
                    location TEXT DEFAULT NULL,
                    bio TEXT DEFAULT NULL,
                    last_active_at TEXT DEFAULT NULL,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )"
            }
            Table::Posts => {
                "CREATE TABLE IF NOT EXISTS posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                );
                CREATE INDEX IF NOT EXISTS idx_posts_user_id ON posts (user_id);
                CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at)"
            }
            Table::PostLikes => {
                "CREATE TABLE IF NOT EXISTS post_likes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (post_id, user_id)
                )"
            }
            Table::Comments => {
                "CREATE TABLE IF NOT EXISTS comments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                );
                CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments (post_id)"
            }
            Table::Shares => {
                "CREATE TABLE IF NOT EXISTS shares (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    shared_with_user_id INTEGER DEFAULT NULL,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                );
                CREATE INDEX IF NOT EXISTS idx_shares_post_id ON shares (post_id)"
            }
            Table::Messages => {
                "CREATE TABLE IF NOT EXISTS messages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    sender_id INTEGER NOT NULL,
                    receiver_id INTEGER NOT NULL,
                    message TEXT NOT NULL,
                    is_read INTEGER NOT NULL DEFAULT 0,
                    is_deleted_for_sender INTEGER NOT NULL DEFAULT 0,
                    is_deleted_for_receiver INTEGER NOT NULL DEFAULT 0,
                    edited_at TEXT DEFAULT NULL,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                );
                CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages (sender_id, receiver_id)"
            }
            Table::MessageLikes => {
                "CREATE TABLE IF NOT EXISTS message_likes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    message_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (message_id, user_id)
                )"
            }
            Table::Likes => {
                "CREATE TABLE IF NOT EXISTS likes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    liked_user_id INTEGER NOT NULL,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (user_id, liked_user_id)
                );
                CREATE INDEX IF NOT EXISTS idx_likes_liked_user ON likes (liked_user_id)"
            }
            Table::FriendRequests => {
                "CREATE TABLE IF NOT EXISTS friend_requests (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    requester_id INTEGER NOT NULL,
                    receiver_id INTEGER NOT NULL,
                    status TEXT NOT NULL DEFAULT 'pending'
                        CHECK (status IN ('pending', 'accepted', 'rejected')),
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (requester_id, receiver_id)
                )"
            }
        }
    }

    /// Columns introduced after the table first shipped, added to databases
    /// created before them.
    fn late_columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Table::Users => &[("last_active_at", "TEXT DEFAULT NULL")],
            Table::Messages => &[
                ("is_deleted_for_sender", "INTEGER NOT NULL DEFAULT 0"),
                ("is_deleted_for_receiver", "INTEGER NOT NULL DEFAULT 0"),
                ("edited_at", "TEXT DEFAULT NULL"),
            ],
            _ => &[],
        }
    }

    fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Posts => "posts",
            Table::PostLikes => "post_likes",
            Table::Comments => "comments",
            Table::Shares => "shares",
            Table::Messages => "messages",
            Table::MessageLikes => "message_likes",
            Table::Likes => "likes",
            Table::FriendRequests => "friend_requests",
        }
    }
}

/// Create `table` (and its indexes) if missing, then add any late columns.
pub fn ensure(conn: &Connection, table: Table) -> rusqlite::Result<()> {
    conn.execute_batch(table.create_sql())?;
    for (column, decl) in table.late_columns() {
        if !has_column(conn, table.name(), column)? {
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {column} {decl}",
                table.name()
            ))?;
        }
    }
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}
