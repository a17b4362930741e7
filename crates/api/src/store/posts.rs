//! `posts`, `post_likes`, `comments` and `shares` tables.

use common::protocol::{Comment, Post};
use rusqlite::{params, OptionalExtension, Row};

use super::{schema::Table, Datastore, StoreResult};

const POST_TABLES: &[Table] = &[Table::Users, Table::Posts, Table::PostLikes, Table::Comments];
const COMMENT_TABLES: &[Table] = &[Table::Users, Table::Comments];

/// Posts joined with their author, counters and the viewer's like (`?1`).
const POST_SELECT: &str = "
    SELECT p.id, p.user_id, u.full_name, u.email, p.content, p.created_at, p.updated_at,
           (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id),
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id),
           EXISTS(SELECT 1 FROM post_likes pl WHERE pl.post_id = p.id AND pl.user_id = ?1)
    FROM posts p
    JOIN users u ON u.id = p.user_id";

const COMMENT_SELECT: &str = "
    SELECT c.id, c.post_id, c.user_id, u.full_name, u.email, c.content, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.user_id";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_name: row.get(2)?,
        user_email: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        likes_count: row.get(7)?,
        comments_count: row.get(8)?,
        is_liked: row.get(9)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        user_email: row.get(4)?,
        content: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Datastore {
    /// Insert a post whose `content` is already sealed.
    pub fn insert_post(&self, user_id: i64, content: &str) -> StoreResult<i64> {
        self.with(&[Table::Posts], |conn| {
            conn.execute(
                "INSERT INTO posts (user_id, content) VALUES (?1, ?2)",
                params![user_id, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// A single post as seen by `viewer` (0 for anonymous).
    pub fn post_by_id(&self, id: i64, viewer: i64) -> StoreResult<Option<Post>> {
        self.with(POST_TABLES, |conn| {
            conn.query_row(
                &format!("{POST_SELECT} WHERE p.id = ?2"),
                params![viewer, id],
                post_from_row,
            )
            .optional()
        })
    }

    /// The feed, newest first, as seen by `viewer` (0 for anonymous).
    pub fn list_posts(&self, viewer: i64) -> StoreResult<Vec<Post>> {
        self.with(POST_TABLES, |conn| {
            let mut stmt =
                conn.prepare(&format!("{POST_SELECT} ORDER BY p.created_at DESC, p.id DESC"))?;
            let rows = stmt.query_map(params![viewer], post_from_row)?;
            rows.collect()
        })
    }

    /// Like or unlike `post_id` for `user_id`. Returns `(is_liked, likes_count)`.
    pub fn toggle_post_like(&self, post_id: i64, user_id: i64) -> StoreResult<(bool, i64)> {
        self.with(&[Table::PostLikes], |conn| {
            let removed = conn.execute(
                "DELETE FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
                params![post_id, user_id],
            )?;
            if removed == 0 {
                conn.execute(
                    "INSERT INTO post_likes (post_id, user_id) VALUES (?1, ?2)",
                    params![post_id, user_id],
                )?;
            }
            let count = conn.query_row(
                "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1",
                params![post_id],
                |row| row.get(0),
            )?;
            Ok((removed == 0, count))
        })
    }

    /// Record a share and return the post's share count.
    pub fn share_post(
        &self,
        post_id: i64,
        user_id: i64,
        shared_with: Option<i64>,
    ) -> StoreResult<i64> {
        self.with(&[Table::Shares], |conn| {
            conn.execute(
                "INSERT INTO shares (post_id, user_id, shared_with_user_id) VALUES (?1, ?2, ?3)",
                params![post_id, user_id, shared_with],
            )?;
            conn.query_row(
                "SELECT COUNT(*) FROM shares WHERE post_id = ?1",
                params![post_id],
                |row| row.get(0),
            )
        })
    }

    /// Insert a comment whose `content` is already sealed.
    pub fn insert_comment(&self, post_id: i64, user_id: i64, content: &str) -> StoreResult<i64> {
        self.with(&[Table::Comments], |conn| {
            conn.execute(
                "INSERT INTO comments (post_id, user_id, content) VALUES (?1, ?2, ?3)",
                params![post_id, user_id, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn comment_by_id(&self, id: i64) -> StoreResult<Option<Comment>> {
        self.with(COMMENT_TABLES, |conn| {
            conn.query_row(
                &format!("{COMMENT_SELECT} WHERE c.id = ?1"),
                params![id],
                comment_from_row,
            )
            .optional()
        })
    }

    /// Comments on `post_id`, oldest first.
    pub fn comments_for_post(&self, post_id: i64) -> StoreResult<Vec<Comment>> {
        self.with(COMMENT_TABLES, |conn| {
            let mut stmt = conn.prepare(&format!(
                "{COMMENT_SELECT} WHERE c.post_id = ?1 ORDER BY c.created_at ASC, c.id ASC"
            ))?;
            let rows = stmt.query_map(params![post_id], comment_from_row)?;
            rows.collect()
        })
    }

    /// The raw stored value of `posts.content`.
    #[cfg(test)]
    pub(crate) fn raw_post_content(&self, id: i64) -> StoreResult<String> {
        self.with(&[Table::Posts], |conn| {
            conn.query_row("SELECT content FROM posts WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
        })
    }

    /// The raw stored value of `comments.content`.
    #[cfg(test)]
    pub(crate) fn raw_comment_content(&self, id: i64) -> StoreResult<String> {
        self.with(&[Table::Comments], |conn| {
            conn.query_row(
                "SELECT content FROM comments WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
        })
    }
}
