//! `likes` table: one user liking another user's profile.

use std::collections::BTreeMap;

use rusqlite::{params, params_from_iter};

use super::{placeholders, schema::Table, Datastore, StoreResult};

impl Datastore {
    /// Like or unlike `liked_user_id` on behalf of `user_id`.
    /// Returns `(liked, like_count)` where the count is for `liked_user_id`.
    pub fn toggle_user_like(&self, user_id: i64, liked_user_id: i64) -> StoreResult<(bool, i64)> {
        self.with(&[Table::Likes], |conn| {
            let removed = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND liked_user_id = ?2",
                params![user_id, liked_user_id],
            )?;
            if removed == 0 {
                conn.execute(
                    "INSERT INTO likes (user_id, liked_user_id) VALUES (?1, ?2)",
                    params![user_id, liked_user_id],
                )?;
            }
            let count = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE liked_user_id = ?1",
                params![liked_user_id],
                |row| row.get(0),
            )?;
            Ok((removed == 0, count))
        })
    }

    /// Like counts for each of `user_ids`; ids nobody liked map to zero.
    pub fn like_counts(&self, user_ids: &[i64]) -> StoreResult<BTreeMap<i64, i64>> {
        let mut counts: BTreeMap<i64, i64> = user_ids.iter().map(|id| (*id, 0)).collect();
        if user_ids.is_empty() {
            return Ok(counts);
        }
        let sql = format!(
            "SELECT liked_user_id, COUNT(*) FROM likes
             WHERE liked_user_id IN ({}) GROUP BY liked_user_id",
            placeholders(1, user_ids.len())
        );
        let found = self.with(&[Table::Likes], |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(user_ids), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        counts.extend(found);
        Ok(counts)
    }

    /// The subset of `candidates` that `user_id` has liked.
    pub fn liked_among(&self, user_id: i64, candidates: &[i64]) -> StoreResult<Vec<i64>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT liked_user_id FROM likes
             WHERE user_id = ?1 AND liked_user_id IN ({})
             ORDER BY liked_user_id",
            placeholders(2, candidates.len())
        );
        let values = std::iter::once(&user_id).chain(candidates);
        self.with(&[Table::Likes], |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values), |row| row.get(0))?;
            rows.collect()
        })
    }
}
