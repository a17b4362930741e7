//! `users` table: accounts, profiles and activity timestamps.

use common::protocol::User;
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};

use super::{schema::Table, Datastore, StoreResult};

const USER_COLUMNS: &str = "id, full_name, email, phone, gender, age, location, bio, created_at";

/// Fields of a new account. `bio` must already be sealed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password_hash: &'a str,
    pub gender: &'a str,
    pub age: i64,
    pub location: &'a str,
    pub bio: Option<&'a str>,
}

/// One column of a profile update. `Bio` must already be sealed.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileChange {
    FullName(String),
    Phone(String),
    Gender(String),
    Age(i64),
    Location(String),
    Bio(Option<String>),
}

impl ProfileChange {
    fn column(&self) -> &'static str {
        match self {
            ProfileChange::FullName(_) => "full_name",
            ProfileChange::Phone(_) => "phone",
            ProfileChange::Gender(_) => "gender",
            ProfileChange::Age(_) => "age",
            ProfileChange::Location(_) => "location",
            ProfileChange::Bio(_) => "bio",
        }
    }

    fn value(&self) -> Value {
        match self {
            ProfileChange::FullName(s)
            | ProfileChange::Phone(s)
            | ProfileChange::Gender(s)
            | ProfileChange::Location(s) => Value::Text(s.clone()),
            ProfileChange::Age(n) => Value::Integer(*n),
            ProfileChange::Bio(Some(s)) => Value::Text(s.clone()),
            ProfileChange::Bio(None) => Value::Null,
        }
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        gender: row.get(4)?,
        age: row.get(5)?,
        location: row.get(6)?,
        bio: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl Datastore {
    pub fn email_exists(&self, email: &str) -> StoreResult<bool> {
        self.with(&[Table::Users], |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                params![email],
                |row| row.get(0),
            )
        })
    }

    /// Insert an account and return its id.
    pub fn insert_user(&self, user: &NewUser<'_>) -> StoreResult<i64> {
        self.with(&[Table::Users], |conn| {
            conn.execute(
                "INSERT INTO users (full_name, email, phone, password, gender, age, location, bio)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user.full_name,
                    user.email,
                    user.phone,
                    user.password_hash,
                    user.gender,
                    user.age,
                    user.location,
                    user.bio,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.with(&[Table::Users], |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
        })
    }

    /// The account registered under `email` together with its password hash.
    pub fn credentials_by_email(&self, email: &str) -> StoreResult<Option<(User, String)>> {
        self.with(&[Table::Users], |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS}, password FROM users WHERE email = ?1"),
                params![email],
                |row| Ok((user_from_row(row)?, row.get(9)?)),
            )
            .optional()
        })
    }

    /// Every account, newest first, optionally leaving out `exclude`.
    pub fn all_users(&self, exclude: Option<i64>) -> StoreResult<Vec<User>> {
        self.with(&[Table::Users], |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE ?1 IS NULL OR id != ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt.query_map(params![exclude], user_from_row)?;
            rows.collect()
        })
    }

    pub fn user_exists(&self, id: i64) -> StoreResult<bool> {
        self.with(&[Table::Users], |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )
        })
    }

    /// Apply `changes` to account `id`. Returns the number of rows updated.
    pub fn update_user(&self, id: i64, changes: &[ProfileChange]) -> StoreResult<usize> {
        if changes.is_empty() {
            return Ok(0);
        }
        let assignments = changes
            .iter()
            .enumerate()
            .map(|(i, change)| format!("{} = ?{}", change.column(), i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE users SET {assignments} WHERE id = ?{}",
            changes.len() + 1
        );
        let values = changes
            .iter()
            .map(ProfileChange::value)
            .chain(std::iter::once(Value::Integer(id)));

        self.with(&[Table::Users], |conn| {
            conn.execute(&sql, params_from_iter(values))
        })
    }

    /// Stamp `last_active_at` with the current time.
    pub fn touch_activity(&self, id: i64) -> StoreResult<usize> {
        self.with(&[Table::Users], |conn| {
            conn.execute(
                "UPDATE users SET last_active_at = CURRENT_TIMESTAMP WHERE id = ?1",
                params![id],
            )
        })
    }

    /// `(id, last_active_at)` for every account.
    pub fn activity(&self) -> StoreResult<Vec<(i64, Option<String>)>> {
        self.with(&[Table::Users], |conn| {
            let mut stmt = conn.prepare("SELECT id, last_active_at FROM users ORDER BY id")?;
            let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            rows.collect()
        })
    }

    /// The raw stored value of `users.bio`, as written to disk.
    #[cfg(test)]
    pub(crate) fn raw_bio(&self, id: i64) -> StoreResult<Option<String>> {
        self.with(&[Table::Users], |conn| {
            conn.query_row("SELECT bio FROM users WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
        })
    }
}
