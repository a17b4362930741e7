//! Field-level encryption policy: which columns are encrypted at rest.
//!
//! # Responsibilities
//!
//! - Enumerate the sensitive fields ([`SensitiveField`]).
//! - Encrypt user-supplied text on the write path ([`FieldPolicy::seal`]),
//!   before it is bound as a SQL parameter.
//! - Decrypt every sensitive field of a record on the read path
//!   ([`FieldPolicy::reveal`]), for single fetches and listings alike.
//!
//! | Field | Sealed by | Revealed on |
//! |---|---|---|
//! | `posts.content` | create_post | create_post, get_posts |
//! | `comments.content` | add_comment | add_comment, get_comments |
//! | `messages.message` | send_message, edit_message | send_message, get_messages, get_conversations |
//! | `users.bio` | signup, update_profile | every response carrying a bio |
//!
//! # Module invariants
//!
//! - A response type that carries one of these fields implements
//!   [`SensitiveRecord`]; handlers pass every such record through
//!   [`FieldPolicy::reveal`] before serialising it.
//! - Field contents are never logged.

pub mod records;

pub use records::{FieldSlot, SensitiveRecord};

use std::fmt;
use std::sync::Arc;

use crate::crypto::FieldCodec;

/// A column whose value is stored as an encryption envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SensitiveField {
    PostContent,
    CommentContent,
    MessageBody,
    UserBio,
}

impl SensitiveField {
    /// Every sensitive field.
    pub const ALL: [SensitiveField; 4] = [
        SensitiveField::PostContent,
        SensitiveField::CommentContent,
        SensitiveField::MessageBody,
        SensitiveField::UserBio,
    ];

    /// Table holding the column.
    pub fn table(self) -> &'static str {
        match self {
            SensitiveField::PostContent => "posts",
            SensitiveField::CommentContent => "comments",
            SensitiveField::MessageBody => "messages",
            SensitiveField::UserBio => "users",
        }
    }

    /// Column name inside [`SensitiveField::table`].
    pub fn column(self) -> &'static str {
        match self {
            SensitiveField::PostContent | SensitiveField::CommentContent => "content",
            SensitiveField::MessageBody => "message",
            SensitiveField::UserBio => "bio",
        }
    }
}

impl fmt::Display for SensitiveField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table(), self.column())
    }
}

/// Applies the [`FieldCodec`] at the persist and read boundaries.
///
/// Cheap to clone; the codec is shared.
#[derive(Debug, Clone)]
pub struct FieldPolicy {
    codec: Arc<FieldCodec>,
}

impl FieldPolicy {
    pub fn new(codec: FieldCodec) -> Self {
        Self {
            codec: Arc::new(codec),
        }
    }

    /// Encrypt a user-supplied value of `field` for storage.
    pub fn seal(&self, field: SensitiveField, plaintext: &str) -> String {
        tracing::trace!(%field, "sealing field");
        self.codec.encrypt(plaintext)
    }

    /// Encrypt an optional value; absent or empty input is stored as NULL.
    pub fn seal_nullable(&self, field: SensitiveField, plaintext: Option<&str>) -> Option<String> {
        match plaintext {
            Some(s) if !s.is_empty() => Some(self.seal(field, s)),
            _ => None,
        }
    }

    /// Decrypt every sensitive field of `record` in place.
    pub fn reveal<R: SensitiveRecord>(&self, mut record: R) -> R {
        for (field, slot) in record.sensitive_fields() {
            tracing::trace!(%field, "revealing field");
            match slot {
                FieldSlot::Text(value) => *value = self.codec.decrypt(value),
                FieldSlot::Nullable(value) => {
                    if let Some(v) = value.as_mut() {
                        *v = self.codec.decrypt(v);
                    }
                }
            }
        }
        record
    }

    /// [`FieldPolicy::reveal`] over a listing.
    pub fn reveal_all<R: SensitiveRecord>(&self, records: Vec<R>) -> Vec<R> {
        records.into_iter().map(|r| self.reveal(r)).collect()
    }
}

#[cfg(test)]
pub(crate) fn test_policy() -> FieldPolicy {
    use crate::crypto::SecretKey;
    FieldPolicy::new(FieldCodec::new(
        SecretKey::from_passphrase("test-field-key-for-unit-tests!!!").unwrap(),
    ))
}
