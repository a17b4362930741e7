//! [`SensitiveRecord`] implementations for every response type that surfaces
//! an encrypted column.

use common::protocol::{Comment, Conversation, Friend, FriendRequest, Message, Post, User};

use super::SensitiveField;

/// Mutable access to one sensitive value inside a record.
pub enum FieldSlot<'a> {
    /// A `NOT NULL` column.
    Text(&'a mut String),
    /// A nullable column; `None` is left alone.
    Nullable(&'a mut Option<String>),
}

/// A record carrying one or more [`SensitiveField`] values.
pub trait SensitiveRecord {
    fn sensitive_fields(&mut self) -> Vec<(SensitiveField, FieldSlot<'_>)>;
}

impl SensitiveRecord for Post {
    fn sensitive_fields(&mut self) -> Vec<(SensitiveField, FieldSlot<'_>)> {
        vec![(SensitiveField::PostContent, FieldSlot::Text(&mut self.content))]
    }
}

impl SensitiveRecord for Comment {
    fn sensitive_fields(&mut self) -> Vec<(SensitiveField, FieldSlot<'_>)> {
        vec![(SensitiveField::CommentContent, FieldSlot::Text(&mut self.content))]
    }
}

impl SensitiveRecord for Message {
    fn sensitive_fields(&mut self) -> Vec<(SensitiveField, FieldSlot<'_>)> {
        vec![(SensitiveField::MessageBody, FieldSlot::Text(&mut self.message))]
    }
}

impl SensitiveRecord for Conversation {
    fn sensitive_fields(&mut self) -> Vec<(SensitiveField, FieldSlot<'_>)> {
        vec![(SensitiveField::MessageBody, FieldSlot::Text(&mut self.last_message))]
    }
}

impl SensitiveRecord for User {
    fn sensitive_fields(&mut self) -> Vec<(SensitiveField, FieldSlot<'_>)> {
        vec![(SensitiveField::UserBio, FieldSlot::Nullable(&mut self.bio))]
    }
}

impl SensitiveRecord for FriendRequest {
    fn sensitive_fields(&mut self) -> Vec<(SensitiveField, FieldSlot<'_>)> {
        vec![(SensitiveField::UserBio, FieldSlot::Nullable(&mut self.bio))]
    }
}

impl SensitiveRecord for Friend {
    fn sensitive_fields(&mut self) -> Vec<(SensitiveField, FieldSlot<'_>)> {
        vec![(SensitiveField::UserBio, FieldSlot::Nullable(&mut self.bio))]
    }
}
