//! Request and response types exchanged over the public JSON API.
//!
//! Every response is wrapped in [`ApiResponse`], which adds the `success`
//! flag beside the flattened payload. Failures use [`ErrorResponse`].
//!
//! Request fields are all optional at the serde level; presence and
//! non-emptiness are validated by the handlers so that a missing field yields
//! the same error message as an empty one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Successful response: `{"success": true, ...body}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// Endpoint-specific payload, flattened into the top-level object.
    #[serde(flatten)]
    pub body: T,
}

impl<T> ApiResponse<T> {
    /// Wrap `body` in a successful envelope.
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Human-readable description safe to expose to callers.
    pub error: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// A JSON value that may be given either as a single item or as an array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Request body for `POST /api/signup`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

/// Request body for `POST /api/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request body for endpoints addressed by a single `user_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserIdRequest {
    pub user_id: Option<i64>,
}

/// Request body for listings that may exclude or personalise for the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentUserRequest {
    pub current_user_id: Option<i64>,
}

/// Request body for `POST /api/update_profile`.
///
/// Only the fields that are present are updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub user_id: Option<i64>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

/// Public view of a user account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub age: i64,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBody {
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersBody {
    pub users: Vec<User>,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Posts and comments
// ---------------------------------------------------------------------------

/// Request body for `POST /api/create_post`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatePostRequest {
    pub user_id: Option<i64>,
    pub content: Option<String>,
}

/// Request body for `POST /api/toggle_post_like`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostActionRequest {
    pub post_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// Request body for `POST /api/share_post`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SharePostRequest {
    pub post_id: Option<i64>,
    pub user_id: Option<i64>,
    pub shared_with_user_id: Option<i64>,
}

/// Request body for `POST /api/add_comment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddCommentRequest {
    pub post_id: Option<i64>,
    pub user_id: Option<i64>,
    pub content: Option<String>,
}

/// Request body for `POST /api/get_comments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostIdRequest {
    pub post_id: Option<i64>,
}

/// A post joined with its author and engagement counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostBody {
    pub post: Post,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostsBody {
    pub posts: Vec<Post>,
}

/// A comment joined with its author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentBody {
    pub comment: Comment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsBody {
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareBody {
    pub message: String,
    pub shares_count: i64,
}

/// Result of toggling a like on a post or a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeToggleBody {
    pub is_liked: bool,
    pub likes_count: i64,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Request body for `POST /api/send_message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SendMessageRequest {
    pub sender_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub message: Option<String>,
}

/// Request body for `POST /api/get_messages`.
///
/// `user1_id` is the caller; `user2_id` is the other participant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadRequest {
    pub user1_id: Option<i64>,
    pub user2_id: Option<i64>,
}

/// Request body for `POST /api/edit_message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditMessageRequest {
    pub message_id: Option<i64>,
    pub user_id: Option<i64>,
    pub message: Option<String>,
}

/// Request body for `POST /api/delete_message` and `POST /api/toggle_message_like`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageActionRequest {
    pub message_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// A direct message as shown in a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub sender_name: String,
    pub receiver_name: String,
    pub message: String,
    pub is_read: bool,
    pub edited_at: Option<String>,
    pub created_at: String,
    pub likes_count: i64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: Message,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesBody {
    pub messages: Vec<Message>,
}

/// One entry of the conversation list.
///
/// `last_message` is the newest message sent *by the other user*, or an empty
/// string when they have not written yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub other_user_id: i64,
    pub other_user_name: String,
    pub other_user_email: String,
    pub last_message: String,
    pub last_message_time: Option<String>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationsBody {
    pub conversations: Vec<Conversation>,
}

// ---------------------------------------------------------------------------
// User likes
// ---------------------------------------------------------------------------

/// Request body for `POST /api/toggle_like`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleUserLikeRequest {
    pub user_id: Option<i64>,
    pub liked_user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLikeToggleBody {
    pub liked: bool,
    pub like_count: i64,
    pub message: String,
}

/// Request body for `POST /api/get_likes_count`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LikesCountRequest {
    pub user_ids: Option<OneOrMany<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikesCountBody {
    pub likes: BTreeMap<i64, i64>,
}

/// Request body for `POST /api/check_user_liked`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckUserLikedRequest {
    pub user_id: Option<i64>,
    pub liked_user_ids: Option<OneOrMany<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedUsersBody {
    pub liked_user_ids: Vec<i64>,
}

// ---------------------------------------------------------------------------
// Friends
// ---------------------------------------------------------------------------

/// Request body for `POST /api/send_friend_request`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendRequestRequest {
    pub requester_id: Option<i64>,
    pub receiver_id: Option<i64>,
}

/// Request body for `POST /api/respond_to_friend_request`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RespondFriendRequest {
    pub request_id: Option<i64>,
    /// `"accept"` or `"reject"`.
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondBody {
    pub message: String,
    /// `"accepted"`, or `"deleted"` for a rejection.
    pub status: String,
}

/// A pending friend request received by the caller, with requester details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FriendRequest {
    pub request_id: i64,
    pub user_id: i64,
    pub requester_id: i64,
    pub full_name: String,
    pub age: Option<i64>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestsBody {
    pub requests: Vec<FriendRequest>,
}

/// An accepted friend of the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Friend {
    pub user_id: i64,
    pub friend_id: i64,
    pub full_name: String,
    pub age: Option<i64>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendsBody {
    pub friends: Vec<Friend>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupBody {
    pub message: String,
    pub deleted_count: usize,
}

// ---------------------------------------------------------------------------
// Presence and misc
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineUsersBody {
    pub online_users: BTreeMap<i64, bool>,
}

/// Plain acknowledgement: `{"success": true, "message": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Whether the datastore answered a trivial query.
    pub datastore_ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_response_flattens_body() {
        let resp = ApiResponse::ok(Ack::new("Activity updated"));
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v, json!({"success": true, "message": "Activity updated"}));
    }

    #[test]
    fn error_response_shape() {
        let v = serde_json::to_value(ErrorResponse::new("User ID required")).unwrap();
        assert_eq!(v, json!({"success": false, "error": "User ID required"}));
    }

    #[test]
    fn missing_request_fields_default_to_none() {
        let req: SendMessageRequest = serde_json::from_value(json!({"sender_id": 1})).unwrap();
        assert_eq!(req.sender_id, Some(1));
        assert!(req.receiver_id.is_none());
        assert!(req.message.is_none());
    }

    #[test]
    fn one_or_many_accepts_scalar_and_array() {
        let req: LikesCountRequest = serde_json::from_value(json!({"user_ids": 7})).unwrap();
        assert_eq!(req.user_ids.unwrap().into_vec(), vec![7]);
        let req: LikesCountRequest =
            serde_json::from_value(json!({"user_ids": [1, 2, 3]})).unwrap();
        assert_eq!(req.user_ids.unwrap().into_vec(), vec![1, 2, 3]);
    }

    #[test]
    fn id_keyed_maps_serialise_with_string_keys() {
        let mut online_users = BTreeMap::new();
        online_users.insert(3, true);
        online_users.insert(9, false);
        let v = serde_json::to_value(ApiResponse::ok(OnlineUsersBody { online_users })).unwrap();
        assert_eq!(v["online_users"], json!({"3": true, "9": false}));
    }
}
