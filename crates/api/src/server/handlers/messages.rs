//! Direct messaging endpoints.

use axum::extract::State;
use common::protocol::{
    Ack, ConversationsBody, EditMessageRequest, LikeToggleBody, MessageActionRequest,
    MessageBody, MessagesBody, SendMessageRequest, ThreadRequest, UserIdRequest,
};
use common::ServiceError;
use tracing::info;

use super::{id, text};
use crate::policy::SensitiveField;
use crate::server::error::{bad_request, ok, ApiError, ApiResult, JsonBody};
use crate::server::state::AppState;
use crate::store::messages::Participants;

fn participants(state: &AppState, message_id: i64) -> Result<Participants, ApiError> {
    state
        .store
        .message_participants(message_id)?
        .ok_or_else(|| ApiError(ServiceError::not_found("Message not found")))
}

/// `POST /api/send_message`
pub async fn send_message(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SendMessageRequest>,
) -> ApiResult<MessageBody> {
    let (Some(sender_id), Some(receiver_id), Some(body)) =
        (id(req.sender_id), id(req.receiver_id), text(&req.message))
    else {
        return Err(bad_request("Sender ID, Receiver ID, and message required"));
    };
    let body = body.trim();
    if body.is_empty() {
        return Err(bad_request("Message cannot be empty"));
    }
    if sender_id == receiver_id {
        return Err(bad_request("Cannot send message to yourself"));
    }
    for user_id in [sender_id, receiver_id] {
        if !state.store.user_exists(user_id)? {
            return Err(ApiError(ServiceError::not_found("User not found")));
        }
    }

    let sealed = state.policy.seal(SensitiveField::MessageBody, body);
    let message_id = state.store.insert_message(sender_id, receiver_id, &sealed)?;
    info!(message_id, sender_id, receiver_id, "message sent");

    let message = state
        .store
        .message_by_id(message_id, sender_id)?
        .ok_or_else(|| ApiError(ServiceError::Internal("created message vanished".into())))?;
    ok(MessageBody {
        message: state.policy.reveal(message),
    })
}

/// `POST /api/get_messages`
///
/// Returns the thread as seen by `user1_id` and marks everything `user2_id`
/// sent them as read.
pub async fn get_messages(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ThreadRequest>,
) -> ApiResult<MessagesBody> {
    let (Some(viewer), Some(other)) = (id(req.user1_id), id(req.user2_id)) else {
        return Err(bad_request("Both user IDs required"));
    };
    let messages = state.store.thread(viewer, other)?;
    if !messages.is_empty() {
        state.store.mark_read(viewer, other)?;
    }
    ok(MessagesBody {
        messages: state.policy.reveal_all(messages),
    })
}

/// `POST /api/get_conversations`
pub async fn get_conversations(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UserIdRequest>,
) -> ApiResult<ConversationsBody> {
    let user_id = id(req.user_id).ok_or_else(|| bad_request("User ID required"))?;
    let conversations = state.store.conversations(user_id)?;
    ok(ConversationsBody {
        conversations: state.policy.reveal_all(conversations),
    })
}

/// `POST /api/edit_message`
///
/// Only the sender may edit.
pub async fn edit_message(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EditMessageRequest>,
) -> ApiResult<Ack> {
    let (Some(message_id), Some(user_id), Some(body)) =
        (id(req.message_id), id(req.user_id), text(&req.message))
    else {
        return Err(bad_request("Message ID, User ID, and message content required"));
    };
    let body = body.trim();
    if body.is_empty() {
        return Err(bad_request("Message cannot be empty"));
    }
    if participants(&state, message_id)?.sender_id != user_id {
        return Err(ApiError(ServiceError::Forbidden(
            "You can only edit your own messages".into(),
        )));
    }

    let sealed = state.policy.seal(SensitiveField::MessageBody, body);
    state.store.update_message(message_id, &sealed)?;
    info!(message_id, user_id, "message edited");
    ok(Ack::new("Message updated successfully"))
}

/// `POST /api/delete_message`
///
/// The sender removes the message for both sides; the receiver only hides it
/// from their own thread.
pub async fn delete_message(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<MessageActionRequest>,
) -> ApiResult<Ack> {
    let (Some(message_id), Some(user_id)) = (id(req.message_id), id(req.user_id)) else {
        return Err(bad_request("Message ID and User ID required"));
    };
    let who = participants(&state, message_id)?;
    if who.sender_id == user_id {
        state.store.delete_message_for_both(message_id)?;
    } else if who.receiver_id == user_id {
        state.store.delete_message_for_receiver(message_id)?;
    } else {
        return Err(ApiError(ServiceError::Forbidden(
            "You don't have permission to delete this message".into(),
        )));
    }
    info!(message_id, user_id, "message deleted");
    ok(Ack::new("Message deleted successfully"))
}

/// `POST /api/toggle_message_like`
pub async fn toggle_message_like(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<MessageActionRequest>,
) -> ApiResult<LikeToggleBody> {
    let (Some(message_id), Some(user_id)) = (id(req.message_id), id(req.user_id)) else {
        return Err(bad_request("Message ID and User ID required"));
    };
    let (is_liked, likes_count) = state.store.toggle_message_like(message_id, user_id)?;
    ok(LikeToggleBody {
        is_liked,
        likes_count,
    })
}
