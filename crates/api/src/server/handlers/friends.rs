//! Friend request lifecycle and friend listings.

use axum::extract::State;
use common::protocol::{
    Ack, CleanupBody, FriendRequestRequest, FriendRequestsBody, FriendsBody, RespondBody,
    RespondFriendRequest, UserIdRequest,
};
use common::ServiceError;
use tracing::info;

use super::{id, text};
use crate::server::error::{bad_request, ok, ApiError, ApiResult, JsonBody};
use crate::server::state::AppState;
use crate::store::FriendStatus;

fn conflict(message: &str) -> ApiError {
    ApiError(ServiceError::Conflict(message.into()))
}

/// `POST /api/send_friend_request`
///
/// A previously rejected request between the same pair is reopened.
pub async fn send_friend_request(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<FriendRequestRequest>,
) -> ApiResult<Ack> {
    let (Some(requester_id), Some(receiver_id)) = (id(req.requester_id), id(req.receiver_id))
    else {
        return Err(bad_request("Requester ID and Receiver ID required"));
    };
    if requester_id == receiver_id {
        return Err(bad_request("Cannot send friend request to yourself"));
    }

    match state.store.request_between(requester_id, receiver_id)? {
        Some(r) if r.status == FriendStatus::Pending => {
            return Err(conflict("Friend request already sent and pending"));
        }
        Some(r) if r.status == FriendStatus::Accepted => {
            return Err(conflict("Already friends with this user"));
        }
        _ => {}
    }
    match state.store.request_between(receiver_id, requester_id)? {
        Some(r) if r.status == FriendStatus::Pending => {
            return Err(conflict("This user has already sent you a friend request"));
        }
        Some(r) if r.status == FriendStatus::Accepted => {
            return Err(conflict("Already friends with this user"));
        }
        _ => {}
    }

    let request_id = state
        .store
        .insert_friend_request(requester_id, receiver_id)?;
    info!(request_id, requester_id, receiver_id, "friend request sent");
    ok(Ack::new("Friend request sent successfully"))
}

/// `POST /api/respond_to_friend_request`
///
/// `accept` marks the request accepted; `reject` deletes it.
pub async fn respond_to_friend_request(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RespondFriendRequest>,
) -> ApiResult<RespondBody> {
    let (Some(request_id), Some(action)) = (id(req.request_id), text(&req.action)) else {
        return Err(bad_request("Request ID and action required"));
    };
    let accept = match action {
        "accept" => true,
        "reject" => false,
        _ => return Err(bad_request("Invalid action. Use 'accept' or 'reject'")),
    };

    let request = state
        .store
        .request_by_id(request_id)?
        .ok_or_else(|| ApiError(ServiceError::not_found("Friend request not found")))?;
    if request.status != FriendStatus::Pending {
        return Err(conflict("Friend request already processed"));
    }

    let (message, status) = if accept {
        state.store.accept_friend_request(request_id)?;
        ("Friend request accepted", "accepted")
    } else {
        state.store.delete_friend_request(request_id)?;
        ("Friend request rejected", "deleted")
    };
    info!(request_id, status, "friend request answered");
    ok(RespondBody {
        message: message.into(),
        status: status.into(),
    })
}

/// `POST /api/get_friend_requests`
///
/// Pending requests received by `user_id`.
pub async fn get_friend_requests(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UserIdRequest>,
) -> ApiResult<FriendRequestsBody> {
    let user_id = id(req.user_id).ok_or_else(|| bad_request("User ID required"))?;
    let requests = state.store.pending_requests_for(user_id)?;
    ok(FriendRequestsBody {
        requests: state.policy.reveal_all(requests),
    })
}

/// `POST /api/get_friends`
///
/// Accepted friendships in either direction.
pub async fn get_friends(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UserIdRequest>,
) -> ApiResult<FriendsBody> {
    let user_id = id(req.user_id).ok_or_else(|| bad_request("User ID required"))?;
    let friends = state.store.friends_of(user_id)?;
    ok(FriendsBody {
        friends: state.policy.reveal_all(friends),
    })
}

/// `POST /api/clean_rejected_requests`
pub async fn clean_rejected_requests(State(state): State<AppState>) -> ApiResult<CleanupBody> {
    let deleted_count = state.store.delete_rejected_requests()?;
    info!(deleted_count, "rejected friend requests removed");
    ok(CleanupBody {
        message: "Cleaned up rejected friend requests".into(),
        deleted_count,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::server::handlers::testing::{assert_error, TestApp};
    use crate::store::FriendStatus;

    async fn request(app: &TestApp, from: i64, to: i64) -> (StatusCode, Value) {
        app.post(
            "/api/send_friend_request",
            json!({"requester_id": from, "receiver_id": to}),
        )
        .await
    }

    async fn pending_ids(app: &TestApp, user_id: i64) -> Vec<i64> {
        let (_, resp) = app
            .post("/api/get_friend_requests", json!({"user_id": user_id}))
            .await;
        resp["requests"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["request_id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn request_then_accept() {
        let app = TestApp::new();
        let a = app.signup("Ayse", Some("likes chess")).await;
        let b = app.signup("Berk", Some("plays guitar")).await;

        let (status, resp) = request(&app, a, b).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["message"], "Friend request sent successfully");

        let (_, resp) = app.post("/api/get_friend_requests", json!({"user_id": b})).await;
        let pending = &resp["requests"][0];
        assert_eq!(pending["requester_id"], a);
        assert_eq!(pending["full_name"], "Ayse");
        assert_eq!(pending["bio"], "likes chess");
        assert_eq!(pending["status"], "pending");

        let (status, resp) = app
            .post(
                "/api/respond_to_friend_request",
                json!({"request_id": pending["request_id"], "action": "accept"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["status"], "accepted");
        assert_eq!(resp["message"], "Friend request accepted");

        for (me, other, bio) in [(a, b, "plays guitar"), (b, a, "likes chess")] {
            let (_, resp) = app.post("/api/get_friends", json!({"user_id": me})).await;
            let friends = resp["friends"].as_array().unwrap();
            assert_eq!(friends.len(), 1);
            assert_eq!(friends[0]["friend_id"], other);
            assert_eq!(friends[0]["bio"], bio);
        }
        assert!(pending_ids(&app, b).await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_and_reverse_requests_conflict() {
        let app = TestApp::new();
        let a = app.signup("Ayse", None).await;
        let b = app.signup("Berk", None).await;
        request(&app, a, b).await;

        assert_error(
            request(&app, a, b).await,
            StatusCode::CONFLICT,
            "Friend request already sent and pending",
        );
        assert_error(
            request(&app, b, a).await,
            StatusCode::CONFLICT,
            "This user has already sent you a friend request",
        );

        let id = pending_ids(&app, b).await[0];
        app.post(
            "/api/respond_to_friend_request",
            json!({"request_id": id, "action": "accept"}),
        )
        .await;
        assert_error(
            request(&app, a, b).await,
            StatusCode::CONFLICT,
            "Already friends with this user",
        );
        assert_error(
            request(&app, b, a).await,
            StatusCode::CONFLICT,
            "Already friends with this user",
        );
    }

    #[tokio::test]
    async fn reject_deletes_request() {
        let app = TestApp::new();
        let a = app.signup("Ayse", None).await;
        let b = app.signup("Berk", None).await;
        request(&app, a, b).await;
        let id = pending_ids(&app, b).await[0];

        let (status, resp) = app
            .post(
                "/api/respond_to_friend_request",
                json!({"request_id": id, "action": "reject"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["status"], "deleted");
        assert!(app.state.store.request_by_id(id).unwrap().is_none());

        let (status, _) = request(&app, a, b).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn stale_rejected_request_is_reopened_and_cleaned() {
        let app = TestApp::new();
        let a = app.signup("Ayse", None).await;
        let b = app.signup("Berk", None).await;
        let c = app.signup("Cem", None).await;
        request(&app, a, b).await;
        request(&app, c, b).await;
        let ids = pending_ids(&app, b).await;
        for id in &ids {
            app.state
                .store
                .force_request_status(*id, FriendStatus::Rejected)
                .unwrap();
        }

        let (status, _) = request(&app, a, b).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending_ids(&app, b).await.len(), 1);

        let (status, resp) = app.post("/api/clean_rejected_requests", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["message"], "Cleaned up rejected friend requests");
        assert_eq!(resp["deleted_count"], 1);
    }

    #[tokio::test]
    async fn respond_validation() {
        let app = TestApp::new();
        let a = app.signup("Ayse", None).await;
        let b = app.signup("Berk", None).await;

        let resp = app
            .post("/api/respond_to_friend_request", json!({"request_id": 1}))
            .await;
        assert_error(resp, StatusCode::BAD_REQUEST, "Request ID and action required");
        let resp = app
            .post(
                "/api/respond_to_friend_request",
                json!({"request_id": 1, "action": "maybe"}),
            )
            .await;
        assert_error(
            resp,
            StatusCode::BAD_REQUEST,
            "Invalid action. Use 'accept' or 'reject'",
        );
        let resp = app
            .post(
                "/api/respond_to_friend_request",
                json!({"request_id": 42, "action": "accept"}),
            )
            .await;
        assert_error(resp, StatusCode::NOT_FOUND, "Friend request not found");

        request(&app, a, b).await;
        let id = pending_ids(&app, b).await[0];
        let accept = json!({"request_id": id, "action": "accept"});
        app.post("/api/respond_to_friend_request", accept.clone()).await;
        let resp = app.post("/api/respond_to_friend_request", accept).await;
        assert_error(resp, StatusCode::CONFLICT, "Friend request already processed");

        assert_error(
            request(&app, a, a).await,
            StatusCode::BAD_REQUEST,
            "Cannot send friend request to yourself",
        );
        assert_error(
            app.post("/api/get_friends", json!({})).await,
            StatusCode::BAD_REQUEST,
            "User ID required",
        );
    }
}
