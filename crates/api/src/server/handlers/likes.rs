//! Profile likes between users.

use axum::extract::State;
use common::protocol::{
    CheckUserLikedRequest, LikedUsersBody, LikesCountBody, LikesCountRequest,
    ToggleUserLikeRequest, UserLikeToggleBody,
};

use super::id;
use crate::server::error::{bad_request, ok, ApiResult, JsonBody};
use crate::server::state::AppState;

/// `POST /api/toggle_like`
pub async fn toggle_like(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ToggleUserLikeRequest>,
) -> ApiResult<UserLikeToggleBody> {
    let (Some(user_id), Some(liked_user_id)) = (id(req.user_id), id(req.liked_user_id)) else {
        return Err(bad_request("User ID and Liked User ID required"));
    };
    if user_id == liked_user_id {
        return Err(bad_request("Cannot like yourself"));
    }
    let (liked, like_count) = state.store.toggle_user_like(user_id, liked_user_id)?;
    let message = if liked {
        "User liked successfully"
    } else {
        "Like removed"
    };
    ok(UserLikeToggleBody {
        liked,
        like_count,
        message: message.into(),
    })
}

/// `POST /api/get_likes_count`
///
/// Every requested id appears in the result, with zero when nobody liked it.
pub async fn get_likes_count(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LikesCountRequest>,
) -> ApiResult<LikesCountBody> {
    let user_ids = req.user_ids.map(|ids| ids.into_vec()).unwrap_or_default();
    if user_ids.is_empty() {
        return Err(bad_request("User IDs required"));
    }
    ok(LikesCountBody {
        likes: state.store.like_counts(&user_ids)?,
    })
}

/// `POST /api/check_user_liked`
///
/// The subset of `liked_user_ids` that `user_id` has liked.
pub async fn check_user_liked(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CheckUserLikedRequest>,
) -> ApiResult<LikedUsersBody> {
    let candidates = req
        .liked_user_ids
        .map(|ids| ids.into_vec())
        .unwrap_or_default();
    let Some(user_id) = id(req.user_id).filter(|_| !candidates.is_empty()) else {
        return Err(bad_request("User ID and Liked User IDs required"));
    };
    ok(LikedUsersBody {
        liked_user_ids: state.store.liked_among(user_id, &candidates)?,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::server::handlers::testing::{assert_error, TestApp};

    #[tokio::test]
    async fn toggle_like_flips_and_counts() {
        let app = TestApp::new();
        let a = app.signup("Ayse", None).await;
        let b = app.signup("Berk", None).await;
        let body = json!({"user_id": a, "liked_user_id": b});

        let (status, resp) = app.post("/api/toggle_like", body.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            resp,
            json!({"success": true, "liked": true, "like_count": 1, "message": "User liked successfully"})
        );
        let (_, resp) = app.post("/api/toggle_like", body).await;
        assert_eq!(resp["liked"], false);
        assert_eq!(resp["like_count"], 0);
        assert_eq!(resp["message"], "Like removed");
    }

    #[tokio::test]
    async fn toggle_like_validation() {
        let app = TestApp::new();
        let a = app.signup("Ayse", None).await;
        let resp = app
            .post("/api/toggle_like", json!({"user_id": a, "liked_user_id": a}))
            .await;
        assert_error(resp, StatusCode::BAD_REQUEST, "Cannot like yourself");
        let resp = app.post("/api/toggle_like", json!({"user_id": a})).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "User ID and Liked User ID required");
    }

    #[tokio::test]
    async fn likes_count_includes_zeros() {
        let app = TestApp::new();
        let a = app.signup("Ayse", None).await;
        let b = app.signup("Berk", None).await;
        let c = app.signup("Cem", None).await;
        app.post("/api/toggle_like", json!({"user_id": a, "liked_user_id": b}))
            .await;
        app.post("/api/toggle_like", json!({"user_id": c, "liked_user_id": b}))
            .await;

        let (status, resp) = app
            .post("/api/get_likes_count", json!({"user_ids": [b, c]}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["likes"][b.to_string()], 2);
        assert_eq!(resp["likes"][c.to_string()], 0);

        let (_, resp) = app.post("/api/get_likes_count", json!({"user_ids": b})).await;
        assert_eq!(resp["likes"][b.to_string()], 2);

        let resp = app.post("/api/get_likes_count", json!({"user_ids": []})).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "User IDs required");
    }

    #[tokio::test]
    async fn check_user_liked_returns_subset() {
        let app = TestApp::new();
        let a = app.signup("Ayse", None).await;
        let b = app.signup("Berk", None).await;
        let c = app.signup("Cem", None).await;
        app.post("/api/toggle_like", json!({"user_id": a, "liked_user_id": c}))
            .await;

        let (status, resp) = app
            .post("/api/check_user_liked", json!({"user_id": a, "liked_user_ids": [b, c]}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["liked_user_ids"], json!([c]));

        let resp = app.post("/api/check_user_liked", json!({"user_id": a})).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "User ID and Liked User IDs required");
    }
}
