//! Axum router construction.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::handlers::{self, friends, likes, messages, posts, presence, users};
use super::{middleware, state::AppState};

/// JSON API routes, mounted under `/api`.
fn api_routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/get_user_by_id", post(users::get_user_by_id))
        .route("/get_all_users", post(users::get_all_users))
        .route("/update_profile", post(users::update_profile))
        // Feed
        .route("/create_post", post(posts::create_post))
        .route("/get_posts", post(posts::get_posts))
        .route("/toggle_post_like", post(posts::toggle_post_like))
        .route("/share_post", post(posts::share_post))
        .route("/add_comment", post(posts::add_comment))
        .route("/get_comments", post(posts::get_comments))
        // Messaging
        .route("/send_message", post(messages::send_message))
        .route("/get_messages", post(messages::get_messages))
        .route("/get_conversations", post(messages::get_conversations))
        .route("/edit_message", post(messages::edit_message))
        .route("/delete_message", post(messages::delete_message))
        .route("/toggle_message_like", post(messages::toggle_message_like))
        // Profile likes
        .route("/toggle_like", post(likes::toggle_like))
        .route("/get_likes_count", post(likes::get_likes_count))
        .route("/check_user_liked", post(likes::check_user_liked))
        // Friends
        .route("/send_friend_request", post(friends::send_friend_request))
        .route(
            "/respond_to_friend_request",
            post(friends::respond_to_friend_request),
        )
        .route("/get_friend_requests", post(friends::get_friend_requests))
        .route("/get_friends", post(friends::get_friends))
        .route(
            "/clean_rejected_requests",
            post(friends::clean_rejected_requests),
        )
        // Presence
        .route("/update_activity", post(presence::update_activity))
        .route("/get_online_users", post(presence::get_online_users))
}

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn unknown_route_returns_404_envelope() {
        let app = build(AppState::default());
        let req = Request::builder()
            .method("POST")
            .uri("/api/encrypt")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "the requested resource does not exist");
    }

    #[tokio::test]
    async fn health_route_exists() {
        let app = build(AppState::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_routes_reject_get() {
        let app = build(AppState::default());
        let req = Request::builder()
            .uri("/api/get_posts")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn empty_body_reads_as_missing_fields() {
        let app = build(AppState::default());
        let req = Request::builder()
            .method("POST")
            .uri("/api/get_user_by_id")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "User ID required");
    }
}
