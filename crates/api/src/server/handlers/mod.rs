//! Axum request handlers for all service endpoints.
//!
//! Every endpoint takes a JSON body through [`JsonBody`](super::error::JsonBody)
//! and answers with the `{"success": ...}` envelope. Values of encrypted
//! columns are sealed before they reach the datastore and revealed before
//! they are serialised.

pub mod friends;
pub mod likes;
pub mod messages;
pub mod posts;
pub mod presence;
pub mod users;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{ErrorResponse, HealthResponse};

use super::state::AppState;

/// A required numeric id: present and non-zero.
fn id(value: Option<i64>) -> Option<i64> {
    value.filter(|n| *n != 0)
}

/// A required text field: present and non-empty before trimming.
fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// `GET /health`: liveness and readiness check.
///
/// Returns `200 OK` when the datastore answers, `503 Service Unavailable`
/// otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let datastore_ready = state.store.ping();

    let (status_code, status_str) = if datastore_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        datastore_ready,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Drives the full router over an in-memory datastore.

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::server::{router, state::AppState};

    pub struct TestApp {
        pub router: Router,
        pub state: AppState,
    }

    impl TestApp {
        pub fn new() -> Self {
            let state = AppState::default();
            Self {
                router: router::build(state.clone()),
                state,
            }
        }

        pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
            let req = Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.send(req).await
        }

        pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
            let resp = self.router.clone().oneshot(req).await.unwrap();
            let status = resp.status();
            let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        /// Register an account and return its id.
        pub async fn signup(&self, name: &str, bio: Option<&str>) -> i64 {
            let mut body = json!({
                "full_name": name,
                "email": format!("{}@example.com", name.to_lowercase()),
                "phone": "5550100",
                "password": "hunter22",
                "gender": "other",
                "age": 29,
                "location": "Izmir",
            });
            if let Some(bio) = bio {
                body["bio"] = json!(bio);
            }
            let (status, resp) = self.post("/api/signup", body).await;
            assert_eq!(status, StatusCode::OK, "{resp}");
            resp["user"]["id"].as_i64().unwrap()
        }
    }

    /// Assert a failure envelope with `status` and `message`.
    pub fn assert_error(actual: (StatusCode, Value), status: StatusCode, message: &str) {
        assert_eq!(actual.0, status, "{}", actual.1);
        assert_eq!(actual.1, json!({"success": false, "error": message}));
    }
}

#[cfg(test)]
mod tests {
    use super::testing::TestApp;
    use super::*;
    use axum::{body::Body, http::Request};

    #[tokio::test]
    async fn health_reports_ok_with_datastore() {
        let app = TestApp::new();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["datastore_ready"], true);
    }

    #[test]
    fn id_rejects_zero_and_missing() {
        assert_eq!(id(Some(3)), Some(3));
        assert_eq!(id(Some(0)), None);
        assert_eq!(id(None), None);
    }

    #[test]
    fn text_rejects_empty_and_missing() {
        assert_eq!(text(&Some("hi".into())), Some("hi"));
        assert_eq!(text(&Some(" ".into())), Some(" "));
        assert_eq!(text(&Some(String::new())), None);
        assert_eq!(text(&None), None);
    }
}
