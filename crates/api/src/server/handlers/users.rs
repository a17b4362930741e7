//! Account endpoints: signup, login, lookup and profile updates.

use axum::extract::State;
use common::protocol::{
    CurrentUserRequest, LoginRequest, SignupRequest, UpdateProfileRequest, UserBody,
    UserIdRequest, UsersBody,
};
use common::ServiceError;
use tracing::info;

use super::{id, text};
use crate::policy::SensitiveField;
use crate::server::error::{bad_request, ok, ApiError, ApiResult, JsonBody};
use crate::server::state::AppState;
use crate::store::{NewUser, ProfileChange};

fn user_not_found() -> ApiError {
    ApiError(ServiceError::not_found("User not found"))
}

/// `POST /api/signup`
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> ApiResult<UserBody> {
    let missing = |field: &str| bad_request(&format!("Missing: {field}"));
    let full_name = text(&req.full_name).ok_or_else(|| missing("full_name"))?;
    let email = text(&req.email).ok_or_else(|| missing("email"))?;
    let phone = text(&req.phone).ok_or_else(|| missing("phone"))?;
    let password = text(&req.password).ok_or_else(|| missing("password"))?;
    let gender = text(&req.gender).ok_or_else(|| missing("gender"))?;
    let age = id(req.age).ok_or_else(|| missing("age"))?;

    let email = email.trim().to_lowercase();
    if state.store.email_exists(&email)? {
        return Err(ApiError(ServiceError::Conflict("Email already registered.".into())));
    }

    let password_hash = state.passwords.hash(password)?;
    let bio = state
        .policy
        .seal_nullable(SensitiveField::UserBio, req.bio.as_deref().map(str::trim));

    let user_id = state
        .store
        .insert_user(&NewUser {
            full_name: full_name.trim(),
            email: &email,
            phone: phone.trim(),
            password_hash: &password_hash,
            gender: gender.trim(),
            age,
            location: req.location.as_deref().map(str::trim).unwrap_or_default(),
            bio: bio.as_deref(),
        })
        .map_err(|e| {
            if e.is_constraint_violation() {
                ApiError(ServiceError::Conflict("Email already registered.".into()))
            } else {
                e.into()
            }
        })?;
    info!(user_id, "account created");

    let user = state
        .store
        .user_by_id(user_id)?
        .ok_or_else(|| ApiError(ServiceError::Internal("created user vanished".into())))?;
    ok(UserBody {
        user: state.policy.reveal(user),
    })
}

/// `POST /api/login`
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<UserBody> {
    let (Some(email), Some(password)) = (text(&req.email), text(&req.password)) else {
        return Err(bad_request("Email and password required"));
    };
    let email = email.trim().to_lowercase();

    let (user, hash) = state
        .store
        .credentials_by_email(&email)?
        .ok_or_else(user_not_found)?;
    if !state.passwords.verify(password, &hash)? {
        return Err(ApiError(ServiceError::Unauthorized("Invalid password".into())));
    }
    ok(UserBody {
        user: state.policy.reveal(user),
    })
}

/// `POST /api/get_user_by_id`
pub async fn get_user_by_id(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UserIdRequest>,
) -> ApiResult<UserBody> {
    let user_id = id(req.user_id).ok_or_else(|| bad_request("User ID required"))?;
    let user = state.store.user_by_id(user_id)?.ok_or_else(user_not_found)?;
    ok(UserBody {
        user: state.policy.reveal(user),
    })
}

/// `POST /api/get_all_users`
///
/// Leaves out `current_user_id` when it is a positive id.
pub async fn get_all_users(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CurrentUserRequest>,
) -> ApiResult<UsersBody> {
    let exclude = req.current_user_id.filter(|n| *n > 0);
    let users = state.policy.reveal_all(state.store.all_users(exclude)?);
    ok(UsersBody {
        count: users.len(),
        users,
    })
}

/// `POST /api/update_profile`
///
/// Only the fields present in the body are changed. An empty `bio` clears it.
pub async fn update_profile(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> ApiResult<UserBody> {
    let user_id = id(req.user_id).ok_or_else(|| bad_request("User ID required"))?;
    if !state.store.user_exists(user_id)? {
        return Err(user_not_found());
    }

    let trimmed = |s: &Option<String>| s.as_deref().map(|v| v.trim().to_owned());
    let mut changes = Vec::new();
    if let Some(v) = trimmed(&req.full_name) {
        changes.push(ProfileChange::FullName(v));
    }
    if let Some(v) = trimmed(&req.phone) {
        changes.push(ProfileChange::Phone(v));
    }
    if let Some(v) = trimmed(&req.gender) {
        changes.push(ProfileChange::Gender(v));
    }
    if let Some(v) = req.age {
        changes.push(ProfileChange::Age(v));
    }
    if let Some(v) = trimmed(&req.location) {
        changes.push(ProfileChange::Location(v));
    }
    if let Some(v) = trimmed(&req.bio) {
        let sealed = state.policy.seal_nullable(SensitiveField::UserBio, Some(&v));
        changes.push(ProfileChange::Bio(sealed));
    }
    if changes.is_empty() {
        return Err(bad_request("No fields to update"));
    }

    state.store.update_user(user_id, &changes)?;
    info!(user_id, fields = changes.len(), "profile updated");

    let user = state.store.user_by_id(user_id)?.ok_or_else(user_not_found)?;
    ok(UserBody {
        user: state.policy.reveal(user),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::server::handlers::testing::{assert_error, TestApp};

    #[tokio::test]
    async fn signup_seals_bio_and_returns_plaintext() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/signup",
                json!({
                    "full_name": "  Ayse Yilmaz ",
                    "email": " Ayse@Example.COM ",
                    "phone": "5550100",
                    "password": "hunter22",
                    "gender": "female",
                    "age": 27,
                    "bio": "  Loves climbing ",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["success"], true);
        let user = &body["user"];
        assert_eq!(user["full_name"], "Ayse Yilmaz");
        assert_eq!(user["email"], "ayse@example.com");
        assert_eq!(user["bio"], "Loves climbing");
        assert_eq!(user["location"], "");
        assert!(user.get("password").is_none());

        let id = user["id"].as_i64().unwrap();
        let stored = app.state.store.raw_bio(id).unwrap().unwrap();
        assert_ne!(stored, "Loves climbing");
        assert!(!stored.contains("climbing"));
    }

    #[tokio::test]
    async fn signup_without_bio_stores_null() {
        let app = TestApp::new();
        let id = app.signup("Berk", None).await;
        assert_eq!(app.state.store.raw_bio(id).unwrap(), None);
        let id = app.signup("Cem", Some("   ")).await;
        assert_eq!(app.state.store.raw_bio(id).unwrap(), None);
    }

    #[tokio::test]
    async fn signup_reports_first_missing_field() {
        let app = TestApp::new();
        let resp = app.post("/api/signup", json!({})).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "Missing: full_name");
        let resp = app
            .post(
                "/api/signup",
                json!({"full_name": "A", "email": "a@x", "phone": "1", "password": "p", "gender": "f", "age": 0}),
            )
            .await;
        assert_error(resp, StatusCode::BAD_REQUEST, "Missing: age");
    }

    #[tokio::test]
    async fn signup_rejects_duplicate_email() {
        let app = TestApp::new();
        app.signup("Ayse", None).await;
        let resp = app
            .post(
                "/api/signup",
                json!({"full_name": "Ayse", "email": "AYSE@example.com", "phone": "1",
                       "password": "p", "gender": "f", "age": 20}),
            )
            .await;
        assert_error(resp, StatusCode::CONFLICT, "Email already registered.");
    }

    #[tokio::test]
    async fn login_checks_password() {
        let app = TestApp::new();
        app.signup("Ayse", Some("secret bio")).await;

        let (status, body) = app
            .post("/api/login", json!({"email": "AYSE@example.com", "password": "hunter22"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["full_name"], "Ayse");
        assert_eq!(body["user"]["bio"], "secret bio");

        let resp = app
            .post("/api/login", json!({"email": "ayse@example.com", "password": "nope"}))
            .await;
        assert_error(resp, StatusCode::UNAUTHORIZED, "Invalid password");

        let resp = app
            .post("/api/login", json!({"email": "who@example.com", "password": "x"}))
            .await;
        assert_error(resp, StatusCode::NOT_FOUND, "User not found");

        let resp = app.post("/api/login", json!({"email": "ayse@example.com"})).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "Email and password required");
    }

    #[tokio::test]
    async fn get_user_by_id_reveals_bio() {
        let app = TestApp::new();
        let id = app.signup("Ayse", Some("tea over coffee")).await;
        let (status, body) = app.post("/api/get_user_by_id", json!({"user_id": id})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["bio"], "tea over coffee");

        let resp = app.post("/api/get_user_by_id", json!({"user_id": id + 1})).await;
        assert_error(resp, StatusCode::NOT_FOUND, "User not found");
        let resp = app.post("/api/get_user_by_id", json!({})).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "User ID required");
    }

    #[tokio::test]
    async fn get_all_users_reveals_every_bio() {
        let app = TestApp::new();
        let a = app.signup("Ayse", Some("first bio")).await;
        app.signup("Berk", Some("second bio")).await;
        app.signup("Cem", None).await;

        let (status, body) = app.post("/api/get_all_users", json!({"current_user_id": a})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        let users = body["users"].as_array().unwrap();
        assert_eq!(users[0]["full_name"], "Cem");
        assert_eq!(users[0]["bio"], serde_json::Value::Null);
        assert_eq!(users[1]["bio"], "second bio");

        let (_, body) = app.post("/api/get_all_users", json!({})).await;
        assert_eq!(body["count"], 3);
    }

    #[tokio::test]
    async fn legacy_plaintext_bio_is_returned_as_is() {
        let app = TestApp::new();
        let id = app.signup("Ayse", None).await;
        app.state
            .store
            .update_user(id, &[crate::store::ProfileChange::Bio(Some("I love hiking and coffee.".into()))])
            .unwrap();
        let (_, body) = app.post("/api/get_user_by_id", json!({"user_id": id})).await;
        assert_eq!(body["user"]["bio"], "I love hiking and coffee.");
    }

    #[tokio::test]
    async fn update_profile_changes_given_fields() {
        let app = TestApp::new();
        let id = app.signup("Ayse", Some("old bio")).await;
        let (status, body) = app
            .post(
                "/api/update_profile",
                json!({"user_id": id, "location": " Ankara ", "age": 28, "bio": "new bio"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["user"]["location"], "Ankara");
        assert_eq!(body["user"]["age"], 28);
        assert_eq!(body["user"]["bio"], "new bio");
        assert_eq!(body["user"]["phone"], "5550100");

        let stored = app.state.store.raw_bio(id).unwrap().unwrap();
        assert!(!stored.contains("new bio"));
    }

    #[tokio::test]
    async fn update_profile_with_empty_bio_clears_it() {
        let app = TestApp::new();
        let id = app.signup("Ayse", Some("old bio")).await;
        let (_, body) = app
            .post("/api/update_profile", json!({"user_id": id, "bio": ""}))
            .await;
        assert_eq!(body["user"]["bio"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn update_profile_validation() {
        let app = TestApp::new();
        let id = app.signup("Ayse", None).await;
        let resp = app.post("/api/update_profile", json!({"user_id": id})).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "No fields to update");
        let resp = app
            .post("/api/update_profile", json!({"user_id": id + 5, "age": 3}))
            .await;
        assert_error(resp, StatusCode::NOT_FOUND, "User not found");
        let resp = app.post("/api/update_profile", json!({"age": 3})).await;
        assert_error(resp, StatusCode::BAD_REQUEST, "User ID required");
    }
}
