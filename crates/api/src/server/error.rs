//! Conversion of handler failures into the JSON error envelope.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{ApiResponse, ErrorResponse};
use common::ServiceError;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::password::PasswordError;
use crate::store::StoreError;

/// A [`ServiceError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap `body` in the success envelope.
pub fn ok<T>(body: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(body)))
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        warn!(error = %e, "datastore operation failed");
        ApiError(ServiceError::Internal("database error".into()))
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        warn!(error = %e, "password hashing failed");
        ApiError(ServiceError::Internal("password processing failed".into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

/// Shorthand for a 400 with `message`.
pub fn bad_request(message: &str) -> ApiError {
    ApiError(ServiceError::bad_request(message))
}

/// JSON request body that tolerates an empty body and reports malformed
/// input through the error envelope.
///
/// An empty body deserialises as `T::default()`, so a missing field and a
/// missing body produce the same validation message.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError(ServiceError::bad_request(e.body_text())))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(JsonBody(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError(ServiceError::bad_request(format!("Invalid JSON body: {e}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_become_internal() {
        let err = ApiError::from(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
        assert_eq!(err.0.http_status(), 500);
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_keep_status() {
        let resp = ApiError(ServiceError::Forbidden("no".into())).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let resp = bad_request("Post ID required").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
