//! Activity heartbeat and online status.

use axum::extract::State;
use common::protocol::{Ack, OnlineUsersBody, UserIdRequest};

use super::id;
use crate::presence::online_map;
use crate::server::error::{bad_request, ok, ApiResult, JsonBody};
use crate::server::state::AppState;

/// `POST /api/update_activity`
pub async fn update_activity(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UserIdRequest>,
) -> ApiResult<Ack> {
    let user_id = id(req.user_id).ok_or_else(|| bad_request("User ID required"))?;
    state.store.touch_activity(user_id)?;
    ok(Ack::new("Activity updated"))
}

/// `POST /api/get_online_users`
pub async fn get_online_users(State(state): State<AppState>) -> ApiResult<OnlineUsersBody> {
    let now = chrono::Utc::now().naive_utc();
    let online_users = online_map(state.store.activity()?, now, state.online_threshold);
    ok(OnlineUsersBody { online_users })
}
