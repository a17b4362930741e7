//! Feed endpoints: posts, post likes, shares and comments.

use axum::extract::State;
use common::protocol::{
    AddCommentRequest, CommentBody, CommentsBody, CreatePostRequest, CurrentUserRequest,
    LikeToggleBody, PostActionRequest, PostBody, PostIdRequest, PostsBody, ShareBody,
    SharePostRequest,
};
use common::ServiceError;
use tracing::info;

use super::{id, text};
use crate::policy::SensitiveField;
use crate::server::error::{bad_request, ok, ApiError, ApiResult, JsonBody};
use crate::server::state::AppState;

fn ensure_user(state: &AppState, user_id: i64) -> Result<(), ApiError> {
    if state.store.user_exists(user_id)? {
        Ok(())
    } else {
        Err(ApiError(ServiceError::not_found("User not found")))
    }
}

/// `POST /api/create_post`
pub async fn create_post(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreatePostRequest>,
) -> ApiResult<PostBody> {
    let (Some(user_id), Some(content)) = (id(req.user_id), text(&req.content)) else {
        return Err(bad_request("User ID and content required"));
    };
    let content = content.trim();
    if content.is_empty() {
        return Err(bad_request("Post content cannot be empty"));
    }
    ensure_user(&state, user_id)?;

    let sealed = state.policy.seal(SensitiveField::PostContent, content);
    let post_id = state.store.insert_post(user_id, &sealed)?;
    info!(post_id, user_id, "post created");

    let post = state
        .store
        .post_by_id(post_id, user_id)?
        .ok_or_else(|| ApiError(ServiceError::Internal("created post vanished".into())))?;
    ok(PostBody {
        post: state.policy.reveal(post),
    })
}

/// `POST /api/get_posts`
///
/// `is_liked` is computed for `current_user_id`; without it every post reads
/// as not liked.
pub async fn get_posts(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CurrentUserRequest>,
) -> ApiResult<PostsBody> {
    let viewer = req.current_user_id.unwrap_or(0);
    let posts = state.store.list_posts(viewer)?;
    ok(PostsBody {
        posts: state.policy.reveal_all(posts),
    })
}

/// `POST /api/toggle_post_like`
pub async fn toggle_post_like(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PostActionRequest>,
) -> ApiResult<LikeToggleBody> {
    let (Some(post_id), Some(user_id)) = (id(req.post_id), id(req.user_id)) else {
        return Err(bad_request("Post ID and User ID required"));
    };
    let (is_liked, likes_count) = state.store.toggle_post_like(post_id, user_id)?;
    ok(LikeToggleBody {
        is_liked,
        likes_count,
    })
}

/// `POST /api/share_post`
pub async fn share_post(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SharePostRequest>,
) -> ApiResult<ShareBody> {
    let (Some(post_id), Some(user_id)) = (id(req.post_id), id(req.user_id)) else {
        return Err(bad_request("Post ID and User ID required"));
    };
    let shares_count = state
        .store
        .share_post(post_id, user_id, id(req.shared_with_user_id))?;
    ok(ShareBody {
        message: "Post shared successfully".into(),
        shares_count,
    })
}

/// `POST /api/add_comment`
pub async fn add_comment(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AddCommentRequest>,
) -> ApiResult<CommentBody> {
    let (Some(post_id), Some(user_id), Some(content)) =
        (id(req.post_id), id(req.user_id), text(&req.content))
    else {
        return Err(bad_request("Post ID, User ID, and content required"));
    };
    let content = content.trim();
    if content.is_empty() {
        return Err(bad_request("Comment content cannot be empty"));
    }
    ensure_user(&state, user_id)?;

    let sealed = state.policy.seal(SensitiveField::CommentContent, content);
    let comment_id = state.store.insert_comment(post_id, user_id, &sealed)?;
    info!(comment_id, post_id, user_id, "comment added");

    let comment = state
        .store
        .comment_by_id(comment_id)?
        .ok_or_else(|| ApiError(ServiceError::Internal("created comment vanished".into())))?;
    ok(CommentBody {
        comment: state.policy.reveal(comment),
    })
}

/// `POST /api/get_comments`
pub async fn get_comments(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<PostIdRequest>,
) -> ApiResult<CommentsBody> {
    let post_id = id(req.post_id).ok_or_else(|| bad_request("Post ID required"))?;
    let comments = state.store.comments_for_post(post_id)?;
    ok(CommentsBody {
        comments: state.policy.reveal_all(comments),
    })
}
