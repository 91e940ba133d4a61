use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use plaza_db::models::CommentChanges;
use plaza_types::api::{
    Claims, CommentEnvelope, CommentsPage, CreateCommentRequest, MessageResponse, PageQuery,
    UpdateCommentRequest,
};
use plaza_types::pagination::{COMMENTS_PER_PAGE, Pagination};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::{run_db, validation};

pub async fn create_comment(
    State(state): State<AppState>,
    PathParam(post_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::content(&req.content, validation::COMMENT_MAX_CHARS)?;

    let comment = run_db(&state, move |db| db.add_comment(claims.sub, post_id, &req.content)).await?;
    Ok((StatusCode::CREATED, Json(CommentEnvelope { comment })))
}

/// Oldest comment first.
pub async fn list_comments(
    State(state): State<AppState>,
    PathParam(post_id): PathParam<i64>,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = Pagination::new(query.page, query.per_page, COMMENTS_PER_PAGE);
    let comments = run_db(&state, move |db| db.list_comments(post_id, page)).await?;
    Ok(Json(CommentsPage::from(comments)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    PathParam(comment_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<UpdateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(content) = &req.content {
        validation::content(content, validation::COMMENT_MAX_CHARS)?;
    }

    let changes = CommentChanges {
        content: req.content,
    };
    let comment =
        run_db(&state, move |db| db.update_comment(claims.sub, comment_id, &changes)).await?;
    Ok(Json(CommentEnvelope { comment }))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    PathParam(comment_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(&state, move |db| db.delete_comment(claims.sub, comment_id)).await?;
    Ok(Json(MessageResponse {
        message: "Comment deleted successfully".into(),
    }))
}
