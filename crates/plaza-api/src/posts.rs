use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use plaza_db::models::PostChanges;
use plaza_types::api::{
    Claims, CreatePostRequest, LikeAction, LikeResponse, MessageResponse, PageQuery, PostEnvelope,
    PostsPage, UpdatePostRequest,
};
use plaza_types::pagination::{FEED_PER_PAGE, Pagination};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::{run_db, validation};

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::content(&req.content, validation::POST_MAX_CHARS)?;
    validation::optional_text("Image URL", req.image_url.as_deref(), validation::URL_MAX_CHARS)?;

    let post = run_db(&state, move |db| {
        db.create_post(claims.sub, &req.content, req.image_url.as_deref())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(PostEnvelope { post })))
}

/// GET /posts: the caller's feed: own posts plus posts from followed users.
pub async fn get_feed(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let page = Pagination::new(query.page, query.per_page, FEED_PER_PAGE);
    let feed = run_db(&state, move |db| db.compose_feed(claims.sub, page)).await?;
    Ok(Json(PostsPage::from(feed)))
}

pub async fn get_post(
    State(state): State<AppState>,
    PathParam(post_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let post = run_db(&state, move |db| db.get_post(post_id, claims.sub)).await?;
    Ok(Json(PostEnvelope { post }))
}

pub async fn update_post(
    State(state): State<AppState>,
    PathParam(post_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(content) = &req.content {
        validation::content(content, validation::POST_MAX_CHARS)?;
    }
    validation::optional_text("Image URL", req.image_url.as_deref(), validation::URL_MAX_CHARS)?;

    let changes = PostChanges {
        content: req.content,
        image_url: req.image_url,
    };
    let post = run_db(&state, move |db| db.update_post(claims.sub, post_id, &changes)).await?;
    Ok(Json(PostEnvelope { post }))
}

pub async fn delete_post(
    State(state): State<AppState>,
    PathParam(post_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(&state, move |db| db.delete_post(claims.sub, post_id)).await?;
    Ok(Json(MessageResponse {
        message: "Post deleted successfully".into(),
    }))
}

/// POST /posts/{post_id}/like: toggles the caller's like.
pub async fn like_post(
    State(state): State<AppState>,
    PathParam(post_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = run_db(&state, move |db| db.toggle_like(claims.sub, post_id)).await?;

    Ok(Json(LikeResponse {
        action: if outcome.liked {
            LikeAction::Liked
        } else {
            LikeAction::Unliked
        },
        liked: outcome.liked,
        likes_count: outcome.likes_count,
    }))
}
