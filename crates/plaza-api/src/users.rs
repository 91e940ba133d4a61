use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use tracing::info;

use plaza_db::models::UserChanges;
use plaza_types::api::{
    Claims, MessageResponse, PageQuery, PostsPage, SearchQuery, UpdateUserRequest,
    UserDetailEnvelope, UserEnvelope, UsersEnvelope,
};
use plaza_types::pagination::{Pagination, USER_POSTS_PER_PAGE};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::{run_db, validation};

/// GET /users?q=. At most 20 matches; an empty query gives an empty list.
pub async fn search_users(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = run_db(&state, move |db| db.search_users(&query.q)).await?;
    Ok(Json(UsersEnvelope { users }))
}

pub async fn get_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user = run_db(&state, move |db| db.get_user_detail(user_id, claims.sub)).await?;
    Ok(Json(UserDetailEnvelope { user }))
}

pub async fn update_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(username) = &req.username {
        validation::username(username)?;
    }
    if let Some(email) = &req.email {
        validation::email(email)?;
    }
    validation::optional_text("Bio", req.bio.as_deref(), validation::BIO_MAX_CHARS)?;
    validation::optional_text(
        "Profile picture",
        req.profile_picture.as_deref(),
        validation::URL_MAX_CHARS,
    )?;

    let changes = UserChanges {
        username: req.username,
        email: req.email,
        bio: req.bio,
        profile_picture: req.profile_picture,
    };
    let user = run_db(&state, move |db| db.update_user(claims.sub, user_id, &changes)).await?;
    Ok(Json(UserEnvelope { user }))
}

pub async fn delete_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    run_db(&state, move |db| db.delete_user(claims.sub, user_id)).await?;
    info!(user_id, "Account deleted");
    Ok(Json(MessageResponse {
        message: "User deleted successfully".into(),
    }))
}

pub async fn get_user_posts(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
    QueryParams(query): QueryParams<PageQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let page = Pagination::new(query.page, query.per_page, USER_POSTS_PER_PAGE);
    let posts = run_db(&state, move |db| db.list_user_posts(user_id, claims.sub, page)).await?;
    Ok(Json(PostsPage::from(posts)))
}
