use axum::{Extension, Json, extract::State, response::IntoResponse};

use plaza_db::queries::EdgeDirection;
use plaza_types::api::{
    Claims, FollowAction, FollowResponse, FollowersPage, FollowingPage, PageQuery,
};
use plaza_types::models::FollowEntry;
use plaza_types::pagination::{FOLLOWS_PER_PAGE, Page, Pagination};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{PathParam, QueryParams};
use crate::run_db;

/// POST /follow/user/{user_id}: follow if not following, unfollow otherwise.
pub async fn toggle_follow(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let following = run_db(&state, move |db| db.toggle_follow(claims.sub, user_id)).await?;

    Ok(Json(FollowResponse {
        action: if following {
            FollowAction::Followed
        } else {
            FollowAction::Unfollowed
        },
        following,
    }))
}

pub async fn list_followers(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = list_edges(&state, user_id, query, EdgeDirection::Followers).await?;
    Ok(Json(FollowersPage::from(page)))
}

pub async fn list_following(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i64>,
    QueryParams(query): QueryParams<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = list_edges(&state, user_id, query, EdgeDirection::Following).await?;
    Ok(Json(FollowingPage::from(page)))
}

async fn list_edges(
    state: &AppState,
    user_id: i64,
    query: PageQuery,
    direction: EdgeDirection,
) -> Result<Page<FollowEntry>, ApiError> {
    let page = Pagination::new(query.page, query.per_page, FOLLOWS_PER_PAGE);
    run_db(state, move |db| db.list_edges(user_id, direction, page)).await
}
