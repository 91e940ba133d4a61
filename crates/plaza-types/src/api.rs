use serde::{Deserialize, Serialize};

use crate::models::{Comment, FollowEntry, Post, UserDetail, UserProfile};
use crate::pagination::{Page, PageMeta};

// -- JWT Claims --

/// JWT claims issued at login/registration and checked by the auth middleware.
/// Only the stable user id is carried; the username can change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserEnvelope<U = UserProfile> {
    pub user: U,
}

pub type UserDetailEnvelope = UserEnvelope<UserDetail>;

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersEnvelope {
    pub users: Vec<UserProfile>,
}

// -- Pagination --

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// -- Paginated lists --
// Each list travels under its own key, next to the flattened page counters.

#[derive(Debug, Serialize, Deserialize)]
pub struct PostsPage {
    pub posts: Vec<Post>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl From<Page<Post>> for PostsPage {
    fn from(page: Page<Post>) -> Self {
        let (posts, meta) = page.into_parts();
        Self { posts, meta }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowersPage {
    pub followers: Vec<FollowEntry>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl From<Page<FollowEntry>> for FollowersPage {
    fn from(page: Page<FollowEntry>) -> Self {
        let (followers, meta) = page.into_parts();
        Self { followers, meta }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowingPage {
    pub following: Vec<FollowEntry>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl From<Page<FollowEntry>> for FollowingPage {
    fn from(page: Page<FollowEntry>) -> Self {
        let (following, meta) = page.into_parts();
        Self { following, meta }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentsPage {
    pub comments: Vec<Comment>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl From<Page<Comment>> for CommentsPage {
    fn from(page: Page<Comment>) -> Self {
        let (comments, meta) = page.into_parts();
        Self { comments, meta }
    }
}

// -- Follows --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowAction {
    Followed,
    Unfollowed,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowResponse {
    pub action: FollowAction,
    pub following: bool,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub content: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostEnvelope {
    pub post: Post,
}

// -- Likes --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeAction {
    Liked,
    Unliked,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub action: LikeAction,
    pub liked: bool,
    pub likes_count: i64,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentEnvelope {
    pub comment: Comment,
}

// -- Generic --

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
