use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user as exposed to clients. Counts are computed from the live edge
/// tables at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

/// Profile as seen by a specific viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub is_following: bool,
    pub is_self: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub user_id: i64,
    pub username: String,
    pub profile_picture: Option<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    /// Whether the viewing user has liked this post.
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub profile_picture: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One side of a follow edge: the peer user plus when the edge was created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowEntry {
    pub user: UserProfile,
    pub followed_at: DateTime<Utc>,
}
