//! Database row types and write payloads. Read models shared with clients
//! live in `plaza_types::models`; these stay inside the storage layer.

/// Credential row, used only for login. Never serialized.
pub struct UserRow {
    pub id: i64,
    pub password_hash: String,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub bio: Option<&'a str>,
}

/// Partial profile update. `None` leaves a field untouched; an empty string
/// clears `bio` / `profile_picture`.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

/// Partial post update. An empty `image_url` removes the image.
#[derive(Debug, Default)]
pub struct PostChanges {
    pub content: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default)]
pub struct CommentChanges {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes_count: i64,
}
