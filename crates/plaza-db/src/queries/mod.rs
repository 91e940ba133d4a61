//! Store operations, grouped by component. Every public method on
//! `Database` is one logical operation: mutations run in a single
//! transaction via `Database::with_tx`, paginated reads run their count and
//! page queries inside one read transaction so `total` matches `items`.

mod engagement;
mod feed;
mod follows;
mod posts;
mod users;

pub use follows::EdgeDirection;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Params, Row};

use plaza_types::models::{Comment, Post, UserProfile};

use crate::{DbError, Result};

/// Profile columns for a `users u` alias, with live counts. Ten columns.
pub(crate) const PROFILE_COLUMNS: &str = "
    u.id, u.username, u.email, u.bio, u.profile_picture, u.created_at, u.updated_at,
    (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.id),
    (SELECT COUNT(*) FROM follows f WHERE f.followed_id = u.id),
    (SELECT COUNT(*) FROM follows f WHERE f.follower_id = u.id)";

pub(crate) const PROFILE_WIDTH: usize = 10;

/// Post projection with author fields, live counts and the `:viewer` like flag.
pub(crate) const POST_SELECT: &str = "
    SELECT p.id, p.content, p.image_url, p.user_id, u.username, u.profile_picture,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id),
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id),
           EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = :viewer),
           p.created_at, p.updated_at
    FROM posts p
    JOIN users u ON u.id = p.user_id";

pub(crate) const COMMENT_SELECT: &str = "
    SELECT c.id, c.post_id, c.user_id, u.username, u.profile_picture,
           c.content, c.created_at, c.updated_at
    FROM comments c
    JOIN users u ON u.id = c.user_id";

/// Timestamps are stored as fixed-width RFC 3339 text so that lexical order
/// matches chronological order.
pub(crate) fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn profile_from_row(row: &Row<'_>, base: usize) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(base)?,
        username: row.get(base + 1)?,
        email: row.get(base + 2)?,
        bio: row.get(base + 3)?,
        profile_picture: row.get(base + 4)?,
        created_at: timestamp(row, base + 5)?,
        updated_at: timestamp(row, base + 6)?,
        post_count: row.get(base + 7)?,
        follower_count: row.get(base + 8)?,
        following_count: row.get(base + 9)?,
    })
}

pub(crate) fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        content: row.get(1)?,
        image_url: row.get(2)?,
        user_id: row.get(3)?,
        username: row.get(4)?,
        profile_picture: row.get(5)?,
        likes_count: row.get(6)?,
        comments_count: row.get(7)?,
        is_liked: row.get(8)?,
        created_at: timestamp(row, 9)?,
        updated_at: timestamp(row, 10)?,
    })
}

pub(crate) fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        username: row.get(3)?,
        profile_picture: row.get(4)?,
        content: row.get(5)?,
        created_at: timestamp(row, 6)?,
        updated_at: timestamp(row, 7)?,
    })
}

pub(crate) fn query_profile(conn: &Connection, id: i64) -> Result<Option<UserProfile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM users u WHERE u.id = ?1");
    let profile = conn
        .query_row(&sql, [id], |row| profile_from_row(row, 0))
        .optional()?;
    Ok(profile)
}

pub(crate) fn query_post(conn: &Connection, id: i64, viewer: i64) -> Result<Option<Post>> {
    let sql = format!("{POST_SELECT} WHERE p.id = :id");
    let post = conn
        .query_row(
            &sql,
            rusqlite::named_params! { ":viewer": viewer, ":id": id },
            post_from_row,
        )
        .optional()?;
    Ok(post)
}

pub(crate) fn query_comment(conn: &Connection, id: i64) -> Result<Option<Comment>> {
    let sql = format!("{COMMENT_SELECT} WHERE c.id = ?1");
    let comment = conn.query_row(&sql, [id], comment_from_row).optional()?;
    Ok(comment)
}

pub(crate) fn count<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<i64> {
    Ok(conn.query_row(sql, params, |row| row.get(0))?)
}

pub(crate) fn user_exists(conn: &Connection, id: i64) -> Result<bool> {
    Ok(count(conn, "SELECT COUNT(*) FROM users WHERE id = ?1", [id])? > 0)
}

pub(crate) fn post_exists(conn: &Connection, id: i64) -> Result<bool> {
    Ok(count(conn, "SELECT COUNT(*) FROM posts WHERE id = ?1", [id])? > 0)
}

/// Resolve the author of a post or comment and check it against `actor`.
/// `NotFound` wins over `Forbidden`.
pub(crate) fn ensure_author(
    conn: &Connection,
    table: Authored,
    id: i64,
    actor: i64,
) -> Result<()> {
    let sql = format!("SELECT user_id FROM {} WHERE id = ?1", table.table());
    let owner: Option<i64> = conn.query_row(&sql, [id], |row| row.get(0)).optional()?;

    match owner {
        None => Err(DbError::NotFound(table.noun())),
        Some(owner) if owner != actor => Err(DbError::Forbidden(table.forbidden())),
        Some(_) => Ok(()),
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Authored {
    Post,
    Comment,
}

impl Authored {
    fn table(self) -> &'static str {
        match self {
            Authored::Post => "posts",
            Authored::Comment => "comments",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            Authored::Post => "post",
            Authored::Comment => "comment",
        }
    }

    fn forbidden(self) -> &'static str {
        match self {
            Authored::Post => "only the author can modify this post",
            Authored::Comment => "only the author can modify this comment",
        }
    }
}

/// Content fields are re-checked here even though the HTTP layer validates them.
pub(crate) fn require_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(DbError::Validation("Content is required".into()));
    }
    Ok(())
}

/// `Some("")` clears an optional text column.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
