use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use plaza_types::models::{UserDetail, UserProfile};

use super::{PROFILE_COLUMNS, follows::edge_exists, non_empty, now, profile_from_row, query_profile};
use crate::models::{NewUser, UserChanges, UserRow};
use crate::{Database, DbError, Result};

/// Upper bound on search results; search is not paginated.
pub const SEARCH_LIMIT: i64 = 20;

impl Database {
    // -- Identity --

    pub fn create_user(&self, new: &NewUser<'_>) -> Result<UserProfile> {
        let profile = self.with_tx(|tx| {
            ensure_unique(tx, UniqueField::Username, new.username, None)?;
            ensure_unique(tx, UniqueField::Email, new.email, None)?;

            let ts = now();
            tx.execute(
                "INSERT INTO users (username, email, password_hash, bio, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![new.username, new.email, new.password_hash, new.bio, ts],
            )?;

            query_profile(tx, tx.last_insert_rowid())?.ok_or(DbError::NotFound("user"))
        })?;

        info!(user_id = profile.id, username = %profile.username, "User registered");
        Ok(profile)
    }

    pub fn get_credentials(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, password_hash FROM users WHERE username = ?1",
                    [username],
                    |row| {
                        Ok(UserRow {
                            id: row.get(0)?,
                            password_hash: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<UserProfile> {
        self.with_conn(|conn| query_profile(conn, id)?.ok_or(DbError::NotFound("user")))
    }

    /// Profile annotated for `viewer`: whether the viewer follows the user and
    /// whether it is the viewer's own profile.
    pub fn get_user_detail(&self, id: i64, viewer: i64) -> Result<UserDetail> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let profile = query_profile(&tx, id)?.ok_or(DbError::NotFound("user"))?;
            let is_self = id == viewer;
            let is_following = !is_self && edge_exists(&tx, viewer, id)?;
            Ok(UserDetail {
                profile,
                is_following,
                is_self,
            })
        })
    }

    pub fn update_user(&self, actor: i64, id: i64, changes: &UserChanges) -> Result<UserProfile> {
        if actor != id {
            return Err(DbError::Forbidden("cannot modify another user's profile"));
        }

        if changes.username.as_deref().is_some_and(str::is_empty) {
            return Err(DbError::Validation("Username cannot be empty".into()));
        }
        if changes.email.as_deref().is_some_and(str::is_empty) {
            return Err(DbError::Validation("Email cannot be empty".into()));
        }

        self.with_tx(|tx| {
            if query_profile(tx, id)?.is_none() {
                return Err(DbError::NotFound("user"));
            }
            if let Some(username) = &changes.username {
                ensure_unique(tx, UniqueField::Username, username, Some(id))?;
            }
            if let Some(email) = &changes.email {
                ensure_unique(tx, UniqueField::Email, email, Some(id))?;
            }

            tx.execute(
                "UPDATE users SET
                    username = COALESCE(?2, username),
                    email = COALESCE(?3, email),
                    bio = CASE WHEN ?4 THEN ?5 ELSE bio END,
                    profile_picture = CASE WHEN ?6 THEN ?7 ELSE profile_picture END,
                    updated_at = ?8
                 WHERE id = ?1",
                params![
                    id,
                    changes.username,
                    changes.email,
                    changes.bio.is_some(),
                    non_empty(changes.bio.as_deref()),
                    changes.profile_picture.is_some(),
                    non_empty(changes.profile_picture.as_deref()),
                    now(),
                ],
            )?;

            debug!(user_id = id, "Profile updated");
            query_profile(tx, id)?.ok_or(DbError::NotFound("user"))
        })
    }

    /// Delete an account and everything it owns: its posts (with their likes
    /// and comments), its own likes and comments elsewhere, and every follow
    /// edge touching it.
    pub fn delete_user(&self, actor: i64, id: i64) -> Result<()> {
        if actor != id {
            return Err(DbError::Forbidden("cannot delete another user's account"));
        }

        self.with_tx(|tx| {
            if query_profile(tx, id)?.is_none() {
                return Err(DbError::NotFound("user"));
            }

            let likes = tx.execute(
                "DELETE FROM likes
                 WHERE user_id = ?1 OR post_id IN (SELECT id FROM posts WHERE user_id = ?1)",
                [id],
            )?;
            let comments = tx.execute(
                "DELETE FROM comments
                 WHERE user_id = ?1 OR post_id IN (SELECT id FROM posts WHERE user_id = ?1)",
                [id],
            )?;
            let follows = tx.execute(
                "DELETE FROM follows WHERE follower_id = ?1 OR followed_id = ?1",
                [id],
            )?;
            let posts = tx.execute("DELETE FROM posts WHERE user_id = ?1", [id])?;
            tx.execute("DELETE FROM users WHERE id = ?1", [id])?;

            info!(
                user_id = id,
                posts, likes, comments, follows, "User deleted with dependents"
            );
            Ok(())
        })
    }

    /// Case-insensitive substring match on username or email. An empty query
    /// matches nothing.
    pub fn search_users(&self, query: &str) -> Result<Vec<UserProfile>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let pattern = format!("%{}%", escape_like(query));
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PROFILE_COLUMNS} FROM users u
                 WHERE u.username LIKE ?1 ESCAPE '\\' OR u.email LIKE ?1 ESCAPE '\\'
                 ORDER BY u.username COLLATE NOCASE, u.id
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let users = stmt
                .query_map(params![pattern, SEARCH_LIMIT], |row| profile_from_row(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(users)
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum UniqueField {
    Username,
    Email,
}

/// Pre-empt the unique index with a readable validation error. A racing
/// insert that slips past this still fails on the index as `Conflict`.
fn ensure_unique(
    conn: &Connection,
    field: UniqueField,
    value: &str,
    except: Option<i64>,
) -> Result<()> {
    let (sql, message) = match field {
        UniqueField::Username => (
            "SELECT COUNT(*) FROM users WHERE username = ?1 AND id IS NOT ?2",
            "Username already exists",
        ),
        UniqueField::Email => (
            "SELECT COUNT(*) FROM users WHERE email = ?1 AND id IS NOT ?2",
            "Email already exists",
        ),
    };

    let taken: i64 = conn.query_row(sql, params![value, except], |row| row.get(0))?;
    if taken > 0 {
        return Err(DbError::Validation(message.into()));
    }
    Ok(())
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
