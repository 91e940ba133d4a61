use rusqlite::{Connection, params};
use tracing::debug;

use plaza_types::models::FollowEntry;
use plaza_types::pagination::{Page, Pagination};

use super::{PROFILE_COLUMNS, PROFILE_WIDTH, count, profile_from_row, timestamp, user_exists};
use crate::{Database, DbError, Result};

/// Which side of a user's follow edges to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// Users following the anchor user.
    Followers,
    /// Users the anchor user follows.
    Following,
}

impl EdgeDirection {
    /// (column matching the anchor user, column naming the peer)
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            EdgeDirection::Followers => ("followed_id", "follower_id"),
            EdgeDirection::Following => ("follower_id", "followed_id"),
        }
    }
}

impl Database {
    // -- Social graph --

    /// Toggle the edge `actor -> target`. Returns `true` if the actor now
    /// follows the target.
    ///
    /// The delete-else-insert runs in one IMMEDIATE transaction keyed on the
    /// unique (follower, followed) pair, so two concurrent toggles by the same
    /// actor serialize and the pair can never be duplicated.
    pub fn toggle_follow(&self, actor: i64, target: i64) -> Result<bool> {
        if actor == target {
            return Err(DbError::InvalidOperation("cannot follow yourself"));
        }

        self.with_tx(|tx| {
            if !user_exists(tx, target)? {
                return Err(DbError::NotFound("user"));
            }

            let removed = tx.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                params![actor, target],
            )?;

            let following = if removed > 0 {
                false
            } else {
                tx.execute(
                    "INSERT INTO follows (follower_id, followed_id, created_at) VALUES (?1, ?2, ?3)",
                    params![actor, target, super::now()],
                )?;
                true
            };

            debug!(actor, target, following, "Follow toggled");
            Ok(following)
        })
    }

    pub fn is_following(&self, actor: i64, target: i64) -> Result<bool> {
        self.with_conn(|conn| edge_exists(conn, actor, target))
    }

    pub fn follower_count(&self, user: i64) -> Result<i64> {
        self.with_conn(|conn| {
            count(conn, "SELECT COUNT(*) FROM follows WHERE followed_id = ?1", [user])
        })
    }

    pub fn following_count(&self, user: i64) -> Result<i64> {
        self.with_conn(|conn| {
            count(conn, "SELECT COUNT(*) FROM follows WHERE follower_id = ?1", [user])
        })
    }

    pub fn list_followers(&self, user: i64, page: Pagination) -> Result<Page<FollowEntry>> {
        self.list_edges(user, EdgeDirection::Followers, page)
    }

    pub fn list_following(&self, user: i64, page: Pagination) -> Result<Page<FollowEntry>> {
        self.list_edges(user, EdgeDirection::Following, page)
    }

    /// Edges newest first, each resolved to the peer's profile.
    pub fn list_edges(
        &self,
        user: i64,
        direction: EdgeDirection,
        page: Pagination,
    ) -> Result<Page<FollowEntry>> {
        let (anchor, peer) = direction.columns();

        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            if !user_exists(&tx, user)? {
                return Err(DbError::NotFound("user"));
            }

            let total = count(
                &tx,
                &format!("SELECT COUNT(*) FROM follows WHERE {anchor} = ?1"),
                [user],
            )?;

            let sql = format!(
                "SELECT {PROFILE_COLUMNS}, f.created_at
                 FROM follows f
                 JOIN users u ON u.id = f.{peer}
                 WHERE f.{anchor} = ?1
                 ORDER BY f.created_at DESC, f.id DESC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = tx.prepare(&sql)?;
            let items = stmt
                .query_map(params![user, page.limit(), page.offset()], |row| {
                    Ok(FollowEntry {
                        user: profile_from_row(row, 0)?,
                        followed_at: timestamp(row, PROFILE_WIDTH)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Page::new(items, total, page))
        })
    }
}

/// Existence check served by the UNIQUE(follower_id, followed_id) index.
pub(crate) fn edge_exists(conn: &Connection, follower: i64, followed: i64) -> Result<bool> {
    let n = count(
        conn,
        "SELECT COUNT(*) FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
        params![follower, followed],
    )?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, post, user};
    use plaza_types::pagination::FOLLOWS_PER_PAGE;
    use std::sync::Arc;
    use std::thread;

    fn edge_rows(db: &Database, a: i64, b: i64) -> i64 {
        db.with_conn(|conn| {
            count(
                conn,
                "SELECT COUNT(*) FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
                params![a, b],
            )
        })
        .unwrap()
    }

    #[test]
    fn toggle_pairs_restore_initial_state() {
        let db = db();
        let a = user(&db, "alice");
        let b = user(&db, "bob");

        for n in 1..=6 {
            let following = db.toggle_follow(a, b).unwrap();
            assert_eq!(following, n % 2 == 1);
            assert_eq!(db.is_following(a, b).unwrap(), following);
            assert_eq!(edge_rows(&db, a, b), if n % 2 == 1 { 1 } else { 0 });
        }
        assert!(!db.is_following(a, b).unwrap());
    }

    #[test]
    fn edges_are_directed() {
        let db = db();
        let a = user(&db, "alice");
        let b = user(&db, "bob");

        db.toggle_follow(a, b).unwrap();
        assert!(db.is_following(a, b).unwrap());
        assert!(!db.is_following(b, a).unwrap());
        assert_eq!(db.follower_count(b).unwrap(), 1);
        assert_eq!(db.following_count(a).unwrap(), 1);
        assert_eq!(db.follower_count(a).unwrap(), 0);
    }

    #[test]
    fn self_follow_is_invalid_and_creates_nothing() {
        let db = db();
        let a = user(&db, "alice");

        let err = db.toggle_follow(a, a).unwrap_err();
        assert!(matches!(err, DbError::InvalidOperation(_)));
        assert_eq!(edge_rows(&db, a, a), 0);
        assert_eq!(db.following_count(a).unwrap(), 0);
    }

    #[test]
    fn unknown_target_is_not_found() {
        let db = db();
        let a = user(&db, "alice");

        let err = db.toggle_follow(a, 9_999).unwrap_err();
        assert!(matches!(err, DbError::NotFound("user")));
    }

    #[test]
    fn deleted_actor_is_reported_as_missing_user() {
        let db = db();
        let gone = user(&db, "gone");
        let b = user(&db, "bob");
        let p = post(&db, b, "still here");
        db.delete_user(gone, gone).unwrap();

        assert!(matches!(db.toggle_follow(gone, b), Err(DbError::NotFound("user"))));
        assert!(matches!(db.toggle_like(gone, p), Err(DbError::NotFound("user"))));
        assert!(matches!(db.add_comment(gone, p, "hi"), Err(DbError::NotFound("user"))));
        assert_eq!(db.follower_count(b).unwrap(), 0);
    }

    #[test]
    fn lists_are_newest_first_and_paginated() {
        let db = db();
        let target = user(&db, "target");
        let fans: Vec<i64> = (0..5).map(|i| user(&db, &format!("fan{i}"))).collect();
        for fan in &fans {
            db.toggle_follow(*fan, target).unwrap();
        }

        let page = db
            .list_followers(target, Pagination::new(Some(1), Some(2), FOLLOWS_PER_PAGE))
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
        let ids: Vec<i64> = page.items.iter().map(|e| e.user.id).collect();
        assert_eq!(ids, vec![fans[4], fans[3]]);

        let last = db
            .list_followers(target, Pagination::new(Some(3), Some(2), FOLLOWS_PER_PAGE))
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].user.id, fans[0]);

        let beyond = db
            .list_followers(target, Pagination::new(Some(10), Some(2), FOLLOWS_PER_PAGE))
            .unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 5);

        let following = db
            .list_following(fans[0], Pagination::new(None, None, FOLLOWS_PER_PAGE))
            .unwrap();
        assert_eq!(following.items.len(), 1);
        assert_eq!(following.items[0].user.id, target);
        assert_eq!(following.items[0].user.follower_count, 5);
    }

    #[test]
    fn concurrent_toggles_by_same_actor_never_duplicate() {
        let db = Arc::new(db());
        let a = user(&db, "alice");
        let b = user(&db, "bob");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = Arc::clone(&db);
                thread::spawn(move || db.toggle_follow(a, b).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Eight toggles is an even count: the edge must be gone, never doubled.
        assert_eq!(edge_rows(&db, a, b), 0);
    }
}
