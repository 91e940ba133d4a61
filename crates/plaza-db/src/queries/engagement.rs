use rusqlite::params;
use tracing::debug;

use plaza_types::models::Comment;
use plaza_types::pagination::{Page, Pagination};

use super::{
    Authored, COMMENT_SELECT, comment_from_row, count, ensure_author, now, post_exists,
    query_comment, require_content,
};
use crate::models::{CommentChanges, LikeOutcome};
use crate::{Database, DbError, Result};

impl Database {
    // -- Likes --

    /// Toggle `actor`'s like on a post and return the new state with the
    /// like count read inside the same transaction.
    pub fn toggle_like(&self, actor: i64, post_id: i64) -> Result<LikeOutcome> {
        self.with_tx(|tx| {
            if !post_exists(tx, post_id)? {
                return Err(DbError::NotFound("post"));
            }

            let removed = tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
                params![actor, post_id],
            )?;

            let liked = if removed > 0 {
                false
            } else {
                tx.execute(
                    "INSERT INTO likes (user_id, post_id, created_at) VALUES (?1, ?2, ?3)",
                    params![actor, post_id, now()],
                )?;
                true
            };

            let likes_count = count(tx, "SELECT COUNT(*) FROM likes WHERE post_id = ?1", [post_id])?;

            debug!(actor, post_id, liked, likes_count, "Like toggled");
            Ok(LikeOutcome { liked, likes_count })
        })
    }

    pub fn like_count(&self, post_id: i64) -> Result<i64> {
        self.with_conn(|conn| count(conn, "SELECT COUNT(*) FROM likes WHERE post_id = ?1", [post_id]))
    }

    // -- Comments --

    pub fn add_comment(&self, actor: i64, post_id: i64, content: &str) -> Result<Comment> {
        require_content(content)?;

        let comment = self.with_tx(|tx| {
            if !post_exists(tx, post_id)? {
                return Err(DbError::NotFound("post"));
            }

            let ts = now();
            tx.execute(
                "INSERT INTO comments (post_id, user_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![post_id, actor, content, ts],
            )?;

            query_comment(tx, tx.last_insert_rowid())?.ok_or(DbError::NotFound("comment"))
        })?;

        debug!(comment_id = comment.id, post_id, actor, "Comment added");
        Ok(comment)
    }

    pub fn get_comment(&self, id: i64) -> Result<Comment> {
        self.with_conn(|conn| query_comment(conn, id)?.ok_or(DbError::NotFound("comment")))
    }

    /// Oldest first.
    pub fn list_comments(&self, post_id: i64, page: Pagination) -> Result<Page<Comment>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            if !post_exists(&tx, post_id)? {
                return Err(DbError::NotFound("post"));
            }

            let total = count(&tx, "SELECT COUNT(*) FROM comments WHERE post_id = ?1", [post_id])?;

            let sql = format!(
                "{COMMENT_SELECT}
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at ASC, c.id ASC
                 LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = tx.prepare(&sql)?;
            let items = stmt
                .query_map(params![post_id, page.limit(), page.offset()], comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Page::new(items, total, page))
        })
    }

    pub fn update_comment(&self, actor: i64, id: i64, changes: &CommentChanges) -> Result<Comment> {
        if let Some(content) = &changes.content {
            require_content(content)?;
        }

        self.with_tx(|tx| {
            ensure_author(tx, Authored::Comment, id, actor)?;

            tx.execute(
                "UPDATE comments SET content = COALESCE(?2, content), updated_at = ?3 WHERE id = ?1",
                params![id, changes.content, now()],
            )?;

            query_comment(tx, id)?.ok_or(DbError::NotFound("comment"))
        })
    }

    pub fn delete_comment(&self, actor: i64, id: i64) -> Result<()> {
        self.with_tx(|tx| {
            ensure_author(tx, Authored::Comment, id, actor)?;
            tx.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            debug!(comment_id = id, actor, "Comment deleted");
            Ok(())
        })
    }
}
