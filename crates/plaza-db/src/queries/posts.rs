use rusqlite::{named_params, params};
use tracing::{debug, info};

use plaza_types::models::Post;
use plaza_types::pagination::{Page, Pagination};

use super::{
    Authored, POST_SELECT, count, ensure_author, non_empty, now, post_from_row, query_post,
    require_content, user_exists,
};
use crate::models::PostChanges;
use crate::{Database, DbError, Result};

impl Database {
    // -- Content --

    pub fn create_post(&self, actor: i64, content: &str, image_url: Option<&str>) -> Result<Post> {
        require_content(content)?;

        let post = self.with_tx(|tx| {
            if !user_exists(tx, actor)? {
                return Err(DbError::NotFound("user"));
            }

            let ts = now();
            tx.execute(
                "INSERT INTO posts (user_id, content, image_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![actor, content, non_empty(image_url), ts],
            )?;

            query_post(tx, tx.last_insert_rowid(), actor)?.ok_or(DbError::NotFound("post"))
        })?;

        info!(post_id = post.id, author = actor, "Post created");
        Ok(post)
    }

    /// A single post with live counts, annotated for `viewer`.
    pub fn get_post(&self, id: i64, viewer: i64) -> Result<Post> {
        self.with_conn(|conn| query_post(conn, id, viewer)?.ok_or(DbError::NotFound("post")))
    }

    pub fn update_post(&self, actor: i64, id: i64, changes: &PostChanges) -> Result<Post> {
        if let Some(content) = &changes.content {
            require_content(content)?;
        }

        self.with_tx(|tx| {
            ensure_author(tx, Authored::Post, id, actor)?;

            tx.execute(
                "UPDATE posts SET
                    content = COALESCE(?2, content),
                    image_url = CASE WHEN ?3 THEN ?4 ELSE image_url END,
                    updated_at = ?5
                 WHERE id = ?1",
                params![
                    id,
                    changes.content,
                    changes.image_url.is_some(),
                    non_empty(changes.image_url.as_deref()),
                    now(),
                ],
            )?;

            debug!(post_id = id, "Post updated");
            query_post(tx, id, actor)?.ok_or(DbError::NotFound("post"))
        })
    }

    /// Delete a post together with its likes and comments.
    pub fn delete_post(&self, actor: i64, id: i64) -> Result<()> {
        self.with_tx(|tx| {
            ensure_author(tx, Authored::Post, id, actor)?;

            let likes = tx.execute("DELETE FROM likes WHERE post_id = ?1", [id])?;
            let comments = tx.execute("DELETE FROM comments WHERE post_id = ?1", [id])?;
            tx.execute("DELETE FROM posts WHERE id = ?1", [id])?;

            info!(post_id = id, likes, comments, "Post deleted");
            Ok(())
        })
    }

    /// Every post by `author`, newest first. `viewer` only affects `is_liked`.
    pub fn list_user_posts(&self, author: i64, viewer: i64, page: Pagination) -> Result<Page<Post>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            if !user_exists(&tx, author)? {
                return Err(DbError::NotFound("user"));
            }

            let total = count(&tx, "SELECT COUNT(*) FROM posts WHERE user_id = ?1", [author])?;

            let sql = format!(
                "{POST_SELECT}
                 WHERE p.user_id = :author
                 ORDER BY p.created_at DESC, p.id DESC
                 LIMIT :limit OFFSET :offset"
            );
            let mut stmt = tx.prepare(&sql)?;
            let items = stmt
                .query_map(
                    named_params! {
                        ":viewer": viewer,
                        ":author": author,
                        ":limit": page.limit(),
                        ":offset": page.offset(),
                    },
                    post_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(Page::new(items, total, page))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{db, post, user};
    use plaza_types::pagination::USER_POSTS_PER_PAGE;

    #[test]
    fn empty_content_is_rejected() {
        let db = db();
        let a = user(&db, "alice");

        assert!(matches!(db.create_post(a, "", None), Err(DbError::Validation(_))));
        assert!(matches!(db.create_post(a, "   \n", None), Err(DbError::Validation(_))));
        assert_eq!(db.get_user(a).unwrap().post_count, 0);
    }

    #[test]
    fn created_post_carries_author_and_zero_counts() {
        let db = db();
        let a = user(&db, "alice");

        let p = db.create_post(a, "hello", Some("https://img.example/1.png")).unwrap();
        assert_eq!(p.user_id, a);
        assert_eq!(p.username, "alice");
        assert_eq!(p.image_url.as_deref(), Some("https://img.example/1.png"));
        assert_eq!(p.likes_count, 0);
        assert_eq!(p.comments_count, 0);
        assert!(!p.is_liked);
    }

    #[test]
    fn update_merges_supplied_fields_only() {
        let db = db();
        let a = user(&db, "alice");
        let id = db.create_post(a, "draft", Some("pic.png")).unwrap().id;

        let p = db
            .update_post(
                a,
                id,
                &PostChanges {
                    content: Some("final".into()),
                    image_url: None,
                },
            )
            .unwrap();
        assert_eq!(p.content, "final");
        assert_eq!(p.image_url.as_deref(), Some("pic.png"));

        let p = db
            .update_post(
                a,
                id,
                &PostChanges {
                    content: None,
                    image_url: Some(String::new()),
                },
            )
            .unwrap();
        assert_eq!(p.content, "final");
        assert_eq!(p.image_url, None);
    }

    #[test]
    fn only_author_may_update_or_delete() {
        let db = db();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let id = post(&db, a, "mine");

        let changes = PostChanges {
            content: Some("hijacked".into()),
            ..Default::default()
        };
        assert!(matches!(db.update_post(b, id, &changes), Err(DbError::Forbidden(_))));
        assert!(matches!(db.delete_post(b, id), Err(DbError::Forbidden(_))));
        assert_eq!(db.get_post(id, b).unwrap().content, "mine");

        assert!(matches!(db.update_post(a, 4242, &changes), Err(DbError::NotFound("post"))));
        assert!(matches!(db.delete_post(a, 4242), Err(DbError::NotFound("post"))));
    }

    #[test]
    fn delete_cascades_to_likes_and_comments() {
        let db = db();
        let a = user(&db, "alice");
        let b = user(&db, "bob");
        let id = post(&db, a, "short lived");
        db.toggle_like(b, id).unwrap();
        let comment = db.add_comment(b, id, "first").unwrap().id;

        db.delete_post(a, id).unwrap();

        assert!(matches!(db.get_post(id, a), Err(DbError::NotFound(_))));
        assert!(matches!(db.get_comment(comment), Err(DbError::NotFound(_))));
        assert!(matches!(db.toggle_like(b, id), Err(DbError::NotFound(_))));
        let orphans = db
            .with_conn(|conn| {
                count(
                    conn,
                    "SELECT (SELECT COUNT(*) FROM likes) + (SELECT COUNT(*) FROM comments)",
                    [],
                )
            })
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn user_posts_ignore_follow_state() {
        let db = db();
        let a = user(&db, "alice");
        let stranger = user(&db, "stranger");
        for i in 0..3 {
            post(&db, a, &format!("post {i}"));
        }

        let page = db
            .list_user_posts(a, stranger, Pagination::new(None, None, USER_POSTS_PER_PAGE))
            .unwrap();
        assert_eq!(page.total, 3);
        let contents: Vec<&str> = page.items.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["post 2", "post 1", "post 0"]);

        assert!(matches!(
            db.list_user_posts(777, a, Pagination::new(None, None, USER_POSTS_PER_PAGE)),
            Err(DbError::NotFound("user"))
        ));
    }
}
