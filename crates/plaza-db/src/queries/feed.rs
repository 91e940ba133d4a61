use rusqlite::named_params;

use plaza_types::models::Post;
use plaza_types::pagination::{Page, Pagination};

use super::{POST_SELECT, count, post_from_row};
use crate::{Database, Result};

/// Visible set for `:actor`: own posts plus posts by anyone the actor follows
/// right now. Joined live against `follows`, never against a snapshot.
const FEED_FILTER: &str = "
    WHERE p.user_id = :actor
       OR p.user_id IN (SELECT followed_id FROM follows WHERE follower_id = :actor)";

impl Database {
    // -- Feed --

    /// Newest first, ties broken by post id descending.
    pub fn compose_feed(&self, actor: i64, page: Pagination) -> Result<Page<Post>> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let total = count(
                &tx,
                &format!("SELECT COUNT(*) FROM posts p {FEED_FILTER}"),
                named_params! { ":actor": actor },
            )?;

            let sql = format!(
                "{POST_SELECT}
                 {FEED_FILTER}
                 ORDER BY p.created_at DESC, p.id DESC
                 LIMIT :limit OFFSET :offset"
            );
            let mut stmt = tx.prepare(&sql)?;
            let items = stmt
                .query_map(
                    named_params! {
                        ":viewer": actor,
                        ":actor": actor,
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
