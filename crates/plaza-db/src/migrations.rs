use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// Ordered schema migrations. Index `i` upgrades the schema to version `i + 1`.
const MIGRATIONS: &[&str] = &[
    // v1: identity, content, social graph, engagement
    "
    CREATE TABLE users (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        username        TEXT NOT NULL UNIQUE,
        email           TEXT NOT NULL UNIQUE,
        password_hash   TEXT NOT NULL,
        bio             TEXT,
        profile_picture TEXT,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL
    );

    CREATE TABLE posts (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        content     TEXT NOT NULL,
        image_url   TEXT,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );

    CREATE INDEX idx_posts_user_created
        ON posts(user_id, created_at DESC, id DESC);

    CREATE INDEX idx_posts_created
        ON posts(created_at DESC, id DESC);

    CREATE TABLE follows (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        follower_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        followed_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at   TEXT NOT NULL,
        UNIQUE(follower_id, followed_id),
        CHECK(follower_id <> followed_id)
    );

    CREATE INDEX idx_follows_followed
        ON follows(followed_id, created_at DESC);

    CREATE TABLE likes (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        created_at  TEXT NOT NULL,
        UNIQUE(user_id, post_id)
    );

    CREATE INDEX idx_likes_post
        ON likes(post_id);

    CREATE TABLE comments (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id     INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        content     TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        updated_at  TEXT NOT NULL
    );

    CREATE INDEX idx_comments_post_created
        ON comments(post_id, created_at, id);

    CREATE INDEX idx_comments_user
        ON comments(user_id);
    ",
];

pub fn run(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let current: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let version = idx as i64 + 1;
        if version <= current {
            continue;
        }

        info!("Running migration v{}", version);
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();
        run(&mut conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i64);
    }

    #[test]
    fn self_follow_rejected_by_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        run(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES ('a', 'a@x.io', 'h', 't', 't')",
            [],
        )
        .unwrap();

        let res = conn.execute(
            "INSERT INTO follows (follower_id, followed_id, created_at) VALUES (1, 1, 't')",
            [],
        );
        assert!(res.is_err());
    }
}
