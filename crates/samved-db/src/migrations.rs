use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, generations, ratings)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- AUTOINCREMENT keeps ids monotonic and never reused
            CREATE TABLE generations (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id    TEXT REFERENCES users(id),
                topic       TEXT NOT NULL,
                language    TEXT NOT NULL,
                count       INTEGER NOT NULL CHECK (count > 0),
                text        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_generations_owner
                ON generations(owner_id, id);

            CREATE TABLE ratings (
                generation_id   INTEGER NOT NULL REFERENCES generations(id),
                rater_id        TEXT NOT NULL REFERENCES users(id),
                value           TEXT NOT NULL CHECK (value IN ('like', 'dislike')),
                created_at      TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(generation_id, rater_id)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }
}
