use std::collections::{HashMap, HashSet};

use crate::Database;
use crate::models::{GenerationRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;
use samved_types::models::{RatingCounts, RatingValue, VoteOutcome};

const GENERATION_COLUMNS: &str =
    "g.id, g.owner_id, u.username, g.topic, g.language, g.count, g.text, g.created_at";

impl Database {
    // -- Users --

    /// Inserts a user. Returns `false` without touching the table when the
    /// username is already taken.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)
                 ON CONFLICT(username) DO NOTHING",
                (id, username, password_hash),
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    // -- History --

    /// Appends a generation record and returns its id.
    pub fn create_generation(
        &self,
        owner_id: Option<&str>,
        topic: &str,
        language: &str,
        count: u32,
        text: &str,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO generations (owner_id, topic, language, count, text) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![owner_id, topic, language, count, text],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_generation(&self, id: i64) -> Result<Option<GenerationRow>> {
        self.with_conn(|conn| query_generation(conn, id))
    }

    /// Records created by `owner_id`, newest first.
    pub fn list_generations_by_owner(&self, owner_id: &str, limit: u32) -> Result<Vec<GenerationRow>> {
        self.with_conn(|conn| query_generations(conn, Some(owner_id), limit))
    }

    /// Every record, newest first.
    pub fn list_all_generations(&self, limit: u32) -> Result<Vec<GenerationRow>> {
        self.with_conn(|conn| query_generations(conn, None, limit))
    }

    // -- Ratings --

    pub fn has_voted(&self, generation_id: i64, rater_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let voted = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM ratings WHERE generation_id = ?1 AND rater_id = ?2)",
                rusqlite::params![generation_id, rater_id],
                |row| row.get(0),
            )?;
            Ok(voted)
        })
    }

    /// Stores a rating unless this rater already rated the record.
    ///
    /// The uniqueness check and the insert are a single statement, so two
    /// racing first votes from the same rater store exactly one row. An
    /// existing rating is never overwritten.
    pub fn vote(&self, generation_id: i64, rater_id: &str, value: RatingValue) -> Result<VoteOutcome> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO ratings (generation_id, rater_id, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(generation_id, rater_id) DO NOTHING",
                rusqlite::params![generation_id, rater_id, value.as_str()],
            )?;

            if inserted == 1 {
                Ok(VoteOutcome::Recorded)
            } else {
                Ok(VoteOutcome::AlreadyVoted)
            }
        })
    }

    /// Aggregate (likes, dislikes). A record with no ratings, or no record at
    /// all, yields zeros.
    pub fn rating_counts(&self, generation_id: i64) -> Result<RatingCounts> {
        self.with_conn(|conn| query_counts(conn, generation_id))
    }

    /// Batch-fetch rating counts for a set of generation ids. Ids without
    /// ratings are absent from the map.
    pub fn rating_counts_for_generations(&self, generation_ids: &[i64]) -> Result<HashMap<i64, RatingCounts>> {
        if generation_ids.is_empty() {
            return Ok(HashMap::new());
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT generation_id,
                        SUM(CASE WHEN value = 'like' THEN 1 ELSE 0 END),
                        SUM(CASE WHEN value = 'dislike' THEN 1 ELSE 0 END)
                 FROM ratings
                 WHERE generation_id IN ({})
                 GROUP BY generation_id",
                placeholders(generation_ids.len())
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(generation_ids), |row| {
                    let likes: i64 = row.get(1)?;
                    let dislikes: i64 = row.get(2)?;
                    Ok((
                        row.get::<_, i64>(0)?,
                        RatingCounts {
                            likes: likes as u64,
                            dislikes: dislikes as u64,
                        },
                    ))
                })?
                .collect::<std::result::Result<HashMap<_, _>, _>>()?;

            Ok(rows)
        })
    }

    /// The subset of `generation_ids` that `rater_id` has already rated.
    pub fn voted_generations(&self, generation_ids: &[i64], rater_id: &str) -> Result<HashSet<i64>> {
        if generation_ids.is_empty() {
            return Ok(HashSet::new());
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT generation_id FROM ratings
                 WHERE rater_id = ?1 AND generation_id IN ({})",
                placeholders_from(2, generation_ids.len())
            );

            let mut params: Vec<&dyn rusqlite::types::ToSql> = vec![&rater_id as &dyn rusqlite::types::ToSql];
            params.extend(generation_ids.iter().map(|id| id as &dyn rusqlite::types::ToSql));

            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map(params.as_slice(), |row| row.get::<_, i64>(0))?
                .collect::<std::result::Result<HashSet<_>, _>>()?;

            Ok(ids)
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn map_generation(row: &rusqlite::Row<'_>) -> rusqlite::Result<GenerationRow> {
    Ok(GenerationRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        owner_username: row.get(2)?,
        topic: row.get(3)?,
        language: row.get(4)?,
        count: row.get(5)?,
        text: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn query_generation(conn: &Connection, id: i64) -> Result<Option<GenerationRow>> {
    let sql = format!(
        "SELECT {GENERATION_COLUMNS}
         FROM generations g
         LEFT JOIN users u ON g.owner_id = u.id
         WHERE g.id = ?1"
    );
    let row = conn.query_row(&sql, [id], map_generation).optional()?;
    Ok(row)
}

fn query_generations(conn: &Connection, owner_id: Option<&str>, limit: u32) -> Result<Vec<GenerationRow>> {
    // Ids are monotonic, so id order is creation order even within one second
    let rows = match owner_id {
        Some(owner_id) => {
            let sql = format!(
                "SELECT {GENERATION_COLUMNS}
                 FROM generations g
                 LEFT JOIN users u ON g.owner_id = u.id
                 WHERE g.owner_id = ?1
                 ORDER BY g.id DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(rusqlite::params![owner_id, limit], map_generation)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        None => {
            let sql = format!(
                "SELECT {GENERATION_COLUMNS}
                 FROM generations g
                 LEFT JOIN users u ON g.owner_id = u.id
                 ORDER BY g.id DESC
                 LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map([limit], map_generation)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok(rows)
}

fn query_counts(conn: &Connection, generation_id: i64) -> Result<RatingCounts> {
    let (likes, dislikes): (i64, i64) = conn.query_row(
        "SELECT
             COALESCE(SUM(CASE WHEN value = 'like' THEN 1 ELSE 0 END), 0),
             COALESCE(SUM(CASE WHEN value = 'dislike' THEN 1 ELSE 0 END), 0)
         FROM ratings WHERE generation_id = ?1",
        [generation_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(RatingCounts {
        likes: likes as u64,
        dislikes: dislikes as u64,
    })
}

fn placeholders(n: usize) -> String {
    placeholders_from(1, n)
}

fn placeholders_from(start: usize, n: usize) -> String {
    (start..start + n)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
