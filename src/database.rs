//! Database operations for the collection document store
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! Tables mirror the hosted document layout:
//! - `local_storage`: on-device key/value items
//! - `collections`: one record per user (`cards` JSON + `updated_at`)
//! - `users`: profiles keyed by user id, unique username
//! - `prices`: one JSON document per card plus the `_metadata` sentinel

use crate::profile::UserProfile;
use rusqlite::{params, Connection, OptionalExtension};

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        -- On-device storage (anonymous sessions)
        CREATE TABLE IF NOT EXISTS local_storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Per-user collection records
        CREATE TABLE IF NOT EXISTS collections (
            user_id TEXT PRIMARY KEY,
            cards TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- User profiles
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            display_name TEXT,
            photo_url TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_users_username ON users(username);

        -- Price documents (doc_id = card id, or the _metadata sentinel)
        CREATE TABLE IF NOT EXISTS prices (
            doc_id TEXT PRIMARY KEY,
            data TEXT NOT NULL
        );
        ",
    )?;

    log::debug!("Database schema initialized");
    Ok(())
}

// ── Local storage ──────────────────────────────────────────────────────────

pub fn get_local_item(conn: &Connection, key: &str) -> DbResult<Option<String>> {
    conn.query_row(
        "SELECT value FROM local_storage WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_local_item(conn: &Connection, key: &str, value: &str) -> DbResult<()> {
    conn.execute(
        "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

// ── Collections ────────────────────────────────────────────────────────────

/// Raw collection row: (cards JSON, updated_at)
pub fn get_collection_row(conn: &Connection, user_id: &str) -> DbResult<Option<(String, String)>> {
    conn.query_row(
        "SELECT cards, updated_at FROM collections WHERE user_id = ?1",
        params![user_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

/// Merge-write the `cards` and `updated_at` fields; other columns are left untouched
pub fn merge_collection_row(
    conn: &Connection,
    user_id: &str,
    cards_json: &str,
    updated_at: &str,
) -> DbResult<()> {
    conn.execute(
        "INSERT INTO collections (user_id, cards, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET cards = excluded.cards, updated_at = excluded.updated_at",
        params![user_id, cards_json, updated_at],
    )?;
    Ok(())
}

// ── Users ──────────────────────────────────────────────────────────────────

fn profile_from_row(row: &rusqlite::Row<'_>) -> DbResult<(String, UserProfile)> {
    Ok((
        row.get(0)?,
        UserProfile {
            username: row.get(1)?,
            display_name: row.get(2)?,
            photo_url: row.get(3)?,
            created_at: row.get(4)?,
        },
    ))
}

pub fn get_profile(conn: &Connection, user_id: &str) -> DbResult<Option<UserProfile>> {
    conn.query_row(
        "SELECT user_id, username, display_name, photo_url, created_at
         FROM users WHERE user_id = ?1",
        params![user_id],
        profile_from_row,
    )
    .optional()
    .map(|found| found.map(|(_, profile)| profile))
}

/// Look up a profile by exact username, returning `(user_id, profile)`
pub fn find_profile_by_username(
    conn: &Connection,
    username: &str,
) -> DbResult<Option<(String, UserProfile)>> {
    conn.query_row(
        "SELECT user_id, username, display_name, photo_url, created_at
         FROM users WHERE username = ?1",
        params![username],
        profile_from_row,
    )
    .optional()
}

pub fn insert_profile(conn: &Connection, user_id: &str, profile: &UserProfile) -> DbResult<()> {
    conn.execute(
        "INSERT INTO users (user_id, username, display_name, photo_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id,
            &profile.username,
            &profile.display_name,
            &profile.photo_url,
            &profile.created_at,
        ],
    )?;
    Ok(())
}

/// Returns the number of rows updated (0 if the user has no profile)
pub fn update_profile_username(conn: &Connection, user_id: &str, username: &str) -> DbResult<usize> {
    conn.execute(
        "UPDATE users SET username = ?2 WHERE user_id = ?1",
        params![user_id, username],
    )
}

// ── Prices ─────────────────────────────────────────────────────────────────

/// All price documents as `(doc_id, json)`, metadata sentinel included
pub fn get_price_documents(conn: &Connection) -> DbResult<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT doc_id, data FROM prices ORDER BY doc_id")?;
    let rows: DbResult<Vec<(String, String)>> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect();
    rows
}

/// Store a price document (used to seed a local store)
pub fn put_price_document(conn: &Connection, doc_id: &str, data: &str) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO prices (doc_id, data) VALUES (?1, ?2)",
        params![doc_id, data],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create an in-memory database for testing
    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn table_exists(conn: &Connection, name: &str) -> bool {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                params![name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn init_schema_creates_tables() {
        let conn = test_db();
        for table in ["local_storage", "collections", "users", "prices"] {
            assert!(table_exists(&conn, table), "missing table {}", table);
        }
    }

    #[test]
    fn init_schema_is_repeatable() {
        let conn = test_db();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn local_item_overwrites() {
        let conn = test_db();
        assert_eq!(get_local_item(&conn, "k").unwrap(), None);

        set_local_item(&conn, "k", "one").unwrap();
        set_local_item(&conn, "k", "two").unwrap();
        assert_eq!(get_local_item(&conn, "k").unwrap(), Some("two".to_string()));
    }

    #[test]
    fn merge_collection_keeps_created_at() {
        let conn = test_db();
        merge_collection_row(&conn, "u1", "{}", "2026-01-01T00:00:00.000Z").unwrap();
        conn.execute(
            "UPDATE collections SET created_at = 'original' WHERE user_id = 'u1'",
            [],
        )
        .unwrap();

        merge_collection_row(&conn, "u1", r#"{"a":{"normal":1}}"#, "2026-01-02T00:00:00.000Z")
            .unwrap();

        let created_at: String = conn
            .query_row(
                "SELECT created_at FROM collections WHERE user_id = 'u1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(created_at, "original");

        let (cards, updated_at) = get_collection_row(&conn, "u1").unwrap().unwrap();
        assert_eq!(cards, r#"{"a":{"normal":1}}"#);
        assert_eq!(updated_at, "2026-01-02T00:00:00.000Z");
    }

    #[test]
    fn missing_collection_is_none() {
        let conn = test_db();
        assert!(get_collection_row(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn profile_lookup_and_rename() {
        let conn = test_db();
        let profile = UserProfile {
            username: "alice".to_string(),
            display_name: Some("Alice".to_string()),
            photo_url: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        insert_profile(&conn, "u1", &profile).unwrap();

        let (user_id, found) = find_profile_by_username(&conn, "alice").unwrap().unwrap();
        assert_eq!(user_id, "u1");
        assert_eq!(found, profile);

        assert_eq!(update_profile_username(&conn, "u1", "alice2").unwrap(), 1);
        assert!(find_profile_by_username(&conn, "alice").unwrap().is_none());
        assert_eq!(get_profile(&conn, "u1").unwrap().unwrap().username, "alice2");
    }

    #[test]
    fn duplicate_username_is_rejected_by_schema() {
        let conn = test_db();
        let profile = UserProfile {
            username: "taken".to_string(),
            display_name: None,
            photo_url: None,
            created_at: "now".to_string(),
        };
        insert_profile(&conn, "u1", &profile).unwrap();
        assert!(insert_profile(&conn, "u2", &profile).is_err());
    }

    #[test]
    fn price_documents_listed_in_order() {
        let conn = test_db();
        put_price_document(&conn, "vb-002", r#"{"normal":{"price":1.0}}"#).unwrap();
        put_price_document(&conn, "_metadata", r#"{"lastUpdated":"2026-01-01T00:00:00Z"}"#)
            .unwrap();
        put_price_document(&conn, "vb-001", r#"{"foil":{"price":2.0}}"#).unwrap();

        let docs = get_price_documents(&conn).unwrap();
        let ids: Vec<&str> = docs.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["_metadata", "vb-001", "vb-002"]);
    }
}
