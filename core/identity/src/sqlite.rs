//! SQLite-backed profile store.
//!
//! The relation is created explicitly by [`SqliteProfileStore::ensure_schema`];
//! upserts against a fresh database fail with `no such table: profiles`, which
//! the reconciler reports as an operator-actionable error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

use resilink_common::{Error, IdentityId, Result};

use crate::profile::{Profile, ProfileStore, ProfileUpsert};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE,
    full_name TEXT,
    created_at TEXT NOT NULL
);
"#;

fn db_error(err: rusqlite::Error) -> Error {
    Error::Backend(err.to_string())
}

/// Profile store using a local SQLite database.
pub struct SqliteProfileStore {
    conn: Mutex<Connection>,
}

impl SqliteProfileStore {
    /// Open (or create) a database file. Does not create the relation.
    ///
    /// # Errors
    /// - Database cannot be opened
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(db_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Create the `profiles` relation if it does not exist.
    ///
    /// # Postconditions
    /// - Subsequent upserts no longer fail with a missing-relation error
    pub async fn ensure_schema(&self) -> Result<()> {
        self.conn
            .lock()
            .await
            .execute_batch(SCHEMA)
            .map_err(db_error)?;
        info!("profiles table ensured");
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert) -> Result<()> {
        debug!("Upserting profile: {}", profile.id);
        self.conn
            .lock()
            .await
            .execute(
                r#"
                INSERT INTO profiles (id, email, full_name, created_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    email = excluded.email,
                    full_name = COALESCE(excluded.full_name, profiles.full_name)
                "#,
                params![
                    profile.id.as_str(),
                    profile.email.as_str(),
                    profile.full_name,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(db_error)?;
        Ok(())
    }

    async fn get_profile(&self, id: &IdentityId) -> Result<Option<Profile>> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                "SELECT id, email, full_name, created_at FROM profiles WHERE id = ?1",
                [id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(db_error)?;

        row.map(|(id, email, full_name, created_at)| {
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| Error::Serialization(format!("Invalid created_at: {}", e)))?
                .with_timezone(&Utc);
            Ok(Profile {
                id: IdentityId::new(id)?,
                email,
                full_name,
                created_at,
            })
        })
        .transpose()
    }
}
