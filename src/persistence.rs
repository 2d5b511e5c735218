//! # SQLite Store
//!
//! Recording store and breadcrumb sink backed by a SQLite database.
//!
//! Recordings keep their metadata as JSON next to the audio blob; imported
//! breadcrumbs are appended as one JSON row each, in import order.

#[cfg(feature = "persistence")]
use log::{debug, info};

#[cfg(feature = "persistence")]
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};

#[cfg(feature = "persistence")]
use crate::error::{ImportError, Result};

#[cfg(feature = "persistence")]
use crate::store::{check_recording, BreadcrumbSink, RecordingStore};

#[cfg(feature = "persistence")]
use crate::types::{iso_now, Breadcrumb, RecordingMetadata};

#[cfg(feature = "persistence")]
impl From<rusqlite::Error> for ImportError {
    fn from(e: rusqlite::Error) -> Self {
        ImportError::storage(e)
    }
}

/// SQLite-backed recording store and breadcrumb sink.
#[cfg(feature = "persistence")]
pub struct SqliteStore {
    db: Connection,
}

#[cfg(feature = "persistence")]
impl SqliteStore {
    // ========================================================================
    // Initialization
    // ========================================================================

    /// Open (or create) a store at the given database path.
    pub fn new(db_path: &str) -> SqlResult<Self> {
        let db = Connection::open(db_path)?;
        Self::init_schema(&db)?;
        info!("[Store] Opened SQLite store at {}", db_path);
        Ok(Self { db })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> SqlResult<Self> {
        Self::new(":memory:")
    }

    fn init_schema(conn: &Connection) -> SqlResult<()> {
        conn.execute_batch(
            r#"
            -- Recordings with their audio
            CREATE TABLE IF NOT EXISTS recordings (
                id TEXT PRIMARY KEY,
                unique_id TEXT NOT NULL,
                metadata TEXT NOT NULL,
                audio BLOB NOT NULL,
                imported_at TEXT NOT NULL
            );

            -- Imported breadcrumbs, append-only
            CREATE TABLE IF NOT EXISTS imported_breadcrumbs (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                data TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_imported_breadcrumbs_session
                ON imported_breadcrumbs(session_id);
            "#,
        )
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn recording_count(&self) -> Result<usize> {
        let count: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM recordings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Metadata and audio for a stored recording.
    pub fn recording(&self, id: &str) -> Result<Option<(RecordingMetadata, Vec<u8>)>> {
        let row: Option<(String, Vec<u8>)> = self
            .db
            .query_row(
                "SELECT metadata, audio FROM recordings WHERE id = ?",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(json, audio)| {
            serde_json::from_str(&json)
                .map(|meta| (meta, audio))
                .map_err(ImportError::storage)
        })
        .transpose()
    }

    /// Every imported breadcrumb, in import order.
    pub fn imported_breadcrumbs(&self) -> Result<Vec<Breadcrumb>> {
        self.load_breadcrumbs("SELECT data FROM imported_breadcrumbs ORDER BY seq", &[])
    }

    /// Breadcrumbs imported under one session id, in import order.
    pub fn session_breadcrumbs(&self, session_id: &str) -> Result<Vec<Breadcrumb>> {
        self.load_breadcrumbs(
            "SELECT data FROM imported_breadcrumbs WHERE session_id = ? ORDER BY seq",
            &[&session_id],
        )
    }

    fn load_breadcrumbs(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Breadcrumb>> {
        let mut stmt = self.db.prepare(sql)?;
        let rows = stmt.query_map(args, |row| row.get::<_, String>(0))?;

        let mut breadcrumbs = Vec::new();
        for json in rows {
            let breadcrumb = serde_json::from_str(&json?).map_err(ImportError::storage)?;
            breadcrumbs.push(breadcrumb);
        }
        Ok(breadcrumbs)
    }
}

#[cfg(feature = "persistence")]
impl RecordingStore for SqliteStore {
    fn save(&mut self, metadata: &RecordingMetadata, audio: &[u8]) -> Result<String> {
        check_recording(metadata, audio)?;

        let json = serde_json::to_string(metadata).map_err(ImportError::storage)?;
        let id = format!("recording-{}", uuid::Uuid::new_v4().simple());
        self.db.execute(
            "INSERT INTO recordings (id, unique_id, metadata, audio, imported_at) VALUES (?, ?, ?, ?, ?)",
            params![id, metadata.unique_id, json, audio, iso_now()],
        )?;

        debug!("[Store] Saved {} ({} bytes) as {}", metadata.filename, audio.len(), id);
        Ok(id)
    }
}

#[cfg(feature = "persistence")]
impl BreadcrumbSink for SqliteStore {
    fn append(&mut self, session_id: &str, breadcrumbs: &[Breadcrumb]) -> Result<()> {
        let tx = self.db.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO imported_breadcrumbs (session_id, data) VALUES (?, ?)")?;
            for breadcrumb in breadcrumbs {
                let json = serde_json::to_string(breadcrumb).map_err(ImportError::storage)?;
                stmt.execute(params![session_id, json])?;
            }
        }
        tx.commit()?;

        debug!(
            "[Store] Appended {} breadcrumbs for session {}",
            breadcrumbs.len(),
            session_id
        );
        Ok(())
    }
}
