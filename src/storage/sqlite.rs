//! SQLite store with bounded history
//!
//! Every saved record is kept as a row; loading returns the newest row of
//! each table. Rows older than the retention window are pruned on save, but
//! the newest row of a table is never removed.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use super::{StateStore, StorageError, StorageResult};
use crate::models::{LiveRecord, PersistedState, VideoRecord};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS video (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        observed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_video_observed_at
        ON video(observed_at);

    CREATE TABLE IF NOT EXISTS live (
        started_at TEXT PRIMARY KEY,
        title TEXT NOT NULL
    );
"#;

/// Fixed-width timestamps so text ordering matches time ordering
fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("bad timestamp '{raw}': {e}")))
}

/// SQLite implementation of [`StateStore`]
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection; queries
/// run on the blocking pool.
#[derive(Clone)]
pub struct SqliteStateStore {
    conn: Arc<Mutex<Connection>>,
    retention_days: i64,
}

impl SqliteStateStore {
    /// Open (or create) a database file
    pub fn new(path: impl AsRef<Path>, retention_days: i64) -> StorageResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(SCHEMA)?;

        tracing::info!(path = %path.display(), "SQLite state store initialized");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            retention_days,
        })
    }

    /// Create in-memory store (for testing)
    pub fn in_memory(retention_days: i64) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            retention_days,
        })
    }

    /// Run `op` with the connection on the blocking pool
    async fn with_conn<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StorageError::Unavailable("connection lock poisoned".to_string()))?;
            op(&mut guard)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("storage task failed: {e}")))?
    }

    /// Number of stored (video, live) rows
    pub async fn history_len(&self) -> StorageResult<(usize, usize)> {
        self.with_conn(|conn| {
            let videos: i64 = conn.query_row("SELECT COUNT(*) FROM video", [], |row| row.get(0))?;
            let lives: i64 = conn.query_row("SELECT COUNT(*) FROM live", [], |row| row.get(0))?;
            Ok((videos as usize, lives as usize))
        })
        .await
    }

    /// Delete rows older than `cutoff`, keeping the newest row of each table
    pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> StorageResult<usize> {
        let cutoff = encode_time(cutoff);
        self.with_conn(move |conn| prune(conn, &cutoff)).await
    }
}

/// Oldest timestamp kept by retention; saturates at the earliest representable time
fn retention_cutoff(now: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    Duration::try_days(retention_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn prune(conn: &Connection, cutoff: &str) -> StorageResult<usize> {
    let videos = conn.execute(
        "DELETE FROM video
         WHERE observed_at < ?1
           AND observed_at < (SELECT MAX(observed_at) FROM video)",
        params![cutoff],
    )?;
    let lives = conn.execute(
        "DELETE FROM live
         WHERE started_at < ?1
           AND started_at < (SELECT MAX(started_at) FROM live)",
        params![cutoff],
    )?;
    Ok(videos + lives)
}

#[async_trait]
impl StateStore for SqliteStateStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load(&self) -> StorageResult<PersistedState> {
        self.with_conn(|conn| {
            let video = conn
                .query_row(
                    "SELECT id, title, observed_at FROM video ORDER BY observed_at DESC LIMIT 1",
                    [],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()?;

            let live = conn
                .query_row(
                    "SELECT started_at, title FROM live ORDER BY started_at DESC LIMIT 1",
                    [],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;

            let video = match video {
                Some((id, title, observed_at)) => {
                    Some(VideoRecord::new(id, title, decode_time(&observed_at)?))
                }
                None => None,
            };
            let live = match live {
                Some((started_at, title)) => Some(LiveRecord::new(decode_time(&started_at)?, title)),
                None => None,
            };

            Ok(PersistedState::new(video, live))
        })
        .await
    }

    async fn save(&self, state: &PersistedState) -> StorageResult<()> {
        let state = state.clone();
        let cutoff = encode_time(retention_cutoff(Utc::now(), self.retention_days));

        let pruned = self
            .with_conn(move |conn| {
                let tx = conn.transaction()?;
                if let Some(video) = &state.video {
                    tx.execute(
                        "INSERT OR REPLACE INTO video (id, title, observed_at) VALUES (?1, ?2, ?3)",
                        params![video.id, video.title, encode_time(video.observed_at)],
                    )?;
                }
                if let Some(live) = &state.live {
                    tx.execute(
                        "INSERT OR REPLACE INTO live (started_at, title) VALUES (?1, ?2)",
                        params![encode_time(live.started_at), live.title],
                    )?;
                }
                let pruned = prune(&tx, &cutoff)?;
                tx.commit()?;
                Ok(pruned)
            })
            .await?;

        if pruned > 0 {
            tracing::info!(rows = pruned, "Pruned old state history");
        }
        Ok(())
    }
}
