use crate::error::StoreError;
use crate::model::{NewTrack, Track};
use log::debug;
use rusqlite::{Connection, params};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA_VERSION: i64 = 1;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DB_SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS tracks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        data TEXT NOT NULL
    );
"#;

/// Durable create/read-all persistence for tracks.
///
/// Implementations hold no open connection between calls; every operation
/// reaches the backend on its own and reports exactly its own outcome.
pub trait TrackStore: Send + Sync {
    /// Ensures the schema exists. Safe to call any number of times.
    fn open(&self) -> Result<(), StoreError>;

    /// Persists `track` under a fresh id. Returns only once the write is
    /// committed.
    fn insert(&self, track: NewTrack) -> Result<Track, StoreError>;

    /// Every stored track, ascending by id.
    fn load_all(&self) -> Result<Vec<Track>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct SqliteTrackStore {
    path: PathBuf,
}

impl SqliteTrackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                StoreError::unavailable(format!("failed to create {}", parent.display()), err)
            })?;
        }

        let conn = Connection::open(&self.path).map_err(|err| {
            StoreError::unavailable(format!("failed to open {}", self.path.display()), err)
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|err| StoreError::unavailable("failed to set busy timeout", err))?;
        ensure_schema(&conn).map_err(|err| {
            StoreError::unavailable(
                format!("failed to prepare schema in {}", self.path.display()),
                err,
            )
        })?;
        Ok(conn)
    }
}

impl TrackStore for SqliteTrackStore {
    fn open(&self) -> Result<(), StoreError> {
        self.connect().map(|_| ())
    }

    fn insert(&self, track: NewTrack) -> Result<Track, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn
            .transaction()
            .map_err(|err| StoreError::write("failed to begin transaction", err))?;
        tx.execute(
            "INSERT INTO tracks (name, data) VALUES (?1, ?2)",
            params![track.name, track.data],
        )
        .map_err(|err| StoreError::write(format!("failed to insert {}", track.name), err))?;
        let id = tx.last_insert_rowid();
        tx.commit()
            .map_err(|err| StoreError::write(format!("failed to commit {}", track.name), err))?;

        debug!("stored track {id} ({})", track.name);
        Ok(track.into_track(id))
    }

    fn load_all(&self) -> Result<Vec<Track>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare("SELECT id, name, data FROM tracks ORDER BY id ASC")
            .map_err(|err| StoreError::read("failed to prepare track query", err))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Track {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    data: row.get(2)?,
                })
            })
            .map_err(|err| StoreError::read("failed to query tracks", err))?;

        let mut tracks = Vec::new();
        for track in rows {
            tracks.push(track.map_err(|err| StoreError::read("failed to decode track row", err))?);
        }
        debug!("loaded {} tracks from {}", tracks.len(), self.path.display());
        Ok(tracks)
    }
}

fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.execute_batch(DB_SCHEMA)?;
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
    }
    Ok(())
}
