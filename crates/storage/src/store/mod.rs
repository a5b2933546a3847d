#![forbid(unsafe_code)]

mod check_in;
mod config;
mod error;
mod lookup;
mod restore;
mod schema;

pub use config::StoreConfig;
pub use error::StoreError;
pub use schema::SCHEMA_VERSION;

use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wt_core::ids::{FileId, TrackedPath};
use wt_core::model::{FileRevision, TrackedFile};

/// Revisioned file store backed by a single SQLite connection.
///
/// Each check-in writes a full snapshot of the file as the next revision. Files,
/// revisions and contents are only ever mutated through this type.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    db_path: Option<PathBuf>,
    read_only: bool,
}

impl SqliteStore {
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        let db_path = config.db_path();
        let conn = if config.read_only {
            Connection::open_with_flags(
                &db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            std::fs::create_dir_all(&config.storage_dir)?;
            Connection::open(&db_path)?
        };
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        schema::prepare(&conn, config.read_only)?;

        Ok(Self {
            conn,
            db_path: Some(db_path),
            read_only: config.read_only,
        })
    }

    pub fn open_dir(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open(StoreConfig::new(storage_dir.as_ref()))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::prepare(&conn, false)?;
        Ok(Self {
            conn,
            db_path: None,
            read_only: false,
        })
    }

    /// `None` for in-memory stores.
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn storage_dir(&self) -> Option<&Path> {
        self.db_path.as_deref().and_then(Path::parent)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

fn find_file_row(conn: &Connection, path: &TrackedPath) -> Result<Option<TrackedFile>, StoreError> {
    conn.query_row(
        "SELECT id, path, last_modified_ms FROM files WHERE path=?1",
        params![path.as_str()],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        },
    )
    .optional()?
    .map(|(id, path, last_modified_ms)| file_from_row(id, path, last_modified_ms))
    .transpose()
}

fn latest_revision_row(
    conn: &Connection,
    file_id: FileId,
) -> Result<Option<FileRevision>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT revision, timestamp_ms, log FROM revisions \
             WHERE file_id=?1 \
             ORDER BY revision DESC \
             LIMIT 1",
            params![file_id.get()],
            |row| {
                Ok(FileRevision {
                    file_id,
                    revision: row.get::<_, u32>(0)?,
                    timestamp_ms: row.get::<_, i64>(1)?,
                    log: row.get::<_, String>(2)?,
                })
            },
        )
        .optional()?)
}

fn file_from_row(id: i64, path: String, last_modified_ms: i64) -> Result<TrackedFile, StoreError> {
    Ok(TrackedFile {
        id: file_id_from_row(id)?,
        path: TrackedPath::try_new(path)
            .map_err(|_| StoreError::InvalidInput("invalid file path row"))?,
        last_modified_ms,
    })
}

fn file_id_from_row(value: i64) -> Result<FileId, StoreError> {
    FileId::try_new(value).map_err(|_| StoreError::InvalidInput("invalid file id row"))
}

fn map_write_error(err: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::ConstraintViolation(err.to_string());
    }
    StoreError::Sql(err)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("FOREIGN KEY constraint failed")
                })
        }
        _ => false,
    }
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
