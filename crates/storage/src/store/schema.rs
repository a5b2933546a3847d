#![forbid(unsafe_code)]

use super::StoreError;
use rusqlite::Connection;
use tracing::{info, warn};

/// Version recorded in `PRAGMA user_version`. Any other value on a writable open
/// drops all history and recreates the tables: this store is a local history
/// cache, not a system of record, so there are no migrations.
pub const SCHEMA_VERSION: i64 = 1;

pub(super) fn prepare(conn: &Connection, read_only: bool) -> Result<(), StoreError> {
    let found = user_version(conn)?;

    if read_only {
        if found != SCHEMA_VERSION {
            return Err(StoreError::SchemaMismatch {
                found,
                expected: SCHEMA_VERSION,
            });
        }
        return Ok(());
    }

    // Must be set outside of any transaction.
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    if found == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    if found == 0 {
        info!(version = SCHEMA_VERSION, "creating schema");
    } else {
        warn!(
            found,
            expected = SCHEMA_VERSION,
            "schema version changed; dropping all revision history"
        );
    }
    drop_tables(&tx)?;
    create_tables(&tx)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;
    Ok(())
}

fn user_version(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, i64>(0))?)
}

fn drop_tables(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS contents;
        DROP TABLE IF EXISTS revisions;
        DROP TABLE IF EXISTS files;
        "#,
    )?;
    Ok(())
}

fn create_tables(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE files (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          path TEXT NOT NULL UNIQUE,
          last_modified_ms INTEGER NOT NULL
        );

        CREATE TABLE revisions (
          file_id INTEGER NOT NULL,
          revision INTEGER NOT NULL,
          timestamp_ms INTEGER NOT NULL,
          log TEXT NOT NULL,
          PRIMARY KEY(file_id, revision),
          FOREIGN KEY(file_id) REFERENCES files(id),
          CHECK(revision >= 0)
        );

        CREATE TABLE contents (
          file_id INTEGER NOT NULL,
          revision INTEGER NOT NULL,
          content BLOB NOT NULL,
          PRIMARY KEY(file_id, revision),
          FOREIGN KEY(file_id, revision)
            REFERENCES revisions(file_id, revision)
        );
        "#,
    )?;
    Ok(())
}
