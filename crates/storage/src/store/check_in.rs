#![forbid(unsafe_code)]

use super::*;
use rusqlite::{Transaction, TransactionBehavior, params};
use tracing::debug;
use wt_core::model::{CheckIn, LatestFile};

impl SqliteStore {
    /// Stores `request.content` as the next revision of `request.path`.
    ///
    /// An unseen path gets a new file id and revision 0; a tracked path gets
    /// `latest + 1` and a fresh last-modified time. The lookup and all writes share
    /// one immediate transaction, so either the file, revision and content rows all
    /// land or none do.
    pub fn check_in(&mut self, request: CheckIn) -> Result<LatestFile, StoreError> {
        let CheckIn { path, content, log } = request;
        let now_ms = now_ms();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = match find_file_row(&tx, &path)? {
            Some(file) => {
                let latest = latest_revision_row(&tx, file.id)?
                    .ok_or(StoreError::MissingRevisions { file_id: file.id })?;
                Some((file, latest.revision))
            }
            None => None,
        };

        let (file, revision_number) = match existing {
            None => (insert_file_tx(&tx, path, now_ms)?, 0),
            Some((file, latest)) => {
                let next = latest
                    .checked_add(1)
                    .ok_or(StoreError::InvalidInput("revision number overflow"))?;
                (touch_file_tx(&tx, file, now_ms)?, next)
            }
        };

        let revision = FileRevision {
            file_id: file.id,
            revision: revision_number,
            timestamp_ms: now_ms,
            log,
        };
        insert_revision_tx(&tx, &revision)?;
        insert_content_tx(&tx, file.id, revision_number, &content)?;
        tx.commit()?;

        debug!(
            file_id = file.id.get(),
            revision = revision_number,
            bytes = content.len(),
            "checked in"
        );
        Ok(LatestFile { file, revision })
    }

    pub fn save(
        &mut self,
        path: TrackedPath,
        content: impl Into<Vec<u8>>,
        log: impl Into<String>,
    ) -> Result<LatestFile, StoreError> {
        self.check_in(CheckIn::new(path, content, log))
    }
}

fn insert_file_tx(
    tx: &Transaction<'_>,
    path: TrackedPath,
    now_ms: i64,
) -> Result<TrackedFile, StoreError> {
    tx.execute(
        "INSERT INTO files(path, last_modified_ms) VALUES (?1, ?2)",
        params![path.as_str(), now_ms],
    )
    .map_err(map_write_error)?;

    Ok(TrackedFile {
        id: file_id_from_row(tx.last_insert_rowid())?,
        path,
        last_modified_ms: now_ms,
    })
}

fn touch_file_tx(
    tx: &Transaction<'_>,
    file: TrackedFile,
    now_ms: i64,
) -> Result<TrackedFile, StoreError> {
    // A clock step backwards must not make the file look older than its history.
    let last_modified_ms = file.last_modified_ms.max(now_ms);
    tx.execute(
        "UPDATE files SET last_modified_ms=?2 WHERE id=?1",
        params![file.id.get(), last_modified_ms],
    )
    .map_err(map_write_error)?;

    Ok(TrackedFile {
        last_modified_ms,
        ..file
    })
}

fn insert_revision_tx(tx: &Transaction<'_>, revision: &FileRevision) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO revisions(file_id, revision, timestamp_ms, log) VALUES (?1, ?2, ?3, ?4)",
        params![
            revision.file_id.get(),
            revision.revision,
            revision.timestamp_ms,
            revision.log,
        ],
    )
    .map_err(map_write_error)?;
    Ok(())
}

fn insert_content_tx(
    tx: &Transaction<'_>,
    file_id: FileId,
    revision: u32,
    content: &[u8],
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO contents(file_id, revision, content) VALUES (?1, ?2, ?3)",
        params![file_id.get(), revision, content],
    )
    .map_err(map_write_error)?;
    Ok(())
}
