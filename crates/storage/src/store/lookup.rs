#![forbid(unsafe_code)]

use super::*;
use rusqlite::{OptionalExtension, params};
use std::ops::ControlFlow;
use wt_core::model::LatestFile;

// Every lookup reports "not tracked" as `Ok(None)`; errors are reserved for
// storage failures and corrupted rows.
impl SqliteStore {
    pub fn find_by_path(&self, path: &TrackedPath) -> Result<Option<TrackedFile>, StoreError> {
        find_file_row(&self.conn, path)
    }

    pub fn find_by_id(&self, file_id: FileId) -> Result<Option<TrackedFile>, StoreError> {
        self.conn
            .query_row(
                "SELECT id, path, last_modified_ms FROM files WHERE id=?1",
                params![file_id.get()],
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

    pub fn find_id_for_path(&self, path: &TrackedPath) -> Result<Option<FileId>, StoreError> {
        Ok(self.find_by_path(path)?.map(|file| file.id))
    }

    /// The file at `path` together with its highest-numbered revision.
    ///
    /// A tracked file without any revision can only come from a damaged database
    /// and is reported as [`StoreError::MissingRevisions`].
    pub fn find_latest_file(&self, path: &TrackedPath) -> Result<Option<LatestFile>, StoreError> {
        // Both reads must see the same snapshot.
        let tx = self.conn.unchecked_transaction()?;
        let Some(file) = find_file_row(&tx, path)? else {
            return Ok(None);
        };
        let revision = latest_revision_row(&tx, file.id)?
            .ok_or(StoreError::MissingRevisions { file_id: file.id })?;
        tx.commit()?;
        Ok(Some(LatestFile { file, revision }))
    }

    pub fn latest_revision(&self, file_id: FileId) -> Result<Option<FileRevision>, StoreError> {
        latest_revision_row(&self.conn, file_id)
    }

    /// Streams tracked files ordered by path, one row at a time.
    ///
    /// Rows are read from the cursor only as `visit` asks for them; returning
    /// `ControlFlow::Break` stops the scan. Each call re-issues the query.
    pub fn for_each_tracked_file(
        &self,
        mut visit: impl FnMut(TrackedFile) -> ControlFlow<()>,
    ) -> Result<(), StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, path, last_modified_ms FROM files ORDER BY path ASC")?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let file = file_from_row(
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            )?;
            if visit(file).is_break() {
                break;
            }
        }

        Ok(())
    }

    /// Streams the history of `file_id` oldest first. An unknown id visits
    /// nothing.
    pub fn for_each_revision(
        &self,
        file_id: FileId,
        mut visit: impl FnMut(FileRevision) -> ControlFlow<()>,
    ) -> Result<(), StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT revision, timestamp_ms, log FROM revisions \
             WHERE file_id=?1 \
             ORDER BY revision ASC",
        )?;
        let mut rows = stmt.query(params![file_id.get()])?;

        while let Some(row) = rows.next()? {
            let revision = FileRevision {
                file_id,
                revision: row.get::<_, u32>(0)?,
                timestamp_ms: row.get::<_, i64>(1)?,
                log: row.get::<_, String>(2)?,
            };
            if visit(revision).is_break() {
                break;
            }
        }

        Ok(())
    }

    /// All tracked files ordered by path.
    pub fn list_tracked_files(&self) -> Result<Vec<TrackedFile>, StoreError> {
        let mut out = Vec::new();
        self.for_each_tracked_file(|file| {
            out.push(file);
            ControlFlow::Continue(())
        })?;
        Ok(out)
    }

    pub fn list_revisions(&self, file_id: FileId) -> Result<Vec<FileRevision>, StoreError> {
        let mut out = Vec::new();
        self.for_each_revision(file_id, |revision| {
            out.push(revision);
            ControlFlow::Continue(())
        })?;
        Ok(out)
    }

    pub fn fetch_content(
        &self,
        file_id: FileId,
        revision: u32,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT content FROM contents WHERE file_id=?1 AND revision=?2",
                params![file_id.get(), revision],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?)
    }
}
