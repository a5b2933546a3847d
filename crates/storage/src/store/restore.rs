#![forbid(unsafe_code)]

use super::*;
use std::fs;
use tracing::debug;
use wt_core::model::checkout_path;

impl SqliteStore {
    /// Writes revision `revision` of `file_id` to `destination` and returns the
    /// number of bytes written.
    ///
    /// The bytes go to a temp file next to the real destination and are renamed
    /// into place, so a failed write leaves any existing file untouched. A
    /// symlinked `destination` stays a link and its target is replaced; the
    /// replaced file keeps its permissions. Parent directories are not created.
    pub fn restore(
        &self,
        file_id: FileId,
        revision: u32,
        destination: impl AsRef<Path>,
    ) -> Result<u64, StoreError> {
        let destination = destination.as_ref();
        if destination.is_dir() {
            return Err(StoreError::InvalidInput(
                "restore destination must be a file path",
            ));
        }

        let content = self
            .fetch_content(file_id, revision)?
            .ok_or(StoreError::UnknownRevision { file_id, revision })?;
        write_replacing(destination, &content)?;

        debug!(
            file_id = file_id.get(),
            revision,
            bytes = content.len(),
            destination = %destination.display(),
            "restored"
        );
        Ok(content.len() as u64)
    }

    /// Restores next to the tracked file as `<path>.<revision>`.
    pub fn check_out(&self, file_id: FileId, revision: u32) -> Result<PathBuf, StoreError> {
        let file = self.find_by_id(file_id)?.ok_or(StoreError::UnknownFile)?;
        let destination = checkout_path(&file.path, revision);
        self.restore(file_id, revision, &destination)?;
        Ok(destination)
    }
}

fn write_replacing(destination: &Path, content: &[u8]) -> std::io::Result<()> {
    // Replace the file a symlink points at, not the link, and keep its mode.
    let (target, permissions) = match fs::canonicalize(destination) {
        Ok(target) => {
            let permissions = fs::metadata(&target)?.permissions();
            (target, Some(permissions))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if fs::symlink_metadata(destination).is_ok() {
                // Dangling link: writing through it creates the target.
                return fs::write(destination, content);
            }
            (destination.to_path_buf(), None)
        }
        Err(err) => return Err(err),
    };

    let tmp_path = target.with_extension(format!("tmp.{}", std::process::id()));
    let result = fs::write(&tmp_path, content)
        .and_then(|()| match permissions {
            Some(permissions) => fs::set_permissions(&tmp_path, permissions),
            None => Ok(()),
        })
        .and_then(|()| fs::rename(&tmp_path, &target));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
