#![forbid(unsafe_code)]

pub mod ids {
    use serde::Serialize;
    use std::path::Path;

    const MAX_PATH_BYTES: usize = 4096;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
    #[serde(transparent)]
    pub struct FileId(i64);

    impl FileId {
        pub fn get(self) -> i64 {
            self.0
        }

        pub fn try_new(value: i64) -> Result<Self, FileIdError> {
            if value <= 0 {
                return Err(FileIdError::NotPositive);
            }
            Ok(Self(value))
        }
    }

    impl std::fmt::Display for FileId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum FileIdError {
        NotPositive,
    }

    impl FileIdError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::NotPositive => "file id must be positive",
            }
        }
    }

    /// Natural key of a tracked file. Lookups match it byte for byte.
    ///
    /// Any non-empty string without NUL is accepted, newlines included.
    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
    #[serde(transparent)]
    pub struct TrackedPath(String);

    impl TrackedPath {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, TrackedPathError> {
            let value = value.into();
            validate_tracked_path(&value)?;
            Ok(Self(value))
        }

        /// Resolves `path` against the current directory. Symlinks are not followed.
        pub fn from_path(path: &Path) -> Result<Self, TrackedPathError> {
            let absolute = std::path::absolute(path).map_err(|_| TrackedPathError::Unresolvable)?;
            let Some(value) = absolute.to_str() else {
                return Err(TrackedPathError::NotUtf8);
            };
            Self::try_new(value)
        }
    }

    impl std::fmt::Display for TrackedPath {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl AsRef<Path> for TrackedPath {
        fn as_ref(&self) -> &Path {
            Path::new(&self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum TrackedPathError {
        Empty,
        TooLong,
        ContainsNul,
        NotUtf8,
        Unresolvable,
    }

    impl TrackedPathError {
        pub fn message(&self) -> &'static str {
            match self {
                Self::Empty => "path must not be empty",
                Self::TooLong => "path is too long",
                Self::ContainsNul => "path contains a NUL byte",
                Self::NotUtf8 => "path is not valid UTF-8",
                Self::Unresolvable => "path cannot be made absolute",
            }
        }
    }

    fn validate_tracked_path(value: &str) -> Result<(), TrackedPathError> {
        if value.trim().is_empty() {
            return Err(TrackedPathError::Empty);
        }
        if value.len() > MAX_PATH_BYTES {
            return Err(TrackedPathError::TooLong);
        }
        if value.contains('\0') {
            return Err(TrackedPathError::ContainsNul);
        }
        Ok(())
    }
}

pub mod model {
    use crate::ids::{FileId, TrackedPath};
    use serde::Serialize;
    use std::path::PathBuf;

    /// A row of the files table: identity plus the time of the last check-in.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    pub struct TrackedFile {
        pub id: FileId,
        pub path: TrackedPath,
        pub last_modified_ms: i64,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    pub struct FileRevision {
        pub file_id: FileId,
        pub revision: u32,
        pub timestamp_ms: i64,
        pub log: String,
    }

    /// A tracked file together with its newest revision.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    pub struct LatestFile {
        pub file: TrackedFile,
        pub revision: FileRevision,
    }

    impl LatestFile {
        pub fn id(&self) -> FileId {
            self.file.id
        }

        pub fn revision_number(&self) -> u32 {
            self.revision.revision
        }
    }

    /// Payload of a check-in: the full snapshot to store as the next revision.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct CheckIn {
        pub path: TrackedPath,
        pub content: Vec<u8>,
        pub log: String,
    }

    impl CheckIn {
        pub fn new(path: TrackedPath, content: impl Into<Vec<u8>>, log: impl Into<String>) -> Self {
            Self {
                path,
                content: content.into(),
                log: log.into(),
            }
        }
    }

    /// Default destination for checking out `revision`: `<path>.<revision>`.
    pub fn checkout_path(path: &TrackedPath, revision: u32) -> PathBuf {
        PathBuf::from(format!("{}.{revision}", path.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::ids::*;
    use super::model::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn file_id_must_be_positive() {
        assert_eq!(FileId::try_new(0).unwrap_err(), FileIdError::NotPositive);
        assert_eq!(FileId::try_new(-3).unwrap_err(), FileIdError::NotPositive);
        assert_eq!(FileId::try_new(7).unwrap().get(), 7);
        assert_eq!(FileIdError::NotPositive.message(), "file id must be positive");
    }

    #[test]
    fn tracked_path_validation() {
        assert_eq!(TrackedPath::try_new("").unwrap_err(), TrackedPathError::Empty);
        assert_eq!(TrackedPath::try_new("   ").unwrap_err(), TrackedPathError::Empty);
        assert_eq!(
            TrackedPath::try_new("/a\u{0000}b").unwrap_err(),
            TrackedPathError::ContainsNul
        );
        assert_eq!(
            TrackedPath::try_new("/tmp/two\nlines.txt").unwrap().as_str(),
            "/tmp/two\nlines.txt"
        );
        assert!(TrackedPath::try_new("/tab\there").is_ok());
        assert_eq!(
            TrackedPath::try_new("x".repeat(4097)).unwrap_err(),
            TrackedPathError::TooLong
        );
        assert_eq!(TrackedPath::try_new("/a.txt").unwrap().as_str(), "/a.txt");
    }

    #[test]
    fn tracked_path_from_relative_path_is_absolute() {
        let path = TrackedPath::from_path(Path::new("notes/today.txt")).unwrap();
        assert!(Path::new(path.as_str()).is_absolute());
        assert!(path.as_str().ends_with("today.txt"));
    }

    #[test]
    fn checkout_path_appends_revision_number() {
        let path = TrackedPath::try_new("/sdcard/notes.txt").unwrap();
        assert_eq!(
            checkout_path(&path, 3),
            PathBuf::from("/sdcard/notes.txt.3")
        );
    }

    #[test]
    fn records_serialize_with_plain_ids() {
        let file = TrackedFile {
            id: FileId::try_new(1).unwrap(),
            path: TrackedPath::try_new("/a.txt").unwrap(),
            last_modified_ms: 42,
        };
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["path"], "/a.txt");
        assert_eq!(json["last_modified_ms"], 42);
    }
}
