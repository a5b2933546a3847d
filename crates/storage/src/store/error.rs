#![forbid(unsafe_code)]

use wt_core::ids::FileId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("unknown file")]
    UnknownFile,
    #[error("unknown revision (file_id={file_id}, revision={revision})")]
    UnknownRevision { file_id: FileId, revision: u32 },
    #[error("file has no revisions (file_id={file_id})")]
    MissingRevisions { file_id: FileId },
    #[error("schema version mismatch (found={found}, expected={expected})")]
    SchemaMismatch { found: i64, expected: i64 },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO_ERROR",
            Self::Sql(_) => "STORAGE_UNAVAILABLE",
            Self::Config(_) => "INVALID_CONFIG",
            Self::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UnknownFile => "UNKNOWN_FILE",
            Self::UnknownRevision { .. } => "UNKNOWN_REVISION",
            Self::MissingRevisions { .. } => "MISSING_REVISIONS",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
        }
    }
}
