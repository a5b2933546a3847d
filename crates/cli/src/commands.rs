//! CLI command definitions and dispatch.

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use wt_core::ids::TrackedPath;
use wt_core::model::{CheckIn, checkout_path};
use wt_storage::{SqliteStore, StoreConfig, StoreError};

use crate::output::{self, OutputFormat};

const DEFAULT_STORAGE_DIR_NAME: &str = ".wagtail";

/// Wagtail - keep every saved version of your files
#[derive(Debug, Parser)]
#[command(name = "wagtail", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the revision database
    #[arg(long, env = "WAGTAIL_STORAGE_DIR", global = true)]
    pub storage_dir: Option<PathBuf>,

    /// TOML store configuration, used when no storage dir is given
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List tracked files
    Files,
    /// Save the current content of a file as its next revision
    CheckIn {
        path: PathBuf,
        /// Log message for the new revision
        #[arg(short, long, default_value = "")]
        message: String,
    },
    /// Show the revision history of a file
    Log { path: PathBuf },
    /// Restore a revision to disk (default destination: `<path>.<revision>`)
    CheckOut {
        path: PathBuf,
        #[arg(short, long)]
        revision: u32,
        /// Write here instead of next to the tracked file
        #[arg(long)]
        to: Option<PathBuf>,
    },
    /// Print the content of a revision (default: latest) to stdout
    Cat {
        path: PathBuf,
        #[arg(short, long)]
        revision: Option<u32>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    InvalidPath(&'static str),
    #[error("not tracked: {0}")]
    NotTracked(String),
}

impl CliError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(err) => err.code(),
            Self::Io(_) => "IO_ERROR",
            Self::InvalidPath(_) => "INVALID_INPUT",
            Self::NotTracked(_) => "NOT_TRACKED",
        }
    }
}

impl Cli {
    pub fn execute(&self, out: &mut impl Write) -> Result<(), CliError> {
        let config = self.store_config()?;
        debug!(db = %config.db_path().display(), "opening store");
        let mut store = SqliteStore::open(config)?;

        match &self.command {
            Command::Files => {
                let files = store.list_tracked_files()?;
                output::print_files(out, &files, self.format)?;
            }
            Command::CheckIn { path, message } => {
                let content = std::fs::read(path)?;
                let request = CheckIn::new(tracked_path(path)?, content, message.as_str());
                let saved = store.check_in(request)?;
                output::print_checked_in(out, &saved, self.format)?;
            }
            Command::Log { path } => {
                let tracked = tracked_path(path)?;
                let file = store
                    .find_by_path(&tracked)?
                    .ok_or_else(|| CliError::NotTracked(tracked.to_string()))?;
                let revisions = store.list_revisions(file.id)?;
                output::print_revisions(out, &revisions, self.format)?;
            }
            Command::CheckOut { path, revision, to } => {
                let tracked = tracked_path(path)?;
                let file_id = store
                    .find_id_for_path(&tracked)?
                    .ok_or_else(|| CliError::NotTracked(tracked.to_string()))?;
                let destination = match to {
                    Some(to) => to.clone(),
                    None => checkout_path(&tracked, *revision),
                };
                let bytes = store.restore(file_id, *revision, &destination)?;
                output::print_restored(out, *revision, &destination, bytes, self.format)?;
            }
            Command::Cat { path, revision } => {
                let tracked = tracked_path(path)?;
                let latest = store
                    .find_latest_file(&tracked)?
                    .ok_or_else(|| CliError::NotTracked(tracked.to_string()))?;
                let revision = revision.unwrap_or(latest.revision_number());
                let content = store.fetch_content(latest.id(), revision)?.ok_or(
                    StoreError::UnknownRevision {
                        file_id: latest.id(),
                        revision,
                    },
                )?;
                out.write_all(&content)?;
            }
        }

        out.flush()?;
        Ok(())
    }

    /// `--storage-dir` / `WAGTAIL_STORAGE_DIR`, then `--config`, then `~/.wagtail`.
    fn store_config(&self) -> Result<StoreConfig, CliError> {
        if let Some(dir) = &self.storage_dir {
            return Ok(StoreConfig::new(dir));
        }
        if let Some(path) = &self.config {
            return Ok(StoreConfig::load(path)?);
        }
        let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Ok(StoreConfig::new(base.join(DEFAULT_STORAGE_DIR_NAME)))
    }
}

fn tracked_path(path: &Path) -> Result<TrackedPath, CliError> {
    TrackedPath::from_path(path).map_err(|err| CliError::InvalidPath(err.message()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(label: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be monotonic enough for tests")
            .as_nanos();
        path.push(format!("wt-cli-{label}-{}-{nanos}", std::process::id()));
        std::fs::create_dir_all(&path).expect("temp dir must be creatable");
        path
    }

    fn run(storage: &Path, args: &[&str]) -> Result<String, CliError> {
        let mut argv = vec!["wagtail", "--storage-dir", storage.to_str().expect("utf-8 temp dir")];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("arguments should parse");
        let mut out = Vec::new();
        cli.execute(&mut out)?;
        Ok(String::from_utf8(out).expect("utf-8 output"))
    }

    #[test]
    fn parses_check_out_arguments() {
        let cli = Cli::try_parse_from([
            "wagtail", "check-out", "notes.txt", "-r", "3", "--to", "/tmp/out", "-f", "json",
        ])
        .expect("arguments should parse");
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::CheckOut { path, revision, to } => {
                assert_eq!(path, PathBuf::from("notes.txt"));
                assert_eq!(revision, 3);
                assert_eq!(to, Some(PathBuf::from("/tmp/out")));
            }
            other => panic!("expected check-out, got {other:?}"),
        }
    }

    #[test]
    fn check_out_requires_a_revision() {
        assert!(Cli::try_parse_from(["wagtail", "check-out", "notes.txt"]).is_err());
    }

    #[test]
    fn check_in_log_and_check_out_round_trip() {
        let dir = temp_dir("round-trip");
        let storage = dir.join("store");
        let work = dir.join("notes.txt");
        let work_str = work.to_str().expect("utf-8 temp dir");

        std::fs::write(&work, "hello").expect("write work file");
        let first = run(&storage, &["check-in", work_str, "-m", "init"]).expect("check-in");
        assert!(first.contains("-> r0"), "unexpected output: {first}");

        std::fs::write(&work, "hello world").expect("write work file");
        run(&storage, &["check-in", work_str, "-m", "update"]).expect("check-in");

        let log = run(&storage, &["log", work_str]).expect("log");
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("r0\t") && lines[0].ends_with("\tinit"));
        assert!(lines[1].starts_with("r1\t") && lines[1].ends_with("\tupdate"));

        run(&storage, &["check-out", work_str, "-r", "0"]).expect("check-out");
        assert_eq!(
            std::fs::read(dir.join("notes.txt.0")).expect("checked out file"),
            b"hello"
        );

        assert_eq!(run(&storage, &["cat", work_str]).expect("cat"), "hello world");
        assert_eq!(
            run(&storage, &["cat", work_str, "-r", "0"]).expect("cat r0"),
            "hello"
        );
    }

    #[test]
    fn files_lists_tracked_paths_as_json() {
        let dir = temp_dir("files-json");
        let storage = dir.join("store");
        let work = dir.join("a.txt");
        std::fs::write(&work, "x").expect("write work file");
        run(&storage, &["check-in", work.to_str().expect("utf-8")]).expect("check-in");

        let json = run(&storage, &["--format", "json", "files"]).expect("files");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["path"], work.to_str().expect("utf-8"));
    }

    #[test]
    fn untracked_paths_are_reported() {
        let dir = temp_dir("untracked");
        let err = run(&dir.join("store"), &["log", "/nowhere/missing.txt"])
            .expect_err("path was never checked in");
        assert_eq!(err.code(), "NOT_TRACKED");

        let err = run(&dir.join("store"), &["check-in", "/nowhere/missing.txt"])
            .expect_err("work file does not exist");
        assert_eq!(err.code(), "IO_ERROR");
    }
}
