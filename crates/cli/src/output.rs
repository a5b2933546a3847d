//! Text and JSON rendering of store records.

use serde::Serialize;
use std::io::{self, Write};
use wt_core::model::{FileRevision, LatestFile, TrackedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated lines
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

pub fn print_files(
    out: &mut impl Write,
    files: &[TrackedFile],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            for file in files {
                writeln!(out, "{}\t{}\t{}", file.id, file.path, file.last_modified_ms)?;
            }
            Ok(())
        }
        OutputFormat::Json => print_json(out, files),
    }
}

pub fn print_revisions(
    out: &mut impl Write,
    revisions: &[FileRevision],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            for revision in revisions {
                writeln!(
                    out,
                    "r{}\t{}\t{}",
                    revision.revision, revision.timestamp_ms, revision.log
                )?;
            }
            Ok(())
        }
        OutputFormat::Json => print_json(out, revisions),
    }
}

pub fn print_checked_in(
    out: &mut impl Write,
    saved: &LatestFile,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => writeln!(
            out,
            "{} -> r{} (file {})",
            saved.file.path,
            saved.revision_number(),
            saved.id()
        ),
        OutputFormat::Json => print_json(out, saved),
    }
}

#[derive(Serialize)]
struct Restored<'a> {
    revision: u32,
    destination: &'a str,
    bytes: u64,
}

pub fn print_restored(
    out: &mut impl Write,
    revision: u32,
    destination: &std::path::Path,
    bytes: u64,
    format: OutputFormat,
) -> io::Result<()> {
    let destination = destination.to_string_lossy();
    match format {
        OutputFormat::Text => writeln!(out, "r{revision} -> {destination} ({bytes} bytes)"),
        OutputFormat::Json => print_json(
            out,
            &Restored {
                revision,
                destination: &destination,
                bytes,
            },
        ),
    }
}

fn print_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}
