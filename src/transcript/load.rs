use super::LogEntry;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const LINES_EXTENSION: &str = "jsonl";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing session JSON")]
    Parse(#[source] serde_json::Error),
    #[error("session document does not match the log schema")]
    Validation(#[source] serde_json::Error),
}

/// How the raw text is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A single `{ "loglines": [...] }` document.
    Document,
    /// One log entry per line.
    Lines,
}

/// The single-document wrapper.
#[derive(Debug, Deserialize)]
struct SessionDocument {
    loglines: Vec<LogEntry>,
}

/// Decide between the two input layouts.
///
/// A `.jsonl` path is always line-delimited. Otherwise the first non-blank
/// line is probed: if it parses as JSON on its own and carries no
/// top-level `loglines` key, the file is one entry per line.
pub fn detect_format(path: &Path, text: &str) -> InputFormat {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(LINES_EXTENSION));
    if by_extension {
        return InputFormat::Lines;
    }
    let first = text.lines().map(str::trim).find(|line| !line.is_empty());
    match first.map(serde_json::from_str::<serde_json::Value>) {
        Some(Ok(value)) if value.get("loglines").is_none() => InputFormat::Lines,
        _ => InputFormat::Document,
    }
}

/// Parse a line-delimited log. Returns the surviving user/assistant
/// entries and the lines that were rejected (1-based line number and
/// reason). Entries of any other type are dropped without being reported.
pub fn parse_lines(contents: &str) -> (Vec<LogEntry>, Vec<(usize, String)>) {
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    for (i, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // Parse the line once as a raw Value, then validate the typed
        // entry from the already-parsed tree.
        let value = match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => value,
            Err(e) => {
                errors.push((i + 1, format!("{e}")));
                continue;
            }
        };
        match LogEntry::deserialize(&value) {
            Ok(entry) if entry.is_turn() => entries.push(entry),
            Ok(_) => {}
            Err(e) => errors.push((i + 1, format!("{e}"))),
        }
    }

    (entries, errors)
}

/// Parse a `{ "loglines": [...] }` document. Any structural problem fails
/// the whole document.
pub fn parse_document(contents: &str) -> Result<Vec<LogEntry>, LoadError> {
    let value: serde_json::Value = serde_json::from_str(contents).map_err(LoadError::Parse)?;
    let document = SessionDocument::deserialize(&value).map_err(LoadError::Validation)?;
    Ok(document.loglines)
}

/// Detect the layout of `contents` and parse it into log entries.
pub fn parse_entries(path: &Path, contents: &str) -> Result<Vec<LogEntry>, LoadError> {
    match detect_format(path, contents) {
        InputFormat::Lines => {
            let (entries, errors) = parse_lines(contents);
            for (line, err) in &errors {
                debug!(line, error = %err, "skipping unparseable log line");
            }
            debug!(kept = entries.len(), skipped = errors.len(), "parsed line-delimited log");
            Ok(entries)
        }
        InputFormat::Document => {
            let entries = parse_document(contents)?;
            debug!(entries = entries.len(), "parsed session document");
            Ok(entries)
        }
    }
}

/// Read `path` and parse it into log entries.
pub fn load_path(path: &Path) -> Result<Vec<LogEntry>, LoadError> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_entries(path, &contents)
}
