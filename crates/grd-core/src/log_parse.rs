//! Parser for the upload log body format.
//!
//! A log resource is UTF-8 text holding record blocks separated by a literal
//! `---` delimiter. Each block is a forgiving line-oriented record: a few
//! recognized `key:` prefixes plus a `files:` marker that switches the rest
//! of the block into list mode. Unknown keys and blank lines are ignored by
//! contract, not by accident — the server adds fields over time and old
//! clients must keep working.

use crate::window::LogResourceRef;

/// One replay-submission event parsed from a log resource.
///
/// Only constructed when uploadtime, username, userid and at least one file
/// path are all present; a block missing any of them yields no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRecord {
    /// Verbatim `uploadtime:` value; parsed as a GMT instant later, at the
    /// time-filter stage.
    pub upload_time: String,
    pub username: String,
    pub user_id: String,
    /// Uploader client version; informational, not consulted downstream.
    pub client_version: Option<String>,
    /// Remote file paths in their original order.
    pub file_paths: Vec<String>,
    /// Filename of the log resource this record came from.
    pub source_log: String,
}

/// Classification of one trimmed line inside a record block.
#[derive(Debug, PartialEq, Eq)]
enum LogLine<'a> {
    UploadTime(&'a str),
    Username(&'a str),
    UserId(&'a str),
    Version(&'a str),
    FilesMarker,
    FileEntry(&'a str),
    Blank,
    /// Unrecognized key or free text; tolerated silently.
    Other,
}

fn classify(line: &str) -> LogLine<'_> {
    if line.is_empty() {
        LogLine::Blank
    } else if let Some(rest) = line.strip_prefix("uploadtime:") {
        LogLine::UploadTime(rest.trim())
    } else if let Some(rest) = line.strip_prefix("username:") {
        LogLine::Username(rest.trim())
    } else if let Some(rest) = line.strip_prefix("userid:") {
        LogLine::UserId(rest.trim())
    } else if let Some(rest) = line.strip_prefix("version:") {
        LogLine::Version(rest.trim())
    } else if line.starts_with("files:") {
        LogLine::FilesMarker
    } else if let Some(rest) = line.strip_prefix("- ") {
        LogLine::FileEntry(rest.trim())
    } else {
        LogLine::Other
    }
}

/// Parses one log resource body into upload records.
///
/// Blocks are independent: a malformed block yields nothing and parsing of
/// its siblings continues.
pub fn parse_log(body: &str, source: &LogResourceRef) -> Vec<UploadRecord> {
    body.split("---")
        .filter_map(|block| parse_block(block, &source.filename))
        .collect()
}

fn parse_block(block: &str, source_log: &str) -> Option<UploadRecord> {
    let block = block.trim();
    if block.is_empty() {
        return None;
    }

    let mut upload_time = None;
    let mut username = None;
    let mut user_id = None;
    let mut client_version = None;
    let mut file_paths = Vec::new();
    // Once entered, list mode stays active for the rest of the block; there
    // is no end marker in the format.
    let mut in_files = false;

    // An empty value counts as absent for the required-field check below.
    let non_empty = |v: &str| (!v.is_empty()).then(|| v.to_string());

    for line in block.lines() {
        match classify(line.trim()) {
            LogLine::UploadTime(v) => upload_time = non_empty(v),
            LogLine::Username(v) => username = non_empty(v),
            LogLine::UserId(v) => user_id = non_empty(v),
            LogLine::Version(v) => client_version = non_empty(v),
            LogLine::FilesMarker => in_files = true,
            LogLine::FileEntry(path) if in_files => file_paths.push(path.to_string()),
            LogLine::FileEntry(_) | LogLine::Blank | LogLine::Other => {}
        }
    }

    if file_paths.is_empty() {
        return None;
    }
    Some(UploadRecord {
        upload_time: upload_time?,
        username: username?,
        user_id: user_id?,
        client_version,
        file_paths,
        source_log: source_log.to_string(),
    })
}
