//! Disk writes for downloaded replays.
//!
//! Replays are small whole-body writes; the interesting part is collision
//! avoidance. The check-then-write here is not atomic, so the orchestrator
//! serializes writes into one directory (single writer after each round).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Splits `filename` into (stem, extension-with-dot). No dot → empty extension.
fn split_name(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(idx) if idx > 0 => (&filename[..idx], &filename[idx..]),
        _ => (filename, ""),
    }
}

/// Resolves a free path for `filename` inside `dir`.
///
/// If `dir/filename` is taken, tries `stem (1).ext`, `stem (2).ext`, … until
/// a free name is found. A name counts as taken whether it came from this run
/// (duplicate remote basenames) or pre-existed on disk.
pub fn unique_target_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = split_name(filename);
    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{} ({}){}", stem, counter, ext));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Writes `body` to a collision-free path for `filename` under `dir`.
/// Returns the path actually written.
pub fn write_replay(dir: &Path, filename: &str, body: &[u8]) -> Result<PathBuf> {
    let path = unique_target_path(dir, filename);
    fs::write(&path, body)
        .with_context(|| format!("failed to write replay to {}", path.display()))?;
    Ok(path)
}
