//! Replay/metadata pairing within one upload's file list.
//!
//! Every replay binary (`.rep`) is paired with the companion metadata text
//! (`.txt`) the uploader submitted alongside it, matched by filename prefix.
//! Replays without a metadata match cannot be validated and are dropped.

use crate::config::GrdConfig;

/// A replay binary plus its companion metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayFilePair {
    /// Replay basename, used as the local output filename.
    pub rep_file: String,
    /// Metadata basename.
    pub txt_file: String,
    /// Raw remote paths exactly as they appeared in the log.
    pub rep_path: String,
    pub txt_path: String,
    pub rep_url: String,
    pub txt_url: String,
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Joins the configured origin with a raw remote path, verbatim. The path is
/// deliberately not percent-re-encoded; the server expects it as logged.
fn remote_url(origin: &str, path: &str) -> String {
    format!("{}/{}", origin.trim_end_matches('/'), path)
}

/// Pairs `.rep` files with `.txt` files from one upload's file list.
///
/// Suffix matching is exact and case-sensitive (last 4 characters). For each
/// replay, the first metadata file (in original list order) whose basename
/// starts with the replay's stem wins. The tie-break is a behavioral
/// contract inherited from the log producer: when stems share a prefix
/// (`match1` / `match10`), the first textual match binds, even if a later
/// metadata file is the exact companion. See the prefix-ambiguity test.
pub fn pair_replay_files(cfg: &GrdConfig, file_paths: &[String]) -> Vec<ReplayFilePair> {
    let mut rep_paths = Vec::new();
    let mut txt_paths = Vec::new();
    for path in file_paths {
        if path.ends_with(".rep") {
            rep_paths.push(path.as_str());
        } else if path.ends_with(".txt") {
            txt_paths.push(path.as_str());
        }
    }

    let mut pairs = Vec::new();
    for rep_path in rep_paths {
        let rep_base = basename(rep_path);
        let stem = &rep_base[..rep_base.len() - 4];

        let matched = txt_paths
            .iter()
            .find(|txt| basename(txt).starts_with(stem));
        let Some(txt_path) = matched else {
            continue;
        };

        pairs.push(ReplayFilePair {
            rep_file: rep_base.to_string(),
            txt_file: basename(txt_path).to_string(),
            rep_path: rep_path.to_string(),
            txt_path: txt_path.to_string(),
            rep_url: remote_url(&cfg.base_origin, rep_path),
            txt_url: remote_url(&cfg.base_origin, txt_path),
        });
    }
    pairs
}
