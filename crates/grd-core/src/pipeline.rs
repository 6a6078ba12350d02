//! Pipeline orchestrator.
//!
//! Sequences the three fetch rounds strictly: plan window → fetch + parse
//! logs → time-filter + pair → check metadata → download replays → write to
//! disk. Rounds never overlap; all parsing and filtering is synchronous work
//! done after a round drains. An empty result at any stage short-circuits to
//! the summary — a normal terminal, not a failure.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::config::GrdConfig;
use crate::fetch::{self, FetchProgress, FetchTask};
use crate::log_parse::{self, UploadRecord};
use crate::pairing::{self, ReplayFilePair};
use crate::storage;
use crate::window::{self, TimeWindow};

/// The three fetch rounds, for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Logs,
    Metadata,
    Replays,
}

/// Reporting side channel for the CLI. Purely informational; the pipeline's
/// behavior does not depend on what the consumer does with these.
#[derive(Debug, Clone, Copy)]
pub enum PipelineEvent {
    StageStarted { stage: Stage, total: usize },
    Progress { stage: Stage, progress: FetchProgress },
    /// Candidate replays sharing a target basename; they will be renamed
    /// with a counter suffix at write time.
    DuplicateNames { count: usize },
}

/// Per-stage counts accumulated across one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub log_resources: usize,
    pub logs_fetched: usize,
    pub logs_failed: usize,
    pub uploads_in_window: usize,
    pub pairs: usize,
    pub metadata_checked: usize,
    pub metadata_failed: usize,
    pub candidates: usize,
    pub duplicate_names: usize,
    pub downloaded: usize,
    pub download_failed: usize,
}

/// Parses an `uploadtime:` value as a GMT instant. The logs use
/// `YYYY-MM-DD HH:MM:SS`; RFC 3339 is accepted as a fallback.
pub fn parse_upload_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Content predicate for a fetched metadata body.
///
/// The excluded marker is a superstring of the required one, so the excluded
/// check must be explicit: a bundled-edition metadata file contains the
/// required marker as a substring and still has to be rejected.
pub fn metadata_matches(cfg: &GrdConfig, body: &str) -> bool {
    body.contains(&cfg.required_game_version)
        && !body.contains(&cfg.excluded_game_version)
        && body.contains(&cfg.required_install_type)
}

/// Runs the full pipeline for `window`, writing replays under `output_dir`.
///
/// Per-item failures (fetch errors, malformed records, unpairable replays,
/// rejected metadata) are counted and skipped; only the summary is returned.
pub async fn run_pipeline(
    cfg: &GrdConfig,
    client: &reqwest::Client,
    window: &TimeWindow,
    output_dir: &Path,
    report: &mut dyn FnMut(PipelineEvent),
) -> Result<PipelineSummary> {
    let mut summary = PipelineSummary::default();

    // Stage: plan window. Pure computation, no network.
    let resources = window::plan_log_resources(cfg, window);
    summary.log_resources = resources.len();
    if resources.is_empty() {
        return Ok(summary);
    }

    // Stage: fetch logs, parse, time-filter.
    report(PipelineEvent::StageStarted {
        stage: Stage::Logs,
        total: resources.len(),
    });
    let tasks: Vec<FetchTask> = resources
        .iter()
        .map(|r| FetchTask::new(r.url.clone()))
        .collect();
    let mut observer = |progress: FetchProgress| {
        report(PipelineEvent::Progress {
            stage: Stage::Logs,
            progress,
        });
    };
    let outcomes = fetch::fetch_all(
        client,
        &tasks,
        cfg.max_concurrent_downloads,
        Some(&mut observer),
    )
    .await;

    let mut uploads: Vec<UploadRecord> = Vec::new();
    for (resource, outcome) in resources.iter().zip(&outcomes) {
        match outcome {
            Ok(body) => {
                summary.logs_fetched += 1;
                let body = String::from_utf8_lossy(body);
                for record in log_parse::parse_log(&body, resource) {
                    // Record time decides inclusion, not the bucket: a
                    // bucket overlapping the window can still hold records
                    // outside it.
                    match parse_upload_time(&record.upload_time) {
                        Some(t) if window.contains(t) => uploads.push(record),
                        Some(_) => {}
                        None => {
                            tracing::debug!(
                                log = %resource.filename,
                                uploadtime = %record.upload_time,
                                "dropping record with unparseable uploadtime"
                            );
                        }
                    }
                }
            }
            Err(e) => {
                summary.logs_failed += 1;
                tracing::warn!(log = %resource.filename, error = %e, "log fetch failed");
            }
        }
    }
    summary.uploads_in_window = uploads.len();
    if uploads.is_empty() {
        return Ok(summary);
    }

    // Stage: flatten pairs.
    let pairs: Vec<ReplayFilePair> = uploads
        .iter()
        .flat_map(|u| pairing::pair_replay_files(cfg, &u.file_paths))
        .collect();
    summary.pairs = pairs.len();
    if pairs.is_empty() {
        return Ok(summary);
    }

    // Stage: fetch metadata, apply content predicate.
    report(PipelineEvent::StageStarted {
        stage: Stage::Metadata,
        total: pairs.len(),
    });
    let tasks: Vec<FetchTask> = pairs
        .iter()
        .map(|p| FetchTask::new(p.txt_url.clone()))
        .collect();
    let mut observer = |progress: FetchProgress| {
        report(PipelineEvent::Progress {
            stage: Stage::Metadata,
            progress,
        });
    };
    let outcomes = fetch::fetch_all(
        client,
        &tasks,
        cfg.max_concurrent_downloads,
        Some(&mut observer),
    )
    .await;

    let mut candidates: Vec<ReplayFilePair> = Vec::new();
    for (pair, outcome) in pairs.into_iter().zip(&outcomes) {
        summary.metadata_checked += 1;
        match outcome {
            Ok(body) => {
                if metadata_matches(cfg, &String::from_utf8_lossy(body)) {
                    candidates.push(pair);
                }
            }
            Err(e) => {
                // Cannot be validated, so not included.
                summary.metadata_failed += 1;
                tracing::warn!(file = %pair.txt_file, error = %e, "metadata fetch failed");
            }
        }
    }
    summary.candidates = candidates.len();
    if candidates.is_empty() {
        return Ok(summary);
    }

    // Stage: download replays and write to disk.
    let unique_names: HashSet<&str> = candidates.iter().map(|p| p.rep_file.as_str()).collect();
    summary.duplicate_names = candidates.len() - unique_names.len();
    if summary.duplicate_names > 0 {
        report(PipelineEvent::DuplicateNames {
            count: summary.duplicate_names,
        });
    }

    report(PipelineEvent::StageStarted {
        stage: Stage::Replays,
        total: candidates.len(),
    });
    let tasks: Vec<FetchTask> = candidates
        .iter()
        .map(|p| FetchTask::new(p.rep_url.clone()))
        .collect();
    let mut observer = |progress: FetchProgress| {
        report(PipelineEvent::Progress {
            stage: Stage::Replays,
            progress,
        });
    };
    let outcomes = fetch::fetch_all(
        client,
        &tasks,
        cfg.max_concurrent_downloads,
        Some(&mut observer),
    )
    .await;

    // Writes happen here, one at a time: unique_target_path's check-then-write
    // is racy if two writers target the same directory concurrently.
    for (pair, outcome) in candidates.iter().zip(&outcomes) {
        match outcome {
            Ok(body) => match storage::write_replay(output_dir, &pair.rep_file, body) {
                Ok(path) => {
                    summary.downloaded += 1;
                    tracing::debug!(path = %path.display(), "replay written");
                }
                Err(e) => {
                    summary.download_failed += 1;
                    tracing::error!(file = %pair.rep_file, error = %e, "replay write failed");
                }
            },
            Err(e) => {
                summary.download_failed += 1;
                tracing::warn!(file = %pair.rep_file, error = %e, "replay fetch failed");
            }
        }
    }

    Ok(summary)
}
