//! Bounded-concurrency fetch pool.
//!
//! One pool implementation drives all three fetch rounds (logs, metadata,
//! replays). Tasks go in as a list, outcomes come out index-aligned with the
//! input; completion order is never relied on for correlation.

mod pool;

pub use pool::{fetch_all, FetchProgress};

use std::time::Duration;

use anyhow::Result;
use thiserror::Error;

use crate::config::GrdConfig;

/// Why a single fetch failed. Classified and counted, never propagated as a
/// pipeline-aborting error.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure: connect error, timeout, redirect limit.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Response arrived with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u16),
    /// The pool was torn down before the task produced a result. Should not
    /// happen in normal operation; exists so every task has exactly one outcome.
    #[error("task was cancelled before completing")]
    Cancelled,
}

/// Terminal result of one fetch task: the full response body, or a reason.
pub type FetchOutcome = Result<Vec<u8>, FetchError>;

/// One unit of work for the pool. Correlation back to the owning pair or log
/// resource is by submission index, so the task itself only carries the URL.
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub url: String,
}

impl FetchTask {
    pub fn new(url: impl Into<String>) -> Self {
        FetchTask { url: url.into() }
    }
}

/// Builds the shared HTTP client. Timeout and redirect cap are fixed
/// client-level configuration, identical for every task in every round.
pub fn build_client(cfg: &GrdConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(cfg.max_redirects))
        .user_agent(cfg.user_agent.clone())
        .build()?;
    Ok(client)
}

async fn fetch_one(client: &reqwest::Client, url: &str) -> FetchOutcome {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }
    let body = response.bytes().await?;
    Ok(body.to_vec())
}
