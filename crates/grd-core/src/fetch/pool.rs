//! Pool driver: keeps up to `concurrency` requests in flight, refilling as
//! tasks complete, until the queue drains.

use tokio::task::JoinSet;

use super::{fetch_one, FetchError, FetchOutcome, FetchTask};

/// Completion counters handed to the progress observer after every task.
#[derive(Debug, Clone, Copy)]
pub struct FetchProgress {
    /// Tasks that have reached a terminal outcome so far (success or failure).
    pub done: usize,
    pub total: usize,
    pub failed: usize,
}

/// Runs every task with at most `concurrency` requests in flight at once.
///
/// Returns one outcome per task, index-aligned with `tasks`. A slow or
/// failing task occupies one slot and never blocks unrelated tasks. The
/// observer is a reporting side channel only; it runs on the driving task
/// between completions and cannot affect scheduling or outcome delivery.
pub async fn fetch_all(
    client: &reqwest::Client,
    tasks: &[FetchTask],
    concurrency: usize,
    mut observer: Option<&mut dyn FnMut(FetchProgress)>,
) -> Vec<FetchOutcome> {
    let concurrency = concurrency.max(1);
    let total = tasks.len();
    let mut outcomes: Vec<Option<FetchOutcome>> = std::iter::repeat_with(|| None)
        .take(total)
        .collect();

    let mut join_set = JoinSet::new();
    let mut next = 0usize;
    let mut done = 0usize;
    let mut failed = 0usize;

    loop {
        while join_set.len() < concurrency && next < total {
            let client = client.clone();
            let url = tasks[next].url.clone();
            let index = next;
            join_set.spawn(async move { (index, fetch_one(&client, &url).await) });
            next += 1;
        }

        let Some(joined) = join_set.join_next().await else {
            break;
        };
        let (index, outcome) = match joined {
            Ok(pair) => pair,
            // A panicked fetch task loses its index; the slot is backfilled
            // as Cancelled after the drain so the alignment contract holds.
            Err(e) => {
                tracing::error!(error = %e, "fetch task aborted");
                continue;
            }
        };

        done += 1;
        if outcome.is_err() {
            failed += 1;
        }
        tracing::debug!(url = %tasks[index].url, ok = outcome.is_ok(), "fetch finished");
        outcomes[index] = Some(outcome);

        if let Some(observer) = observer.as_deref_mut() {
            observer(FetchProgress {
                done,
                total,
                failed,
            });
        }
    }

    outcomes
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(FetchError::Cancelled)))
        .collect()
}
