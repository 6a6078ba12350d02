//! Time window and log resource planning.
//!
//! The log server publishes one resource per 10-minute bucket, named from the
//! bucket-start instant in GMT. Planning is pure computation: given a window
//! it returns the contiguous ascending run of bucket resources that could
//! contain records inside the window, with at most one bucket strictly
//! before `window.start` (records are flushed into the bucket whose start
//! precedes them, so the planner backs up one bucket to avoid missing any).

use chrono::{DateTime, Duration, Utc};

use crate::config::GrdConfig;

/// Bucket width of the remote log cadence.
pub const BUCKET_MINUTES: i64 = 10;

const BUCKET_SECS: i64 = BUCKET_MINUTES * 60;

/// Closed time window `[start, end]`, both GMT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window ending now (GMT) and starting `hours` hours earlier.
    /// `hours` has already been validated positive by the CLI.
    pub fn last_hours(hours: u64) -> Self {
        let end = Utc::now();
        let start = end - Duration::hours(hours as i64);
        TimeWindow { start, end }
    }

    /// True if `t` lies inside the window, bounds inclusive.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// One remote log resource, generated by the planner and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogResourceRef {
    /// `uploads_{YYYYMMDD}_{HHMMSS}.yaml.txt`
    pub filename: String,
    pub url: String,
    pub bucket_start: DateTime<Utc>,
}

/// Floors `t` to the start of its 10-minute bucket (seconds zeroed).
fn floor_to_bucket(t: DateTime<Utc>) -> DateTime<Utc> {
    let into_bucket = t.timestamp().rem_euclid(BUCKET_SECS);
    t - Duration::seconds(into_bucket) - Duration::nanoseconds(t.timestamp_subsec_nanos() as i64)
}

fn log_resource_at(cfg: &GrdConfig, bucket_start: DateTime<Utc>) -> LogResourceRef {
    let filename = format!("uploads_{}.yaml.txt", bucket_start.format("%Y%m%d_%H%M%S"));
    let url = format!(
        "{}/{}/{}/{}",
        cfg.logs_origin.trim_end_matches('/'),
        bucket_start.format("%Y_%m"),
        bucket_start.format("%d"),
        filename
    );
    LogResourceRef {
        filename,
        url,
        bucket_start,
    }
}

/// Enumerates the log resources whose buckets could overlap `window`.
///
/// Backs up to the bucket at-or-before `window.start`, then steps forward in
/// bucket-sized increments until past `window.end`. The trailing filter keeps
/// only the first bucket at-or-before `window.start` from the pre-window
/// region; everything later (up to `window.end`) is kept unconditionally.
pub fn plan_log_resources(cfg: &GrdConfig, window: &TimeWindow) -> Vec<LogResourceRef> {
    let mut current = floor_to_bucket(window.start);
    // A floor can never land after its input; guard the equality edge anyway.
    if current > window.start {
        current = current - Duration::minutes(BUCKET_MINUTES);
    }

    let mut resources = Vec::new();
    while current <= window.end {
        resources.push(log_resource_at(cfg, current));
        current = current + Duration::minutes(BUCKET_MINUTES);
    }

    // Generation order is already ascending; sort defensively since the
    // "first relevant bucket" filter below depends on it.
    resources.sort_by_key(|r| r.bucket_start);

    let mut filtered = Vec::with_capacity(resources.len());
    let mut added_first_relevant = false;
    for resource in resources {
        if resource.bucket_start > window.end {
            continue;
        }
        if !added_first_relevant {
            if resource.bucket_start <= window.start {
                filtered.push(resource);
                added_first_relevant = true;
            }
        } else {
            filtered.push(resource);
        }
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn cfg() -> GrdConfig {
        GrdConfig::default()
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, h, m, s).unwrap()
    }

    #[test]
    fn buckets_are_aligned_and_ascending() {
        let window = TimeWindow {
            start: at(12, 7, 31),
            end: at(14, 2, 5),
        };
        let resources = plan_log_resources(&cfg(), &window);
        assert!(!resources.is_empty());
        for r in &resources {
            assert_eq!(r.bucket_start.minute() % 10, 0);
            assert_eq!(r.bucket_start.second(), 0);
        }
        for pair in resources.windows(2) {
            assert!(pair[0].bucket_start < pair[1].bucket_start);
        }
    }

    #[test]
    fn first_bucket_covers_window_start_and_last_is_within_end() {
        let window = TimeWindow {
            start: at(12, 7, 31),
            end: at(14, 2, 5),
        };
        let resources = plan_log_resources(&cfg(), &window);
        let first = resources.first().unwrap();
        let last = resources.last().unwrap();
        assert!(first.bucket_start <= window.start);
        assert!(window.start - first.bucket_start < Duration::minutes(BUCKET_MINUTES));
        assert!(last.bucket_start <= window.end);
        assert!(last.bucket_start + Duration::minutes(BUCKET_MINUTES) > window.end);
    }

    #[test]
    fn aligned_start_keeps_its_own_bucket() {
        let window = TimeWindow {
            start: at(12, 10, 0),
            end: at(12, 25, 0),
        };
        let resources = plan_log_resources(&cfg(), &window);
        let starts: Vec<u32> = resources.iter().map(|r| r.bucket_start.minute()).collect();
        assert_eq!(starts, vec![10, 20]);
        assert_eq!(resources[0].bucket_start, window.start);
    }

    #[test]
    fn twenty_minute_window_spans_three_buckets() {
        let window = TimeWindow {
            start: at(12, 5, 0),
            end: at(12, 25, 0),
        };
        let resources = plan_log_resources(&cfg(), &window);
        let starts: Vec<u32> = resources.iter().map(|r| r.bucket_start.minute()).collect();
        assert_eq!(starts, vec![0, 10, 20]);
    }

    #[test]
    fn url_encodes_bucket_start_in_gmt() {
        let window = TimeWindow {
            start: at(9, 3, 12),
            end: at(9, 3, 12),
        };
        let resources = plan_log_resources(&cfg(), &window);
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].filename, "uploads_20240115_090000.yaml.txt");
        assert_eq!(
            resources[0].url,
            "https://www.gentool.net/data/zh/logs/2024_01/15/uploads_20240115_090000.yaml.txt"
        );
    }

    #[test]
    fn window_crossing_midnight_changes_day_segment() {
        let window = TimeWindow {
            start: Utc.with_ymd_and_hms(2024, 1, 15, 23, 55, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 1, 16, 0, 5, 0).unwrap(),
        };
        let resources = plan_log_resources(&cfg(), &window);
        assert_eq!(resources.len(), 2);
        assert!(resources[0].url.contains("/2024_01/15/"));
        assert!(resources[1].url.contains("/2024_01/16/"));
        assert_eq!(resources[1].filename, "uploads_20240116_000000.yaml.txt");
    }

    #[test]
    fn subsecond_start_is_floored_cleanly() {
        let start = at(12, 0, 0) + Duration::milliseconds(250);
        let window = TimeWindow {
            start,
            end: start + Duration::minutes(1),
        };
        let resources = plan_log_resources(&cfg(), &window);
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].bucket_start, at(12, 0, 0));
    }

    #[test]
    fn window_contains_is_inclusive() {
        let window = TimeWindow {
            start: at(12, 0, 0),
            end: at(13, 0, 0),
        };
        assert!(window.contains(window.start));
        assert!(window.contains(window.end));
        assert!(!window.contains(window.end + Duration::seconds(1)));
        assert!(!window.contains(window.start - Duration::seconds(1)));
    }
}
