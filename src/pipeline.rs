//! Pipeline orchestration
//!
//! This module provides the public API for CodeAnvil.
//! It orchestrates the full pipeline from a fetched feed to an activity report.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::adapters::{EventFeedAdapter, GitHubEventsAdapter};
use crate::encoder::ReportEncoder;
use crate::error::ComputeError;
use crate::metrics::compute_metrics;
use crate::series::build_daily_series;
use crate::types::{ActivityReport, CommitEvent, MetricsBundle};
use crate::window::ActivityWindow;

/// Compute metrics for commit events that are already filtered to a window
pub fn analyze(events: &[CommitEvent]) -> Result<MetricsBundle, ComputeError> {
    let series = build_daily_series(events);
    debug!(
        events = events.len(),
        active_days = series.len(),
        "built daily series"
    );
    compute_metrics(&series)
}

/// Convert a page of GitHub user events to a JSON activity report.
///
/// # Arguments
/// * `raw_json` - Raw `/users/{user}/events` response JSON
/// * `subject` - GitHub login the feed belongs to
/// * `window_days` - Trailing window in days, ending now
///
/// # Example
/// ```ignore
/// let report_json = github_events_to_report(events_json, "octocat".to_string(), 30)?;
/// ```
pub fn github_events_to_report(
    raw_json: String,
    subject: String,
    window_days: u32,
) -> Result<String, ComputeError> {
    let window = ActivityWindow::new(subject, window_days)?;
    let processor = ActivityProcessor::new();
    let report = processor.report(&GitHubEventsAdapter, &raw_json, &window)?;
    serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
}

/// Processor that runs feeds through the pipeline with a single report encoder.
///
/// Pipeline stages:
/// 1. EventFeedAdapter - Parse the feed and keep commits inside the window
/// 2. build_daily_series - Count commits per active day
/// 3. compute_metrics - Derive the per-day series and scalar indicators
/// 4. ReportEncoder - Assemble the report
pub struct ActivityProcessor {
    encoder: ReportEncoder,
}

impl Default for ActivityProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityProcessor {
    /// Create a new processor with default settings
    pub fn new() -> Self {
        Self {
            encoder: ReportEncoder::new(),
        }
    }

    /// Create a processor with a specific encoder
    pub fn with_encoder(encoder: ReportEncoder) -> Self {
        Self { encoder }
    }

    /// Run one feed through the pipeline for one window
    pub fn report(
        &self,
        adapter: &dyn EventFeedAdapter,
        raw_json: &str,
        window: &ActivityWindow,
    ) -> Result<ActivityReport, ComputeError> {
        let events = adapter.parse(raw_json, window)?;
        info!(
            feed = adapter.name(),
            subject = %window.subject,
            window_days = window.window_days,
            commits = events.len(),
            "parsed feed"
        );

        self.report_events(&events, window)
    }

    /// Build a report from commit events already filtered to `window`
    pub fn report_events(
        &self,
        events: &[CommitEvent],
        window: &ActivityWindow,
    ) -> Result<ActivityReport, ComputeError> {
        let bundle = analyze(events)?;
        Ok(self.encoder.encode(&bundle, events, window))
    }

    /// Run one feed through the pipeline for several trailing windows ending
    /// at the same instant, e.g. a weekly and a monthly view.
    ///
    /// Each window is computed independently and yields its own result, in
    /// the order given. A window without commits is `Err(EmptySeries)` and
    /// does not affect the others.
    pub fn report_windows(
        &self,
        adapter: &dyn EventFeedAdapter,
        raw_json: &str,
        subject: &str,
        windows: &[u32],
        now: DateTime<Utc>,
    ) -> Vec<Result<ActivityReport, ComputeError>> {
        windows
            .iter()
            .map(|&days| {
                let window = ActivityWindow::ending_at(subject, days, now)?;
                self.report(adapter, raw_json, &window)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::GitHubCommitsAdapter;
    use crate::schema::RawEventAdapter;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()
    }

    fn sample_events_json() -> &'static str {
        r#"[
            {
                "type": "PushEvent",
                "repo": {"name": "octocat/hello-world"},
                "payload": {"commits": [{"sha": "a1"}, {"sha": "a2"}]},
                "created_at": "2024-01-30T09:00:00Z"
            },
            {
                "type": "PushEvent",
                "repo": {"name": "octocat/hello-world"},
                "payload": {"commits": [{"sha": "b1"}]},
                "created_at": "2024-01-29T18:00:00Z"
            },
            {
                "type": "IssuesEvent",
                "repo": {"name": "octocat/hello-world"},
                "payload": {"action": "opened"},
                "created_at": "2024-01-28T10:00:00Z"
            },
            {
                "type": "PushEvent",
                "repo": {"name": "octocat/dotfiles"},
                "payload": {"commits": [{"sha": "c1"}, {"sha": "c2"}, {"sha": "c3"}]},
                "created_at": "2024-01-27T07:30:00Z"
            },
            {
                "type": "PushEvent",
                "repo": {"name": "octocat/dotfiles"},
                "payload": {"commits": [{"sha": "d1"}]},
                "created_at": "2024-01-10T07:30:00Z"
            }
        ]"#
    }

    #[test]
    fn test_analyze() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        let events = vec![
            CommitEvent::new("a", day(4)),
            CommitEvent::new("a", day(1)),
            CommitEvent::new("b", day(1)),
            CommitEvent::new("a", day(2)),
        ];

        let bundle = analyze(&events).unwrap();
        assert_eq!(bundle.time_gaps, vec![1, 1, 2]);
        assert_eq!(bundle.series.total_commits(), 4);
    }

    #[test]
    fn test_analyze_empty() {
        assert!(matches!(analyze(&[]), Err(ComputeError::EmptySeries)));
    }

    #[test]
    fn test_report_from_github_events() {
        let processor =
            ActivityProcessor::with_encoder(ReportEncoder::with_instance_id("t".to_string()));
        let window = ActivityWindow::ending_at("octocat", 7, now()).unwrap();

        let report = processor
            .report(&GitHubEventsAdapter, sample_events_json(), &window)
            .unwrap();

        assert_eq!(report.totals.commits, 6);
        assert_eq!(report.totals.active_days, 3);
        assert_eq!(report.repositories.get("octocat/dotfiles"), Some(&3));
        let gaps: Vec<i64> = report.daily.iter().map(|p| p.time_gap).collect();
        assert_eq!(gaps, vec![1, 2, 1]);
    }

    #[test]
    fn test_weekly_and_monthly_windows() {
        let processor = ActivityProcessor::new();
        let reports = processor
            .report_windows(
                &GitHubEventsAdapter,
                sample_events_json(),
                "octocat",
                &[7, 30],
                now(),
            )
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].window_days, 7);
        assert_eq!(reports[0].totals.commits, 6);
        assert_eq!(reports[1].window_days, 30);
        assert_eq!(reports[1].totals.commits, 7);
        assert!(reports[1].metrics.consistency_score < reports[0].metrics.consistency_score);
    }

    #[test]
    fn test_quiet_week_keeps_monthly_report() {
        let json = r#"[
            {
                "type": "PushEvent",
                "repo": {"name": "octocat/hello-world"},
                "payload": {"commits": [{"sha": "e1"}, {"sha": "e2"}]},
                "created_at": "2024-01-15T09:00:00Z"
            },
            {
                "type": "PushEvent",
                "repo": {"name": "octocat/hello-world"},
                "payload": {"commits": [{"sha": "f1"}]},
                "created_at": "2024-01-12T09:00:00Z"
            }
        ]"#;

        let processor = ActivityProcessor::new();
        let results =
            processor.report_windows(&GitHubEventsAdapter, json, "octocat", &[7, 30], now());

        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(ComputeError::EmptySeries)));
        let monthly = results[1].as_ref().unwrap();
        assert_eq!(monthly.window_days, 30);
        assert_eq!(monthly.totals.commits, 3);
        assert_eq!(monthly.totals.active_days, 2);
    }

    #[test]
    fn test_invalid_window_only_fails_that_window() {
        let processor = ActivityProcessor::new();
        let results = processor.report_windows(
            &GitHubEventsAdapter,
            sample_events_json(),
            "octocat",
            &[0, 7],
            now(),
        );

        assert!(matches!(results[0], Err(ComputeError::InvalidWindow(_))));
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_window_without_commits() {
        let processor = ActivityProcessor::new();
        let window = ActivityWindow::ending_at(
            "octocat",
            7,
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let result = processor.report(&GitHubEventsAdapter, sample_events_json(), &window);
        assert!(matches!(result, Err(ComputeError::EmptySeries)));
    }

    #[test]
    fn test_report_from_commits_listing() {
        let json = r#"[
            {"sha": "1", "commit": {"author": {"date": "2024-01-30T10:00:00Z"}}},
            {"sha": "2", "commit": {"author": {"date": "2024-01-30T08:00:00Z"}}}
        ]"#;

        let processor = ActivityProcessor::new();
        let window = ActivityWindow::ending_at("octocat", 7, now()).unwrap();
        let report = processor
            .report(&GitHubCommitsAdapter::new("octocat/solo"), json, &window)
            .unwrap();

        assert_eq!(report.totals.active_days, 1);
        assert!(report.metrics.strikes.is_none());
    }

    #[test]
    fn test_report_from_raw_events() {
        let ndjson = r#"{"schema_version":"commit.raw_event.v1","timestamp":"2024-01-29T08:00:00Z","repository":"acme/api"}
{"schema_version":"commit.raw_event.v1","timestamp":"2024-01-30T08:00:00Z","repository":"acme/api"}"#;

        let processor = ActivityProcessor::new();
        let window = ActivityWindow::ending_at("octocat", 7, now()).unwrap();
        let report = processor.report(&RawEventAdapter, ndjson, &window).unwrap();

        assert_eq!(report.totals.commits, 2);
        assert_eq!(report.daily[1].time_gap, 1);
    }

    #[test]
    fn test_github_events_to_report_invalid_json() {
        let result =
            github_events_to_report("not valid json".to_string(), "octocat".to_string(), 30);
        assert!(result.is_err());
    }
}
