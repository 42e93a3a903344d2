//! Report encoding
//!
//! This module turns a metrics bundle into a serializable activity report and
//! a plain-text summary. The bundle is only read, never modified.

use crate::error::ComputeError;
use crate::series::repository_breakdown;
use crate::types::{
    ActivityReport, CommitEvent, MetricsBundle, ReportMetrics, ReportProducer, ReportTotals,
};
use crate::window::ActivityWindow;
use crate::{ANVIL_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build an activity report for the window
    pub fn encode(
        &self,
        bundle: &MetricsBundle,
        events: &[CommitEvent],
        window: &ActivityWindow,
    ) -> ActivityReport {
        let repositories = repository_breakdown(events);

        ActivityReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ANVIL_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            subject: window.subject.clone(),
            window_days: window.window_days,
            window_start_utc: window.cutoff().to_rfc3339(),
            computed_at_utc: Utc::now().to_rfc3339(),
            totals: ReportTotals {
                commits: bundle.series.total_commits(),
                active_days: bundle.active_days(),
                repositories: repositories.len(),
            },
            metrics: ReportMetrics {
                pulse: bundle.pulse,
                activity_heat: bundle.activity_heat,
                strikes: bundle.strikes,
                consistency_score: bundle.consistency_score,
            },
            repositories,
            daily: bundle.daily_points(),
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        bundle: &MetricsBundle,
        events: &[CommitEvent],
        window: &ActivityWindow,
    ) -> Result<String, ComputeError> {
        let report = self.encode(bundle, events, window);
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }
}

/// Render a human-readable summary of a report
pub fn render_text(report: &ActivityReport) -> String {
    let strikes = report
        .metrics
        .strikes
        .map(|s| format!("{s:.4}"))
        .unwrap_or_else(|| "n/a".to_string());

    let lines = [
        format!(
            "Activity for {} (last {} days)",
            report.subject, report.window_days
        ),
        format!(
            "Commits: {} across {} active days in {} repositories",
            report.totals.commits, report.totals.active_days, report.totals.repositories
        ),
        "Metrics:".to_string(),
        format!("  Pulse:             {:.4}", report.metrics.pulse),
        format!("  Activity Heat:     {:.4}", report.metrics.activity_heat),
        format!("  Strikes:           {strikes}"),
        format!(
            "  Consistency Score: {:.2}",
            report.metrics.consistency_score
        ),
    ];

    lines.join("\n") + "\n"
}
