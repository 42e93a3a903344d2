//! Core types for the CodeAnvil pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: commit events, derived metrics, and the report payload.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ComputeError;
use crate::series::DailySeries;

/// A single commit attributed to a repository on a calendar day
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitEvent {
    /// Repository the commit was pushed to (e.g. "octocat/hello-world")
    pub repository: String,
    /// Calendar date of the commit (UTC)
    pub date: NaiveDate,
}

impl CommitEvent {
    pub fn new(repository: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            repository: repository.into(),
            date,
        }
    }
}

/// Metrics derived from a daily commit series.
///
/// Every per-day vector is aligned with `series`: index `i` refers to the
/// `i`-th active day in ascending date order. Bundles are produced by
/// `compute_metrics` only, so the type is serialize-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsBundle {
    /// Source daily series
    pub series: DailySeries,
    /// Daily counts decayed by active-day position
    pub commit_speed: Vec<f64>,
    /// Exponentially weighted moving average of daily counts
    pub commit_energy: Vec<f64>,
    /// Calendar days since the previous active day (1 for the first day)
    pub time_gaps: Vec<i64>,
    /// Mean of `commit_speed`
    pub pulse: f64,
    /// Mean of `commit_energy`
    pub activity_heat: f64,
    /// Sample standard deviation of `ln(1 + gap)`; `None` with fewer than two active days
    pub strikes: Option<f64>,
    /// `100 / (exp(mean gap) + 1)`, in (0, 50]
    pub consistency_score: f64,
}

impl MetricsBundle {
    /// Number of active days covered by the bundle
    pub fn active_days(&self) -> usize {
        self.series.len()
    }

    /// Strikes, or `InsufficientData` when the series is too short to define it
    pub fn require_strikes(&self) -> Result<f64, ComputeError> {
        self.strikes.ok_or(ComputeError::InsufficientData {
            required: 2,
            actual: self.series.len(),
        })
    }

    /// Per-day view of the bundle, suitable for tabular output or plotting
    pub fn daily_points(&self) -> Vec<DailyPoint> {
        self.series
            .iter()
            .zip(&self.commit_speed)
            .zip(&self.commit_energy)
            .zip(&self.time_gaps)
            .map(
                |((((date, commits), &commit_speed), &commit_energy), &time_gap)| DailyPoint {
                    date,
                    commits,
                    commit_speed,
                    commit_energy,
                    time_gap,
                },
            )
            .collect()
    }
}

/// One row of the derived daily series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub commits: u32,
    pub commit_speed: f64,
    pub commit_energy: f64,
    pub time_gap: i64,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Aggregate counts for the window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTotals {
    pub commits: u64,
    pub active_days: usize,
    pub repositories: usize,
}

/// The four scalar indicators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub pulse: f64,
    pub activity_heat: f64,
    pub strikes: Option<f64>,
    pub consistency_score: f64,
}

/// Complete activity report for one subject and window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub subject: String,
    pub window_days: u32,
    pub window_start_utc: String,
    pub computed_at_utc: String,
    pub totals: ReportTotals,
    pub metrics: ReportMetrics,
    pub repositories: BTreeMap<String, u32>,
    pub daily: Vec<DailyPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute_metrics;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_daily_points_align_with_series() {
        let series = DailySeries::from_entries(vec![(day(1), 2), (day(2), 1), (day(4), 3)]).unwrap();
        let bundle = compute_metrics(&series).unwrap();

        let points = bundle.daily_points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].date, day(4));
        assert_eq!(points[2].commits, 3);
        assert_eq!(points[2].time_gap, 2);
        assert_eq!(points[1].commit_energy, bundle.commit_energy[1]);
    }

    #[test]
    fn test_daily_points_with_short_derived_series() {
        let series = DailySeries::from_entries(vec![(day(1), 2), (day(2), 1)]).unwrap();
        let bundle = MetricsBundle {
            series,
            commit_speed: vec![2.0],
            commit_energy: vec![2.0, 1.75],
            time_gaps: vec![1, 1],
            pulse: 2.0,
            activity_heat: 1.875,
            strikes: Some(0.0),
            consistency_score: 26.894142136999512,
        };

        let points = bundle.daily_points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, day(1));
    }
}
