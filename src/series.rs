//! Daily series construction
//!
//! Collapses an unordered stream of commit events into one count per active
//! day. Days without commits are absent, not zero-filled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ComputeError;
use crate::types::CommitEvent;

/// Commit count for a single active day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub commits: u32,
}

/// Date-ordered commit counts for active days.
///
/// Dates are strictly increasing and every count is at least one. Both
/// constructors and deserialization enforce this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DailyCount>", into = "Vec<DailyCount>")]
pub struct DailySeries {
    entries: Vec<(NaiveDate, u32)>,
}

impl DailySeries {
    /// Build a series from already-aggregated entries, rejecting unordered,
    /// duplicate or zero-count days
    pub fn from_entries(entries: Vec<(NaiveDate, u32)>) -> Result<Self, ComputeError> {
        let series = Self { entries };
        series.validate()?;
        Ok(series)
    }

    #[cfg(test)]
    pub(crate) fn from_entries_unchecked(entries: Vec<(NaiveDate, u32)>) -> Self {
        Self { entries }
    }

    /// Check the ordering and count invariants
    pub fn validate(&self) -> Result<(), ComputeError> {
        for (position, window) in self.entries.windows(2).enumerate() {
            let (previous, _) = window[0];
            let (current, _) = window[1];
            if current <= previous {
                return Err(ComputeError::NonIncreasingDates {
                    position: position + 1,
                    previous,
                    current,
                });
            }
        }

        if let Some((date, _)) = self.entries.iter().find(|(_, count)| *count == 0) {
            return Err(ComputeError::ZeroCount(*date));
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(date, commits)` pairs in ascending date order
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.entries.iter().map(|(date, _)| *date)
    }

    pub fn counts(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|(_, count)| *count)
    }

    /// Total commits across all active days
    pub fn total_commits(&self) -> u64 {
        self.counts().map(u64::from).sum()
    }
}

impl TryFrom<Vec<DailyCount>> for DailySeries {
    type Error = ComputeError;

    fn try_from(counts: Vec<DailyCount>) -> Result<Self, Self::Error> {
        Self::from_entries(counts.into_iter().map(|c| (c.date, c.commits)).collect())
    }
}

impl From<DailySeries> for Vec<DailyCount> {
    fn from(series: DailySeries) -> Self {
        series
            .entries
            .into_iter()
            .map(|(date, commits)| DailyCount { date, commits })
            .collect()
    }
}

/// Group commit events by calendar day and count them.
///
/// Input order does not matter; the result is sorted ascending by date.
pub fn build_daily_series(events: &[CommitEvent]) -> DailySeries {
    let mut by_date: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for event in events {
        *by_date.entry(event.date).or_insert(0) += 1;
    }

    DailySeries {
        entries: by_date.into_iter().collect(),
    }
}

/// Count commits per repository
pub fn repository_breakdown(events: &[CommitEvent]) -> BTreeMap<String, u32> {
    let mut by_repo: BTreeMap<String, u32> = BTreeMap::new();
    for event in events {
        *by_repo.entry(event.repository.clone()).or_insert(0) += 1;
    }
    by_repo
}
