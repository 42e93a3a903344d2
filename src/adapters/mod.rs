//! Event feed adapters
//!
//! This module provides adapters that parse already-fetched activity feeds and
//! map them to commit events inside an activity window. Fetching, pagination
//! and authentication happen upstream.

mod github_commits;
mod github_events;

pub use github_commits::GitHubCommitsAdapter;
pub use github_events::GitHubEventsAdapter;

use chrono::{DateTime, Utc};

use crate::error::ComputeError;
use crate::types::CommitEvent;
use crate::window::ActivityWindow;

/// Trait for event feed adapters
pub trait EventFeedAdapter {
    /// Short feed identifier used in logs and CLI output
    fn name(&self) -> &'static str;

    /// Parse raw JSON and keep the commits that fall inside `window`
    fn parse(
        &self,
        raw_json: &str,
        window: &ActivityWindow,
    ) -> Result<Vec<CommitEvent>, ComputeError>;
}

/// Parse an RFC 3339 timestamp as returned by the GitHub API
pub(crate) fn parse_github_time(time_str: &str) -> Result<DateTime<Utc>, ComputeError> {
    DateTime::parse_from_rfc3339(time_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ComputeError::DateParseError(format!("{time_str}: {e}")))
}
