//! GitHub user events adapter
//!
//! Parses pages of the `/users/{user}/events` feed. Only push events carry
//! commits; each commit in a push counts once, dated by the push time.

use serde::de::IgnoredAny;
use serde::Deserialize;
use tracing::debug;

use super::{parse_github_time, EventFeedAdapter};
use crate::error::ComputeError;
use crate::types::CommitEvent;
use crate::window::ActivityWindow;

const PUSH_EVENT: &str = "PushEvent";

/// GitHub user events feed adapter
pub struct GitHubEventsAdapter;

impl GitHubEventsAdapter {
    /// Parse several feed pages in order, newest page first.
    ///
    /// Reading stops at the first push older than the window cutoff; later
    /// pages are not inspected.
    pub fn parse_pages(
        &self,
        pages: &[&str],
        window: &ActivityWindow,
    ) -> Result<Vec<CommitEvent>, ComputeError> {
        let mut commits = Vec::new();

        for (page_idx, raw_json) in pages.iter().enumerate() {
            if collect_page(raw_json, window, &mut commits)? {
                debug!(page = page_idx, "reached window cutoff");
                break;
            }
        }

        Ok(commits)
    }
}

impl EventFeedAdapter for GitHubEventsAdapter {
    fn name(&self) -> &'static str {
        "github-events"
    }

    fn parse(
        &self,
        raw_json: &str,
        window: &ActivityWindow,
    ) -> Result<Vec<CommitEvent>, ComputeError> {
        let mut commits = Vec::new();
        collect_page(raw_json, window, &mut commits)?;
        Ok(commits)
    }
}

/// Append the in-window commits of one page. Returns true once the cutoff
/// has been reached.
fn collect_page(
    raw_json: &str,
    window: &ActivityWindow,
    commits: &mut Vec<CommitEvent>,
) -> Result<bool, ComputeError> {
    let events: Vec<GitHubEvent> = serde_json::from_str(raw_json)?;

    for event in events {
        if event.event_type != PUSH_EVENT {
            continue;
        }

        let created_at = event
            .created_at
            .as_deref()
            .ok_or_else(|| ComputeError::MissingField("created_at".to_string()))
            .and_then(parse_github_time)?;

        let push_commits = event
            .payload
            .and_then(|p| p.commits)
            .unwrap_or_default();
        if push_commits.is_empty() {
            continue;
        }

        if !window.contains(created_at) {
            return Ok(true);
        }

        let date = created_at.date_naive();
        commits.extend(
            push_commits
                .iter()
                .map(|_| CommitEvent::new(event.repo.name.clone(), date)),
        );
    }

    Ok(false)
}

// GitHub events API structures

#[derive(Debug, Deserialize)]
struct GitHubEvent {
    #[serde(rename = "type")]
    event_type: String,
    repo: GitHubRepo,
    payload: Option<GitHubPushPayload>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubPushPayload {
    commits: Option<Vec<IgnoredAny>>,
}
