//! GitHub repository commits adapter
//!
//! Parses pages of the `/repos/{owner}/{repo}/commits` listing, where each
//! item is one commit dated by its author timestamp.

use serde::Deserialize;
use tracing::warn;

use super::{parse_github_time, EventFeedAdapter};
use crate::error::ComputeError;
use crate::types::CommitEvent;
use crate::window::ActivityWindow;

/// Per-repository commits listing adapter
pub struct GitHubCommitsAdapter {
    repository: String,
}

impl GitHubCommitsAdapter {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
        }
    }
}

impl EventFeedAdapter for GitHubCommitsAdapter {
    fn name(&self) -> &'static str {
        "github-commits"
    }

    fn parse(
        &self,
        raw_json: &str,
        window: &ActivityWindow,
    ) -> Result<Vec<CommitEvent>, ComputeError> {
        let items: Vec<GitHubCommitItem> = serde_json::from_str(raw_json)?;
        let mut commits = Vec::with_capacity(items.len());

        for item in items {
            let Some(date_str) = item.commit.author.and_then(|a| a.date) else {
                warn!(sha = ?item.sha, "commit without author date, skipping");
                continue;
            };

            let authored_at = parse_github_time(&date_str)?;
            // Listing order follows history, not author time, so filter rather than stop
            if window.contains(authored_at) {
                commits.push(CommitEvent::new(
                    self.repository.clone(),
                    authored_at.date_naive(),
                ));
            }
        }

        Ok(commits)
    }
}

// GitHub commits API structures

#[derive(Debug, Deserialize)]
struct GitHubCommitItem {
    sha: Option<String>,
    commit: GitHubCommitDetail,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitDetail {
    author: Option<GitHubSignature>,
}

#[derive(Debug, Deserialize)]
struct GitHubSignature {
    date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn window() -> ActivityWindow {
        ActivityWindow::ending_at(
            "octocat",
            30,
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_commits_listing() {
        let json = r#"[
            {"sha": "c3", "commit": {"author": {"name": "Octo", "date": "2024-01-30T10:00:00Z"}, "message": "c"}},
            {"sha": "c2", "commit": {"author": {"name": "Octo", "date": "2023-11-01T10:00:00Z"}, "message": "b"}},
            {"sha": "c1", "commit": {"author": {"name": "Octo", "date": "2024-01-05T10:00:00Z"}, "message": "a"}},
            {"sha": "c0", "commit": {"author": null, "message": "detached"}}
        ]"#;

        let adapter = GitHubCommitsAdapter::new("octocat/hello-world");
        let commits = adapter.parse(json, &window()).unwrap();

        assert_eq!(commits.len(), 2);
        assert!(commits.iter().all(|c| c.repository == "octocat/hello-world"));
        assert_eq!(commits[0].date, NaiveDate::from_ymd_opt(2024, 1, 30).unwrap());
        assert_eq!(commits[1].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn test_invalid_json() {
        let adapter = GitHubCommitsAdapter::new("octocat/hello-world");
        assert!(adapter.parse("{", &window()).is_err());
    }
}
