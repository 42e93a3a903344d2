//! Adapter for converting commit.raw_event.v1 records to commit events

use tracing::debug;

use crate::adapters::EventFeedAdapter;
use crate::error::ComputeError;
use crate::schema::raw_event::*;
use crate::types::CommitEvent;
use crate::window::ActivityWindow;

/// Adapter for converting raw events to commit events
pub struct RawEventAdapter;

impl RawEventAdapter {
    /// Parse a JSON string containing an array of RawCommitEvents
    pub fn parse_array(json: &str) -> Result<Vec<RawCommitEvent>, ComputeError> {
        let events: Vec<RawCommitEvent> = serde_json::from_str(json)?;
        Ok(events)
    }

    /// Parse NDJSON (newline-delimited JSON) containing RawCommitEvents
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawCommitEvent>, ComputeError> {
        let mut events = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawCommitEvent>(trimmed) {
                Ok(event) => events.push(event),
                Err(e) => {
                    return Err(ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(events)
    }

    /// Parse either a JSON array or NDJSON, decided by the first non-blank byte
    pub fn parse_any(raw: &str) -> Result<Vec<RawCommitEvent>, ComputeError> {
        if raw.trim_start().starts_with('[') {
            Self::parse_array(raw)
        } else {
            Self::parse_ndjson(raw)
        }
    }

    /// Convert raw events to commit events inside the window.
    ///
    /// Raw events carry no ordering guarantee, so out-of-window events are
    /// skipped rather than ending the scan.
    pub fn to_commit_events(
        events: &[RawCommitEvent],
        window: &ActivityWindow,
    ) -> Result<Vec<CommitEvent>, ComputeError> {
        let mut commits = Vec::with_capacity(events.len());

        for event in events {
            if let Err(e) = event.validate() {
                return Err(ComputeError::ParseError(format!("Invalid event: {}", e)));
            }

            if window.contains(event.timestamp) {
                commits.push(CommitEvent::new(
                    event.repository.clone(),
                    event.timestamp.date_naive(),
                ));
            }
        }

        debug!(
            total = events.len(),
            in_window = commits.len(),
            "converted raw commit events"
        );

        Ok(commits)
    }

    /// Validate a batch of events
    pub fn validate_events(events: &[RawCommitEvent]) -> Vec<ValidationResult> {
        events
            .iter()
            .enumerate()
            .map(|(idx, event)| ValidationResult {
                index: idx,
                event_id: event.event_id.clone(),
                result: event.validate().err(),
            })
            .filter(|r| r.result.is_some())
            .collect()
    }
}

impl EventFeedAdapter for RawEventAdapter {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn parse(
        &self,
        raw_json: &str,
        window: &ActivityWindow,
    ) -> Result<Vec<CommitEvent>, ComputeError> {
        let events = Self::parse_any(raw_json)?;
        Self::to_commit_events(&events, window)
    }
}

/// Result of event validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub event_id: Option<String>,
    pub result: Option<ValidationError>,
}
