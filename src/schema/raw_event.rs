//! commit.raw_event.v1 schema definition
//!
//! A host-agnostic record for a single commit, so activity from any forge (or
//! a local `git log` export) can be fed through the same pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version
pub const SCHEMA_VERSION: &str = "commit.raw_event.v1";

/// A single commit in the raw event schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommitEvent {
    /// Schema version identifier
    pub schema_version: String,
    /// Unique event identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Commit timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// Repository the commit belongs to
    pub repository: String,
    /// Commit hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    /// Author login or email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl RawCommitEvent {
    /// Create a new commit event with a generated event id
    pub fn new(timestamp: DateTime<Utc>, repository: impl Into<String>) -> Self {
        RawCommitEvent {
            schema_version: SCHEMA_VERSION.to_string(),
            event_id: Some(uuid::Uuid::new_v4().to_string()),
            timestamp,
            repository: repository.into(),
            sha: None,
            author: None,
        }
    }

    /// Validate the event schema
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if self.repository.trim().is_empty() {
            return Err(ValidationError::EmptyRepository);
        }

        Ok(())
    }
}

/// Validation errors for raw events
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Repository name is empty")]
    EmptyRepository,
}
