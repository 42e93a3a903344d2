//! Trailing activity window
//!
//! The window is the explicit configuration handed to feed adapters: whose
//! activity is being measured and how far back to look. Nothing in the crate
//! reads identity or window size from the environment.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ComputeError;

/// Default trailing window in days
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Subject and trailing window for a metrics run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityWindow {
    /// Account whose activity is measured
    pub subject: String,
    /// Number of days to look back from `now`
    pub window_days: u32,
    /// Reference time the window ends at
    pub now: DateTime<Utc>,
}

impl ActivityWindow {
    /// Create a window ending at the current time
    pub fn new(subject: impl Into<String>, window_days: u32) -> Result<Self, ComputeError> {
        Self::ending_at(subject, window_days, Utc::now())
    }

    /// Create a window ending at a fixed reference time
    pub fn ending_at(
        subject: impl Into<String>,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, ComputeError> {
        if window_days == 0 {
            return Err(ComputeError::InvalidWindow(
                "window must cover at least one day".to_string(),
            ));
        }

        Ok(Self {
            subject: subject.into(),
            window_days,
            now,
        })
    }

    /// Oldest instant still inside the window
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.now - Duration::days(i64::from(self.window_days))
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.cutoff()
    }
}
