//! CodeAnvil - Activity and regularity metrics from commit streams
//!
//! CodeAnvil turns an irregular stream of commit events into a daily series
//! and reduces it to four indicators through a deterministic pipeline:
//! feed adaptation → daily series → metrics derivation → report encoding.
//!
//! ## Metrics
//!
//! - **Pulse**: recency-weighted mean of daily commit counts
//! - **Activity heat**: mean of the EMA-smoothed daily counts
//! - **Strikes**: variability of log-scaled gaps between active days
//! - **Consistency score**: bounded score in (0, 50] rewarding small gaps

pub mod adapters;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod series;
pub mod types;
pub mod window;

pub use error::ComputeError;
pub use metrics::compute_metrics;
pub use pipeline::{analyze, github_events_to_report, ActivityProcessor};
pub use series::{build_daily_series, DailySeries};
pub use types::{CommitEvent, MetricsBundle};
pub use window::ActivityWindow;

// Schema exports
pub use schema::{RawCommitEvent, RawEventAdapter, SCHEMA_VERSION};

/// CodeAnvil version embedded in all reports
pub const ANVIL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "codeanvil";
