//! Unified commit.raw_event.v1 schema
//!
//! This module defines the host-agnostic input schema for commit activity.

mod raw_event;
mod adapter;

pub use raw_event::*;
pub use adapter::*;
