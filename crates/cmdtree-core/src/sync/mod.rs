//! Scoped synchronization
//!
//! This module provides:
//! - **plan**: Diff a desired set against a scope's remote listing
//! - **engine**: Apply a plan as upserts, removals and a single commit

mod engine;
mod plan;

pub use engine::{SyncEngine, SyncOptions, SyncReport};
pub use plan::{SyncMode, SyncPlan};
