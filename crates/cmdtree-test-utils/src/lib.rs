//! Shared test utilities for the cmdtree workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`mock`]: [`MockTree`], an in-memory remote tree with failure injection
//! - [`fixtures`]: module, registry and manifest builders

pub mod fixtures;
pub mod mock;

pub use mock::{Call, MockTree, Op};
