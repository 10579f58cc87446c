//! Testing utilities for stageline pipelines.
//!
//! This module provides:
//! - In-memory sources and collecting sinks
//! - A shared call log for asserting hook order
//! - Test-harness tracing setup

mod fixtures;

pub use fixtures::{init_test_tracing, vec_source, CallLog, CollectingSink};
