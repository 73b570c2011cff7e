//! Test helpers for kin integration tests.
//!
//! This module provides shared models and blueprints used across the
//! integration test suites.

#[path = "helpers/models.rs"]
pub mod models;
