//! Integration tests for Bridge-Resolver
//!
//! These tests run the engine against wiremock servers standing in for the
//! lookup service.

mod common;
mod engine_tests;
mod pipeline_tests;
