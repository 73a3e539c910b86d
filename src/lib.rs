//! Banana pricer: inventory valuation against the Steam Community market.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod market;
pub mod engine;
pub mod storage;
pub mod report;
