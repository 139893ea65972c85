//! Test doubles and fixtures for discovery runs.
//!
//! - Scripted search engine, fetcher and oracle
//! - HTML pages and oracle answers

pub mod fixtures;
mod mocks;

pub use mocks::{MockFetcher, MockOracle, MockSearchEngine};
