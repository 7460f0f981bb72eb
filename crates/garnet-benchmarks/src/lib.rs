//! Garnet benchmarking suite
//!
//! Benchmarks for version and config parsing, clause compression and full
//! resolutions over generated indices.

pub mod common;

pub use common::*;
