//! # TallyLax Library
//!
//! This library exposes the TallyLax command modules for testing and
//! integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod cli;
pub mod config;
pub mod file_store;
pub mod report;

// Re-export tallylax_core for convenience
pub use tallylax_core;
