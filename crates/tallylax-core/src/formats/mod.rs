//! # Formats Module
//!
//! Serialization of the whole state tree.
//!
//! This module contains:
//! - The JSON backup document (export / import)
//! - The binary snapshot format (postcard + header)
//!
//! Note: File I/O stays with the callers. This module only converts between
//! `TrackerState` and bytes (pure transformations).

mod backup;
mod snapshot;

pub use backup::*;
pub use snapshot::*;
