//! # QuoteSync Testkit
//!
//! Test utilities for QuoteSync.
//!
//! This crate provides:
//! - Store fixtures over in-memory and temporary file backends
//! - A [`QuoteBuilder`] for hand-written test records
//! - Property-based test generators using proptest
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```rust
//! use quotesync_testkit::prelude::*;
//!
//! let mut fixture = TestStore::memory();
//! fixture.store.add("T", "A", "C").unwrap();
//! assert_eq!(fixture.reopen().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
}

pub use fixtures::*;
pub use generators::*;
pub use logging::*;
