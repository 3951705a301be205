//! # QuoteSync Storage
//!
//! Key-value storage backends for QuoteSync.
//!
//! This crate provides the lowest-level persistence abstraction. Backends
//! are **opaque string stores**: they map keys to serialized values and do
//! not interpret what they hold.
//!
//! ## Design Principles
//!
//! - Backends are simple key-value stores (get, set, remove, flush)
//! - No knowledge of quote records or the JSON layout of values
//! - Must be `Send + Sync` so a store can live behind a shared handle
//! - Each `set` is atomic from the caller's point of view
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral stores
//! - [`FileBackend`] - For persistent storage in a directory on disk
//!
//! ## Example
//!
//! ```rust
//! use quotesync_storage::{KeyValueBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.set("quotes", "[]").unwrap();
//! assert_eq!(backend.get("quotes").unwrap().as_deref(), Some("[]"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::KeyValueBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
