//! # QuoteSync Core
//!
//! Quote store, category index and persistence for QuoteSync.
//!
//! This crate provides:
//! - [`Quote`] records with identity, timestamp and provenance
//! - [`QuoteStore`], the sole owner of quote lifetime, mirrored to a
//!   [`quotesync_storage::KeyValueBackend`] after every mutation
//! - [`CategoryIndex`] and [`CategoryFilter`] for category browsing
//! - JSON and CSV export plus JSON import
//!
//! ## Key Invariants
//!
//! - Quote ids are unique within a store
//! - Text and author are non-empty once accepted
//! - Every mutation is written to storage before it becomes visible
//! - The active filter always names an existing category or `all`
//!
//! ## Example
//!
//! ```rust
//! use quotesync_core::{QuoteStore, StoreConfig};
//! use quotesync_storage::InMemoryBackend;
//!
//! let mut store = QuoteStore::open(InMemoryBackend::new(), StoreConfig::default()).unwrap();
//! assert_eq!(store.len(), 3); // seeded defaults
//!
//! let quote = store.add("Simplicity is prerequisite for reliability.", "Edsger Dijkstra", "Programming").unwrap();
//! assert!(store.get(&quote.id).is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod category;
mod clock;
mod config;
mod error;
mod quote;
mod store;
mod transfer;

pub use category::{CategoryFilter, CategoryIndex};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SeedQuote, StorageKeys, StoreConfig};
pub use error::{CoreError, CoreResult};
pub use quote::{Quote, QuoteId, QuoteSource};
pub use store::{QuoteStore, StoreCheckpoint};
pub use transfer::{ImportSummary, QuoteRecord};
