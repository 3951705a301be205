//! # QuoteSync Sync Engine
//!
//! Sync state machine, remote stubs and conflict resolution for QuoteSync.
//!
//! This crate provides:
//! - [`SyncEngine`], the single-flight sync cycle
//!   (idle → fetching → merging → persisting → idle)
//! - [`RemoteStub`], the remote boundary, with [`MockRemote`] and
//!   [`SimulatedRemote`] implementations
//! - [`ConflictResolver`] for the pending conflict log
//! - [`PeriodicSync`], a cancellable recurring sync task
//!
//! ## Architecture
//!
//! Each cycle runs **push then fetch**:
//! 1. Push local changes and the retry queue (failures are queued, not fatal)
//! 2. Fetch the server's quote list
//! 3. Merge last-write-wins and record conflicts
//! 4. Replace the store contents and the pending conflict list
//!
//! ## Key Invariants
//!
//! - Cycles never overlap; a second request is rejected, not queued
//! - Edits and resolutions are rejected while a cycle runs
//! - Every failure returns the engine to idle with the store unchanged
//! - Locks are never held across an await point
//!
//! ## Example
//!
//! ```rust
//! use quotesync_core::{QuoteStore, StoreConfig};
//! use quotesync_storage::InMemoryBackend;
//! use quotesync_sync_engine::{MockRemote, SyncConfig, SyncEngine};
//!
//! # tokio_test_block_on(async {
//! let store = QuoteStore::open(InMemoryBackend::new(), StoreConfig::default()).unwrap();
//! let engine = SyncEngine::new(SyncConfig::default(), store, MockRemote::new());
//!
//! let summary = engine.sync().await.unwrap();
//! assert_eq!(summary.pushed_count, 3);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod periodic;
mod resolver;
mod simulated;
mod state;
mod transport;

pub use config::{SimulatedRemoteConfig, SyncConfig, MIN_INTERVAL};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use periodic::PeriodicSync;
pub use resolver::ConflictResolver;
pub use simulated::SimulatedRemote;
pub use state::{SyncEvent, SyncState, SyncStats, SyncSummary};
pub use transport::{MockRemote, RemoteStub};
