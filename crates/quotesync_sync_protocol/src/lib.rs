//! # QuoteSync Sync Protocol
//!
//! Merge algorithm, conflict records and JSON wire types for QuoteSync.
//!
//! This crate provides:
//! - [`merge`], the pure last-write-wins reconciliation of two quote lists
//! - [`ConflictRecord`] and [`ConflictChoice`] for the conflict log
//! - Wire messages ([`FetchResponse`], [`PushRequest`], [`PushResponse`])
//!   encoded as JSON bodies
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Merge Rules
//!
//! - Local quotes without a server counterpart survive unchanged
//! - Server quotes without a local counterpart are appended once, marked
//!   `server`
//! - A matched pair differing in text, author or category is a conflict; the
//!   newer timestamp is applied tentatively

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod conflict;
mod error;
mod merge;
mod messages;

pub use conflict::{ConflictChoice, ConflictRecord};
pub use error::{ProtocolError, ProtocolResult};
pub use merge::{merge, MergeOutcome};
pub use messages::{FetchResponse, PushRequest, PushResponse, WireMessage};
