//! Persisted types for the session-login cache.
//!
//! This crate contains the serde-serializable types written to and read from
//! the session-cache file. They are the on-disk shape only; loading policy,
//! version gating and reconciliation live in `slogin-rs`.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * Stable: Changes only when the persisted format changes

pub mod cookie;
pub mod document;

pub use cookie::*;
pub use document::*;
