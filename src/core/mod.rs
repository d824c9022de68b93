//! Core modules for TaskGame's storage and request cycle.
//!
//! Shared primitives live here: the snapshot model, the stores it is
//! persisted to, the broker that runs one command against it, and the
//! ambient config, error, output and time helpers.

pub mod broker;
pub mod config;
pub mod error;
pub mod output;
pub mod schemas;
pub mod snapshot;
pub mod store;
pub mod time;
