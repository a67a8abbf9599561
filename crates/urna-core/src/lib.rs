//! Core types and trait definitions for the Urna ballot service.
//!
//! This crate is free of HTTP and database dependencies. The store and web
//! crates depend on it; it depends on nothing of theirs.

#![allow(async_fn_in_trait)]

pub mod admin;
pub mod candidate;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod store;
pub mod tally;
pub mod vote;

pub use error::{Error, Result};
