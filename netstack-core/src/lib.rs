//! netstack core library
//!
//! This crate provides the error taxonomy shared by the netstack crates.
//! Errors never allocate, so they can be returned from the allocation-free
//! packet paths in `netstack-packet`.

pub mod error;

pub use error::{Error, Result};
