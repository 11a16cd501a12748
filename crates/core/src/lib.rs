//! Exchange Rates Core - Shared domain types.
//!
//! The core crate contains only types - no I/O, no HTTP clients. The `web`
//! crate projects GraphQL payloads into these types before rendering.
//!
//! # Modules
//!
//! - [`types`] - Display rows for exchange rates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
