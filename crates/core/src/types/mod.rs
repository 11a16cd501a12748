//! Core types for the exchange rates viewer.

pub mod rate;

pub use rate::{RateRow, duplicate_currencies};
