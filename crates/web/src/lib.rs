//! Exchange rates web viewer library.
//!
//! This crate provides the GraphQL client, views and routes as a library,
//! allowing them to be tested and reused by the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod graphql;
pub mod routes;
pub mod state;
pub mod views;
