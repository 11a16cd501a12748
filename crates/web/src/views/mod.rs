//! Presentation of query results.
//!
//! Views are pure projections of a [`QueryState`](crate::graphql::QueryState);
//! route handlers wrap them in askama templates.

pub mod rates;

pub use rates::{RatesFragmentTemplate, RatesPageTemplate, RatesView};
