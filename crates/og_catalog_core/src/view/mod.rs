//! List projections for catalog browsing.
//!
//! # Responsibility
//! - Filter loaded lists by a free-text query.
//! - Bucket controls by group in a deterministic order.

pub mod filter;
pub mod grouping;
