//! Field-level diffing of catalog records.
//!
//! # Responsibility
//! - Compare an edited draft with a baseline for operator review.
//! - Offer both a local baseline (last loaded snapshot) and the backend's
//!   stored state as baseline.
//!
//! # See also
//! - `session` for dirty tracking built on this module.

pub mod engine;
pub mod schema;
pub mod stored;
