//! Catalog domain model.
//!
//! # Responsibility
//! - Define the records exchanged with the catalog backend.
//! - Keep wire naming (snake_case for privacy controls and raw files,
//!   camelCase elsewhere) inside serde attributes.
//!
//! # Invariants
//! - Every record is identified by a stable string id.
//! - The client creates and updates records only through the backend.

pub mod control;
pub mod file;
pub mod group;
pub mod mapping;
