//! Core client logic for the OpenGov compliance catalog editor.
//! This crate owns the backend contract, edit sessions and diff rules.

pub mod api;
pub mod config;
pub mod diff;
pub mod logging;
pub mod model;
pub mod service;
pub mod session;
pub mod view;

pub use api::{ApiError, ApiResult, CatalogApi, HttpCatalogApi, Versioned};
pub use config::{ClientConfig, ConfigError};
pub use diff::engine::{diff_records, merge_records, DiffSummary, FieldChange, ListDiff};
pub use diff::schema::{Diffable, FieldKind, FieldSpec, FieldUpdate};
pub use diff::stored::{diff_mapping_against_stored, MappingDiff, StoredDiffError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use service::group_service::GroupService;
pub use service::mapping_service::SdmMappingService;
pub use service::privacy_service::PrivacyCatalogService;
pub use service::resilience_service::ResilienceCatalogService;
pub use service::{SaveOutcome, ServiceError, ServiceResult};
pub use session::{EditSession, SelectionToken, SessionError};
pub use view::filter::{filter_items, Searchable};
pub use view::grouping::{group_items, GroupBlock, GroupKey, Groupable};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
