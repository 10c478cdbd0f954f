//! Catalog backend contracts and the HTTP implementation.
//!
//! # Responsibility
//! - Define one use-case oriented method per backend REST operation.
//! - Classify HTTP outcomes into semantic errors for the service layer.
//!
//! # Invariants
//! - `get_*` returns `Ok(None)` for 404; a missing record is not an error.
//! - Every other non-2xx response is an error carrying the HTTP status and
//!   a capped copy of the response body. No request is retried.
//! - A conflicting write (409/412) is reported as `ApiError::Conflict`.

use crate::model::control::{
    PrivacyControlDetail, PrivacyControlSummary, ResilienceControl, SdmControlDetail,
    SdmControlSummary,
};
use crate::model::file::{FileContent, FileDiffResult, FileKey};
use crate::model::group::{
    GroupCreateRequest, GroupDeleteRequest, GroupResponse, GroupUpdateRequest, PrivacyGroup,
};
use crate::model::mapping::Mapping;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod http;

pub use http::HttpCatalogApi;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error for catalog backend calls.
#[derive(Debug)]
pub enum ApiError {
    /// Connection, timeout or other transport failure.
    Transport(String),
    /// Non-success HTTP status without a more specific meaning.
    Status { status: u16, body: String },
    /// The addressed record does not exist (404 outside of lookups).
    NotFound { path: String },
    /// The stored record changed since it was loaded (409/412).
    Conflict { status: u16, body: String },
    /// Response body is not the expected JSON shape.
    Decode(String),
    /// Request URL could not be built from the configured base.
    InvalidUrl(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "request failed: {message}"),
            Self::Status { status, body } if body.is_empty() => write!(f, "HTTP {status}"),
            Self::Status { status, body } => write!(f, "HTTP {status}: {body}"),
            Self::NotFound { path } => write!(f, "HTTP 404: `{path}` not found"),
            Self::Conflict { status, .. } => write!(
                f,
                "HTTP {status}: record was changed by another session since it was loaded"
            ),
            Self::Decode(message) => write!(f, "unexpected response body: {message}"),
            Self::InvalidUrl(message) => write!(f, "invalid request url: {message}"),
        }
    }
}

impl Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// A record together with the backend's version token, when it sends one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub record: T,
    /// `ETag` of the response the record came from.
    pub version: Option<String>,
}

impl<T> Versioned<T> {
    pub fn new(record: T, version: Option<String>) -> Self {
        Self { record, version }
    }

    pub fn unversioned(record: T) -> Self {
        Self::new(record, None)
    }
}

/// Backend interface consumed by the catalog services.
///
/// Write methods take the version the draft was based on; implementations
/// send it as a precondition when present.
pub trait CatalogApi {
    fn list_privacy_groups(&self) -> ApiResult<Vec<PrivacyGroup>>;
    fn create_privacy_group(&self, request: &GroupCreateRequest) -> ApiResult<GroupResponse>;
    fn update_privacy_group(
        &self,
        id: &str,
        request: &GroupUpdateRequest,
    ) -> ApiResult<GroupResponse>;
    fn delete_privacy_group(&self, id: &str, request: &GroupDeleteRequest) -> ApiResult<()>;

    fn list_privacy_controls(&self) -> ApiResult<Vec<PrivacyControlSummary>>;
    fn get_privacy_control(&self, id: &str)
        -> ApiResult<Option<Versioned<PrivacyControlDetail>>>;
    fn save_privacy_control(
        &self,
        control: &PrivacyControlDetail,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<PrivacyControlDetail>>;

    fn list_resilience_controls(&self) -> ApiResult<Vec<ResilienceControl>>;
    fn get_resilience_control(&self, id: &str) -> ApiResult<Option<Versioned<ResilienceControl>>>;
    fn save_resilience_control(
        &self,
        control: &ResilienceControl,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<ResilienceControl>>;

    fn list_sdm_controls(&self) -> ApiResult<Vec<SdmControlSummary>>;
    fn get_sdm_control(&self, id: &str) -> ApiResult<Option<SdmControlDetail>>;

    fn list_mappings(&self) -> ApiResult<Vec<Mapping>>;
    fn get_mapping(&self, sdm_control_id: &str) -> ApiResult<Option<Versioned<Mapping>>>;
    fn save_mapping(
        &self,
        mapping: &Mapping,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<Mapping>>;

    fn get_file(&self, key: FileKey) -> ApiResult<FileContent>;
    fn diff_file(&self, key: FileKey, updated: &str) -> ApiResult<FileDiffResult>;
}

impl<T: CatalogApi + ?Sized> CatalogApi for &T {
    fn list_privacy_groups(&self) -> ApiResult<Vec<PrivacyGroup>> {
        (**self).list_privacy_groups()
    }

    fn create_privacy_group(&self, request: &GroupCreateRequest) -> ApiResult<GroupResponse> {
        (**self).create_privacy_group(request)
    }

    fn update_privacy_group(
        &self,
        id: &str,
        request: &GroupUpdateRequest,
    ) -> ApiResult<GroupResponse> {
        (**self).update_privacy_group(id, request)
    }

    fn delete_privacy_group(&self, id: &str, request: &GroupDeleteRequest) -> ApiResult<()> {
        (**self).delete_privacy_group(id, request)
    }

    fn list_privacy_controls(&self) -> ApiResult<Vec<PrivacyControlSummary>> {
        (**self).list_privacy_controls()
    }

    fn get_privacy_control(
        &self,
        id: &str,
    ) -> ApiResult<Option<Versioned<PrivacyControlDetail>>> {
        (**self).get_privacy_control(id)
    }

    fn save_privacy_control(
        &self,
        control: &PrivacyControlDetail,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<PrivacyControlDetail>> {
        (**self).save_privacy_control(control, expected_version)
    }

    fn list_resilience_controls(&self) -> ApiResult<Vec<ResilienceControl>> {
        (**self).list_resilience_controls()
    }

    fn get_resilience_control(&self, id: &str) -> ApiResult<Option<Versioned<ResilienceControl>>> {
        (**self).get_resilience_control(id)
    }

    fn save_resilience_control(
        &self,
        control: &ResilienceControl,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<ResilienceControl>> {
        (**self).save_resilience_control(control, expected_version)
    }

    fn list_sdm_controls(&self) -> ApiResult<Vec<SdmControlSummary>> {
        (**self).list_sdm_controls()
    }

    fn get_sdm_control(&self, id: &str) -> ApiResult<Option<SdmControlDetail>> {
        (**self).get_sdm_control(id)
    }

    fn list_mappings(&self) -> ApiResult<Vec<Mapping>> {
        (**self).list_mappings()
    }

    fn get_mapping(&self, sdm_control_id: &str) -> ApiResult<Option<Versioned<Mapping>>> {
        (**self).get_mapping(sdm_control_id)
    }

    fn save_mapping(
        &self,
        mapping: &Mapping,
        expected_version: Option<&str>,
    ) -> ApiResult<Versioned<Mapping>> {
        (**self).save_mapping(mapping, expected_version)
    }

    fn get_file(&self, key: FileKey) -> ApiResult<FileContent> {
        (**self).get_file(key)
    }

    fn diff_file(&self, key: FileKey, updated: &str) -> ApiResult<FileDiffResult> {
        (**self).diff_file(key, updated)
    }
}
