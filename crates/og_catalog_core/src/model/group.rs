//! Privacy catalog groups.
//!
//! # Invariants
//! - `id` is unique across the catalog.
//! - A group with `control_count > 0` is never deleted by the client.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyGroup {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Number of controls referencing this group. Derived by the backend.
    #[serde(default)]
    pub control_count: usize,
}

impl PrivacyGroup {
    pub fn is_empty(&self) -> bool {
        self.control_count == 0
    }
}

/// Body of `POST /api/privacy/groups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCreateRequest {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
}

/// Body of `PATCH /api/privacy/groups/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupUpdateRequest {
    pub title: String,
    pub description: Option<String>,
}

/// Body of `DELETE /api/privacy/groups/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDeleteRequest {
    pub allow_delete_non_empty: bool,
}

/// Group as returned by create/update, where `controlCount` may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub control_count: Option<usize>,
}

impl GroupResponse {
    /// Converts into a list entry, keeping `fallback_count` when the backend
    /// omitted the derived count.
    pub fn into_group(self, fallback_count: usize) -> PrivacyGroup {
        PrivacyGroup {
            id: self.id,
            title: self.title,
            description: self.description,
            control_count: self.control_count.unwrap_or(fallback_count),
        }
    }
}
