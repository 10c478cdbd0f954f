//! Raw catalog files exposed by `/api/files/{fileKey}`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Symbolic names the backend maps to files under version control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKey {
    PrivacyCatalog,
    SdmPrivacyCatalog,
    ResilienceCatalog,
    SdmMapping,
}

impl FileKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PrivacyCatalog => "open_privacy_catalog_risk",
            Self::SdmPrivacyCatalog => "sdm_privacy_catalog",
            Self::ResilienceCatalog => "resilience_baseline_catalog",
            Self::SdmMapping => "sdm_privacy_to_security",
        }
    }
}

impl Display for FileKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileContent {
    #[serde(default)]
    pub name: Option<String>,
    pub content: String,
}

/// Body of `POST /api/files/{fileKey}/diff`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDiffRequest {
    pub updated: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeKind {
    Added,
    Changed,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub change: FileChangeKind,
    #[serde(default)]
    pub old: Option<serde_json::Value>,
    #[serde(default)]
    pub new: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct FileDiffCounts {
    #[serde(default)]
    pub added: u32,
    #[serde(default)]
    pub changed: u32,
    #[serde(default)]
    pub removed: u32,
}

/// Diff computed by the backend between the stored file and an update.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileDiffResult {
    #[serde(default)]
    pub summary: FileDiffCounts,
    #[serde(default)]
    pub details: Vec<FileChange>,
}
