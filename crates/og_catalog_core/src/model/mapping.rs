//! SDM control → security control mappings.
//!
//! # Responsibility
//! - Define the API shape (camelCase) and the raw on-disk shape
//!   (snake_case) of a mapping.
//! - Provide the edit operations used by the mapping editor.
//!
//! # Invariants
//! - `security_controls` holds at most one reference per `control_id`.
//! - Standards lists never hold blank codes; an empty list is stored as
//!   `None`.

use crate::model::control::RESILIENCE_CATALOG_ID;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityControlRef {
    pub catalog_id: String,
    pub control_id: String,
}

/// The three standards families a mapping can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standard {
    Bsi,
    Iso27001,
    Iso27701,
}

impl Standard {
    pub const ALL: [Standard; 3] = [Standard::Bsi, Standard::Iso27001, Standard::Iso27701];

    /// Wire key of this standard inside `standards`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Bsi => "bsi",
            Self::Iso27001 => "iso27001",
            Self::Iso27701 => "iso27701",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MappingStandards {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bsi: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso27001: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso27701: Option<Vec<String>>,
}

impl MappingStandards {
    pub fn get(&self, standard: Standard) -> &[String] {
        let list = match standard {
            Standard::Bsi => &self.bsi,
            Standard::Iso27001 => &self.iso27001,
            Standard::Iso27701 => &self.iso27701,
        };
        list.as_deref().unwrap_or(&[])
    }

    fn slot_mut(&mut self, standard: Standard) -> &mut Option<Vec<String>> {
        match standard {
            Standard::Bsi => &mut self.bsi,
            Standard::Iso27001 => &mut self.iso27001,
            Standard::Iso27701 => &mut self.iso27701,
        }
    }

    pub fn is_empty(&self) -> bool {
        Standard::ALL.iter().all(|standard| self.get(*standard).is_empty())
    }
}

/// Mapping as exchanged with `/api/mapping`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub sdm_control_id: String,
    #[serde(default)]
    pub sdm_title: String,
    #[serde(default)]
    pub security_controls: Vec<SecurityControlRef>,
    #[serde(default)]
    pub standards: MappingStandards,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Mapping {
    /// Draft used when the backend has no mapping for `sdm_control_id` yet.
    pub fn empty(sdm_control_id: impl Into<String>, sdm_title: impl Into<String>) -> Self {
        Self {
            sdm_control_id: sdm_control_id.into(),
            sdm_title: sdm_title.into(),
            security_controls: Vec::new(),
            standards: MappingStandards::default(),
            notes: Some(String::new()),
        }
    }

    pub fn references(&self, control_id: &str) -> bool {
        self.security_controls
            .iter()
            .any(|reference| reference.control_id == control_id)
    }

    /// Adds a resilience control reference, or removes it when present.
    ///
    /// Returns `true` when the control is referenced after the call.
    pub fn toggle_security_control(&mut self, control_id: &str) -> bool {
        if self.references(control_id) {
            self.security_controls
                .retain(|reference| reference.control_id != control_id);
            false
        } else {
            self.security_controls.push(SecurityControlRef {
                catalog_id: RESILIENCE_CATALOG_ID.to_string(),
                control_id: control_id.to_string(),
            });
            true
        }
    }

    /// Replaces one standards list from comma separated editor text.
    pub fn set_standard_text(&mut self, standard: Standard, text: &str) {
        self.set_standard(standard, parse_codes(text));
    }

    /// Replaces one standards list; an empty list is stored as `None`.
    pub fn set_standard(&mut self, standard: Standard, codes: Vec<String>) {
        *self.standards.slot_mut(standard) = if codes.is_empty() {
            None
        } else {
            Some(codes)
        };
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = Some(notes.into());
    }

    /// Request body for `PUT /api/mapping/{sdmControlId}`.
    pub fn to_update_request(&self) -> MappingUpdateRequest {
        MappingUpdateRequest {
            sdm_title: self.sdm_title.clone(),
            security_controls: self.security_controls.clone(),
            standards: self.standards.clone(),
            notes: self.notes.clone(),
        }
    }
}

/// Body of `PUT /api/mapping/{sdmControlId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingUpdateRequest {
    pub sdm_title: String,
    pub security_controls: Vec<SecurityControlRef>,
    pub standards: MappingStandards,
    pub notes: Option<String>,
}

/// SDM side of a mapping that references a given security control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdmMappingForSecurityControl {
    pub sdm_control_id: String,
    pub sdm_title: String,
    pub standards: MappingStandards,
    pub notes: Option<String>,
}

/// Counts mappings per SDM control id. Entries without an id are skipped.
pub fn build_mapping_index(mappings: &[Mapping]) -> BTreeMap<String, usize> {
    let mut index = BTreeMap::new();
    for mapping in mappings {
        if mapping.sdm_control_id.is_empty() {
            continue;
        }
        *index.entry(mapping.sdm_control_id.clone()).or_insert(0) += 1;
    }
    index
}

/// Lists the SDM mappings that reference `security_control_id`.
pub fn mappings_referencing(
    mappings: &[Mapping],
    security_control_id: &str,
) -> Vec<SdmMappingForSecurityControl> {
    mappings
        .iter()
        .filter(|mapping| mapping.references(security_control_id))
        .map(|mapping| SdmMappingForSecurityControl {
            sdm_control_id: mapping.sdm_control_id.clone(),
            sdm_title: mapping.sdm_title.clone(),
            standards: mapping.standards.clone(),
            notes: mapping.notes.clone(),
        })
        .collect()
}

/// Splits comma separated codes into trimmed, non-empty entries.
pub fn parse_codes(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

/// Raw mapping file as stored on disk (`sdm_privacy_to_security.json`).
///
/// Entries stay undecoded until looked up, so a malformed record never
/// affects lookups of other records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMappingFile {
    #[serde(default, deserialize_with = "lenient_mapping_list")]
    pub mappings: Vec<serde_json::Value>,
}

impl RawMappingFile {
    /// Decodes the first entry whose `sdm_control_id` matches.
    pub fn find(&self, sdm_control_id: &str) -> Result<Option<RawMapping>, serde_json::Error> {
        let entry = self.mappings.iter().find(|entry| {
            entry.get("sdm_control_id").and_then(serde_json::Value::as_str) == Some(sdm_control_id)
        });
        match entry {
            Some(entry) => RawMapping::deserialize(entry).map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMapping {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sdm_control_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sdm_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub security_controls: Vec<RawSecurityControlRef>,
    #[serde(default)]
    pub standards: Option<MappingStandards>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSecurityControlRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub catalog_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub control_id: String,
}

impl From<&RawMapping> for Mapping {
    fn from(raw: &RawMapping) -> Self {
        Self {
            sdm_control_id: raw.sdm_control_id.clone(),
            sdm_title: raw.sdm_title.clone(),
            security_controls: raw
                .security_controls
                .iter()
                .map(|reference| SecurityControlRef {
                    catalog_id: reference.catalog_id.clone(),
                    control_id: reference.control_id.clone(),
                })
                .collect(),
            standards: raw.standards.clone().unwrap_or_default(),
            notes: raw.notes.clone(),
        }
    }
}

// A `mappings` value that is not a list is read as "no mappings".
fn lenient_mapping_list<'de, D>(deserializer: D) -> Result<Vec<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(entries) => Ok(entries),
        _ => Ok(Vec::new()),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
