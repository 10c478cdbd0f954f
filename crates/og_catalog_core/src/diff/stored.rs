//! Diffs against the backend's authoritative stored state.
//!
//! # Responsibility
//! - Re-read the stored mapping file, locate the record for a draft and
//!   diff the draft against it.
//! - Present mapping diffs in reviewer terms (security controls,
//!   standards, notes).
//!
//! # Invariants
//! - A missing stored record is "no prior record": everything in the draft
//!   is reported as added.
//! - Field and set rules are exactly those of [`diff_records`].

use crate::api::{ApiError, CatalogApi};
use crate::diff::engine::{diff_records, DiffSummary, FieldChange, ListDiff};
use crate::model::file::FileKey;
use crate::model::mapping::{Mapping, RawMappingFile, Standard};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum StoredDiffError {
    Api(ApiError),
    /// Stored file is not valid JSON, or the record looked up is malformed.
    Parse {
        file: FileKey,
        message: String,
    },
}

impl Display for StoredDiffError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api(err) => write!(f, "{err}"),
            Self::Parse { file, message } => {
                write!(f, "stored file `{file}` is not valid JSON: {message}")
            }
        }
    }
}

impl Error for StoredDiffError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Api(err) => Some(err),
            Self::Parse { .. } => None,
        }
    }
}

impl From<ApiError> for StoredDiffError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

/// Parses raw mapping file content.
pub fn parse_mapping_file(content: &str) -> Result<RawMappingFile, StoredDiffError> {
    serde_json::from_str(content).map_err(mapping_parse_error)
}

fn mapping_parse_error(err: serde_json::Error) -> StoredDiffError {
    StoredDiffError::Parse {
        file: FileKey::SdmMapping,
        message: err.to_string(),
    }
}

/// Diffs `draft` against the stored mapping with the same SDM control id
/// inside already-fetched file `content`.
pub fn diff_mapping_against_file(
    content: &str,
    draft: &Mapping,
) -> Result<MappingDiff, StoredDiffError> {
    let file = parse_mapping_file(content)?;
    let found = file
        .find(&draft.sdm_control_id)
        .map_err(mapping_parse_error)?;
    let stored = match found {
        Some(raw) => Mapping::from(&raw),
        None => {
            log::debug!(
                "event=stored_mapping_missing module=diff sdm_control_id={}",
                draft.sdm_control_id
            );
            Mapping {
                notes: None,
                ..Mapping::empty(draft.sdm_control_id.clone(), draft.sdm_title.clone())
            }
        }
    };
    Ok(MappingDiff::new(diff_records(&stored, draft)))
}

/// Fetches the stored mapping file and diffs `draft` against it.
pub fn diff_mapping_against_stored<A: CatalogApi>(
    api: &A,
    draft: &Mapping,
) -> Result<MappingDiff, StoredDiffError> {
    let file = api.get_file(FileKey::SdmMapping)?;
    diff_mapping_against_file(&file.content, draft)
}

/// Mapping-specific view over a [`DiffSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingDiff {
    summary: DiffSummary,
}

impl MappingDiff {
    pub fn new(summary: DiffSummary) -> Self {
        Self { summary }
    }

    pub fn has_changes(&self) -> bool {
        self.summary.has_changes
    }

    pub fn summary(&self) -> &DiffSummary {
        &self.summary
    }

    pub fn into_summary(self) -> DiffSummary {
        self.summary
    }

    pub fn added_security_controls(&self) -> &[String] {
        self.summary
            .list_diff("securityControls")
            .map(|diff| diff.added.as_slice())
            .unwrap_or(&[])
    }

    pub fn removed_security_controls(&self) -> &[String] {
        self.summary
            .list_diff("securityControls")
            .map(|diff| diff.removed.as_slice())
            .unwrap_or(&[])
    }

    /// Additions/removals of one standards list, if it changed.
    pub fn standard(&self, standard: Standard) -> Option<&ListDiff> {
        self.summary.list_diff(standard.key())
    }

    pub fn notes_changed(&self) -> Option<&FieldChange> {
        self.summary.field_change("notes")
    }
}

#[cfg(test)]
mod tests {
    use super::{diff_mapping_against_file, StoredDiffError};
    use crate::model::mapping::{Mapping, Standard};

    const STORED: &str = r#"{
      "mappings": [
        {
          "sdm_control_id": "SDM-02",
          "sdm_title": "Integrity",
          "security_controls": [{"catalog_id": "opengov-resilience-baseline", "control_id": "SEC-01"}],
          "standards": {"bsi": ["CON.1"]},
          "notes": ""
        }
      ]
    }"#;

    #[test]
    fn existing_stored_record_is_the_baseline() {
        let mut draft = Mapping::empty("SDM-02", "Integrity");
        draft.toggle_security_control("SEC-01");
        draft.toggle_security_control("SEC-07");
        draft.set_standard_text(Standard::Bsi, "CON.1, OPS.1.1.2");

        let diff = diff_mapping_against_file(STORED, &draft).expect("diff should succeed");
        assert!(diff.has_changes());
        assert_eq!(diff.added_security_controls().to_vec(), vec!["SEC-07".to_string()]);
        assert!(diff.removed_security_controls().is_empty());
        let bsi = diff.standard(Standard::Bsi).expect("bsi changed");
        assert_eq!(bsi.added, vec!["OPS.1.1.2".to_string()]);
        assert!(diff.standard(Standard::Iso27001).is_none());
        assert!(diff.notes_changed().is_none());
    }

    #[test]
    fn malformed_unrelated_entry_does_not_block_lookup() {
        let content = r#"{
          "mappings": [
            {"sdm_control_id": "SDM-09", "sdm_title": null, "security_controls": null, "notes": 7},
            {
              "sdm_control_id": "SDM-02",
              "sdm_title": "Integrity",
              "security_controls": [{"catalog_id": "opengov-resilience-baseline", "control_id": "SEC-01"}],
              "standards": {"bsi": ["CON.1"]}
            }
          ]
        }"#;
        let mut draft = Mapping::empty("SDM-02", "Integrity");
        draft.toggle_security_control("SEC-01");
        draft.set_standard_text(Standard::Bsi, "CON.1");

        let diff = diff_mapping_against_file(content, &draft).expect("diff should succeed");
        assert!(!diff.has_changes());
    }

    #[test]
    fn malformed_matching_entry_is_a_parse_error() {
        let content = r#"{"mappings": [{"sdm_control_id": "SDM-02", "notes": ["not", "text"]}]}"#;
        let draft = Mapping::empty("SDM-02", "Integrity");
        let err = diff_mapping_against_file(content, &draft).unwrap_err();
        assert!(matches!(err, StoredDiffError::Parse { .. }));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let draft = Mapping::empty("SDM-02", "Integrity");
        let err = diff_mapping_against_file("{not json", &draft).unwrap_err();
        assert!(matches!(err, StoredDiffError::Parse { .. }));
    }
}
