//! Control records for the privacy, resilience and SDM catalogs.
//!
//! # Responsibility
//! - Define the wire shapes returned by the catalog backend.
//! - Provide the small text helpers used by list-valued edit fields.
//!
//! # Invariants
//! - `id` is the stable lookup key of every control.
//! - Missing list fields decode as empty lists, missing scalars as `None`.

use serde::{Deserialize, Serialize};

/// Catalog id used when an SDM mapping references a resilience control.
pub const RESILIENCE_CATALOG_ID: &str = "opengov-resilience-baseline";

/// List entry of the privacy catalog (`GET /api/privacy/controls`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyControlSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub group_id: Option<String>,
    /// Short TOM code, used as the secondary sort key inside a group.
    #[serde(default)]
    pub tom_id: Option<String>,
    #[serde(default)]
    pub dsgvo_articles: Vec<String>,
    #[serde(default)]
    pub dp_goals: Vec<String>,
}

/// Full privacy control as read from and written to
/// `/api/privacy/controls/{id}`.
///
/// The backend speaks snake_case, which matches the Rust field names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrivacyControlDetail {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub tom_id: Option<String>,
    #[serde(default)]
    pub dsgvo_articles: Vec<String>,
    #[serde(default)]
    pub dp_goals: Vec<String>,
    #[serde(default)]
    pub statement: Option<String>,
    #[serde(default)]
    pub maturity_level_1: Option<String>,
    #[serde(default)]
    pub maturity_level_3: Option<String>,
    #[serde(default)]
    pub maturity_level_5: Option<String>,
    #[serde(default)]
    pub typical_measures: Vec<String>,
    #[serde(default)]
    pub assessment_questions: Vec<String>,
    #[serde(default)]
    pub risk_hint: Option<String>,
}

impl PrivacyControlDetail {
    /// Returns the list projection of this control.
    pub fn summary(&self) -> PrivacyControlSummary {
        PrivacyControlSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            group_id: self.group_id.clone(),
            tom_id: self.tom_id.clone(),
            dsgvo_articles: self.dsgvo_articles.clone(),
            dp_goals: self.dp_goals.clone(),
        }
    }

    /// Replaces typical measures from newline separated editor text.
    pub fn set_typical_measures_text(&mut self, text: &str) {
        self.typical_measures = parse_lines(text);
    }

    /// Replaces assessment questions from newline separated editor text.
    pub fn set_assessment_questions_text(&mut self, text: &str) {
        self.assessment_questions = parse_lines(text);
    }
}

/// Response envelope of `PUT /api/privacy/controls/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PrivacyControlSaveResponse {
    pub updated: PrivacyControlDetail,
}

/// Security control of the resilience baseline catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResilienceControl {
    pub id: String,
    pub title: String,
    #[serde(default, rename = "class_")]
    pub class: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Free-form cross reference attached to an SDM control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedMapping {
    pub scheme: String,
    pub value: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdmControlProps {
    #[serde(default)]
    pub sdm_module: Option<String>,
    #[serde(default)]
    pub sdm_goals: Vec<String>,
    #[serde(default)]
    pub dsgvo_articles: Vec<String>,
}

/// List entry of the SDM catalog (`GET /api/sdm/controls`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdmControlSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub props: SdmControlProps,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdmControlDetailProps {
    #[serde(default)]
    pub sdm_module: Option<String>,
    #[serde(default)]
    pub sdm_goals: Vec<String>,
    #[serde(default)]
    pub dsgvo_articles: Vec<String>,
    #[serde(default)]
    pub implementation_level: Option<String>,
    #[serde(default)]
    pub dp_risk_impact: Option<String>,
    #[serde(default)]
    pub related_mappings: Vec<RelatedMapping>,
}

/// Read-only SDM control detail (`GET /api/sdm/controls/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdmControlDetail {
    pub id: String,
    pub title: String,
    #[serde(default, rename = "class_")]
    pub class: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub props: SdmControlDetailProps,
}

/// Splits newline separated editor text into trimmed, non-empty entries.
pub fn parse_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins list entries back into newline separated editor text.
pub fn join_lines(values: &[String]) -> String {
    values.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{join_lines, parse_lines, PrivacyControlDetail, ResilienceControl};

    #[test]
    fn parse_lines_trims_and_drops_blank_lines() {
        let parsed = parse_lines("  first \n\n second\r\n   \n");
        assert_eq!(parsed, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(join_lines(&parsed), "first\nsecond");
    }

    #[test]
    fn privacy_detail_decodes_snake_case_with_defaults() {
        let detail: PrivacyControlDetail = serde_json::from_str(
            r#"{"id":"P-1","title":"Access","maturity_level_3":"defined","risk_hint":"High"}"#,
        )
        .expect("detail should decode");
        assert_eq!(detail.maturity_level_3.as_deref(), Some("defined"));
        assert_eq!(detail.risk_hint.as_deref(), Some("High"));
        assert!(detail.typical_measures.is_empty());
        assert!(detail.group_id.is_none());
    }

    #[test]
    fn resilience_control_maps_class_underscore() {
        let control: ResilienceControl =
            serde_json::from_str(r#"{"id":"SEC-04","title":"Backup","class_":"technical"}"#)
                .expect("control should decode");
        assert_eq!(control.class.as_deref(), Some("technical"));
        let encoded = serde_json::to_value(&control).expect("control should encode");
        assert_eq!(encoded["class_"], "technical");
    }
}
