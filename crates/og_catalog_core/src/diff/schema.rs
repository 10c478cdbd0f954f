//! Declarative field schemas for diffable records.
//!
//! # Responsibility
//! - Describe, per record kind, which fields are compared and how.
//! - Expose field values through one accessor so the engine stays generic.
//!
//! # Invariants
//! - Schema order is the order changes are reported in.
//! - A `Set` field ignores order, duplicates and surrounding whitespace.

use crate::model::control::{PrivacyControlDetail, ResilienceControl, RESILIENCE_CATALOG_ID};
use crate::model::mapping::{Mapping, SecurityControlRef, Standard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single optional text value.
    Scalar,
    /// Unordered set of trimmed, non-empty strings.
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Stable field key reported in changes.
    pub field: &'static str,
    /// Human readable label for review screens.
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn scalar(field: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        field,
        label,
        kind: FieldKind::Scalar,
    }
}

const fn set(field: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        field,
        label,
        kind: FieldKind::Set,
    }
}

/// Borrowed value of one schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Scalar(Option<&'a str>),
    Set(Vec<&'a str>),
}

impl<'a> FieldValue<'a> {
    fn from_list(values: &'a [String]) -> Self {
        Self::Set(values.iter().map(String::as_str).collect())
    }
}

/// Owned replacement for one schema field, used when merging records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Scalar(Option<String>),
    Set(Vec<String>),
}

/// A record kind the diff engine can compare and merge.
pub trait Diffable {
    /// Ordered field schema of this record kind.
    fn schema() -> &'static [FieldSpec];

    /// Returns the value of `field`, or `None` for a field outside the schema.
    fn field_value(&self, field: &str) -> Option<FieldValue<'_>>;

    /// Overwrites `field`. Returns `false` when the field is outside the
    /// schema or `update` has the wrong kind.
    fn apply_field(&mut self, field: &str, update: FieldUpdate) -> bool;
}

pub const PRIVACY_CONTROL_SCHEMA: &[FieldSpec] = &[
    scalar("title", "Title"),
    scalar("statement", "Statement"),
    scalar("maturityLevel1", "Maturity level 1"),
    scalar("maturityLevel3", "Maturity level 3"),
    scalar("maturityLevel5", "Maturity level 5"),
    scalar("riskHint", "Risk hint"),
    set("typicalMeasures", "Typical measures"),
    set("assessmentQuestions", "Assessment questions"),
];

pub const RESILIENCE_CONTROL_SCHEMA: &[FieldSpec] = &[
    scalar("title", "Title"),
    scalar("objective", "Objective"),
    scalar("description", "Description"),
];

pub const MAPPING_SCHEMA: &[FieldSpec] = &[
    set("securityControls", "Security controls"),
    set("bsi", "BSI IT-Grundschutz"),
    set("iso27001", "ISO/IEC 27001"),
    set("iso27701", "ISO/IEC 27701"),
    scalar("notes", "Notes"),
];

impl Diffable for PrivacyControlDetail {
    fn schema() -> &'static [FieldSpec] {
        PRIVACY_CONTROL_SCHEMA
    }

    fn field_value(&self, field: &str) -> Option<FieldValue<'_>> {
        let value = match field {
            "title" => FieldValue::Scalar(Some(self.title.as_str())),
            "statement" => FieldValue::Scalar(self.statement.as_deref()),
            "maturityLevel1" => FieldValue::Scalar(self.maturity_level_1.as_deref()),
            "maturityLevel3" => FieldValue::Scalar(self.maturity_level_3.as_deref()),
            "maturityLevel5" => FieldValue::Scalar(self.maturity_level_5.as_deref()),
            "riskHint" => FieldValue::Scalar(self.risk_hint.as_deref()),
            "typicalMeasures" => FieldValue::from_list(&self.typical_measures),
            "assessmentQuestions" => FieldValue::from_list(&self.assessment_questions),
            _ => return None,
        };
        Some(value)
    }

    fn apply_field(&mut self, field: &str, update: FieldUpdate) -> bool {
        match (field, update) {
            ("title", FieldUpdate::Scalar(value)) => self.title = value.unwrap_or_default(),
            ("statement", FieldUpdate::Scalar(value)) => self.statement = value,
            ("maturityLevel1", FieldUpdate::Scalar(value)) => self.maturity_level_1 = value,
            ("maturityLevel3", FieldUpdate::Scalar(value)) => self.maturity_level_3 = value,
            ("maturityLevel5", FieldUpdate::Scalar(value)) => self.maturity_level_5 = value,
            ("riskHint", FieldUpdate::Scalar(value)) => self.risk_hint = value,
            ("typicalMeasures", FieldUpdate::Set(values)) => self.typical_measures = values,
            ("assessmentQuestions", FieldUpdate::Set(values)) => self.assessment_questions = values,
            _ => return false,
        }
        true
    }
}

impl Diffable for ResilienceControl {
    fn schema() -> &'static [FieldSpec] {
        RESILIENCE_CONTROL_SCHEMA
    }

    fn field_value(&self, field: &str) -> Option<FieldValue<'_>> {
        let value = match field {
            "title" => FieldValue::Scalar(Some(self.title.as_str())),
            "objective" => FieldValue::Scalar(self.objective.as_deref()),
            "description" => FieldValue::Scalar(self.description.as_deref()),
            _ => return None,
        };
        Some(value)
    }

    fn apply_field(&mut self, field: &str, update: FieldUpdate) -> bool {
        match (field, update) {
            ("title", FieldUpdate::Scalar(value)) => self.title = value.unwrap_or_default(),
            ("objective", FieldUpdate::Scalar(value)) => self.objective = value,
            ("description", FieldUpdate::Scalar(value)) => self.description = value,
            _ => return false,
        }
        true
    }
}

impl Diffable for Mapping {
    fn schema() -> &'static [FieldSpec] {
        MAPPING_SCHEMA
    }

    fn field_value(&self, field: &str) -> Option<FieldValue<'_>> {
        let value = match field {
            "securityControls" => FieldValue::Set(
                self.security_controls
                    .iter()
                    .map(|reference| reference.control_id.as_str())
                    .collect(),
            ),
            "bsi" => FieldValue::from_list(self.standards.get(Standard::Bsi)),
            "iso27001" => FieldValue::from_list(self.standards.get(Standard::Iso27001)),
            "iso27701" => FieldValue::from_list(self.standards.get(Standard::Iso27701)),
            "notes" => FieldValue::Scalar(self.notes.as_deref()),
            _ => return None,
        };
        Some(value)
    }

    fn apply_field(&mut self, field: &str, update: FieldUpdate) -> bool {
        match (field, update) {
            ("securityControls", FieldUpdate::Set(control_ids)) => {
                let references = control_ids
                    .into_iter()
                    .map(|control_id| {
                        let existing = self
                            .security_controls
                            .iter()
                            .find(|reference| reference.control_id == control_id)
                            .cloned();
                        existing.unwrap_or(SecurityControlRef {
                            catalog_id: RESILIENCE_CATALOG_ID.to_string(),
                            control_id,
                        })
                    })
                    .collect();
                self.security_controls = references;
            }
            ("bsi", FieldUpdate::Set(codes)) => self.set_standard(Standard::Bsi, codes),
            ("iso27001", FieldUpdate::Set(codes)) => self.set_standard(Standard::Iso27001, codes),
            ("iso27701", FieldUpdate::Set(codes)) => self.set_standard(Standard::Iso27701, codes),
            ("notes", FieldUpdate::Scalar(value)) => self.notes = value,
            _ => return false,
        }
        true
    }
}
