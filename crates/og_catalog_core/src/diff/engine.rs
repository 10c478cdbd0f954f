//! Generic structural diff over [`Diffable`] records.
//!
//! # Responsibility
//! - Compare two versions of a record field by field, driven by its schema.
//! - Report scalar changes and set additions/removals for review.
//! - Merge a draft's own edits onto a newer stored version of its record.
//!
//! # Invariants
//! - `diff_records(a, a)` never reports changes.
//! - Scalars compare exactly after mapping `None` and `""` to "no value".
//! - Sets compare as trimmed, non-empty, de-duplicated strings; order and
//!   duplicate counts are ignored.

use crate::diff::schema::{Diffable, FieldUpdate, FieldValue};
use serde::Serialize;
use std::collections::HashSet;

/// One changed scalar field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub label: &'static str,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Additions and removals of one set-valued field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListDiff {
    pub field: &'static str,
    pub label: &'static str,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ListDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub has_changes: bool,
    pub changed_fields: Vec<FieldChange>,
    pub list_diffs: Vec<ListDiff>,
}

impl DiffSummary {
    pub fn field_change(&self, field: &str) -> Option<&FieldChange> {
        self.changed_fields
            .iter()
            .find(|change| change.field == field)
    }

    pub fn list_diff(&self, field: &str) -> Option<&ListDiff> {
        self.list_diffs.iter().find(|diff| diff.field == field)
    }
}

/// Compares `before` with `after` using the record kind's schema.
pub fn diff_records<T: Diffable>(before: &T, after: &T) -> DiffSummary {
    let mut summary = DiffSummary::default();

    for spec in T::schema() {
        match (before.field_value(spec.field), after.field_value(spec.field)) {
            (Some(FieldValue::Scalar(old)), Some(FieldValue::Scalar(new))) => {
                let old = normalize_scalar(old);
                let new = normalize_scalar(new);
                if old != new {
                    summary.changed_fields.push(FieldChange {
                        field: spec.field,
                        label: spec.label,
                        before: old.map(str::to_string),
                        after: new.map(str::to_string),
                    });
                }
            }
            (Some(FieldValue::Set(old)), Some(FieldValue::Set(new))) => {
                let (added, removed) = diff_sets(&old, &new);
                if !added.is_empty() || !removed.is_empty() {
                    summary.list_diffs.push(ListDiff {
                        field: spec.field,
                        label: spec.label,
                        added,
                        removed,
                    });
                }
            }
            _ => {
                log::warn!(
                    "event=diff_schema_mismatch module=diff status=error field={}",
                    spec.field
                );
            }
        }
    }

    summary.has_changes = !summary.changed_fields.is_empty() || !summary.list_diffs.is_empty();
    summary
}

/// Replays the edits `draft` made on `original` onto `stored`.
///
/// Starts from `stored`. A scalar the draft changed takes the draft value;
/// an unchanged one keeps the stored value. A set keeps the stored entries,
/// drops the ones the draft removed and appends the ones it added.
pub fn merge_records<T: Diffable + Clone>(original: &T, draft: &T, stored: &T) -> T {
    let mut merged = stored.clone();

    for spec in T::schema() {
        let update = match (
            original.field_value(spec.field),
            draft.field_value(spec.field),
            stored.field_value(spec.field),
        ) {
            (Some(FieldValue::Scalar(base)), Some(FieldValue::Scalar(mine)), Some(_)) => {
                if normalize_scalar(base) == normalize_scalar(mine) {
                    continue;
                }
                FieldUpdate::Scalar(mine.map(str::to_string))
            }
            (
                Some(FieldValue::Set(base)),
                Some(FieldValue::Set(mine)),
                Some(FieldValue::Set(theirs)),
            ) => {
                let (added, removed) = diff_sets(&base, &mine);
                if added.is_empty() && removed.is_empty() {
                    continue;
                }
                let removed: HashSet<&str> = removed.iter().map(String::as_str).collect();
                let mut values: Vec<String> = normalized_set(&theirs)
                    .into_iter()
                    .filter(|value| !removed.contains(value))
                    .map(str::to_string)
                    .collect();
                for value in added {
                    if !values.contains(&value) {
                        values.push(value);
                    }
                }
                FieldUpdate::Set(values)
            }
            _ => {
                log::warn!(
                    "event=merge_schema_mismatch module=diff status=error field={}",
                    spec.field
                );
                continue;
            }
        };

        if !merged.apply_field(spec.field, update) {
            log::warn!(
                "event=merge_apply module=diff status=error field={}",
                spec.field
            );
        }
    }
    merged
}

/// Maps absent and empty text to "no value".
pub fn normalize_scalar(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

/// Returns `(added, removed)` between two string sets, each in first-seen
/// order of the side it comes from.
pub fn diff_sets<S: AsRef<str>>(before: &[S], after: &[S]) -> (Vec<String>, Vec<String>) {
    let old = normalized_set(before);
    let new = normalized_set(after);
    let old_lookup: HashSet<&str> = old.iter().copied().collect();
    let new_lookup: HashSet<&str> = new.iter().copied().collect();

    let added = new
        .iter()
        .filter(|value| !old_lookup.contains(*value))
        .map(|value| value.to_string())
        .collect();
    let removed = old
        .iter()
        .filter(|value| !new_lookup.contains(*value))
        .map(|value| value.to_string())
        .collect();
    (added, removed)
}

fn normalized_set<S: AsRef<str>>(values: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|value| value.as_ref().trim())
        .filter(|value| !value.is_empty() && seen.insert(*value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{diff_records, diff_sets, merge_records, normalize_scalar};
    use crate::model::control::ResilienceControl;
    use crate::model::mapping::{Mapping, Standard};

    #[test]
    fn normalize_scalar_treats_empty_as_absent() {
        assert_eq!(normalize_scalar(Some("")), None);
        assert_eq!(normalize_scalar(None), None);
        assert_eq!(normalize_scalar(Some(" ")), Some(" "));
    }

    #[test]
    fn diff_sets_keeps_first_seen_order() {
        let (added, removed) = diff_sets(&["a", "b", "c"], &["d", " c", "e", "d", ""]);
        assert_eq!(added, vec!["d".to_string(), "e".to_string()]);
        assert_eq!(removed, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn merge_keeps_stored_scalars_the_draft_left_alone() {
        let original = ResilienceControl {
            id: "SEC-01".to_string(),
            title: "Backup".to_string(),
            objective: Some("Restore".to_string()),
            ..ResilienceControl::default()
        };
        let mut draft = original.clone();
        draft.objective = Some("Restore within 24h".to_string());
        let mut stored = original.clone();
        stored.title = "Backups".to_string();
        stored.objective = Some("Restore quickly".to_string());
        stored.domain = Some("Operations".to_string());

        let merged = merge_records(&original, &draft, &stored);

        assert_eq!(merged.title, "Backups");
        assert_eq!(merged.objective.as_deref(), Some("Restore within 24h"));
        assert_eq!(merged.domain.as_deref(), Some("Operations"));
    }

    #[test]
    fn merge_applies_draft_set_edits_to_stored_set() {
        let mut original = Mapping::empty("SDM-01", "Data minimisation");
        original.toggle_security_control("SEC-01");
        original.toggle_security_control("SEC-02");
        original.set_standard_text(Standard::Bsi, "OPS.1.1");

        let mut draft = original.clone();
        draft.toggle_security_control("SEC-01");
        draft.toggle_security_control("SEC-05");

        let mut stored = original.clone();
        stored.toggle_security_control("SEC-03");
        stored.set_standard_text(Standard::Bsi, "OPS.1.1, CON.2");

        let merged = merge_records(&original, &draft, &stored);

        let ids: Vec<&str> = merged
            .security_controls
            .iter()
            .map(|reference| reference.control_id.as_str())
            .collect();
        assert_eq!(ids, vec!["SEC-02", "SEC-03", "SEC-05"]);
        assert_eq!(
            merged.standards.get(Standard::Bsi),
            &["OPS.1.1".to_string(), "CON.2".to_string()][..]
        );
        assert!(diff_records(&stored, &merged).list_diff("bsi").is_none());
    }
}
