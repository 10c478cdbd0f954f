//! Case-insensitive substring search over catalog lists.
//!
//! # Invariants
//! - A blank query matches every item.
//! - Matching is a substring test against all indexed terms joined by a
//!   single space, so list-valued tags are searchable too.

use crate::model::control::{PrivacyControlSummary, ResilienceControl, SdmControlSummary};

/// A record that exposes terms for list search.
pub trait Searchable {
    fn search_terms(&self) -> Vec<&str>;
}

impl Searchable for PrivacyControlSummary {
    fn search_terms(&self) -> Vec<&str> {
        let mut terms = vec![
            self.id.as_str(),
            self.title.as_str(),
            self.group_id.as_deref().unwrap_or(""),
            self.tom_id.as_deref().unwrap_or(""),
        ];
        terms.extend(self.dsgvo_articles.iter().map(String::as_str));
        terms.extend(self.dp_goals.iter().map(String::as_str));
        terms
    }
}

impl Searchable for SdmControlSummary {
    fn search_terms(&self) -> Vec<&str> {
        let mut terms = vec![
            self.id.as_str(),
            self.title.as_str(),
            self.props.sdm_module.as_deref().unwrap_or(""),
        ];
        terms.extend(self.props.sdm_goals.iter().map(String::as_str));
        terms.extend(self.props.dsgvo_articles.iter().map(String::as_str));
        terms
    }
}

impl Searchable for ResilienceControl {
    fn search_terms(&self) -> Vec<&str> {
        vec![
            self.id.as_str(),
            self.title.as_str(),
            self.domain.as_deref().unwrap_or(""),
            self.objective.as_deref().unwrap_or(""),
        ]
    }
}

/// Returns whether `item` matches the search `query`.
pub fn matches_query<T: Searchable + ?Sized>(item: &T, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    item.search_terms().join(" ").to_lowercase().contains(&needle)
}

/// Filters `items` by `query`, keeping input order.
pub fn filter_items<'a, T: Searchable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| matches_query(*item, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_items, matches_query};
    use crate::model::control::PrivacyControlSummary;

    fn control(id: &str, articles: &[&str]) -> PrivacyControlSummary {
        PrivacyControlSummary {
            id: id.to_string(),
            title: "Zugriffskontrolle".to_string(),
            group_id: Some("tom-access-control".to_string()),
            tom_id: Some("AC-01".to_string()),
            dsgvo_articles: articles.iter().map(|value| value.to_string()).collect(),
            dp_goals: vec!["Integrity".to_string()],
        }
    }

    #[test]
    fn blank_query_matches_everything() {
        let items = vec![control("P-1", &[]), control("P-2", &[])];
        assert_eq!(filter_items(&items, "   ").len(), 2);
    }

    #[test]
    fn query_is_case_insensitive_and_reaches_list_tags() {
        let item = control("P-1", &["Art. 32"]);
        assert!(matches_query(&item, "art. 3"));
        assert!(matches_query(&item, "INTEG"));
        assert!(matches_query(&item, "ac-0"));
        assert!(!matches_query(&item, "art. 5"));
    }
}
