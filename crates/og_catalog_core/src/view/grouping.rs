//! Bucketing of controls by group id.
//!
//! # Invariants
//! - Known groups come first in ascending id order and only when they hold
//!   at least one item.
//! - Group ids found on items but missing from the known groups follow,
//!   ascending, each in its own synthesized bucket.
//! - Items without a group id (or with an empty one) land in one
//!   `Ungrouped` bucket, always last.
//! - Inside a bucket items are ordered by `sort_key()`, then by id.

use crate::model::control::{PrivacyControlSummary, SdmControlSummary};
use crate::model::group::PrivacyGroup;
use std::collections::{BTreeMap, HashSet};

/// A record that can be bucketed by group.
pub trait Groupable {
    fn record_id(&self) -> &str;
    fn group_id(&self) -> Option<&str>;

    /// Secondary short code used for ordering, falling back to the id.
    fn sort_key(&self) -> &str {
        self.record_id()
    }
}

impl Groupable for PrivacyControlSummary {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    fn sort_key(&self) -> &str {
        self.tom_id
            .as_deref()
            .filter(|tom_id| !tom_id.is_empty())
            .unwrap_or(&self.id)
    }
}

impl Groupable for SdmControlSummary {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    Known(String),
    /// Id referenced by items but absent from the known groups.
    Unknown(String),
    Ungrouped,
}

impl GroupKey {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Known(id) | Self::Unknown(id) => Some(id),
            Self::Ungrouped => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBlock<'a, T> {
    pub key: GroupKey,
    pub title: String,
    pub description: Option<String>,
    pub items: Vec<&'a T>,
}

pub const UNGROUPED_TITLE: &str = "Ungrouped";

/// Buckets `items` by group following the module ordering rules.
pub fn group_items<'a, T, I>(groups: &[PrivacyGroup], items: I) -> Vec<GroupBlock<'a, T>>
where
    T: Groupable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut by_group: BTreeMap<&'a str, Vec<&'a T>> = BTreeMap::new();
    let mut ungrouped: Vec<&'a T> = Vec::new();
    for item in items {
        match item.group_id().filter(|id| !id.is_empty()) {
            Some(id) => by_group.entry(id).or_default().push(item),
            None => ungrouped.push(item),
        }
    }

    let mut known: Vec<&PrivacyGroup> = groups.iter().collect();
    known.sort_by(|left, right| left.id.cmp(&right.id));
    let known_ids: HashSet<&str> = known.iter().map(|group| group.id.as_str()).collect();

    let mut blocks = Vec::new();
    for group in known {
        let Some(members) = by_group.get(group.id.as_str()) else {
            continue;
        };
        blocks.push(GroupBlock {
            key: GroupKey::Known(group.id.clone()),
            title: group.title.clone(),
            description: group.description.clone(),
            items: sorted(members.clone()),
        });
    }

    for (id, members) in by_group {
        if known_ids.contains(id) {
            continue;
        }
        blocks.push(GroupBlock {
            key: GroupKey::Unknown(id.to_string()),
            title: id.to_string(),
            description: None,
            items: sorted(members),
        });
    }

    if !ungrouped.is_empty() {
        blocks.push(GroupBlock {
            key: GroupKey::Ungrouped,
            title: UNGROUPED_TITLE.to_string(),
            description: None,
            items: sorted(ungrouped),
        });
    }

    blocks
}

fn sorted<T: Groupable>(mut items: Vec<&T>) -> Vec<&T> {
    items.sort_by(|left, right| {
        left.sort_key()
            .cmp(right.sort_key())
            .then_with(|| left.record_id().cmp(right.record_id()))
    });
    items
}
