//! Privacy group administration.
//!
//! # Responsibility
//! - Load, create, rename and delete privacy catalog groups.
//! - Enforce the non-empty-group deletion guard before any network call.
//!
//! # Invariants
//! - The loaded group list stays sorted by id.
//! - A group with controls is never sent to the delete endpoint.

use super::{report_failure, ServiceError, ServiceResult};
use crate::api::CatalogApi;
use crate::model::group::{GroupCreateRequest, GroupDeleteRequest, GroupUpdateRequest, PrivacyGroup};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

const MODULE: &str = "group_service";

static GROUP_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid group id regex"));

/// Group list state plus the admin operations on it.
pub struct GroupService<A: CatalogApi> {
    api: A,
    groups: Vec<PrivacyGroup>,
    /// Message of the last failed list load.
    pub load_error: Option<String>,
    /// Message of the last failed admin operation.
    pub admin_error: Option<String>,
}

impl<A: CatalogApi> GroupService<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            groups: Vec::new(),
            load_error: None,
            admin_error: None,
        }
    }

    pub fn groups(&self) -> &[PrivacyGroup] {
        &self.groups
    }

    pub fn group(&self, id: &str) -> Option<&PrivacyGroup> {
        self.groups.iter().find(|group| group.id == id)
    }

    /// Replaces the group list with the backend's.
    pub fn load_groups(&mut self) -> ServiceResult<&[PrivacyGroup]> {
        self.load_error = None;
        match self.api.list_privacy_groups() {
            Ok(mut groups) => {
                groups.sort_by(|left, right| left.id.cmp(&right.id));
                info!(
                    "event=groups_loaded module={} status=ok count={}",
                    MODULE,
                    groups.len()
                );
                self.groups = groups;
                Ok(&self.groups)
            }
            Err(err) => {
                let err = ServiceError::from(err);
                self.load_error = Some(report_failure(MODULE, "Failed to load groups", &err));
                Err(err)
            }
        }
    }

    /// Creates an empty group.
    ///
    /// `id` and `title` are trimmed and required; a blank description is
    /// sent as `null`.
    pub fn create_group(
        &mut self,
        id: &str,
        title: &str,
        description: &str,
    ) -> ServiceResult<&PrivacyGroup> {
        self.admin_error = None;
        let id = id.trim();
        let title = title.trim();
        if let Err(err) = self.validate_new_group(id, title) {
            self.admin_error = Some(err.to_string());
            return Err(err);
        }

        let request = GroupCreateRequest {
            id: id.to_string(),
            title: title.to_string(),
            description: non_blank(description),
        };
        let created = match self.api.create_privacy_group(&request) {
            Ok(created) => created.into_group(0),
            Err(err) => {
                let err = ServiceError::from(err);
                self.admin_error = Some(report_failure(MODULE, "Failed to create group", &err));
                return Err(err);
            }
        };

        info!("event=group_created module={} status=ok id={}", MODULE, created.id);
        let position = self
            .groups
            .partition_point(|group| group.id.as_str() < created.id.as_str());
        self.groups.insert(position, created);
        Ok(&self.groups[position])
    }

    /// Renames a group and updates its description.
    ///
    /// A blank title keeps the current title; a blank description clears it.
    pub fn update_group(
        &mut self,
        id: &str,
        title: &str,
        description: &str,
    ) -> ServiceResult<&PrivacyGroup> {
        self.admin_error = None;
        let Some(position) = self.groups.iter().position(|group| group.id == id) else {
            let err = ServiceError::GroupNotFound(id.to_string());
            self.admin_error = Some(err.to_string());
            return Err(err);
        };
        let current = &self.groups[position];

        let request = GroupUpdateRequest {
            title: non_blank(title).unwrap_or_else(|| current.title.clone()),
            description: non_blank(description),
        };
        let fallback_count = current.control_count;
        match self.api.update_privacy_group(id, &request) {
            Ok(updated) => {
                info!("event=group_updated module={} status=ok id={}", MODULE, id);
                self.groups[position] = updated.into_group(fallback_count);
                Ok(&self.groups[position])
            }
            Err(err) => {
                let err = ServiceError::from(err);
                self.admin_error = Some(report_failure(MODULE, "Failed to update group", &err));
                Err(err)
            }
        }
    }

    /// Deletes an empty group.
    ///
    /// Refused locally, without a network call, while the group still
    /// holds controls.
    pub fn delete_group(&mut self, id: &str) -> ServiceResult<()> {
        self.admin_error = None;
        let Some(group) = self.group(id) else {
            let err = ServiceError::GroupNotFound(id.to_string());
            self.admin_error = Some(err.to_string());
            return Err(err);
        };
        if !group.is_empty() {
            let err = ServiceError::GroupNotEmpty {
                id: id.to_string(),
                control_count: group.control_count,
            };
            info!(
                "event=group_delete module={} status=refused id={} control_count={}",
                MODULE, id, group.control_count
            );
            self.admin_error = Some(err.to_string());
            return Err(err);
        }

        let request = GroupDeleteRequest {
            allow_delete_non_empty: false,
        };
        if let Err(err) = self.api.delete_privacy_group(id, &request) {
            let err = ServiceError::from(err);
            self.admin_error = Some(report_failure(MODULE, "Failed to delete group", &err));
            return Err(err);
        }

        info!("event=group_deleted module={} status=ok id={}", MODULE, id);
        self.groups.retain(|group| group.id != id);
        Ok(())
    }

    fn validate_new_group(&self, id: &str, title: &str) -> ServiceResult<()> {
        if id.is_empty() || title.is_empty() {
            return Err(ServiceError::Validation(
                "group id and title are required".to_string(),
            ));
        }
        if !GROUP_ID_RE.is_match(id) {
            return Err(ServiceError::Validation(format!(
                "group id `{id}` may only contain letters, digits, `.`, `_` and `-`"
            )));
        }
        if self.group(id).is_some() {
            return Err(ServiceError::Validation(format!(
                "group `{id}` already exists"
            )));
        }
        Ok(())
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
