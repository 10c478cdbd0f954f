//! Privacy catalog browsing and control editing.
//!
//! # Responsibility
//! - Load the privacy control list and project it through filter and
//!   grouping.
//! - Drive the edit session of the selected control.
//!
//! # Invariants
//! - A saved control replaces its list entry title with the canonical one.

use super::{
    diff_against_stored_record, report_failure, save_session, select_into_session, SaveOutcome,
    ServiceError, ServiceResult,
};
use crate::api::CatalogApi;
use crate::diff::engine::DiffSummary;
use crate::model::control::{PrivacyControlDetail, PrivacyControlSummary};
use crate::model::group::PrivacyGroup;
use crate::session::{EditSession, SessionError};
use crate::view::filter::filter_items;
use crate::view::grouping::{group_items, GroupBlock};
use log::info;

const MODULE: &str = "privacy_service";

pub struct PrivacyCatalogService<A: CatalogApi> {
    api: A,
    controls: Vec<PrivacyControlSummary>,
    /// Message of the last failed list load.
    pub list_error: Option<String>,
    pub session: EditSession<PrivacyControlDetail>,
}

impl<A: CatalogApi> PrivacyCatalogService<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            controls: Vec::new(),
            list_error: None,
            session: EditSession::new(),
        }
    }

    pub fn controls(&self) -> &[PrivacyControlSummary] {
        &self.controls
    }

    pub fn load_controls(&mut self) -> ServiceResult<&[PrivacyControlSummary]> {
        self.list_error = None;
        match self.api.list_privacy_controls() {
            Ok(controls) => {
                info!(
                    "event=controls_loaded module={} status=ok count={}",
                    MODULE,
                    controls.len()
                );
                self.controls = controls;
                Ok(&self.controls)
            }
            Err(err) => {
                let err = ServiceError::from(err);
                self.list_error = Some(report_failure(MODULE, "Failed to load controls", &err));
                Err(err)
            }
        }
    }

    pub fn filtered_controls(&self, query: &str) -> Vec<&PrivacyControlSummary> {
        filter_items(&self.controls, query)
    }

    /// Filters by `query`, then buckets the matches by `groups`.
    pub fn grouped_controls<'a>(
        &'a self,
        groups: &[PrivacyGroup],
        query: &str,
    ) -> Vec<GroupBlock<'a, PrivacyControlSummary>> {
        group_items(groups, self.filtered_controls(query))
    }

    /// Selects `id` and loads its detail into the session.
    pub fn select_control(&mut self, id: &str, discard_unsaved: bool) -> ServiceResult<()> {
        let api = &self.api;
        select_into_session(
            MODULE,
            &mut self.session,
            id,
            discard_unsaved,
            |id| api.get_privacy_control(id),
            || None,
        )
    }

    pub fn draft_mut(&mut self) -> Option<&mut PrivacyControlDetail> {
        self.session.draft_mut()
    }

    pub fn local_diff(&self) -> Option<DiffSummary> {
        self.session.local_diff()
    }

    pub fn is_dirty(&self) -> bool {
        self.session.is_dirty()
    }

    /// Diffs the draft against the control as currently stored.
    pub fn diff_against_stored(&self) -> ServiceResult<DiffSummary> {
        let draft = self.session.draft().ok_or(SessionError::NothingSelected)?;
        let stored = self.api.get_privacy_control(&draft.id)?;
        Ok(diff_against_stored_record(
            stored.as_ref().map(|found| &found.record),
            draft,
        ))
    }

    /// Submits the draft; the full control is sent, not a patch.
    pub fn save_control(&mut self) -> ServiceResult<SaveOutcome<PrivacyControlDetail>> {
        let api = &self.api;
        let outcome = save_session(
            MODULE,
            &mut self.session,
            |draft, version| api.save_privacy_control(draft, version),
            |id| api.get_privacy_control(id),
        )?;

        if let SaveOutcome::Saved(saved) = &outcome {
            if let Some(entry) = self.controls.iter_mut().find(|entry| entry.id == saved.id) {
                entry.title = saved.title.clone();
            }
        }
        Ok(outcome)
    }

    /// Adopts the stored control as the snapshot and replays the draft's
    /// edits onto it.
    pub fn rebase_onto_stored(&mut self) -> ServiceResult<()> {
        let id = self
            .session
            .selected_id()
            .ok_or(SessionError::NothingSelected)?
            .to_string();
        let stored = self
            .api
            .get_privacy_control(&id)?
            .ok_or_else(|| ServiceError::RecordNotFound(id.clone()))?;
        self.session.rebase(stored.record, stored.version)?;
        info!("event=session_rebased module={} status=ok id={}", MODULE, id);
        Ok(())
    }

    pub fn discard_changes(&mut self) {
        self.session.discard_changes();
    }
}
