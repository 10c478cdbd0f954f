//! SDM to resilience mapping editor.
//!
//! # Responsibility
//! - Load SDM controls, resilience controls and the mapping index.
//! - Load the SDM detail and mapping of the selected SDM control, or
//!   start an empty mapping when none exists yet.
//! - Edit, diff and save the mapping draft.
//!
//! # Invariants
//! - A missing mapping index only disables the mapping markers; it never
//!   fails the screen.
//! - The SDM list and the resilience list load independently; one failing
//!   never clears the other.
//! - A failed SDM detail load falls back to the list title and still loads
//!   the mapping.
//! - Edits are refused until a mapping draft is loaded.

use super::{
    report_failure, save_session, select_into_session, user_message, SaveOutcome, ServiceError,
    ServiceResult,
};
use crate::api::{CatalogApi, Versioned};
use crate::diff::engine::DiffSummary;
use crate::diff::stored::{diff_mapping_against_stored, MappingDiff};
use crate::model::control::{ResilienceControl, SdmControlDetail, SdmControlSummary};
use crate::model::mapping::{build_mapping_index, Mapping, Standard};
use crate::session::{EditSession, SessionError};
use crate::view::filter::filter_items;
use log::{info, warn};
use std::collections::BTreeMap;

const MODULE: &str = "mapping_service";

pub struct SdmMappingService<A: CatalogApi> {
    api: A,
    sdm_controls: Vec<SdmControlSummary>,
    security_controls: Vec<ResilienceControl>,
    mapping_index: BTreeMap<String, usize>,
    sdm_detail: Option<SdmControlDetail>,
    /// Message of the last failed SDM list load.
    pub list_error: Option<String>,
    /// Message of the last failed resilience list load.
    pub security_list_error: Option<String>,
    /// Message of the last failed SDM detail load.
    pub detail_error: Option<String>,
    /// Message of the last failed mapping index load.
    pub index_error: Option<String>,
    pub session: EditSession<Mapping>,
}

impl<A: CatalogApi> SdmMappingService<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            sdm_controls: Vec::new(),
            security_controls: Vec::new(),
            mapping_index: BTreeMap::new(),
            sdm_detail: None,
            list_error: None,
            security_list_error: None,
            detail_error: None,
            index_error: None,
            session: EditSession::new(),
        }
    }

    pub fn sdm_controls(&self) -> &[SdmControlSummary] {
        &self.sdm_controls
    }

    pub fn security_controls(&self) -> &[ResilienceControl] {
        &self.security_controls
    }

    pub fn sdm_detail(&self) -> Option<&SdmControlDetail> {
        self.sdm_detail.as_ref()
    }

    /// Loads both control lists and the mapping index.
    ///
    /// Every load is attempted. A failed list keeps the other one and is
    /// recorded in `list_error` or `security_list_error`; the first list
    /// failure is returned. An index failure is only recorded in
    /// `index_error`.
    pub fn load(&mut self) -> ServiceResult<()> {
        self.list_error = None;
        self.security_list_error = None;
        self.index_error = None;
        let mut first_failure = None;

        match self.api.list_sdm_controls() {
            Ok(sdm_controls) => {
                info!(
                    "event=sdm_list_loaded module={} status=ok count={}",
                    MODULE,
                    sdm_controls.len()
                );
                self.sdm_controls = sdm_controls;
            }
            Err(err) => {
                let err = ServiceError::from(err);
                self.sdm_controls.clear();
                self.list_error =
                    Some(report_failure(MODULE, "Failed to load SDM controls", &err));
                first_failure = Some(err);
            }
        }

        match self.api.list_resilience_controls() {
            Ok(security_controls) => {
                info!(
                    "event=security_list_loaded module={} status=ok count={}",
                    MODULE,
                    security_controls.len()
                );
                self.security_controls = security_controls;
            }
            Err(err) => {
                let err = ServiceError::from(err);
                self.security_controls.clear();
                self.security_list_error = Some(report_failure(
                    MODULE,
                    "Failed to load security controls",
                    &err,
                ));
                first_failure.get_or_insert(err);
            }
        }

        match self.api.list_mappings() {
            Ok(mappings) => self.mapping_index = build_mapping_index(&mappings),
            Err(err) => {
                let err = ServiceError::from(err);
                warn!(
                    "event=mapping_index_load module={} status=degraded reason=\"{}\"",
                    MODULE, err
                );
                self.mapping_index.clear();
                self.index_error = Some(user_message("Failed to load mapping index", &err));
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Number of stored mappings for an SDM control.
    pub fn mapping_count(&self, sdm_control_id: &str) -> usize {
        self.mapping_index
            .get(sdm_control_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn has_mapping(&self, sdm_control_id: &str) -> bool {
        self.mapping_count(sdm_control_id) > 0
    }

    pub fn filtered_sdm_controls(&self, query: &str) -> Vec<&SdmControlSummary> {
        filter_items(&self.sdm_controls, query)
    }

    pub fn filtered_security_controls(&self, query: &str) -> Vec<&ResilienceControl> {
        filter_items(&self.security_controls, query)
    }

    /// Selects an SDM control, loading its detail and mapping.
    ///
    /// Without a stored mapping an empty draft is started, titled from the
    /// SDM detail or list entry. A failed detail load is recorded in
    /// `detail_error` and the list title is used instead. An SDM control
    /// unknown to both yields [`ServiceError::RecordNotFound`].
    pub fn select_control(&mut self, id: &str, discard_unsaved: bool) -> ServiceResult<()> {
        let api = &self.api;
        let detail_slot = &mut self.sdm_detail;
        let detail_error = &mut self.detail_error;
        let list_title = self
            .sdm_controls
            .iter()
            .find(|control| control.id == id)
            .map(|control| control.title.clone());

        select_into_session(
            MODULE,
            &mut self.session,
            id,
            discard_unsaved,
            |id| {
                *detail_slot = None;
                *detail_error = None;
                let detail = match api.get_sdm_control(id) {
                    Ok(detail) => detail,
                    Err(err) => {
                        let err = ServiceError::from(err);
                        warn!(
                            "event=sdm_detail_load module={} status=degraded id={} reason=\"{}\"",
                            MODULE, id, err
                        );
                        *detail_error = Some(user_message("Failed to load SDM details", &err));
                        None
                    }
                };
                let title = detail
                    .as_ref()
                    .map(|detail| detail.title.clone())
                    .or(list_title);
                *detail_slot = detail;
                match api.get_mapping(id)? {
                    Some(found) => Ok(Some(found)),
                    None => {
                        info!(
                            "event=mapping_missing module={} status=new_draft sdm_control_id={}",
                            MODULE, id
                        );
                        Ok(title.map(|title| Versioned::unversioned(Mapping::empty(id, title))))
                    }
                }
            },
            || None,
        )
    }

    pub fn is_security_control_selected(&self, control_id: &str) -> bool {
        self.session
            .draft()
            .map(|draft| draft.references(control_id))
            .unwrap_or(false)
    }

    /// Adds or removes a resilience control on the draft.
    pub fn toggle_security_control(&mut self, control_id: &str) -> ServiceResult<bool> {
        Ok(self.draft()?.toggle_security_control(control_id))
    }

    pub fn set_standard_text(&mut self, standard: Standard, text: &str) -> ServiceResult<()> {
        self.draft()?.set_standard_text(standard, text);
        Ok(())
    }

    pub fn set_notes(&mut self, notes: &str) -> ServiceResult<()> {
        self.draft()?.set_notes(notes);
        Ok(())
    }

    pub fn local_diff(&self) -> Option<DiffSummary> {
        self.session.local_diff()
    }

    /// Diffs the draft against the mapping file as stored in the repository.
    pub fn diff_against_stored(&self) -> ServiceResult<MappingDiff> {
        let draft = self.session.draft().ok_or(SessionError::NothingSelected)?;
        Ok(diff_mapping_against_stored(&self.api, draft)?)
    }

    pub fn save_mapping(&mut self) -> ServiceResult<SaveOutcome<Mapping>> {
        let api = &self.api;
        let outcome = save_session(
            MODULE,
            &mut self.session,
            |draft, version| api.save_mapping(draft, version),
            |id| api.get_mapping(id),
        )?;

        if let SaveOutcome::Saved(saved) = &outcome {
            self.mapping_index
                .entry(saved.sdm_control_id.clone())
                .or_insert(1);
        }
        Ok(outcome)
    }

    pub fn rebase_onto_stored(&mut self) -> ServiceResult<()> {
        let id = self
            .session
            .selected_id()
            .ok_or(SessionError::NothingSelected)?
            .to_string();
        let stored = self
            .api
            .get_mapping(&id)?
            .ok_or_else(|| ServiceError::RecordNotFound(id.clone()))?;
        self.session.rebase(stored.record, stored.version)?;
        Ok(())
    }

    pub fn discard_changes(&mut self) {
        self.session.discard_changes();
    }

    fn draft(&mut self) -> ServiceResult<&mut Mapping> {
        Ok(self
            .session
            .draft_mut()
            .ok_or(SessionError::NothingSelected)?)
    }
}
