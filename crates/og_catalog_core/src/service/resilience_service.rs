//! Resilience catalog browsing, editing and reverse mapping lookup.
//!
//! # Responsibility
//! - Load the resilience control list and drive the edit session.
//! - Show which SDM controls reference the selected security control.

use super::{
    diff_against_stored_record, report_failure, save_session, select_into_session, SaveOutcome,
    ServiceError, ServiceResult,
};
use crate::api::CatalogApi;
use crate::diff::engine::DiffSummary;
use crate::model::control::ResilienceControl;
use crate::model::mapping::{mappings_referencing, Mapping, SdmMappingForSecurityControl};
use crate::session::{EditSession, SessionError};
use crate::view::filter::filter_items;
use log::{info, warn};

const MODULE: &str = "resilience_service";

pub struct ResilienceCatalogService<A: CatalogApi> {
    api: A,
    controls: Vec<ResilienceControl>,
    mappings: Vec<Mapping>,
    pub list_error: Option<String>,
    /// Message of the last failed mapping load; the editor stays usable.
    pub mappings_error: Option<String>,
    pub session: EditSession<ResilienceControl>,
}

impl<A: CatalogApi> ResilienceCatalogService<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            controls: Vec::new(),
            mappings: Vec::new(),
            list_error: None,
            mappings_error: None,
            session: EditSession::new(),
        }
    }

    pub fn controls(&self) -> &[ResilienceControl] {
        &self.controls
    }

    pub fn load_controls(&mut self) -> ServiceResult<&[ResilienceControl]> {
        self.list_error = None;
        match self.api.list_resilience_controls() {
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

    /// Loads all SDM mappings for reverse lookup.
    pub fn load_mappings(&mut self) -> ServiceResult<()> {
        self.mappings_error = None;
        match self.api.list_mappings() {
            Ok(mappings) => {
                self.mappings = mappings;
                Ok(())
            }
            Err(err) => {
                let err = ServiceError::from(err);
                warn!(
                    "event=mappings_load module={} status=degraded reason=\"{}\"",
                    MODULE, err
                );
                self.mappings_error = Some(super::user_message("Failed to load mappings", &err));
                Err(err)
            }
        }
    }

    pub fn filtered_controls(&self, query: &str) -> Vec<&ResilienceControl> {
        filter_items(&self.controls, query)
    }

    /// Title of a loaded control, used to label mapping references.
    pub fn title_for(&self, id: &str) -> Option<&str> {
        self.controls
            .iter()
            .find(|control| control.id == id)
            .map(|control| control.title.as_str())
    }

    /// SDM controls whose mapping references the selected control.
    pub fn mapped_sdm_controls(&self) -> Vec<SdmMappingForSecurityControl> {
        match self.session.selected_id() {
            Some(id) => mappings_referencing(&self.mappings, id),
            None => Vec::new(),
        }
    }

    pub fn select_control(&mut self, id: &str, discard_unsaved: bool) -> ServiceResult<()> {
        let api = &self.api;
        select_into_session(
            MODULE,
            &mut self.session,
            id,
            discard_unsaved,
            |id| api.get_resilience_control(id),
            || None,
        )
    }

    pub fn draft_mut(&mut self) -> Option<&mut ResilienceControl> {
        self.session.draft_mut()
    }

    pub fn local_diff(&self) -> Option<DiffSummary> {
        self.session.local_diff()
    }

    pub fn diff_against_stored(&self) -> ServiceResult<DiffSummary> {
        let draft = self.session.draft().ok_or(SessionError::NothingSelected)?;
        let stored = self.api.get_resilience_control(&draft.id)?;
        Ok(diff_against_stored_record(
            stored.as_ref().map(|found| &found.record),
            draft,
        ))
    }

    pub fn save_control(&mut self) -> ServiceResult<SaveOutcome<ResilienceControl>> {
        let api = &self.api;
        let outcome = save_session(
            MODULE,
            &mut self.session,
            |draft, version| api.save_resilience_control(draft, version),
            |id| api.get_resilience_control(id),
        )?;

        if let SaveOutcome::Saved(saved) = &outcome {
            if let Some(entry) = self.controls.iter_mut().find(|entry| entry.id == saved.id) {
                *entry = saved.clone();
            }
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
            .get_resilience_control(&id)?
            .ok_or_else(|| ServiceError::RecordNotFound(id.clone()))?;
        self.session.rebase(stored.record, stored.version)?;
        Ok(())
    }

    pub fn discard_changes(&mut self) {
        self.session.discard_changes();
    }
}
