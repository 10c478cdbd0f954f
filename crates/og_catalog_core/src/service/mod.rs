//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate backend calls, edit sessions and diffs per editor screen.
//! - Turn failures into short user-facing messages kept in service state.
//!
//! # Invariants
//! - A failed call leaves previously loaded state and the draft intact.
//! - Only a successful save overwrites the snapshot and the draft.

use crate::api::{ApiError, ApiResult, Versioned};
use crate::diff::engine::{diff_records, DiffSummary};
use crate::diff::schema::Diffable;
use crate::diff::stored::StoredDiffError;
use crate::session::{EditSession, SessionError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod group_service;
pub mod mapping_service;
pub mod privacy_service;
pub mod resilience_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Api(ApiError),
    Session(SessionError),
    StoredDiff(StoredDiffError),
    /// Input rejected before any network call.
    Validation(String),
    GroupNotFound(String),
    /// Group still holds controls and cannot be deleted.
    GroupNotEmpty { id: String, control_count: usize },
    /// The backend has no record with this id.
    RecordNotFound(String),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::StoredDiff(err) => write!(f, "{err}"),
            Self::Validation(message) => write!(f, "{message}"),
            Self::GroupNotFound(id) => write!(f, "group `{id}` not found"),
            Self::GroupNotEmpty { id, control_count } => write!(
                f,
                "group `{id}` still contains {control_count} control(s) and cannot be deleted; \
                 move its controls to another group first"
            ),
            Self::RecordNotFound(id) => write!(f, "record `{id}` not found"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Api(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::StoredDiff(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for ServiceError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<SessionError> for ServiceError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<StoredDiffError> for ServiceError {
    fn from(value: StoredDiffError) -> Self {
        Self::StoredDiff(value)
    }
}

/// Result of submitting a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome<T> {
    /// Backend accepted the draft; carries its canonical record.
    Saved(T),
    /// Stored record changed since it was loaded; carries the diff from the
    /// stored record to the draft. The draft is kept.
    Conflict(DiffSummary),
}

/// Builds the short message shown to the user for a failed `action`.
pub fn user_message(action: &str, err: &ServiceError) -> String {
    format!("{action}: {err}")
}

/// Logs a failed operation and returns the user message for it.
pub(crate) fn report_failure(module: &str, action: &str, err: &ServiceError) -> String {
    error!(
        "event=operation_failed module={} status=error action=\"{}\" reason=\"{}\"",
        module, action, err
    );
    user_message(action, err)
}

/// Diffs `draft` against the stored record; a missing record counts as
/// an empty baseline.
pub(crate) fn diff_against_stored_record<T>(stored: Option<&T>, draft: &T) -> DiffSummary
where
    T: Diffable + Default,
{
    match stored {
        Some(stored) => diff_records(stored, draft),
        None => diff_records(&T::default(), draft),
    }
}

/// Loads one record into `session` for a fresh selection of `id`.
///
/// `missing` decides what a 404 means for the record kind: `Some` seeds
/// the session with a synthesized record, `None` reports not-found.
pub(crate) fn select_into_session<T, L, M>(
    module: &str,
    session: &mut EditSession<T>,
    id: &str,
    discard_unsaved: bool,
    load: L,
    missing: M,
) -> ServiceResult<()>
where
    T: Diffable + Clone,
    L: FnOnce(&str) -> ApiResult<Option<Versioned<T>>>,
    M: FnOnce() -> Option<T>,
{
    let token = session.begin_selection(id, discard_unsaved)?;
    let loaded = match load(id) {
        Ok(Some(found)) => Some(found),
        Ok(None) => missing().map(Versioned::unversioned),
        Err(err) => {
            let err = ServiceError::from(err);
            let message = report_failure(module, "Failed to load details", &err);
            session.fail_selection(&token, message);
            return Err(err);
        }
    };

    match loaded {
        Some(versioned) => {
            session.complete_selection(&token, versioned.record, versioned.version);
            Ok(())
        }
        None => {
            let err = ServiceError::RecordNotFound(id.to_string());
            let message = report_failure(module, "Failed to load details", &err);
            session.fail_selection(&token, message);
            Err(err)
        }
    }
}

/// Submits the session draft and reconciles the session with the outcome.
///
/// - success: snapshot and draft become the returned record;
/// - conflict: the stored record is re-read and diffed against the draft;
/// - failure: the draft stays, `session.error` holds the message.
pub(crate) fn save_session<T, S, R>(
    module: &str,
    session: &mut EditSession<T>,
    save: S,
    reload: R,
) -> ServiceResult<SaveOutcome<T>>
where
    T: Diffable + Clone + Default,
    S: FnOnce(&T, Option<&str>) -> ApiResult<Versioned<T>>,
    R: FnOnce(&str) -> ApiResult<Option<Versioned<T>>>,
{
    let Some(draft) = session.draft().cloned() else {
        return Err(SessionError::NothingSelected.into());
    };
    session.error = None;
    session.notice = None;

    let version = session.version().map(str::to_string);
    match save(&draft, version.as_deref()) {
        Ok(saved) => {
            info!("event=record_saved module={} status=ok", module);
            session.apply_saved(saved.record.clone(), saved.version);
            session.notice = Some(
                "Saved. Review the change in the catalog repository and commit it.".to_string(),
            );
            Ok(SaveOutcome::Saved(saved.record))
        }
        Err(ApiError::Conflict { status, .. }) => {
            warn!(
                "event=record_save module={} status=conflict http_status={}",
                module, status
            );
            let id = session.selected_id().unwrap_or_default().to_string();
            let stored = match reload(&id) {
                Ok(stored) => stored,
                Err(err) => {
                    let err = ServiceError::from(err);
                    session.error = Some(report_failure(module, "Failed to save", &err));
                    return Err(err);
                }
            };
            let diff = diff_against_stored_record(stored.as_ref().map(|found| &found.record), &draft);
            session.error = Some(
                "Failed to save: the record was changed by another session. Review the \
                 differences and save again."
                    .to_string(),
            );
            Ok(SaveOutcome::Conflict(diff))
        }
        Err(err) => {
            let err = ServiceError::from(err);
            session.error = Some(report_failure(module, "Failed to save", &err));
            Err(err)
        }
    }
}
