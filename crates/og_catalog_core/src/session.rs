//! Edit session: last-synced snapshot plus user draft of one record.
//!
//! # Responsibility
//! - Hold `original` and `draft` for the selected record.
//! - Guard against stale loads with per-selection generation tokens.
//! - Refuse to silently drop unsaved edits when the selection changes.
//!
//! # Invariants
//! - `original` and `draft` are identical right after a load or a save.
//! - Edits touch only `draft`.
//! - Only the response for the latest selection may populate the session.

use crate::diff::engine::{diff_records, merge_records, DiffSummary};
use crate::diff::schema::Diffable;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The draft differs from the snapshot and discarding was not confirmed.
    UnsavedChanges { id: String },
    NothingSelected,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsavedChanges { id } => {
                write!(f, "`{id}` has unsaved changes; save or discard them first")
            }
            Self::NothingSelected => write!(f, "no record is selected"),
        }
    }
}

impl Error for SessionError {}

/// Ticket for one selection; stale once a newer selection starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionToken {
    generation: u64,
    id: String,
}

impl SelectionToken {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
pub struct EditSession<T> {
    generation: u64,
    selected_id: Option<String>,
    original: Option<T>,
    draft: Option<T>,
    version: Option<String>,
    /// Short user-facing failure message of the last operation.
    pub error: Option<String>,
    /// Short user-facing success message of the last operation.
    pub notice: Option<String>,
}

impl<T> Default for EditSession<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            selected_id: None,
            original: None,
            draft: None,
            version: None,
            error: None,
            notice: None,
        }
    }
}

impl<T: Diffable + Clone> EditSession<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn original(&self) -> Option<&T> {
        self.original.as_ref()
    }

    pub fn draft(&self) -> Option<&T> {
        self.draft.as_ref()
    }

    /// Mutable draft for edits; `None` until a record is loaded.
    pub fn draft_mut(&mut self) -> Option<&mut T> {
        self.draft.as_mut()
    }

    /// Backend version the snapshot was read at.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Local diff of the draft against the last-synced snapshot.
    pub fn local_diff(&self) -> Option<DiffSummary> {
        match (&self.original, &self.draft) {
            (Some(original), Some(draft)) => Some(diff_records(original, draft)),
            _ => None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.local_diff()
            .map(|summary| summary.has_changes)
            .unwrap_or(false)
    }

    /// Starts selecting `id` and returns the token its load must present.
    ///
    /// Clears the current record and messages. Fails with
    /// [`SessionError::UnsavedChanges`] while the draft is dirty unless
    /// `discard_unsaved` is set.
    pub fn begin_selection(
        &mut self,
        id: &str,
        discard_unsaved: bool,
    ) -> Result<SelectionToken, SessionError> {
        if self.is_dirty() && !discard_unsaved {
            let current = self.selected_id.clone().unwrap_or_default();
            return Err(SessionError::UnsavedChanges { id: current });
        }

        self.generation += 1;
        self.selected_id = Some(id.to_string());
        self.original = None;
        self.draft = None;
        self.version = None;
        self.error = None;
        self.notice = None;
        debug!(
            "event=selection_begin module=session id={} generation={}",
            id, self.generation
        );
        Ok(SelectionToken {
            generation: self.generation,
            id: id.to_string(),
        })
    }

    pub fn is_current(&self, token: &SelectionToken) -> bool {
        token.generation == self.generation
    }

    /// Seeds snapshot and draft from a completed load.
    ///
    /// Returns `false` and leaves the session untouched when `token` is
    /// stale.
    pub fn complete_selection(
        &mut self,
        token: &SelectionToken,
        record: T,
        version: Option<String>,
    ) -> bool {
        if !self.is_current(token) {
            info!(
                "event=selection_complete module=session status=stale id={} generation={} current={}",
                token.id, token.generation, self.generation
            );
            return false;
        }
        self.original = Some(record.clone());
        self.draft = Some(record);
        self.version = version;
        true
    }

    /// Records a failed load for `token`, ignoring stale tokens.
    pub fn fail_selection(&mut self, token: &SelectionToken, message: impl Into<String>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.error = Some(message.into());
        true
    }

    /// Replaces snapshot and draft with the backend's canonical record.
    pub fn apply_saved(&mut self, record: T, version: Option<String>) {
        self.original = Some(record.clone());
        self.draft = Some(record);
        self.version = version;
        self.error = None;
    }

    /// Adopts `stored` as the new snapshot and replays the draft's own
    /// edits onto it.
    ///
    /// Used after a conflicting save so the next save is based on the
    /// backend's current version without reverting concurrent changes.
    pub fn rebase(&mut self, stored: T, version: Option<String>) -> Result<(), SessionError> {
        let (Some(original), Some(draft)) = (&self.original, &self.draft) else {
            return Err(SessionError::NothingSelected);
        };
        let merged = merge_records(original, draft, &stored);
        self.draft = Some(merged);
        self.original = Some(stored);
        self.version = version;
        Ok(())
    }

    /// Resets the draft to the snapshot.
    pub fn discard_changes(&mut self) {
        self.draft = self.original.clone();
    }
}
