//! Document state and its transitions.
//!
//! [`DocumentState`] owns everything about one open document: the raw payload, the passthrough
//! file metadata, the debounce controller, the parser and the diagnostics list. It is purely
//! synchronous. Every mutating method is an explicit state transition that returns the
//! [`DocumentChange`]s it caused, and it is up to the caller to forward them to observers (see
//! [`Document`](crate::Document), which does that and drives the quiescence wait).
//!
//! # Reload cycle
//!
//! ```text
//!  set_payload ──► trigger accepted ──► finish_quiescence ──► load
//!                  ReloadingChanged(true)  ReloadingChanged(false)  Diagnostics(..)*
//!                                          StabilizedPayloadChanged
//! ```
//!
//! A cycle can also end in [`DocumentState::abort_cycle`], which clears the reloading flag and
//! skips the load step.

use crate::config::DocumentConfig;
use crate::debounce::{CycleTicket, DebounceController, Trigger};
use crate::diagnostics::{self, Diagnostic, DiagnosticList};
use crate::load::{self, LoadOutcome, PayloadParser};
use crate::observable::ListChange;

/// A single observable change to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    /// The raw payload changed (fires on every edit).
    PayloadChanged,
    /// The reloading flag changed to the carried value.
    ReloadingChanged(bool),
    /// The stabilized payload changed (fires once per cycle, after quiescence).
    StabilizedPayloadChanged,
    /// The document name changed.
    NameChanged,
    /// One insertion into or removal from the diagnostics list.
    Diagnostics(ListChange<Diagnostic>),
    /// Saving the payload failed. Not a state change: the version is not bumped.
    SaveFailed {
        /// User-facing description of the failure.
        message: String,
    },
}

impl DocumentChange {
    /// Returns `true` if this change bumps the document version.
    pub fn bumps_version(&self) -> bool {
        !matches!(self, DocumentChange::SaveFailed { .. })
    }
}

/// State change record delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    /// What changed.
    pub change: DocumentChange,
    /// Version before the change.
    pub old_version: u64,
    /// Version after the change (equal to `old_version` for notifications).
    pub new_version: u64,
}

impl StateChange {
    /// Create a new state change record.
    pub fn new(change: DocumentChange, old_version: u64, new_version: u64) -> Self {
        Self {
            change,
            old_version,
            new_version,
        }
    }
}

/// Result of a payload edit or an explicit reload request.
#[derive(Debug)]
pub struct PayloadUpdate {
    /// Changes caused by the transition.
    pub changes: Vec<DocumentChange>,
    /// Set if the transition started a reload cycle.
    pub cycle: Option<CycleTicket>,
}

impl PayloadUpdate {
    fn unchanged() -> Self {
        Self {
            changes: Vec::new(),
            cycle: None,
        }
    }
}

/// Result of running the load step.
#[derive(Debug)]
pub struct LoadReport {
    /// What the parser made of the payload.
    pub outcome: LoadOutcome,
    /// Diagnostics list changes, one per insertion or removal.
    pub changes: Vec<DocumentChange>,
}

/// Synchronous state of one open document.
///
/// `P` is the payload parser, `H` the storage handle type.
pub struct DocumentState<P, H> {
    payload: String,
    stabilized_payload: String,
    name: String,
    token: Option<String>,
    file: Option<H>,
    debounce: DebounceController,
    diagnostics: DiagnosticList,
    parser: P,
    loads: u64,
}

impl<P: PayloadParser, H> DocumentState<P, H> {
    /// Create the state for a new, empty document.
    pub fn new(parser: P, config: &DocumentConfig) -> Self {
        Self {
            payload: String::new(),
            stabilized_payload: String::new(),
            name: config.default_name.clone(),
            token: None,
            file: None,
            debounce: DebounceController::new(config.quiescence()),
            diagnostics: DiagnosticList::new(),
            parser,
            loads: 0,
        }
    }

    /// The latest raw payload.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The payload as of the end of the most recent quiescence interval.
    pub fn stabilized_payload(&self) -> &str {
        &self.stabilized_payload
    }

    /// Document name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Access token supplied by the host when the document was opened.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Storage handle of the backing file, if any.
    pub fn file(&self) -> Option<&H> {
        self.file.as_ref()
    }

    /// Returns `true` between trigger acceptance and quiescence expiry.
    pub fn is_reloading(&self) -> bool {
        self.debounce.is_reloading()
    }

    /// The debounce controller.
    pub fn debounce(&self) -> &DebounceController {
        &self.debounce
    }

    /// Current diagnostics, in canonical order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.as_slice()
    }

    /// The payload parser.
    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Mutable access to the payload parser.
    pub fn parser_mut(&mut self) -> &mut P {
        &mut self.parser
    }

    /// Number of times the load step has run.
    pub fn load_count(&self) -> u64 {
        self.loads
    }

    /// Associate the document with a stored file.
    pub fn attach_file(&mut self, name: String, token: Option<String>, file: H) -> Vec<DocumentChange> {
        self.file = Some(file);
        self.token = token;
        if self.name == name {
            return Vec::new();
        }
        self.name = name;
        vec![DocumentChange::NameChanged]
    }

    /// Record a new raw payload and start a reload cycle unless one is already active.
    ///
    /// Setting the payload it already has is a no-op.
    pub fn set_payload(&mut self, payload: String) -> PayloadUpdate {
        let mut changes = self.record_payload(payload);
        if changes.is_empty() {
            return PayloadUpdate::unchanged();
        }

        let mut update = self.request_reload();
        changes.append(&mut update.changes);
        update.changes = changes;
        update
    }

    /// Record a new raw payload without triggering a reload.
    pub fn record_payload(&mut self, payload: String) -> Vec<DocumentChange> {
        if self.payload == payload {
            return Vec::new();
        }
        self.payload = payload;
        vec![DocumentChange::PayloadChanged]
    }

    /// Start a reload cycle for the current payload unless one is already active.
    pub fn request_reload(&mut self) -> PayloadUpdate {
        match self.debounce.trigger() {
            Trigger::Started(ticket) => PayloadUpdate {
                changes: vec![DocumentChange::ReloadingChanged(true)],
                cycle: Some(ticket),
            },
            Trigger::Coalesced => PayloadUpdate::unchanged(),
        }
    }

    /// End the quiescence interval of `ticket`'s cycle.
    ///
    /// Clears the reloading flag and snapshots the stabilized payload. Returns no changes if
    /// `ticket` is stale; the caller must not run the load step in that case.
    pub fn finish_quiescence(&mut self, ticket: CycleTicket) -> Vec<DocumentChange> {
        if !self.debounce.finish(ticket) {
            return Vec::new();
        }
        self.stabilized_payload.clone_from(&self.payload);
        vec![
            DocumentChange::ReloadingChanged(false),
            DocumentChange::StabilizedPayloadChanged,
        ]
    }

    /// Abandon `ticket`'s cycle: clear the reloading flag and skip the load step.
    pub fn abort_cycle(&mut self, ticket: CycleTicket) -> Vec<DocumentChange> {
        if !self.debounce.abort(ticket) {
            return Vec::new();
        }
        vec![DocumentChange::ReloadingChanged(false)]
    }

    /// Run the load step on the current payload and reconcile the diagnostics list.
    pub fn load(&mut self) -> LoadReport {
        self.loads += 1;
        let outcome = load::run_load(&mut self.parser, &self.payload);
        let desired = outcome.diagnostics(&self.parser);
        let changes = self.make_errors_like(desired);
        LoadReport { outcome, changes }
    }

    /// Replace the diagnostics with `desired` (sorted canonically), recording minimal changes.
    pub fn make_errors_like(&mut self, desired: Vec<Diagnostic>) -> Vec<DocumentChange> {
        diagnostics::make_errors_like(&mut self.diagnostics, desired);
        self.drain_diagnostic_changes()
    }

    /// Replace the diagnostics with exactly one diagnostic.
    pub fn set_single_error(&mut self, diagnostic: Diagnostic) -> Vec<DocumentChange> {
        diagnostics::set_single_error(&mut self.diagnostics, diagnostic);
        self.drain_diagnostic_changes()
    }

    fn drain_diagnostic_changes(&mut self) -> Vec<DocumentChange> {
        self.diagnostics
            .take_changes()
            .into_iter()
            .map(DocumentChange::Diagnostics)
            .collect()
    }
}
