//! The live document: state, storage and the reload driver.
//!
//! [`Document`] is a cheap, clonable handle (`Rc`) around a [`DocumentState`]. It forwards every
//! state transition to subscribers as a versioned [`StateChange`] and runs each reload cycle as a
//! local task:
//!
//! ```text
//! set_payload ─► trigger accepted ─► spawn_local ─► sleep_until(deadline) ─► finish ─► load
//!                                       │                                       │
//!                                       └── close() / last handle dropped ──► abort
//! ```
//!
//! The deadline is fixed when the trigger is accepted. Cycles are spawned with
//! [`tokio::task::spawn_local`], so a document must be driven from inside a
//! [`tokio::task::LocalSet`].

use crate::config::DocumentConfig;
use crate::debounce::{self, CycleTicket, ReloadPhase, WaitOutcome};
use crate::diagnostics::Diagnostic;
use crate::load::{LoadOutcome, PayloadParser};
use crate::notify::Notifier;
use crate::state::{DocumentChange, DocumentState, StateChange};
use crate::storage::{DocumentStorage, StorageError};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// What a payload edit or reload request did.
#[derive(Debug)]
pub enum ReloadTrigger {
    /// A new reload cycle was spawned; the handle resolves when it has finished or was abandoned.
    Started(JoinHandle<()>),
    /// A cycle was already in flight and will pick the edit up.
    Coalesced,
    /// The payload was already equal to the new value.
    Unchanged,
    /// The document is closed; the payload was recorded but no reload will run.
    Closed,
}

impl ReloadTrigger {
    /// Returns `true` if a new cycle was spawned.
    pub fn is_started(&self) -> bool {
        matches!(self, ReloadTrigger::Started(_))
    }

    /// The spawned cycle's handle, if any.
    pub fn into_handle(self) -> Option<JoinHandle<()>> {
        match self {
            ReloadTrigger::Started(handle) => Some(handle),
            _ => None,
        }
    }
}

/// Result of [`Document::save`].
#[derive(Debug)]
pub enum SaveOutcome {
    /// The payload was written.
    Saved,
    /// Writing failed. Observers were sent [`DocumentChange::SaveFailed`].
    Failed(StorageError),
}

impl SaveOutcome {
    /// Returns `true` if the payload was written.
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

struct Inner<P, S: DocumentStorage> {
    state: RefCell<DocumentState<P, S::Handle>>,
    storage: S,
    notifier: Notifier,
    cancel: CancellationToken,
    closed: Cell<bool>,
    phase: watch::Sender<ReloadPhase>,
    config: DocumentConfig,
}

impl<P, S: DocumentStorage> Drop for Inner<P, S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// A live, single-threaded document.
///
/// # Example
///
/// ```rust
/// use document_core::{Document, DocumentConfig, MemoryStorage, parser_fn};
/// use std::time::Duration;
///
/// # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
/// let local = tokio::task::LocalSet::new();
/// local.run_until(async {
///     let config = DocumentConfig::default().with_quiescence(Duration::from_millis(5));
///     let doc = Document::new(parser_fn(|_| Ok(())), MemoryStorage::new(), config);
///
///     doc.subscribe(|change| println!("{:?}", change.change));
///
///     let cycle = doc.set_payload("{}").into_handle().unwrap();
///     doc.set_payload("{ }"); // coalesced into the running cycle
///     cycle.await.unwrap();
///
///     assert_eq!(doc.stabilized_payload(), "{ }");
///     assert!(doc.diagnostics().is_empty());
/// }).await;
/// # });
/// ```
pub struct Document<P, S: DocumentStorage> {
    inner: Rc<Inner<P, S>>,
}

impl<P, S: DocumentStorage> Clone for Document<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P, S> Document<P, S>
where
    P: PayloadParser + 'static,
    S: DocumentStorage + 'static,
{
    /// Create an empty document that is not associated with a file.
    pub fn new(parser: P, storage: S, config: DocumentConfig) -> Self {
        let (phase, _) = watch::channel(ReloadPhase::Idle);
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(DocumentState::new(parser, &config)),
                storage,
                notifier: Notifier::default(),
                cancel: CancellationToken::new(),
                closed: Cell::new(false),
                phase,
                config,
            }),
        }
    }

    /// Open the document stored behind `file`.
    ///
    /// The first reload cycle is started before this returns.
    ///
    /// # Panics
    ///
    /// Panics if called outside a [`tokio::task::LocalSet`].
    pub async fn open(
        parser: P,
        storage: S,
        config: DocumentConfig,
        file: S::Handle,
        token: Option<String>,
    ) -> Result<Self, StorageError> {
        let document = Self::new(parser, storage, config);
        document.load_from_file(file, token).await?;
        Ok(document)
    }

    /// Read `file` into this document and take over its name, token and handle.
    ///
    /// On error nothing about the document changes.
    pub async fn load_from_file(
        &self,
        file: S::Handle,
        token: Option<String>,
    ) -> Result<ReloadTrigger, StorageError> {
        let text = self.inner.storage.read_text(&file).await?;
        let name = self.inner.storage.display_name(&file);
        tracing::debug!(name = %name, len = text.len(), "document loaded from storage");

        let changes = self.inner.state.borrow_mut().attach_file(name, token, file);
        self.inner.notifier.publish(changes);
        Ok(self.set_payload(text))
    }

    /// Replace the raw payload and schedule a reload.
    ///
    /// # Panics
    ///
    /// Panics if a new cycle has to be spawned outside a [`tokio::task::LocalSet`].
    pub fn set_payload(&self, payload: impl Into<String>) -> ReloadTrigger {
        let payload = payload.into();
        if self.is_closed() {
            let changes = self.inner.state.borrow_mut().record_payload(payload);
            let trigger = if changes.is_empty() {
                ReloadTrigger::Unchanged
            } else {
                ReloadTrigger::Closed
            };
            self.inner.notifier.publish(changes);
            return trigger;
        }

        let update = self.inner.state.borrow_mut().set_payload(payload);
        if update.changes.is_empty() {
            return ReloadTrigger::Unchanged;
        }
        self.dispatch(update.changes, update.cycle)
    }

    /// Schedule a reload of the current payload without changing it.
    pub fn reload(&self) -> ReloadTrigger {
        if self.is_closed() {
            return ReloadTrigger::Closed;
        }
        let update = self.inner.state.borrow_mut().request_reload();
        self.dispatch(update.changes, update.cycle)
    }

    fn dispatch(&self, changes: Vec<DocumentChange>, cycle: Option<CycleTicket>) -> ReloadTrigger {
        // Phase is Quiescing before observers hear ReloadingChanged(true).
        let trigger = match cycle {
            Some(ticket) => {
                self.inner.phase.send_replace(ReloadPhase::Quiescing);
                ReloadTrigger::Started(self.spawn_cycle(ticket))
            }
            None => ReloadTrigger::Coalesced,
        };
        self.inner.notifier.publish(changes);
        trigger
    }

    fn spawn_cycle(&self, ticket: CycleTicket) -> JoinHandle<()> {
        let deadline = Instant::now() + self.inner.state.borrow().debounce().quiescence();
        let cancel = self.inner.cancel.clone();
        let weak: Weak<Inner<P, S>> = Rc::downgrade(&self.inner);

        tokio::task::spawn_local(async move {
            let outcome = debounce::wait_quiescence(deadline, &cancel).await;
            // Every handle dropped: nothing left to notify.
            let Some(inner) = weak.upgrade() else {
                return;
            };
            Document { inner }.complete_cycle(ticket, outcome);
        })
    }

    fn complete_cycle(&self, ticket: CycleTicket, outcome: WaitOutcome) {
        if outcome == WaitOutcome::Cancelled {
            let changes = self.inner.state.borrow_mut().abort_cycle(ticket);
            self.inner.phase.send_replace(ReloadPhase::Idle);
            self.inner.notifier.publish(changes);
            return;
        }

        let changes = self.inner.state.borrow_mut().finish_quiescence(ticket);
        if changes.is_empty() {
            return;
        }
        self.inner.phase.send_replace(ReloadPhase::Loading);
        self.inner.notifier.publish(changes);

        // An observer may have closed the document while handling the stabilized payload.
        if self.is_closed() {
            self.settle_phase();
            return;
        }

        let report = self.inner.state.borrow_mut().load();
        if let LoadOutcome::Failed(error) = &report.outcome {
            tracing::debug!(error = %error, "reload finished with a parse failure");
        }
        self.settle_phase();
        self.inner.notifier.publish(report.changes);
    }

    fn settle_phase(&self) {
        // A trigger accepted by an observer during this cycle already moved the phase on.
        if !self.inner.state.borrow().is_reloading() {
            self.inner.phase.send_replace(ReloadPhase::Idle);
        }
    }

    /// Write the current payload to the document's file.
    ///
    /// Never fails: a write error is logged, reported to observers as
    /// [`DocumentChange::SaveFailed`] and returned as [`SaveOutcome::Failed`].
    pub async fn save(&self) -> SaveOutcome {
        let (file, payload, name) = {
            let state = self.inner.state.borrow();
            (
                state.file().cloned(),
                state.payload().to_string(),
                state.name().to_string(),
            )
        };

        let result = match file {
            Some(file) => self.inner.storage.write_text(&file, &payload).await,
            None => Err(StorageError::NoFile),
        };

        match result {
            Ok(()) => {
                tracing::debug!(name = %name, len = payload.len(), "document saved");
                SaveOutcome::Saved
            }
            Err(error) => {
                tracing::error!(name = %name, error = %error, "failed to save document");
                self.inner.notifier.publish(vec![DocumentChange::SaveFailed {
                    message: error.to_string(),
                }]);
                SaveOutcome::Failed(error)
            }
        }
    }

    /// Cancel any in-flight reload and stop scheduling new ones.
    ///
    /// The cancelled cycle clears the reloading flag without parsing the next time the local
    /// task set runs.
    pub fn close(&self) {
        if self.inner.closed.replace(true) {
            return;
        }
        tracing::debug!(name = %self.name(), "document closed");
        self.inner.cancel.cancel();
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    /// Wait until no reload cycle is in flight.
    pub async fn wait_idle(&self) {
        let mut phase = self.inner.phase.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = phase.wait_for(|phase| *phase == ReloadPhase::Idle).await;
    }

    /// Subscribe to state change notifications.
    ///
    /// Callbacks run with no internal borrow held and may call back into the document.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: FnMut(&StateChange) + 'static,
    {
        self.inner.notifier.subscribe(Box::new(callback));
    }
}

impl<P: PayloadParser, S: DocumentStorage> Document<P, S> {
    /// The latest raw payload.
    pub fn payload(&self) -> String {
        self.inner.state.borrow().payload().to_string()
    }

    /// The payload as of the end of the most recent quiescence interval.
    pub fn stabilized_payload(&self) -> String {
        self.inner.state.borrow().stabilized_payload().to_string()
    }

    /// Document name.
    pub fn name(&self) -> String {
        self.inner.state.borrow().name().to_string()
    }

    /// Access token supplied when the document was opened.
    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().token().map(str::to_string)
    }

    /// Handle of the backing file, if any.
    pub fn file(&self) -> Option<S::Handle> {
        self.inner.state.borrow().file().cloned()
    }

    /// Returns `true` between trigger acceptance and quiescence expiry.
    pub fn is_reloading(&self) -> bool {
        self.inner.state.borrow().is_reloading()
    }

    /// Where the document is in its reload cycle.
    pub fn phase(&self) -> ReloadPhase {
        *self.inner.phase.borrow()
    }

    /// Current state version.
    pub fn version(&self) -> u64 {
        self.inner.notifier.version()
    }

    /// Current diagnostics, in canonical order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.state.borrow().diagnostics().to_vec()
    }

    /// The configuration the document was created with.
    pub fn config(&self) -> &DocumentConfig {
        &self.inner.config
    }

    /// The storage the document reads from and writes to.
    pub fn storage(&self) -> &S {
        &self.inner.storage
    }

    /// Run `f` with the document state.
    ///
    /// Must not be called from inside a parser.
    pub fn with_state<R>(&self, f: impl FnOnce(&DocumentState<P, S::Handle>) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    /// Run `f` with the payload parser, e.g. to read what it produced.
    pub fn with_parser<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        f(self.inner.state.borrow().parser())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{ParseError, parser_fn};
    use crate::storage::MemoryStorage;
    use std::time::Duration;

    fn config() -> DocumentConfig {
        DocumentConfig::default().with_quiescence(Duration::from_millis(100))
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_cycle_runs_after_quiescence() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let doc = Document::new(parser_fn(|_| Ok(())), MemoryStorage::new(), config());
                assert_eq!(doc.phase(), ReloadPhase::Idle);

                let trigger = doc.set_payload("a");
                assert!(trigger.is_started());
                assert!(doc.is_reloading());
                assert_eq!(doc.phase(), ReloadPhase::Quiescing);

                assert!(matches!(doc.set_payload("ab"), ReloadTrigger::Coalesced));
                assert!(matches!(doc.set_payload("ab"), ReloadTrigger::Unchanged));

                trigger.into_handle().unwrap().await.unwrap();
                assert!(!doc.is_reloading());
                assert_eq!(doc.phase(), ReloadPhase::Idle);
                assert_eq!(doc.stabilized_payload(), "ab");
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_close_aborts_cycle() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let parsed = Rc::new(Cell::new(0));
                let counter = Rc::clone(&parsed);
                let doc = Document::new(
                    parser_fn(move |_| {
                        counter.set(counter.get() + 1);
                        Err(ParseError::new("never"))
                    }),
                    MemoryStorage::new(),
                    config(),
                );

                let handle = doc.set_payload("x").into_handle().unwrap();
                doc.close();
                handle.await.unwrap();

                assert!(!doc.is_reloading());
                assert_eq!(parsed.get(), 0);
                assert!(doc.diagnostics().is_empty());
                assert!(matches!(doc.set_payload("y"), ReloadTrigger::Closed));
                assert!(matches!(doc.reload(), ReloadTrigger::Closed));
                assert_eq!(doc.payload(), "y");
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_dropping_last_handle_abandons_cycle() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let doc = Document::new(parser_fn(|_| Ok(())), MemoryStorage::new(), config());
                let handle = doc.set_payload("x").into_handle().unwrap();
                drop(doc);
                // Completes without waiting out the quiescence interval.
                let start = Instant::now();
                handle.await.unwrap();
                assert_eq!(start.elapsed(), Duration::ZERO);
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_save_without_file_fails_softly() {
        let doc = Document::new(parser_fn(|_| Ok(())), MemoryStorage::new(), config());
        let failures = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&failures);
        doc.subscribe(move |change| {
            if let DocumentChange::SaveFailed { message } = &change.change {
                sink.borrow_mut().push(message.clone());
            }
        });

        let version = doc.version();
        let outcome = doc.save().await;
        assert!(matches!(outcome, SaveOutcome::Failed(StorageError::NoFile)));
        assert_eq!(*failures.borrow(), vec!["document has no backing file".to_string()]);
        assert_eq!(doc.version(), version);
    }
}
