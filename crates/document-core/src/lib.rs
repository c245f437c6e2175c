#![warn(missing_docs)]
//! Document Core - Debounced Reload Kernel for Live Text Documents
//!
//! # Overview
//!
//! `document-core` keeps a continuously edited text payload in sync with a structured
//! representation produced by a host-supplied parser. It decides *when* to re-parse after a burst
//! of edits, guarantees at most one reload in flight per document, and surfaces parse problems as
//! an ordered diagnostics list that is updated with a minimal number of insertions and removals.
//! It does not know anything about the payload format.
//!
//! # Core Features
//!
//! - **Debounced Reload**: one reload per quiescence interval, edits during the window coalesced
//! - **Minimal-Churn Diagnostics**: LCS-based insert/remove scripts over a canonical order
//! - **Explicit State Transitions**: every change is a value, versioned and forwarded to observers
//! - **Cancellation**: closing or dropping a document abandons the in-flight reload
//! - **Pluggable Boundaries**: parser strategy and async storage are traits
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Document (Rc handle, spawn_local driver)   │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  DocumentState (explicit transitions)       │  ← State Management
//! ├──────────────────────┬──────────────────────┤
//! │  DebounceController  │  Load step (parser)  │  ← Reload Cycle
//! ├──────────────────────┴──────────────────────┤
//! │  ObservableList + diff/reconcile            │  ← Diagnostics
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use document_core::{Diagnostic, Document, DocumentChange, DocumentConfig, MemoryStorage};
//! use document_core::{ParseError, parser_fn};
//! use std::time::Duration;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! tokio::task::LocalSet::new().run_until(async {
//!     let config = DocumentConfig::default().with_quiescence(Duration::from_millis(10));
//!     let parser = parser_fn(|payload: &str| {
//!         payload.parse::<i64>().map(|_| ()).map_err(|e| ParseError::with_source("not a number", e))
//!     });
//!     let doc = Document::new(parser, MemoryStorage::new(), config);
//!
//!     doc.subscribe(|change| {
//!         if let DocumentChange::Diagnostics(edit) = &change.change {
//!             println!("v{}: {:?}", change.new_version, edit);
//!         }
//!     });
//!
//!     doc.set_payload("4").into_handle().unwrap().await.unwrap();
//!     assert!(doc.diagnostics().is_empty());
//!
//!     doc.set_payload("4x").into_handle().unwrap().await.unwrap();
//!     assert_eq!(doc.diagnostics(), vec![Diagnostic::error("Loading failed")]);
//! }).await;
//! # });
//! ```
//!
//! # Module Description
//!
//! - [`reconcile`] - Generic minimal edit scripts between two sequences
//! - [`observable`] - Ordered list that records its own insertions and removals
//! - [`diagnostics`] - Diagnostic type, canonical order and list reconciliation
//! - [`debounce`] - Reload cycle state machine and the quiescence wait
//! - [`load`] - Parser boundary and the load step
//! - [`state`] - Document state and its transitions
//! - [`document`] - The live document and its async driver
//! - [`storage`] - Persistence boundary
//! - [`config`] - Document configuration

pub mod config;
pub mod debounce;
pub mod diagnostics;
pub mod document;
pub mod load;
mod notify;
pub mod observable;
pub mod reconcile;
pub mod state;
pub mod storage;

pub use config::{ConfigError, DEFAULT_DOCUMENT_NAME, DocumentConfig};
pub use debounce::{
    CycleTicket, DEFAULT_QUIESCENCE, DebounceController, ReloadPhase, Trigger, WaitOutcome,
};
pub use diagnostics::{Diagnostic, DiagnosticList, Severity, make_errors_like, set_single_error};
pub use document::{Document, ReloadTrigger, SaveOutcome};
pub use load::{
    FnParser, INVALID_PAYLOAD_MESSAGE, LOADING_FAILED_MESSAGE, LoadOutcome, ParseError,
    PayloadParser, parser_fn, run_load,
};
pub use notify::StateChangeCallback;
pub use observable::{ListChange, ObservableList};
pub use reconcile::{EditTarget, SeqEdit, diff, diff_by, reconcile, reconcile_by};
pub use state::{DocumentChange, DocumentState, LoadReport, PayloadUpdate, StateChange};
pub use storage::{DocumentStorage, FsStorage, MemoryStorage, StorageError};
