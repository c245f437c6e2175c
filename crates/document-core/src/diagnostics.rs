//! First-class diagnostics data model.
//!
//! Diagnostics are derived document state: they are recomputed after every reload cycle and
//! applied to the document's [`DiagnosticList`] with the fewest possible insertions and removals,
//! so a problems panel bound to the list sees incremental updates instead of a full rebuild.
//!
//! # Ordering
//!
//! The canonical order is by [`Severity`], most critical first. Diagnostics of equal severity
//! keep the relative order in which they were reported.

use crate::observable::ObservableList;
use crate::reconcile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity levels, ordered `Info < Warning < Error`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational diagnostics.
    #[default]
    Info,
    /// Warning diagnostics.
    Warning,
    /// Error diagnostics.
    Error,
}

impl Severity {
    /// Lowercase label used in log output and `Display`.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single diagnostic reported for a document.
///
/// Two diagnostics with the same message and severity are the same diagnostic as far as
/// reconciliation is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic message.
    pub message: String,
    /// Diagnostic severity.
    pub severity: Severity,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    /// Create an informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// The observed, ordered diagnostics collection of a document.
pub type DiagnosticList = ObservableList<Diagnostic>;

/// Sort diagnostics into canonical order (most severe first, stable within a severity).
pub fn sort_canonical(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| b.severity.cmp(&a.severity));
}

/// Returns `true` if `diagnostics` is already in canonical order.
pub fn is_canonical(diagnostics: &[Diagnostic]) -> bool {
    diagnostics
        .windows(2)
        .all(|pair| pair[0].severity >= pair[1].severity)
}

/// Make `list` hold exactly `desired` (in canonical order) with the fewest recorded changes.
///
/// Returns the number of recorded insertions and removals.
pub fn make_errors_like(list: &mut DiagnosticList, mut desired: Vec<Diagnostic>) -> usize {
    sort_canonical(&mut desired);
    let edits = reconcile::reconcile(list, &desired);
    if edits > 0 {
        tracing::trace!(edits, total = desired.len(), "reconciled diagnostics");
    }
    edits
}

/// Make `list` hold exactly one diagnostic.
pub fn set_single_error(list: &mut DiagnosticList, diagnostic: Diagnostic) -> usize {
    make_errors_like(list, vec![diagnostic])
}
