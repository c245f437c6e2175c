//! Reload debouncing.
//!
//! [`DebounceController`] decides whether a payload change starts a new reload cycle. It is a
//! plain synchronous state machine; the actual waiting is done by the caller (see
//! [`wait_quiescence`]) so the controller can be driven by any executor, or by hand in tests.
//!
//! # Policy
//!
//! A trigger that arrives while a cycle is active is **coalesced**: it does not queue another
//! cycle and does not re-arm the timer. Whatever the payload is when the quiescence interval
//! expires is what the upcoming reload sees, so edits made late in the window are still picked up
//! by that reload.
//!
//! # Cycle tickets
//!
//! Starting a cycle hands out a [`CycleTicket`]. The ticket is not `Clone`, and finishing or
//! aborting a cycle consumes it, so every "reloading = true" is paired with exactly one
//! "reloading = false". A ticket from an earlier cycle is rejected.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default quiescence interval between trigger acceptance and reload.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(1000);

/// Proof that a reload cycle was started.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a started cycle must be finished or aborted"]
pub struct CycleTicket {
    id: u64,
}

impl CycleTicket {
    /// Monotonic id of the cycle this ticket belongs to.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Result of [`DebounceController::trigger`].
#[derive(Debug, PartialEq, Eq)]
pub enum Trigger {
    /// A new cycle started; the caller must wait the quiescence interval and then finish it.
    Started(CycleTicket),
    /// A cycle was already active; this trigger is folded into it.
    Coalesced,
}

/// Where a document is in its reload cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadPhase {
    /// No cycle in flight.
    #[default]
    Idle,
    /// Waiting for the quiescence interval to expire (`is_reloading` is true).
    Quiescing,
    /// Quiescence expired; the load step is running.
    Loading,
}

/// Synchronous debounce state machine.
#[derive(Debug, Clone)]
pub struct DebounceController {
    quiescence: Duration,
    active: Option<u64>,
    last_cycle: u64,
    coalesced: u64,
}

impl Default for DebounceController {
    fn default() -> Self {
        Self::new(DEFAULT_QUIESCENCE)
    }
}

impl DebounceController {
    /// Create a controller with the given quiescence interval.
    pub fn new(quiescence: Duration) -> Self {
        Self {
            quiescence,
            active: None,
            last_cycle: 0,
            coalesced: 0,
        }
    }

    /// The quiescence interval.
    pub fn quiescence(&self) -> Duration {
        self.quiescence
    }

    /// Change the quiescence interval. Takes effect for the next cycle.
    pub fn set_quiescence(&mut self, quiescence: Duration) {
        self.quiescence = quiescence;
    }

    /// Returns `true` between trigger acceptance and quiescence expiry.
    pub fn is_reloading(&self) -> bool {
        self.active.is_some()
    }

    /// Id of the active cycle, if any.
    pub fn active_cycle(&self) -> Option<u64> {
        self.active
    }

    /// Number of cycles started so far.
    pub fn cycles_started(&self) -> u64 {
        self.last_cycle
    }

    /// Number of triggers coalesced into the active (or most recent) cycle.
    pub fn coalesced_triggers(&self) -> u64 {
        self.coalesced
    }

    /// Signal a payload change.
    pub fn trigger(&mut self) -> Trigger {
        if let Some(active) = self.active {
            self.coalesced += 1;
            tracing::trace!(cycle = active, coalesced = self.coalesced, "trigger coalesced");
            return Trigger::Coalesced;
        }

        self.last_cycle += 1;
        self.active = Some(self.last_cycle);
        self.coalesced = 0;
        tracing::debug!(cycle = self.last_cycle, quiescence = ?self.quiescence, "reload cycle started");
        Trigger::Started(CycleTicket {
            id: self.last_cycle,
        })
    }

    /// Mark the quiescence interval of `ticket`'s cycle as expired.
    ///
    /// Returns `false` (and changes nothing) if `ticket` is not the active cycle.
    pub fn finish(&mut self, ticket: CycleTicket) -> bool {
        self.release(ticket, "reload cycle quiesced")
    }

    /// Abandon `ticket`'s cycle without reloading.
    ///
    /// Returns `false` (and changes nothing) if `ticket` is not the active cycle.
    pub fn abort(&mut self, ticket: CycleTicket) -> bool {
        self.release(ticket, "reload cycle aborted")
    }

    fn release(&mut self, ticket: CycleTicket, what: &'static str) -> bool {
        if self.active != Some(ticket.id) {
            tracing::warn!(cycle = ticket.id, active = ?self.active, "stale reload cycle ticket");
            return false;
        }
        self.active = None;
        tracing::debug!(cycle = ticket.id, coalesced = self.coalesced, "{what}");
        true
    }
}

/// How a quiescence wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The deadline was reached.
    Elapsed,
    /// `cancel` fired first.
    Cancelled,
}

/// Suspend until `deadline` or until `cancel` fires, whichever comes first.
///
/// The deadline is taken by value so the interval is measured from trigger acceptance, not from
/// whenever the waiting task first gets polled.
pub async fn wait_quiescence(deadline: Instant, cancel: &CancellationToken) -> WaitOutcome {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => WaitOutcome::Cancelled,
        _ = tokio::time::sleep_until(deadline) => WaitOutcome::Elapsed,
    }
}
