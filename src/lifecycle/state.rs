//! # Lifecycle state machine.
//!
//! `Created → Starting → Running → Stopping → Terminated`, with a failure
//! edge from `Starting` straight to `Terminated` (handshake or startup
//! hook failure). Transitions are monotonic; a terminated runtime is never
//! resurrected.
//!
//! State is owned exclusively by the [`Controller`](crate::Controller) and
//! published through a [`tokio::sync::watch`] channel so hosts and tests
//! can observe or await transitions without polling.

use tokio::sync::watch;

/// Position of the worker in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    /// Constructed; nothing started yet.
    Created,
    /// Bridge connecting and handshaking with the core process.
    Starting,
    /// Startup hook and main loop execute in this state.
    Running,
    /// Main loop returned; shutdown hook and bridge teardown in progress.
    Stopping,
    /// Final state; all resources released.
    Terminated,
}

impl LifecycleState {
    /// Short stable label (snake_case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleState::Created => "created",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Terminated => "terminated",
        }
    }
}

/// Watch-backed cell holding the current state.
///
/// `advance` enforces monotonicity: moving backwards is a programming
/// error in the controller and panics in debug builds only.
pub(crate) struct StateCell {
    tx: watch::Sender<LifecycleState>,
}

impl StateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Created);
        Self { tx }
    }

    pub(crate) fn get(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    pub(crate) fn advance(&self, next: LifecycleState) {
        debug_assert!(self.get() <= next, "lifecycle state moved backwards");
        tracing::debug!(state = next.as_label(), "lifecycle transition");
        // send_replace stores even when no receiver is subscribed.
        self.tx.send_replace(next);
    }
}
