//! # Application-facing message queues.
//!
//! The two bounded queues are the only shared state between the plugin's
//! application task and the transport bridge's I/O tasks:
//!
//! ```text
//!   bus ──► bridge reader ──► [inbound queue]  ──► Inbox::recv()
//!   Outbox::send() ──► [outbound queue] ──► bridge writer ──► bus
//! ```
//!
//! Both are bounded [`tokio::sync::mpsc`] channels with blocking hand-off
//! semantics: a full inbound queue blocks the bridge's delivery of the next
//! accepted message (receive-side backpressure, nothing dropped), and a
//! full outbound queue blocks the plugin's `send` until the bridge drains.
//!
//! ## Ordering
//! FIFO holds within a single direction and a single sender. No ordering
//! guarantee holds across senders or across the inbound/outbound boundary;
//! plugin code must not assume global ordering.
//!
//! ## Example
//! ```rust,no_run
//! # use comet_runtime::{Controller, RuntimeConfig, Envelope};
//! # use serde_json::json;
//! # async fn demo() {
//! let (controller, mailbox) = Controller::new(RuntimeConfig::new("sensor"));
//! mailbox
//!     .outbox
//!     .send(Envelope::new("sensor", "STATUS", json!({"ok": true})))
//!     .await
//!     .unwrap();
//! if let Some(env) = mailbox.inbox.recv().await {
//!     println!("got {}", env.kind);
//! }
//! # }
//! ```

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::envelope::Envelope;
use crate::error::RuntimeError;

/// Consuming end of the inbound queue (bus → plugin).
///
/// The receiver sits behind an async mutex so plugin methods taking
/// `&self` can receive without external synchronization; the runtime hands
/// out exactly one `Inbox`, so the lock is uncontended in practice.
pub struct Inbox {
    rx: Mutex<mpsc::Receiver<Envelope>>,
}

impl Inbox {
    pub(crate) fn new(rx: mpsc::Receiver<Envelope>) -> Self {
        Self { rx: Mutex::new(rx) }
    }

    /// Receives the next accepted envelope, waiting until one arrives.
    ///
    /// Returns `None` once the bridge has stopped and the queue is empty.
    pub async fn recv(&self) -> Option<Envelope> {
        self.rx.lock().await.recv().await
    }

    /// Non-blocking receive; `None` when the queue is currently empty or
    /// closed.
    pub fn try_recv(&self) -> Option<Envelope> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    /// Cancel-aware receive for main-loop bodies.
    ///
    /// Resolves to `None` when `cancel` fires or the queue closes — a
    /// convenient single suspension point that still honors the
    /// cooperative-cancellation contract.
    pub async fn recv_or_cancelled(&self, cancel: &CancellationToken) -> Option<Envelope> {
        tokio::select! {
            env = self.recv() => env,
            _ = cancel.cancelled() => None,
        }
    }
}

/// Producing end of the outbound queue (plugin → bus).
///
/// Cheap to clone; every clone feeds the same bridge writer.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::Sender<Envelope>,
}

impl Outbox {
    pub(crate) fn new(tx: mpsc::Sender<Envelope>) -> Self {
        Self { tx }
    }

    /// Enqueues an envelope for transmission, waiting while the queue is
    /// full.
    ///
    /// Fails with [`RuntimeError::SendFailure`] once the bridge has
    /// stopped.
    pub async fn send(&self, env: Envelope) -> Result<(), RuntimeError> {
        self.tx
            .send(env)
            .await
            .map_err(|_| RuntimeError::SendFailure {
                reason: "outbound queue closed".to_string(),
            })
    }

    /// Non-blocking enqueue; fails when the queue is full or closed.
    pub fn try_send(&self, env: Envelope) -> Result<(), RuntimeError> {
        self.tx.try_send(env).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RuntimeError::SendFailure {
                reason: "outbound queue full".to_string(),
            },
            mpsc::error::TrySendError::Closed(_) => RuntimeError::SendFailure {
                reason: "outbound queue closed".to_string(),
            },
        })
    }
}

/// The pair of queue handles handed to the plugin at construction.
pub struct Mailbox {
    /// Inbound consume side.
    pub inbox: Inbox,
    /// Outbound produce side.
    pub outbox: Outbox,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(kind: &str) -> Envelope {
        Envelope::new("w", kind, json!(null))
    }

    #[tokio::test]
    async fn inbox_preserves_fifo_within_direction() {
        let (tx, rx) = mpsc::channel(8);
        let inbox = Inbox::new(rx);
        tx.send(env("A")).await.unwrap();
        tx.send(env("B")).await.unwrap();
        assert_eq!(inbox.recv().await.unwrap().kind, "A");
        assert_eq!(inbox.recv().await.unwrap().kind, "B");
    }

    #[tokio::test]
    async fn inbox_try_recv_is_non_blocking() {
        let (tx, rx) = mpsc::channel(8);
        let inbox = Inbox::new(rx);
        assert!(inbox.try_recv().is_none());

        tx.send(env("A")).await.unwrap();
        tx.send(env("B")).await.unwrap();
        assert_eq!(inbox.try_recv().unwrap().kind, "A");
        assert_eq!(inbox.try_recv().unwrap().kind, "B");
        assert!(inbox.try_recv().is_none());
    }

    #[tokio::test]
    async fn inbox_recv_returns_none_after_close() {
        let (tx, rx) = mpsc::channel(1);
        let inbox = Inbox::new(rx);
        drop(tx);
        assert!(inbox.recv().await.is_none());
    }

    #[tokio::test]
    async fn recv_or_cancelled_observes_cancellation() {
        let (_tx, rx) = mpsc::channel::<Envelope>(1);
        let inbox = Inbox::new(rx);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(inbox.recv_or_cancelled(&cancel).await.is_none());
    }

    #[tokio::test]
    async fn outbox_send_fails_after_bridge_stop() {
        let (tx, rx) = mpsc::channel(1);
        let outbox = Outbox::new(tx);
        drop(rx);
        let err = outbox.send(env("STATUS")).await.unwrap_err();
        assert_eq!(err.as_label(), "send_failure");
    }

    #[tokio::test]
    async fn outbox_try_send_reports_full() {
        let (tx, _rx) = mpsc::channel(1);
        let outbox = Outbox::new(tx);
        outbox.try_send(env("A")).unwrap();
        let err = outbox.try_send(env("B")).unwrap_err();
        assert!(err.as_message().contains("full"));
    }
}
