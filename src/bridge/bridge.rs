//! # Transport bridge: socket pair ↔ application queues.
//!
//! The [`TransportBridge`] exclusively owns the two bus sockets and runs
//! one task per direction; inbound receipt and outbound send are
//! independent and never block each other.
//!
//! ## Architecture
//! ```text
//!            bus (subscribe channel)                bus (send channel)
//!                    │                                      ▲
//!              FramedRead                              FramedWrite
//!                    ▼                                      │
//!            ┌──────────────┐   PONG replies   ┌──────────────┐
//!            │  reader task │ ───[control]───► │  writer task │
//!            └──────┬───────┘                  └──────▲───────┘
//!         reserved-tag strip                          │ biased: control first
//!         subscription filter                         │
//!                    ▼                                │
//!            [inbound queue] ─► plugin      plugin ─► [outbound queue]
//! ```
//!
//! ## Rules
//! - **Inbound**: accepted envelopes are delivered with a *blocking* send;
//!   a full inbound queue blocks delivery of that message until space
//!   frees (receive-side backpressure, nothing dropped). Filtered-out and
//!   malformed messages are dropped silently; the bridge continues. A
//!   transport-level read failure is reported to the crash recorder and
//!   stops the reader.
//! - **Heartbeat**: inbound `PING` is answered with `PONG` entirely inside
//!   the bridge; the application never sees either tag.
//! - **Outbound**: each envelope is serialized and written once. A write
//!   failure is reported to the crash recorder and the envelope is
//!   dropped — at-most-once, no retry queue.
//! - **Stop** is idempotent: the token is cancelled, both tasks are
//!   joined, sockets close on drop. A second call is a no-op.

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;

use crate::config::RuntimeConfig;
use crate::crash::CrashRecorder;
use crate::envelope::{reserved, Envelope, EnvelopeCodec};
use crate::error::RuntimeError;
use crate::subscription::Subscription;

use super::handshake;

/// Capacity of the internal control channel (heartbeat replies).
const CONTROL_CAPACITY: usize = 8;

/// Owns the bus socket pair and the per-direction I/O tasks.
pub(crate) struct TransportBridge {
    cancel: CancellationToken,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl TransportBridge {
    /// Connects both channels, performs the registration handshake, and
    /// spawns the reader/writer tasks.
    ///
    /// Fails with [`RuntimeError::TransportUnavailable`] when either
    /// connection or the handshake fails; no task is left running in that
    /// case.
    pub(crate) async fn connect(
        cfg: &RuntimeConfig,
        subscription: Subscription,
        inbound_tx: mpsc::Sender<Envelope>,
        outbound_rx: mpsc::Receiver<Envelope>,
        crash: CrashRecorder,
    ) -> Result<Self, RuntimeError> {
        let send_stream = TcpStream::connect(cfg.send_addr()).await.map_err(|e| {
            RuntimeError::TransportUnavailable {
                reason: format!("connect outbound {}: {e}", cfg.send_addr()),
            }
        })?;
        let recv_stream = TcpStream::connect(cfg.recv_addr()).await.map_err(|e| {
            RuntimeError::TransportUnavailable {
                reason: format!("connect inbound {}: {e}", cfg.recv_addr()),
            }
        })?;

        let mut frames_out = FramedWrite::new(send_stream, EnvelopeCodec::new());
        let mut frames_in = FramedRead::new(recv_stream, EnvelopeCodec::new());

        handshake::register(
            &cfg.name,
            &subscription,
            &mut frames_out,
            &mut frames_in,
            cfg.handshake_timeout,
        )
        .await?;
        tracing::info!(worker = %cfg.name, "registered with core process");

        let cancel = CancellationToken::new();
        let (control_tx, control_rx) = mpsc::channel::<Envelope>(CONTROL_CAPACITY);

        let reader = tokio::spawn(read_loop(
            frames_in,
            subscription,
            cfg.name.clone(),
            inbound_tx,
            control_tx,
            crash.clone(),
            cancel.child_token(),
        ));
        let writer = tokio::spawn(write_loop(
            frames_out,
            outbound_rx,
            control_rx,
            crash,
            cancel.child_token(),
        ));

        Ok(Self {
            cancel,
            reader: Some(reader),
            writer: Some(writer),
        })
    }

    /// Stops both directions and releases the transport.
    ///
    /// Unblocks any task waiting on queue operations (the queue ends held
    /// by the bridge are dropped when its tasks exit). Idempotent.
    pub(crate) async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(h) = self.reader.take() {
            let _ = h.await;
        }
        if let Some(h) = self.writer.take() {
            let _ = h.await;
        }
    }
}

/// Inbound direction: wire frames → filter → application queue.
async fn read_loop<R>(
    mut frames: R,
    subscription: Subscription,
    worker: String,
    inbound: mpsc::Sender<Envelope>,
    control: mpsc::Sender<Envelope>,
    crash: CrashRecorder,
    cancel: CancellationToken,
) where
    R: Stream<Item = Result<Envelope, RuntimeError>> + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = frames.next() => frame,
        };
        match frame {
            None => {
                tracing::info!("inbound channel closed by bus");
                break;
            }
            Some(Err(RuntimeError::MalformedEnvelope { reason })) => {
                tracing::warn!(%reason, "malformed inbound envelope dropped");
            }
            Some(Err(e)) => {
                crash.record("inbound receive", &e);
                tracing::warn!(error = %e.as_message(), "inbound transport error");
                break;
            }
            Some(Ok(env)) if env.is_control() => {
                if env.kind == reserved::PING {
                    // Heartbeat reply; if the writer is backed up the probe
                    // is dropped and the next PING gets answered instead.
                    let _ = control.try_send(Envelope::pong(&worker));
                }
            }
            Some(Ok(env)) => {
                if !subscription.accepts(&env.kind) {
                    continue;
                }
                // Blocking send: a full inbound queue holds this message
                // until the plugin frees space.
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    res = inbound.send(env) => {
                        if res.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Outbound direction: control replies + application queue → wire frames.
async fn write_loop<W>(
    mut frames: W,
    mut outbound: mpsc::Receiver<Envelope>,
    mut control: mpsc::Receiver<Envelope>,
    crash: CrashRecorder,
    cancel: CancellationToken,
) where
    W: Sink<Envelope, Error = RuntimeError> + Unpin,
{
    let mut control_open = true;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            env = control.recv(), if control_open => match env {
                Some(env) => send_frame(&mut frames, env, &crash).await,
                None => control_open = false,
            },
            env = outbound.recv() => match env {
                Some(env) => send_frame(&mut frames, env, &crash).await,
                None => break,
            },
        }
    }
    let _ = frames.close().await;
}

/// Serializes and writes one envelope; a failed write is recorded and the
/// envelope dropped.
async fn send_frame<W>(frames: &mut W, env: Envelope, crash: &CrashRecorder)
where
    W: Sink<Envelope, Error = RuntimeError> + Unpin,
{
    let kind = env.kind.clone();
    if let Err(e) = frames.send(env).await {
        crash.record("outbound send", &e);
        tracing::warn!(%kind, error = %e.as_message(), "outbound envelope dropped");
    }
}
