//! # Lifecycle controller: hook ordering, shutdown coordination, cleanup.
//!
//! The [`Controller`] owns the two application-facing queues and the
//! lifecycle state, starts the transport bridge, and drives the plugin
//! hooks in strict order with guaranteed cleanup:
//!
//! ```text
//! run(plugin):
//!   Created ─► Starting
//!      ├─► TransportBridge::connect + handshake
//!      │      └─ failure ──► Terminated (TransportUnavailable; no hooks run)
//!      ▼
//!   Running
//!      ├─► on_startup()
//!      │      └─ failure ──► bridge stopped ──► Terminated (StartupFailed;
//!      │                     loop and shutdown hook skipped)
//!      ├─► plugin.run(token)   ◄── cancelled by OS signal or ShutdownHandle
//!      ▼
//!   Stopping
//!      ├─► on_shutdown()       (exactly once, even if the loop failed)
//!      ├─► bridge.stop()       (idempotent, even if the hook failed)
//!      ▼
//!   Terminated
//! ```
//!
//! ## Rules
//! - Cancellation is **cooperative only**: the controller flips the token
//!   and waits for the loop to return; it never aborts the loop. Grace
//!   escalation after that belongs to the host, not this runtime.
//! - Hook and loop failures — `Err` returns and panics alike — are
//!   captured by the [`CrashRecorder`] and never prevent the remaining
//!   cleanup stages.
//! - A failed or panicked main loop still ends in `Terminated` with
//!   `Ok(())`: production behavior is silent continuation, with the crash
//!   log as the record.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::bridge::TransportBridge;
use crate::config::RuntimeConfig;
use crate::crash::CrashRecorder;
use crate::diagnostics;
use crate::envelope::Envelope;
use crate::error::{PluginError, RuntimeError};
use crate::plugin::PluginRef;
use crate::queues::{Inbox, Mailbox, Outbox};
use crate::signals;

use super::state::{LifecycleState, StateCell};

/// Cloneable external shutdown trigger.
///
/// `stop()` flips the cancellation flag read by the plugin's loop; the
/// runtime then waits for the loop to return on its own.
#[derive(Clone)]
pub struct ShutdownHandle {
    cancel: CancellationToken,
}

impl ShutdownHandle {
    /// Requests cooperative shutdown. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// The cancellation predicate: true until shutdown has been requested.
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

/// Drives one plugin through the full worker lifecycle.
pub struct Controller {
    cfg: RuntimeConfig,
    crash: CrashRecorder,
    state: StateCell,
    cancel: CancellationToken,
    inbound_tx: mpsc::Sender<Envelope>,
    outbound_rx: mpsc::Receiver<Envelope>,
}

impl Controller {
    /// Creates a controller and the [`Mailbox`] for the plugin.
    ///
    /// The mailbox is handed out exactly once, here — queue handles are
    /// injected into the plugin at construction, never ambient.
    pub fn new(cfg: RuntimeConfig) -> (Self, Mailbox) {
        let (inbound_tx, inbound_rx) = mpsc::channel(cfg.inbound_capacity_clamped());
        let (outbound_tx, outbound_rx) = mpsc::channel(cfg.outbound_capacity_clamped());

        let crash = match &cfg.crash_dir {
            Some(dir) => CrashRecorder::with_dir(cfg.name.as_str(), dir),
            None => CrashRecorder::new(cfg.name.as_str()),
        };

        let controller = Self {
            cfg,
            crash,
            state: StateCell::new(),
            cancel: CancellationToken::new(),
            inbound_tx,
            outbound_rx,
        };
        let mailbox = Mailbox {
            inbox: Inbox::new(inbound_rx),
            outbox: Outbox::new(outbound_tx),
        };
        (controller, mailbox)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Watch channel observing lifecycle transitions; the last value
    /// remains readable after termination.
    pub fn watch_state(&self) -> watch::Receiver<LifecycleState> {
        self.state.watch()
    }

    /// External shutdown trigger for hosts and embedders.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            cancel: self.cancel.clone(),
        }
    }

    /// Crash recorder shared with the bridge; public so hosts can hand it
    /// to plugin code for manual reports.
    pub fn crash_recorder(&self) -> CrashRecorder {
        self.crash.clone()
    }

    /// Runs the complete lifecycle for `plugin`; consumed on use — a
    /// terminated runtime is never restarted.
    ///
    /// Returns `Err` only for startup-fatal conditions
    /// ([`RuntimeError::TransportUnavailable`],
    /// [`RuntimeError::StartupFailed`]); every other failure is recorded
    /// and the lifecycle still completes with `Ok(())`.
    pub async fn run(self, plugin: PluginRef) -> Result<(), RuntimeError> {
        let Controller {
            cfg,
            crash,
            state,
            cancel,
            inbound_tx,
            outbound_rx,
        } = self;

        diagnostics::init_diagnostics(cfg.dev_mode);
        state.advance(LifecycleState::Starting);

        let mut bridge = match TransportBridge::connect(
            &cfg,
            plugin.subscription(),
            inbound_tx,
            outbound_rx,
            crash.clone(),
        )
        .await
        {
            Ok(bridge) => bridge,
            Err(e) => {
                crash.record("transport startup", &e);
                state.advance(LifecycleState::Terminated);
                return Err(e);
            }
        };

        state.advance(LifecycleState::Running);

        // The shutdown hook is owed only to a startup hook that returned
        // normally; a failed startup skips both the loop and the hook.
        if let Err(reason) = invoke_stage("startup hook", plugin.on_startup(), &crash).await {
            bridge.stop().await;
            state.advance(LifecycleState::Terminated);
            return Err(RuntimeError::StartupFailed { reason });
        }

        drive_main_loop(&plugin, &cancel, &crash).await;

        state.advance(LifecycleState::Stopping);
        let _ = invoke_stage("shutdown hook", plugin.on_shutdown(), &crash).await;
        bridge.stop().await;
        state.advance(LifecycleState::Terminated);
        Ok(())
    }
}

/// Runs the main loop until it returns, flipping the cancellation token
/// on OS signal. The loop is polled to completion either way —
/// cancellation stays cooperative.
async fn drive_main_loop(plugin: &PluginRef, cancel: &CancellationToken, crash: &CrashRecorder) {
    drive_loop_until(plugin, cancel, crash, signals::wait_for_shutdown_signal()).await;
}

/// Loop driver with an injectable shutdown trigger.
///
/// Cancellation happens only when `signal` resolves `Ok`: a failed
/// listener registration is logged and the loop keeps running on the
/// external [`ShutdownHandle`] alone — it is not a termination request.
async fn drive_loop_until<S>(
    plugin: &PluginRef,
    cancel: &CancellationToken,
    crash: &CrashRecorder,
    signal: S,
) where
    S: Future<Output = std::io::Result<&'static str>>,
{
    let loop_fut = AssertUnwindSafe(plugin.run(cancel.child_token())).catch_unwind();
    tokio::pin!(loop_fut);
    tokio::pin!(signal);

    let mut signal_seen = false;
    let outcome = loop {
        tokio::select! {
            outcome = &mut loop_fut => break outcome,
            sig = &mut signal, if !signal_seen => {
                signal_seen = true;
                match sig {
                    Ok(fired) => {
                        tracing::info!(signal = fired, "shutdown signal received");
                        cancel.cancel();
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "signal listener unavailable, external stop only");
                    }
                }
            }
        }
    };

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.is_graceful() => {}
        Ok(Err(e)) => crash.record("main loop", &e),
        Err(panic) => crash.record_message("main loop", &panic_detail(panic)),
    }
}

/// Invokes one hook with panic isolation; failures are recorded and
/// reported back as a plain message for the caller to act on.
async fn invoke_stage<F>(context: &str, fut: F, crash: &CrashRecorder) -> Result<(), String>
where
    F: Future<Output = Result<(), PluginError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) if e.is_graceful() => Ok(()),
        Ok(Err(e)) => {
            crash.record(context, &e);
            Err(e.as_message())
        }
        Err(panic) => {
            let detail = panic_detail(panic);
            crash.record_message(context, &detail);
            Err(detail)
        }
    }
}

/// Extracts a printable message from a panic payload.
fn panic_detail(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: <non-string payload>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Plugin;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Loop body that runs briefly unless cancelled first.
    struct Looper {
        saw_cancel: AtomicBool,
    }

    #[async_trait]
    impl Plugin for Looper {
        fn name(&self) -> &str {
            "looper"
        }

        async fn run(&self, ctx: CancellationToken) -> Result<(), PluginError> {
            tokio::select! {
                _ = ctx.cancelled() => self.saw_cancel.store(true, Ordering::SeqCst),
                _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_signal_listener_does_not_cancel_the_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let crash = CrashRecorder::with_dir("w", tmp.path());
        let cancel = CancellationToken::new();
        let looper = Arc::new(Looper {
            saw_cancel: AtomicBool::new(false),
        });
        let plugin: PluginRef = looper.clone();

        let broken = std::future::ready(Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "no signal driver",
        )));
        drive_loop_until(&plugin, &cancel, &crash, broken).await;

        // The loop ran to its natural end, untouched by the failure.
        assert!(!looper.saw_cancel.load(Ordering::SeqCst));
        assert!(!cancel.is_cancelled());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn received_signal_cancels_the_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let crash = CrashRecorder::with_dir("w", tmp.path());
        let cancel = CancellationToken::new();
        let looper = Arc::new(Looper {
            saw_cancel: AtomicBool::new(false),
        });
        let plugin: PluginRef = looper.clone();

        drive_loop_until(&plugin, &cancel, &crash, std::future::ready(Ok("SIGTERM"))).await;

        assert!(looper.saw_cancel.load(Ordering::SeqCst));
        assert!(cancel.is_cancelled());
    }
}
