//! # Plugin contract consumed by the lifecycle controller.
//!
//! A [`Plugin`] supplies the three synchronously-ordered entry points the
//! controller drives: `on_startup`, the main loop (`run`), and
//! `on_shutdown`. The plugin owns its two queue handles (a
//! [`Mailbox`](crate::Mailbox)) — handed to it at construction by the
//! host, not fetched from ambient globals.
//!
//! ## Cooperative cancellation
//! The main loop receives a [`CancellationToken`] and must poll it at
//! iteration boundaries (`ctx.is_cancelled()`, or a cancel-aware receive
//! such as [`Inbox::recv_or_cancelled`](crate::Inbox::recv_or_cancelled)).
//! The controller never forcibly interrupts the loop — polling the token
//! at loop-iteration granularity is the one correctness requirement placed
//! on plugin authors. A loop that never polls stalls shutdown until it
//! exits naturally or the host escalates.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use comet_runtime::{Mailbox, Plugin, PluginError, Subscription};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Echo {
//!     mailbox: Mailbox,
//! }
//!
//! #[async_trait]
//! impl Plugin for Echo {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     fn subscription(&self) -> Subscription {
//!         Subscription::to(["COMMAND"])
//!     }
//!
//!     async fn run(&self, ctx: CancellationToken) -> Result<(), PluginError> {
//!         while let Some(env) = self.mailbox.inbox.recv_or_cancelled(&ctx).await {
//!             let reply = comet_runtime::Envelope::new("echo", "STATUS", env.payload);
//!             self.mailbox.outbox.send(reply).await.map_err(PluginError::fail)?;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::PluginError;
use crate::subscription::Subscription;

/// Shared handle to a plugin implementation.
pub type PluginRef = Arc<dyn Plugin>;

/// # A pluggable bus worker.
///
/// The controller invokes the methods in strict order: `on_startup`, then
/// `run`, then `on_shutdown` — each at most once per process. Failures
/// (including panics) in any of them are captured by the crash recorder
/// and do not prevent later cleanup stages from running, with one
/// exception: a failed `on_startup` skips both `run` and `on_shutdown`.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Returns the worker identity: the registration key with the core
    /// process and the `name` stamped on self-sent envelopes. Non-empty,
    /// stable for the process lifetime.
    fn name(&self) -> &str;

    /// Declares which message types this worker receives.
    ///
    /// Defaults to the wildcard. Fixed at registration; there is no
    /// re-subscription at runtime.
    fn subscription(&self) -> Subscription {
        Subscription::All
    }

    /// One-time initialization, run after the registration handshake
    /// succeeds and before the main loop starts.
    async fn on_startup(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// The plugin's main work loop.
    ///
    /// Runs until it returns on its own or observes cancellation via
    /// `ctx`. Returning [`PluginError::Canceled`] is a graceful exit.
    async fn run(&self, ctx: CancellationToken) -> Result<(), PluginError>;

    /// One-time teardown, run after the main loop returns (for any
    /// reason) and before the transport bridge is stopped.
    async fn on_shutdown(&self) -> Result<(), PluginError> {
        Ok(())
    }
}
