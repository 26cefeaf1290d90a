//! # comet-runtime
//!
//! **comet-runtime** is the process substrate for pluggable bus workers
//! ("comets"): it attaches a plugin to a shared message bus, exchanges
//! typed envelopes with peer workers and the coordinating core process,
//! and terminates cleanly on external request. Plugin business logic stays
//! with plugin authors; this crate owns everything they rely on.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                 core process / peer workers
//!                            ▲ │
//!               (bus: two TCP channels, JSON frames)
//!                            │ ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  TransportBridge (I/O tasks, one per direction)           │
//! │  - registration handshake (REGISTER → REGISTER_ACK)       │
//! │  - heartbeat (PING → PONG, never surfaced)                │
//! │  - subscription filter on the inbound path                │
//! └───────┬──────────────────────────────────────────▲────────┘
//!         ▼ [inbound queue]            [outbound queue]
//! ┌───────────────────────────────────────────────────────────┐
//! │  Plugin (application task)                                │
//! │  on_startup ─► run(cancellation token) ─► on_shutdown     │
//! └───────────────────────────────────────────────────────────┘
//!          ▲ driven by the Controller (lifecycle state machine)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Created ─► Starting ─► Running ─► Stopping ─► Terminated
//!               │ handshake failure
//!               └─────────────────────────────► Terminated
//! ```
//!
//! ## Features
//! | Area            | Description                                            | Key types                              |
//! |-----------------|--------------------------------------------------------|----------------------------------------|
//! | **Lifecycle**   | State machine, hook ordering, cooperative shutdown.    | [`Controller`], [`ShutdownHandle`]     |
//! | **Messages**    | Immutable envelope + wire codec (length-prefixed JSON).| [`Envelope`], [`EnvelopeCodec`]        |
//! | **Filtering**   | Wildcard or exact-tag subscription sets.               | [`Subscription`]                       |
//! | **Queues**      | Bounded, blocking hand-off between plugin and bridge.  | [`Mailbox`], [`Inbox`], [`Outbox`]     |
//! | **Failures**    | Typed errors + per-user persistent crash log.          | [`RuntimeError`], [`CrashRecorder`]    |
//! | **Plugins**     | The three-hook contract workers implement.             | [`Plugin`], [`PluginRef`]              |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use comet_runtime::{
//!     Controller, Envelope, Mailbox, Plugin, PluginError, RuntimeConfig, Subscription,
//! };
//!
//! struct Reporter {
//!     mailbox: Mailbox,
//! }
//!
//! #[async_trait]
//! impl Plugin for Reporter {
//!     fn name(&self) -> &str {
//!         "reporter"
//!     }
//!
//!     fn subscription(&self) -> Subscription {
//!         Subscription::to(["COMMAND"])
//!     }
//!
//!     async fn run(&self, ctx: CancellationToken) -> Result<(), PluginError> {
//!         while let Some(cmd) = self.mailbox.inbox.recv_or_cancelled(&ctx).await {
//!             let status = Envelope::new("reporter", "STATUS", cmd.payload);
//!             self.mailbox.outbox.send(status).await.map_err(PluginError::fail)?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = RuntimeConfig::new("reporter");
//!     let (controller, mailbox) = Controller::new(cfg);
//!     controller.run(Arc::new(Reporter { mailbox })).await?;
//!     Ok(())
//! }
//! ```

mod bridge;
mod config;
mod crash;
mod diagnostics;
mod envelope;
mod error;
mod lifecycle;
mod plugin;
mod queues;
mod signals;
mod subscription;

// ---- Public re-exports ----

pub use config::{RuntimeConfig, DEFAULT_RECV_PORT, DEFAULT_SEND_PORT};
pub use crash::CrashRecorder;
pub use diagnostics::init_diagnostics;
pub use envelope::{reserved, Envelope, EnvelopeCodec};
pub use error::{PluginError, RuntimeError};
pub use lifecycle::{Controller, LifecycleState, ShutdownHandle};
pub use plugin::{Plugin, PluginRef};
pub use queues::{Inbox, Mailbox, Outbox};
pub use signals::wait_for_shutdown_signal;
pub use subscription::Subscription;
