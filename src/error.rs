//! Error types used by the comet runtime and plugins.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`] — errors raised by the runtime substrate itself
//!   (transport setup, wire decoding, outbound delivery, startup).
//! - [`PluginError`] — errors raised by plugin hooks and the main loop.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging and crash-report entries.
//!
//! ## Propagation policy
//! - `TransportUnavailable` and `StartupFailed` are fatal to `run()`.
//! - `MalformedEnvelope` and `SendFailure` are per-message: the offending
//!   envelope is dropped and the bridge continues.
//! - Plugin failures are captured by the [`CrashRecorder`](crate::CrashRecorder)
//!   and never prevent later lifecycle stages from running.

use thiserror::Error;

/// # Errors produced by the comet runtime.
///
/// These represent failures in the runtime substrate: the transport
/// bridge, the envelope codec, and the startup sequence.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Bus connection or registration handshake failed.
    ///
    /// Fatal to startup: the main loop is never invoked and the runtime
    /// transitions straight to `Terminated`. No retry is attempted here;
    /// reconnection policy belongs to the host.
    #[error("transport unavailable: {reason}")]
    TransportUnavailable {
        /// What went wrong (connect refusal, handshake timeout, ...).
        reason: String,
    },

    /// An inbound wire message violated the envelope structure.
    ///
    /// Raised only for structural violations (missing fields, wrong
    /// types, invalid framing) — never for payload content. The message
    /// is dropped and the bridge keeps reading.
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope {
        /// Decode failure detail.
        reason: String,
    },

    /// An outbound transport write failed.
    ///
    /// The envelope is dropped (no retry queue exists) and the failure is
    /// reported to the crash recorder; the bridge keeps draining.
    #[error("outbound send failed: {reason}")]
    SendFailure {
        /// Write failure detail.
        reason: String,
    },

    /// The plugin's startup hook failed or panicked.
    ///
    /// The main loop and the shutdown hook are both skipped; the failure
    /// is recorded and the runtime terminates.
    #[error("startup hook failed: {reason}")]
    StartupFailed {
        /// Hook failure detail.
        reason: String,
    },

    /// Transport-level I/O error surfaced through the codec seam.
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs and
    /// crash-report entries.
    ///
    /// # Example
    /// ```
    /// use comet_runtime::RuntimeError;
    ///
    /// let err = RuntimeError::TransportUnavailable { reason: "refused".into() };
    /// assert_eq!(err.as_label(), "transport_unavailable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::TransportUnavailable { .. } => "transport_unavailable",
            RuntimeError::MalformedEnvelope { .. } => "malformed_envelope",
            RuntimeError::SendFailure { .. } => "send_failure",
            RuntimeError::StartupFailed { .. } => "startup_failed",
            RuntimeError::Io(_) => "transport_io",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::TransportUnavailable { reason } => {
                format!("transport unavailable: {reason}")
            }
            RuntimeError::MalformedEnvelope { reason } => format!("malformed envelope: {reason}"),
            RuntimeError::SendFailure { reason } => format!("send failed: {reason}"),
            RuntimeError::StartupFailed { reason } => format!("startup failed: {reason}"),
            RuntimeError::Io(e) => format!("i/o: {e}"),
        }
    }
}

/// # Errors produced by plugin code.
///
/// Returned by the plugin's hooks and main loop. A [`PluginError::Canceled`]
/// return is treated as a graceful exit after cooperative cancellation;
/// everything else is captured by the crash recorder.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum PluginError {
    /// The loop observed cancellation and exited; graceful, not recorded.
    #[error("cancelled")]
    Canceled,

    /// Hook or main-loop failure.
    #[error("plugin failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl PluginError {
    /// Shorthand for [`PluginError::Fail`] from anything displayable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        PluginError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs and
    /// crash-report entries.
    pub fn as_label(&self) -> &'static str {
        match self {
            PluginError::Canceled => "plugin_canceled",
            PluginError::Fail { .. } => "plugin_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            PluginError::Canceled => "cancelled".to_string(),
            PluginError::Fail { error } => format!("error: {error}"),
        }
    }

    /// True for the graceful-cancellation exit; such returns are not
    /// reported to the crash recorder.
    pub fn is_graceful(&self) -> bool {
        matches!(self, PluginError::Canceled)
    }
}
