//! # The message unit exchanged over the bus.
//!
//! An [`Envelope`] is an immutable value: construction timestamp, sender
//! name, a free-form `type` tag, and an arbitrary structurally-serializable
//! payload ([`serde_json::Value`]). There is no behavior beyond
//! (de)serialization; reuse means constructing a new value.
//!
//! ## Timestamp resolution
//! Timestamps are stored as unix-epoch **milliseconds** — the resolution of
//! the wire format. Constructing an envelope truncates sub-millisecond
//! precision; the codec round-trip is exact over the stored value.
//!
//! ## Reserved type tags
//! [`reserved`] lists the control tags handled entirely inside the
//! transport bridge and the core handshake. They never surface to the
//! application queues and never reach the subscription filter.
//!
//! ## Example
//! ```rust
//! use comet_runtime::Envelope;
//! use serde_json::json;
//!
//! let env = Envelope::new("sensor-7", "STATUS", json!({"battery": 93}));
//! assert_eq!(env.name, "sensor-7");
//! assert_eq!(env.kind, "STATUS");
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::subscription::Subscription;

/// Control type tags owned by the bridge and the core handshake.
pub mod reserved {
    /// Core-process liveness probe; answered by the bridge with [`PONG`].
    pub const PING: &str = "PING";
    /// Bridge reply to [`PING`].
    pub const PONG: &str = "PONG";
    /// Registration message carrying identity + subscription declaration.
    pub const REGISTER: &str = "REGISTER";
    /// Core-process acknowledgment completing the handshake.
    pub const REGISTER_ACK: &str = "REGISTER_ACK";

    /// True for tags the bridge strips before the subscription filter runs.
    pub fn is_reserved(kind: &str) -> bool {
        matches!(kind, PING | PONG | REGISTER | REGISTER_ACK)
    }
}

/// Immutable bus message: timestamp, sender, type tag, payload.
///
/// Field order matches the wire record; the `type` key is mapped to
/// [`Envelope::kind`] because `type` is a Rust keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Sender-assigned construction time, unix epoch milliseconds.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
    /// Sender worker identity; non-empty.
    pub name: String,
    /// Free-form, case-sensitive message type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Arbitrary structurally-serializable value; small control/status
    /// payloads by convention, not enforced.
    pub payload: Value,
}

impl Envelope {
    /// Constructs an envelope stamped with the current time.
    ///
    /// `name` must be non-empty: the codec refuses empty-name envelopes in
    /// both directions, so such a value cannot cross the wire.
    pub fn new(name: impl Into<String>, kind: impl Into<String>, payload: Value) -> Self {
        Self::at(SystemTime::now(), name, kind, payload)
    }

    /// Constructs an envelope with an explicit timestamp.
    ///
    /// Sub-millisecond precision is truncated. Times before the unix epoch
    /// clamp to zero.
    pub fn at(
        ts: SystemTime,
        name: impl Into<String>,
        kind: impl Into<String>,
        payload: Value,
    ) -> Self {
        let timestamp_ms = ts
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
            .unwrap_or(0);
        Self {
            timestamp_ms,
            name: name.into(),
            kind: kind.into(),
            payload,
        }
    }

    /// Construction time as a [`SystemTime`] (millisecond resolution).
    pub fn timestamp(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.timestamp_ms)
    }

    /// True when the type tag is a bridge-internal control tag.
    #[inline]
    pub fn is_control(&self) -> bool {
        reserved::is_reserved(&self.kind)
    }

    /// Registration envelope sent during the handshake.
    ///
    /// The payload carries the subscription declaration under `subscribe`
    /// (`"*"` or an array of tags).
    pub(crate) fn register(name: &str, subscription: &Subscription) -> Self {
        let subscribe = serde_json::to_value(subscription).unwrap_or(Value::Null);
        Envelope::new(
            name,
            reserved::REGISTER,
            serde_json::json!({ "subscribe": subscribe }),
        )
    }

    /// Heartbeat reply sent by the bridge on inbound [`reserved::PING`].
    pub(crate) fn pong(name: &str) -> Self {
        Envelope::new(name, reserved::PONG, Value::Null)
    }
}
