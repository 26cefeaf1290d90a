//! # Global runtime configuration.
//!
//! Provides [`RuntimeConfig`], centralized settings for a comet worker.
//!
//! The config is consumed once, at [`Controller::new`](crate::Controller::new):
//! the worker name, bus endpoints, and subscription-independent tunables are
//! all fixed for the process lifetime.
//!
//! ## Sentinel values
//! - `inbound_capacity` / `outbound_capacity` are clamped to a minimum of 1
//!   by the accessors — a zero-capacity hand-off queue cannot exist.
//! - `crash_dir = None` → per-user default location (see
//!   [`CrashRecorder`](crate::CrashRecorder)).

use std::path::PathBuf;
use std::time::Duration;

/// Well-known bus port for the worker → core direction.
pub const DEFAULT_SEND_PORT: u16 = 47001;

/// Well-known bus port for the core → worker (subscribe) direction.
pub const DEFAULT_RECV_PORT: u16 = 47002;

/// Global configuration for a comet worker runtime.
///
/// Defines:
/// - **Identity**: worker name, stamped on every self-sent envelope and
///   used as the registration key with the core process
/// - **Bus endpoints**: host plus the two well-known channel ports
/// - **Startup behavior**: registration handshake timeout
/// - **Queue sizing**: capacities of the two application-facing queues
/// - **Presentation**: development mode (console diagnostics on/off)
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to
/// avoid sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Worker identity; non-empty, fixed for the process lifetime.
    pub name: String,

    /// Bus host the worker attaches to.
    pub bus_host: String,

    /// Port of the outbound (worker → bus) channel.
    pub send_port: u16,

    /// Port of the inbound/subscribe (bus → worker) channel.
    pub recv_port: u16,

    /// Maximum time to wait for the registration acknowledgment.
    ///
    /// When exceeded, `run()` fails with
    /// [`RuntimeError::TransportUnavailable`](crate::RuntimeError::TransportUnavailable)
    /// and the plugin hooks are never invoked.
    pub handshake_timeout: Duration,

    /// Capacity of the inbound application queue.
    ///
    /// When the queue is full the bridge blocks delivery of the next
    /// accepted message until space frees (receive-side backpressure);
    /// nothing is dropped.
    pub inbound_capacity: usize,

    /// Capacity of the outbound application queue.
    ///
    /// A full queue blocks the plugin's `send` until the bridge drains.
    pub outbound_capacity: usize,

    /// Development mode: when true the host is expected to install console
    /// diagnostics (see [`init_diagnostics`](crate::init_diagnostics)).
    /// Presentation only — core behavior is identical either way.
    pub dev_mode: bool,

    /// Crash log directory override (`None` = per-user default).
    pub crash_dir: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Creates a config for the given worker name with default tunables.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Address of the outbound (worker → bus) channel.
    #[inline]
    pub fn send_addr(&self) -> String {
        format!("{}:{}", self.bus_host, self.send_port)
    }

    /// Address of the inbound/subscribe (bus → worker) channel.
    #[inline]
    pub fn recv_addr(&self) -> String {
        format!("{}:{}", self.bus_host, self.recv_port)
    }

    /// Inbound queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn inbound_capacity_clamped(&self) -> usize {
        self.inbound_capacity.max(1)
    }

    /// Outbound queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn outbound_capacity_clamped(&self) -> usize {
        self.outbound_capacity.max(1)
    }
}

impl Default for RuntimeConfig {
    /// Default configuration:
    ///
    /// - `name = "comet"` (hosts should override)
    /// - `bus_host = "127.0.0.1"` (bus on the local machine)
    /// - `send_port = 47001`, `recv_port = 47002` (well-known channel ports)
    /// - `handshake_timeout = 10s`
    /// - `inbound_capacity = 256`, `outbound_capacity = 256`
    /// - `dev_mode = false` (silent operation)
    /// - `crash_dir = None` (per-user default location)
    fn default() -> Self {
        Self {
            name: "comet".to_string(),
            bus_host: "127.0.0.1".to_string(),
            send_port: DEFAULT_SEND_PORT,
            recv_port: DEFAULT_RECV_PORT,
            handshake_timeout: Duration::from_secs(10),
            inbound_capacity: 256,
            outbound_capacity: 256,
            dev_mode: false,
            crash_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_clamped_to_one() {
        let mut cfg = RuntimeConfig::default();
        cfg.inbound_capacity = 0;
        cfg.outbound_capacity = 0;
        assert_eq!(cfg.inbound_capacity_clamped(), 1);
        assert_eq!(cfg.outbound_capacity_clamped(), 1);
    }

    #[test]
    fn addresses_join_host_and_port() {
        let mut cfg = RuntimeConfig::new("sensor");
        cfg.bus_host = "10.0.0.5".into();
        cfg.send_port = 9001;
        cfg.recv_port = 9002;
        assert_eq!(cfg.send_addr(), "10.0.0.5:9001");
        assert_eq!(cfg.recv_addr(), "10.0.0.5:9002");
        assert_eq!(cfg.name, "sensor");
    }
}
