//! Transport bridge between the bus socket pair and the application
//! queues, including the registration handshake and heartbeat handling.

#[allow(clippy::module_inception)]
mod bridge;
mod handshake;

pub(crate) use bridge::TransportBridge;
