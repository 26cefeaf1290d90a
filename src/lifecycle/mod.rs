//! Lifecycle state machine and the controller that drives it.

mod controller;
mod state;

pub use controller::{Controller, ShutdownHandle};
pub use state::LifecycleState;
