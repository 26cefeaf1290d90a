//! Envelope value type and its wire codec.

mod codec;
#[allow(clippy::module_inception)]
mod envelope;

pub use codec::EnvelopeCodec;
pub use envelope::{reserved, Envelope};
