//! # Registration handshake with the core process.
//!
//! On start the bridge sends a `REGISTER` envelope bearing the worker
//! identity and subscription declaration on the outbound channel, then
//! awaits `REGISTER_ACK` on the inbound channel within a bounded timeout.
//!
//! ## Rules
//! - Anything that is not the acknowledgment is skipped while waiting
//!   (the bus may already be publishing to the subscribe channel).
//! - Malformed frames during the wait are skipped, not fatal.
//! - Timeout, channel closure, or an I/O error all surface as
//!   [`RuntimeError::TransportUnavailable`] — fatal to startup, no retry.

use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::time;

use crate::envelope::{reserved, Envelope};
use crate::error::RuntimeError;
use crate::subscription::Subscription;

/// Performs the registration exchange; resolves once the core process has
/// acknowledged the worker.
pub(crate) async fn register<W, R>(
    name: &str,
    subscription: &Subscription,
    writer: &mut W,
    reader: &mut R,
    timeout: Duration,
) -> Result<(), RuntimeError>
where
    W: Sink<Envelope, Error = RuntimeError> + Unpin,
    R: Stream<Item = Result<Envelope, RuntimeError>> + Unpin,
{
    let exchange = async {
        writer
            .send(Envelope::register(name, subscription))
            .await
            .map_err(|e| RuntimeError::TransportUnavailable {
                reason: format!("registration send: {}", e.as_message()),
            })?;

        loop {
            match reader.next().await {
                None => {
                    return Err(RuntimeError::TransportUnavailable {
                        reason: "inbound channel closed during handshake".to_string(),
                    })
                }
                Some(Ok(env)) if env.kind == reserved::REGISTER_ACK => return Ok(()),
                Some(Ok(_)) => continue,
                Some(Err(RuntimeError::MalformedEnvelope { reason })) => {
                    tracing::warn!(%reason, "malformed frame during handshake, skipped");
                }
                Some(Err(e)) => {
                    return Err(RuntimeError::TransportUnavailable {
                        reason: format!("handshake read: {}", e.as_message()),
                    })
                }
            }
        }
    };

    match time::timeout(timeout, exchange).await {
        Ok(res) => res,
        Err(_) => Err(RuntimeError::TransportUnavailable {
            reason: format!("no registration ack within {timeout:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc as fut_mpsc;
    use serde_json::json;

    fn pipes() -> (
        fut_mpsc::UnboundedSender<Result<Envelope, RuntimeError>>,
        fut_mpsc::UnboundedReceiver<Result<Envelope, RuntimeError>>,
    ) {
        fut_mpsc::unbounded()
    }

    #[tokio::test]
    async fn ack_completes_the_exchange() {
        let (inbound_tx, mut inbound_rx) = pipes();
        let (sink_tx, mut sink_rx) = fut_mpsc::unbounded::<Envelope>();
        let mut writer = sink_tx.sink_map_err(|e| RuntimeError::SendFailure {
            reason: e.to_string(),
        });

        inbound_tx
            .unbounded_send(Ok(Envelope::new("core", "STATUS", json!(null))))
            .unwrap();
        inbound_tx
            .unbounded_send(Ok(Envelope::new("core", reserved::REGISTER_ACK, json!(null))))
            .unwrap();

        register(
            "w",
            &Subscription::all(),
            &mut writer,
            &mut inbound_rx,
            Duration::from_secs(1),
        )
        .await
        .unwrap();

        let sent = sink_rx.next().await.unwrap();
        assert_eq!(sent.kind, reserved::REGISTER);
        assert_eq!(sent.name, "w");
        assert_eq!(sent.payload["subscribe"], json!("*"));
    }

    #[tokio::test]
    async fn missing_ack_times_out_as_transport_unavailable() {
        let (_inbound_tx, mut inbound_rx) = pipes();
        let (sink_tx, _sink_rx) = fut_mpsc::unbounded::<Envelope>();
        let mut writer = sink_tx.sink_map_err(|e| RuntimeError::SendFailure {
            reason: e.to_string(),
        });

        let err = register(
            "w",
            &Subscription::all(),
            &mut writer,
            &mut inbound_rx,
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();
        assert_eq!(err.as_label(), "transport_unavailable");
    }

    #[tokio::test]
    async fn closed_inbound_channel_is_transport_unavailable() {
        let (inbound_tx, mut inbound_rx) = pipes();
        drop(inbound_tx);
        let (sink_tx, _sink_rx) = fut_mpsc::unbounded::<Envelope>();
        let mut writer = sink_tx.sink_map_err(|e| RuntimeError::SendFailure {
            reason: e.to_string(),
        });

        let err = register(
            "w",
            &Subscription::none(),
            &mut writer,
            &mut inbound_rx,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.as_label(), "transport_unavailable");
    }
}
