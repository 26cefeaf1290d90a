//! In-process fake core: two loopback TCP listeners speaking the envelope
//! codec, standing in for the coordinating core process.

#![allow(dead_code)]

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};

use comet_runtime::{reserved, Envelope, EnvelopeCodec, RuntimeConfig};

pub const WAIT: Duration = Duration::from_secs(5);

/// The two listening sockets the worker will attach to.
pub struct FakeBus {
    send_listener: TcpListener,
    recv_listener: TcpListener,
}

/// Both worker connections, accepted and framed.
pub struct FakeCore {
    /// Worker → bus direction (registration, app messages, PONG).
    pub from_worker: FramedRead<TcpStream, EnvelopeCodec>,
    /// Bus → worker direction (ack, PING, published envelopes).
    pub to_worker: FramedWrite<TcpStream, EnvelopeCodec>,
}

impl FakeBus {
    /// Binds both channels on ephemeral loopback ports and returns a
    /// matching worker config (short handshake timeout for tests).
    pub async fn start(worker: &str) -> (Self, RuntimeConfig) {
        let send_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let recv_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let mut cfg = RuntimeConfig::new(worker);
        cfg.send_port = send_listener.local_addr().unwrap().port();
        cfg.recv_port = recv_listener.local_addr().unwrap().port();
        cfg.handshake_timeout = Duration::from_millis(500);

        (
            Self {
                send_listener,
                recv_listener,
            },
            cfg,
        )
    }

    /// Accepts both worker connections (outbound first — the bridge
    /// connects them in that order).
    pub async fn accept(&self) -> FakeCore {
        let (out_conn, _) = timeout(WAIT, self.send_listener.accept()).await.unwrap().unwrap();
        let (in_conn, _) = timeout(WAIT, self.recv_listener.accept()).await.unwrap().unwrap();
        FakeCore {
            from_worker: FramedRead::new(out_conn, EnvelopeCodec::new()),
            to_worker: FramedWrite::new(in_conn, EnvelopeCodec::new()),
        }
    }
}

impl FakeCore {
    /// Reads the next frame from the worker.
    pub async fn next_from_worker(&mut self) -> Option<Envelope> {
        timeout(WAIT, self.from_worker.next())
            .await
            .expect("timed out waiting for worker frame")
            .map(|r| r.expect("worker sent an undecodable frame"))
    }

    /// Reads the registration envelope (must be the first worker frame).
    pub async fn expect_register(&mut self) -> Envelope {
        let env = self.next_from_worker().await.expect("worker hung up");
        assert_eq!(env.kind, reserved::REGISTER);
        env
    }

    /// Acknowledges the registration, completing the handshake.
    pub async fn ack(&mut self) {
        self.to_worker
            .send(Envelope::new("core", reserved::REGISTER_ACK, json!(null)))
            .await
            .unwrap();
    }

    /// Full handshake: read REGISTER, send the ack.
    pub async fn complete_handshake(&mut self) -> Envelope {
        let register = self.expect_register().await;
        self.ack().await;
        register
    }

    /// Publishes an envelope on the worker's subscribe channel.
    pub async fn publish(&mut self, env: Envelope) {
        self.to_worker.send(env).await.unwrap();
    }

    /// Sends a liveness probe.
    pub async fn ping(&mut self) {
        self.to_worker
            .send(Envelope::new("core", reserved::PING, json!(null)))
            .await
            .unwrap();
    }
}
