//! # Wire codec: length-prefixed JSON envelope frames.
//!
//! [`EnvelopeCodec`] pairs a 4-byte big-endian length prefix (via
//! [`LengthDelimitedCodec`]) with a self-describing JSON record:
//!
//! ```text
//! +----------------------+--------------------------------------------+
//! | length (4 bytes, BE) | {"timestamp":…,"name":…,"type":…,"payload":…} |
//! +----------------------+--------------------------------------------+
//! ```
//!
//! ## Rules
//! - `decode(encode(e)) == e` for every valid envelope; timestamps are
//!   already stored at wire resolution (milliseconds), so the round trip
//!   is exact.
//! - Structural violations (truncated frame, invalid JSON, missing field,
//!   wrong field type, empty `name`) decode to
//!   [`RuntimeError::MalformedEnvelope`]; encoding rejects an empty `name`
//!   with the same error. Payload *content* never fails.
//! - Frames are capped at 16 MiB; the design assumes small control/status
//!   payloads.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::error::RuntimeError;

use super::envelope::Envelope;

/// Upper bound on a single wire frame.
const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Framed (de)serializer for [`Envelope`] values.
///
/// Used with [`FramedRead`](tokio_util::codec::FramedRead) on the inbound
/// socket and [`FramedWrite`](tokio_util::codec::FramedWrite) on the
/// outbound socket.
#[derive(Debug)]
pub struct EnvelopeCodec {
    inner: LengthDelimitedCodec,
}

impl EnvelopeCodec {
    /// Creates a codec with the standard frame cap.
    pub fn new() -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .max_frame_length(MAX_FRAME_BYTES)
                .new_codec(),
        }
    }
}

impl Default for EnvelopeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for EnvelopeCodec {
    type Item = Envelope;
    type Error = RuntimeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Envelope>, RuntimeError> {
        let Some(frame) = self.inner.decode(src).map_err(|e| {
            // Length-prefix violations (oversized frame) are structural.
            if e.kind() == std::io::ErrorKind::InvalidData {
                RuntimeError::MalformedEnvelope {
                    reason: e.to_string(),
                }
            } else {
                RuntimeError::Io(e)
            }
        })?
        else {
            return Ok(None);
        };

        let env: Envelope =
            serde_json::from_slice(&frame).map_err(|e| RuntimeError::MalformedEnvelope {
                reason: e.to_string(),
            })?;
        if env.name.is_empty() {
            return Err(RuntimeError::MalformedEnvelope {
                reason: "empty sender name".to_string(),
            });
        }
        Ok(Some(env))
    }
}

impl Encoder<Envelope> for EnvelopeCodec {
    type Error = RuntimeError;

    fn encode(&mut self, env: Envelope, dst: &mut BytesMut) -> Result<(), RuntimeError> {
        // Same structural rule as decode: peers reject empty-name frames,
        // so refuse to put one on the wire in the first place.
        if env.name.is_empty() {
            return Err(RuntimeError::MalformedEnvelope {
                reason: "empty sender name".to_string(),
            });
        }
        let record = serde_json::to_vec(&env).map_err(|e| RuntimeError::MalformedEnvelope {
            reason: e.to_string(),
        })?;
        self.inner
            .encode(Bytes::from(record), dst)
            .map_err(RuntimeError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn roundtrip(env: Envelope) -> Envelope {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(env, &mut buf).unwrap();
        codec.decode(&mut buf).unwrap().expect("one full frame")
    }

    #[test]
    fn roundtrip_reproduces_envelope() {
        let env = Envelope::new(
            "worker-1",
            "STATUS",
            json!({"nested": {"list": [1, 2, 3], "flag": true}, "note": "ok"}),
        );
        assert_eq!(roundtrip(env.clone()), env);
    }

    #[test]
    fn roundtrip_scalar_and_null_payloads() {
        for payload in [json!(null), json!(42), json!("text"), json!([])] {
            let env = Envelope::new("w", "T", payload);
            assert_eq!(roundtrip(env.clone()), env);
        }
    }

    #[test]
    fn timestamp_survives_at_millisecond_resolution() {
        let ts = UNIX_EPOCH + Duration::new(1_700_000_000, 999_999_999);
        let env = Envelope::at(ts, "w", "T", json!(null));
        let back = roundtrip(env.clone());
        assert_eq!(back.timestamp_ms, env.timestamp_ms);
        assert_eq!(back.timestamp_ms, 1_700_000_000_999);
    }

    #[test]
    fn partial_frame_decodes_to_none() {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(Envelope::new("w", "T", json!({})), &mut buf)
            .unwrap();
        let cut = buf.split_to(buf.len() - 3);
        let mut partial = cut;
        assert!(codec.decode(&mut partial).unwrap().is_none());
    }

    #[test]
    fn invalid_json_is_malformed() {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::new();
        let body = b"{not json";
        buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        buf.extend_from_slice(body);
        match codec.decode(&mut buf) {
            Err(RuntimeError::MalformedEnvelope { .. }) => {}
            other => panic!("expected MalformedEnvelope, got {other:?}"),
        }
    }

    #[test]
    fn missing_field_is_malformed() {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::new();
        let body = br#"{"timestamp":1,"name":"w","payload":null}"#;
        buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        buf.extend_from_slice(body);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(RuntimeError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn empty_sender_name_fails_encode() {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::new();
        let err = codec
            .encode(Envelope::new("", "STATUS", json!(null)), &mut buf)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::MalformedEnvelope { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_sender_name_is_malformed() {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::new();
        let body = br#"{"timestamp":1,"name":"","type":"T","payload":null}"#;
        buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        buf.extend_from_slice(body);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(RuntimeError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn wire_record_is_self_describing() {
        let mut codec = EnvelopeCodec::new();
        let mut buf = BytesMut::new();
        let ts = SystemTime::UNIX_EPOCH + Duration::from_millis(5);
        codec
            .encode(Envelope::at(ts, "w", "STATUS", json!({"k": 1})), &mut buf)
            .unwrap();
        let record: serde_json::Value = serde_json::from_slice(&buf[4..]).unwrap();
        assert_eq!(record["timestamp"], json!(5));
        assert_eq!(record["name"], json!("w"));
        assert_eq!(record["type"], json!("STATUS"));
        assert_eq!(record["payload"], json!({"k": 1}));
    }
}
