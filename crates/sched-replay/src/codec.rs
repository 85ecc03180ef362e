//! Newline-delimited JSON codec for the harness-scheduler wire protocol.
//!
//! Wraps `LinesCodec` for framing and adds serde_json serialization. Works
//! over any AsyncRead/AsyncWrite via `FramedRead`/`FramedWrite`.
//!
//! Inbound bytes accumulate in the framed buffer until a `\n` shows up;
//! exactly one value is decoded per call and any further complete lines stay
//! queued for subsequent calls. End of stream before a terminator is not an
//! error: the framed stream simply ends, which the driver reads as a
//! graceful peer disconnect.

use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec};

use crate::error::CodecError;

/// Codec that frames messages with a trailing newline and serializes with
/// JSON. serde_json escapes embedded newlines inside strings, so one message
/// is always exactly one line on the wire.
pub struct JsonLineCodec<T> {
    inner: LinesCodec,
    _phantom: PhantomData<T>,
}

impl<T> Default for JsonLineCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> JsonLineCodec<T> {
    pub fn new() -> Self {
        Self {
            inner: LinesCodec::new(),
            _phantom: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Decoder for JsonLineCodec<T> {
    type Item = T;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.inner.decode(src)? {
            Some(line) => {
                let item = serde_json::from_str(&line)?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None => {
                // Peer went away mid-line. The unterminated tail is not a
                // message, so drop it and report end of stream.
                if !src.is_empty() {
                    tracing::debug!(
                        bytes = src.len(),
                        "discarding unterminated bytes at end of stream"
                    );
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl<T: Serialize> Encoder<T> for JsonLineCodec<T> {
    type Error = CodecError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_string(&item)?;
        tracing::trace!(bytes = json.len(), "encoding frame");
        self.inner.encode(json, dst)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Tick, Timeframe};
    use serde_json::json;

    #[test]
    fn codec_roundtrip_timeframe() {
        let mut codec = JsonLineCodec::<Timeframe>::new();
        let mut buf = BytesMut::new();

        let frame = Timeframe {
            vtime: 42,
            events: vec![json!({"id": "e1"}), json!("e2")],
        };
        codec.encode(frame.clone(), &mut buf).unwrap();
        assert!(buf.ends_with(b"\n"));

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_waits_for_terminator_across_fragments() {
        let mut codec = JsonLineCodec::<Tick>::new();
        let mut buf = BytesMut::new();

        let wire = br#"{"vtime":1,"schedule":["a"]}"#;
        for chunk in wire.chunks(3) {
            buf.extend_from_slice(chunk);
            assert!(codec.decode(&mut buf).unwrap().is_none());
        }

        buf.extend_from_slice(b"\n");
        let tick = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(tick.vtime, 1);
        assert_eq!(tick.schedule, vec!["a".to_string()]);
    }

    #[test]
    fn buffered_lines_are_dequeued_one_per_call() {
        let mut codec = JsonLineCodec::<Tick>::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(
            b"{\"vtime\":0,\"schedule\":[\"a\"]}\n{\"vtime\":1,\"schedule\":[\"b\"]}\n",
        );

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.vtime, 0);

        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.vtime, 1);

        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn malformed_line_is_a_json_error() {
        let mut codec = JsonLineCodec::<Tick>::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"not json\n");

        match codec.decode(&mut buf) {
            Err(CodecError::Json(_)) => {}
            other => panic!("expected Json error, got {other:?}"),
        }
    }

    #[test]
    fn eof_with_unterminated_tail_is_end_of_stream() {
        let mut codec = JsonLineCodec::<Tick>::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"{\"vtime\":0");

        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn eof_with_complete_line_still_decodes() {
        let mut codec = JsonLineCodec::<Tick>::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"{\"vtime\":9,\"schedule\":[]}\n");

        let tick = codec.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(tick.vtime, 9);
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }
}
