use bytes::{Buf, Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Terminates every command sent to and every frame received from the gauge.
pub const TERMINATOR: &[u8] = b"\r\n";

/// Splits the incoming byte stream into `\r\n` delimited frames and passes
/// outgoing bytes through unchanged.
///
/// Outgoing bytes are not framed here: handshake bytes (ENQ, ETX) go on the
/// wire without a terminator, so the caller decides what a message looks like.
#[derive(Debug, Default)]
pub struct FrameCodec {
    // Where to resume searching for the terminator on the next call.
    next_index: usize,
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let start = self.next_index.min(src.len());
        match src[start..]
            .windows(TERMINATOR.len())
            .position(|w| w == TERMINATOR)
        {
            Some(offset) => {
                let frame = src.split_to(start + offset);
                src.advance(TERMINATOR.len());
                self.next_index = 0;
                Ok(Some(frame))
            }
            None => {
                // A lone '\r' at the end may be the first half of the terminator.
                self.next_index = src.len().saturating_sub(TERMINATOR.len() - 1);
                Ok(None)
            }
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

impl FrameCodec {
    /// Forget any partial search state, used after the read buffer was drained.
    pub(crate) fn reset(&mut self) {
        self.next_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_frames() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"\x06\r\nTPR,noid\r\n0,1"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"\x06"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"TPR,noid"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf, &b"0,1"[..]);
    }

    #[test]
    fn test_decode_split_terminator() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"0,1.0\r"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(b"\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), &b"0,1.0"[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_empty_frame() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&b"\r\n"[..]);
        assert!(codec.decode(&mut buf).unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_encode_passthrough() {
        let mut codec = FrameCodec::default();
        let mut dst = BytesMut::new();
        codec.encode(Bytes::from_static(b"\x05"), &mut dst).unwrap();
        assert_eq!(dst, &b"\x05"[..]);
    }
}
