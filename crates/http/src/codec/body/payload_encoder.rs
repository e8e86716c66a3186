//! Writes response payload items in the framing announced by the response head.

use std::io::Write;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::warn;

use crate::protocol::{PayloadItem, PayloadSize, SendError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// `Content-Length` framing, with the bytes still expected
    Length(u64),
    /// `Transfer-Encoding: chunked`, true once the last chunk is written
    Chunked(bool),
    NoBody,
}

impl PayloadEncoder {
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(false) }
    }

    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(size) }
    }
}

impl From<PayloadSize> for PayloadEncoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(size) => PayloadEncoder::fix_length(size),
            PayloadSize::Chunked => PayloadEncoder::chunked(),
            PayloadSize::Empty => PayloadEncoder::empty(),
        }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match (&mut self.kind, item) {
            (_, PayloadItem::Chunk(bytes)) if !bytes.has_remaining() => Ok(()),

            (Kind::Length(remaining), PayloadItem::Chunk(bytes)) => {
                let len = bytes.remaining() as u64;
                if len > *remaining {
                    return Err(SendError::invalid_body(format!("body exceeds content-length by {} bytes", len - *remaining)));
                }
                *remaining -= len;
                dst.put(bytes);
                Ok(())
            }
            (Kind::Length(remaining), PayloadItem::Eof) => {
                if *remaining > 0 {
                    return Err(SendError::invalid_body(format!("body ended {remaining} bytes short of content-length")));
                }
                Ok(())
            }

            (Kind::Chunked(true), _) => {
                warn!("encode payload_item but the chunked body is already finished");
                Ok(())
            }
            (Kind::Chunked(false), PayloadItem::Chunk(bytes)) => {
                write!((&mut *dst).writer(), "{:X}\r\n", bytes.remaining())?;
                dst.put(bytes);
                dst.put_slice(b"\r\n");
                Ok(())
            }
            (Kind::Chunked(eof), PayloadItem::Eof) => {
                *eof = true;
                dst.put_slice(b"0\r\n\r\n");
                Ok(())
            }

            (Kind::NoBody, _) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn chunked_framing() {
        let mut encoder = PayloadEncoder::chunked();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hello world, hello echo")), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();

        assert_eq!(&dst[..], b"17\r\nhello world, hello echo\r\n0\r\n\r\n");

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"late")), &mut dst).unwrap();
        assert_eq!(dst.len(), 34);
    }

    #[test]
    fn length_framing() {
        let mut encoder = PayloadEncoder::fix_length(5);
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hel")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"lo")), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
        assert_eq!(&dst[..], b"hello");
    }

    #[test]
    fn length_mismatch() {
        let mut dst = BytesMut::new();

        let mut too_long = PayloadEncoder::fix_length(2);
        assert!(too_long.encode(PayloadItem::Chunk(Bytes::from_static(b"abc")), &mut dst).is_err());

        let mut too_short = PayloadEncoder::fix_length(4);
        too_short.encode(PayloadItem::Chunk(Bytes::from_static(b"abc")), &mut dst).unwrap();
        assert!(too_short.encode(PayloadItem::<Bytes>::Eof, &mut dst).is_err());
    }
}
