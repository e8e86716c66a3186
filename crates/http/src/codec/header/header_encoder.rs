//! Response head encoding.
//!
//! Writes the status line and header fields. The framing headers always follow the payload
//! the connection is about to send: `Content-Length` for a body of known size (zero
//! included), `Transfer-Encoding: chunked` otherwise. A handler's own framing headers are
//! overwritten.

use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::HeaderValue;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use tokio_util::codec::Encoder;

use crate::protocol::{PayloadSize, ResponseHead, SendError};

/// Initial buffer size reserved for a response head
const INIT_HEADER_SIZE: usize = 4 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl Encoder<(ResponseHead, PayloadSize)> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, PayloadSize), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut head, payload_size) = item;

        let headers = head.headers_mut();
        match payload_size {
            PayloadSize::Length(n) => {
                headers.remove(TRANSFER_ENCODING);
                headers.insert(CONTENT_LENGTH, HeaderValue::from(n));
            }
            PayloadSize::Chunked => {
                headers.remove(CONTENT_LENGTH);
                headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
            }
            PayloadSize::Empty => {
                headers.remove(TRANSFER_ENCODING);
                headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
            }
        }

        dst.reserve(INIT_HEADER_SIZE);

        let status = head.status();
        write!((&mut *dst).writer(), "HTTP/1.1 {} {}\r\n", status.as_str(), status.canonical_reason().unwrap_or("Unknown"))?;

        for (name, value) in head.headers() {
            dst.put_slice(name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{ALLOW, CONTENT_TYPE};
    use http::{Response, StatusCode};

    fn encode(head: ResponseHead, payload_size: PayloadSize) -> String {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode((head, payload_size), &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn ok_with_length() {
        let head = Response::builder().status(StatusCode::OK).header(CONTENT_TYPE, "text/plain").body(()).unwrap();

        assert_eq!(
            encode(head, PayloadSize::Length(11)),
            "HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: 11\r\n\r\n"
        );
    }

    #[test]
    fn handler_content_length_is_replaced() {
        let head = Response::builder().header(CONTENT_LENGTH, "999").header(CONTENT_LENGTH, "998").body(()).unwrap();

        assert_eq!(encode(head, PayloadSize::Length(3)), "HTTP/1.1 200 OK\r\ncontent-length: 3\r\n\r\n");
    }

    #[test]
    fn empty_body() {
        let head = Response::builder().status(StatusCode::METHOD_NOT_ALLOWED).header(ALLOW, "POST").body(()).unwrap();

        assert_eq!(
            encode(head, PayloadSize::Empty),
            "HTTP/1.1 405 Method Not Allowed\r\nallow: POST\r\ncontent-length: 0\r\n\r\n"
        );
    }

    #[test]
    fn chunked_body() {
        let head = Response::builder().header(CONTENT_LENGTH, "10").body(()).unwrap();

        assert_eq!(encode(head, PayloadSize::Chunked), "HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n");
    }
}
