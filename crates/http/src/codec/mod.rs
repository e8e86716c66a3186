//! HTTP/1.1 message framing on top of `tokio_util::codec`.
//!
//! - [`RequestDecoder`]: bytes to request heads and payload items
//! - [`ResponseEncoder`]: response heads and payload items to bytes
//!
//! ```no_run
//! use echo_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\necho"[..]);
//! let head = decoder.decode(&mut buffer);
//! ```

mod body;
mod header;
mod request_decoder;
mod response_encoder;

pub use header::{MAX_HEADER_BYTES, MAX_HEADER_NUM};
pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
