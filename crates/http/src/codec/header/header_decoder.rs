//! Request head decoding.
//!
//! The request line and header fields are parsed with `httparse`, copied into an
//! `http::Request<()>`, and the payload framing is worked out from `Transfer-Encoding` and
//! `Content-Length` (RFC 9112 Section 6.3):
//!
//! - a `Transfer-Encoding` whose final coding is `chunked` wins; any `Content-Length` is
//!   removed from the head since it does not describe the bytes on the wire
//! - any other `Transfer-Encoding` is rejected
//! - repeated `Content-Length` fields must agree and are collapsed into one
//! - no framing header at all means no body
//!
//! # Limits
//!
//! - at most [`MAX_HEADER_NUM`] header fields
//! - at most [`MAX_HEADER_BYTES`] bytes for the whole head
//! - HTTP/1.0 and HTTP/1.1 only

use bytes::{Buf, BytesMut};
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderName, HeaderValue, Method, Request, Uri, Version};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, RequestHeader};

/// Maximum number of headers allowed in a request
pub const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decodes one request head and tells how its payload is framed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDecoder;

impl Decoder for HeaderDecoder {
    type Item = (RequestHeader, PayloadSize);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let status = req.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e),
        })?;

        let body_offset = match status {
            Status::Complete(body_offset) => body_offset,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
        };

        trace!(header_size = body_offset, "parsed request head");
        ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));

        let version = match req.version {
            Some(0) => Version::HTTP_10,
            Some(1) => Version::HTTP_11,
            v => return Err(ParseError::InvalidVersion(v)),
        };
        let method = req.method.ok_or(ParseError::InvalidMethod)?;
        let method = Method::from_bytes(method.as_bytes()).map_err(|_e| ParseError::InvalidMethod)?;
        let uri = req.path.ok_or(ParseError::InvalidUri)?.parse::<Uri>().map_err(|_e| ParseError::InvalidUri)?;

        let mut request = Request::new(());
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.version_mut() = version;

        let header_map = request.headers_mut();
        header_map.reserve(req.headers.len());
        for header in req.headers.iter() {
            let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(ParseError::invalid_header)?;
            let value = HeaderValue::from_bytes(header.value).map_err(ParseError::invalid_header)?;
            header_map.append(name, value);
        }

        src.advance(body_offset);

        let mut header = RequestHeader::from(request);
        let payload_size = parse_payload_size(&mut header)?;

        Ok(Some((header, payload_size)))
    }
}

fn parse_payload_size(header: &mut RequestHeader) -> Result<PayloadSize, ParseError> {
    let headers = header.headers_mut();

    if headers.contains_key(TRANSFER_ENCODING) {
        let chunked = headers
            .get_all(TRANSFER_ENCODING)
            .iter()
            .next_back()
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.rsplit(',').next())
            .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
        ensure!(chunked, ParseError::invalid_transfer_encoding("chunked must be the final transfer coding"));

        headers.remove(CONTENT_LENGTH);
        return Ok(PayloadSize::Chunked);
    }

    let mut values = headers.get_all(CONTENT_LENGTH).iter();
    let Some(first) = values.next() else {
        return Ok(PayloadSize::Empty);
    };
    ensure!(values.all(|value| value == first), ParseError::invalid_content_length("conflicting values"));

    let length = first
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| ParseError::invalid_content_length(format!("{first:?}")))?;

    let first = first.clone();
    headers.insert(CONTENT_LENGTH, first);

    Ok(PayloadSize::from_length(length))
}
