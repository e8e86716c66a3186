//! Decoder for `Transfer-Encoding: chunked` payloads, see
//! [RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1).
//!
//! Works line by line: a size line (hex size, optional `;extensions`), the chunk data and its
//! CRLF, repeated until a zero-sized chunk, then optional trailer lines and a final CRLF.
//! Extensions and trailers are read and dropped.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, PayloadItem};

/// Longest size or trailer line accepted, CRLF included.
const MAX_LINE_BYTES: usize = 4 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// expecting a size line
    Size,
    /// inside chunk data, with this many bytes left
    Data(u64),
    /// expecting the CRLF that closes chunk data
    DataEnd,
    /// after the last chunk, expecting trailer lines or the final CRLF
    Trailer,
    /// payload complete
    Done,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self { state: State::Size }
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = PayloadItem;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                State::Done => {
                    trace!("finished reading chunked data");
                    return Ok(Some(PayloadItem::Eof));
                }

                State::Size => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    let size = parse_chunk_size(&line)?;
                    self.state = if size == 0 { State::Trailer } else { State::Data(size) };
                }

                State::Data(remaining) => {
                    if src.is_empty() {
                        return Ok(None);
                    }

                    let len = usize::try_from(remaining).map_or(src.len(), |remaining| remaining.min(src.len()));
                    let bytes = src.split_to(len).freeze();

                    let left = remaining - bytes.len() as u64;
                    self.state = if left == 0 { State::DataEnd } else { State::Data(left) };

                    trace!(len = bytes.len(), "read chunked bytes");
                    return Ok(Some(PayloadItem::Chunk(bytes)));
                }

                State::DataEnd => {
                    if src.len() < 2 {
                        return Ok(None);
                    }
                    ensure!(&src[..2] == b"\r\n", ParseError::invalid_body("chunk data is not followed by CRLF"));
                    src.advance(2);
                    self.state = State::Size;
                }

                State::Trailer => {
                    let Some(line) = take_line(src)? else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        self.state = State::Done;
                    }
                }
            }
        }
    }
}

/// Splits one CRLF-terminated line off `src`, without the CRLF.
fn take_line(src: &mut BytesMut) -> Result<Option<BytesMut>, ParseError> {
    match src.iter().position(|&b| b == b'\n') {
        Some(lf) => {
            ensure!(lf > 0 && src[lf - 1] == b'\r', ParseError::invalid_body("chunked line must end with CRLF"));
            let mut line = src.split_to(lf + 1);
            line.truncate(lf - 1);
            Ok(Some(line))
        }
        None => {
            ensure!(src.len() < MAX_LINE_BYTES, ParseError::invalid_body("chunked line too long"));
            Ok(None)
        }
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<u64, ParseError> {
    let digits = line.split(|&b| b == b';').next().unwrap_or_default().trim_ascii();
    ensure!(!digits.is_empty(), ParseError::invalid_body("missing chunk size"));

    digits.iter().try_fold(0u64, |size, &b| {
        let digit = char::from(b).to_digit(16).ok_or_else(|| ParseError::invalid_body("invalid chunk size"))?;
        size.checked_mul(16)
            .and_then(|size| size.checked_add(u64::from(digit)))
            .ok_or_else(|| ParseError::invalid_body("chunk size overflow"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn decode_all(decoder: &mut ChunkedDecoder, buffer: &mut BytesMut) -> Vec<PayloadItem> {
        let mut items = vec![];
        while let Some(item) = decoder.decode(buffer).unwrap() {
            let eof = item.is_eof();
            items.push(item);
            if eof {
                break;
            }
        }
        items
    }

    #[test]
    fn basic() {
        let mut buffer = BytesMut::from(&b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let items = decode_all(&mut decoder, &mut buffer);

        assert_eq!(
            items,
            vec![
                PayloadItem::Chunk(Bytes::from_static(b"hello")),
                PayloadItem::Chunk(Bytes::from_static(b" world")),
                PayloadItem::Eof,
            ]
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn leaves_next_request_in_buffer() {
        let mut buffer = BytesMut::from(&b"3\r\nabc\r\n0\r\n\r\nGET / HTTP/1.1\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        decode_all(&mut decoder, &mut buffer);

        assert_eq!(&buffer[..], b"GET / HTTP/1.1\r\n");
    }

    #[test]
    fn extensions_and_trailers_are_ignored() {
        let mut buffer = BytesMut::from(&b"A;name=value\r\n0123456789\r\n0\r\nExpires: never\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        let items = decode_all(&mut decoder, &mut buffer);

        assert_eq!(items, vec![PayloadItem::Chunk(Bytes::from_static(b"0123456789")), PayloadItem::Eof]);
    }

    #[test]
    fn split_across_reads() {
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(&b"1"[..]);
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b"0\r\n0123456");
        let first = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(first.as_bytes().unwrap().as_ref(), b"0123456");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b"789abcdef\r");
        let second = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(second.as_bytes().unwrap().as_ref(), b"789abcdef");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), None);

        buffer.extend_from_slice(b"\n0\r\n\r\n");
        assert_eq!(decoder.decode(&mut buffer).unwrap(), Some(PayloadItem::Eof));
    }

    #[test]
    fn invalid_size() {
        let mut buffer = BytesMut::from(&b"zz\r\nhello\r\n"[..]);
        assert!(ChunkedDecoder::new().decode(&mut buffer).is_err());
    }

    #[test]
    fn size_overflow() {
        let mut buffer = BytesMut::from(&b"1ffffffffffffffff\r\n"[..]);
        assert!(ChunkedDecoder::new().decode(&mut buffer).is_err());
    }

    #[test]
    fn missing_crlf_after_data() {
        let mut buffer = BytesMut::from(&b"3\r\nabcXY0\r\n\r\n"[..]);
        let mut decoder = ChunkedDecoder::new();

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_chunk());
        assert!(decoder.decode(&mut buffer).is_err());
    }

    #[test]
    fn bare_lf_is_rejected() {
        let mut buffer = BytesMut::from(&b"3\nabc\r\n"[..]);
        assert!(ChunkedDecoder::new().decode(&mut buffer).is_err());
    }
}
