//! A client for the echo server.
//!
//! Connects once and sends every POST over that same connection, reading each response by its
//! `content-length`. At `DEBUG` level every exchanged head and body is logged as a hex dump.

use bytes::{Bytes, BytesMut};
use http::Uri;
use httparse::Status;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{Level, debug, info};

use crate::error::ClientError;

const MAX_RESPONSE_HEADERS: usize = 64;

/// Bytes per line of a hex dump.
const DUMP_WIDTH: usize = 16;

/// One kept-alive connection to an echo server.
#[derive(Debug)]
pub struct EchoClient {
    stream: TcpStream,
    authority: String,
    path: String,
    buffer: BytesMut,
}

impl EchoClient {
    /// Connects to `url`, e.g. `http://127.0.0.1:8080/` or just `127.0.0.1:8080`.
    ///
    /// Only plain `http` is supported; the port defaults to 80.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let uri = url.parse::<Uri>().map_err(|e| ClientError::invalid_url(url, e))?;
        match uri.scheme_str() {
            None | Some("http") => {}
            Some(scheme) => return Err(ClientError::invalid_url(url, format!("unsupported scheme {scheme}"))),
        }

        let host = uri.host().ok_or_else(|| ClientError::invalid_url(url, "missing host"))?;
        let port = uri.port_u16().unwrap_or(80);
        let authority = uri.authority().map_or_else(|| host.to_owned(), ToString::to_string);
        let path = uri.path_and_query().map_or("/", |path| path.as_str()).to_owned();

        let stream = TcpStream::connect((host, port)).await?;
        info!(server = %authority, "connected");

        Ok(Self { stream, authority, path, buffer: BytesMut::new() })
    }

    /// Posts `message` and returns the body of the `200` answer.
    pub async fn post(&mut self, message: &[u8]) -> Result<Bytes, ClientError> {
        let head = format!(
            "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Length: {}\r\n\r\n",
            self.path,
            self.authority,
            message.len()
        );
        dump("=> Send header", head.as_bytes());
        dump("=> Send data", message);

        self.stream.write_all(head.as_bytes()).await?;
        self.stream.write_all(message).await?;
        self.stream.flush().await?;

        let (status, body) = self.read_response().await?;
        if status != 200 {
            return Err(ClientError::UnexpectedStatus { status });
        }
        Ok(body)
    }

    async fn read_response(&mut self) -> Result<(u16, Bytes), ClientError> {
        let (status, head_len, body_len) = loop {
            if let Some(head) = parse_head(&self.buffer)? {
                break head;
            }
            self.fill().await?;
        };

        while self.buffer.len() < head_len + body_len {
            self.fill().await?;
        }

        let head = self.buffer.split_to(head_len);
        let body = self.buffer.split_to(body_len).freeze();
        dump("<= Recv header", &head);
        dump("<= Recv data", &body);

        Ok((status, body))
    }

    async fn fill(&mut self) -> Result<(), ClientError> {
        if self.stream.read_buf(&mut self.buffer).await? == 0 {
            return Err(ClientError::Closed);
        }
        Ok(())
    }
}

/// Status, head length and body length of a complete response head.
fn parse_head(buffer: &[u8]) -> Result<Option<(u16, usize, usize)>, ClientError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_RESPONSE_HEADERS];
    let mut response = httparse::Response::new(&mut headers);

    let Status::Complete(head_len) = response.parse(buffer).map_err(ClientError::invalid_response)? else {
        return Ok(None);
    };
    let status = response.code.ok_or_else(|| ClientError::invalid_response("missing status code"))?;

    let body_len = response
        .headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case("content-length"))
        .map(|header| {
            std::str::from_utf8(header.value)
                .ok()
                .and_then(|value| value.trim().parse::<usize>().ok())
                .ok_or_else(|| ClientError::invalid_response("invalid content-length"))
        })
        .transpose()?
        .unwrap_or(0);

    Ok(Some((status, head_len, body_len)))
}

fn dump(label: &str, data: &[u8]) {
    if tracing::enabled!(Level::DEBUG) {
        debug!("{}", hex_dump(label, data));
    }
}

/// Offset, hex bytes and printable ASCII, [`DUMP_WIDTH`] bytes a line.
fn hex_dump(label: &str, data: &[u8]) -> String {
    let mut out = format!("{label}, {:010} bytes (0x{:08x})\n", data.len(), data.len());

    for (line, chunk) in data.chunks(DUMP_WIDTH).enumerate() {
        out.push_str(&format!("{:04x}: ", line * DUMP_WIDTH));
        for column in 0..DUMP_WIDTH {
            match chunk.get(column) {
                Some(byte) => out.push_str(&format!("{byte:02x} ")),
                None => out.push_str("   "),
            }
        }
        out.extend(chunk.iter().map(|&byte| if (0x20..0x80).contains(&byte) { char::from(byte) } else { '.' }));
        out.push('\n');
    }

    out
}
