use std::convert::Infallible;
use std::hint::black_box;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use criterion::{Criterion, criterion_group, criterion_main};
use echo_http::codec::{RequestDecoder, ResponseEncoder};
use echo_http::connection::HttpConnection;
use echo_http::handler::make_handler;
use echo_http::protocol::body::ReqBody;
use echo_http::protocol::{Message, PayloadSize, ResponseHead};
use futures::executor::block_on;
use http::header::CONTENT_TYPE;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_util::codec::{Decoder, Encoder};

const POST_REQUEST: &[u8] = b"POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: text/plain\r\nContent-Length: 11\r\n\r\nhello world";
const CHUNKED_REQUEST: &[u8] =
    b"POST /echo HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";

/// Reads a fixed script, then reports end of stream; discards everything written.
struct ScriptedIo {
    input: Bytes,
}

impl AsyncRead for ScriptedIo {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let len = self.input.len().min(buf.remaining());
        let chunk = self.input.split_to(len);
        buf.put_slice(&chunk);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedIo {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

async fn echo(request: Request<ReqBody>) -> Result<Response<Full<Bytes>>, Infallible> {
    let body = request.into_body().collect().await.map(|collected| collected.to_bytes()).unwrap_or_default();
    Ok(Response::new(Full::new(body)))
}

fn decode_all(request: &[u8]) -> usize {
    let mut decoder = RequestDecoder::new();
    let mut bytes = BytesMut::from(request);
    let mut messages = 0;
    while let Some(message) = decoder.decode(&mut bytes).unwrap() {
        messages += 1;
        if matches!(message, Message::Payload(item) if item.is_eof()) {
            break;
        }
    }
    messages
}

fn bench_request_decoder(c: &mut Criterion) {
    c.bench_function("decode_post_request", |b| b.iter(|| black_box(decode_all(POST_REQUEST))));
    c.bench_function("decode_chunked_request", |b| b.iter(|| black_box(decode_all(CHUNKED_REQUEST))));
}

fn bench_response_encoder(c: &mut Criterion) {
    c.bench_function("encode_echo_response_head", |b| {
        b.iter(|| {
            let mut encoder = ResponseEncoder::new();
            let mut bytes = BytesMut::new();
            let mut head = ResponseHead::new(());
            head.headers_mut().insert(CONTENT_TYPE, "text/plain".parse().unwrap());
            let message = Message::<_, Bytes>::Header((head, PayloadSize::Length(11)));
            encoder.encode(message, &mut bytes).unwrap();
            black_box(bytes);
        });
    });
}

fn bench_http_connection(c: &mut Criterion) {
    let handler = Arc::new(make_handler(echo));

    c.bench_function("process_echo_request", |b| {
        b.iter(|| {
            let reader = ScriptedIo { input: Bytes::from_static(POST_REQUEST) };
            let writer = ScriptedIo { input: Bytes::new() };
            let connection = HttpConnection::new(reader, writer);
            block_on(connection.process(Arc::clone(&handler))).unwrap();
        });
    });
}

criterion_group!(benches, bench_request_decoder, bench_response_encoder, bench_http_connection);
criterion_main!(benches);
