use std::error::Error;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::header::CONNECTION;
use http::{HeaderValue, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Empty};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::select;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info, warn};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::body::ReqBody;
use crate::protocol::{HttpError, Message, ParseError, PayloadItem, PayloadSize, RemoteAddr, RequestHeader, ResponseHead, SendError};

/// Initial capacity of the read buffer, and so the usual upper bound of one body chunk
const READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// One HTTP/1.1 connection, processing requests one after another.
///
/// For every request the connection:
/// - answers `Expect: 100-continue` before the handler runs
/// - streams the body to the handler while the handler runs
/// - drains whatever body the handler left unread
/// - writes the handler's response, or a 500 if the handler failed
/// - keeps going unless the client or a broken body stream asks for the connection to close
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
    remote_addr: Option<RemoteAddr>,
}

impl<R, W> std::fmt::Debug for HttpConnection<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnection").field("remote_addr", &self.remote_addr).finish_non_exhaustive()
    }
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), READ_BUFFER_CAPACITY),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
            remote_addr: None,
        }
    }

    /// Attaches the peer address to every request of this connection as a [`RemoteAddr`].
    #[must_use]
    pub fn with_remote_addr(mut self, remote_addr: SocketAddr) -> Self {
        self.remote_addr = Some(RemoteAddr(remote_addr));
        self
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler<ReqBody>,
        H::RespBody: Body + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(Message::Header((header, payload_size)))) => {
                    if !self.do_process(header, payload_size, &handler).await? {
                        info!("connection is not kept alive, shutdown");
                        return Ok(());
                    }
                }

                Some(Ok(Message::Payload(_))) => {
                    error!("received payload while waiting for a request head");
                    self.do_send_response(build_error_response(StatusCode::BAD_REQUEST), false).await?;
                    return Err(ParseError::invalid_body("need header while receive body").into());
                }

                Some(Err(e)) => {
                    error!(cause = %e, "can't receive next request");
                    self.do_send_response(build_error_response(StatusCode::BAD_REQUEST), false).await?;
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }

    /// Handles one request; returns whether the connection may be reused.
    async fn do_process<H>(&mut self, mut header: RequestHeader, payload_size: PayloadSize, handler: &Arc<H>) -> Result<bool, HttpError>
    where
        H: Handler<ReqBody>,
        H::RespBody: Body + Unpin,
        <H::RespBody as Body>::Error: Display,
    {
        let keep_alive = header.keep_alive();

        if header.expects_continue() && !payload_size.is_empty() {
            let writer = self.framed_write.get_mut();
            writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await.map_err(SendError::io)?;
            writer.flush().await.map_err(SendError::io)?;
            info!("receive expect request header, sent continue response");
        }

        if let Some(remote_addr) = self.remote_addr {
            header.as_mut().extensions_mut().insert(remote_addr);
        }

        let (req_body, mut body_sender) = ReqBody::body_channel(&mut self.framed_read, payload_size);
        let request = header.body(req_body);

        // The handler pulls body chunks that only the body sender can read from the
        // connection, so both are polled on this task until the handler is done.
        let (response_result, body_result) = {
            let request_handle_future = handler.call(request);
            let body_sender_future = body_sender.send_body();
            tokio::pin!(request_handle_future, body_sender_future);

            let mut body_result = None;
            let response_result = loop {
                select! {
                    biased;
                    response = &mut request_handle_future => break response,
                    result = &mut body_sender_future, if body_result.is_none() => body_result = Some(result),
                }
            };
            (response_result, body_result)
        };

        let body_intact = match body_result {
            Some(Err(_)) => false,
            _ => match body_sender.skip_body().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(cause = %e, "failed to skip unread request body");
                    false
                }
            },
        };
        drop(body_sender);

        let keep_alive = keep_alive && body_intact;
        self.send_response(response_result, keep_alive).await?;
        Ok(keep_alive)
    }

    async fn send_response<T, E>(&mut self, response_result: Result<Response<T>, E>, keep_alive: bool) -> Result<(), HttpError>
    where
        T: Body + Unpin,
        T::Error: Display,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        match response_result {
            Ok(response) => self.do_send_response(response, keep_alive).await,
            Err(e) => {
                let e: Box<dyn Error + Send + Sync> = e.into();
                error!(cause = %e, "handle response error");
                self.do_send_response(build_error_response(StatusCode::INTERNAL_SERVER_ERROR), keep_alive).await
            }
        }
    }

    async fn do_send_response<T>(&mut self, response: Response<T>, keep_alive: bool) -> Result<(), HttpError>
    where
        T: Body + Unpin,
        T::Error: Display,
    {
        let (mut parts, mut body) = response.into_parts();
        if !keep_alive {
            parts.headers.insert(CONNECTION, HeaderValue::from_static("close"));
        }

        let payload_size = PayloadSize::from(body.size_hint());
        let head = ResponseHead::from_parts(parts, ());
        self.framed_write.feed(Message::<_, T::Data>::Header((head, payload_size))).await?;

        loop {
            match body.frame().await {
                Some(Ok(frame)) => {
                    // trailers have no place in the response framing used here
                    if let Ok(data) = frame.into_data() {
                        self.framed_write.feed(Message::Payload(PayloadItem::Chunk(data))).await?;
                    }
                }
                Some(Err(e)) => return Err(SendError::invalid_body(format!("resolve response body error: {e}")).into()),
                None => break,
            }
        }

        self.framed_write.send(Message::Payload(PayloadItem::<T::Data>::Eof)).await?;
        Ok(())
    }
}

fn build_error_response(status_code: StatusCode) -> Response<Empty<Bytes>> {
    let mut response = Response::new(Empty::new());
    *response.status_mut() = status_code;
    response
}
