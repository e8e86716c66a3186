use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, Stream, StreamExt};
use http_body::{Body, Frame, SizeHint};
use tracing::{error, info, warn};

use crate::protocol::{Message, ParseError, PayloadItem, PayloadSize, RequestHeader};

type PayloadResult = Result<PayloadItem, ParseError>;

/// The body of a request, as seen by a handler.
///
/// Nothing is read from the connection until the handler polls: each poll sends one demand
/// signal to the [`ReqBodySender`] and waits for the single payload item it answers with.
#[derive(Debug)]
pub struct ReqBody {
    demand: mpsc::Sender<()>,
    data: mpsc::Receiver<PayloadResult>,
    payload_size: PayloadSize,
    in_flight: bool,
    finished: bool,
}

impl ReqBody {
    /// Creates the handler side and the connection side of one request body.
    pub fn body_channel<S>(payload_stream: &mut S, payload_size: PayloadSize) -> (ReqBody, ReqBodySender<'_, S>)
    where
        S: Stream + Unpin,
    {
        let (demand_sender, demand_receiver) = mpsc::channel(1);
        let (data_sender, data_receiver) = mpsc::channel(1);

        let req_body = ReqBody {
            demand: demand_sender,
            data: data_receiver,
            payload_size,
            in_flight: false,
            finished: payload_size.is_empty(),
        };

        let body_sender = ReqBodySender { payload_stream, demand: demand_receiver, data: data_sender, eof: false };

        (req_body, body_sender)
    }

    fn finish_with(&mut self, item: Option<Result<Frame<Bytes>, ParseError>>) -> Poll<Option<Result<Frame<Bytes>, ParseError>>> {
        self.finished = true;
        Poll::Ready(item)
    }
}

impl Body for ReqBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        if !this.in_flight {
            if let Err(e) = ready!(this.demand.poll_ready(cx)) {
                return this.finish_with(Some(Err(ParseError::invalid_body(e))));
            }
            if let Err(e) = this.demand.start_send(()) {
                return this.finish_with(Some(Err(ParseError::invalid_body(e))));
            }
            this.in_flight = true;
        }

        let received = ready!(this.data.poll_next_unpin(cx));
        this.in_flight = false;

        match received {
            Some(Ok(PayloadItem::Chunk(bytes))) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
            Some(Ok(PayloadItem::Eof)) => this.finish_with(None),
            Some(Err(e)) => this.finish_with(Some(Err(e))),
            None => this.finish_with(Some(Err(ParseError::invalid_body("request body sender is gone")))),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.finished
    }

    fn size_hint(&self) -> SizeHint {
        if self.finished { SizeHint::with_exact(0) } else { self.payload_size.into() }
    }
}

/// The connection side of a [`ReqBody`].
///
/// Borrows the decoded message stream for the lifetime of one request.
#[derive(Debug)]
pub struct ReqBodySender<'conn, S> {
    payload_stream: &'conn mut S,
    demand: mpsc::Receiver<()>,
    data: mpsc::Sender<PayloadResult>,
    eof: bool,
}

impl<S> ReqBodySender<'_, S>
where
    S: Stream<Item = Result<Message<(RequestHeader, PayloadSize)>, ParseError>> + Unpin,
{
    /// Answers demand from the [`ReqBody`] until the payload is complete or the body is dropped.
    ///
    /// A read failure is forwarded to the handler and returned; the stream must not be used
    /// for another request after that.
    pub async fn send_body(&mut self) -> Result<(), ParseError> {
        while !self.eof {
            if self.demand.next().await.is_none() {
                // handler dropped the body, the rest is left to skip_body
                return Ok(());
            }

            match self.read_item().await {
                Ok(item) => {
                    self.eof = item.is_eof();
                    if self.data.send(Ok(item)).await.is_err() {
                        return Ok(());
                    }
                }
                Err(e) => {
                    error!(cause = %e, "failed to read request body");
                    if let Err(send_error) = self.data.send(Err(ParseError::invalid_body(&e))).await {
                        warn!(cause = %send_error, "request body is gone, can't report read failure");
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Reads and drops the part of the payload the handler did not consume.
    pub async fn skip_body(&mut self) -> Result<(), ParseError> {
        let mut skipped: usize = 0;
        while !self.eof {
            match self.read_item().await? {
                PayloadItem::Chunk(bytes) => skipped += bytes.len(),
                PayloadItem::Eof => self.eof = true,
            }
        }

        if skipped > 0 {
            info!(size = skipped, "skip request body");
        }
        Ok(())
    }

    async fn read_item(&mut self) -> Result<PayloadItem, ParseError> {
        match self.payload_stream.next().await {
            Some(Ok(Message::Payload(item))) => Ok(item),
            Some(Ok(Message::Header(_))) => Err(ParseError::invalid_body("received request head while reading body")),
            Some(Err(e)) => Err(e),
            None => Err(ParseError::invalid_body("connection closed before the body was complete")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use http_body_util::BodyExt;

    type Item = Result<Message<(RequestHeader, PayloadSize)>, ParseError>;

    fn chunk(data: &'static [u8]) -> Item {
        Ok(Message::Payload(PayloadItem::Chunk(Bytes::from_static(data))))
    }

    fn eof() -> Item {
        Ok(Message::Payload(PayloadItem::Eof))
    }

    #[tokio::test]
    async fn streams_every_chunk_in_order() {
        let mut payload_stream = stream::iter(vec![chunk(b"hello "), chunk(b"world"), eof()]);
        let (body, mut sender) = ReqBody::body_channel(&mut payload_stream, PayloadSize::Length(11));

        let (collected, sent) = tokio::join!(body.collect(), sender.send_body());

        assert!(sent.is_ok());
        assert_eq!(collected.unwrap().to_bytes(), Bytes::from_static(b"hello world"));
        assert!(sender.skip_body().await.is_ok());
    }

    #[tokio::test]
    async fn read_failure_reaches_the_body() {
        let mut payload_stream = stream::iter(vec![chunk(b"partial"), Err(ParseError::invalid_body("broken chunk"))]);
        let (body, mut sender) = ReqBody::body_channel(&mut payload_stream, PayloadSize::Chunked);

        let (collected, sent) = tokio::join!(body.collect(), sender.send_body());

        assert!(matches!(sent, Err(ParseError::InvalidBody { .. })));
        assert!(matches!(collected, Err(ParseError::InvalidBody { .. })));
    }

    #[tokio::test]
    async fn truncated_stream_is_an_error() {
        let mut payload_stream = stream::iter(vec![chunk(b"only half")]);
        let (body, mut sender) = ReqBody::body_channel(&mut payload_stream, PayloadSize::Length(20));

        let (collected, sent) = tokio::join!(body.collect(), sender.send_body());

        assert!(sent.is_err());
        assert!(collected.is_err());
    }

    #[tokio::test]
    async fn unread_body_is_skipped() {
        let mut payload_stream = stream::iter(vec![chunk(b"never "), chunk(b"read"), eof(), chunk(b"next")]);
        let (body, mut sender) = ReqBody::body_channel(&mut payload_stream, PayloadSize::Chunked);
        drop(body);

        assert!(sender.send_body().await.is_ok());
        assert!(sender.skip_body().await.is_ok());

        // the item after Eof belongs to the next request and stays in the stream
        assert!(matches!(payload_stream.next().await, Some(Ok(Message::Payload(PayloadItem::Chunk(_))))));
    }

    #[tokio::test]
    async fn empty_payload_needs_no_demand() {
        let mut payload_stream = stream::iter(vec![eof()]);
        let (mut body, mut sender) = ReqBody::body_channel(&mut payload_stream, PayloadSize::Empty);

        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
        assert_eq!(body.size_hint().exact(), Some(0));

        drop(body);
        assert!(sender.send_body().await.is_ok());
        assert!(sender.skip_body().await.is_ok());
    }
}
