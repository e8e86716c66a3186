//! The echo request handler.

use std::convert::Infallible;
use std::fmt::Display;
use std::pin::pin;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use echo_http::handler::Handler;
use echo_http::protocol::RemoteAddr;
use http::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Full};
use tracing::{debug, error, info};

/// Request headers copied onto the echo response, every value, in request order.
static ECHOED_HEADERS: [HeaderName; 2] = [CONTENT_TYPE, CONTENT_LENGTH];

/// Answers a POST with its own body.
///
/// Stateless, so one instance serves every connection at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl EchoHandler {
    /// Handles one request.
    ///
    /// - any method other than POST gets `405` with `Allow: POST`, the body is left unread
    /// - the body is read to its end before anything is answered; a failed read gets `500` and
    ///   whatever was read so far is dropped
    /// - otherwise `200` with the same bytes, plus the request's `Content-Type` and
    ///   `Content-Length` values
    pub async fn echo<B>(&self, request: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Display,
    {
        let remote_addr = request.extensions().get::<RemoteAddr>().map_or_else(|| "unknown".to_owned(), ToString::to_string);
        info!(remote_addr = %remote_addr, "got new request");

        if request.method() != Method::POST {
            info!(method = %request.method(), "got invalid method");
            let mut response = empty_response(StatusCode::METHOD_NOT_ALLOWED);
            response.headers_mut().insert(ALLOW, HeaderValue::from_static("POST"));
            return response;
        }

        let (parts, body) = request.into_parts();
        let buffer = match read_body(body).await {
            Ok(buffer) => buffer,
            Err(e) => {
                error!(remote_addr = %remote_addr, cause = %e, "failed to read request body");
                return empty_response(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        debug!(size = buffer.len(), message = %String::from_utf8_lossy(&buffer), "echo request body");

        let mut response = Response::new(Full::new(buffer.freeze()));
        *response.headers_mut() = project_headers(&parts.headers);
        response
    }
}

#[async_trait]
impl<B> Handler<B> for EchoHandler
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Display + Send,
{
    type RespBody = Full<Bytes>;
    type Error = Infallible;

    async fn call(&self, req: Request<B>) -> Result<Response<Self::RespBody>, Self::Error> {
        Ok(self.echo(req).await)
    }
}

async fn read_body<B: Body>(body: B) -> Result<BytesMut, B::Error> {
    let mut body = pin!(body);
    let mut buffer = BytesMut::new();

    while let Some(frame) = body.frame().await {
        if let Ok(data) = frame?.into_data() {
            buffer.put(data);
        }
    }

    Ok(buffer)
}

fn project_headers(headers: &HeaderMap) -> HeaderMap {
    let mut projected = HeaderMap::new();
    for (name, value) in headers {
        if ECHOED_HEADERS.contains(name) {
            projected.append(name.clone(), value.clone());
        }
    }
    projected
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
