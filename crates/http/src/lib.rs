//! The async HTTP/1.1 host underneath the echo server
//!
//! This crate accepts TCP connections, decodes HTTP/1.1 requests, hands each request to a
//! [`handler::Handler`] and writes the handler's response back, keeping the connection alive
//! between requests when the client allows it. It only reacts to fully-parsed request heads;
//! the request body is streamed to the handler as an `http_body::Body`.
//!
//! # Example
//!
//! ```no_run
//! use std::convert::Infallible;
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use http_body_util::{BodyExt, Full};
//! use echo_http::handler::make_handler;
//! use echo_http::protocol::body::ReqBody;
//! use echo_http::server::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::bind("127.0.0.1:8080").await.expect("bind failed");
//!     server.serve(Arc::new(make_handler(shout))).await;
//! }
//!
//! async fn shout(request: Request<ReqBody>) -> Result<Response<Full<Bytes>>, Infallible> {
//!     let body = match request.into_body().collect().await {
//!         Ok(collected) => collected.to_bytes().to_ascii_uppercase(),
//!         Err(_) => Vec::new(),
//!     };
//!     Ok(Response::new(Full::new(Bytes::from(body))))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`server`]: binds the listener and spawns one task per connection
//! - [`connection`]: drives one connection, request after request
//! - [`codec`]: request decoding and response encoding on top of `tokio_util::codec`
//! - [`protocol`]: message, header, body and error types shared by the layers above
//! - [`handler`]: the single-call interface a request handler implements
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only
//! - No TLS
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64
//! - No read or idle timeouts

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
