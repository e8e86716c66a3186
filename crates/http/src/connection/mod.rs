//! Connection handling.
//!
//! [`HttpConnection`] drives one accepted connection: it decodes requests, runs the handler
//! for each of them, writes the responses and decides when the connection ends.

mod http_connection;

pub use http_connection::HttpConnection;
