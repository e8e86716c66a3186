//! Request head handling.
//!
//! [`RequestHeader`] wraps an `http::Request<()>` produced by the decoder; the body is
//! attached later with [`RequestHeader::body`].

use std::fmt;
use std::net::SocketAddr;

use http::header::{CONNECTION, EXPECT};
use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

/// A decoded request head, without its body.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

/// Address of the peer that sent a request.
///
/// The connection stores it in the request extensions, so handlers can read it with
/// `request.extensions().get::<RemoteAddr>()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteAddr(pub SocketAddr);

impl fmt::Display for RemoteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl AsMut<Request<()>> for RequestHeader {
    fn as_mut(&mut self) -> &mut Request<()> {
        &mut self.inner
    }
}

impl RequestHeader {
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Attaches a body, turning the head into a full request.
    pub fn body<T>(self, body: T) -> Request<T> {
        self.inner.map(|()| body)
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// Whether the client sent `Expect: 100-continue` and waits for an interim response.
    pub fn expects_continue(&self) -> bool {
        self.headers().get(EXPECT).is_some_and(|value| value.as_bytes().eq_ignore_ascii_case(b"100-continue"))
    }

    /// Whether the connection may carry another request after this one.
    ///
    /// HTTP/1.1 is persistent unless the client sent `Connection: close`;
    /// HTTP/1.0 is persistent only with `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        match self.version() {
            Version::HTTP_11 => !self.has_connection_option("close"),
            Version::HTTP_10 => self.has_connection_option("keep-alive"),
            _ => false,
        }
    }

    fn has_connection_option(&self, option: &str) -> bool {
        self.headers()
            .get_all(CONNECTION)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|token| token.trim().eq_ignore_ascii_case(option))
    }
}

impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(version: Version, connection: Option<&str>) -> RequestHeader {
        let mut builder = Request::builder().method(Method::POST).uri("/").version(version);
        if let Some(value) = connection {
            builder = builder.header(CONNECTION, value);
        }
        RequestHeader::from(builder.body(()).unwrap())
    }

    #[test]
    fn http11_is_persistent_by_default() {
        assert!(header(Version::HTTP_11, None).keep_alive());
        assert!(header(Version::HTTP_11, Some("keep-alive")).keep_alive());
        assert!(!header(Version::HTTP_11, Some("close")).keep_alive());
        assert!(!header(Version::HTTP_11, Some("Upgrade, Close")).keep_alive());
    }

    #[test]
    fn http10_needs_keep_alive() {
        assert!(!header(Version::HTTP_10, None).keep_alive());
        assert!(header(Version::HTTP_10, Some("Keep-Alive")).keep_alive());
    }

    #[test]
    fn expect_continue() {
        let mut header = header(Version::HTTP_11, None);
        assert!(!header.expects_continue());

        header.headers_mut().insert(EXPECT, "100-Continue".parse().unwrap());
        assert!(header.expects_continue());
    }

    #[test]
    fn body_keeps_head() {
        let request = header(Version::HTTP_11, Some("close")).body("payload");
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.headers().get(CONNECTION).unwrap(), "close");
        assert_eq!(*request.body(), "payload");
    }
}
