//! The streaming request body.
//!
//! A request body is read from the same connection the handler's response goes back to, so
//! the two sides live on one task:
//!
//! - [`ReqBody`] is given to the handler and implements `http_body::Body`; every poll asks
//!   for exactly one more payload item
//! - [`ReqBodySender`] stays with the connection, answers those requests from the decoder and
//!   drains whatever the handler left unread so the next request starts on a clean stream

mod req_body;

pub use req_body::ReqBody;
pub use req_body::ReqBodySender;
