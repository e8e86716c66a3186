//! Protocol types shared by the codec, the connection and the handlers.
//!
//! - [`Message`]: either a decoded/encodable head or one item of its payload
//! - [`PayloadItem`] and [`PayloadSize`]: payload chunks and how the payload is framed
//! - [`RequestHeader`]: a parsed request head, plus keep-alive and framing helpers
//! - [`RemoteAddr`]: the peer address, attached to every request as an extension
//! - [`ResponseHead`]: a response before its body is attached
//! - [`body`]: the streaming request body handed to handlers
//! - [`HttpError`], [`ParseError`], [`SendError`]: connection, decoding and encoding errors

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RemoteAddr;
pub use request::RequestHeader;

mod response;
pub use response::ResponseHead;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
