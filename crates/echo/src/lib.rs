//! An HTTP server that answers every POST with its own body
//!
//! The request handling lives in [`echo`], on top of the `echo-http` host. [`mode`] holds the
//! table of server implementations the binary can start, [`cli`] the command line that picks
//! one of them. [`client`] is the matching client, posting over one kept-alive
//! connection.
//!
//! | Request | Response |
//! |---|---|
//! | method other than POST | `405 Method Not Allowed`, `Allow: POST`, empty body |
//! | POST, body read fails | `500 Internal Server Error`, empty body |
//! | POST | `200 OK`, the request body, request `Content-Type`/`Content-Length` copied |

pub mod cli;
pub mod client;
pub mod echo;
pub mod error;
pub mod logging;
pub mod mode;

pub use client::EchoClient;
pub use echo::EchoHandler;
pub use error::{ClientError, ModeError, StartupError};
pub use mode::{HttpServer, Mode, ModeRegistry};
