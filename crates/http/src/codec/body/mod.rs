//! Payload framing, in both directions.
//!
//! - [`PayloadDecoder`] reads request bodies framed by `Content-Length` or chunked encoding
//! - [`PayloadEncoder`] writes response bodies the same two ways

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;
mod payload_encoder;

pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
