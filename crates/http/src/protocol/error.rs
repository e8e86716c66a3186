use std::io;
use thiserror::Error;

/// Why a connection stopped: the request side or the response side broke.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// A request that could not be decoded. Also what a request body yields when it breaks.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("request head of {current_size} bytes exceeds the limit of {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("more than {max_num} header fields")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("unsupported http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid request method")]
    InvalidMethod,

    #[error("invalid request target")]
    InvalidUri,

    #[error("invalid content-length: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid transfer-encoding: {reason}")]
    InvalidTransferEncoding { reason: String },

    #[error("invalid request body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(reason: S) -> Self {
        Self::InvalidHeader { reason: reason.to_string() }
    }

    pub fn invalid_body<S: ToString>(reason: S) -> Self {
        Self::InvalidBody { reason: reason.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(reason: S) -> Self {
        Self::InvalidContentLength { reason: reason.to_string() }
    }

    pub fn invalid_transfer_encoding<S: ToString>(reason: S) -> Self {
        Self::InvalidTransferEncoding { reason: reason.to_string() }
    }
}

/// A response that could not be written.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid response body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(reason: S) -> Self {
        Self::InvalidBody { reason: reason.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
