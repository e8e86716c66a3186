use http::Response;

/// A response head: the status, version and headers of a response before its body is encoded.
pub type ResponseHead = Response<()>;
