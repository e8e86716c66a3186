//! Helper macros used across the codec.

/// Returns early with `$error` unless `$predicate` holds.
///
/// Like `assert!`, but for validation of untrusted input where a panic is not an option.
///
/// ```ignore
/// ensure!(body_offset <= MAX_HEADER_BYTES, ParseError::too_large_header(body_offset, MAX_HEADER_BYTES));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
