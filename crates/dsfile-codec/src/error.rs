use std::io;

/// Errors from encoding or decoding a value.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Native binary (bincode) failure.
    #[error("native codec error: {0}")]
    Native(#[from] bincode::Error),

    /// JSON failure, including syntax errors and truncated input.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// CBOR serialization failure.
    #[error("cbor encode error: {0}")]
    CborEncode(String),

    /// CBOR deserialization failure.
    #[error("cbor decode error: {0}")]
    CborDecode(String),

    /// I/O error writing to the sink or reading from the source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
