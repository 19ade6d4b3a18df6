//! Error types for the persistent hint store.

/// Errors raised while opening or talking to [`FjallLocationCache`](crate::FjallLocationCache).
///
/// Only the constructors return these. Inside [`ShardLocationCache`](crate::ShardLocationCache)
/// calls they are logged and the operation degrades to a miss or a no-op.
#[derive(Debug, thiserror::Error)]
pub enum HintError {
    /// Fjall database error.
    #[error("fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    /// I/O error (e.g. from Fjall guard operations).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] postcard::Error),

    /// Stored key was not a big-endian file id.
    #[error("malformed hint key ({0} bytes)")]
    MalformedKey(usize),
}
