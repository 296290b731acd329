//! Error types for the wire codec.

use thiserror::Error;

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Failed to decode a message.
    #[error("failed to decode {message}: {source}")]
    Decode {
        message: &'static str,
        #[source]
        source: prost::DecodeError,
    },

    /// Failed to encode a message.
    #[error("failed to encode {message}: {source}")]
    Encode {
        message: &'static str,
        #[source]
        source: prost::EncodeError,
    },
}
