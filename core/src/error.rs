//! Error types for payload encoding and lifecycle hooks.

use thiserror::Error;

/// Errors raised by a [`PayloadCodec`](crate::PayloadCodec).
#[derive(Debug, Error)]
pub enum CodecError {
    /// The object could not be turned into a payload.
    #[error("failed to encode {collection}: {source}")]
    Encode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored payload could not be turned back into an object.
    #[error("failed to decode {collection}: {source}")]
    Decode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Error returned by a lifecycle hook.
///
/// Hooks run after the row mutation has been committed, so a hook error
/// never rolls anything back.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias for results with [`CodecError`].
pub type Result<T> = std::result::Result<T, CodecError>;
