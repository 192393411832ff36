//! Error types for store operations.
//!
//! Provides a unified error type covering store lifecycle, payload codec,
//! engine and hook failures. A lookup that matches nothing is not an error;
//! it comes back as `None` or an empty `Vec`.

use std::path::PathBuf;

use shelf_core::{CodecError, HookError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An operation was attempted before `open` or after `close`.
    #[error("store is not open")]
    StoreNotOpen,

    /// Payload encoding or decoding failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Update or delete of an object that was never inserted.
    #[error("{collection} object has no identifier; it was never saved")]
    MissingIdentifier { collection: String },

    /// Insert of an object that already has an identifier.
    #[error("{collection} object {id} is already stored")]
    AlreadyStored { collection: String, id: String },

    /// Save of an instance previously deleted through the store.
    #[error("{collection} object was deleted; reset its record before saving it again")]
    DeletedObject { collection: String },

    /// Update of an object whose row no longer exists.
    #[error("{collection} object {id} is not in the store")]
    NotStored { collection: String, id: String },

    /// SQLite reported an error while executing a statement.
    #[error("{operation} on {table} failed: {source}")]
    Engine {
        operation: &'static str,
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A lifecycle hook failed after its row mutation was committed.
    #[error("{hook} hook of {collection} failed: {source}")]
    Hook {
        hook: &'static str,
        collection: String,
        #[source]
        source: HookError,
    },

    /// A stored column could not be converted back into a Rust value.
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),

    /// Collection name cannot be mapped to a table.
    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),

    /// The collection's table name differs only in letter case from an
    /// existing table; SQLite would treat both as the same table.
    #[error("table '{table}' collides with existing table '{existing}'")]
    CollectionConflict { table: String, existing: String },

    /// `remove` was called on the file the store currently has open.
    #[error("store {} is open; close it before removing", .0.display())]
    StoreInUse(PathBuf),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;

/// Attaches the failing operation and table to SQLite errors.
pub(crate) trait EngineContext<T> {
    fn engine(self, operation: &'static str, table: &str) -> Result<T>;
}

impl<T> EngineContext<T> for std::result::Result<T, rusqlite::Error> {
    fn engine(self, operation: &'static str, table: &str) -> Result<T> {
        self.map_err(|source| StoreError::Engine {
            operation,
            table: table.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_context_names_operation_and_table() {
        let failed: std::result::Result<(), rusqlite::Error> =
            Err(rusqlite::Error::QueryReturnedNoRows);
        let err = failed.engine("insert", "shelf_State").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("insert"));
        assert!(message.contains("shelf_State"));
    }

    #[test]
    fn test_hook_error_keeps_source() {
        use std::error::Error as _;

        let err = StoreError::Hook {
            hook: "after_save",
            collection: "ParentObject".into(),
            source: "children unavailable".into(),
        };
        assert!(err.to_string().contains("after_save"));
        assert_eq!(err.source().unwrap().to_string(), "children unavailable");
    }
}
