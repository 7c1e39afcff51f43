//! Error types for schemaless documents.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Stored fields do not decode into the expected record.
    #[error("Malformed document {id}: {reason}")]
    Malformed { id: String, reason: String },

    /// A record serialized to something other than a JSON object.
    #[error("Record does not encode to a field map")]
    NotAnObject,

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}
