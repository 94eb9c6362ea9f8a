//! Error types for the schema → Go pipeline.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the core can report, grouped by pipeline stage.
///
/// Fallback types and naming collisions are never errors; they are resolved
/// inside the builder.
#[derive(Error, Debug)]
pub enum Error {
    /// The document is not well-formed JSON.
    #[error("{document}: syntax error at byte {offset}: {message}")]
    SchemaSyntax {
        document: String,
        /// Byte offset of the error in the document text.
        offset: usize,
        message: String,
    },

    /// Well-formed JSON that is not a schema of the supported subset.
    #[error("{document}: invalid schema at {path}: {message}")]
    SchemaShape {
        document: String,
        path: String,
        /// Byte offset of the offending value, when the parser knows it.
        offset: Option<usize>,
        message: String,
    },

    /// A `$ref` whose target does not exist anywhere in the batch.
    #[error("{document}: reference \"{reference}\" at \"{location}\" not found")]
    UnresolvedReference {
        document: String,
        reference: String,
        location: String,
    },

    /// A schema shape the builder cannot turn into a type.
    #[error("type {type_name}: {message}")]
    TypeConflict { type_name: String, message: String },

    /// Writing to the output sink failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn shape(document: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaShape {
            document: document.into(),
            path: path.into(),
            offset: None,
            message: message.into(),
        }
    }

    pub fn conflict(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeConflict {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}
