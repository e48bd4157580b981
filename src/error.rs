//! Error types for sectionrank.

use std::io;
use thiserror::Error;

/// Result type alias for sectionrank operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while analysing a document collection.
///
/// Document-level variants (I/O, parse, encryption) are caught at the
/// document boundary by [`crate::Analyzer`] and recorded as warnings.
/// Everything else aborts the run.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The PDF structure is corrupted or malformed.
    #[error("Corrupted PDF structure: {0}")]
    Corrupted(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The embedding collaborator failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The embedding collaborator returned the wrong number of vectors.
    #[error("Embedding returned {actual} vectors for {expected} inputs")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    /// The analysis request is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The configuration is malformed or out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during report rendering.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Whether this error only affects a single document.
    ///
    /// Document-level errors are downgraded to warnings by the pipeline;
    /// the others abort the run.
    pub fn is_document_level(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::UnknownFormat
                | Error::PdfParse(_)
                | Error::Encrypted
                | Error::Corrupted(_)
                | Error::PageOutOfRange(..)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::EmbeddingCountMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "Embedding returned 3 vectors for 4 inputs");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_document_level());
    }

    #[test]
    fn test_embedding_errors_are_fatal() {
        assert!(!Error::Embedding("model offline".into()).is_document_level());
        assert!(!Error::EmbeddingCountMismatch {
            expected: 2,
            actual: 1
        }
        .is_document_level());
    }
}
