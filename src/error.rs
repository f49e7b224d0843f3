//! Multipart form error types

use thiserror::Error;

/// Errors raised while building, reading or closing a multipart form
#[derive(Error, Debug)]
pub enum FormError {
    /// Boundary shorter than 1 or longer than 70 characters
    #[error("Invalid boundary length: {0} (must be 1-70)")]
    InvalidBoundaryLength(usize),

    /// Boundary contains a character outside the RFC 2046 `bchars` set,
    /// or a space in the final position
    #[error("Invalid boundary character: {0:?}")]
    InvalidBoundaryCharacter(char),

    /// The form was read before `finalize` was called
    #[error("Form must be finalized before reading")]
    NotFinalized,

    /// The boundary was changed after the form was finalized
    #[error("Boundary cannot change after the form is finalized")]
    AlreadyFinalized,

    /// Closing the body of a part failed
    #[error("Failed to close body of part {index}: {source}")]
    CloseFailure {
        /// Position of the part whose body failed to close
        index: usize,
        /// Error reported by the body
        #[source]
        source: std::io::Error,
    },

    /// The operating system random source could not produce a boundary
    #[error("Secure random source unavailable: {0}")]
    RandomSourceExhausted(#[source] rand::Error),

    /// IO error while opening a file part
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormError {
    /// Returns true for boundary validation failures
    pub fn is_invalid_boundary(&self) -> bool {
        matches!(
            self,
            FormError::InvalidBoundaryLength(_) | FormError::InvalidBoundaryCharacter(_)
        )
    }
}

/// Result type alias using FormError
pub type Result<T> = std::result::Result<T, FormError>;
