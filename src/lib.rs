#![doc = include_str!("../README.md")]

/// Part body streams with optional close capability
pub mod body;
/// RFC 2046 boundary generation and validation
pub mod boundary;
mod builder;
mod error;
/// Part header fields and rendering
pub mod header;

pub use body::{Body, Closeable};
pub use boundary::{Boundary, MAX_BOUNDARY_LEN, validate_boundary};
pub use builder::{FormBuilder, Part};
pub use error::{FormError, Result};
pub use header::{PartHeader, escape_quotes};
