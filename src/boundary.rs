//! Multipart boundary generation and validation
//!
//! Reference: https://datatracker.ietf.org/doc/html/rfc2046#section-5.1.1
//!
//! A boundary is 1-70 characters drawn from the `bchars` set:
//!
//! ```text
//! bchars := bcharsnospace / " "
//! bcharsnospace := DIGIT / ALPHA / "'" / "(" / ")" /
//!                  "+" / "_" / "," / "-" / "." /
//!                  "/" / ":" / "=" / "?"
//! ```
//!
//! and must not end with a space.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::{FormError, Result};

/// Maximum boundary length (RFC 2046 Section 5.1.1)
pub const MAX_BOUNDARY_LEN: usize = 70;

/// Number of random bytes behind a generated boundary
const RANDOM_BOUNDARY_BYTES: usize = 30;

/// Characters that force the boundary parameter to be quoted
/// (RFC 2045 `tspecials` plus space)
const TSPECIALS: &str = "()<>@,;:\\\"/[]?= ";

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// A validated multipart boundary
///
/// # Examples
///
/// ```
/// use multiform::Boundary;
///
/// let boundary: Boundary = "test-boundary".parse().unwrap();
/// assert_eq!(boundary.as_str(), "test-boundary");
/// assert!("bad@boundary".parse::<Boundary>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Boundary(String);

impl Boundary {
    /// Validate and wrap a caller-supplied boundary
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate_boundary(&value)?;
        Ok(Self(value))
    }

    /// Generate a boundary from the operating system CSPRNG
    ///
    /// 30 random bytes rendered as 60 lowercase hex characters. There is
    /// no fallback: if the OS cannot supply randomness the error is
    /// returned as [`FormError::RandomSourceExhausted`].
    pub fn random() -> Result<Self> {
        Self::random_from(&mut OsRng)
    }

    /// Generate a boundary from `rng`, surfacing its failure unchanged
    pub(crate) fn random_from<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self> {
        let mut buf = [0u8; RANDOM_BOUNDARY_BYTES];
        rng.try_fill_bytes(&mut buf)
            .map_err(FormError::RandomSourceExhausted)?;

        let mut hex = String::with_capacity(RANDOM_BOUNDARY_BYTES * 2);
        for byte in buf {
            hex.push(HEX_DIGITS[(byte >> 4) as usize] as char);
            hex.push(HEX_DIGITS[(byte & 0x0f) as usize] as char);
        }
        Ok(Self(hex))
    }

    /// The boundary text, without the leading `--`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the boundary must be quoted in a Content-Type parameter
    pub fn needs_quoting(&self) -> bool {
        self.0.contains(|c: char| TSPECIALS.contains(c))
    }

    /// Format the `multipart/form-data` Content-Type header value
    ///
    /// The boundary is wrapped in double quotes verbatim when it contains
    /// a tspecial character or a space.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiform::Boundary;
    ///
    /// let plain = Boundary::new("abc").unwrap();
    /// assert_eq!(plain.content_type(), "multipart/form-data; boundary=abc");
    ///
    /// let spaced = Boundary::new("a b").unwrap();
    /// assert_eq!(spaced.content_type(), "multipart/form-data; boundary=\"a b\"");
    /// ```
    pub fn content_type(&self) -> String {
        if self.needs_quoting() {
            format!("multipart/form-data; boundary=\"{}\"", self.0)
        } else {
            format!("multipart/form-data; boundary={}", self.0)
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Boundary {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Boundary {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Boundary {
    type Error = FormError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Boundary> for String {
    fn from(boundary: Boundary) -> Self {
        boundary.0
    }
}

/// Check a boundary against the RFC 2046 grammar
///
/// Length is checked before characters, so an over-long boundary that
/// also contains a bad character reports
/// [`FormError::InvalidBoundaryLength`].
///
/// # Examples
///
/// ```
/// use multiform::{validate_boundary, FormError};
///
/// assert!(validate_boundary("test-boundary").is_ok());
/// assert!(matches!(
///     validate_boundary("trailing "),
///     Err(FormError::InvalidBoundaryCharacter(' '))
/// ));
/// ```
pub fn validate_boundary(boundary: &str) -> Result<()> {
    let len = boundary.len();
    if len == 0 || len > MAX_BOUNDARY_LEN {
        return Err(FormError::InvalidBoundaryLength(len));
    }

    let last = len - 1;
    for (i, c) in boundary.char_indices() {
        let ok = match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' => true,
            '\'' | '(' | ')' | '+' | '_' | ',' | '-' | '.' | '/' | ':' | '=' | '?' => true,
            ' ' => i != last,
            _ => false,
        };
        if !ok {
            return Err(FormError::InvalidBoundaryCharacter(c));
        }
    }

    Ok(())
}
