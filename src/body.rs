//! Part body streams
//!
//! A [`Body`] is always readable. Whether it can also be closed is fixed
//! when it is constructed: [`Body::reader`] wraps a plain reader whose
//! close is a no-op, [`Body::closeable`] wraps a [`Closeable`] whose close
//! is forwarded and whose handle is released afterwards.

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};

/// A readable stream with an explicit close operation
pub trait Closeable: Read {
    /// Release the underlying resource
    fn close(&mut self) -> io::Result<()>;
}

/// Files are released by dropping the handle, which [`Body`] does right
/// after a successful or failed close.
impl Closeable for File {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

enum Source {
    Plain(Box<dyn Read + Send>),
    Closeable(Box<dyn Closeable + Send>),
    Closed,
}

/// Byte stream behind one multipart part
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use multiform::Body;
///
/// let mut body = Body::from("hello");
/// assert_eq!(body.known_len(), Some(5));
///
/// let mut out = String::new();
/// body.read_to_string(&mut out).unwrap();
/// assert_eq!(out, "hello");
/// ```
pub struct Body {
    source: Source,
    len: Option<u64>,
}

impl Body {
    /// Wrap a reader that has nothing to close
    pub fn reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            source: Source::Plain(Box::new(reader)),
            len: None,
        }
    }

    /// Wrap a reader whose `close` must be called when the form is closed
    pub fn closeable<C>(reader: C) -> Self
    where
        C: Closeable + Send + 'static,
    {
        Self {
            source: Source::Closeable(Box::new(reader)),
            len: None,
        }
    }

    /// Wrap an open file; closing the body releases the handle
    pub fn file(file: File) -> Self {
        Self::closeable(file)
    }

    /// Attach the exact number of bytes the body will produce
    pub fn sized(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    /// Number of bytes the body will produce, if known up front
    pub fn known_len(&self) -> Option<u64> {
        self.len
    }

    /// Whether close is forwarded to the wrapped reader
    pub fn is_closeable(&self) -> bool {
        matches!(self.source, Source::Closeable(_))
    }

    /// Whether the body has already been closed
    pub fn is_closed(&self) -> bool {
        matches!(self.source, Source::Closed)
    }

    /// Close the wrapped reader if it supports closing
    ///
    /// A plain reader is left untouched and `Ok(())` is returned. A
    /// closeable reader is closed and dropped; the body then refuses
    /// further reads. Closing an already closed body is a no-op.
    pub fn close(&mut self) -> io::Result<()> {
        match std::mem::replace(&mut self.source, Source::Closed) {
            Source::Closeable(mut reader) => reader.close(),
            Source::Plain(reader) => {
                self.source = Source::Plain(reader);
                Ok(())
            }
            Source::Closed => Ok(()),
        }
    }

    fn in_memory(bytes: Vec<u8>) -> Self {
        let len = bytes.len() as u64;
        Self::reader(Cursor::new(bytes)).sized(len)
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.source {
            Source::Plain(reader) => reader.read(buf),
            Source::Closeable(reader) => reader.read(buf),
            Source::Closed => Err(io::Error::other("Body closed")),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.source {
            Source::Plain(_) => "plain",
            Source::Closeable(_) => "closeable",
            Source::Closed => "closed",
        };
        f.debug_struct("Body")
            .field("kind", &kind)
            .field("len", &self.len)
            .finish()
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Self::in_memory(value.into_bytes())
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Self::in_memory(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Self::in_memory(value)
    }
}

impl From<&'static [u8]> for Body {
    fn from(value: &'static [u8]) -> Self {
        Self::reader(value).sized(value.len() as u64)
    }
}

impl From<File> for Body {
    fn from(file: File) -> Self {
        Self::file(file)
    }
}
