//! Multipart form builder and lazy stream assembly
//!
//! [`FormBuilder`] collects parts, then [`FormBuilder::finalize`] turns them
//! into a queue of segments (rendered header, part body, ..., footer) that is
//! drained through [`std::io::Read`]. Bodies are never buffered: each one is
//! pulled from only when the reader reaches it.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::body::Body;
use crate::boundary::Boundary;
use crate::header::{PartHeader, form_disposition};
use crate::{FormError, Result};

const OCTET_STREAM: &str = "application/octet-stream";

/// One field or file of a multipart form
#[derive(Debug)]
pub struct Part {
    header: PartHeader,
    body: Body,
}

impl Part {
    pub fn new(header: PartHeader, body: Body) -> Self {
        Self { header, body }
    }

    /// Header fields rendered before the body
    pub fn header(&self) -> &PartHeader {
        &self.header
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}

/// A unit of the assembled stream
enum Segment {
    /// Rendered header block or the closing footer
    Bytes(Cursor<Vec<u8>>),
    /// Body of the part at this index in the registry
    Body(usize),
}

/// Segment queue built by `finalize`
struct Assembly {
    segments: VecDeque<Segment>,
    /// Parts registered before finalize; later parts are not emitted
    emitted: usize,
}

/// Streaming `multipart/form-data` builder
///
/// Parts are registered with the `add_*` methods, the form is sealed with
/// [`finalize`](Self::finalize), and the encoded body is then read through
/// the [`Read`] implementation. Reading before `finalize` fails with
/// [`FormError::NotFinalized`] wrapped in an [`io::Error`].
///
/// Parts added after `finalize` are kept so that [`close`](Self::close)
/// still reaches them, but they are not part of the encoded output.
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use multiform::FormBuilder;
///
/// let mut form = FormBuilder::new();
/// form.set_boundary("X").unwrap();
/// form.add_field("name", "test name");
/// form.add_form_file("file", "f.txt", "hello");
/// form.finalize();
///
/// let mut encoded = String::new();
/// form.read_to_string(&mut encoded).unwrap();
///
/// assert_eq!(
///     encoded,
///     "--X\r\n\
///      Content-Disposition: form-data; name=\"name\"\r\n\
///      \r\n\
///      test name\
///      \r\n--X\r\n\
///      Content-Disposition: form-data; name=\"file\"; filename=\"f.txt\"\r\n\
///      Content-Type: application/octet-stream\r\n\
///      \r\n\
///      hello\
///      \r\n--X--\r\n"
/// );
/// assert_eq!(form.content_type(), "multipart/form-data; boundary=X");
/// ```
pub struct FormBuilder {
    parts: Vec<Part>,
    boundary: Boundary,
    assembly: Option<Assembly>,
}

impl Default for FormBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FormBuilder {
    /// Create an empty form with a random boundary
    ///
    /// # Panics
    ///
    /// Panics if the operating system cannot supply secure random bytes.
    /// Use [`try_new`](Self::try_new) to handle that case instead.
    pub fn new() -> Self {
        match Self::try_new() {
            Ok(form) => form,
            Err(e) => panic!("cannot generate multipart boundary: {e}"),
        }
    }

    /// Create an empty form with a random boundary, reporting a missing
    /// random source as [`FormError::RandomSourceExhausted`]
    pub fn try_new() -> Result<Self> {
        Ok(Self::with_boundary(Boundary::random()?))
    }

    /// Create an empty form with a fixed boundary
    pub fn with_boundary(boundary: Boundary) -> Self {
        Self {
            parts: Vec::new(),
            boundary,
            assembly: None,
        }
    }

    /// Register a part with explicit header fields
    ///
    /// Never fails and never reads the body. After `finalize` the part is
    /// stored but not emitted.
    pub fn add_part(&mut self, header: PartHeader, body: impl Into<Body>) {
        if self.assembly.is_some() {
            warn!(
                "Part {} added after finalize; it will not be emitted",
                self.parts.len()
            );
        }
        self.parts.push(Part::new(header, body.into()));
    }

    /// Register a form field whose value is read from `body`
    pub fn add_form_field(&mut self, name: &str, body: impl Into<Body>) {
        let mut header = PartHeader::new();
        header.set("Content-Disposition", form_disposition(name, None));
        self.add_part(header, body);
    }

    /// Register a form field with a string value
    pub fn add_field(&mut self, name: &str, value: impl Into<String>) {
        let value: String = value.into();
        self.add_form_field(name, value);
    }

    /// Register a file part with `application/octet-stream` content
    pub fn add_form_file(&mut self, name: &str, filename: &str, body: impl Into<Body>) {
        self.add_form_file_with_type(name, filename, OCTET_STREAM, body);
    }

    /// Register a file part with a caller-chosen content type
    pub fn add_form_file_with_type(
        &mut self,
        name: &str,
        filename: &str,
        content_type: &str,
        body: impl Into<Body>,
    ) {
        let mut header = PartHeader::new();
        header.set("Content-Disposition", form_disposition(name, Some(filename)));
        header.set("Content-Type", content_type);
        self.add_part(header, body);
    }

    /// Open a file from disk and register it as a file part
    ///
    /// The filename sent is the last component of `path`. The file is
    /// opened now but not read until the form is read; its current size
    /// is recorded for [`content_length`](Self::content_length).
    pub fn add_file(&mut self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", path.display()),
                )
            })?;

        let file = File::open(path)?;
        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )
            .into());
        }

        debug!("Adding file part {:?} from {}", name, path.display());
        self.add_form_file(name, &filename, Body::file(file).sized(metadata.len()));
        Ok(())
    }

    /// Replace the boundary
    ///
    /// The new value is validated first; on error the current boundary is
    /// kept. Fails with [`FormError::AlreadyFinalized`] once the form has
    /// been finalized.
    pub fn set_boundary(&mut self, boundary: impl Into<String>) -> Result<()> {
        let boundary = match Boundary::new(boundary) {
            Ok(boundary) => boundary,
            Err(e) => {
                warn!("Rejected multipart boundary: {}", e);
                return Err(e);
            }
        };
        if self.assembly.is_some() {
            return Err(FormError::AlreadyFinalized);
        }

        debug!("Multipart boundary set to {:?}", boundary.as_str());
        self.boundary = boundary;
        Ok(())
    }

    /// The active boundary, without the leading `--`
    pub fn boundary(&self) -> &str {
        self.boundary.as_str()
    }

    /// Content-Type header value for this form
    pub fn content_type(&self) -> String {
        self.boundary.content_type()
    }

    /// Registered parts in insertion order
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Number of registered parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.assembly.is_some()
    }

    /// Seal the form and prepare the encoded stream
    ///
    /// Renders every part header once and queues header, body, ..., footer.
    /// Calling this again has no effect.
    pub fn finalize(&mut self) {
        if self.assembly.is_some() {
            return;
        }

        let boundary = self.boundary.as_str();
        let mut segments = VecDeque::with_capacity(self.parts.len() * 2 + 1);
        for (i, part) in self.parts.iter().enumerate() {
            segments.push_back(Segment::Bytes(Cursor::new(
                part.header.render(boundary, i == 0),
            )));
            segments.push_back(Segment::Body(i));
        }
        segments.push_back(Segment::Bytes(Cursor::new(footer(boundary))));

        debug!(
            "Finalized multipart form: {} parts, boundary {:?}",
            self.parts.len(),
            boundary
        );
        self.assembly = Some(Assembly {
            segments,
            emitted: self.parts.len(),
        });
    }

    /// Total encoded size, if every emitted body has a known length
    ///
    /// Returns `None` when a length is unknown or the sum overflows `u64`.
    /// Covers the whole stream from the first delimiter to the footer,
    /// regardless of how much has already been read.
    pub fn content_length(&self) -> Option<u64> {
        let emitted = match &self.assembly {
            Some(assembly) => &self.parts[..assembly.emitted],
            None => &self.parts[..],
        };

        let boundary = self.boundary.as_str();
        let mut total = footer(boundary).len() as u64;
        for (i, part) in emitted.iter().enumerate() {
            let header = part.header.render(boundary, i == 0).len() as u64;
            total = total
                .checked_add(header)?
                .checked_add(part.body.known_len()?)?;
        }
        Some(total)
    }

    /// Close every part body that supports closing
    ///
    /// Parts are closed in order. The first failure stops the walk and is
    /// returned as [`FormError::CloseFailure`]; later bodies stay open.
    pub fn close(&mut self) -> Result<()> {
        for (index, part) in self.parts.iter_mut().enumerate() {
            if part.body.is_closeable() {
                trace!("Closing body of part {}", index);
            }
            part.body
                .close()
                .map_err(|source| FormError::CloseFailure { index, source })?;
        }
        debug!("Closed {} multipart bodies", self.parts.len());
        Ok(())
    }
}

impl Read for FormBuilder {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(assembly) = self.assembly.as_mut() else {
            return Err(io::Error::other(FormError::NotFinalized));
        };
        if buf.is_empty() {
            return Ok(0);
        }

        while let Some(segment) = assembly.segments.front_mut() {
            let n = match segment {
                Segment::Bytes(bytes) => bytes.read(buf)?,
                Segment::Body(index) => self.parts[*index].body.read(buf)?,
            };
            if n > 0 {
                return Ok(n);
            }
            assembly.segments.pop_front();
            trace!("Advanced to next segment, {} left", assembly.segments.len());
        }

        Ok(0)
    }
}

impl std::fmt::Debug for FormBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormBuilder")
            .field("parts", &self.parts)
            .field("boundary", &self.boundary)
            .field("finalized", &self.assembly.is_some())
            .finish()
    }
}

fn footer(boundary: &str) -> Vec<u8> {
    format!("\r\n--{boundary}--\r\n").into_bytes()
}
