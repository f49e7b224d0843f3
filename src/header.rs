//! Part header fields and rendering
//!
//! Each part of a multipart body carries its own MIME header block.
//! [`PartHeader`] stores those fields with case-insensitive names and
//! renders them, together with the part's leading delimiter, as the exact
//! bytes that precede the part body on the wire.

use std::fmt::Write as _;

/// MIME header fields for one part
///
/// Field names are stored in canonical form (`content-type` becomes
/// `Content-Type`) and compared case-insensitively. A field may carry
/// several values; they are rendered one line each, in insertion order.
///
/// # Examples
///
/// ```
/// use multiform::PartHeader;
///
/// let mut header = PartHeader::new();
/// header.set("content-type", "text/plain");
/// header.add("X-Tag", "a");
/// header.add("x-tag", "b");
///
/// assert_eq!(header.get("Content-Type"), Some("text/plain"));
/// assert_eq!(header.get_all("X-TAG"), ["a", "b"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartHeader {
    fields: Vec<(String, Vec<String>)>,
}

impl PartHeader {
    /// Create an empty header block
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all values of `name` with a single value
    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let value = value.into();
        match self.position(name.as_ref()) {
            Some(idx) => self.fields[idx].1 = vec![value],
            None => self
                .fields
                .push((canonical_name(name.as_ref()), vec![value])),
        }
    }

    /// Append a value to `name`, keeping existing values
    pub fn add(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let value = value.into();
        match self.position(name.as_ref()) {
            Some(idx) => self.fields[idx].1.push(value),
            None => self
                .fields
                .push((canonical_name(name.as_ref()), vec![value])),
        }
    }

    /// First value of `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// All values of `name`, empty if the field is absent
    pub fn get_all(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(idx) => &self.fields[idx].1,
            None => &[],
        }
    }

    /// Remove `name` and return its values
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let idx = self.position(name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Whether `name` is present
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of distinct field names
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Render the delimiter and header block that precede a part body
    ///
    /// Produces `--boundary\r\n` for the first part and `\r\n--boundary\r\n`
    /// for every later part, then one `Name: value\r\n` line per value with
    /// names sorted, then the blank line that ends the header block.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiform::PartHeader;
    ///
    /// let mut header = PartHeader::new();
    /// header.set("Content-Disposition", "form-data; name=\"a\"");
    ///
    /// assert_eq!(
    ///     header.render("X", true),
    ///     b"--X\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n"
    /// );
    /// assert!(header.render("X", false).starts_with(b"\r\n--X\r\n"));
    /// ```
    pub fn render(&self, boundary: &str, is_first: bool) -> Vec<u8> {
        let mut names: Vec<&(String, Vec<String>)> = self.fields.iter().collect();
        names.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = String::with_capacity(64 + boundary.len());
        if !is_first {
            out.push_str("\r\n");
        }
        out.push_str("--");
        out.push_str(boundary);
        out.push_str("\r\n");

        for (name, values) in names {
            for value in values {
                // write! to String is infallible
                let _ = write!(out, "{name}: {value}\r\n");
            }
        }

        out.push_str("\r\n");
        out.into_bytes()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|(stored, _)| stored.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for PartHeader
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut header = PartHeader::new();
        for (name, value) in iter {
            header.add(name, value);
        }
        header
    }
}

/// Convert a header name to MIME canonical form
///
/// The first letter and any letter following a hyphen are upper-cased,
/// all other letters lower-cased. Names containing a space or a byte that
/// is not a valid header token character are returned unchanged.
///
/// # Examples
///
/// ```
/// use multiform::header::canonical_name;
///
/// assert_eq!(canonical_name("content-disposition"), "Content-Disposition");
/// assert_eq!(canonical_name("X-API-KEY"), "X-Api-Key");
/// assert_eq!(canonical_name("bad name"), "bad name");
/// ```
pub fn canonical_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for b in name.bytes() {
        let c = if upper {
            b.to_ascii_uppercase()
        } else {
            b.to_ascii_lowercase()
        };
        out.push(c as char);
        upper = b == b'-';
    }
    out
}

/// RFC 7230 `tchar`
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

/// Escape a value for use inside a quoted Content-Disposition parameter
///
/// Backslashes become `\\` and double quotes become `\"`. The input is
/// scanned once, so the backslash introduced for a quote is not escaped
/// again. Nothing else is touched.
///
/// # Examples
///
/// ```
/// use multiform::escape_quotes;
///
/// assert_eq!(escape_quotes(r#"he said "hi""#), r#"he said \"hi\""#);
/// assert_eq!(escape_quotes(r"C:\tmp"), r"C:\\tmp");
/// ```
pub fn escape_quotes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// Build the Content-Disposition value for a form field or file
pub(crate) fn form_disposition(name: &str, filename: Option<&str>) -> String {
    match filename {
        Some(filename) => format!(
            "form-data; name=\"{}\"; filename=\"{}\"",
            escape_quotes(name),
            escape_quotes(filename)
        ),
        None => format!("form-data; name=\"{}\"", escape_quotes(name)),
    }
}
