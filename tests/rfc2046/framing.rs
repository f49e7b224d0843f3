//! RFC 2046 Section 5.1.1 - Multipart body framing
//!
//! Compares the lazy stream against an eager reference encoder that writes
//! every part into one buffer.

use std::io::{Read, Write};

use multiform::{Body, Boundary, FormBuilder, FormError, PartHeader};

/// Eager encoder: first delimiter without leading CRLF, later delimiters
/// with it, sorted headers, closing delimiter at the end.
struct ReferenceEncoder {
    out: Vec<u8>,
    boundary: String,
    parts: usize,
}

impl ReferenceEncoder {
    fn new(boundary: &str) -> Self {
        Self {
            out: Vec::new(),
            boundary: boundary.to_string(),
            parts: 0,
        }
    }

    fn part(&mut self, headers: &[(&str, &str)], body: &[u8]) {
        if self.parts > 0 {
            self.out.extend_from_slice(b"\r\n");
        }
        write!(self.out, "--{}\r\n", self.boundary).unwrap();

        let mut sorted = headers.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        for (name, value) in sorted {
            write!(self.out, "{name}: {value}\r\n").unwrap();
        }
        self.out.extend_from_slice(b"\r\n");
        self.out.extend_from_slice(body);
        self.parts += 1;
    }

    fn field(&mut self, name: &str, value: &str) {
        let disposition = format!("form-data; name=\"{name}\"");
        self.part(&[("Content-Disposition", disposition.as_str())], value.as_bytes());
    }

    fn file(&mut self, name: &str, filename: &str, body: &[u8]) {
        let disposition = format!("form-data; name=\"{name}\"; filename=\"{filename}\"");
        self.part(
            &[
                ("Content-Disposition", disposition.as_str()),
                ("Content-Type", "application/octet-stream"),
            ],
            body,
        );
    }

    fn finish(mut self) -> Vec<u8> {
        write!(self.out, "\r\n--{}--\r\n", self.boundary).unwrap();
        self.out
    }
}

fn form(boundary: &str) -> FormBuilder {
    FormBuilder::with_boundary(Boundary::new(boundary).unwrap())
}

fn encode(form: &mut FormBuilder) -> Vec<u8> {
    form.finalize();
    let mut out = Vec::new();
    form.read_to_end(&mut out).unwrap();
    out
}

#[test]
fn test_single_field_matches_reference() {
    let mut builder = form("test-boundary");
    builder.add_field("fileName", "test");

    let mut reference = ReferenceEncoder::new("test-boundary");
    reference.field("fileName", "test");

    assert_eq!(encode(&mut builder), reference.finish());
}

#[test]
fn test_field_and_file_matches_reference() {
    let mut builder = form("test-boundary");
    builder.add_field("two", "test2");
    builder.add_form_file("file", "test-file.txt", "file contents\n");

    let mut reference = ReferenceEncoder::new("test-boundary");
    reference.field("two", "test2");
    reference.file("file", "test-file.txt", b"file contents\n");

    assert_eq!(encode(&mut builder), reference.finish());
}

#[test]
fn test_many_parts_with_binary_matches_reference() {
    let image: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

    let mut builder = form("test-boundary");
    builder.add_field("two", "test3");
    builder.add_field("three", "test4");
    builder.add_form_file("file", "test-file.jpeg", image.clone());
    builder.add_form_file("file2", "test-file2.txt", Body::reader(&b"plain text"[..]));

    let mut reference = ReferenceEncoder::new("test-boundary");
    reference.field("two", "test3");
    reference.field("three", "test4");
    reference.file("file", "test-file.jpeg", &image);
    reference.file("file2", "test-file2.txt", b"plain text");

    assert_eq!(encode(&mut builder), reference.finish());
}

#[test]
fn test_end_to_end_scenario() {
    let mut builder = FormBuilder::new();
    builder.set_boundary("X").unwrap();
    builder.add_field("name", "test name");
    builder.add_form_file("file", "f.txt", Body::reader(&b"hello"[..]));

    assert_eq!(
        encode(&mut builder),
        b"--X\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\ntest name\
          \r\n--X\r\nContent-Disposition: form-data; name=\"file\"; filename=\"f.txt\"\r\n\
          Content-Type: application/octet-stream\r\n\r\nhello\r\n--X--\r\n"
    );
}

#[test]
fn test_multi_valued_header_lines() {
    let mut header = PartHeader::new();
    header.add("Content-Disposition", "form-data; name=\"m\"");
    header.add("X-Note", "first");
    header.add("X-Note", "second");

    let mut builder = form("B");
    builder.add_part(header, "v");

    let mut reference = ReferenceEncoder::new("B");
    reference.part(
        &[
            ("Content-Disposition", "form-data; name=\"m\""),
            ("X-Note", "first"),
            ("X-Note", "second"),
        ],
        b"v",
    );

    assert_eq!(encode(&mut builder), reference.finish());
}

#[test]
fn test_body_containing_crlf_is_untouched() {
    let mut builder = form("B");
    builder.add_field("lines", "a\r\nb\r\n");
    let out = String::from_utf8(encode(&mut builder)).unwrap();
    assert!(out.contains("\r\n\r\na\r\nb\r\n\r\n--B--\r\n"));
}

#[test]
fn test_read_before_finalize_is_error() {
    let mut builder = form("B");
    builder.add_field("a", "b");

    let mut out = Vec::new();
    let err = builder.read_to_end(&mut out).unwrap_err();
    let inner = err.get_ref().and_then(|e| e.downcast_ref::<FormError>());
    assert!(matches!(inner, Some(FormError::NotFinalized)));
    assert!(out.is_empty());
}

#[test]
fn test_second_read_after_exhaustion() {
    let mut builder = form("B");
    builder.add_field("a", "b");
    let first = encode(&mut builder);
    assert!(!first.is_empty());

    let mut second = Vec::new();
    assert_eq!(builder.read_to_end(&mut second).unwrap(), 0);
    assert!(second.is_empty());
}

#[test]
fn test_streams_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"from disk").unwrap();

    let mut builder = form("B");
    builder.add_file("upload", file.path()).unwrap();

    let expected_name = file
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    let predicted = builder.content_length().unwrap();

    let mut reference = ReferenceEncoder::new("B");
    reference.file("upload", &expected_name, b"from disk");
    let expected = reference.finish();

    let out = encode(&mut builder);
    assert_eq!(out, expected);
    assert_eq!(out.len() as u64, predicted);

    builder.close().unwrap();
    assert!(builder.parts()[0].body().is_closed());
}
