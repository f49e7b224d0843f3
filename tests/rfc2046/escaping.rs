//! RFC 7578 Section 4.2 - Content-Disposition parameters
//!
//! Reference: https://datatracker.ietf.org/doc/html/rfc7578#section-4.2

use multiform::{Boundary, FormBuilder, escape_quotes};

fn disposition(form: &FormBuilder, index: usize) -> &str {
    form.parts()[index]
        .header()
        .get("content-disposition")
        .unwrap()
}

#[test]
fn test_quotes_in_field_name() {
    let mut form = FormBuilder::new();
    form.add_field(r#"he said "hi""#, "value");
    assert_eq!(disposition(&form, 0), r#"form-data; name="he said \"hi\"""#);
}

#[test]
fn test_backslash_then_quote_order() {
    assert_eq!(escape_quotes(r#"\""#), r#"\\\""#);
    assert_eq!(escape_quotes(r"\\"), r"\\\\");
}

#[test]
fn test_other_characters_untouched() {
    let mut form = FormBuilder::new();
    form.add_form_file("upload", "résumé; v2 (final).pdf", "pdf");
    assert_eq!(
        disposition(&form, 0),
        r#"form-data; name="upload"; filename="résumé; v2 (final).pdf""#
    );
}

#[test]
fn test_filename_escaped() {
    let mut form = FormBuilder::new();
    form.add_form_file("f", r#"C:\docs\"q".txt"#, "x");
    assert_eq!(
        disposition(&form, 0),
        r#"form-data; name="f"; filename="C:\\docs\\\"q\".txt""#
    );
}

#[test]
fn test_escaped_name_on_the_wire() {
    let mut form = FormBuilder::with_boundary(Boundary::new("E").unwrap());
    form.add_field(r#"a"b"#, "v");
    form.finalize();

    let mut out = String::new();
    std::io::Read::read_to_string(&mut form, &mut out).unwrap();
    assert_eq!(
        out,
        "--E\r\nContent-Disposition: form-data; name=\"a\\\"b\"\r\n\r\nv\r\n--E--\r\n"
    );
}
