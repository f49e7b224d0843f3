//! Encode a form with a field and a file part
//!
//! Run with: cargo run --example upload -- path/to/file

use std::io::{self, Read, Write};

use multiform::FormBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());

    let mut form = FormBuilder::new();
    form.add_field("name", "test name");
    form.add_file("file", &path)?;
    form.finalize();

    eprintln!("Content-Type: {}", form.content_type());
    match form.content_length() {
        Some(len) => eprintln!("Content-Length: {len}"),
        None => eprintln!("Content-Length: unknown"),
    }

    // Stream the encoded body to stdout in small chunks
    let mut stdout = io::stdout().lock();
    let mut buf = [0u8; 8192];
    loop {
        let n = form.read(&mut buf)?;
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n])?;
    }
    stdout.flush()?;

    form.close()?;
    Ok(())
}
