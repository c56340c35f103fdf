//! In-test builders for upload payloads. Real archives via `zip::ZipWriter`,
//! hand-assembled PDF bytes.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

/// Content types with no reference to `word/document.xml`.
pub const BARE_CONTENT_TYPES_XML: &str = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Stored (uncompressed) archive with the given entries, in order.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    write_zip(entries, CompressionMethod::Stored)
}

/// A minimal but genuine DOCX package, one `w:p` per paragraph.
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", xml_escape(p)))
        .collect();
    let document = format!(
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    write_zip(
        &[
            ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
            ("_rels/.rels", RELS_XML.as_bytes()),
            ("word/document.xml", document.as_bytes()),
        ],
        CompressionMethod::Deflated,
    )
}

/// A DOCX-looking buffer with exactly `entry_count` local-file headers, padded
/// with spaces to exactly `len` bytes. Carries both structural markers.
pub fn docx_marker_buffer(entry_count: usize, len: usize) -> Vec<u8> {
    assert!(entry_count >= 1);
    let mut out = b"PK\x03\x04[Content_Types].xml word/document.xml ".to_vec();
    for _ in 1..entry_count {
        out.extend_from_slice(b"PK\x03\x04");
    }
    assert!(out.len() <= len, "{entry_count} headers do not fit in {len} bytes");
    out.resize(len, b' ');
    out
}

/// `%PDF-` header, a body padded to `body_len` bytes, and optionally a `%%EOF` trailer.
pub fn pdf_bytes(body_len: usize, with_trailer: bool) -> Vec<u8> {
    let mut out = b"%PDF-1.4\n".to_vec();
    out.extend(std::iter::repeat(b'0').take(body_len));
    if with_trailer {
        out.extend_from_slice(b"\n%%EOF\n");
    }
    out
}

fn write_zip(entries: &[(&str, &[u8])], method: CompressionMethod) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        let options = SimpleFileOptions::default().compression_method(method);
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
