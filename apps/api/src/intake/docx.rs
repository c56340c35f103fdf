//! DOCX structural checks and raw-text reading.
//!
//! # Known limitations
//! The structural gate does NOT parse the archive. It looks for marker substrings
//! in the raw ZIP bytes (the equivalent of a Latin-1 decode), so:
//! - a crafted ZIP padded with fake `[Content_Types].xml` / `word/document.xml`
//!   strings passes the marker checks (false negative);
//! - a genuine document whose *compressed* payload happens to contain
//!   `macroEnabled` or `PK\x03\x04` byte runs is rejected or over-counted
//!   (false positive);
//! - the ZIP-bomb check counts local-file headers as a proxy for entry count. It
//!   says nothing about compression ratio.
//!
//! A streaming ZIP reader with per-entry ratio limits can replace these
//! heuristics behind `validate()` without touching its signature.

use std::io::{Cursor, Read};

use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::intake::contains;
use crate::intake::signatures::ZIP_LOCAL_HEADER;
use crate::intake::validator::Rejection;

const CONTENT_TYPES_MARKER: &[u8] = b"[Content_Types].xml";
const DOCUMENT_PART: &str = "word/document.xml";
const MACRO_MARKERS: &[&[u8]] = &[b"vbaProject.bin", b"macroEnabled"];

/// More local-file headers than this earns a warning.
const ENTRY_WARN_THRESHOLD: usize = 100;
/// A container under `BOMB_SMALL_FILE_BYTES` with more than
/// `BOMB_ENTRY_THRESHOLD` headers is rejected.
const BOMB_ENTRY_THRESHOLD: usize = 50;
const BOMB_SMALL_FILE_BYTES: usize = 50_000;

/// Upper bound on the expanded size of `word/document.xml` during extraction.
const MAX_DOCUMENT_XML_BYTES: u64 = 32 * 1024 * 1024;

/// Structural gate for DOCX uploads, run after the generic checks.
///
/// Order matters and is fail-fast: ZIP header, content-types marker,
/// document marker, macro markers, then the entry-count heuristics.
/// Macro and bomb rejections ignore `strict_validation`.
pub fn check_docx_structure(buffer: &[u8], warnings: &mut Vec<String>) -> Result<(), Rejection> {
    if !buffer.starts_with(ZIP_LOCAL_HEADER) {
        return Err(Rejection::InvalidDocx);
    }

    if !contains(buffer, CONTENT_TYPES_MARKER) {
        return Err(Rejection::MissingContentTypes);
    }

    if !contains(buffer, DOCUMENT_PART.as_bytes()) {
        return Err(Rejection::MissingDocumentContent);
    }

    if MACRO_MARKERS.iter().any(|m| contains(buffer, m)) {
        return Err(Rejection::MacroEnabled);
    }

    let entry_count = count_local_headers(buffer);
    if entry_count > ENTRY_WARN_THRESHOLD {
        warnings.push("Document has unusually high number of entries".to_string());
    }

    if buffer.len() < BOMB_SMALL_FILE_BYTES && entry_count > BOMB_ENTRY_THRESHOLD {
        return Err(Rejection::ZipBomb);
    }

    Ok(())
}

/// Non-overlapping occurrences of `PK\x03\x04` anywhere in the buffer.
pub fn count_local_headers(buffer: &[u8]) -> usize {
    let needle = ZIP_LOCAL_HEADER;
    let mut count = 0;
    let mut i = 0;
    while i + needle.len() <= buffer.len() {
        if &buffer[i..i + needle.len()] == needle {
            count += 1;
            i += needle.len();
        } else {
            i += 1;
        }
    }
    count
}

// ────────────────────────────────────────────────────────────────────────────
// Raw-text extraction
// ────────────────────────────────────────────────────────────────────────────

/// Reads the body text of a DOCX. Blocking: call from `spawn_blocking`.
///
/// Paragraphs end with a blank line, `w:tab` becomes `\t`, `w:br`/`w:cr`
/// become `\n`. Formatting, headers/footers, and tracked deletions are dropped.
/// Of each `mc:AlternateContent` block (text boxes, shapes) only the
/// `mc:Fallback` branch is read.
pub fn read_docx_text(buffer: &[u8]) -> Result<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(buffer)).context("DOCX is not a readable ZIP archive")?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .with_context(|| format!("DOCX archive has no {DOCUMENT_PART} entry"))?;

    let xml = read_to_end_bounded(&mut part, MAX_DOCUMENT_XML_BYTES)?;
    document_xml_to_text(&xml)
}

fn read_to_end_bounded<R: Read>(reader: &mut R, max_bytes: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    reader
        .take(max_bytes + 1)
        .read_to_end(&mut out)
        .context("failed to decompress document part")?;
    if out.len() as u64 > max_bytes {
        bail!("document part expands beyond {max_bytes} bytes");
    }
    Ok(out)
}

fn document_xml_to_text(xml: &[u8]) -> Result<String> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);

    let mut out = String::new();
    let mut buf = Vec::new();
    let mut in_text = false;
    // Tab-stop definitions (`w:tabs/w:tab`) live in paragraph properties.
    let mut tabs_depth = 0usize;
    // `mc:AlternateContent` carries the same content twice; only `mc:Fallback` is read.
    let mut choice_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"Choice" => choice_depth += 1,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"Choice" => {
                choice_depth = choice_depth.saturating_sub(1)
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "malformed document.xml at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ if choice_depth > 0 => {}
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"tabs" => tabs_depth += 1,
                b"tab" if tabs_depth == 0 => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" if tabs_depth == 0 => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().context("invalid text run in document.xml")?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"tabs" => tabs_depth = tabs_depth.saturating_sub(1),
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}
