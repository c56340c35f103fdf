use anyhow::{anyhow, Result};

use crate::intake::contains;
use crate::intake::validator::Rejection;

const PDF_HEADER: &[u8] = b"%PDF-";
const EOF_MARKER: &[u8] = b"%%EOF";
const TRAILER_WINDOW_BYTES: usize = 1024;

/// Structural gate for PDFs beyond the magic number.
///
/// The `%PDF-` header is mandatory. A missing `%%EOF` in the last 1 KB is only
/// a warning: some generators never write a clean trailer.
pub fn check_pdf_structure(buffer: &[u8], warnings: &mut Vec<String>) -> Result<(), Rejection> {
    if !buffer.starts_with(PDF_HEADER) {
        return Err(Rejection::InvalidPdf);
    }

    let trailer = &buffer[buffer.len().saturating_sub(TRAILER_WINDOW_BYTES)..];
    if !contains(trailer, EOF_MARKER) {
        warnings.push("PDF may be truncated or corrupted".to_string());
    }

    Ok(())
}

/// Blocking: call from `spawn_blocking`.
pub fn read_pdf_text(buffer: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(buffer).map_err(|e| anyhow!("PDF text extraction failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_missing_header() {
        let mut warnings = Vec::new();
        assert_eq!(
            check_pdf_structure(b"%PDF1.4 no dash", &mut warnings),
            Err(Rejection::InvalidPdf)
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_clean_trailer_no_warning() {
        let mut warnings = Vec::new();
        check_pdf_structure(b"%PDF-1.4\n1 0 obj\nendobj\n%%EOF\n", &mut warnings).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_missing_trailer_warns() {
        let mut warnings = Vec::new();
        check_pdf_structure(b"%PDF-1.4\n1 0 obj\nendobj\n", &mut warnings).unwrap();
        assert_eq!(warnings, vec!["PDF may be truncated or corrupted".to_string()]);
    }

    #[test]
    fn test_trailer_only_checked_in_last_kilobyte() {
        let mut buffer = b"%PDF-1.4\n%%EOF\n".to_vec();
        buffer.extend(std::iter::repeat(b' ').take(2048));
        let mut warnings = Vec::new();
        check_pdf_structure(&buffer, &mut warnings).unwrap();
        assert_eq!(warnings.len(), 1);
    }
}
