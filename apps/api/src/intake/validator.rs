//! File validator — the accept/reject decision for an untrusted upload.
//!
//! Checks run in a fixed order and the first failure wins:
//! 1. size (empty, then the per-kind cap)
//! 2. declared MIME allow-list
//! 3. magic number (soft when `strict_validation` is off)
//! 4. filename sanitization (warning only)
//! 5. content scan (warnings only)
//! 6. format-specific structure (PDF or DOCX)
//!
//! Cheap structural checks come first so obviously bad input costs almost nothing.
//! The validator holds no state: identical inputs always yield identical results.

use serde::Serialize;
use thiserror::Error;

use crate::intake::docx::check_docx_structure;
use crate::intake::pdf::check_pdf_structure;
use crate::intake::sanitize::sanitize_filename;
use crate::intake::scanner::scan_for_suspicious_content;
use crate::intake::signatures::{SupportedKind, DOCX_MIME, LEGACY_WORD_MIME};

const MIB: usize = 1024 * 1024;
pub const DEFAULT_MAX_SIZE: usize = 10 * MIB;
/// ZIP-based uploads get a tighter cap: the same byte budget hides far more
/// decompression amplification than a PDF does.
pub const DOCX_MAX_SIZE: usize = 2 * MIB;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    pub max_size: usize,
    /// When false, a magic-number mismatch is downgraded to a warning.
    /// Macro and ZIP-bomb rejections are unaffected.
    pub strict_validation: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            strict_validation: true,
        }
    }
}

/// Why an upload was refused. `Display` is the user-facing message and callers
/// may surface it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("File is empty")]
    Empty,

    #[error("File too large. Maximum size is {max_mb}MB")]
    TooLarge { max_mb: u64 },

    #[error("Unsupported file format. Only PDF and DOCX files are allowed")]
    UnsupportedFormat,

    #[error("File signature does not match extension. File may be corrupted or malicious")]
    SignatureMismatch,

    #[error("Invalid PDF file format")]
    InvalidPdf,

    #[error("Invalid DOCX file format")]
    InvalidDocx,

    #[error("Invalid DOCX structure - missing Content Types")]
    MissingContentTypes,

    #[error("Invalid DOCX structure - missing document content")]
    MissingDocumentContent,

    #[error("Macro-enabled documents are not supported for security reasons")]
    MacroEnabled,

    #[error("File structure suggests potential ZIP bomb")]
    ZipBomb,
}

/// Outcome of one `validate` call.
///
/// Either rejected with exactly one reason, or accepted with zero or more
/// warnings. Never both: the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
}

impl ValidationResult {
    fn accepted(warnings: Vec<String>) -> Self {
        Self {
            valid: true,
            error: None,
            warnings: (!warnings.is_empty()).then_some(warnings),
        }
    }

    fn rejected(reason: Rejection) -> Self {
        Self {
            valid: false,
            error: Some(reason.to_string()),
            warnings: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Empty on rejection and on a clean acceptance.
    pub fn warnings(&self) -> &[String] {
        self.warnings.as_deref().unwrap_or_default()
    }
}

/// Validates an uploaded buffer against its client-declared MIME type and filename.
pub fn validate(
    buffer: &[u8],
    declared_mime: &str,
    filename: &str,
    options: &ValidationOptions,
) -> ValidationResult {
    let mut warnings = Vec::new();
    match run_checks(buffer, declared_mime, filename, options, &mut warnings) {
        Ok(()) => ValidationResult::accepted(warnings),
        Err(reason) => ValidationResult::rejected(reason),
    }
}

fn run_checks(
    buffer: &[u8],
    declared_mime: &str,
    filename: &str,
    options: &ValidationOptions,
    warnings: &mut Vec<String>,
) -> Result<(), Rejection> {
    check_size(buffer.len(), effective_max_size(declared_mime, options))?;

    let kind = SupportedKind::from_mime(declared_mime).ok_or(Rejection::UnsupportedFormat)?;

    if !kind.matches_magic(buffer) {
        if options.strict_validation {
            return Err(Rejection::SignatureMismatch);
        }
        warnings.push("File signature mismatch - proceeding with caution".to_string());
    }

    if sanitize_filename(filename) != filename {
        warnings.push("Filename was sanitized to remove potentially unsafe characters".to_string());
    }

    warnings.extend(scan_for_suspicious_content(buffer));

    match kind {
        SupportedKind::Pdf => check_pdf_structure(buffer, warnings),
        SupportedKind::Docx => check_docx_structure(buffer, warnings),
    }
}

/// The size cap for a declared MIME type. Never looser than `options.max_size`.
pub fn effective_max_size(declared_mime: &str, options: &ValidationOptions) -> usize {
    if declared_mime == DOCX_MIME || declared_mime == LEGACY_WORD_MIME {
        options.max_size.min(DOCX_MAX_SIZE)
    } else {
        options.max_size
    }
}

fn check_size(len: usize, max_size: usize) -> Result<(), Rejection> {
    if len == 0 {
        return Err(Rejection::Empty);
    }
    if len > max_size {
        let max_mb = (max_size as f64 / MIB as f64).round() as u64;
        return Err(Rejection::TooLarge { max_mb });
    }
    Ok(())
}
