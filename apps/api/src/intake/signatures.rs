//! Signature table — the static registry of accepted file kinds, their magic numbers,
//! and the declared MIME types each kind may arrive under.

use serde::Serialize;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const LEGACY_WORD_MIME: &str = "application/msword";

/// `%PDF`
pub const PDF_MAGIC: &[u8] = &[0x25, 0x50, 0x44, 0x46];
/// `PK\x03\x04` — ZIP local-file header.
pub const ZIP_LOCAL_HEADER: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

/// The file kinds the intake pipeline accepts. Nothing else is ever let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportedKind {
    Pdf,
    Docx,
}

#[derive(Debug)]
pub struct Signature {
    pub magic: &'static [u8],
    pub mime_types: &'static [&'static str],
}

static PDF_SIGNATURE: Signature = Signature {
    magic: PDF_MAGIC,
    mime_types: &[PDF_MIME],
};

static DOCX_SIGNATURE: Signature = Signature {
    magic: ZIP_LOCAL_HEADER,
    mime_types: &[DOCX_MIME, LEGACY_WORD_MIME],
};

/// Total over `SupportedKind`; there is no failure path.
pub fn signature(kind: SupportedKind) -> &'static Signature {
    match kind {
        SupportedKind::Pdf => &PDF_SIGNATURE,
        SupportedKind::Docx => &DOCX_SIGNATURE,
    }
}

impl SupportedKind {
    pub const ALL: [SupportedKind; 2] = [SupportedKind::Pdf, SupportedKind::Docx];

    /// Maps a declared MIME type to its kind. Exact match only: no parameters,
    /// no case folding, no guessing from the filename.
    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| signature(*kind).mime_types.iter().any(|m| *m == mime))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedKind::Pdf => "pdf",
            SupportedKind::Docx => "docx",
        }
    }

    /// True when the first bytes of `buffer` equal this kind's magic number.
    pub fn matches_magic(&self, buffer: &[u8]) -> bool {
        buffer.starts_with(signature(*self).magic)
    }
}

impl std::fmt::Display for SupportedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the filename's extension agrees with the declared MIME type.
/// Advisory only; the upload route reports a mismatch as a warning.
pub fn extension_matches_mime(filename: &str, mime: &str) -> bool {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match mime {
        PDF_MIME => ext == "pdf",
        DOCX_MIME => ext == "docx",
        LEGACY_WORD_MIME => ext == "doc",
        _ => false,
    }
}
