//! Extraction adapter — turns a validated upload into plain text under a hard deadline.
//!
//! The extraction libraries are the second line of defense: a file that passed
//! structural validation can still be pathological enough to hang or panic them.
//!
//! # Timeout semantics
//! `extract_text` races the routine against `tokio::time::timeout`. On expiry we
//! stop waiting and report `ExtractionFailure::Timeout`; the blocking task itself
//! is not cancelled and runs to completion in the background.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

use crate::intake::docx::read_docx_text;
use crate::intake::pdf::read_pdf_text;
use crate::intake::signatures::SupportedKind;

pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    #[error("text extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("text extraction failed: {0}")]
    Parse(String),
}

pub type ExtractionOutcome = Result<String, ExtractionFailure>;

/// A text-extraction routine. Swappable so tests (and future OCR backends) can
/// stand in for the bundled libraries.
///
/// Carried in `AppState` as `Arc<dyn TextExtractor>`.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, kind: SupportedKind, buffer: Bytes) -> Result<String>;
}

type ReadFn = fn(&[u8]) -> Result<String>;

/// `pdf-extract` for PDFs, the in-crate OOXML reader for DOCX. Both run on the
/// blocking pool; a library panic comes back as a `JoinError`.
pub struct LibraryExtractor {
    pdf: ReadFn,
    docx: ReadFn,
}

impl Default for LibraryExtractor {
    fn default() -> Self {
        Self {
            pdf: read_pdf_text,
            docx: read_docx_text,
        }
    }
}

#[async_trait]
impl TextExtractor for LibraryExtractor {
    async fn extract_text(&self, kind: SupportedKind, buffer: Bytes) -> Result<String> {
        let read = match kind {
            SupportedKind::Pdf => self.pdf,
            SupportedKind::Docx => self.docx,
        };
        tokio::task::spawn_blocking(move || read(&buffer))
            .await
            .map_err(|e| anyhow!("{kind} extractor aborted: {e}"))?
    }
}

/// Runs `extractor` against `buffer` with a deadline. Call only after
/// `validate()` accepted the buffer. No retries.
pub async fn extract_text(
    extractor: &dyn TextExtractor,
    buffer: Bytes,
    kind: SupportedKind,
    deadline: Duration,
) -> ExtractionOutcome {
    let size = buffer.len();
    match tokio::time::timeout(deadline, extractor.extract_text(kind, buffer)).await {
        Ok(Ok(text)) => {
            debug!("Extracted {} chars from {size}-byte {kind}", text.len());
            Ok(text)
        }
        Ok(Err(e)) => {
            warn!("{kind} extraction failed: {e:#}");
            Err(ExtractionFailure::Parse(e.to_string()))
        }
        Err(_) => {
            warn!("{kind} extraction exceeded {deadline:?} on {size}-byte upload");
            Err(ExtractionFailure::Timeout(deadline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::fixtures::docx_bytes;

    struct NeverResolves;

    #[async_trait]
    impl TextExtractor for NeverResolves {
        async fn extract_text(&self, _kind: SupportedKind, _buffer: Bytes) -> Result<String> {
            std::future::pending().await
        }
    }

    fn panicking_read(_buffer: &[u8]) -> Result<String> {
        panic!("library bug")
    }

    fn panicking_pdf_extractor() -> LibraryExtractor {
        LibraryExtractor {
            pdf: panicking_read,
            ..LibraryExtractor::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_extractor_times_out() {
        let started = tokio::time::Instant::now();
        let outcome = extract_text(
            &NeverResolves,
            Bytes::from_static(b"%PDF-1.4"),
            SupportedKind::Pdf,
            DEFAULT_EXTRACTION_TIMEOUT,
        )
        .await;

        assert_eq!(outcome, Err(ExtractionFailure::Timeout(DEFAULT_EXTRACTION_TIMEOUT)));
        let elapsed = started.elapsed();
        assert!(elapsed >= DEFAULT_EXTRACTION_TIMEOUT);
        assert!(elapsed < DEFAULT_EXTRACTION_TIMEOUT + Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_library_panic_is_join_error() {
        let err = panicking_pdf_extractor()
            .extract_text(SupportedKind::Pdf, Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("pdf extractor aborted"), "{err}");
    }

    #[tokio::test]
    async fn test_panicking_extractor_is_parse_failure() {
        let outcome = extract_text(
            &panicking_pdf_extractor(),
            Bytes::from_static(b"%PDF-1.4"),
            SupportedKind::Pdf,
            DEFAULT_EXTRACTION_TIMEOUT,
        )
        .await;
        assert!(matches!(outcome, Err(ExtractionFailure::Parse(_))));
    }

    #[tokio::test]
    async fn test_docx_extraction() {
        let buffer = Bytes::from(docx_bytes(&["Jane Doe", "Staff Engineer"]));
        let outcome = extract_text(
            &LibraryExtractor::default(),
            buffer,
            SupportedKind::Docx,
            DEFAULT_EXTRACTION_TIMEOUT,
        )
        .await
        .unwrap();
        assert_eq!(outcome, "Jane Doe\n\nStaff Engineer\n\n");
    }

    #[tokio::test]
    async fn test_garbage_pdf_is_parse_failure() {
        let outcome = extract_text(
            &LibraryExtractor::default(),
            Bytes::from_static(b"%PDF-1.4\nthis is not a real pdf body\n%%EOF\n"),
            SupportedKind::Pdf,
            DEFAULT_EXTRACTION_TIMEOUT,
        )
        .await;
        assert!(matches!(outcome, Err(ExtractionFailure::Parse(_))));
    }
}
