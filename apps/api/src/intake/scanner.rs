//! Content scanner — advisory detection of embedded markup/script in the head of an upload.
//!
//! Runs over the first 10 KB only, decoded lossily as UTF-8. Never rejects;
//! every hit becomes a warning that names the pattern which fired.

use once_cell::sync::Lazy;
use regex::Regex;

const SCAN_WINDOW_BYTES: usize = 10_000;

const SUSPICIOUS_PATTERNS: &[&str] = &[
    r"(?i)<script",
    r"(?i)javascript:",
    r"(?i)vbscript:",
    r"(?i)data:text/html",
    r"(?i)on\w+\s*=",
    r"(?i)eval\s*\(",
    r"(?i)exec\s*\(",
];

static COMPILED: Lazy<Vec<Regex>> = Lazy::new(|| {
    SUSPICIOUS_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// Returns one warning per suspicious pattern found, in table order.
pub fn scan_for_suspicious_content(buffer: &[u8]) -> Vec<String> {
    let window = &buffer[..buffer.len().min(SCAN_WINDOW_BYTES)];
    let content = String::from_utf8_lossy(window);

    COMPILED
        .iter()
        .filter(|re| re.is_match(&content))
        .map(|re| format!("Suspicious pattern detected: {}", pattern_source(re)))
        .collect()
}

/// The pattern as written, without the case-insensitivity flag.
fn pattern_source(re: &Regex) -> &str {
    re.as_str().trim_start_matches("(?i)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(COMPILED.len(), SUSPICIOUS_PATTERNS.len());
    }

    #[test]
    fn test_clean_text_has_no_warnings() {
        let warnings = scan_for_suspicious_content(b"Senior engineer. Shipped 3 services in Rust.");
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_detects_script_case_insensitive() {
        let warnings = scan_for_suspicious_content(b"hello <SCRIPT>alert(1)</SCRIPT>");
        assert_eq!(warnings, vec!["Suspicious pattern detected: <script".to_string()]);
    }

    #[test]
    fn test_detects_multiple_patterns() {
        let warnings =
            scan_for_suspicious_content(b"<a href=\"javascript:x\" onclick = \"eval (y)\">");
        assert!(warnings.iter().any(|w| w.ends_with("javascript:")));
        assert!(warnings.iter().any(|w| w.ends_with(r"on\w+\s*=")));
        assert!(warnings.iter().any(|w| w.ends_with(r"eval\s*\(")));
        assert!(!warnings.iter().any(|w| w.ends_with("<script")));
    }

    #[test]
    fn test_only_scans_first_window() {
        let mut buffer = vec![b'a'; SCAN_WINDOW_BYTES];
        buffer.extend_from_slice(b"<script>");
        assert!(scan_for_suspicious_content(&buffer).is_empty());
    }

    #[test]
    fn test_binary_input_is_fine() {
        let buffer: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        // Lossy decoding must not panic; whatever matches is advisory.
        let _ = scan_for_suspicious_content(&buffer);
    }
}
