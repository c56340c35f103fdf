// Résumé intake: validation and text extraction for untrusted uploads.
// validator::validate is the accept/reject gate; extract::extract_text runs only
// on accepted buffers, under a deadline, on the blocking pool.

pub mod docx;
pub mod extract;
pub mod handlers;
pub mod normalize;
pub mod pdf;
pub mod sanitize;
pub mod scanner;
pub mod signatures;
pub mod validator;

#[cfg(test)]
pub(crate) mod fixtures;

/// Raw byte substring search. Marker checks run on undecoded upload bytes.
pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
