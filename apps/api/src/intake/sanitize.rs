const MAX_FILENAME_LEN: usize = 255;

/// Normalizes an untrusted client filename.
///
/// Keeps only the final path segment (both `/` and `\` count as separators),
/// replaces anything outside `[A-Za-z0-9._-]` with `_`, and truncates to 255
/// characters. Total and idempotent: the output contains no separators and no
/// characters that would be replaced again.
pub fn sanitize_filename(filename: &str) -> String {
    let trimmed = filename.trim_end_matches(['/', '\\']);
    let basename = trimmed.rsplit(['/', '\\']).next().unwrap_or_default();

    basename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_LEN)
        .collect()
}
