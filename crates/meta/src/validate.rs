//! Input sanitization applied before a file record reaches the store.

use crate::error::{ErrorKind, Result};
use crate::models::File;
use regex::Regex;
use std::sync::LazyLock;

/// Any single character that may not appear in a stored filename.
static INVALID_FILENAME_CHARACTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_=+,.\-]").unwrap());
const REPLACEMENT: &str = "_";

/// Rewrite a filename so it only contains `[A-Za-z0-9-_=+,.]` and does not
/// start with a dot. Every rejected character becomes one underscore, so the
/// result is empty only when the input was.
///
/// ```
/// use filebin_meta::sanitize_filename;
/// assert_eq!(sanitize_filename("ph@to!.png"), "ph_to_.png");
/// assert_eq!(sanitize_filename(".secret"), "_secret");
/// ```
pub fn sanitize_filename(filename: &str) -> String {
    let sanitized = INVALID_FILENAME_CHARACTER.replace_all(filename, REPLACEMENT);
    match sanitized.strip_prefix('.') {
        Some(rest) => format!("{REPLACEMENT}{rest}"),
        None => sanitized.into_owned(),
    }
}

/// Sanitize the filename of `file` in place.
///
/// Fails with [`ErrorKind::Validation`] when nothing is left of the filename.
pub fn validate_input(file: &mut File) -> Result<()> {
    let sanitized = sanitize_filename(&file.filename);
    if sanitized != file.filename {
        tracing::debug!(original = %file.filename, %sanitized, "rewrote filename");
    }
    file.filename = sanitized;
    if file.filename.is_empty() {
        tracing::warn!(bin = %file.bin, "rejected file without a filename");
        exn::bail!(ErrorKind::Validation("filename not specified"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("report.pdf", "report.pdf")]
    #[case("ph@to!.png", "ph_to_.png")]
    #[case("a-b_c=d+e,f.g", "a-b_c=d+e,f.g")]
    #[case("with space.txt", "with_space.txt")]
    #[case("../../etc/passwd", "_._.._etc_passwd")]
    #[case(".secret", "_secret")]
    #[case("..double", "_.double")]
    #[case(".", "_")]
    #[case("résumé.doc", "r_sum_.doc")]
    #[case("日本.txt", "__.txt")]
    #[case("tab\there", "tab_here")]
    fn test_sanitize_filename(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_filename(input), expected);
    }

    #[rstest]
    #[case("ph@to!.png")]
    #[case("\u{0}nul/\\slash?*<>|\"'")]
    #[case("emoji 🎉 party.gif")]
    fn test_sanitized_contains_only_allowed_characters(#[case] input: &str) {
        let sanitized = sanitize_filename(input);
        assert!(!INVALID_FILENAME_CHARACTER.is_match(&sanitized), "{sanitized}");
        assert!(!sanitized.starts_with('.'));
        // One replacement per character, never more.
        assert_eq!(sanitized.chars().count(), input.chars().count());
    }

    #[test]
    fn test_validate_input_rewrites_in_place() {
        let mut file = File::new("abc123", "ph@to!.png", "image/png", 2048);
        validate_input(&mut file).unwrap();
        assert_eq!(file.filename, "ph_to_.png");
    }

    #[test]
    fn test_validate_input_rejects_empty() {
        let mut file = File::new("abc123", "", "image/png", 2048);
        let err = validate_input(&mut file).unwrap_err();
        assert_eq!(*err, ErrorKind::Validation("filename not specified"));
    }
}
