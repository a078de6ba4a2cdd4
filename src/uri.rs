//! Label normalization and IRI path-segment minting.
//!
//! Every deduplicated node IRI is built from a [`safe_segment`] of its
//! normalized label, so identical inputs always yield the identical node.
//! Segments are injective: any text that cannot be carried verbatim gets a
//! short SHA-256 suffix of the original, so two labels that would otherwise
//! strip to the same characters still mint distinct IRIs.

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Number of hex characters kept from the digest of a lossy segment.
const SUFFIX_LEN: usize = 8;

/// Normalize a label for semantic-key comparison.
///
/// Trims, collapses internal whitespace runs to a single space, and
/// lowercases. `"  San   Lazzaro "` and `"san lazzaro"` normalize equally.
pub fn normalize_label(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Produce an IRI-safe path segment from arbitrary text.
///
/// ASCII alphanumerics, `-` and `.` are kept; spaces become `_`. Accented
/// letters are transliterated (`Forlì` → `Forli`) and other characters are
/// dropped, but either makes the segment lossy and appends
/// `-{first 8 hex of sha256(text)}`.
pub fn safe_segment(text: &str) -> String {
    let trimmed = text.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut lossy = trimmed.is_empty();

    for c in trimmed.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '.' => out.push(c),
            ' ' => out.push('_'),
            _ => {
                lossy = true;
                for d in c.nfkd().filter(|d| !is_combining_mark(*d)) {
                    if d.is_ascii_alphanumeric() {
                        out.push(d);
                    } else if d.is_whitespace() {
                        out.push('_');
                    }
                }
            }
        }
    }

    if lossy {
        let suffix = digest_suffix(trimmed);
        if out.is_empty() {
            return suffix;
        }
        out.push('-');
        out.push_str(&suffix);
    }
    out
}

/// URI-safe title suffix: the safe segment of the normalized title text.
pub fn title_suffix(text: &str) -> String {
    safe_segment(&normalize_label(text))
}

/// Whether the text is already an absolute HTTP(S) IRI.
pub fn is_absolute_iri(text: &str) -> bool {
    let t = text.trim();
    t.starts_with("http://") || t.starts_with("https://")
}

fn digest_suffix(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hex = String::with_capacity(SUFFIX_LEN);
    for byte in digest.iter().take(SUFFIX_LEN / 2) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
