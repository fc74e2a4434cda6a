//! Filesystem-safe path components.

use unicode_normalization::UnicodeNormalization;

/// Fallback for components that sanitize to nothing.
pub const UNKNOWN: &str = "Unknown";

/// Characters rejected by at least one common filesystem.
const RESERVED_CHARS: &[char] = &['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

const REPLACEMENT: char = '-';

/// Sanitize a single path component.
///
/// The text is normalized to NFC, reserved and control characters become
/// `-`, whitespace runs collapse to one space and leading/trailing spaces
/// and dots are trimmed. Never returns an empty string.
///
/// Apply this to one component at a time, never to a whole path: the
/// separators it replaces are exactly the ones that would otherwise split
/// a value into two components.
pub fn sanitize(text: &str) -> String {
    let replaced: String = text
        .nfc()
        .map(|c| {
            if c.is_control() || RESERVED_CHARS.contains(&c) {
                REPLACEMENT
            } else {
                c
            }
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c| c == ' ' || c == '.');

    if trimmed.is_empty() {
        UNKNOWN.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Heuristic check for text that stands for a missing value.
///
/// True for `unknown` and anything starting with `unknown ` (case-insensitive),
/// which covers `Unknown Artist`, `Unknown Album` and friends. Only a
/// fallback: structured `*_unknown` flags on a record win over this when present.
pub fn is_unknown_marker(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    lower == "unknown" || lower.starts_with("unknown ")
}
