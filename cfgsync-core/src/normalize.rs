//! Canonical forms used purely for equality tests between file versions.
//!
//! Nothing produced here is ever written back to disk or shown to the user.

use crate::models::FileKind;
use sha2::{Digest, Sha256};

/// Canonical form of `content` for the given file kind.
///
/// JSON documents are parsed and re-emitted compactly with object keys in
/// sorted order, so key order and formatting do not matter. Content that does
/// not parse (editor settings often carry comments or trailing commas) falls
/// back to whitespace removal, as do opaque files.
pub fn normalize(content: &str, kind: FileKind) -> String {
    match kind {
        FileKind::Json => match serde_json::from_str::<serde_json::Value>(content) {
            Ok(value) => value.to_string(),
            Err(_) => strip_whitespace(content),
        },
        FileKind::Opaque => strip_whitespace(content),
    }
}

pub fn strip_whitespace(content: &str) -> String {
    content.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Line-wise comparison ignoring blank lines and leading/trailing whitespace.
pub fn lines_match_trimmed(a: &str, b: &str) -> bool {
    fn trimmed(s: &str) -> impl Iterator<Item = &str> {
        s.lines().map(str::trim).filter(|line| !line.is_empty())
    }
    trimmed(a).eq(trimmed(b))
}

/// Non-blank lines of `content` with all whitespace removed.
pub fn significant_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(strip_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

/// True when a whitespace-insensitive diff of `a` against `b` that also
/// ignores blank lines would be non-empty.
pub fn differs_beyond_whitespace(a: &str, b: &str) -> bool {
    significant_lines(a) != significant_lines(b)
}

/// Short hex digest of the normalized content, for log lines.
pub fn fingerprint(content: &str, kind: FileKind) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(content, kind).as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}
