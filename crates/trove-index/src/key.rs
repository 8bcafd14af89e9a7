//! Storage key codec.
//!
//! A [`Key`] is an ordered list of string segments joined with `::`. Each
//! segment is escaped so a segment boundary is never ambiguous:
//!
//! - `\` is written `\\`;
//! - `:` is written `\:` when it is the first or last character of the
//!   segment or sits next to another `:`.
//!
//! Isolated interior colons stay raw, so canonical tag strings such as
//! `media:audio:flac` appear verbatim in keys and byte-prefix searches over
//! them work on the encoded form. A `::` inside a segment is stored as
//! `\:\:`.
//!
//! Encoding is order-preserving per segment: every key that starts with the
//! segments of another key also starts with that key's [`Key::prefix`].

use std::fmt;

use crate::error::{IndexError, IndexResult};

/// Separator between encoded segments.
pub const SEPARATOR: &str = "::";

const ESCAPE: char = '\\';
const COLON: char = ':';

/// An ordered list of key segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Key {
    segments: Vec<String>,
}

impl Key {
    /// Build a key from borrowed segments.
    pub fn of(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Consume the key, returning its segments.
    pub fn into_segments(self) -> Vec<String> {
        self.segments
    }

    /// The encoded key as a string.
    pub fn to_encoded(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push_str(SEPARATOR);
            }
            escape_into(segment, false, &mut out);
        }
        out
    }

    /// The encoded key as bytes, ready for the engine.
    pub fn encode(&self) -> Vec<u8> {
        self.to_encoded().into_bytes()
    }

    /// The encoded key followed by a separator.
    ///
    /// Scanning this prefix yields exactly the keys that extend this one by
    /// at least one more segment.
    pub fn prefix(&self) -> Vec<u8> {
        let mut out = self.to_encoded();
        out.push_str(SEPARATOR);
        out.into_bytes()
    }

    /// Decode an encoded key.
    ///
    /// Every encoded non-empty segment list decodes back to itself. The empty
    /// byte string decodes to a single empty segment.
    pub fn decode(bytes: &[u8]) -> IndexResult<Self> {
        let s = std::str::from_utf8(bytes).map_err(|e| {
            IndexError::integrity(format!("key is not valid UTF-8: {e}"))
        })?;

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                ESCAPE => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => {
                        return Err(IndexError::integrity(format!(
                            "key {s:?} ends with a dangling escape"
                        )))
                    }
                },
                COLON if chars.peek() == Some(&COLON) => {
                    chars.next();
                    segments.push(std::mem::take(&mut current));
                }
                other => current.push(other),
            }
        }
        segments.push(current);
        Ok(Self { segments })
    }

    /// Decode an encoded key and return its last segment.
    pub fn decode_last(bytes: &[u8]) -> IndexResult<String> {
        let mut segments = Self::decode(bytes)?.segments;
        segments
            .pop()
            .ok_or_else(|| IndexError::integrity("decoded key has no segments"))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_encoded())
    }
}

/// Encode a fragment of a segment for byte-prefix matching.
///
/// Identical to segment escaping except that a trailing single colon stays
/// raw, since the fragment may continue with more characters in stored keys.
pub fn encode_partial(fragment: &str) -> String {
    let mut out = String::new();
    escape_into(fragment, true, &mut out);
    out
}

fn escape_into(segment: &str, partial: bool, out: &mut String) {
    let chars: Vec<char> = segment.chars().collect();
    let last = chars.len().saturating_sub(1);
    for (i, &c) in chars.iter().enumerate() {
        match c {
            ESCAPE => {
                out.push(ESCAPE);
                out.push(ESCAPE);
            }
            COLON => {
                let prev_colon = i > 0 && chars[i - 1] == COLON;
                let next_colon = chars.get(i + 1) == Some(&COLON);
                let at_edge = i == 0 || (i == last && !partial);
                if at_edge || prev_colon || next_colon {
                    out.push(ESCAPE);
                }
                out.push(COLON);
            }
            other => out.push(other),
        }
    }
}
