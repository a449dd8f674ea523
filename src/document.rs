//! The working document and substring indexing.
//!
//! A [`Document`] owns the text the user is authoring. Edits replace the
//! whole text and bump a revision counter; the crate does not track
//! fine-grained diffs. Comment anchors store the revision they were
//! resolved against so a renderer can tell when they went stale.
//!
//! Lookup is ASCII case-insensitive and byte-offset based. Line/column
//! coordinates are derived on demand for renderers that work per line.

use serde::{Deserialize, Serialize};

/// A location inside a document.
///
/// `offset` is a byte offset into the full text. `line` is the 0-based
/// line index and `column` the byte offset within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// One occurrence of a needle inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub position: Position,
    /// Byte length of the matched span.
    pub length: usize,
}

/// The document under review. One per exercise session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    text: String,
    revision: u64,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            revision: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The revision counter, bumped on every whole-text replacement.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the entire text. Anchors resolved against earlier
    /// revisions are not adjusted; callers compare [`Document::revision`].
    pub fn replace_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.revision += 1;
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Find the first occurrence of `needle`, ignoring ASCII case.
    ///
    /// Returns the byte offset of the match. Empty needles never match.
    pub fn find_ignore_case(&self, needle: &str) -> Option<usize> {
        find_ignore_case_from(&self.text, needle, 0)
    }

    /// Enumerate every non-overlapping occurrence of `needle` with full
    /// line/offset coordinates, ignoring ASCII case.
    pub fn occurrences(&self, needle: &str) -> Vec<Occurrence> {
        let mut found = Vec::new();
        let mut start = 0;
        while let Some(offset) = find_ignore_case_from(&self.text, needle, start) {
            found.push(Occurrence {
                position: self.position_at(offset),
                length: needle.len(),
            });
            start = offset + needle.len().max(1);
        }
        found
    }

    /// Resolve a byte offset to line/column coordinates.
    ///
    /// Offsets past the end of the text clamp to the end.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let before = &self.text[..self.char_floor(offset)];
        let line = before.matches('\n').count();
        let column = match before.rfind('\n') {
            Some(nl) => before.len() - nl - 1,
            None => before.len(),
        };
        Position {
            offset: self.char_floor(offset),
            line,
            column,
        }
    }

    /// Round a byte offset down to the nearest char boundary.
    pub fn char_floor(&self, mut offset: usize) -> usize {
        offset = offset.min(self.text.len());
        while offset > 0 && !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }

    /// The text of up to `chars` characters starting at `offset`.
    pub fn excerpt_at(&self, offset: usize, chars: usize) -> &str {
        let start = self.char_floor(offset);
        let mut end = start;
        for (taken, (idx, ch)) in self.text[start..].char_indices().enumerate() {
            if taken == chars {
                return &self.text[start..start + idx];
            }
            end = start + idx + ch.len_utf8();
        }
        &self.text[start..end]
    }
}

fn find_ignore_case_from(text: &str, needle: &str, start: usize) -> Option<usize> {
    if needle.is_empty() || needle.len() > text.len() {
        return None;
    }
    let haystack = text.as_bytes();
    let wanted = needle.as_bytes();
    let mut i = start;
    while i + wanted.len() <= haystack.len() {
        if text.is_char_boundary(i) && haystack[i..i + wanted.len()].eq_ignore_ascii_case(wanted) {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "ShopSphere checkout abandonment is high.\nUsers drop at the payment step.";

    #[test]
    fn test_find_ignore_case_exact() {
        let doc = Document::new(SAMPLE);
        assert_eq!(doc.find_ignore_case("checkout abandonment"), Some(11));
    }

    #[test]
    fn test_find_ignore_case_differing_case() {
        let doc = Document::new(SAMPLE);
        assert_eq!(doc.find_ignore_case("CHECKOUT Abandonment"), Some(11));
        assert_eq!(doc.find_ignore_case("shopsphere"), Some(0));
    }

    #[test]
    fn test_find_ignore_case_missing() {
        let doc = Document::new(SAMPLE);
        assert_eq!(doc.find_ignore_case("refund policy"), None);
    }

    #[test]
    fn test_find_empty_needle_never_matches() {
        let doc = Document::new(SAMPLE);
        assert_eq!(doc.find_ignore_case(""), None);
        assert!(doc.occurrences("").is_empty());
    }

    #[test]
    fn test_occurrences_enumerates_with_line_coordinates() {
        let doc = Document::new("alpha beta\nalpha gamma\nALPHA");
        let hits = doc.occurrences("alpha");
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].position.line, 0);
        assert_eq!(hits[0].position.column, 0);
        assert_eq!(hits[1].position.line, 1);
        assert_eq!(hits[1].position.offset, 11);
        assert_eq!(hits[2].position.line, 2);
        assert_eq!(hits[2].length, 5);
    }

    #[test]
    fn test_position_at_second_line() {
        let doc = Document::new(SAMPLE);
        let pos = doc.position_at(41);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 0);
    }

    #[test]
    fn test_position_at_clamps_past_end() {
        let doc = Document::new("short");
        let pos = doc.position_at(10_000);
        assert_eq!(pos.offset, 5);
        assert_eq!(pos.line, 0);
    }

    #[test]
    fn test_replace_text_bumps_revision() {
        let mut doc = Document::new("v1");
        assert_eq!(doc.revision(), 0);
        doc.replace_text("v2");
        doc.replace_text("v3");
        assert_eq!(doc.revision(), 2);
        assert_eq!(doc.text(), "v3");
    }

    #[test]
    fn test_excerpt_at_counts_chars_not_bytes() {
        let doc = Document::new("héllo wörld and more text");
        assert_eq!(doc.excerpt_at(0, 5), "héllo");
    }

    #[test]
    fn test_excerpt_at_truncates_at_end() {
        let doc = Document::new("tail");
        assert_eq!(doc.excerpt_at(2, 30), "il");
    }

    #[test]
    fn test_char_floor_lands_on_boundary() {
        let doc = Document::new("héllo");
        // 'é' spans bytes 1..3; offset 2 is mid-char
        assert_eq!(doc.char_floor(2), 1);
        assert_eq!(doc.char_floor(3), 3);
    }
}
