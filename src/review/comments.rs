//! Anchored review comments and the per-revision comment set.
//!
//! A [`Comment`] is the persisted unit of feedback: authored by a persona,
//! anchored to a flat `(position, length)` byte span of the document, and
//! immutable after creation except for its `resolved` flag. The
//! [`CommentSet`] accumulates comments for the active document revision
//! and owns overlap resolution for renderers that need disjoint spans.

use crate::document::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sequential comment identifier, stable under insertion order.
pub type CommentId = u64;

/// Allocator for [`CommentId`]s. Ids are never reused within a session,
/// even across [`CommentSet::clear`] calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentIds {
    next: CommentId,
}

impl CommentIds {
    pub fn next(&mut self) -> CommentId {
        self.next += 1;
        self.next
    }
}

/// One anchored piece of reviewer feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// Display name of the persona that wrote this comment.
    pub author: String,
    /// The persona's role label, e.g. "Data Analyst".
    pub perspective: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// The feedback sentence(s).
    pub text: String,
    /// The matched or synthesized document segment this attaches to.
    pub excerpt: String,
    /// Byte offset of the anchored span.
    pub position: usize,
    /// Byte length of the anchored span.
    pub length: usize,
    /// User-toggled; never set by the engine.
    #[serde(default)]
    pub resolved: bool,
    /// Document revision the anchor was resolved against.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Byte offset one past the end of the anchored span.
    pub fn end(&self) -> usize {
        self.position + self.length
    }

    /// Whether the anchor still lies inside `document`'s bounds.
    pub fn is_in_bounds(&self, document: &Document) -> bool {
        self.end() <= document.len()
    }
}

/// Accumulated comments for the active document revision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentSet {
    comments: Vec<Comment>,
}

impl CommentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of comments.
    ///
    /// Content is not deduplicated; only a comment reusing an id already
    /// in the set is skipped. The whole batch lands in one call, so a
    /// reader never observes part of a reviewer's feedback.
    pub fn add(&mut self, batch: Vec<Comment>) {
        for comment in batch {
            if self.comments.iter().any(|c| c.id == comment.id) {
                tracing::warn!(id = comment.id, "skipping comment with duplicate id");
                continue;
            }
            self.comments.push(comment);
        }
    }

    /// Every comment, in insertion order. Includes comments that
    /// [`CommentSet::ordered_non_overlapping`] would drop; the feedback
    /// sidebar renders this full list.
    pub fn all(&self) -> &[Comment] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Comments sorted by start position with overlaps resolved first-wins:
    /// a comment starting before the previously retained comment's span
    /// ends is dropped. The result is strictly increasing in position and
    /// idempotent under re-application.
    pub fn ordered_non_overlapping(&self) -> Vec<&Comment> {
        let mut sorted: Vec<&Comment> = self.comments.iter().collect();
        sorted.sort_by_key(|c| (c.position, c.id));

        let mut retained: Vec<&Comment> = Vec::with_capacity(sorted.len());
        for comment in sorted {
            match retained.last() {
                Some(previous) if comment.position < previous.end() => {
                    tracing::debug!(
                        id = comment.id,
                        blocked_by = previous.id,
                        "overlapping comment dropped from render spans"
                    );
                }
                _ => retained.push(comment),
            }
        }
        retained
    }

    /// Empty the set. Partial deletion is not supported; the user either
    /// keeps the review or returns to plain editing.
    pub fn clear(&mut self) {
        self.comments.clear();
    }

    /// Mark a comment resolved. Returns `false` for unknown ids. Resolved
    /// comments stay in the set.
    pub fn resolve(&mut self, id: CommentId) -> bool {
        match self.comments.iter_mut().find(|c| c.id == id) {
            Some(comment) => {
                comment.resolved = true;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: CommentId, position: usize, length: usize) -> Comment {
        Comment {
            id,
            author: "Maya Chen".to_string(),
            perspective: "Engineering Lead".to_string(),
            avatar: None,
            text: "Needs more detail.".to_string(),
            excerpt: "some excerpt".to_string(),
            position,
            length,
            resolved: false,
            revision: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_ids_are_sequential_and_never_reused() {
        let mut ids = CommentIds::default();
        assert_eq!(ids.next(), 1);
        assert_eq!(ids.next(), 2);
        assert_eq!(ids.next(), 3);
    }

    #[test]
    fn test_add_appends_without_content_dedup() {
        let mut set = CommentSet::new();
        set.add(vec![comment(1, 0, 5), comment(2, 0, 5)]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_add_skips_duplicate_ids() {
        let mut set = CommentSet::new();
        set.add(vec![comment(1, 0, 5)]);
        set.add(vec![comment(1, 10, 5), comment(2, 20, 5)]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().position, 0);
    }

    #[test]
    fn test_ordered_non_overlapping_sorts_and_drops() {
        let mut set = CommentSet::new();
        // 1: [10, 30), 2: [0, 8), 3: [25, 35) overlaps 1, 4: [30, 40) touches 1
        set.add(vec![
            comment(1, 10, 20),
            comment(2, 0, 8),
            comment(3, 25, 10),
            comment(4, 30, 10),
        ]);

        let spans = set.ordered_non_overlapping();
        let ids: Vec<CommentId> = spans.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 1, 4]);

        // Strictly increasing starts, no overlap
        for pair in spans.windows(2) {
            assert!(pair[0].position < pair[1].position);
            assert!(pair[0].end() <= pair[1].position);
        }

        // Dropped overlaps remain in the full list
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_ordered_non_overlapping_is_idempotent() {
        let mut set = CommentSet::new();
        set.add(vec![comment(1, 5, 10), comment(2, 8, 4), comment(3, 20, 3)]);

        let first: Vec<Comment> = set
            .ordered_non_overlapping()
            .into_iter()
            .cloned()
            .collect();

        let mut reapplied = CommentSet::new();
        reapplied.add(first.clone());
        let second: Vec<Comment> = reapplied
            .ordered_non_overlapping()
            .into_iter()
            .cloned()
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut set = CommentSet::new();
        set.add(vec![comment(1, 0, 5), comment(2, 10, 5)]);
        set.clear();
        assert!(set.is_empty());
        assert!(set.get(1).is_none());
    }

    #[test]
    fn test_resolve_marks_without_removing() {
        let mut set = CommentSet::new();
        set.add(vec![comment(7, 0, 5)]);
        assert!(set.resolve(7));
        assert!(set.get(7).unwrap().resolved);
        assert_eq!(set.len(), 1);
        assert!(!set.resolve(99));
    }

    #[test]
    fn test_bounds_check_against_document() {
        let doc = Document::new("0123456789");
        assert!(comment(1, 5, 5).is_in_bounds(&doc));
        assert!(!comment(2, 5, 6).is_in_bounds(&doc));
    }
}
