//! Anchoring extracted feedback to document spans.
//!
//! Every feedback item claims to comment on an `excerpt` of the document.
//! Generative reviewers misquote, so matching runs in three tiers:
//!
//! 1. exact match of the excerpt, ignoring ASCII case
//! 2. the first three whitespace-separated words of the excerpt
//! 3. a deterministic positional fallback that spreads unmatched items
//!    evenly across the document and synthesizes an excerpt in place
//!
//! Tier 3 applies only under [`AnchorPolicy::SyntheticFallback`]. The
//! sidebar review path uses [`AnchorPolicy::DropUnmatched`], where items
//! failing both match tiers are discarded instead.
//!
//! Anchors are flat `(position, length)` byte spans. Line-scoped
//! coordinates for rendering come from [`Document::position_at`].

use crate::document::Document;
use crate::review::extractor::FeedbackItem;
use serde::{Deserialize, Serialize};

/// How many synthesized-excerpt characters a fallback anchor carries.
pub const DEFAULT_SYNTHETIC_EXCERPT_CHARS: usize = 30;

/// What to do with feedback whose excerpt cannot be located.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// Place unmatched items at evenly distributed positions with a
    /// synthesized excerpt. Every item yields a comment.
    #[default]
    SyntheticFallback,
    /// Silently discard unmatched items.
    DropUnmatched,
}

/// Which tier produced an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Prefix,
    Fallback,
}

/// A resolved anchor: the span plus the excerpt actually used, which may
/// be shorter than requested (prefix tier) or synthesized (fallback tier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredSpan {
    pub position: usize,
    pub length: usize,
    pub excerpt: String,
    pub tier: MatchTier,
}

/// A feedback item paired with its resolved anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredItem {
    pub span: AnchoredSpan,
    pub comment_text: String,
}

/// Anchor a batch of feedback items against `document`.
///
/// Matched items keep their relative order; fallback positions depend on
/// how many items in the batch went unmatched, so anchoring is a batch
/// operation rather than a per-item one.
pub fn anchor_items(
    document: &Document,
    items: Vec<FeedbackItem>,
    policy: AnchorPolicy,
    synthetic_chars: usize,
) -> Vec<AnchoredItem> {
    let mut anchored: Vec<Option<AnchoredItem>> = Vec::with_capacity(items.len());
    let mut unmatched: Vec<(usize, FeedbackItem)> = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match match_excerpt(document, &item.excerpt) {
            Some(span) => anchored.push(Some(AnchoredItem {
                span,
                comment_text: item.comment_text,
            })),
            None => {
                anchored.push(None);
                unmatched.push((index, item));
            }
        }
    }

    match policy {
        AnchorPolicy::DropUnmatched => {
            for (index, item) in &unmatched {
                tracing::debug!(
                    excerpt = %item.excerpt,
                    index,
                    "unmatched excerpt dropped"
                );
            }
        }
        AnchorPolicy::SyntheticFallback => {
            let total = unmatched.len();
            for (i, (index, item)) in unmatched.into_iter().enumerate() {
                let span = fallback_span(document, i, total, synthetic_chars);
                anchored[index] = Some(AnchoredItem {
                    span,
                    comment_text: item.comment_text,
                });
            }
        }
    }

    anchored.into_iter().flatten().collect()
}

/// Try the two match tiers for one excerpt.
pub fn match_excerpt(document: &Document, excerpt: &str) -> Option<AnchoredSpan> {
    let excerpt = excerpt.trim();
    if excerpt.is_empty() {
        return None;
    }

    if let Some(position) = document.find_ignore_case(excerpt) {
        return Some(span_at(document, position, excerpt.len(), MatchTier::Exact));
    }

    let prefix: String = excerpt
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");
    if !prefix.is_empty() && prefix != excerpt {
        if let Some(position) = document.find_ignore_case(&prefix) {
            return Some(span_at(document, position, prefix.len(), MatchTier::Prefix));
        }
    }

    None
}

fn span_at(document: &Document, position: usize, length: usize, tier: MatchTier) -> AnchoredSpan {
    AnchoredSpan {
        position,
        length,
        // Store the document's own text so the excerpt matches what a
        // renderer highlights, whatever case the reviewer quoted.
        excerpt: document.text()[position..position + length].to_string(),
        tier,
    }
}

/// Deterministic placeholder span for unmatched item `i` of `n`.
fn fallback_span(
    document: &Document,
    i: usize,
    n: usize,
    synthetic_chars: usize,
) -> AnchoredSpan {
    let raw = document.len() * (i + 1) / (n + 1);
    let position = document.char_floor(raw);
    let excerpt = document.excerpt_at(position, synthetic_chars).to_string();
    AnchoredSpan {
        position,
        length: excerpt.len(),
        excerpt,
        tier: MatchTier::Fallback,
    }
}
