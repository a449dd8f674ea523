//! The document annotation engine.
//!
//! A review pass turns unreliable generative-backend output into anchored
//! inline comments:
//!
//! - [`extractor`]: pulls validated `(excerpt, comment)` pairs out of a
//!   raw payload, repairing common JSON damage
//! - [`anchor`]: resolves each excerpt to a `(position, length)` span of
//!   the document, with a deterministic fallback for misquotes
//! - [`comments`]: the anchored [`Comment`] record and the per-revision
//!   [`CommentSet`] with first-wins overlap resolution
//! - [`dispatcher`]: runs a pass over the reviewer roster, isolating
//!   per-reviewer failures

pub mod anchor;
pub mod comments;
pub mod dispatcher;
pub mod extractor;

pub use anchor::{AnchorPolicy, AnchoredItem, AnchoredSpan, MatchTier};
pub use comments::{Comment, CommentId, CommentIds, CommentSet};
pub use dispatcher::{DispatchConfig, ReviewDispatcher, ReviewPassOutcome, ReviewerOutcome};
pub use extractor::{FeedbackItem, extract};
