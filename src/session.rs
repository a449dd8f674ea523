//! The session facade consumed by the UI layer.
//!
//! A [`Session`] owns everything one exercise run mutates: the document,
//! the comment set, the phase progression, and the shared-document
//! registry. Nothing here is global; the UI constructs a session, holds
//! it, and calls through. Review passes borrow the session exclusively,
//! which is what keeps a pass from reentering while one is running.

use crate::config::SessionConfig;
use crate::document::Document;
use crate::generate::TextGenerator;
use crate::persona::ReviewerPersona;
use crate::phase::{Curriculum, Phase, PhaseId};
use crate::progression::{AdvancementStatus, PhaseProgress, PhaseProgression};
use crate::review::comments::{Comment, CommentId, CommentIds, CommentSet};
use crate::review::dispatcher::ReviewDispatcher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry in the session's shared-document registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDocument {
    pub reviewer_id: String,
    /// Document revision at share time.
    pub revision: u64,
    pub shared_at: DateTime<Utc>,
}

/// One exercise run: document, comments, progression, shares.
pub struct Session {
    id: Uuid,
    config: SessionConfig,
    document: Document,
    comments: CommentSet,
    ids: CommentIds,
    progression: PhaseProgression,
    shared: Vec<SharedDocument>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            document: Document::default(),
            comments: CommentSet::new(),
            ids: CommentIds::default(),
            progression: PhaseProgression::new(Curriculum::standard()),
            shared: Vec::new(),
        }
    }

    pub fn with_curriculum(mut self, curriculum: Curriculum) -> Self {
        self.progression = PhaseProgression::new(curriculum);
        self
    }

    pub fn with_document_text(mut self, text: &str) -> Self {
        self.document = Document::new(text);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn comments(&self) -> &CommentSet {
        &self.comments
    }

    pub fn progression(&self) -> &PhaseProgression {
        &self.progression
    }

    /// Replace the document text, bumping its revision. Existing comments
    /// keep their old-revision anchors; renderers compare
    /// [`Comment::revision`] against [`Document::revision`].
    pub fn replace_document_text(&mut self, text: &str) {
        self.document.replace_text(text);
    }

    // =========================================
    // Review operations
    // =========================================

    /// Run one review pass over the roster and append the results.
    ///
    /// Returns the comments appended by this pass, in roster order. An
    /// empty roster (or one with no online/away personas) returns an
    /// empty list without touching the generation backend. If every
    /// selected reviewer fails, one synthetic system comment is appended
    /// instead so the user is not left staring at silent nothing.
    pub async fn request_review(
        &mut self,
        generator: &dyn TextGenerator,
        roster: &[ReviewerPersona],
    ) -> Vec<Comment> {
        let dispatcher = ReviewDispatcher::for_session(&self.config);
        let outcome = dispatcher
            .dispatch(&self.document, roster, generator, &mut self.ids)
            .await;

        if outcome.is_empty() {
            tracing::debug!(session = %self.id, "review requested with no eligible reviewers");
            return Vec::new();
        }

        if outcome.all_failed() {
            tracing::warn!(
                session = %self.id,
                reviewers = outcome.outcomes.len(),
                "every reviewer failed; appending system notice"
            );
            let notice = self.system_notice();
            self.comments.add(vec![notice.clone()]);
            return vec![notice];
        }

        let mut appended = Vec::new();
        for reviewer in outcome.outcomes {
            if let Ok(batch) = reviewer.result {
                appended.extend(batch.iter().cloned());
                self.comments.add(batch);
            }
        }
        appended
    }

    /// Drop all review comments and return to plain editing.
    pub fn clear_review(&mut self) {
        self.comments.clear();
    }

    /// Mark a comment resolved. Returns `false` for unknown ids.
    pub fn resolve_comment(&mut self, id: CommentId) -> bool {
        self.comments.resolve(id)
    }

    fn system_notice(&mut self) -> Comment {
        Comment {
            id: self.ids.next(),
            author: "System".to_string(),
            perspective: "system".to_string(),
            avatar: None,
            text: "None of your reviewers could respond right now. \
                   Check the connection to the review service and try again."
                .to_string(),
            excerpt: String::new(),
            position: 0,
            length: 0,
            resolved: false,
            revision: self.document.revision(),
            created_at: Utc::now(),
        }
    }

    // =========================================
    // Phase operations
    // =========================================

    pub fn current_phase(&self) -> &Phase {
        self.progression.current_phase()
    }

    pub fn current_phase_id(&self) -> PhaseId {
        self.progression.current_phase_id()
    }

    pub fn complete_action(&mut self, action_id: &str) -> PhaseProgress {
        self.progression.complete_action(action_id)
    }

    pub fn phase_progress(&self) -> PhaseProgress {
        self.progression.phase_progress()
    }

    pub fn can_advance(&self) -> bool {
        self.progression.can_advance()
    }

    pub fn can_manually_advance(&self) -> bool {
        self.progression.can_manually_advance()
    }

    pub fn advancement_requirements(&self) -> AdvancementStatus {
        self.progression.advancement_requirements()
    }

    pub fn force_advance(&mut self) -> bool {
        self.progression.force_advance()
    }

    pub fn time_in_phase(&self, phase: Option<PhaseId>) -> u64 {
        self.progression.time_in_phase(phase)
    }

    pub fn is_complete(&self) -> bool {
        self.progression.is_complete()
    }

    // =========================================
    // Shared documents
    // =========================================

    /// Share the document with a reviewer. Idempotent: sharing with the
    /// same reviewer again returns the existing entry. The registry only
    /// grows; there is no unshare.
    pub fn share_document(&mut self, reviewer_id: &str) -> &SharedDocument {
        if let Some(existing) = self.shared.iter().position(|s| s.reviewer_id == reviewer_id) {
            return &self.shared[existing];
        }
        let entry = SharedDocument {
            reviewer_id: reviewer_id.to_string(),
            revision: self.document.revision(),
            shared_at: Utc::now(),
        };
        tracing::debug!(session = %self.id, reviewer = reviewer_id, "document shared");
        self.shared.push(entry);
        let last = self.shared.len() - 1;
        &self.shared[last]
    }

    pub fn shared_documents(&self) -> &[SharedDocument] {
        &self.shared
    }

    pub fn is_shared_with(&self, reviewer_id: &str) -> bool {
        self.shared.iter().any(|s| s.reviewer_id == reviewer_id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
