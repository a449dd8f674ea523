//! Review-pass dispatch across the reviewer roster.
//!
//! One pass asks every eligible persona for feedback, one generation
//! request each. Requests run sequentially with an inter-request delay to
//! avoid hammering the backend, or concurrently when configured; in both
//! modes comments land in roster order with sequentially assigned ids, so
//! a pass over the same inputs is deterministic.
//!
//! A reviewer that fails (rejected generation, unusable payload) is
//! reported in its outcome slot and the pass continues with the rest.

use crate::config::SessionConfig;
use crate::document::Document;
use crate::errors::{GenerationError, ReviewerFailure};
use crate::generate::TextGenerator;
use crate::persona::{ReviewerPersona, eligible_reviewers};
use crate::review::anchor::{AnchorPolicy, AnchoredItem, anchor_items};
use crate::review::comments::{Comment, CommentIds};
use crate::review::extractor;
use chrono::Utc;
use futures::future::join_all;
use std::time::Duration;

/// Instructions prepended to every review request. The backend is told to
/// answer with bare JSON; extraction copes when it does not comply.
const REVIEW_REQUEST_INSTRUCTIONS: &str = "You are reviewing a colleague's draft document. \
Reply with a single JSON object and nothing else, in exactly this form:\n\
{\"comments\": [{\"text_excerpt\": \"text copied verbatim from the document\", \"comment\": \"your feedback on that text\"}]}\n\
Copy each text_excerpt exactly as it appears in the document. \
Give two to four specific, constructive comments.";

/// Build the review prompt for one document.
pub fn review_prompt(document: &Document) -> String {
    format!(
        "{REVIEW_REQUEST_INSTRUCTIONS}\n\nDocument under review:\n\n{}",
        document.text()
    )
}

/// Configuration for one review pass.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Pause between consecutive requests in sequential mode.
    pub inter_request_delay: Duration,
    /// Issue all requests concurrently instead of sequentially.
    pub parallel: bool,
    /// Ceiling on a single generation call.
    pub generation_timeout: Duration,
    pub anchor_policy: AnchorPolicy,
    pub synthetic_excerpt_chars: usize,
    pub system_prompt: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for DispatchConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            inter_request_delay: Duration::from_millis(config.review.inter_request_delay_ms),
            parallel: config.review.parallel,
            generation_timeout: Duration::from_secs(config.review.generation_timeout_secs),
            anchor_policy: config.anchor.policy,
            synthetic_excerpt_chars: config.anchor.synthetic_excerpt_chars,
            system_prompt: config.review.system_prompt.clone(),
        }
    }
}

/// What one reviewer contributed to a pass.
#[derive(Debug)]
pub struct ReviewerOutcome {
    pub persona_id: String,
    pub result: Result<Vec<Comment>, ReviewerFailure>,
}

/// The result of one review pass over the eligible roster.
#[derive(Debug, Default)]
pub struct ReviewPassOutcome {
    /// One entry per eligible reviewer, in roster order.
    pub outcomes: Vec<ReviewerOutcome>,
}

impl ReviewPassOutcome {
    /// No eligible reviewers were found, so nothing was requested.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// All comments from successful reviewers, in roster order.
    pub fn comments(&self) -> Vec<&Comment> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
            .collect()
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }

    /// Every selected reviewer failed.
    pub fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.succeeded_count() == 0
    }
}

/// Drives review passes against a roster.
pub struct ReviewDispatcher {
    config: DispatchConfig,
}

impl ReviewDispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    pub fn for_session(config: &SessionConfig) -> Self {
        Self::new(DispatchConfig::from(config))
    }

    /// Run one review pass.
    ///
    /// Ids come from `ids` in roster order regardless of execution mode,
    /// so reviewer A's comments never interleave with reviewer B's.
    pub async fn dispatch(
        &self,
        document: &Document,
        roster: &[ReviewerPersona],
        generator: &dyn TextGenerator,
        ids: &mut CommentIds,
    ) -> ReviewPassOutcome {
        let eligible = eligible_reviewers(roster);
        if eligible.is_empty() {
            tracing::debug!("no eligible reviewers; skipping generation");
            return ReviewPassOutcome::default();
        }

        tracing::debug!(
            reviewers = eligible.len(),
            parallel = self.config.parallel,
            "starting review pass"
        );

        let results: Vec<Result<Vec<AnchoredItem>, ReviewerFailure>> = if self.config.parallel {
            join_all(
                eligible
                    .iter()
                    .map(|persona| self.review_one(document, persona, generator)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(eligible.len());
            for (i, persona) in eligible.iter().enumerate() {
                if i > 0 && !self.config.inter_request_delay.is_zero() {
                    tokio::time::sleep(self.config.inter_request_delay).await;
                }
                results.push(self.review_one(document, persona, generator).await);
            }
            results
        };

        let outcomes = eligible
            .into_iter()
            .zip(results)
            .map(|(persona, result)| {
                let result = result.map(|items| {
                    items
                        .into_iter()
                        .map(|item| Comment {
                            id: ids.next(),
                            author: persona.name.clone(),
                            perspective: persona.role.clone(),
                            avatar: persona.avatar.clone(),
                            text: item.comment_text,
                            excerpt: item.span.excerpt,
                            position: item.span.position,
                            length: item.span.length,
                            resolved: false,
                            revision: document.revision(),
                            created_at: Utc::now(),
                        })
                        .collect::<Vec<_>>()
                });
                if let Err(error) = &result {
                    tracing::warn!(
                        persona = %persona.id,
                        %error,
                        "reviewer failed; continuing with the rest"
                    );
                }
                ReviewerOutcome {
                    persona_id: persona.id.clone(),
                    result,
                }
            })
            .collect();

        ReviewPassOutcome { outcomes }
    }

    /// Request, extract, and anchor one reviewer's feedback.
    async fn review_one(
        &self,
        document: &Document,
        persona: &ReviewerPersona,
        generator: &dyn TextGenerator,
    ) -> Result<Vec<AnchoredItem>, ReviewerFailure> {
        let prompt = review_prompt(document);

        let raw = tokio::time::timeout(
            self.config.generation_timeout,
            generator.generate(&prompt, &[], &self.config.system_prompt, persona),
        )
        .await
        .map_err(|_| {
            GenerationError::rejected(format!(
                "generation timed out after {}s",
                self.config.generation_timeout.as_secs()
            ))
        })??;

        let items = extractor::extract(&raw)?;
        Ok(anchor_items(
            document,
            items,
            self.config.anchor_policy,
            self.config.synthetic_excerpt_chars,
        ))
    }
}
