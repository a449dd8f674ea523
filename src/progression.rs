//! Runtime phase progression for one exercise session.
//!
//! [`PhaseProgression`] walks the five curriculum phases strictly forward.
//! Completed action ids accumulate in one monotonic set shared across all
//! phases: an action completed once stays completed, and completing the
//! last required action of the current phase advances automatically.
//!
//! Unknown action ids are accepted silently. Actions are idempotent flags,
//! not entries in a closed registry; see `Curriculum::known_action_ids`
//! for callers that want to validate input themselves.

use crate::phase::{Curriculum, Phase, PhaseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Progress through the current phase's required actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseProgress {
    pub completed: usize,
    pub total: usize,
    /// Rounded-down percentage; 100 when the phase has no requirements.
    pub percentage: u8,
}

impl PhaseProgress {
    fn of(completed: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            (completed * 100 / total) as u8
        };
        Self {
            completed,
            total,
            percentage,
        }
    }
}

/// Why the user can or cannot move to the next phase right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvancementStatus {
    /// Every required action of the current phase is complete.
    AllRequirementsComplete,
    /// Requirements remain, but the phase permits advancing voluntarily.
    ManualAdvanceAvailable,
    /// Requirements remain and the phase does not permit skipping them.
    Blocked { unmet: Vec<String> },
}

impl fmt::Display for AdvancementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllRequirementsComplete => write!(f, "All requirements completed"),
            Self::ManualAdvanceAvailable => write!(f, "Ready to advance when you are"),
            Self::Blocked { unmet } => {
                write!(f, "Still to do: {}", unmet.join("; "))
            }
        }
    }
}

/// Forward-only progression through the curriculum phases.
#[derive(Debug, Clone)]
pub struct PhaseProgression {
    curriculum: Curriculum,
    current: PhaseId,
    completed: BTreeSet<String>,
    entered_at: BTreeMap<PhaseId, DateTime<Utc>>,
}

impl PhaseProgression {
    pub fn new(curriculum: Curriculum) -> Self {
        let first = curriculum.first().id;
        let mut entered_at = BTreeMap::new();
        entered_at.insert(first, Utc::now());
        Self {
            curriculum,
            current: first,
            completed: BTreeSet::new(),
            entered_at,
        }
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    pub fn current_phase_id(&self) -> PhaseId {
        self.current
    }

    pub fn current_phase(&self) -> &Phase {
        self.curriculum.phase(self.current)
    }

    pub fn is_action_completed(&self, action_id: &str) -> bool {
        self.completed.contains(action_id)
    }

    /// All completed action ids, in lexicographic order.
    pub fn completed_actions(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    /// Record an action as completed and auto-advance if the current
    /// phase's requirements are now all met.
    ///
    /// Unrecognized ids are recorded without error. Returns progress for
    /// whatever phase is current after the call.
    pub fn complete_action(&mut self, action_id: &str) -> PhaseProgress {
        self.completed.insert(action_id.to_string());

        if self.can_advance() && !self.current.is_terminal() {
            let from = self.current;
            self.advance();
            tracing::debug!(%from, to = %self.current, "phase auto-advanced");
        }

        self.phase_progress()
    }

    /// Progress through the current phase's required actions.
    pub fn phase_progress(&self) -> PhaseProgress {
        let phase = self.current_phase();
        let total = phase.required_actions.len();
        let completed = phase
            .action_ids()
            .filter(|id| self.completed.contains(*id))
            .count();
        PhaseProgress::of(completed, total)
    }

    /// Whether every required action of the current phase is completed.
    pub fn can_advance(&self) -> bool {
        self.current_phase()
            .action_ids()
            .all(|id| self.completed.contains(id))
    }

    /// Whether the user may move on right now, voluntarily or not.
    pub fn can_manually_advance(&self) -> bool {
        self.current_phase().allow_manual_advancement || self.can_advance()
    }

    /// Human-readable advancement state for the current phase.
    pub fn advancement_requirements(&self) -> AdvancementStatus {
        if self.can_advance() {
            return AdvancementStatus::AllRequirementsComplete;
        }
        if self.current_phase().allow_manual_advancement {
            return AdvancementStatus::ManualAdvanceAvailable;
        }
        let unmet = self
            .current_phase()
            .required_actions
            .iter()
            .filter(|a| !self.completed.contains(&a.id))
            .map(|a| a.description.clone())
            .collect();
        AdvancementStatus::Blocked { unmet }
    }

    /// Advance unconditionally. Returns `false` at the terminal phase.
    pub fn force_advance(&mut self) -> bool {
        if self.current.is_terminal() {
            return false;
        }
        let from = self.current;
        self.advance();
        tracing::debug!(%from, to = %self.current, "phase advanced manually");
        true
    }

    /// Elapsed whole seconds since the given phase (default: current) was
    /// entered; `0` for phases never entered.
    pub fn time_in_phase(&self, phase: Option<PhaseId>) -> u64 {
        let phase = phase.unwrap_or(self.current);
        match self.entered_at.get(&phase) {
            Some(entered) => (Utc::now() - *entered).num_seconds().max(0) as u64,
            None => 0,
        }
    }

    /// When the given phase was entered, if it ever was.
    pub fn entered_at(&self, phase: PhaseId) -> Option<DateTime<Utc>> {
        self.entered_at.get(&phase).copied()
    }

    /// Whether the exercise is finished: terminal phase, all actions done.
    pub fn is_complete(&self) -> bool {
        self.current.is_terminal() && self.can_advance()
    }

    fn advance(&mut self) {
        if let Some(next) = self.current.next() {
            self.current = next;
            self.entered_at.insert(next, Utc::now());
        }
    }
}

impl Default for PhaseProgression {
    fn default() -> Self {
        Self::new(Curriculum::standard())
    }
}
