//! Phase definitions and JSON loading for the training exercise.
//!
//! This module provides:
//! - `PhaseId`, the fixed, totally ordered set of exercise phases
//! - `Phase`, one phase's title, required actions, and metadata
//! - `Curriculum`, the validated ordered collection of all five phases
//! - `CurriculumFile`, the curriculum.json format with loading functions
//! - The built-in default curriculum as a fallback
//!
//! The five phases are static: every exercise visits `ASSIGNMENT` through
//! `FINALIZATION` in order. A curriculum file may reword titles, actions,
//! and metadata but cannot add, drop, or reorder phases.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Identifier of an exercise phase. Ordered; no backward transitions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseId {
    Assignment,
    Research,
    Planning,
    Collaboration,
    Finalization,
}

impl PhaseId {
    /// All phases in visit order.
    pub const ALL: [PhaseId; 5] = [
        PhaseId::Assignment,
        PhaseId::Research,
        PhaseId::Planning,
        PhaseId::Collaboration,
        PhaseId::Finalization,
    ];

    /// Zero-based position in the visit order.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(0)
    }

    /// The phase after this one, or `None` at the terminal phase.
    pub fn next(&self) -> Option<PhaseId> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        *self == PhaseId::Finalization
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Assignment => "ASSIGNMENT",
            Self::Research => "RESEARCH",
            Self::Planning => "PLANNING",
            Self::Collaboration => "COLLABORATION",
            Self::Finalization => "FINALIZATION",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PhaseId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASSIGNMENT" => Ok(Self::Assignment),
            "RESEARCH" => Ok(Self::Research),
            "PLANNING" => Ok(Self::Planning),
            "COLLABORATION" => Ok(Self::Collaboration),
            "FINALIZATION" => Ok(Self::Finalization),
            other => anyhow::bail!("unknown phase id: {other}"),
        }
    }
}

/// One action the user must perform before a phase counts as complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredAction {
    /// Identifier recorded by the progression state machine.
    pub id: String,
    /// Human-readable description surfaced in advancement requirements.
    pub description: String,
}

impl RequiredAction {
    pub fn new(id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            description: description.to_string(),
        }
    }
}

/// A single exercise phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    /// Human-readable name of the phase
    pub title: String,
    /// Actions that must all be completed before auto-advancement
    #[serde(default)]
    pub required_actions: Vec<RequiredAction>,
    /// Whether the user may advance voluntarily before completing actions
    #[serde(default)]
    pub allow_manual_advancement: bool,
    /// Icon shown in the phase tracker
    #[serde(default)]
    pub icon: String,
    /// Rough time estimate surfaced to the user
    #[serde(default)]
    pub estimated_minutes: u32,
    /// What the user should get out of this phase
    #[serde(default)]
    pub objectives: Vec<String>,
}

impl Phase {
    pub fn new(id: PhaseId, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            required_actions: Vec::new(),
            allow_manual_advancement: false,
            icon: String::new(),
            estimated_minutes: 0,
            objectives: Vec::new(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<RequiredAction>) -> Self {
        self.required_actions = actions;
        self
    }

    pub fn with_manual_advancement(mut self, allowed: bool) -> Self {
        self.allow_manual_advancement = allowed;
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }

    pub fn with_estimated_minutes(mut self, minutes: u32) -> Self {
        self.estimated_minutes = minutes;
        self
    }

    pub fn with_objectives(mut self, objectives: Vec<String>) -> Self {
        self.objectives = objectives;
        self
    }

    /// Ids of this phase's required actions, in declaration order.
    pub fn action_ids(&self) -> impl Iterator<Item = &str> {
        self.required_actions.iter().map(|a| a.id.as_str())
    }
}

/// The validated, ordered collection of all five phases.
#[derive(Debug, Clone, PartialEq)]
pub struct Curriculum {
    phases: Vec<Phase>,
}

impl Curriculum {
    /// Build a curriculum from phase definitions.
    ///
    /// The definitions must cover exactly the five `PhaseId`s in visit
    /// order; anything else is a configuration error.
    pub fn from_phases(phases: Vec<Phase>) -> Result<Self> {
        if phases.len() != PhaseId::ALL.len() {
            anyhow::bail!(
                "curriculum must define exactly {} phases, got {}",
                PhaseId::ALL.len(),
                phases.len()
            );
        }
        for (phase, expected) in phases.iter().zip(PhaseId::ALL) {
            if phase.id != expected {
                anyhow::bail!(
                    "curriculum phase out of order: expected {expected}, found {}",
                    phase.id
                );
            }
        }
        Ok(Self { phases })
    }

    /// The built-in default curriculum.
    pub fn standard() -> Self {
        Self {
            phases: default_phases(),
        }
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, id: PhaseId) -> &Phase {
        // from_phases guarantees one entry per PhaseId
        &self.phases[id.index()]
    }

    pub fn first(&self) -> &Phase {
        &self.phases[0]
    }

    /// Every action id referenced by any phase, in phase order.
    ///
    /// The progression state machine accepts unknown ids silently; this
    /// exists so stricter callers can pre-validate their own input.
    pub fn known_action_ids(&self) -> Vec<&str> {
        self.phases.iter().flat_map(Phase::action_ids).collect()
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::standard()
    }
}

/// The curriculum.json file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumFile {
    /// Name of the exercise this curriculum belongs to
    pub exercise: String,
    /// Phase definitions, in visit order
    pub phases: Vec<Phase>,
}

impl CurriculumFile {
    /// Load a curriculum from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read curriculum file: {}", path.display()))?;

        let file: CurriculumFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse curriculum JSON: {}", path.display()))?;

        Ok(file)
    }

    /// Save the curriculum to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize curriculum to JSON")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write curriculum file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the file contents into a usable curriculum.
    pub fn into_curriculum(self) -> Result<Curriculum> {
        Curriculum::from_phases(self.phases)
    }
}

/// Try to load a curriculum file, falling back to the built-in default.
pub fn load_curriculum_or_default(path: Option<&Path>) -> Result<Curriculum> {
    match path {
        Some(path) if path.exists() => CurriculumFile::load(path)?.into_curriculum(),
        _ => Ok(Curriculum::standard()),
    }
}

fn default_phases() -> Vec<Phase> {
    vec![
        Phase::new(PhaseId::Assignment, "Getting the assignment")
            .with_icon("📋")
            .with_estimated_minutes(10)
            .with_manual_advancement(true)
            .with_actions(vec![
                RequiredAction::new("read_brief", "Read the assignment brief"),
                RequiredAction::new("meet_the_team", "Introduce yourself to the team"),
                RequiredAction::new(
                    "review_company_profile",
                    "Review the ShopSphere company profile",
                ),
            ])
            .with_objectives(vec![
                "Understand what is being asked of you".to_string(),
                "Know who you will be working with".to_string(),
            ]),
        Phase::new(PhaseId::Research, "Understanding the problem")
            .with_icon("🔍")
            .with_estimated_minutes(20)
            .with_manual_advancement(true)
            .with_actions(vec![
                RequiredAction::new(
                    "interview_stakeholders",
                    "Chat with at least one stakeholder",
                ),
                RequiredAction::new("review_metrics", "Review the checkout funnel metrics"),
                RequiredAction::new("capture_insights", "Capture your research insights"),
            ])
            .with_objectives(vec![
                "Identify why checkout abandonment is high".to_string(),
                "Ground your plan in data, not hunches".to_string(),
            ]),
        Phase::new(PhaseId::Planning, "Drafting the one-pager")
            .with_icon("📝")
            .with_estimated_minutes(25)
            .with_actions(vec![
                RequiredAction::new("draft_document", "Draft the problem one-pager"),
                RequiredAction::new("request_review", "Request a team review of your draft"),
                RequiredAction::new(
                    "address_feedback",
                    "Resolve or respond to review comments",
                ),
            ])
            .with_objectives(vec![
                "Produce a reviewable problem statement".to_string(),
                "Incorporate the team's feedback".to_string(),
            ]),
        Phase::new(PhaseId::Collaboration, "Aligning the team")
            .with_icon("🤝")
            .with_estimated_minutes(15)
            .with_actions(vec![
                RequiredAction::new("share_document", "Share your draft with a teammate"),
                RequiredAction::new("discuss_tradeoffs", "Discuss trade-offs with the team"),
            ])
            .with_objectives(vec!["Build agreement before finalizing".to_string()]),
        Phase::new(PhaseId::Finalization, "Shipping the recommendation")
            .with_icon("🚀")
            .with_estimated_minutes(10)
            .with_actions(vec![
                RequiredAction::new(
                    "finalize_document",
                    "Finalize the recommendation document",
                ),
                RequiredAction::new("present_summary", "Present your summary to the team"),
            ])
            .with_objectives(vec!["Deliver a decision-ready recommendation".to_string()]),
    ]
}
