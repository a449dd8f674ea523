//! Reviewer personas and roster eligibility.
//!
//! The roster is supplied by the embedding application and treated as
//! immutable here. Only personas whose availability is `Online` or `Away`
//! are asked for feedback; `Offline` personas are skipped without a
//! generation request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability of a reviewer persona.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    #[default]
    Online,
    Away,
    Offline,
}

impl AvailabilityStatus {
    /// Whether a persona with this status may be asked for feedback.
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Online | Self::Away)
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Offline => "offline",
        };
        write!(f, "{}", s)
    }
}

/// A synthetic colleague the user chats with and requests reviews from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerPersona {
    /// Stable identifier, unique within the roster.
    pub id: String,
    /// Display name shown on comments and in chat.
    pub name: String,
    /// Role label, e.g. "Engineering Lead" or "Data Analyst".
    pub role: String,
    /// Availability; gates review eligibility.
    #[serde(default)]
    pub status: AvailabilityStatus,
    /// Optional avatar reference for the UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ReviewerPersona {
    pub fn new(id: &str, name: &str, role: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            status: AvailabilityStatus::default(),
            avatar: None,
        }
    }

    pub fn with_status(mut self, status: AvailabilityStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_avatar(mut self, avatar: &str) -> Self {
        self.avatar = Some(avatar.to_string());
        self
    }

    pub fn is_eligible(&self) -> bool {
        self.status.is_eligible()
    }
}

/// The personas from `roster` that may be asked for feedback, in roster
/// order.
pub fn eligible_reviewers(roster: &[ReviewerPersona]) -> Vec<&ReviewerPersona> {
    roster.iter().filter(|p| p.is_eligible()).collect()
}
