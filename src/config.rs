//! Session configuration.
//!
//! Read from a `praxis.toml` next to the exercise assets, with every
//! field optional:
//!
//! ```toml
//! [review]
//! inter_request_delay_ms = 800
//! parallel = false
//! generation_timeout_secs = 120
//!
//! [anchor]
//! policy = "synthetic_fallback"
//! synthetic_excerpt_chars = 30
//! ```

use crate::review::anchor::{AnchorPolicy, DEFAULT_SYNTHETIC_EXCERPT_CHARS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pacing for requests against the generation backend.
const DEFAULT_INTER_REQUEST_DELAY_MS: u64 = 800;
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;

/// How review passes talk to the generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSettings {
    /// Delay between consecutive reviewer requests in sequential mode.
    pub inter_request_delay_ms: u64,
    /// Run reviewer requests concurrently. Comment order stays the
    /// roster order either way.
    pub parallel: bool,
    /// Ceiling on one generation call before it counts as failed.
    pub generation_timeout_secs: u64,
    /// System prompt handed to the backend for review requests.
    pub system_prompt: String,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            inter_request_delay_ms: DEFAULT_INTER_REQUEST_DELAY_MS,
            parallel: false,
            generation_timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            system_prompt: String::new(),
        }
    }
}

/// How extracted feedback is anchored to the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorSettings {
    pub policy: AnchorPolicy,
    pub synthetic_excerpt_chars: usize,
}

impl Default for AnchorSettings {
    fn default() -> Self {
        Self {
            policy: AnchorPolicy::default(),
            synthetic_excerpt_chars: DEFAULT_SYNTHETIC_EXCERPT_CHARS,
        }
    }
}

/// Top-level configuration for one exercise session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub review: ReviewSettings,
    pub anchor: AnchorSettings,
}

impl SessionConfig {
    /// Parse configuration from TOML text. Missing sections and fields
    /// take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse session config TOML")
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn with_parallel_reviews(mut self, parallel: bool) -> Self {
        self.review.parallel = parallel;
        self
    }

    pub fn with_inter_request_delay_ms(mut self, delay_ms: u64) -> Self {
        self.review.inter_request_delay_ms = delay_ms;
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.review.system_prompt = prompt.to_string();
        self
    }

    pub fn with_anchor_policy(mut self, policy: AnchorPolicy) -> Self {
        self.anchor.policy = policy;
        self
    }
}
