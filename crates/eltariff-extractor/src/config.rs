//! Configuration for the Extractor

use eltariff_domain::SourceKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How multiple sources are sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// One extraction per source kind, merged afterwards
    #[default]
    PerSource,
    /// All blocks in a single request
    Combined,
}

/// What to do when sources of equal priority disagree on a normative field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Report the conflict and fail the merge
    #[default]
    Fail,
    /// Keep the first source's value and report the other as an alternative
    FirstWins,
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Corrective retries after malformed output (attempts = 1 + this)
    pub malformed_retries: u32,

    /// Retries per attempt after a retryable transport failure
    pub transport_retries: u32,

    /// First backoff delay (milliseconds), doubled on each retry
    pub backoff_base_ms: u64,

    /// Cap on a single backoff delay (milliseconds)
    pub backoff_max_ms: u64,

    /// Maximum time for a single backend call (milliseconds)
    pub call_timeout_ms: u64,

    /// Output budget per backend call
    pub max_tokens: u32,

    /// Source kinds from highest to lowest merge priority
    pub source_priority: Vec<SourceKind>,

    /// How multiple sources are sent to the model
    pub merge_strategy: MergeStrategy,

    /// Reject text that does not look like a grid tariff before calling the model
    pub require_tariff_keywords: bool,

    /// Policy for equal-priority disagreements
    pub tie_break: TieBreak,
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            malformed_retries: 2,
            transport_retries: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 8_000,
            call_timeout_ms: 120_000,
            max_tokens: 8_192,
            source_priority: SourceKind::ALL.to_vec(),
            merge_strategy: MergeStrategy::PerSource,
            require_tariff_keywords: true,
            tie_break: TieBreak::Fail,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: fewer retries and shorter timeouts for interactive use
    pub fn aggressive() -> Self {
        Self {
            malformed_retries: 1,
            transport_retries: 1,
            backoff_base_ms: 250,
            backoff_max_ms: 2_000,
            call_timeout_ms: 60_000,
            merge_strategy: MergeStrategy::Combined,
            ..Self::default()
        }
    }

    /// Lenient preset: more retries and longer timeouts for batch runs
    pub fn lenient() -> Self {
        Self {
            malformed_retries: 3,
            transport_retries: 5,
            backoff_base_ms: 1_000,
            backoff_max_ms: 30_000,
            call_timeout_ms: 300_000,
            max_tokens: 16_384,
            tie_break: TieBreak::FirstWins,
            ..Self::default()
        }
    }

    /// Get the call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Backoff before transport retry `n` (0-based): `base * 2^n`, capped
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry);
        let millis = self.backoff_base_ms.saturating_mul(factor).min(self.backoff_max_ms);
        Duration::from_millis(millis)
    }

    /// Cap on a single backoff delay
    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    /// Rank of a source kind; lower ranks win. Unlisted kinds rank last.
    pub fn priority_of(&self, kind: SourceKind) -> usize {
        self.source_priority
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.source_priority.len())
    }

    /// Total model attempts per extraction
    pub fn max_attempts(&self) -> u32 {
        1 + self.malformed_retries
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.call_timeout_ms == 0 {
            return Err("call_timeout_ms must be greater than 0".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err("backoff_base_ms cannot exceed backoff_max_ms".to_string());
        }
        for (i, kind) in self.source_priority.iter().enumerate() {
            if self.source_priority[..i].contains(kind) {
                return Err(format!("source_priority lists {} twice", kind));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
