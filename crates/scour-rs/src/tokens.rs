//! Token estimation for opaque tool payloads.
//!
//! The real tokenizer lives in the host; the engine only needs a fast local
//! approximation to price what a prune would reclaim. Character count over
//! the serialized payload divided by a chars-per-token ratio is accurate
//! enough for that, and costs nothing.

use serde_json::Value;

/// Default characters per token (conservative estimate for English text).
/// Most tokenizers average 3-4 chars per token; we use 3.5 as a middle ground.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.5;

/// Estimates token counts from serialized payload sizes.
#[derive(Debug, Clone, Copy)]
pub struct TokenEstimator {
    chars_per_token: f64,
}

impl TokenEstimator {
    /// Create an estimator with the given chars-per-token ratio.
    /// Ratios at or below zero fall back to the default.
    pub fn new(chars_per_token: f64) -> Self {
        let ratio = if chars_per_token > 0.0 {
            chars_per_token
        } else {
            DEFAULT_CHARS_PER_TOKEN
        };
        Self {
            chars_per_token: ratio,
        }
    }

    /// Estimate tokens for a text fragment.
    pub fn estimate_str(&self, text: &str) -> u64 {
        (text.len() as f64 / self.chars_per_token) as u64
    }

    /// Estimate tokens for an opaque structured value.
    pub fn estimate_value(&self, value: &Value) -> u64 {
        if value.is_null() {
            return 0;
        }
        let chars = serde_json::to_string(value).map_or(0, |s| s.len());
        (chars as f64 / self.chars_per_token) as u64
    }

    /// Estimate tokens for a tool call's combined input+output payload.
    pub fn estimate_payload(&self, input: &Value, output: Option<&Value>) -> u64 {
        self.estimate_value(input) + output.map_or(0, |o| self.estimate_value(o))
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }
}

/// Format a token count for display: `950`, `1.2k`, `3.4M`.
pub fn format_token_count(tokens: u64) -> String {
    if tokens < 1_000 {
        tokens.to_string()
    } else if tokens < 1_000_000 {
        trim_decimal(tokens as f64 / 1_000.0, "k")
    } else {
        trim_decimal(tokens as f64 / 1_000_000.0, "M")
    }
}

/// One decimal place, with `.0` dropped: `1.2k`, `12k`.
fn trim_decimal(value: f64, suffix: &str) -> String {
    let rendered = format!("{value:.1}");
    let rendered = rendered.strip_suffix(".0").unwrap_or(&rendered);
    format!("{rendered}{suffix}")
}
