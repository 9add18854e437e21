//! Configuration surface consumed by the engine.
//!
//! The host validates and loads configuration; this module only defines the
//! shape the engine consumes. Field names follow the host's camelCase config
//! format, and every field carries a default so a partial config document
//! deserializes cleanly.
//!
//! # Examples
//!
//! Minimal configuration — everything uses defaults:
//!
//! ```ignore
//! let config = GcConfig::default();
//! ```
//!
//! Customized configuration with builder methods:
//!
//! ```ignore
//! let config = GcConfig::default()
//!     .protect_tool("task")
//!     .allow_prune_input("task")
//!     .with_nudge_frequency(5);
//! ```
//!
//! Disabling a strategy via struct fields:
//!
//! ```ignore
//! let mut config = GcConfig::default();
//! config.strategies.supersede_writes = Toggle::disabled();
//! ```

use crate::tokens::DEFAULT_CHARS_PER_TOKEN;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ── Generic toggle ────────────────────────────────────────────────

/// Generic enabled/disabled wrapper for strategy configurations.
///
/// Captures the common pattern of `{ enabled: bool, ...config }` used by
/// every automatic collection strategy. When `enabled` is `false`, the
/// strategy contributes no candidates regardless of the inner config values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toggle<T: Default> {
    /// Whether this strategy is active.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Strategy-specific configuration.
    #[serde(flatten)]
    pub config: T,
}

impl<T: Default> Toggle<T> {
    /// Create a disabled instance with default inner config.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            config: T::default(),
        }
    }
}

impl<T: Default> Default for Toggle<T> {
    fn default() -> Self {
        Self {
            enabled: true,
            config: T::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

// ── Strategy configs ──────────────────────────────────────────────

/// Deduplication strategy: collapse repeated identical calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupeConfig {
    /// Tools the deduplication pass never collects, independent of the
    /// engine-wide protected set.
    #[serde(default)]
    pub protected_tools: HashSet<String>,
}

/// Supersede-writes strategy: collect writes whose target was overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupersedeConfig {
    /// Write-type tools and the input parameter naming their target
    /// resource. Targets are compared by exact string equality.
    #[serde(default = "default_write_targets")]
    pub targets: HashMap<String, String>,
}

impl Default for SupersedeConfig {
    fn default() -> Self {
        Self {
            targets: default_write_targets(),
        }
    }
}

fn default_write_targets() -> HashMap<String, String> {
    HashMap::from([("write".to_string(), "filePath".to_string())])
}

/// Purge-stale-errors strategy: collect old failed calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeErrorsConfig {
    /// How many turns an errored call must age before it is purged.
    #[serde(default = "default_purge_turns")]
    pub turns: u64,
    /// Tools the purge pass never collects.
    #[serde(default)]
    pub protected_tools: HashSet<String>,
}

impl Default for PurgeErrorsConfig {
    fn default() -> Self {
        Self {
            turns: default_purge_turns(),
            protected_tools: HashSet::new(),
        }
    }
}

fn default_purge_turns() -> u64 {
    4
}

/// The three automatic collection strategies, individually toggleable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategies {
    #[serde(default)]
    pub deduplication: Toggle<DedupeConfig>,
    #[serde(default)]
    pub supersede_writes: Toggle<SupersedeConfig>,
    #[serde(default)]
    pub purge_errors: Toggle<PurgeErrorsConfig>,
}

// ── Turn protection ───────────────────────────────────────────────

/// Recency shield: tool calls created within the last `turns` turns are
/// never collected by the automatic strategies. Manual prune requests are
/// unaffected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnProtection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_purge_turns")]
    pub turns: u64,
}

impl Default for TurnProtection {
    fn default() -> Self {
        Self {
            enabled: false,
            turns: default_purge_turns(),
        }
    }
}

// ── Summary mode ──────────────────────────────────────────────────

/// How much detail the pruning summary notification carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    /// No notifications.
    Off,
    /// One-line stats header.
    #[default]
    Minimal,
    /// Stats header plus a per-item list of what was pruned.
    Detailed,
}

// ── Main config ───────────────────────────────────────────────────

/// Engine configuration, validated and supplied by the host.
///
/// Two construction patterns are supported: builder methods for the settings
/// callers routinely customise, and direct struct-field access for strategy
/// internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GcConfig {
    /// Tools whose output must never be pruned.
    pub protected_tools: HashSet<String>,
    /// Explicit opt-in list of tools whose *input* may be redacted,
    /// independent of protection status.
    pub allow_prune_inputs: HashSet<String>,
    /// Context window size in tokens, for reporting.
    pub context_limit: u64,
    /// Completed tool calls between periodic pruning reminders.
    /// `0` disables nudging.
    pub nudge_frequency: u64,
    /// Pruning summary verbosity.
    pub summary: SummaryMode,
    /// Characters-per-token ratio for the token estimator.
    pub chars_per_token: f64,
    /// Recency shield for the automatic strategies.
    pub turn_protection: TurnProtection,
    /// Automatic collection strategies.
    pub strategies: Strategies,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            protected_tools: HashSet::new(),
            allow_prune_inputs: HashSet::new(),
            context_limit: 100_000,
            nudge_frequency: 10,
            summary: SummaryMode::default(),
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            turn_protection: TurnProtection::default(),
            strategies: Strategies::default(),
        }
    }
}

impl GcConfig {
    /// Add a tool whose output must never be pruned.
    pub fn protect_tool(mut self, name: impl Into<String>) -> Self {
        self.protected_tools.insert(name.into());
        self
    }

    /// Opt a tool into input redaction.
    pub fn allow_prune_input(mut self, name: impl Into<String>) -> Self {
        self.allow_prune_inputs.insert(name.into());
        self
    }

    /// Set the context window size in tokens.
    pub fn with_context_limit(mut self, tokens: u64) -> Self {
        self.context_limit = tokens;
        self
    }

    /// Set the nudge frequency. Pass `0` to disable nudging.
    pub fn with_nudge_frequency(mut self, completions: u64) -> Self {
        self.nudge_frequency = completions;
        self
    }

    /// Set the summary verbosity.
    pub fn with_summary(mut self, mode: SummaryMode) -> Self {
        self.summary = mode;
        self
    }

    /// Enable the turn-protection recency shield.
    pub fn with_turn_protection(mut self, turns: u64) -> Self {
        self.turn_protection = TurnProtection {
            enabled: true,
            turns,
        };
        self
    }
}
