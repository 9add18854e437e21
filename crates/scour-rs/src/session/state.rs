//! The mutable record of one conversation's pruning history.

use crate::ToolStatus;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Cached metadata for one tool call, keyed by call identifier.
#[derive(Debug, Clone)]
pub struct ToolCacheEntry {
    /// Tool name.
    pub tool: String,
    /// Input payload as last observed (opaque structured value).
    pub parameters: Value,
    /// Lifecycle status as last observed.
    pub status: ToolStatus,
    /// Error message for `status == Error`.
    pub error_message: Option<String>,
    /// Turn at which the call first appeared. Fixed at creation.
    pub turn_created: u64,
    /// Estimated tokens of the combined input+output payload, recomputed
    /// when the call reaches a terminal status.
    pub token_count: u64,
    /// Caller-supplied distillation text, kept so redaction stays
    /// reproducible when the host re-delivers the transcript.
    pub distillation: Option<String>,
}

/// Cumulative, session-lifetime statistics. Increment-only.
///
/// Serialized field names follow the host's statistics boundary format.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_tools_pruned: u64,
    pub total_tokens_saved: u64,
    #[serde(rename = "totalGCTokens")]
    pub total_gc_tokens: u64,
    #[serde(rename = "totalGCTools")]
    pub total_gc_tools: u64,
}

/// Transient stats accumulated by the most recent automatic-strategy pass,
/// consumed and reset by the notification composer after reporting.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcStats {
    pub tokens_collected: u64,
    pub tools_deduped: u64,
}

impl GcStats {
    /// Whether the pass collected anything worth reporting.
    pub fn is_empty(&self) -> bool {
        self.tools_deduped == 0 && self.tokens_collected == 0
    }
}

/// Per-conversation engine state.
///
/// Created at first transcript observation, destroyed when the conversation
/// ends. Exclusively owned by its conversation; the host serializes turns,
/// so no operation here takes a lock.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Opaque session identifier, set once.
    pub session_id: Option<String>,
    /// Call identifiers in first-appearance order, append-only. The index
    /// into this list is the numeric ID exposed to manual pruning tools.
    pub tool_id_list: Vec<String>,
    /// Cache entries keyed by call identifier.
    pub tool_parameters: HashMap<String, ToolCacheEntry>,
    /// Call identifier → turn at which it was pruned. Presence here is the
    /// sole "already collected" signal.
    pub pruned: HashMap<String, u64>,
    /// Monotone turn counter, incremented per turn-boundary marker.
    pub current_turn: u64,
    /// Completed tool calls since the last nudge reset.
    pub nudge_counter: u64,
    /// Lifetime statistics.
    pub stats: SessionStats,
    /// Pending automatic-collection stats awaiting the next notification.
    pub gc_pending: GcStats,
}

impl SessionState {
    /// Create empty state for a new conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the session identifier on first observation. Later calls with
    /// a different id are ignored; the id is immutable once set.
    pub fn observe_session(&mut self, session_id: &str) {
        if self.session_id.is_none() {
            self.session_id = Some(session_id.to_string());
        }
    }

    /// Whether the identifier has already been collected.
    pub fn is_pruned(&self, call_id: &str) -> bool {
        self.pruned.contains_key(call_id)
    }

    /// Take the pending automatic-collection stats, leaving zeroes behind.
    pub fn take_gc_pending(&mut self) -> GcStats {
        std::mem::take(&mut self.gc_pending)
    }
}
