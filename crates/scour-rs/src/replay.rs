//! Offline transcript replay.
//!
//! Loads a recorded transcript (a JSON array of messages in the host's wire
//! format) and runs one engine turn over it, exactly as if the host had just
//! delivered it. Useful for inspecting what the automatic strategies would
//! collect from a real session, and for sizing the prunable backlog, without
//! a live conversation.

use crate::Message;
use crate::config::GcConfig;
use crate::engine::process_turn;
use crate::listing::build_prunable_list;
use crate::session::state::{GcStats, SessionState, SessionStats};
use crate::tokens::format_token_count;
use std::path::Path;

/// What a replay run observed and collected.
#[derive(Debug)]
pub struct ReplayReport {
    /// Tool calls observed in the transcript.
    pub tool_calls: usize,
    /// Turn boundaries observed.
    pub turns: u64,
    /// What the automatic strategies collected.
    pub gc: GcStats,
    /// Lifetime stats after the single pass.
    pub stats: SessionStats,
    /// The prunable-tools listing as it stands after the pass.
    pub prunable: String,
}

impl ReplayReport {
    /// Render the report for terminal output.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{} tool call(s) across {} turn(s)\n\
             automatic collection: {} call(s), ~{} tokens\n\
             lifetime saved: ~{} tokens",
            self.tool_calls,
            self.turns,
            self.gc.tools_deduped,
            format_token_count(self.gc.tokens_collected),
            format_token_count(self.stats.total_tokens_saved),
        );
        if self.prunable.is_empty() {
            out.push_str("\nnothing further is prunable");
        } else {
            out.push_str("\nprunable now:\n");
            out.push_str(&self.prunable);
        }
        out
    }
}

/// Load a transcript file (JSON array of messages).
pub fn load_transcript(path: &Path) -> Result<Vec<Message>, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read transcript {}: {e}", path.display()))?;
    serde_json::from_str(&json)
        .map_err(|e| format!("Failed to parse transcript {}: {e}", path.display()))
}

/// Load an engine config file (JSON document in the host's config format).
pub fn load_config(path: &Path) -> Result<GcConfig, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&json).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

/// Run one engine turn over the transcript and report.
///
/// The transcript is mutated in place; pass [`load_transcript`]'s result
/// and serialize it afterwards to see the redacted form.
pub fn replay(messages: &mut [Message], config: &GcConfig) -> ReplayReport {
    let mut state = SessionState::new();
    let outcome = process_turn(&mut state, config, messages);
    ReplayReport {
        tool_calls: state.tool_id_list.len(),
        turns: state.current_turn,
        gc: outcome.gc,
        stats: state.stats,
        prunable: build_prunable_list(&state, config),
    }
}
