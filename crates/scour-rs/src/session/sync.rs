//! Cache synchronization: walk a host-delivered transcript and fold every
//! tool-call part into the session state.
//!
//! The host re-delivers the full transcript each turn, so the walk must be
//! idempotent over everything it has already seen: re-observing an unchanged
//! entry never double-counts the nudge counter and never re-estimates its
//! tokens. The transcript itself is read-only here; all side effects land in
//! [`SessionState`].

use crate::config::GcConfig;
use crate::session::state::{SessionState, ToolCacheEntry};
use crate::tokens::TokenEstimator;
use crate::{Message, MessagePart, ToolState, ToolStatus};
use tracing::trace;

/// Walk `messages` in order and update the session's tool cache.
///
/// Turn-boundary parts advance the turn counter before any later part is
/// processed, so a tool call appearing after the boundary is stamped with
/// the new turn. The counter is recomputed from the walk and clamped
/// monotone, which makes repeated syncs over append-only transcripts safe.
pub fn sync_tool_cache(state: &mut SessionState, config: &GcConfig, messages: &[Message]) {
    let estimator = TokenEstimator::new(config.chars_per_token);
    let mut turn = 0u64;

    for msg in messages {
        for part in &msg.parts {
            match part {
                MessagePart::StepStart => {
                    turn += 1;
                    if turn > state.current_turn {
                        state.current_turn = turn;
                    }
                }
                MessagePart::Tool {
                    tool,
                    call_id,
                    state: tool_state,
                } => {
                    observe_tool_part(state, &estimator, tool, call_id, tool_state);
                }
                _ => {}
            }
        }
    }
}

/// Fold one tool part into the cache.
fn observe_tool_part(
    state: &mut SessionState,
    estimator: &TokenEstimator,
    tool: &str,
    call_id: &str,
    tool_state: &ToolState,
) {
    let newly_completed;

    match state.tool_parameters.get_mut(call_id) {
        Some(entry) => {
            newly_completed =
                tool_state.status == ToolStatus::Completed && entry.status != ToolStatus::Completed;
            let status_changed = entry.status != tool_state.status;
            if status_changed {
                entry.status = tool_state.status;
                entry.parameters = tool_state.input.clone();
                if tool_state.status.is_terminal() {
                    entry.token_count =
                        estimator.estimate_payload(&tool_state.input, tool_state.output.as_ref());
                    entry.error_message = tool_state.error.clone();
                }
            }
        }
        None => {
            newly_completed = tool_state.status == ToolStatus::Completed;
            let token_count = if tool_state.status.is_terminal() {
                estimator.estimate_payload(&tool_state.input, tool_state.output.as_ref())
            } else {
                0
            };
            state.tool_id_list.push(call_id.to_string());
            state.tool_parameters.insert(
                call_id.to_string(),
                ToolCacheEntry {
                    tool: tool.to_string(),
                    parameters: tool_state.input.clone(),
                    status: tool_state.status,
                    error_message: tool_state.error.clone(),
                    turn_created: state.current_turn,
                    token_count,
                    distillation: None,
                },
            );
            trace!("cached tool call {call_id} ({tool}) at turn {}", state.current_turn);
        }
    }

    if newly_completed {
        state.nudge_counter += 1;
    }
}
