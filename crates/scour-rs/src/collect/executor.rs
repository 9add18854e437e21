//! Redaction executor: replace tool-call payloads with placeholders.
//!
//! This is the single mutation point for transcript content. Higher-level
//! surfaces (the manual prune tool, the automatic strategies, any distill or
//! compress convenience built on top) pass call identifiers here rather
//! than touching the transcript themselves, which is what keeps collection
//! idempotent and the statistics conserved.
//!
//! Redaction is per-identifier atomic: each identifier's transcript edit and
//! bookkeeping land together, and a skipped identifier never aborts the rest
//! of the batch.

use crate::config::GcConfig;
use crate::policy::{can_prune_input, can_prune_output, is_prunable};
use crate::session::state::SessionState;
use crate::{Message, MessagePart};
use serde_json::Value;
use tracing::{debug, info, trace};

/// Placeholder written over every top-level input field of a pruned call.
pub const PRUNED_INPUT_PLACEHOLDER: &str = "[Pruned input]";

/// Placeholder written over the output of a pruned call.
///
/// Both the executor and the tests reference this constant so they can't
/// drift out of sync.
pub const PRUNED_OUTPUT_PLACEHOLDER: &str =
    "[Output removed to save context - information superseded or no longer needed]";

/// Prefix of a distillation-bearing output replacement.
pub const DISTILLED_PREFIX: &str = "[Distilled: ";

/// One collection request: a call identifier plus an optional caller-supplied
/// distillation that replaces the output instead of the bare placeholder.
#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub call_id: String,
    pub distillation: Option<String>,
}

impl CollectRequest {
    /// Request plain collection of an identifier.
    pub fn id(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            distillation: None,
        }
    }

    /// Request collection with a pre-computed distillation text.
    pub fn distilled(call_id: impl Into<String>, distillation: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            distillation: Some(distillation.into()),
        }
    }
}

/// What one executor batch reclaimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectOutcome {
    pub tools_pruned: u64,
    pub tokens_saved: u64,
}

/// Collect the requested identifiers: redact their transcript parts, mark
/// them pruned, and fold the reclaimed counts into the lifetime stats.
///
/// Skipped without error: identifiers already collected (idempotence),
/// identifiers absent from the cache (logged at debug), and identifiers
/// whose tool admits no form of pruning.
pub fn collect(
    state: &mut SessionState,
    config: &GcConfig,
    messages: &mut [Message],
    requests: &[CollectRequest],
    reason: &str,
) -> CollectOutcome {
    let mut outcome = CollectOutcome::default();

    for request in requests {
        let call_id = request.call_id.as_str();
        if state.is_pruned(call_id) {
            trace!("skipping already-pruned {call_id}");
            continue;
        }
        let Some(entry) = state.tool_parameters.get_mut(call_id) else {
            debug!("skipping unknown tool call {call_id} [{reason}]");
            continue;
        };
        if !is_prunable(&entry.tool, config) {
            debug!("skipping fully protected tool {} ({call_id})", entry.tool);
            continue;
        }

        if let Some(ref distillation) = request.distillation {
            entry.distillation = Some(distillation.clone());
        }
        let token_count = entry.token_count;
        let distillation = entry.distillation.clone();

        redact_call(messages, call_id, config, distillation.as_deref());
        state.pruned.insert(call_id.to_string(), state.current_turn);
        outcome.tools_pruned += 1;
        outcome.tokens_saved += token_count;
    }

    if outcome.tools_pruned > 0 {
        state.stats.total_tools_pruned += outcome.tools_pruned;
        state.stats.total_tokens_saved += outcome.tokens_saved;
        info!(
            "pruned {} tool call(s), ~{} tokens [{reason}]",
            outcome.tools_pruned, outcome.tokens_saved
        );
    }

    outcome
}

/// Re-apply redaction for every identifier already marked pruned.
///
/// The host re-delivers the transcript each turn with original payloads, so
/// prior prunes must be re-applied to the fresh copy. No statistics change
/// here; marking and counting happened when the identifier was collected.
pub fn apply_marked(state: &SessionState, config: &GcConfig, messages: &mut [Message]) {
    for call_id in state.pruned.keys() {
        let distillation = state
            .tool_parameters
            .get(call_id)
            .and_then(|entry| entry.distillation.as_deref());
        redact_call(messages, call_id, config, distillation);
    }
}

/// Redact every transcript part carrying `call_id` (a call may be echoed in
/// more than one entry).
fn redact_call(messages: &mut [Message], call_id: &str, config: &GcConfig, distillation: Option<&str>) {
    for msg in messages.iter_mut() {
        for part in msg.parts.iter_mut() {
            let MessagePart::Tool {
                tool,
                call_id: part_call_id,
                state: tool_state,
            } = part
            else {
                continue;
            };
            if part_call_id.as_str() != call_id {
                continue;
            }

            if can_prune_input(tool, config) {
                redact_input(&mut tool_state.input);
            }
            if can_prune_output(tool, config) {
                let replacement = match distillation {
                    Some(text) => format!("{DISTILLED_PREFIX}{text}]"),
                    None => PRUNED_OUTPUT_PLACEHOLDER.to_string(),
                };
                tool_state.output = Some(Value::String(replacement));
            }
        }
    }
}

/// Replace every top-level field of an input payload with the placeholder.
/// Non-object payloads are replaced wholesale; null stays null.
fn redact_input(input: &mut Value) {
    match input {
        Value::Object(map) => {
            for field in map.values_mut() {
                *field = Value::String(PRUNED_INPUT_PLACEHOLDER.to_string());
            }
        }
        Value::Null => {}
        other => *other = Value::String(PRUNED_INPUT_PLACEHOLDER.to_string()),
    }
}
