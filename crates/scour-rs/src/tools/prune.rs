//! The manual `prune` tool: batch pruning by numeric id.
//!
//! Arguments arrive as raw JSON from the model. They are validated against
//! the declared schema first, so a malformed request is rejected with a
//! message the model can self-correct from, before any state is touched.

use crate::collect::executor::{CollectOutcome, CollectRequest, collect};
use crate::config::GcConfig;
use crate::json_schema_for;
use crate::listing::resolve_numeric_id;
use crate::notify::PruneReason;
use crate::session::state::SessionState;
use crate::tokens::format_token_count;
use crate::Message;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

/// Tool name registered with the host.
pub const PRUNE_TOOL_NAME: &str = "prune";

/// One-line description registered with the host.
pub const PRUNE_TOOL_DESCRIPTION: &str =
    "Prune completed tool calls from the context window by numeric id from \
     the prunable-tools listing. Optionally supply a distillation that \
     replaces the pruned output.";

/// Arguments accepted by the prune tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PruneArgs {
    /// Entries to prune, each referencing the prunable-tools listing.
    pub items: Vec<PruneItem>,
}

/// One prune entry.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PruneItem {
    /// Numeric id from the prunable-tools listing.
    pub id: String,
    /// Pre-computed distillation that replaces this tool's output.
    #[serde(default)]
    pub distillation: Option<String>,
}

/// JSON Schema for the tool definition sent to the host.
pub fn prune_tool_schema() -> serde_json::Value {
    json_schema_for::<PruneArgs>()
}

/// Validate raw arguments against the declared schema.
///
/// Returns `None` if valid, or `Some(error_string)` formatted for the model
/// to understand and self-correct.
pub fn validate_arguments(arguments: &str) -> Option<String> {
    let args_value: serde_json::Value = match serde_json::from_str(arguments) {
        Ok(v) => v,
        Err(e) => {
            return Some(format!(
                "Error: invalid JSON arguments for tool '{PRUNE_TOOL_NAME}': {e}. \
                 Please provide valid JSON matching the tool's parameter schema."
            ));
        }
    };

    let schema = prune_tool_schema();
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(_) => return None, // If the schema itself is invalid, skip validation.
    };

    let errors: Vec<String> = validator
        .iter_errors(&args_value)
        .map(|e| format!("  - {}: {e}", e.instance_path()))
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(format!(
            "Error: argument validation failed for tool '{PRUNE_TOOL_NAME}':\n{}\n\
             Please fix the arguments and try again.",
            errors.join("\n")
        ))
    }
}

/// Result of a manual prune batch.
#[derive(Debug)]
pub struct PruneOutput {
    /// What the executor reclaimed.
    pub outcome: CollectOutcome,
    /// Call identifiers the batch resolved to (pre-idempotence-filter).
    pub pruned_ids: Vec<String>,
    /// Tool result text for the model.
    pub text: String,
}

/// Execute a manual prune request.
///
/// Malformed input rejects the whole batch before any mutation. Ids that
/// don't resolve through the current listing are dropped; a batch where
/// *every* id drops is an error back to the caller.
pub fn run_prune(
    state: &mut SessionState,
    config: &GcConfig,
    messages: &mut [Message],
    arguments: &str,
    reason: PruneReason,
) -> Result<PruneOutput, String> {
    if let Some(error) = validate_arguments(arguments) {
        return Err(error);
    }
    let args: PruneArgs = serde_json::from_str(arguments)
        .map_err(|e| format!("Error: invalid prune arguments: {e}"))?;

    if args.items.is_empty() {
        return Err("Missing items. Provide at least one { id, distillation } entry.".to_string());
    }
    for item in &args.items {
        if item.id.trim().is_empty() {
            return Err(
                "Each item must have an id (numeric id from the prunable-tools listing)."
                    .to_string(),
            );
        }
    }

    let requests: Vec<CollectRequest> = args
        .items
        .iter()
        .filter_map(|item| {
            let call_id = resolve_numeric_id(&item.id, state)?;
            Some(CollectRequest {
                call_id,
                distillation: item.distillation.clone(),
            })
        })
        .collect();

    if requests.is_empty() {
        return Err(format!(
            "None of the provided ids matched a prunable tool call \
             ({} requested). Re-read the current prunable-tools listing.",
            args.items.len()
        ));
    }
    if requests.len() < args.items.len() {
        debug!(
            "dropped {} unresolvable id(s) from prune request",
            args.items.len() - requests.len()
        );
    }

    let outcome = collect(state, config, messages, &requests, reason.as_str());
    let pruned_ids: Vec<String> = requests.into_iter().map(|r| r.call_id).collect();

    let text = if outcome.tools_pruned == 0 {
        "Nothing new to prune: the requested tool calls were already collected.".to_string()
    } else {
        format!(
            "Pruned {} tool call(s), ~{} tokens reclaimed.",
            outcome.tools_pruned,
            format_token_count(outcome.tokens_saved),
        )
    };

    Ok(PruneOutput {
        outcome,
        pruned_ids,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::executor::PRUNED_OUTPUT_PLACEHOLDER;
    use crate::session::state::ToolCacheEntry;
    use crate::{MessagePart, ToolState, ToolStatus};
    use serde_json::json;

    fn seeded_state() -> SessionState {
        let mut state = SessionState::new();
        for (call_id, tool) in [("call-1", "bash"), ("call-2", "grep")] {
            state.tool_id_list.push(call_id.into());
            state.tool_parameters.insert(
                call_id.into(),
                ToolCacheEntry {
                    tool: tool.into(),
                    parameters: json!({"arg": "value"}),
                    status: ToolStatus::Completed,
                    error_message: None,
                    turn_created: 1,
                    token_count: 10,
                    distillation: None,
                },
            );
        }
        state
    }

    fn seeded_transcript() -> Vec<Message> {
        vec![Message::assistant(
            "m1",
            vec![
                MessagePart::tool(
                    "bash",
                    "call-1",
                    ToolState {
                        status: ToolStatus::Completed,
                        input: json!({"arg": "value"}),
                        output: Some(json!("out-1")),
                        error: None,
                    },
                ),
                MessagePart::tool(
                    "grep",
                    "call-2",
                    ToolState {
                        status: ToolStatus::Completed,
                        input: json!({"arg": "value"}),
                        output: Some(json!("out-2")),
                        error: None,
                    },
                ),
            ],
        )]
    }

    #[test]
    fn prunes_resolved_ids() {
        let mut state = seeded_state();
        let config = GcConfig::default();
        let mut messages = seeded_transcript();

        let output = run_prune(
            &mut state,
            &config,
            &mut messages,
            r#"{"items": [{"id": "0"}, {"id": "1"}]}"#,
            PruneReason::Noise,
        )
        .unwrap();

        assert_eq!(output.outcome.tools_pruned, 2);
        assert_eq!(output.outcome.tokens_saved, 20);
        assert_eq!(output.pruned_ids, vec!["call-1", "call-2"]);
        assert!(output.text.contains("Pruned 2 tool call(s)"));
        assert!(state.is_pruned("call-1") && state.is_pruned("call-2"));
    }

    #[test]
    fn stale_index_is_dropped_without_mutation() {
        let mut state = seeded_state();
        let config = GcConfig::default();
        let mut messages = seeded_transcript();

        let err = run_prune(
            &mut state,
            &config,
            &mut messages,
            r#"{"items": [{"id": "5"}]}"#,
            PruneReason::Noise,
        )
        .unwrap_err();

        assert!(err.contains("None of the provided ids matched"));
        assert!(state.pruned.is_empty());
        assert_eq!(state.stats.total_tools_pruned, 0);
    }

    #[test]
    fn mixed_batch_prunes_only_valid_ids() {
        let mut state = seeded_state();
        let config = GcConfig::default();
        let mut messages = seeded_transcript();

        let output = run_prune(
            &mut state,
            &config,
            &mut messages,
            r#"{"items": [{"id": "9"}, {"id": "0"}]}"#,
            PruneReason::Noise,
        )
        .unwrap();

        assert_eq!(output.outcome.tools_pruned, 1);
        assert!(state.is_pruned("call-1"));
    }

    #[test]
    fn malformed_json_is_rejected_before_mutation() {
        let mut state = seeded_state();
        let config = GcConfig::default();
        let mut messages = seeded_transcript();

        let err = run_prune(
            &mut state,
            &config,
            &mut messages,
            r#"{"items": [{"id": 0}]}"#, // id must be a string
            PruneReason::Noise,
        )
        .unwrap_err();

        assert!(err.contains("argument validation failed"));
        assert!(state.pruned.is_empty());
    }

    #[test]
    fn empty_items_and_empty_id_are_rejected() {
        let mut state = seeded_state();
        let config = GcConfig::default();
        let mut messages = seeded_transcript();

        let err = run_prune(&mut state, &config, &mut messages, r#"{"items": []}"#, PruneReason::Noise)
            .unwrap_err();
        assert!(err.contains("Missing items"));

        let err = run_prune(
            &mut state,
            &config,
            &mut messages,
            r#"{"items": [{"id": "  "}]}"#,
            PruneReason::Noise,
        )
        .unwrap_err();
        assert!(err.contains("must have an id"));
        assert!(state.pruned.is_empty());
    }

    #[test]
    fn distillation_travels_with_its_id() {
        let mut state = seeded_state();
        let config = GcConfig::default();
        let mut messages = seeded_transcript();

        run_prune(
            &mut state,
            &config,
            &mut messages,
            r#"{"items": [{"id": "1", "distillation": "grep found 3 matches in src/"}]}"#,
            PruneReason::Extraction,
        )
        .unwrap();

        let MessagePart::Tool { state: tool_state, .. } = &messages[0].parts[1] else {
            panic!("expected tool part");
        };
        assert_eq!(
            tool_state.output,
            Some(json!("[Distilled: grep found 3 matches in src/]"))
        );
        // The other call is untouched.
        let MessagePart::Tool { state: other, .. } = &messages[0].parts[0] else {
            panic!("expected tool part");
        };
        assert_eq!(other.output, Some(json!("out-1")));
    }

    #[test]
    fn repeat_of_collected_batch_reports_nothing_new() {
        let mut state = seeded_state();
        let config = GcConfig::default();
        let mut messages = seeded_transcript();
        run_prune(&mut state, &config, &mut messages, r#"{"items": [{"id": "0"}]}"#, PruneReason::Noise)
            .unwrap();

        let output = run_prune(
            &mut state,
            &config,
            &mut messages,
            r#"{"items": [{"id": "0"}]}"#,
            PruneReason::Noise,
        )
        .unwrap();

        assert_eq!(output.outcome, CollectOutcome::default());
        assert!(output.text.contains("Nothing new to prune"));
        assert_eq!(state.stats.total_tools_pruned, 1);
    }

    #[test]
    fn schema_declares_required_items() {
        let schema = prune_tool_schema();
        assert_eq!(schema["type"], "object");
        assert!(
            schema["required"]
                .as_array()
                .unwrap()
                .contains(&json!("items"))
        );
    }

    #[test]
    fn output_placeholder_applied_without_distillation() {
        let mut state = seeded_state();
        let config = GcConfig::default();
        let mut messages = seeded_transcript();

        run_prune(&mut state, &config, &mut messages, r#"{"items": [{"id": "0"}]}"#, PruneReason::Noise)
            .unwrap();

        let MessagePart::Tool { state: tool_state, .. } = &messages[0].parts[0] else {
            panic!("expected tool part");
        };
        assert_eq!(tool_state.output, Some(json!(PRUNED_OUTPUT_PLACEHOLDER)));
    }
}
