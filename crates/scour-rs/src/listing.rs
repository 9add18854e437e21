//! The numbered prunable-tools listing and numeric-id resolution.
//!
//! Manual pruning tools reference tool calls by the numeric index of the
//! listing rather than by raw call identifier. The index is a *snapshot*: a
//! position in `tool_id_list` at the time the listing was built, valid only
//! until the next mutation. Resolution therefore always goes through the
//! current list, and an index that no longer resolves is silently dropped
//! rather than faulting.

use crate::config::GcConfig;
use crate::policy::is_prunable;
use crate::session::state::{SessionState, ToolCacheEntry};
use crate::tokens::format_token_count;
use serde_json::Value;
use tracing::debug;

/// Maximum length of the parameter descriptor in a listing line.
const MAX_DESCRIPTOR_LEN: usize = 60;

/// Build the numbered listing of calls still eligible for manual pruning.
///
/// One line per entry, ascending `tool_id_list` order:
/// `<index>: <tool>, <descriptor> (~<tokens> tokens)`. Entries already
/// collected are omitted. A tool protected from output pruning but opted
/// into input pruning is still listed — listing reflects *any* form of
/// eligibility, not full eligibility.
pub fn build_prunable_list(state: &SessionState, config: &GcConfig) -> String {
    let mut lines = Vec::new();
    for (index, call_id) in state.tool_id_list.iter().enumerate() {
        if state.is_pruned(call_id) {
            continue;
        }
        let Some(entry) = state.tool_parameters.get(call_id) else {
            continue;
        };
        if !entry.status.is_terminal() || !is_prunable(&entry.tool, config) {
            continue;
        }
        lines.push(format!(
            "{index}: {}, {} (~{} tokens)",
            entry.tool,
            describe_parameters(entry),
            format_token_count(entry.token_count),
        ));
    }
    lines.join("\n")
}

/// Resolve one numeric-string id into a call identifier through the
/// *current* list. Returns `None` for anything unparseable or out of range.
pub fn resolve_numeric_id(raw: &str, state: &SessionState) -> Option<String> {
    match raw.trim().parse::<usize>() {
        Ok(index) if index < state.tool_id_list.len() => Some(state.tool_id_list[index].clone()),
        _ => {
            debug!("dropping unresolvable numeric id {raw:?}");
            None
        }
    }
}

/// Resolve a batch of numeric-string ids.
///
/// Invalid numbers and out-of-range indices are dropped, not fatal; a
/// caller holding a stale snapshot must never cause an out-of-range fault.
pub fn resolve_numeric_ids(numeric_ids: &[String], state: &SessionState) -> Vec<String> {
    numeric_ids
        .iter()
        .filter_map(|raw| resolve_numeric_id(raw, state))
        .collect()
}

/// Short human-readable descriptor of a call's parameters.
///
/// Takes the first few fields as `key=value` pairs with long values
/// truncated; non-object payloads render as a truncated literal.
pub(crate) fn describe_parameters(entry: &ToolCacheEntry) -> String {
    let descriptor = match &entry.parameters {
        Value::Object(map) if !map.is_empty() => {
            let parts: Vec<String> = map
                .iter()
                .take(3)
                .map(|(key, value)| format!("{key}={}", shorten_value(value)))
                .collect();
            parts.join(", ")
        }
        Value::Null => "no parameters".to_string(),
        Value::Object(_) => "no parameters".to_string(),
        other => shorten_value(other),
    };
    truncate_chars(&descriptor, MAX_DESCRIPTOR_LEN)
}

fn shorten_value(value: &Value) -> String {
    let rendered = match value {
        Value::String(s) => format!("\"{s}\""),
        other => other.to_string(),
    };
    truncate_chars(&rendered, 40)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
