//! Automatic collection strategies.
//!
//! Three independent, order-insensitive passes over the session cache, each
//! proposing call identifiers for the executor:
//!
//! - **Deduplication** — repeated identical calls keep only the most recent
//!   result; earlier copies carry nothing the last one doesn't.
//! - **Supersede-writes** — a write whose target resource was overwritten by
//!   a strictly later write has an output of no further value. Targets are
//!   compared by exact string equality.
//! - **Purge-stale-errors** — failed calls older than a configured number of
//!   turns are unlikely to be retried verbatim.
//!
//! Each strategy is individually toggleable, never proposes an identifier
//! that is already collected, and respects the optional turn-protection
//! recency shield. Reclaimed counts fold into the session's `gc_pending`
//! for the next notification; lifetime stats stay the executor's job.

use crate::collect::executor::{CollectRequest, collect};
use crate::config::GcConfig;
use crate::policy::is_prunable;
use crate::session::state::{GcStats, SessionState, ToolCacheEntry};
use crate::{Message, ToolStatus};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Run every enabled strategy and collect what they propose.
///
/// Returns this pass's stats; the same counts are folded into
/// `state.gc_pending` for the notification composer.
pub fn run_automatic_pass(
    state: &mut SessionState,
    config: &GcConfig,
    messages: &mut [Message],
) -> GcStats {
    let mut pass = GcStats::default();

    if config.strategies.deduplication.enabled {
        let candidates = dedupe_candidates(state, config);
        fold(&mut pass, state, config, messages, candidates, "dedupe");
    }
    if config.strategies.supersede_writes.enabled {
        let candidates = supersede_write_candidates(state, config);
        fold(&mut pass, state, config, messages, candidates, "supersede-write");
    }
    if config.strategies.purge_errors.enabled {
        let candidates = stale_error_candidates(state, config);
        fold(&mut pass, state, config, messages, candidates, "stale-error");
    }

    if !pass.is_empty() {
        state.gc_pending.tokens_collected += pass.tokens_collected;
        state.gc_pending.tools_deduped += pass.tools_deduped;
        debug!(
            "automatic pass collected {} call(s), ~{} tokens",
            pass.tools_deduped, pass.tokens_collected
        );
    }

    pass
}

fn fold(
    pass: &mut GcStats,
    state: &mut SessionState,
    config: &GcConfig,
    messages: &mut [Message],
    candidates: Vec<String>,
    reason: &str,
) {
    if candidates.is_empty() {
        return;
    }
    let requests: Vec<CollectRequest> = candidates.into_iter().map(CollectRequest::id).collect();
    let outcome = collect(state, config, messages, &requests, reason);
    pass.tokens_collected += outcome.tokens_saved;
    pass.tools_deduped += outcome.tools_pruned;
}

/// Whether the recency shield blocks automatic collection of this entry.
fn turn_protected(state: &SessionState, config: &GcConfig, entry: &ToolCacheEntry) -> bool {
    config.turn_protection.enabled
        && state.current_turn.saturating_sub(entry.turn_created) < config.turn_protection.turns
}

/// Common candidate filter: collectable by some axis, not already pruned,
/// not shielded by recency.
fn collectable(state: &SessionState, config: &GcConfig, call_id: &str, entry: &ToolCacheEntry) -> bool {
    !state.is_pruned(call_id)
        && is_prunable(&entry.tool, config)
        && !turn_protected(state, config, entry)
}

/// Canonical form of a parameter payload for duplicate grouping.
///
/// `serde_json` maps serialize with sorted keys, so parameter sets that
/// differ only in field order normalize to the same string.
fn canonical_parameters(parameters: &Value) -> String {
    serde_json::to_string(parameters).unwrap_or_default()
}

/// Deduplication: in every group of completed calls sharing
/// `(tool, normalized parameters)`, all but the most recent are candidates.
pub fn dedupe_candidates(state: &SessionState, config: &GcConfig) -> Vec<String> {
    let dedupe = &config.strategies.deduplication.config;
    let mut groups: HashMap<(String, String), Vec<usize>> = HashMap::new();

    for (index, call_id) in state.tool_id_list.iter().enumerate() {
        let Some(entry) = state.tool_parameters.get(call_id) else {
            continue;
        };
        if entry.status != ToolStatus::Completed {
            continue;
        }
        if dedupe.protected_tools.contains(&entry.tool) {
            continue;
        }
        let key = (entry.tool.clone(), canonical_parameters(&entry.parameters));
        groups.entry(key).or_default().push(index);
    }

    let mut candidates = Vec::new();
    for indices in groups.values() {
        if indices.len() < 2 {
            continue;
        }
        // Most recent = last in first-appearance order; keep it.
        for &index in &indices[..indices.len() - 1] {
            let call_id = &state.tool_id_list[index];
            let entry = &state.tool_parameters[call_id];
            if collectable(state, config, call_id, entry) {
                candidates.push((index, call_id.clone()));
            }
        }
    }
    candidates.sort_by_key(|(index, _)| *index);
    candidates.into_iter().map(|(_, id)| id).collect()
}

/// Supersede-writes: among completed writes addressing the same target
/// resource, every write before the last is a candidate.
pub fn supersede_write_candidates(state: &SessionState, config: &GcConfig) -> Vec<String> {
    let targets = &config.strategies.supersede_writes.config.targets;
    let mut by_target: HashMap<String, Vec<usize>> = HashMap::new();

    for (index, call_id) in state.tool_id_list.iter().enumerate() {
        let Some(entry) = state.tool_parameters.get(call_id) else {
            continue;
        };
        if entry.status != ToolStatus::Completed {
            continue;
        }
        let Some(target_param) = targets.get(&entry.tool) else {
            continue;
        };
        let Some(target) = entry.parameters.get(target_param).and_then(Value::as_str) else {
            continue;
        };
        by_target.entry(target.to_string()).or_default().push(index);
    }

    let mut candidates = Vec::new();
    for indices in by_target.values() {
        if indices.len() < 2 {
            continue;
        }
        for &index in &indices[..indices.len() - 1] {
            let call_id = &state.tool_id_list[index];
            let entry = &state.tool_parameters[call_id];
            if collectable(state, config, call_id, entry) {
                candidates.push((index, call_id.clone()));
            }
        }
    }
    candidates.sort_by_key(|(index, _)| *index);
    candidates.into_iter().map(|(_, id)| id).collect()
}

/// Purge-stale-errors: failed calls more than `turns` turns old.
pub fn stale_error_candidates(state: &SessionState, config: &GcConfig) -> Vec<String> {
    let purge = &config.strategies.purge_errors.config;
    state
        .tool_id_list
        .iter()
        .filter(|call_id| {
            let Some(entry) = state.tool_parameters.get(*call_id) else {
                return false;
            };
            entry.status == ToolStatus::Error
                && state.current_turn.saturating_sub(entry.turn_created) > purge.turns
                && !purge.protected_tools.contains(&entry.tool)
                && collectable(state, config, call_id, entry)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Toggle;
    use crate::session::state::ToolCacheEntry;
    use serde_json::json;

    fn entry(tool: &str, parameters: Value, status: ToolStatus, turn_created: u64) -> ToolCacheEntry {
        ToolCacheEntry {
            tool: tool.into(),
            parameters,
            status,
            error_message: None,
            turn_created,
            token_count: 10,
            distillation: None,
        }
    }

    fn push(state: &mut SessionState, call_id: &str, cache_entry: ToolCacheEntry) {
        state.tool_id_list.push(call_id.into());
        state.tool_parameters.insert(call_id.into(), cache_entry);
    }

    #[test]
    fn dedupe_keeps_most_recent_of_identical_calls() {
        let mut state = SessionState::new();
        let config = GcConfig::default();
        push(&mut state, "call-1", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 1));
        push(&mut state, "call-2", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 2));

        let candidates = dedupe_candidates(&state, &config);
        assert_eq!(candidates, vec!["call-1"]);
    }

    #[test]
    fn dedupe_normalizes_parameter_field_order() {
        let mut state = SessionState::new();
        let config = GcConfig::default();
        push(
            &mut state,
            "call-1",
            entry("grep", json!({"pattern": "x", "path": "src"}), ToolStatus::Completed, 1),
        );
        push(
            &mut state,
            "call-2",
            entry("grep", json!({"path": "src", "pattern": "x"}), ToolStatus::Completed, 2),
        );

        let candidates = dedupe_candidates(&state, &config);
        assert_eq!(candidates, vec!["call-1"]);
    }

    #[test]
    fn dedupe_ignores_distinct_parameters_and_pending_calls() {
        let mut state = SessionState::new();
        let config = GcConfig::default();
        push(&mut state, "call-1", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 1));
        push(&mut state, "call-2", entry("read", json!({"filePath": "b.rs"}), ToolStatus::Completed, 2));
        push(&mut state, "call-3", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Running, 3));

        assert!(dedupe_candidates(&state, &config).is_empty());
    }

    #[test]
    fn dedupe_respects_its_own_protected_list() {
        let mut state = SessionState::new();
        let mut config = GcConfig::default();
        config
            .strategies
            .deduplication
            .config
            .protected_tools
            .insert("read".into());
        push(&mut state, "call-1", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 1));
        push(&mut state, "call-2", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 2));

        assert!(dedupe_candidates(&state, &config).is_empty());
    }

    #[test]
    fn supersede_collects_overwritten_write() {
        // Assumption under test: targets match by exact path equality.
        let mut state = SessionState::new();
        let config = GcConfig::default();
        push(&mut state, "call-1", entry("write", json!({"filePath": "src/a.rs"}), ToolStatus::Completed, 1));
        push(&mut state, "call-2", entry("write", json!({"filePath": "src/a.rs"}), ToolStatus::Completed, 2));
        push(&mut state, "call-3", entry("write", json!({"filePath": "src/b.rs"}), ToolStatus::Completed, 3));

        let candidates = supersede_write_candidates(&state, &config);
        assert_eq!(candidates, vec!["call-1"]);
    }

    #[test]
    fn supersede_exact_match_does_not_cross_prefixes() {
        let mut state = SessionState::new();
        let config = GcConfig::default();
        push(&mut state, "call-1", entry("write", json!({"filePath": "src/a.rs"}), ToolStatus::Completed, 1));
        push(&mut state, "call-2", entry("write", json!({"filePath": "src/a.rs.bak"}), ToolStatus::Completed, 2));

        assert!(supersede_write_candidates(&state, &config).is_empty());
    }

    #[test]
    fn supersede_ignores_failed_writes() {
        let mut state = SessionState::new();
        let config = GcConfig::default();
        push(&mut state, "call-1", entry("write", json!({"filePath": "a.rs"}), ToolStatus::Error, 1));
        push(&mut state, "call-2", entry("write", json!({"filePath": "a.rs"}), ToolStatus::Completed, 2));

        assert!(supersede_write_candidates(&state, &config).is_empty());
    }

    #[test]
    fn stale_errors_age_out_after_configured_turns() {
        let mut state = SessionState::new();
        state.current_turn = 10;
        let config = GcConfig::default(); // purge after 4 turns
        push(&mut state, "call-old", entry("webfetch", json!({"url": "u"}), ToolStatus::Error, 2));
        push(&mut state, "call-recent", entry("webfetch", json!({"url": "v"}), ToolStatus::Error, 8));

        let candidates = stale_error_candidates(&state, &config);
        assert_eq!(candidates, vec!["call-old"]);
    }

    #[test]
    fn stale_errors_respect_strategy_protection() {
        let mut state = SessionState::new();
        state.current_turn = 10;
        let mut config = GcConfig::default();
        config
            .strategies
            .purge_errors
            .config
            .protected_tools
            .insert("webfetch".into());
        push(&mut state, "call-old", entry("webfetch", json!({"url": "u"}), ToolStatus::Error, 2));

        assert!(stale_error_candidates(&state, &config).is_empty());
    }

    #[test]
    fn strategies_never_propose_collected_ids() {
        let mut state = SessionState::new();
        let config = GcConfig::default();
        push(&mut state, "call-1", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 1));
        push(&mut state, "call-2", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 2));
        state.pruned.insert("call-1".into(), 3);

        assert!(dedupe_candidates(&state, &config).is_empty());
    }

    #[test]
    fn turn_protection_shields_recent_calls() {
        let mut state = SessionState::new();
        state.current_turn = 5;
        let config = GcConfig::default().with_turn_protection(4);
        push(&mut state, "call-1", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 3));
        push(&mut state, "call-2", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 4));

        assert!(dedupe_candidates(&state, &config).is_empty());
    }

    #[test]
    fn automatic_pass_folds_into_gc_pending() {
        let mut state = SessionState::new();
        let config = GcConfig::default();
        push(&mut state, "call-1", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 1));
        push(&mut state, "call-2", entry("read", json!({"filePath": "a.rs"}), ToolStatus::Completed, 2));
        let mut messages: Vec<Message> = Vec::new();

        let pass = run_automatic_pass(&mut state, &config, &mut messages);

        assert_eq!(pass.tools_deduped, 1);
        assert_eq!(pass.tokens_collected, 10);
        assert_eq!(state.gc_pending.tools_deduped, 1);
        assert_eq!(state.gc_pending.tokens_collected, 10);
        assert!(state.is_pruned("call-1"));
        assert!(!state.is_pruned("call-2"));
    }

    #[test]
    fn disabled_strategies_contribute_nothing() {
        let mut state = SessionState::new();
        state.current_turn = 10;
        let mut config = GcConfig::default();
        config.strategies.deduplication = Toggle::disabled();
        config.strategies.supersede_writes = Toggle::disabled();
        config.strategies.purge_errors = Toggle::disabled();

        push(&mut state, "call-1", entry("read", json!({"p": 1}), ToolStatus::Completed, 1));
        push(&mut state, "call-2", entry("read", json!({"p": 1}), ToolStatus::Completed, 2));
        push(&mut state, "call-3", entry("webfetch", json!({"url": "u"}), ToolStatus::Error, 1));
        let mut messages: Vec<Message> = Vec::new();

        let pass = run_automatic_pass(&mut state, &config, &mut messages);
        assert!(pass.is_empty());
        assert!(state.pruned.is_empty());
    }
}
