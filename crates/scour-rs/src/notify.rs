//! Pruning summaries and the host notification boundary.
//!
//! The engine never talks to the host's messaging API directly. It composes
//! summary text from session statistics, and hands it to a caller-provided
//! [`NotificationSink`] as a fire-and-forget side effect *after* all state
//! mutation has completed. A failed send is logged and never rolls back a
//! redaction.

use crate::collect::executor::CollectOutcome;
use crate::config::{GcConfig, SummaryMode};
use crate::listing::describe_parameters;
use crate::session::state::SessionState;
use crate::tokens::format_token_count;
use crate::{Message, Role};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::warn;

// ── Prune reasons ──────────────────────────────────────────────────

/// Why a batch of tool calls was pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneReason {
    /// The task the calls served is complete.
    Completion,
    /// The calls were noise (failed probes, dead ends).
    Noise,
    /// Several calls were consolidated into fewer survivors.
    Consolidation,
    /// Outputs were replaced by caller-supplied distillations.
    Extraction,
}

impl PruneReason {
    /// Machine tag, used as the executor's reason string.
    pub fn as_str(self) -> &'static str {
        match self {
            PruneReason::Completion => "completion",
            PruneReason::Noise => "noise",
            PruneReason::Consolidation => "consolidation",
            PruneReason::Extraction => "extraction",
        }
    }

    /// Human label for summaries.
    pub fn label(self) -> &'static str {
        match self {
            PruneReason::Completion => "Task Complete",
            PruneReason::Noise => "Noise Removal",
            PruneReason::Consolidation => "Consolidation",
            PruneReason::Extraction => "Extraction",
        }
    }
}

impl std::fmt::Display for PruneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Sink boundary ──────────────────────────────────────────────────

/// Boxed future returned by [`NotificationSink::send`].
///
/// Type alias to keep trait signatures and implementations readable.
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>>;

/// Host-provided channel for delivering summary text back into the
/// conversation (as an ignored message, a toast; the engine doesn't care).
pub trait NotificationSink: Send + Sync {
    fn send(&self, session_id: &str, agent: Option<&str>, text: &str) -> SinkFuture<'_>;
}

/// Find the agent owning the conversation by scanning backward for the most
/// recent user message. Hosts that don't track agents get the default.
pub fn find_current_agent(messages: &[Message]) -> Option<String> {
    messages.iter().rev().find_map(|msg| {
        (msg.info.role == Role::User)
            .then(|| msg.info.agent.clone().unwrap_or_else(|| "build".to_string()))
    })
}

// ── Composer ───────────────────────────────────────────────────────

/// Compose the pruning summary for what just happened, consuming the
/// session's pending automatic-collection stats.
///
/// `outcome` covers an explicit executor batch (manual prune), if any; the
/// pending `gc_pending` covers the automatic pass. Returns `None` when there
/// is nothing to report or summaries are off. Consumed pending stats roll
/// into the lifetime `total_gc_*` counters either way.
pub fn compose_summary(
    state: &mut SessionState,
    config: &GcConfig,
    outcome: CollectOutcome,
    reason: Option<PruneReason>,
    pruned_ids: &[String],
) -> Option<String> {
    let item_lines: Vec<String> = pruned_ids
        .iter()
        .filter_map(|call_id| state.tool_parameters.get(call_id))
        .map(|entry| format!("- {}: {}", entry.tool, describe_parameters(entry)))
        .collect();

    let gc = state.take_gc_pending();
    state.stats.total_gc_tokens += gc.tokens_collected;
    state.stats.total_gc_tools += gc.tools_deduped;

    if outcome.tools_pruned == 0 && gc.tools_deduped == 0 {
        return None;
    }
    if config.summary == SummaryMode::Off {
        return None;
    }

    let total = format_token_count(state.stats.total_tokens_saved);
    let header = format!("▣ scour | ~{total} saved total");

    match config.summary {
        SummaryMode::Off => None,
        SummaryMode::Minimal => {
            let suffix = reason.map(|r| format!(" [{}]", r.label())).unwrap_or_default();
            Some(format!("{header}{suffix}"))
        }
        SummaryMode::Detailed => {
            let just_now = format_token_count(outcome.tokens_saved + gc.tokens_collected);
            let label = reason.map(|r| format!(" — {}", r.label())).unwrap_or_default();
            let mut text = format!("{header}\n\n▣ Pruned tools (~{just_now}){label}");
            if !item_lines.is_empty() {
                text.push('\n');
                text.push_str(&item_lines.join("\n"));
            }
            Some(text)
        }
    }
}

/// Dispatch summary text through the sink, fire-and-forget.
///
/// Must be called within a tokio runtime. The returned handle is only
/// useful for tests; production callers drop it.
pub fn dispatch(
    sink: &Arc<dyn NotificationSink>,
    session_id: &str,
    agent: Option<String>,
    text: String,
) -> tokio::task::JoinHandle<()> {
    let sink = Arc::clone(sink);
    let session_id = session_id.to_string();
    tokio::spawn(async move {
        if let Err(e) = sink.send(&session_id, agent.as_deref(), &text).await {
            warn!("failed to send pruning summary: {e}");
        }
    })
}
