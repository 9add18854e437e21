//! Per-turn orchestration.
//!
//! The host invokes [`process_turn`] synchronously once per conversation
//! turn with the freshly delivered transcript. The sequence is fixed:
//!
//! 1. sync the tool cache ([`session::sync`](crate::session::sync)),
//! 2. re-apply redactions for everything already collected,
//! 3. run the automatic collection strategies,
//! 4. compose a summary of automatic activity and check the nudge counter.
//!
//! Manual prune requests arrive separately through
//! [`tools::prune`](crate::tools::prune) and run their own executor batch;
//! they share all bookkeeping through the same [`SessionState`].

use crate::collect::executor::{CollectOutcome, apply_marked};
use crate::collect::strategies::run_automatic_pass;
use crate::config::GcConfig;
use crate::listing::build_prunable_list;
use crate::notify::compose_summary;
use crate::session::state::{GcStats, SessionState};
use crate::session::sync::sync_tool_cache;
use crate::Message;

/// What one engine turn produced.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Automatic-collection stats for this pass.
    pub gc: GcStats,
    /// Composed summary text, when there is something to report and
    /// summaries are enabled. Dispatch is the host's job (see
    /// [`notify::dispatch`](crate::notify::dispatch)).
    pub summary: Option<String>,
    /// Periodic pruning reminder, when the completion counter reached the
    /// configured frequency.
    pub nudge: Option<String>,
}

/// Run one engine turn over the delivered transcript.
pub fn process_turn(
    state: &mut SessionState,
    config: &GcConfig,
    messages: &mut [Message],
) -> TurnOutcome {
    sync_tool_cache(state, config, messages);
    apply_marked(state, config, messages);
    let gc = run_automatic_pass(state, config, messages);
    let summary = compose_summary(state, config, CollectOutcome::default(), None, &[]);
    let nudge = maybe_nudge(state, config);
    TurnOutcome { gc, summary, nudge }
}

/// Emit a pruning reminder once per `nudge_frequency` completed tool calls.
///
/// The counter resets when the threshold is reached, whether or not a
/// reminder goes out: an empty prunable list swallows the reminder but
/// still restarts the cycle.
pub fn maybe_nudge(state: &mut SessionState, config: &GcConfig) -> Option<String> {
    if config.nudge_frequency == 0 || state.nudge_counter < config.nudge_frequency {
        return None;
    }
    state.nudge_counter = 0;

    let listing = build_prunable_list(state, config);
    if listing.is_empty() {
        return None;
    }
    Some(format!(
        "Context housekeeping: these completed tool results are still occupying \
         the context window. Prune the ones you no longer need by numeric id.\n{listing}"
    ))
}
