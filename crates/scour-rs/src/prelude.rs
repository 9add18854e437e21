//! Convenience re-exports for common `scour-rs` types.
//!
//! Meant to be glob-imported by hosts embedding the engine:
//!
//! ```ignore
//! use scour_rs::prelude::*;
//! ```
//!
//! This pulls in the types needed for the vast majority of integrations:
//! transcript types, [`GcConfig`], [`SessionState`] + registry, the per-turn
//! entry point, and the notification boundary. Specialized pieces (strategy
//! candidate functions, the replay loader, listing internals) are
//! intentionally excluded — import those from their modules directly.

// ── Transcript types ────────────────────────────────────────────────
pub use crate::{Message, MessageInfo, MessagePart, Role, ToolState, ToolStatus, json_schema_for};

// ── Configuration ───────────────────────────────────────────────────
pub use crate::config::{GcConfig, SummaryMode, Toggle};

// ── Session state ───────────────────────────────────────────────────
pub use crate::session::{GcStats, SessionRegistry, SessionState, SessionStats};

// ── Engine ──────────────────────────────────────────────────────────
pub use crate::collect::{CollectOutcome, CollectRequest, collect};
pub use crate::engine::{TurnOutcome, process_turn};
pub use crate::listing::build_prunable_list;

// ── Notification boundary ───────────────────────────────────────────
pub use crate::notify::{NotificationSink, PruneReason, SinkFuture, dispatch, find_current_agent};

// ── Manual pruning ──────────────────────────────────────────────────
pub use crate::tools::{PruneArgs, PruneItem, PruneOutput, run_prune};
