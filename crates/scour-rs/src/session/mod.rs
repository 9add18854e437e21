//! Per-conversation state: the tool-call cache, turn counter, pruning
//! bookkeeping, and the registry that demultiplexes concurrent sessions.
//!
//! 1. **[`state`]** — [`SessionState`], the single mutable record the engine
//!    threads through every operation.
//!
//! 2. **[`sync`]** — the cache synchronizer: walks a host-delivered
//!    transcript and updates the state incrementally. Safe to re-run on
//!    append-only extensions of a previously-seen transcript.
//!
//! 3. **[`registry`]** — process-wide map from session id to state, the only
//!    shared structure. The engine itself stays stateless apart from the
//!    explicitly passed [`SessionState`].

pub mod registry;
pub mod state;
pub mod sync;

pub use registry::SessionRegistry;
pub use state::{GcStats, SessionState, SessionStats, ToolCacheEntry};
pub use sync::sync_tool_cache;
