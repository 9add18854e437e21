//! Process-wide session demultiplexer.
//!
//! Hosts that run many conversations in one process need somewhere to keep
//! each conversation's [`SessionState`]. This registry is that boundary: a
//! mutex-guarded map keyed by session id. Access is serialized per call, so
//! a host that dispatches one worker per conversation gets the per-session
//! exclusivity the engine assumes.

use crate::session::state::SessionState;
use std::collections::HashMap;
use std::sync::Mutex;

/// Map from session id to engine state, created on first access.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` against the state for `session_id`, creating it on first use.
    ///
    /// The map lock is held for the duration of `f`; keep the closure to
    /// engine work only.
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let state = sessions.entry(session_id.to_string()).or_insert_with(|| {
            let mut state = SessionState::new();
            state.observe_session(session_id);
            state
        });
        f(state)
    }

    /// Drop the state for a finished conversation.
    pub fn remove(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(session_id);
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Whether no session is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_state_on_first_access() {
        let registry = SessionRegistry::new();
        let id = registry.with_session("ses-1", |state| state.session_id.clone());
        assert_eq!(id.as_deref(), Some("ses-1"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn state_persists_between_accesses() {
        let registry = SessionRegistry::new();
        registry.with_session("ses-1", |state| state.current_turn = 7);
        let turn = registry.with_session("ses-1", |state| state.current_turn);
        assert_eq!(turn, 7);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn sessions_are_isolated() {
        let registry = SessionRegistry::new();
        registry.with_session("ses-a", |state| state.nudge_counter = 3);
        let other = registry.with_session("ses-b", |state| state.nudge_counter);
        assert_eq!(other, 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_drops_state() {
        let registry = SessionRegistry::new();
        registry.with_session("ses-1", |state| state.current_turn = 9);
        registry.remove("ses-1");
        assert!(registry.is_empty());

        let turn = registry.with_session("ses-1", |state| state.current_turn);
        assert_eq!(turn, 0, "recreated fresh after removal");
    }
}
