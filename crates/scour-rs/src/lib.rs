//! Context garbage collection for LLM agent transcripts.
//!
//! `scour-rs` keeps a long-running agent conversation inside its context
//! window by selectively pruning the input/output payloads of completed tool
//! calls once they are no longer needed. Tool results are the single largest
//! context consumer in any agent loop, and most of a result is irrelevant
//! after the model has processed it. Pruning replaces those payloads with
//! compact placeholders without any LLM call, while the session keeps
//! accurate statistics about everything it reclaimed.
//!
//! The engine is a deterministic state machine over an ordered transcript:
//! a cache-synchronization pass extracts tool-call metadata and token costs,
//! eligibility rules decide what may be pruned, a redaction executor mutates
//! transcript entries in place, and three automatic collection strategies
//! (deduplication, write supersession, stale-error purge) decide *what* to
//! collect without operator instruction.
//!
//! # Getting started
//!
//! ```ignore
//! use scour_rs::prelude::*;
//!
//! let config = GcConfig::default()
//!     .protect_tool("task")
//!     .allow_prune_input("task");
//!
//! let mut state = SessionState::new();
//!
//! // Once per conversation turn, with the host-delivered transcript:
//! let outcome = scour_rs::engine::process_turn(&mut state, &config, &mut messages);
//! println!("reclaimed ~{} tokens", outcome.gc.tokens_collected);
//! ```
//!
//! # Where to find things
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`SessionState`](session::SessionState), cache sync, per-session registry |
//! | [`policy`] | input/output pruning eligibility rules |
//! | [`collect`] | redaction executor and automatic collection strategies |
//! | [`listing`] | numbered prunable-tools listing and numeric-id resolution |
//! | [`notify`] | pruning summaries and the host notification boundary |
//! | [`engine`] | per-turn orchestration: sync → strategies → nudge |
//! | [`tools`] | the manual `prune` tool surface (schema + validation) |
//! | [`replay`] | offline transcript replay for the `scour` CLI |
//!
//! # Design principles
//!
//! 1. **One mutation point.** Every prune (manual or automatic) routes
//!    through [`collect::collect`]. That is what keeps collection idempotent
//!    and the statistics conserved.
//!
//! 2. **State is explicit.** The engine threads one [`SessionState`](session::SessionState)
//!    through every operation; the only process-wide structure is the
//!    [`SessionRegistry`](session::SessionRegistry) that demultiplexes
//!    conversations at the boundary.
//!
//! 3. **Payloads are opaque.** Tool inputs and outputs are
//!    `serde_json::Value`s of unknown shape. Redaction replaces top-level
//!    fields with placeholders; it never interprets them.
//!
//! 4. **Protection beats reclamation.** A protected tool's output is never
//!    pruned; an input is only pruned when an operator explicitly opted the
//!    tool into input pruning.

pub mod collect;
pub mod config;
pub mod engine;
pub mod listing;
pub mod notify;
pub mod policy;
pub mod prelude;
pub mod replay;
pub mod session;
pub mod tokens;
pub mod tools;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ── Schema generation ──────────────────────────────────────────────

/// Generate a JSON Schema `serde_json::Value` from a type that implements
/// `schemars::JsonSchema`. This is the bridge between strong Rust types and
/// the schema the host's function-calling API expects for the manual prune
/// tool.
pub fn json_schema_for<T: JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema)
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}))
}

// ── Transcript types ───────────────────────────────────────────────

/// Role of a transcript message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Execution status of a tool call as carried in the transcript.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl ToolStatus {
    /// Whether the call has reached a terminal state (completed or error).
    pub fn is_terminal(self) -> bool {
        matches!(self, ToolStatus::Completed | ToolStatus::Error)
    }
}

/// The mutable payload of a tool-call part: status plus input/output.
///
/// `input` and `output` are opaque structured values — the engine replaces
/// them with placeholders during redaction but never interprets their shape.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ToolState {
    pub status: ToolStatus,
    #[serde(default)]
    pub input: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// Error message for `status == Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One part of a transcript message.
///
/// Unknown part kinds deserialize to [`MessagePart::Other`] and are left
/// untouched by every pass — the engine only ever reads tool parts and
/// turn-boundary markers.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type")]
pub enum MessagePart {
    /// A tool invocation with its call identifier and payload.
    #[serde(rename = "tool")]
    Tool {
        tool: String,
        #[serde(rename = "callID")]
        call_id: String,
        state: ToolState,
    },
    /// Turn-boundary marker: increments the session's turn counter.
    #[serde(rename = "step-start")]
    StepStart,
    /// Plain text content.
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(default)]
        ignored: bool,
    },
    /// Any part kind this engine does not process.
    #[serde(other)]
    Other,
}

impl MessagePart {
    /// Construct a tool part (primarily for tests and replay fixtures).
    pub fn tool(tool: impl Into<String>, call_id: impl Into<String>, state: ToolState) -> Self {
        MessagePart::Tool {
            tool: tool.into(),
            call_id: call_id.into(),
            state,
        }
    }
}

/// Creation timestamp of a message, epoch milliseconds on the wire.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageTime {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created: DateTime<Utc>,
}

/// Header of a transcript message.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct MessageInfo {
    pub id: String,
    pub role: Role,
    /// Name of the agent that produced this message, when the host tracks one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub time: MessageTime,
}

/// One transcript message: an `info` header plus an ordered part list.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub info: MessageInfo,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl Message {
    /// Construct a message with the given role and parts.
    pub fn with_parts(id: impl Into<String>, role: Role, parts: Vec<MessagePart>) -> Self {
        Self {
            info: MessageInfo {
                id: id.into(),
                role,
                agent: None,
                time: MessageTime {
                    created: Utc::now(),
                },
            },
            parts,
        }
    }

    /// Construct an assistant message with the given parts.
    pub fn assistant(id: impl Into<String>, parts: Vec<MessagePart>) -> Self {
        Self::with_parts(id, Role::Assistant, parts)
    }

    /// Construct a user message with a single text part.
    pub fn user_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_parts(
            id,
            Role::User,
            vec![MessagePart::Text {
                text: text.into(),
                ignored: false,
            }],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_part_serde_roundtrip() {
        let part = MessagePart::tool(
            "bash",
            "call-1",
            ToolState {
                status: ToolStatus::Completed,
                input: serde_json::json!({"command": "ls"}),
                output: Some(serde_json::json!("file.txt")),
                error: None,
            },
        );
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "tool");
        assert_eq!(json["callID"], "call-1");
        assert_eq!(json["state"]["status"], "completed");

        let parsed: MessagePart = serde_json::from_value(json).unwrap();
        match parsed {
            MessagePart::Tool { tool, call_id, .. } => {
                assert_eq!(tool, "bash");
                assert_eq!(call_id, "call-1");
            }
            other => panic!("expected tool part, got {other:?}"),
        }
    }

    #[test]
    fn step_start_parses_as_turn_boundary() {
        let parsed: MessagePart = serde_json::from_str(r#"{"type": "step-start"}"#).unwrap();
        assert!(matches!(parsed, MessagePart::StepStart));
    }

    #[test]
    fn unknown_part_kind_is_other() {
        let parsed: MessagePart =
            serde_json::from_str(r#"{"type": "snapshot", "data": "x"}"#).unwrap();
        assert!(matches!(parsed, MessagePart::Other));
    }

    #[test]
    fn message_time_epoch_millis() {
        let msg: Message = serde_json::from_str(
            r#"{
                "info": {"id": "m1", "role": "assistant", "time": {"created": 1700000000000}},
                "parts": []
            }"#,
        )
        .unwrap();
        assert_eq!(msg.info.time.created.timestamp_millis(), 1_700_000_000_000);
        assert!(msg.info.agent.is_none());
    }

    #[test]
    fn terminal_statuses() {
        assert!(ToolStatus::Completed.is_terminal());
        assert!(ToolStatus::Error.is_terminal());
        assert!(!ToolStatus::Pending.is_terminal());
        assert!(!ToolStatus::Running.is_terminal());
    }
}
