use crate::planner::Plan;
use serde::{Deserialize, Serialize};

/// Tagged event emitted on a session's outbound channel.
///
/// Within a session events appear in the exact order they were produced;
/// the final event is always exactly one of `Done` or `Error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Human-readable progress line. The UI parses the literal step markers
    /// inside `content` to drive its plan panel.
    Log { content: String },
    /// A plan awaits approval; the orchestrator is blocked on the response
    /// channel.
    PlanReview { plan: Plan },
    /// Final artifact.
    Response {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        ppt: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        podcast: Option<serde_json::Value>,
    },
    /// Terminal failure.
    Error { content: String },
    /// Terminal success marker, may follow a `Response`.
    Done,
}

impl Event {
    pub fn log(content: impl Into<String>) -> Self {
        Event::Log {
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Event::Error {
            content: content.into(),
        }
    }

    pub fn response(content: impl Into<String>) -> Self {
        Event::Response {
            content: content.into(),
            ppt: None,
            podcast: None,
        }
    }

    /// True for the events that end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Done | Event::Error { .. })
    }
}
