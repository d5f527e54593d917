//! Interaction handling.
//!
//! `InteractionHandler` is the capability interface through which the
//! orchestrator and the subagents ask the human (or its proxy) a question.
//! It is injected at construction and never holds a back-pointer to the
//! session. Two concrete variants exist: a terminal prompt for the CLI and
//! a session-channel bridge for server use.

pub mod channel;
pub mod terminal;

use crate::planner::Plan;
use async_trait::async_trait;

pub use channel::ChannelInteraction;
pub use terminal::TerminalInteraction;

#[async_trait]
pub trait InteractionHandler: Send + Sync {
    /// Push a progress line to the user.
    async fn log(&self, line: &str);

    /// Present a plan for review. `Ok(None)` approves the plan; a returned
    /// string is a modification instruction. May block indefinitely but must
    /// respect cancellation.
    async fn review_plan(&self, plan: &Plan) -> Result<Option<String>, String>;

    /// "Want more results?" gate after a successful primary search.
    async fn review_search_results(&self, results: &str) -> bool;

    /// Approval gate for one tool invocation.
    async fn approve_tool(&self, name: &str, arguments: &str) -> bool;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Interaction handler for tests: silent log, scripted review answers.
    pub struct ScriptedInteraction {
        pub approve_tools: AtomicBool,
        pub want_more_results: AtomicBool,
        pub plan_replies: Mutex<VecDeque<Option<String>>>,
        pub logs: Mutex<Vec<String>>,
        /// Per-call tool approval answers; falls back to `approve_tools`
        /// when exhausted.
        pub tool_replies: Mutex<VecDeque<bool>>,
    }

    impl ScriptedInteraction {
        pub fn approving() -> Self {
            Self {
                approve_tools: AtomicBool::new(true),
                want_more_results: AtomicBool::new(false),
                plan_replies: Mutex::new(VecDeque::new()),
                logs: Mutex::new(Vec::new()),
                tool_replies: Mutex::new(VecDeque::new()),
            }
        }

        pub fn with_plan_replies(replies: Vec<Option<String>>) -> Self {
            let handler = Self::approving();
            *handler.plan_replies.lock().unwrap() = replies.into();
            handler
        }

        pub fn with_tool_replies(replies: Vec<bool>) -> Self {
            let handler = Self::approving();
            *handler.tool_replies.lock().unwrap() = replies.into();
            handler
        }
    }

    #[async_trait]
    impl InteractionHandler for ScriptedInteraction {
        async fn log(&self, line: &str) {
            self.logs.lock().unwrap().push(line.to_string());
        }

        async fn review_plan(&self, _plan: &Plan) -> Result<Option<String>, String> {
            Ok(self
                .plan_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(None))
        }

        async fn review_search_results(&self, _results: &str) -> bool {
            self.want_more_results.load(Ordering::SeqCst)
        }

        async fn approve_tool(&self, _name: &str, _arguments: &str) -> bool {
            self.tool_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.approve_tools.load(Ordering::SeqCst))
        }
    }
}
