//! taskpilot - LLM-driven task orchestration
//!
//! Given a natural-language request, taskpilot plans a sequence of typed
//! subtasks, optionally routes the plan through a human review gate,
//! dispatches each subtask to a specialized subagent (search, analysis,
//! report writing, rendering) and streams progress and the final artifact
//! to the caller over a per-session event channel.
//!
//! # Pipeline
//!
//! Planner -> Reviewer -> Orchestrator -> Subagents -> Tool executor
//!
//! - **Planner** turns the request into an ordered, typed task list
//! - **Orchestrator** runs the plan task by task, threading each output
//!   into the next task's context
//! - **Subagents** combine LLM completions with search back-ends and tools
//! - **Sessions** tie a request to an event stream, a human-response
//!   channel and a cancellation token
//!
//! # Skill mode
//!
//! An alternative entry discovers declarative skill packages (SKILL.md
//! with YAML frontmatter plus scripts), picks one via the LLM and runs its
//! body with a bounded tool-call loop.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskpilot::config::AgentConfig;
//! use taskpilot::session::{SessionManager, StartFlags};
//!
//! # async {
//! let config = AgentConfig::from_env().expect("missing API key");
//! let manager = SessionManager::from_config(config);
//! let mut session = manager
//!     .start("session-1", "Summarize the history of tea", StartFlags::default())
//!     .expect("session already active");
//! while let Some(event) = session.events.recv().await {
//!     println!("{:?}", event);
//! }
//! # };
//! ```

pub mod agents;
pub mod config;
pub mod interaction;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod session;
pub mod skills;
pub mod tools;

// Re-export commonly used types for convenience
pub use config::AgentConfig;
pub use llm::{ChatClient, OpenRouterClient};
pub use planner::{Plan, PlanExecutor, Planner, Task, TaskResult, TaskType};
pub use session::{Event, SessionManager, StartFlags};
pub use skills::SkillRunner;
