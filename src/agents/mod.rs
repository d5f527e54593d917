//! Subagents.
//!
//! A subagent handles exactly one task type: it composes the prompts, calls
//! the LLM, may invoke tools or search back-ends, and returns one
//! `TaskResult`. Subagents are stateless apart from their configured
//! clients and are shared behind `Arc` across tasks of a session.

pub mod analyze;
pub mod render;
pub mod report;
pub mod search;

use crate::config::AgentConfig;
use crate::interaction::InteractionHandler;
use crate::llm::ChatClient;
use crate::planner::{Task, TaskResult, TaskType};
use crate::tools::web::SearchProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use analyze::AnalyzeAgent;
pub use render::RenderAgent;
pub use report::ReportAgent;
pub use search::SearchAgent;

#[async_trait]
pub trait Subagent: Send + Sync {
    /// The single task type this subagent handles.
    fn task_type(&self) -> TaskType;

    /// Execute one task. Errors surface inside the returned result, never
    /// as a panic; cancellation yields a failed result.
    async fn execute(&self, cancel: &CancellationToken, task: &Task) -> TaskResult;
}

/// Wire the default subagent set for a session.
pub fn build_subagents(
    config: &AgentConfig,
    client: Arc<dyn ChatClient>,
    primary: Arc<dyn SearchProvider>,
    secondary: Arc<dyn SearchProvider>,
    wikipedia: Arc<dyn SearchProvider>,
    interaction: Arc<dyn InteractionHandler>,
) -> HashMap<TaskType, Arc<dyn Subagent>> {
    let mut subagents: HashMap<TaskType, Arc<dyn Subagent>> = HashMap::new();
    subagents.insert(
        TaskType::Search,
        Arc::new(
            SearchAgent::new(primary, secondary, wikipedia)
                .with_interaction(interaction)
                .with_result_limits(config.search_results, config.max_search_results),
        ),
    );
    subagents.insert(
        TaskType::Analyze,
        Arc::new(AnalyzeAgent::new(client.clone(), &config.model)),
    );
    subagents.insert(
        TaskType::Report,
        Arc::new(ReportAgent::new(client, &config.model)),
    );
    subagents.insert(
        TaskType::Render,
        Arc::new(RenderAgent::new(config.render_html)),
    );
    subagents
}
