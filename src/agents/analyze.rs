use crate::agents::Subagent;
use crate::llm::{ChatClient, ChatRequest, Message};
use crate::planner::{Task, TaskResult, TaskType};
use crate::prompts::PromptManager;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Analyzes previously gathered information against the task description.
pub struct AnalyzeAgent {
    client: Arc<dyn ChatClient>,
    model: String,
}

impl AnalyzeAgent {
    pub fn new(client: Arc<dyn ChatClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Subagent for AnalyzeAgent {
    fn task_type(&self) -> TaskType {
        TaskType::Analyze
    }

    async fn execute(&self, cancel: &CancellationToken, task: &Task) -> TaskResult {
        let system =
            PromptManager::analyst_system_prompt(&task.parameters.global_context);
        let user =
            PromptManager::context_user_prompt(&task.description, &task.parameters.context);

        let request = ChatRequest::new(
            &self.model,
            vec![Message::system(&system), Message::user(&user)],
        )
        .with_temperature(0.3);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return TaskResult::failure(TaskType::Analyze, "Analysis cancelled".to_string()),
            response = self.client.chat(request) => response,
        };

        match response {
            Ok(message) => TaskResult::ok(TaskType::Analyze, message.text()),
            Err(e) => TaskResult::failure(TaskType::Analyze, e),
        }
    }
}
