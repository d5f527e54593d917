use crate::llm::{ChatClient, ChatRequest, Message};
use crate::planner::plan::Plan;
use crate::planner::schemas::PlanResponse;
use crate::prompts::PromptManager;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Turns a user request into a validated `Plan` via the LLM.
///
/// Malformed output gets one corrective retry carrying the parse error;
/// a second malformed response fails the request.
pub struct Planner {
    client: Arc<dyn ChatClient>,
    model: String,
}

impl Planner {
    pub fn new(client: Arc<dyn ChatClient>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    /// Create a plan from a raw user request.
    pub async fn create_plan(
        &self,
        cancel: &CancellationToken,
        request: &str,
        global_context: &str,
    ) -> Result<Plan, String> {
        let user_message = PromptManager::plan_user_message(request, global_context);
        self.request_plan(cancel, &user_message).await
    }

    /// Re-plan after the reviewer asked for a modification.
    pub async fn revise_plan(
        &self,
        cancel: &CancellationToken,
        request: &str,
        instruction: &str,
    ) -> Result<Plan, String> {
        let user_message = PromptManager::plan_revision_message(request, instruction);
        self.request_plan(cancel, &user_message).await
    }

    async fn request_plan(
        &self,
        cancel: &CancellationToken,
        user_message: &str,
    ) -> Result<Plan, String> {
        let mut messages = vec![
            Message::system(&PromptManager::planner_system_prompt()),
            Message::user(user_message),
        ];

        // API failures propagate immediately; only malformed output earns
        // the corrective retry.
        let raw = self.chat(cancel, &messages).await?;
        let parse_error = match PlanResponse::parse(&raw).and_then(PlanResponse::into_plan) {
            Ok(plan) => return Ok(plan),
            Err(e) => e,
        };
        log::warn!("planner produced malformed output, retrying: {}", parse_error);

        messages.push(Message::assistant(&raw));
        messages.push(Message::user(&PromptManager::plan_retry_message(
            &parse_error,
        )));
        let raw = self.chat(cancel, &messages).await?;
        PlanResponse::parse(&raw)
            .and_then(PlanResponse::into_plan)
            .map_err(|e| format!("Planner failed after retry: {}", e))
    }

    async fn chat(&self, cancel: &CancellationToken, messages: &[Message]) -> Result<String, String> {
        let request = ChatRequest::new(&self.model, messages.to_vec())
            .with_temperature(0.1)
            .with_max_tokens(4000);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err("Planning cancelled".to_string()),
            response = self.client.chat(request) => response?,
        };

        Ok(response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedClient;
    use crate::llm::Message;
    use crate::planner::task::TaskType;

    const VALID_PLAN: &str = r#"{
        "description": "goal",
        "tasks": [
            {"type": "SEARCH", "description": "find", "parameters": {"query": "q"}},
            {"type": "REPORT", "description": "write", "parameters": {}}
        ]
    }"#;

    fn planner(client: ScriptedClient) -> Planner {
        Planner::new(Arc::new(client), "test-model")
    }

    #[tokio::test]
    async fn test_valid_plan_on_first_attempt() {
        let client = ScriptedClient::new(vec![Ok(Message::assistant(VALID_PLAN))]);
        let plan = planner(client)
            .create_plan(&CancellationToken::new(), "do research", "")
            .await
            .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.tasks[1].task_type, TaskType::Report);
    }

    #[tokio::test]
    async fn test_malformed_then_valid_uses_retry() {
        let client = ScriptedClient::new(vec![
            Ok(Message::assistant("this is not json")),
            Ok(Message::assistant(VALID_PLAN)),
        ]);
        let client = Arc::new(client);
        let planner = Planner::new(client.clone(), "test-model");
        let plan = planner
            .create_plan(&CancellationToken::new(), "do research", "")
            .await
            .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(client.request_count(), 2);

        // The corrective request carries the parse error back to the model.
        let requests = client.requests.lock().unwrap();
        let retry_text = requests[1].messages.last().unwrap().text();
        assert!(retry_text.contains("could not be used"));
    }

    #[tokio::test]
    async fn test_api_failure_propagates_without_retry() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err("api down".to_string()),
            Ok(Message::assistant(VALID_PLAN)),
        ]));
        let planner = Planner::new(client.clone(), "test-model");
        let err = planner
            .create_plan(&CancellationToken::new(), "do research", "")
            .await
            .unwrap_err();
        assert_eq!(err, "api down");
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_twice_malformed_is_terminal() {
        let client = ScriptedClient::new(vec![
            Ok(Message::assistant("junk")),
            Ok(Message::assistant("more junk")),
        ]);
        let err = planner(client)
            .create_plan(&CancellationToken::new(), "do research", "")
            .await
            .unwrap_err();
        assert!(err.contains("after retry"));
    }

    #[tokio::test]
    async fn test_cancellation_unblocks_planning() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        // The scripted client would answer, but cancellation wins the select.
        let client = ScriptedClient::new(vec![]);
        let err = planner(client)
            .create_plan(&cancel, "do research", "")
            .await
            .unwrap_err();
        assert!(err.contains("cancelled"));
    }
}
