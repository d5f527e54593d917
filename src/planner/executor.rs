use crate::agents::Subagent;
use crate::interaction::InteractionHandler;
use crate::planner::plan::Plan;
use crate::planner::task_planner::Planner;
use crate::planner::task::{TaskResult, TaskType};
use crate::session::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Runs a validated plan task by task, threading each output into the next
/// task's context and streaming progress events.
///
/// Events appear on the channel in production order and every run ends with
/// exactly one terminal event, `done` or `error`.
pub struct PlanExecutor {
    planner: Arc<Planner>,
    subagents: HashMap<TaskType, Arc<dyn Subagent>>,
    interaction: Arc<dyn InteractionHandler>,
    events: UnboundedSender<Event>,
    require_review: bool,
}

impl PlanExecutor {
    pub fn new(
        planner: Arc<Planner>,
        subagents: HashMap<TaskType, Arc<dyn Subagent>>,
        interaction: Arc<dyn InteractionHandler>,
        events: UnboundedSender<Event>,
    ) -> Self {
        Self {
            planner,
            subagents,
            interaction,
            events,
            require_review: false,
        }
    }

    pub fn with_review(mut self, require_review: bool) -> Self {
        self.require_review = require_review;
        self
    }

    /// Full pipeline: plan, optional review gate, execution, response.
    pub async fn run(&self, cancel: &CancellationToken, request: &str, global_context: &str) {
        match self.run_inner(cancel, request, global_context).await {
            Ok(content) => {
                self.emit(Event::Response {
                    content,
                    ppt: None,
                    podcast: None,
                });
                self.emit(Event::Done);
            }
            Err(e) => self.emit(Event::error(e)),
        }
    }

    async fn run_inner(
        &self,
        cancel: &CancellationToken,
        request: &str,
        global_context: &str,
    ) -> Result<String, String> {
        let mut plan = self
            .planner
            .create_plan(cancel, request, global_context)
            .await?;

        if self.require_review {
            plan = self.review_loop(cancel, plan, request).await?;
        }

        // Missing subagent mappings fail here, before any task runs.
        for task in &plan.tasks {
            if !self.subagents.contains_key(&task.task_type) {
                return Err(format!(
                    "No subagent registered for task type {}",
                    task.task_type
                ));
            }
        }

        self.emit(Event::log(plan.to_string()));
        let results = self.execute_tasks(cancel, &plan, global_context).await?;

        // The response payload is the REPORT output when the plan has one,
        // otherwise the last task's output.
        let content = results
            .iter()
            .rev()
            .find(|r| r.task_type == TaskType::Report)
            .or_else(|| results.last())
            .map(|r| r.output.clone())
            .unwrap_or_default();
        Ok(content)
    }

    /// Plan-review gate: an empty reply approves, a non-empty reply is a
    /// modification instruction and the cycle reruns on the revised plan.
    async fn review_loop(
        &self,
        cancel: &CancellationToken,
        mut plan: Plan,
        request: &str,
    ) -> Result<Plan, String> {
        loop {
            match self.interaction.review_plan(&plan).await? {
                None => return Ok(plan),
                Some(instruction) => {
                    log::debug!("plan modification requested: {}", instruction);
                    plan = self.planner.revise_plan(cancel, request, &instruction).await?;
                }
            }
        }
    }

    async fn execute_tasks(
        &self,
        cancel: &CancellationToken,
        plan: &Plan,
        global_context: &str,
    ) -> Result<Vec<TaskResult>, String> {
        let total = plan.len();
        let mut results: Vec<TaskResult> = Vec::with_capacity(total);

        for task in &plan.tasks {
            if cancel.is_cancelled() {
                return Err("Session cancelled".to_string());
            }

            self.emit(Event::log(format!(
                "📍 步骤 {}/{}: [{}] {}",
                task.index + 1,
                total,
                task.task_type,
                task.description
            )));

            // Thread all prior outputs into this task's context.
            let mut task = task.clone();
            task.parameters.context = results.iter().map(|r| r.context_entry()).collect();
            task.parameters.global_context = global_context.to_string();

            let subagent = self
                .subagents
                .get(&task.task_type)
                .ok_or_else(|| format!("No subagent registered for task type {}", task.task_type))?;
            let result = subagent.execute(cancel, &task).await;

            if !result.success {
                self.emit(Event::log(format!(
                    "✗ 失败 [{}] {}: {}",
                    task.task_type, task.description, result.error
                )));
                return Err(format!(
                    "Task {} ({}) failed: {}",
                    task.index + 1,
                    task.task_type,
                    result.error
                ));
            }

            self.emit(Event::log(format!(
                "✓ 完成 [{}] {}",
                task.task_type, task.description
            )));
            results.push(result);
        }

        Ok(results)
    }

    fn emit(&self, event: Event) {
        // A closed channel means the consumer is gone; execution continues
        // and cancellation is the consumer's tool for stopping it.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::testing::ScriptedInteraction;
    use crate::llm::testing::ScriptedClient;
    use crate::llm::Message;
    use crate::planner::task::Task;
    use crate::planner::Planner;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::UnboundedReceiver;

    const SEARCH_REPORT_RENDER_PLAN: &str = r#"{
        "description": "research goal",
        "tasks": [
            {"type": "SEARCH", "description": "find sources", "parameters": {"query": "q"}},
            {"type": "REPORT", "description": "write summary", "parameters": {}},
            {"type": "RENDER", "description": "present it", "parameters": {}}
        ]
    }"#;

    /// Subagent that records the tasks it was given and succeeds with a
    /// fixed output.
    struct RecordingAgent {
        task_type: TaskType,
        output: String,
        seen: Arc<Mutex<Vec<Task>>>,
    }

    impl RecordingAgent {
        fn new(task_type: TaskType, output: &str, seen: Arc<Mutex<Vec<Task>>>) -> Arc<Self> {
            Arc::new(Self {
                task_type,
                output: output.to_string(),
                seen,
            })
        }
    }

    #[async_trait]
    impl Subagent for RecordingAgent {
        fn task_type(&self) -> TaskType {
            self.task_type
        }

        async fn execute(&self, _cancel: &CancellationToken, task: &Task) -> TaskResult {
            self.seen.lock().unwrap().push(task.clone());
            TaskResult::ok(self.task_type, self.output.clone())
        }
    }

    /// Subagent that always fails.
    struct FailingAgent(TaskType);

    #[async_trait]
    impl Subagent for FailingAgent {
        fn task_type(&self) -> TaskType {
            self.0
        }

        async fn execute(&self, _cancel: &CancellationToken, _task: &Task) -> TaskResult {
            TaskResult::failure(self.0, "boom".to_string())
        }
    }

    fn recording_set(
        seen: Arc<Mutex<Vec<Task>>>,
        report_output: &str,
    ) -> HashMap<TaskType, Arc<dyn Subagent>> {
        let mut subagents: HashMap<TaskType, Arc<dyn Subagent>> = HashMap::new();
        subagents.insert(
            TaskType::Search,
            RecordingAgent::new(TaskType::Search, "search output", seen.clone()),
        );
        subagents.insert(
            TaskType::Analyze,
            RecordingAgent::new(TaskType::Analyze, "analysis output", seen.clone()),
        );
        subagents.insert(
            TaskType::Report,
            RecordingAgent::new(TaskType::Report, report_output, seen.clone()),
        );
        subagents.insert(
            TaskType::Render,
            RecordingAgent::new(TaskType::Render, "rendered output", seen),
        );
        subagents
    }

    fn drain(rx: &mut UnboundedReceiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn assert_single_terminal(events: &[Event]) {
        let terminal_count = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminal_count, 1, "expected exactly one terminal event");
        assert!(events.last().unwrap().is_terminal(), "terminal event must be last");
    }

    fn executor_with(
        plan_responses: Vec<Result<Message, String>>,
        subagents: HashMap<TaskType, Arc<dyn Subagent>>,
        interaction: Arc<ScriptedInteraction>,
    ) -> (PlanExecutor, UnboundedReceiver<Event>, Arc<ScriptedClient>) {
        let client = Arc::new(ScriptedClient::new(plan_responses));
        let planner = Arc::new(Planner::new(client.clone(), "test-model"));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            PlanExecutor::new(planner, subagents, interaction, tx),
            rx,
            client,
        )
    }

    #[tokio::test]
    async fn test_simple_research_event_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (executor, mut rx, _client) = executor_with(
            vec![Ok(Message::assistant(SEARCH_REPORT_RENDER_PLAN))],
            recording_set(seen, "# Olympic Games\n\nSummary."),
            Arc::new(ScriptedInteraction::approving()),
        );

        executor
            .run(&CancellationToken::new(), "Summarize the history", "")
            .await;
        let events = drain(&mut rx);
        assert_single_terminal(&events);

        let logs: Vec<&String> = events
            .iter()
            .filter_map(|e| match e {
                Event::Log { content } => Some(content),
                _ => None,
            })
            .collect();
        assert!(logs[0].contains("📋"), "first log is the plan rendering");
        assert!(logs[1].contains("📍 步骤 1/3: [SEARCH]"));
        assert!(logs[2].starts_with("✓ 完成"));
        assert!(logs[3].contains("📍 步骤 2/3: [REPORT]"));
        assert!(logs[5].contains("📍 步骤 3/3: [RENDER]"));

        // Started tasks all ended.
        let started = logs.iter().filter(|l| l.contains("📍")).count();
        let ended = logs
            .iter()
            .filter(|l| l.starts_with("✓ 完成") || l.starts_with("✗ 失败"))
            .count();
        assert_eq!(started, ended);

        match &events[events.len() - 2] {
            Event::Response { content, ppt, podcast } => {
                assert!(content.starts_with("# "));
                assert!(ppt.is_none() && podcast.is_none());
            }
            other => panic!("expected response before done, got {:?}", other),
        }
        assert!(matches!(events.last().unwrap(), Event::Done));
    }

    #[tokio::test]
    async fn test_context_threading_invariant() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let plan = r#"{
            "description": "goal",
            "tasks": [
                {"type": "SEARCH", "description": "a", "parameters": {}},
                {"type": "ANALYZE", "description": "b", "parameters": {}},
                {"type": "REPORT", "description": "c", "parameters": {}}
            ]
        }"#;
        let (executor, mut rx, _client) = executor_with(
            vec![Ok(Message::assistant(plan))],
            recording_set(seen.clone(), "# R"),
            Arc::new(ScriptedInteraction::approving()),
        );

        executor
            .run(&CancellationToken::new(), "request", "focus on dates")
            .await;
        drain(&mut rx);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        for (i, task) in seen.iter().enumerate() {
            assert_eq!(task.parameters.context.len(), i);
            for entry in &task.parameters.context {
                assert!(entry.starts_with("Output from "));
            }
            assert_eq!(task.parameters.global_context, "focus on dates");
        }
        assert_eq!(
            seen[2].parameters.context[0],
            "Output from SEARCH task:\nsearch output"
        );
    }

    #[tokio::test]
    async fn test_task_failure_emits_fail_log_and_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subagents = recording_set(seen, "# R");
        subagents.insert(TaskType::Report, Arc::new(FailingAgent(TaskType::Report)));

        let (executor, mut rx, _client) = executor_with(
            vec![Ok(Message::assistant(SEARCH_REPORT_RENDER_PLAN))],
            subagents,
            Arc::new(ScriptedInteraction::approving()),
        );

        executor.run(&CancellationToken::new(), "request", "").await;
        let events = drain(&mut rx);
        assert_single_terminal(&events);
        assert!(matches!(events.last().unwrap(), Event::Error { .. }));

        let has_fail_log = events.iter().any(|e| match e {
            Event::Log { content } => content.starts_with("✗ 失败") && content.contains("boom"),
            _ => false,
        });
        assert!(has_fail_log);
        // No response after a failure.
        assert!(!events.iter().any(|e| matches!(e, Event::Response { .. })));
    }

    #[tokio::test]
    async fn test_missing_subagent_fails_before_execution() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subagents = recording_set(seen.clone(), "# R");
        subagents.remove(&TaskType::Render);

        let (executor, mut rx, _client) = executor_with(
            vec![Ok(Message::assistant(SEARCH_REPORT_RENDER_PLAN))],
            subagents,
            Arc::new(ScriptedInteraction::approving()),
        );

        executor.run(&CancellationToken::new(), "request", "").await;
        let events = drain(&mut rx);
        assert_single_terminal(&events);
        match events.last().unwrap() {
            Event::Error { content } => assert!(content.contains("RENDER")),
            other => panic!("expected error, got {:?}", other),
        }
        // Nothing was executed.
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_review_modification_replans_then_empty_approves() {
        let revised_plan = r#"{
            "description": "revised goal",
            "tasks": [
                {"type": "SEARCH", "description": "find sources", "parameters": {}},
                {"type": "SEARCH", "description": "find security info", "parameters": {}},
                {"type": "REPORT", "description": "write summary", "parameters": {}},
                {"type": "RENDER", "description": "present it", "parameters": {}}
            ]
        }"#;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let interaction = Arc::new(ScriptedInteraction::with_plan_replies(vec![
            Some("Add a security comparison.".to_string()),
            None,
        ]));
        let (executor, mut rx, client) = executor_with(
            vec![
                Ok(Message::assistant(SEARCH_REPORT_RENDER_PLAN)),
                Ok(Message::assistant(revised_plan)),
            ],
            recording_set(seen.clone(), "# R"),
            interaction,
        );
        let executor = executor.with_review(true);

        executor.run(&CancellationToken::new(), "Compare Go and Rust", "").await;
        let events = drain(&mut rx);
        assert_single_terminal(&events);
        assert!(matches!(events.last().unwrap(), Event::Done));

        // The revision request carried the modification instruction.
        assert_eq!(client.request_count(), 2);
        let requests = client.requests.lock().unwrap();
        assert!(requests[1].messages[1]
            .text()
            .contains("Add a security comparison."));
        // The revised four-task plan ran.
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_cancellation_before_start_is_terminal_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (executor, mut rx, _client) = executor_with(
            vec![Ok(Message::assistant(SEARCH_REPORT_RENDER_PLAN))],
            recording_set(seen, "# R"),
            Arc::new(ScriptedInteraction::approving()),
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        executor.run(&cancel, "request", "").await;

        let events = drain(&mut rx);
        assert_single_terminal(&events);
        assert!(matches!(events.last().unwrap(), Event::Error { .. }));
    }
}
