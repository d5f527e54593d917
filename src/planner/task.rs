use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of task types. Each value is handled by exactly one
/// subagent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskType {
    Search,
    Analyze,
    Report,
    Render,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Search,
        TaskType::Analyze,
        TaskType::Report,
        TaskType::Render,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Search => "SEARCH",
            TaskType::Analyze => "ANALYZE",
            TaskType::Report => "REPORT",
            TaskType::Render => "RENDER",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SEARCH" => Ok(TaskType::Search),
            "ANALYZE" => Ok(TaskType::Analyze),
            "REPORT" => Ok(TaskType::Report),
            "RENDER" => Ok(TaskType::Render),
            other => Err(format!("Unknown task type '{}'", other)),
        }
    }
}

/// Typed task parameters. `query` and `content` are set by the planner and
/// immutable afterwards; `context` and `global_context` are injected by the
/// orchestrator immediately before execution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub global_context: String,
}

/// A unit of work inside a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Stable position within the plan, assigned 0..n-1 at validation.
    pub index: usize,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub description: String,
    #[serde(default)]
    pub parameters: TaskParameters,
}

impl Task {
    pub fn new(index: usize, task_type: TaskType, description: &str) -> Self {
        Self {
            index,
            task_type,
            description: description.to_string(),
            parameters: TaskParameters::default(),
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.parameters.query = Some(query.to_string());
        self
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.parameters.content = Some(content.to_string());
        self
    }

    /// The search query: the explicit parameter, falling back to the task
    /// description.
    pub fn effective_query(&self) -> &str {
        self.parameters
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(&self.description)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. [{}] {}",
            self.index + 1,
            self.task_type,
            self.description
        )
    }
}

/// The outcome of a single task execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_type: TaskType,
    pub success: bool,
    pub output: String,
    /// Empty on success.
    pub error: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    pub executed_at: DateTime<Utc>,
}

impl TaskResult {
    pub fn ok(task_type: TaskType, output: String) -> Self {
        Self {
            task_type,
            success: true,
            output,
            error: String::new(),
            metadata: HashMap::new(),
            executed_at: Utc::now(),
        }
    }

    pub fn failure(task_type: TaskType, error: String) -> Self {
        Self {
            task_type,
            success: false,
            output: String::new(),
            error,
            metadata: HashMap::new(),
            executed_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// The headered form under which this output appears in successor tasks'
    /// context.
    pub fn context_entry(&self) -> String {
        format!("Output from {} task:\n{}", self.task_type, self.output)
    }
}
