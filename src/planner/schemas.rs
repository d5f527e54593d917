//! Wire schemas for LLM plan responses.
//!
//! The planner asks for strict JSON; these types decode it and convert it
//! into the internal `Plan` structure, rejecting unknown task types and
//! non-object parameters.

use crate::planner::plan::Plan;
use crate::planner::task::{Task, TaskParameters, TaskType};
use serde::{Deserialize, Serialize};

/// Plan response from the LLM
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    pub description: String,
    pub tasks: Vec<PlanTask>,
}

/// Task structure as produced by the LLM
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanTask {
    #[serde(rename = "type")]
    pub task_type: String,
    pub description: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl PlanResponse {
    /// Parse raw LLM output into a response, tolerating code fences around
    /// the JSON body.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let body = strip_code_fence(raw);
        serde_json::from_str(body)
            .map_err(|e| format!("Failed to parse plan response as JSON: {}", e))
    }

    /// Convert into a validated `Plan`.
    pub fn into_plan(self) -> Result<Plan, String> {
        let mut tasks = Vec::with_capacity(self.tasks.len());
        for (index, plan_task) in self.tasks.into_iter().enumerate() {
            let task_type: TaskType = plan_task.task_type.parse()?;
            let parameters = decode_parameters(&plan_task.parameters, index)?;
            tasks.push(Task {
                index,
                task_type,
                description: plan_task.description,
                parameters,
            });
        }

        let mut plan = Plan::new(&self.description, tasks);
        plan.validate()?;
        Ok(plan)
    }
}

fn decode_parameters(value: &serde_json::Value, index: usize) -> Result<TaskParameters, String> {
    match value {
        serde_json::Value::Null => Ok(TaskParameters::default()),
        serde_json::Value::Object(map) => {
            let mut parameters = TaskParameters::default();
            if let Some(query) = map.get("query").and_then(|v| v.as_str()) {
                parameters.query = Some(query.to_string());
            }
            if let Some(content) = map.get("content").and_then(|v| v.as_str()) {
                parameters.content = Some(content.to_string());
            }
            Ok(parameters)
        }
        _ => Err(format!(
            "Task {} has non-object parameters: {}",
            index, value
        )),
    }
}

/// Strip a surrounding Markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    rest.strip_suffix("```").map(str::trim).unwrap_or(trimmed)
}
