use crate::planner::task::{Task, TaskType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered, typed task list with a goal restatement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub description: String,
    pub tasks: Vec<Task>,
}

impl Plan {
    pub fn new(description: &str, tasks: Vec<Task>) -> Self {
        Self {
            description: description.to_string(),
            tasks,
        }
    }

    /// Validate the plan and normalize task indices to 0..n-1.
    ///
    /// A plan is valid iff it has at least one task and any RENDER task
    /// comes after the REPORT it renders.
    pub fn validate(&mut self) -> Result<(), String> {
        if self.tasks.is_empty() {
            return Err("Plan contains no tasks".to_string());
        }

        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.index = index;
        }

        let first_report = self.tasks.iter().position(|t| t.task_type == TaskType::Report);
        let first_render = self.tasks.iter().position(|t| t.task_type == TaskType::Render);
        if let (Some(report), Some(render)) = (first_report, first_render) {
            if render < report {
                return Err("RENDER task must come after the REPORT it renders".to_string());
            }
        }

        Ok(())
    }

    pub fn has_report(&self) -> bool {
        self.tasks.iter().any(|t| t.task_type == TaskType::Report)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📋 {}", self.description)?;
        for task in &self.tasks {
            writeln!(f, "  {}", task)?;
        }
        Ok(())
    }
}
