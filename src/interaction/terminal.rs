//! Terminal interaction handler for CLI runs.

use crate::interaction::InteractionHandler;
use crate::planner::Plan;
use async_trait::async_trait;
use inquire::{Confirm, Text};

/// Prompts the user on the controlling terminal. The inquire prompts are
/// blocking, so they run on the blocking thread pool.
pub struct TerminalInteraction {
    auto_approve: bool,
}

impl TerminalInteraction {
    pub fn new(auto_approve: bool) -> Self {
        Self { auto_approve }
    }
}

#[async_trait]
impl InteractionHandler for TerminalInteraction {
    async fn log(&self, line: &str) {
        println!("{}", line);
    }

    async fn review_plan(&self, plan: &Plan) -> Result<Option<String>, String> {
        println!("{}", plan);
        let answer = tokio::task::spawn_blocking(|| {
            Text::new("Press Enter to approve the plan, or describe a modification:")
                .with_default("")
                .prompt()
        })
        .await
        .map_err(|e| format!("Plan review prompt failed: {}", e))?
        .map_err(|e| format!("Plan review prompt failed: {}", e))?;

        let answer = answer.trim().to_string();
        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(answer))
        }
    }

    async fn review_search_results(&self, results: &str) -> bool {
        println!("--- Search results ---\n{}\n----------------------", results);
        tokio::task::spawn_blocking(|| {
            Confirm::new("Fetch more search results?")
                .with_default(false)
                .prompt()
                .unwrap_or(false)
        })
        .await
        .unwrap_or(false)
    }

    async fn approve_tool(&self, name: &str, arguments: &str) -> bool {
        if self.auto_approve {
            return true;
        }
        let question = format!("Allow tool '{}' with arguments {}?", name, arguments);
        tokio::task::spawn_blocking(move || {
            Confirm::new(&question)
                .with_default(true)
                .prompt()
                .unwrap_or(false)
        })
        .await
        .unwrap_or(false)
    }
}
