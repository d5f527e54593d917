use crate::agents::Subagent;
use crate::interaction::InteractionHandler;
use crate::planner::{Task, TaskResult, TaskType};
use crate::tools::web::SearchProvider;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Gathers information from the web.
///
/// The primary back-end (Tavily-class) is tried first; any error falls back
/// to the secondary (DuckDuckGo-class), and only a double failure is
/// terminal. After the primary attempt resolves, Wikipedia is always
/// queried and non-empty results are appended to the output.
pub struct SearchAgent {
    primary: Arc<dyn SearchProvider>,
    secondary: Arc<dyn SearchProvider>,
    wikipedia: Arc<dyn SearchProvider>,
    interaction: Option<Arc<dyn InteractionHandler>>,
    /// Result count for the initial request.
    initial_results: usize,
    /// Result count when the reviewer asks for more.
    max_results: usize,
}

impl SearchAgent {
    pub fn new(
        primary: Arc<dyn SearchProvider>,
        secondary: Arc<dyn SearchProvider>,
        wikipedia: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            primary,
            secondary,
            wikipedia,
            interaction: None,
            initial_results: 5,
            max_results: 50,
        }
    }

    pub fn with_interaction(mut self, interaction: Arc<dyn InteractionHandler>) -> Self {
        self.interaction = Some(interaction);
        self
    }

    pub fn with_result_limits(mut self, initial: usize, max: usize) -> Self {
        self.initial_results = initial;
        self.max_results = max;
        self
    }

    /// Run the primary search with its review loop, or fall back to the
    /// secondary. `Err` means both back-ends failed.
    async fn web_search(&self, query: &str) -> Result<String, String> {
        match self.primary.search(query, self.initial_results).await {
            Ok(mut results) => {
                if let Some(interaction) = &self.interaction {
                    if interaction.review_search_results(&results).await {
                        // Keep the original results when the wider search fails.
                        match self.primary.search(query, self.max_results).await {
                            Ok(more) => results = more,
                            Err(e) => log::warn!("wider search failed, keeping originals: {}", e),
                        }
                    }
                }
                Ok(results)
            }
            Err(primary_error) => {
                log::warn!(
                    "{} search failed ({}), falling back to {}",
                    self.primary.name(),
                    primary_error,
                    self.secondary.name()
                );
                self.secondary
                    .search(query, self.initial_results)
                    .await
                    .map_err(|fallback_error| {
                        format!(
                            "Primary search failed: {}; fallback failed: {}",
                            primary_error, fallback_error
                        )
                    })
            }
        }
    }
}

#[async_trait]
impl Subagent for SearchAgent {
    fn task_type(&self) -> TaskType {
        TaskType::Search
    }

    async fn execute(&self, cancel: &CancellationToken, task: &Task) -> TaskResult {
        let query = task.effective_query().to_string();

        let web = tokio::select! {
            biased;
            _ = cancel.cancelled() => return TaskResult::failure(TaskType::Search, "Search cancelled".to_string()),
            web = self.web_search(&query) => web,
        };

        let web = match web {
            Ok(web) => web,
            Err(e) => return TaskResult::failure(TaskType::Search, e),
        };

        // Wikipedia augmentation is best-effort and runs after the primary
        // attempt has resolved either way.
        let wiki = tokio::select! {
            biased;
            _ = cancel.cancelled() => return TaskResult::failure(TaskType::Search, "Search cancelled".to_string()),
            wiki = self.wikipedia.search(&query, self.initial_results) => wiki.unwrap_or_default(),
        };

        let output = if wiki.trim().is_empty() {
            web
        } else {
            format!(
                "Web Search Results:\n{}\n\nWikipedia Results:\n{}",
                web, wiki
            )
        };

        TaskResult::ok(TaskType::Search, output).with_metadata("query", json!(query))
    }
}
