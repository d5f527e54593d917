//! Runtime configuration.
//!
//! The LLM endpoint and API key come from the environment; behavior flags
//! are set by the caller through the builder methods.

use std::env;

/// Directive appended to the user message when a PPT is requested.
pub const PPT_DIRECTIVE: &str =
    "\n\nAfter completing the report, also prepare a PPT presentation outline.";

/// Directive appended to the user message when a podcast is requested.
pub const PODCAST_DIRECTIVE: &str =
    "\n\nAfter completing the report, also prepare a two-speaker podcast script.";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the OpenAI-compatible chat-completions API.
    pub base_url: String,
    pub api_key: String,
    /// Model used for planning, subagents and skill selection.
    pub model: String,
    /// Tavily API key; empty disables the primary search back-end.
    pub tavily_api_key: String,
    /// Skip the per-tool approval prompt.
    pub auto_approve: bool,
    /// Route plans through the human review gate before execution.
    pub require_review: bool,
    /// Render subagent emits a full HTML page instead of terminal Markdown.
    pub render_html: bool,
    /// Result count for the initial search request.
    pub search_results: usize,
    /// Result count for the "more results" re-search. The upper bound is
    /// deployment-specific, so it is configuration rather than a constant.
    pub max_search_results: usize,
    /// Maximum rounds of any tool-call loop.
    pub tool_loop_limit: usize,
    /// Advertised post-processing capabilities.
    pub ppt_enabled: bool,
    pub podcast_enabled: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            model: "openai/gpt-4o-mini".to_string(),
            tavily_api_key: String::new(),
            auto_approve: false,
            require_review: false,
            render_html: false,
            search_results: 5,
            max_search_results: 50,
            tool_loop_limit: 10,
            ppt_enabled: false,
            podcast_enabled: false,
        }
    }
}

impl AgentConfig {
    /// Build a configuration from the environment. The API key is required;
    /// everything else falls back to defaults.
    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .or_else(|_| env::var("LLM_API_KEY"))
            .map_err(|_| {
                "LLM API key not found; set OPENROUTER_API_KEY or LLM_API_KEY".to_string()
            })?;
        if api_key.is_empty() {
            return Err("LLM API key is empty".to_string());
        }

        let mut config = Self {
            api_key,
            ..Self::default()
        };
        if let Ok(base_url) = env::var("LLM_BASE_URL") {
            if !base_url.is_empty() {
                config.base_url = base_url;
            }
        }
        if let Ok(model) = env::var("LLM_MODEL") {
            if !model.is_empty() {
                config.model = model;
            }
        }
        if let Ok(tavily) = env::var("TAVILY_API_KEY") {
            config.tavily_api_key = tavily;
        }
        Ok(config)
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn with_review(mut self, require_review: bool) -> Self {
        self.require_review = require_review;
        self
    }

    pub fn with_html(mut self, render_html: bool) -> Self {
        self.render_html = render_html;
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}
