use crate::config::AgentConfig;
use crate::interaction::InteractionHandler;
use crate::llm::{ChatClient, ChatRequest, Message};
use crate::prompts::PromptManager;
use crate::skills::package::{discover_skills, SkillPackage};
use crate::tools::web::SearchProvider;
use crate::tools::{ToolCall, ToolRegistry, TOOL_DENIED};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Alternative top-level entry: discover skill packages, let the LLM pick
/// one by name, and run its body with the bounded tool-call loop.
pub struct SkillRunner {
    client: Arc<dyn ChatClient>,
    model: String,
    interaction: Arc<dyn InteractionHandler>,
    duckduckgo: Arc<dyn SearchProvider>,
    wikipedia: Arc<dyn SearchProvider>,
    auto_approve: bool,
    max_rounds: usize,
}

impl SkillRunner {
    pub fn new(
        client: Arc<dyn ChatClient>,
        config: &AgentConfig,
        interaction: Arc<dyn InteractionHandler>,
        duckduckgo: Arc<dyn SearchProvider>,
        wikipedia: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            client,
            model: config.model.clone(),
            interaction,
            duckduckgo,
            wikipedia,
            auto_approve: config.auto_approve,
            max_rounds: config.tool_loop_limit,
        }
    }

    /// Discover skills under `root`, select one for `prompt`, execute it and
    /// return the final assistant output.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        root: &Path,
        prompt: &str,
    ) -> Result<String, String> {
        let skills = discover_skills(root)?;
        if skills.is_empty() {
            return Err(format!("No skills found under '{}'", root.display()));
        }

        let name = self.select_skill(cancel, prompt, &skills).await?;
        let package = skills
            .get(&name)
            .ok_or_else(|| format!("Selected skill '{}' is not available", name))?;
        self.interaction
            .log(&format!("🎯 Selected skill: {}", name))
            .await;

        self.execute_skill(cancel, package, prompt).await
    }

    /// Ask the LLM for exactly one skill name from the discovered set.
    async fn select_skill(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
        skills: &std::collections::HashMap<String, SkillPackage>,
    ) -> Result<String, String> {
        let mut names: Vec<&String> = skills.keys().collect();
        names.sort();
        let listing = names
            .iter()
            .map(|name| format!("{}: {}", name, skills[*name].meta.description))
            .collect::<Vec<_>>()
            .join("\n");

        let request = ChatRequest::new(
            &self.model,
            vec![
                Message::system(&PromptManager::skill_selection_system_prompt()),
                Message::user(&PromptManager::skill_selection_user_message(prompt, &listing)),
            ],
        )
        .with_temperature(0.0);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err("Skill selection cancelled".to_string()),
            response = self.client.chat(request) => response?,
        };

        let name = response
            .text()
            .trim()
            .trim_matches(['"', '\'', '`'])
            .to_string();
        if !skills.contains_key(&name) {
            return Err(format!("LLM selected unknown skill '{}'", name));
        }
        Ok(name)
    }

    /// Run the selected skill's tool-call loop, bounded at `max_rounds`.
    pub async fn execute_skill(
        &self,
        cancel: &CancellationToken,
        package: &SkillPackage,
        prompt: &str,
    ) -> Result<String, String> {
        let registry = ToolRegistry::new(self.duckduckgo.clone(), self.wikipedia.clone())
            .with_skill(&package.path, &package.resources.scripts);
        let tools = registry.definitions();
        let model = package.meta.model.as_deref().unwrap_or(&self.model);

        let mut messages = vec![
            Message::system(&PromptManager::skill_system_message(package)),
            Message::user(prompt),
        ];

        for _round in 0..self.max_rounds {
            let request = ChatRequest::new(model, messages.clone()).with_tools(tools.clone());
            let assistant = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err("Skill execution cancelled".to_string()),
                response = self.client.chat(request) => response?,
            };
            messages.push(assistant.clone());

            let Some(tool_calls) = assistant.tool_calls.clone().filter(|calls| !calls.is_empty())
            else {
                return Ok(assistant.text());
            };

            // Results are appended in the LLM-provided order.
            for tool_call in &tool_calls {
                let name = &tool_call.function.name;
                let arguments = &tool_call.function.arguments;
                self.interaction
                    .log(&format!("🔧 Running tool '{}'", name))
                    .await;

                let approved =
                    self.auto_approve || self.interaction.approve_tool(name, arguments).await;
                let content = if !approved {
                    TOOL_DENIED.to_string()
                } else {
                    let call = ToolCall {
                        id: tool_call.id.clone(),
                        name: name.clone(),
                        arguments: arguments.clone(),
                    };
                    match registry.invoke(&call).await {
                        Ok(output) => output,
                        Err(error) => error,
                    }
                };
                messages.push(Message::tool(&tool_call.id, &content));
            }
        }

        Err("exceeded maximum tool call iterations".to_string())
    }
}
