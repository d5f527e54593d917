//! Centralized prompt management to ensure consistency across all LLM
//! interactions. Every system prompt used by the planner, the subagents and
//! the skill runner lives here.

use crate::skills::SkillPackage;

pub struct PromptManager;

impl PromptManager {
    /// System prompt for plan generation. Describes the four task types and
    /// requires strict JSON output matching the plan schema.
    pub fn planner_system_prompt() -> String {
        format!(
            "You are a research planning assistant. Break the user's request into an \
            ordered list of tasks. Four task types are available:\n\
            - SEARCH: gather information from the web. Set parameters.query to the search query.\n\
            - ANALYZE: analyze previously gathered information against the task description.\n\
            - REPORT: write the final Markdown report from all prior outputs.\n\
            - RENDER: present the finished report to the user. Must come after the REPORT it renders.\n\n\
            A typical plan is SEARCH, then ANALYZE when the request calls for comparison or \
            reasoning, then REPORT, then RENDER.\n\n{}",
            Self::plan_schema_instruction()
        )
    }

    /// JSON-schema instruction shared by the initial and corrective planning
    /// prompts.
    pub fn plan_schema_instruction() -> String {
        "IMPORTANT: Respond with valid JSON only, following this schema:\n\
        {\n\
          \"description\": \"One-sentence restatement of the goal\",\n\
          \"tasks\": [\n\
            {\n\
              \"type\": \"SEARCH\",\n\
              \"description\": \"What this task does\",\n\
              \"parameters\": {\"query\": \"search terms\"}\n\
            }\n\
          ]\n\
        }\n\n\
        \"parameters\" must be an object; it may be empty. \
        Do not include any text before or after the JSON."
            .to_string()
    }

    /// User message for the initial planning request.
    pub fn plan_user_message(request: &str, global_context: &str) -> String {
        if global_context.is_empty() {
            format!("Create a plan for the following request:\n\n{}", request)
        } else {
            format!(
                "Create a plan for the following request:\n\n{}\n\n\
                Additional user guidance to keep in mind:\n{}",
                request, global_context
            )
        }
    }

    /// Corrective user message after malformed planner output.
    pub fn plan_retry_message(error: &str) -> String {
        format!(
            "The previous response could not be used: {}.\n\
            Respond again with valid JSON only, exactly matching the schema.",
            error
        )
    }

    /// User message when the reviewer asked for a plan modification.
    pub fn plan_revision_message(request: &str, instruction: &str) -> String {
        format!(
            "Create a plan for the following request:\n\n{}\n\n\
            The user reviewed the previous plan and asked for this change:\n{}",
            request, instruction
        )
    }

    /// System prompt for the Analyze subagent.
    pub fn analyst_system_prompt(global_context: &str) -> String {
        let base = "You are an expert analyst. Examine the provided information carefully, \
            identify the key facts and relationships, and produce a clear, well-organized \
            analysis. Be precise and avoid speculation beyond the given material.";
        Self::with_global_context(base, global_context)
    }

    /// System prompt for the Report subagent.
    pub fn report_system_prompt(global_context: &str) -> String {
        let base = "You are a professional report writer. Produce the final answer as \
            well-structured Markdown with headings and lists where appropriate. Start with a \
            top-level heading. When the provided context contains image URLs with \
            descriptions, embed the most relevant images using standard Markdown image \
            syntax: ![description](url). Write in the same language as the user's request.";
        Self::with_global_context(base, global_context)
    }

    /// User prompt shared by Analyze and Report: prepend the accumulated
    /// context when present, otherwise use the task description verbatim.
    pub fn context_user_prompt(description: &str, context: &[String]) -> String {
        if context.is_empty() {
            description.to_string()
        } else {
            format!(
                "Analyze the following information and {}:\n\n{}",
                description,
                context.join("\n\n")
            )
        }
    }

    /// System prompt for skill selection.
    pub fn skill_selection_system_prompt() -> String {
        "You select the single most suitable skill for a user request. \
        Respond with exactly the skill name and nothing else."
            .to_string()
    }

    /// User message listing the available skills.
    pub fn skill_selection_user_message(prompt: &str, listing: &str) -> String {
        format!(
            "User request:\n{}\n\nAvailable skills (name: description):\n{}\n\n\
            Respond with exactly one skill name from the list.",
            prompt, listing
        )
    }

    /// System message for executing a selected skill: the skill body plus a
    /// context section the scripts rely on.
    pub fn skill_system_message(package: &SkillPackage) -> String {
        format!(
            "{}\n\n## SKILL CONTEXT\n- Skill Root Path: {}",
            package.body,
            package.path.display()
        )
    }

    fn with_global_context(base: &str, global_context: &str) -> String {
        if global_context.is_empty() {
            base.to_string()
        } else {
            format!(
                "{}\n\n## Additional User Guidance\n{}",
                base, global_context
            )
        }
    }
}
