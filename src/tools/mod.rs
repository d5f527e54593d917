//! Tool registry and executor.
//!
//! A tool is a named operation the LLM can request during a tool-call loop.
//! The registry advertises tool definitions in the OpenAI function-calling
//! shape and dispatches incoming calls to the matching back-end. Argument
//! decode failures and back-end failures are returned as `Err(String)` so
//! callers can feed them back to the model as tool-role messages instead of
//! aborting the loop.

pub mod exec;
pub mod file_system;
pub mod web;

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use web::SearchProvider;

/// Literal tool-role content returned when the user rejects a tool call.
/// The model is expected to recover from this message.
pub const TOOL_DENIED: &str = "Error: User denied tool execution.";

/// Tool definition advertised to the LLM
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: ToolFunction,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToolFunction {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub param_type: String,
    pub properties: serde_json::Value,
    pub required: Vec<String>,
}

impl ToolDefinition {
    fn function(
        name: &str,
        description: &str,
        properties: serde_json::Value,
        required: &[&str],
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: ToolFunction {
                name: name.to_string(),
                description: description.to_string(),
                parameters: ToolParameters {
                    param_type: "object".to_string(),
                    properties,
                    required: required.iter().map(|r| r.to_string()).collect(),
                },
            },
        }
    }
}

/// One tool invocation as requested by the LLM
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// JSON-encoded argument object
    pub arguments: String,
}

#[derive(Deserialize)]
struct ShellCodeArgs {
    code: String,
    #[serde(default)]
    args: Option<String>,
}

#[derive(Deserialize)]
struct ScriptArgs {
    #[serde(rename = "scriptPath")]
    script_path: String,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Deserialize)]
struct ReadFileArgs {
    #[serde(rename = "filePath")]
    file_path: String,
}

#[derive(Deserialize)]
struct WriteFileArgs {
    #[serde(rename = "filePath")]
    file_path: String,
    content: String,
}

#[derive(Deserialize)]
struct QueryArgs {
    query: String,
}

#[derive(Deserialize)]
struct UrlArgs {
    url: String,
}

#[derive(Deserialize)]
struct DynamicScriptArgs {
    #[serde(default)]
    args: Vec<String>,
}

/// Registry of built-in tools plus any skill-declared scripts.
pub struct ToolRegistry {
    skill_root: Option<PathBuf>,
    /// Skill script name -> on-disk path, dispatched by file extension.
    scripts: HashMap<String, PathBuf>,
    duckduckgo: Arc<dyn SearchProvider>,
    wikipedia: Arc<dyn SearchProvider>,
    http: reqwest::Client,
    search_results: usize,
}

impl ToolRegistry {
    pub fn new(duckduckgo: Arc<dyn SearchProvider>, wikipedia: Arc<dyn SearchProvider>) -> Self {
        Self {
            skill_root: None,
            scripts: HashMap::new(),
            duckduckgo,
            wikipedia,
            http: reqwest::Client::new(),
            search_results: 5,
        }
    }

    /// Scope the registry to a skill: relative file paths resolve against the
    /// skill root and each declared script becomes a synthetic tool.
    pub fn with_skill(mut self, root: &Path, scripts: &[PathBuf]) -> Self {
        self.skill_root = Some(root.to_path_buf());
        for script in scripts {
            if let Some(stem) = script.file_stem().and_then(|s| s.to_str()) {
                self.scripts.insert(stem.to_string(), script.clone());
            }
        }
        self
    }

    /// Tool definitions to advertise to the LLM.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut tools = vec![
            ToolDefinition::function(
                "run_shell_code",
                "Execute an ephemeral shell snippet and return combined stdout and stderr.",
                json!({
                    "code": {"type": "string", "description": "Shell code to execute."},
                    "args": {"type": "string", "description": "Optional arguments appended to the command."}
                }),
                &["code"],
            ),
            ToolDefinition::function(
                "run_shell_script",
                "Run a shell script file with arguments.",
                json!({
                    "scriptPath": {"type": "string", "description": "Path to the script file."},
                    "args": {"type": "array", "items": {"type": "string"}, "description": "Script arguments."}
                }),
                &["scriptPath"],
            ),
            ToolDefinition::function(
                "run_python_code",
                "Execute an ephemeral Python snippet and return combined stdout and stderr.",
                json!({
                    "code": {"type": "string", "description": "Python code to execute."},
                    "args": {"type": "string", "description": "Optional arguments passed to the snippet."}
                }),
                &["code"],
            ),
            ToolDefinition::function(
                "run_python_script",
                "Run a Python script file with arguments.",
                json!({
                    "scriptPath": {"type": "string", "description": "Path to the script file."},
                    "args": {"type": "array", "items": {"type": "string"}, "description": "Script arguments."}
                }),
                &["scriptPath"],
            ),
            ToolDefinition::function(
                "read_file",
                "Read a file and return its contents. Relative paths resolve against the skill root.",
                json!({
                    "filePath": {"type": "string", "description": "Path of the file to read."}
                }),
                &["filePath"],
            ),
            ToolDefinition::function(
                "write_file",
                "Write content to a file, creating parent directories as needed.",
                json!({
                    "filePath": {"type": "string", "description": "Path of the file to write."},
                    "content": {"type": "string", "description": "Content to write."}
                }),
                &["filePath", "content"],
            ),
            ToolDefinition::function(
                "duckduckgo_search",
                "Search the web with DuckDuckGo and return a text summary of results.",
                json!({
                    "query": {"type": "string", "description": "Search query."}
                }),
                &["query"],
            ),
            ToolDefinition::function(
                "wikipedia_search",
                "Search Wikipedia and return matching article summaries.",
                json!({
                    "query": {"type": "string", "description": "Search query."}
                }),
                &["query"],
            ),
            ToolDefinition::function(
                "web_fetch",
                "Fetch a URL and return its textual content.",
                json!({
                    "url": {"type": "string", "description": "URL to fetch."}
                }),
                &["url"],
            ),
        ];

        let mut script_names: Vec<&String> = self.scripts.keys().collect();
        script_names.sort();
        for name in script_names {
            let path = &self.scripts[name];
            tools.push(ToolDefinition::function(
                name,
                &format!("Run the skill script {}.", path.display()),
                json!({
                    "args": {"type": "array", "items": {"type": "string"}, "description": "Script arguments."}
                }),
                &[],
            ));
        }

        tools
    }

    /// Dispatch one tool call. The returned `Err` is a user-visible string
    /// meant to travel back to the LLM as tool-role content.
    pub async fn invoke(&self, call: &ToolCall) -> Result<String, String> {
        log::debug!("invoking tool '{}' ({})", call.name, call.id);

        match call.name.as_str() {
            "run_shell_code" => {
                let args: ShellCodeArgs = self.decode(call)?;
                exec::run_shell_code(&args.code, args.args.as_deref()).await
            }
            "run_shell_script" => {
                let args: ScriptArgs = self.decode(call)?;
                let path = self.resolve(&args.script_path);
                exec::run_shell_script(&path, &args.args).await
            }
            "run_python_code" => {
                let args: ShellCodeArgs = self.decode(call)?;
                exec::run_python_code(&args.code, args.args.as_deref()).await
            }
            "run_python_script" => {
                let args: ScriptArgs = self.decode(call)?;
                let path = self.resolve(&args.script_path);
                exec::run_python_script(&path, &args.args).await
            }
            "read_file" => {
                let args: ReadFileArgs = self.decode(call)?;
                file_system::read_file(&args.file_path, self.skill_root.as_deref())
            }
            "write_file" => {
                let args: WriteFileArgs = self.decode(call)?;
                file_system::write_file(&args.file_path, &args.content, self.skill_root.as_deref())
            }
            "duckduckgo_search" => {
                let args: QueryArgs = self.decode(call)?;
                self.duckduckgo.search(&args.query, self.search_results).await
            }
            "wikipedia_search" => {
                let args: QueryArgs = self.decode(call)?;
                self.wikipedia.search(&args.query, self.search_results).await
            }
            "web_fetch" => {
                let args: UrlArgs = self.decode(call)?;
                web::fetch_url(&self.http, &args.url).await
            }
            name => match self.scripts.get(name) {
                Some(path) => {
                    let args: DynamicScriptArgs = self.decode(call)?;
                    let is_python = path
                        .extension()
                        .and_then(|e| e.to_str())
                        .map_or(false, |e| e.eq_ignore_ascii_case("py"));
                    if is_python {
                        exec::run_python_script(path, &args.args).await
                    } else {
                        exec::run_shell_script(path, &args.args).await
                    }
                }
                None => Err(format!("Error: unknown tool '{}'", name)),
            },
        }
    }

    fn decode<'a, T: Deserialize<'a>>(&self, call: &'a ToolCall) -> Result<T, String> {
        serde_json::from_str(&call.arguments)
            .map_err(|e| format!("Error: invalid arguments for tool '{}': {}", call.name, e))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        file_system::resolve_path(path, self.skill_root.as_deref())
    }
}
