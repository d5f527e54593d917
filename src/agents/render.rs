use crate::agents::Subagent;
use crate::planner::{Task, TaskResult, TaskType};
use async_trait::async_trait;
use pulldown_cmark::{html, Parser};
use serde_json::json;
use tokio_util::sync::CancellationToken;

const TERMINAL_WIDTH: usize = 80;
const TERMINAL_INDENT: usize = 6;
const REPORT_HEADER: &str = "Output from REPORT task:";
const OUTPUT_HEADER_PREFIX: &str = "Output from ";

/// Presents the finished report: either a terminal-formatted Markdown
/// rendering or a complete HTML page, selected at construction time.
pub struct RenderAgent {
    html: bool,
}

impl RenderAgent {
    pub fn new(html: bool) -> Self {
        Self { html }
    }

    /// Resolution order: explicit content parameter, then the most recent
    /// report output in the context, then the last context entry, then the
    /// task description.
    fn resolve_content(task: &Task) -> String {
        if let Some(content) = &task.parameters.content {
            return content.clone();
        }

        let context = &task.parameters.context;
        if let Some(entry) = context
            .iter()
            .rev()
            .find(|entry| entry.starts_with(REPORT_HEADER))
        {
            return strip_header(entry);
        }
        if let Some(entry) = context.last() {
            return strip_header(entry);
        }

        task.description.clone()
    }
}

/// Drop the "Output from X task:" header line, if present.
fn strip_header(entry: &str) -> String {
    if entry.starts_with(OUTPUT_HEADER_PREFIX) {
        match entry.split_once('\n') {
            Some((_, body)) => body.to_string(),
            None => String::new(),
        }
    } else {
        entry.to_string()
    }
}

#[async_trait]
impl Subagent for RenderAgent {
    fn task_type(&self) -> TaskType {
        TaskType::Render
    }

    async fn execute(&self, cancel: &CancellationToken, task: &Task) -> TaskResult {
        if cancel.is_cancelled() {
            return TaskResult::failure(TaskType::Render, "Rendering cancelled".to_string());
        }

        let content = Self::resolve_content(task);
        let (output, format) = if self.html {
            (render_html_page(&content), "html")
        } else {
            (render_markdown_terminal(&content), "terminal")
        };

        TaskResult::ok(TaskType::Render, output).with_metadata("format", json!(format))
    }
}

/// Render Markdown for a terminal: headings in bold, everything wrapped to
/// the configured width behind a fixed leading indent. Content passes
/// through line by line so nothing is dropped or reordered.
pub fn render_markdown_terminal(markdown: &str) -> String {
    let indent = " ".repeat(TERMINAL_INDENT);
    let width = TERMINAL_WIDTH - TERMINAL_INDENT;
    let mut out = Vec::new();
    let mut in_code_block = false;

    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            out.push(format!("{}{}", indent, line));
            continue;
        }
        if in_code_block {
            out.push(format!("{}{}", indent, line));
            continue;
        }

        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            out.push(String::new());
        } else if trimmed.starts_with('#') {
            let heading = trimmed.trim_start_matches('#').trim_start();
            out.push(format!("{}\x1b[1m{}\x1b[0m", indent, heading));
        } else {
            out.push(wrap_line(trimmed, width, &indent));
        }
    }

    out.join("\n")
}

fn wrap_line(text: &str, width: usize, indent: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in words {
        if !current_line.is_empty() && current_line.len() + word.len() + 1 > width {
            lines.push(format!("{}{}", indent, current_line));
            current_line.clear();
        }
        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }
    if !current_line.is_empty() {
        lines.push(format!("{}{}", indent, current_line));
    }

    if lines.is_empty() {
        format!("{}{}", indent, text)
    } else {
        lines.join("\n")
    }
}

/// Render Markdown as a complete HTML page. Links open in a new tab via a
/// base target.
pub fn render_html_page(markdown: &str) -> String {
    let mut body = String::new();
    html::push_html(&mut body, Parser::new(markdown));

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
        <base target=\"_blank\">\n<title>Report</title>\n\
        <style>body {{ max-width: 48rem; margin: 2rem auto; font-family: sans-serif; line-height: 1.6; }}</style>\n\
        </head>\n<body>\n{}</body>\n</html>\n",
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::Task;

    fn render_task() -> Task {
        Task::new(2, TaskType::Render, "present the report")
    }

    #[tokio::test]
    async fn test_content_parameter_wins() {
        let mut task = render_task().with_content("# Direct");
        task.parameters.context = vec!["Output from REPORT task:\n# FromContext".to_string()];
        let result = RenderAgent::new(false)
            .execute(&CancellationToken::new(), &task)
            .await;
        assert!(result.output.contains("Direct"));
        assert!(!result.output.contains("FromContext"));
    }

    #[tokio::test]
    async fn test_most_recent_report_entry_is_selected() {
        let mut task = render_task();
        task.parameters.context = vec![
            "Output from REPORT task:\nold report".to_string(),
            "Output from ANALYZE task:\nanalysis".to_string(),
            "Output from REPORT task:\nnew report".to_string(),
            "Output from SEARCH task:\nlate search".to_string(),
        ];
        let result = RenderAgent::new(false)
            .execute(&CancellationToken::new(), &task)
            .await;
        assert!(result.output.contains("new report"));
        assert!(!result.output.contains("old report"));
        assert!(!result.output.contains("late search"));
    }

    #[tokio::test]
    async fn test_falls_back_to_last_entry_then_description() {
        let mut task = render_task();
        task.parameters.context = vec!["Output from ANALYZE task:\nonly analysis".to_string()];
        let result = RenderAgent::new(false)
            .execute(&CancellationToken::new(), &task)
            .await;
        assert!(result.output.contains("only analysis"));
        assert!(!result.output.contains("Output from"));

        let empty = render_task();
        let result = RenderAgent::new(false)
            .execute(&CancellationToken::new(), &empty)
            .await;
        assert!(result.output.contains("present the report"));
    }

    #[tokio::test]
    async fn test_report_round_trip_preserves_content() {
        // A render fed report output reproduces the report's text modulo
        // formatting: every word survives in order.
        let report = "# Tea\n\nTea is an aromatic beverage.\n\n- green\n- black";
        let mut task = render_task();
        task.parameters.context = vec![format!("Output from REPORT task:\n{}", report)];

        let result = RenderAgent::new(false)
            .execute(&CancellationToken::new(), &task)
            .await;
        let plain: String = result
            .output
            .replace("\x1b[1m", "")
            .replace("\x1b[0m", "");
        let rendered_words: Vec<&str> = plain.split_whitespace().collect();
        let report_words: Vec<&str> = report
            .split_whitespace()
            .filter(|w| *w != "#")
            .collect();
        // Every report word appears, in order, in the rendering.
        let mut cursor = 0;
        for word in report_words {
            let word = word.trim_start_matches('#');
            let position = rendered_words[cursor..]
                .iter()
                .position(|w| *w == word)
                .unwrap_or_else(|| panic!("word '{}' missing from rendering", word));
            cursor += position + 1;
        }
    }

    #[tokio::test]
    async fn test_terminal_rendering_wraps_with_indent() {
        let long = "word ".repeat(60);
        let mut task = render_task();
        task.parameters.context = vec![format!("Output from REPORT task:\n{}", long)];

        let result = RenderAgent::new(false)
            .execute(&CancellationToken::new(), &task)
            .await;
        for line in result.output.lines().filter(|l| !l.is_empty()) {
            assert!(line.starts_with("      "), "line not indented: {:?}", line);
            assert!(line.len() <= 80, "line too long: {:?}", line);
        }
    }

    #[tokio::test]
    async fn test_html_mode_produces_complete_page() {
        let mut task = render_task().with_content("# Title\n\n[link](https://example.com)");
        task.parameters.context = vec![];
        let result = RenderAgent::new(true)
            .execute(&CancellationToken::new(), &task)
            .await;
        assert!(result.output.starts_with("<!DOCTYPE html>"));
        assert!(result.output.contains("<base target=\"_blank\">"));
        assert!(result.output.contains("<h1>Title</h1>"));
        assert_eq!(result.metadata["format"], "html");
    }
}
