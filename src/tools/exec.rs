//! Shell and Python execution back-ends for the tool registry.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::process::Command;

static PYTHON: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Resolve the Python interpreter once per process: `python3` first, then
/// `python`, by PATH lookup.
pub fn python_interpreter() -> Result<&'static Path, String> {
    PYTHON
        .get_or_init(|| find_on_path("python3").or_else(|| find_on_path("python")))
        .as_deref()
        .ok_or_else(|| "Neither 'python3' nor 'python' was found on PATH".to_string())
}

fn find_on_path(binary: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(binary);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Execute an ephemeral shell snippet via `sh -c`, returning combined
/// stdout and stderr. Extra arguments are appended to the command line.
pub async fn run_shell_code(code: &str, args: Option<&str>) -> Result<String, String> {
    let command_line = match args {
        Some(extra) if !extra.trim().is_empty() => format!("{} {}", code, extra),
        _ => code.to_string(),
    };
    run_command(Command::new("sh").arg("-c").arg(&command_line), &command_line).await
}

/// Run a shell script file with arguments.
pub async fn run_shell_script(path: &Path, args: &[String]) -> Result<String, String> {
    if !path.is_file() {
        return Err(format!("Script not found: {}", path.display()));
    }
    run_command(
        Command::new("sh").arg(path).args(args),
        &path.display().to_string(),
    )
    .await
}

/// Execute an ephemeral Python snippet. Arguments are split on whitespace
/// and passed through as `sys.argv` entries.
pub async fn run_python_code(code: &str, args: Option<&str>) -> Result<String, String> {
    let interpreter = python_interpreter()?;
    let mut command = Command::new(interpreter);
    command.arg("-c").arg(code);
    if let Some(extra) = args {
        command.args(extra.split_whitespace());
    }
    run_command(&mut command, "python -c <code>").await
}

/// Run a Python script file with arguments.
pub async fn run_python_script(path: &Path, args: &[String]) -> Result<String, String> {
    let interpreter = python_interpreter()?;
    if !path.is_file() {
        return Err(format!("Script not found: {}", path.display()));
    }
    run_command(
        Command::new(interpreter).arg(path).args(args),
        &path.display().to_string(),
    )
    .await
}

async fn run_command(command: &mut Command, label: &str) -> Result<String, String> {
    let output = command
        .output()
        .await
        .map_err(|e| format!("Failed to execute '{}': {}", label, e))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&stderr);
    }

    if output.status.success() {
        Ok(combined)
    } else {
        Err(format!(
            "Command '{}' failed (exit code {:?}):\n{}",
            label,
            output.status.code(),
            combined
        ))
    }
}
