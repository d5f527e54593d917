//! File read/write back-ends for the tool registry.

use std::fs;
use std::path::{Path, PathBuf};

/// Resolve a path against the skill root. Absolute paths and paths with no
/// configured root pass through unchanged.
pub fn resolve_path(path: &str, root: Option<&Path>) -> PathBuf {
    let path_buf = PathBuf::from(path);
    match root {
        Some(root) if path_buf.is_relative() => root.join(path_buf),
        _ => path_buf,
    }
}

/// Read a file and return its contents.
pub fn read_file(path: &str, root: Option<&Path>) -> Result<String, String> {
    let resolved = resolve_path(path, root);
    fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read file '{}': {}", resolved.display(), e))
}

/// Write content to a file, creating parent directories as needed.
/// Returns a confirmation string for the LLM.
pub fn write_file(path: &str, content: &str, root: Option<&Path>) -> Result<String, String> {
    let resolved = resolve_path(path, root);
    if let Some(parent) = resolved.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                format!(
                    "Failed to create parent directories for '{}': {}",
                    resolved.display(),
                    e
                )
            })?;
        }
    }
    fs::write(&resolved, content)
        .map_err(|e| format!("Failed to write file '{}': {}", resolved.display(), e))?;
    Ok(format!(
        "Wrote {} bytes to {}",
        content.len(),
        resolved.display()
    ))
}
