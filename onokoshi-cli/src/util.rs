use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Route text from `file`, or from stdin when no file is given.
pub fn read_route_text(file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("reading route text from stdin")?;
    Ok(text)
}

/// Clean up a user-entered display name, rejecting blank input.
pub fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
