use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Read a typed document from `--input <file>` (JSON, or YAML by extension)
/// or from piped stdin (JSON).
pub fn read_document<T: DeserializeOwned>(
    path: &Option<String>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return read_file(path);
    }
    if let Some(value) = read_stdin()? {
        return Ok(serde_json::from_value(value)?);
    }
    Err(format!("--input <file> or stdin required for {what}").into())
}

fn read_file<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    if !p.is_file() {
        return Err(format!("File not found: {path}").into());
    }
    let contents =
        fs::read_to_string(p).map_err(|e| format!("Failed to read '{path}': {e}"))?;

    let is_yaml = matches!(
        p.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    );
    if is_yaml {
        Ok(serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{path}': {e}"))?)
    } else {
        Ok(serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{path}': {e}"))?)
    }
}

/// Attempt to read JSON from stdin if data is being piped.
/// Returns None if stdin is a TTY (interactive).
fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(trimmed)?;
    Ok(Some(value))
}
