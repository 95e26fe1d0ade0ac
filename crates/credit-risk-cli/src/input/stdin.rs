use serde_json::Value;
use std::io::{self, Read};

/// Profile, account or book document piped on stdin.
/// Returns None for an interactive terminal or an empty pipe.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

/// JSON when the document opens with `{` or `[`, YAML otherwise.
pub(crate) fn parse_piped(text: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str(trimmed)
            .map_err(|e| format!("Piped input is not valid JSON: {}", e))?
    } else {
        serde_yaml::from_str(trimmed)
            .map_err(|e| format!("Piped input is neither JSON nor YAML: {}", e))?
    };
    Ok(Some(value))
}
