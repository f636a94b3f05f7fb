//! Serialization of parse results.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::DocumentResult;

/// Output formatting for the JSON document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Human-readable, indented.
    #[default]
    Pretty,
    /// Single line, smallest output.
    Compact,
}

/// Serialize a result to JSON in the requested format.
pub fn to_json(result: &DocumentResult, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(result)?,
        JsonFormat::Compact => serde_json::to_string(result)?,
    };
    Ok(json)
}

/// Serialize a result to a JSON file.
pub fn write_json<P: AsRef<Path>>(
    result: &DocumentResult,
    path: P,
    format: JsonFormat,
) -> Result<()> {
    fs::write(path, to_json(result, format)?)?;
    Ok(())
}

/// Render a result as plain text with page separators.
pub fn to_page_text(result: &DocumentResult) -> String {
    let mut out = String::new();
    for page in &result.pages {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("--- Page {} ---\n", page.page_number));
        let text = page.plain_text();
        if !text.is_empty() {
            out.push_str(&text);
            out.push('\n');
        }
    }
    out
}
