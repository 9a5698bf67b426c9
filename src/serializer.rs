//! Serialization module for writing generated documents as canonical JSON.
//!
//! Canonical JSON has object keys sorted at every nesting level, two-space indentation and a
//! trailing newline, so the same document always renders to the same bytes.

use crate::error::Result;
use anyhow::Context;
use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Serializes a document to canonical JSON, terminated by a newline.
///
/// # Errors
///
/// Returns an error if the document cannot be represented as JSON.
///
/// # Example
///
/// ```
/// use postman_from_source::serializer::to_canonical_json;
/// use serde_json::json;
///
/// let out = to_canonical_json(&json!({ "b": 1, "a": { "d": 2, "c": 3 } })).unwrap();
/// assert_eq!(out, "{\n  \"a\": {\n    \"c\": 3,\n    \"d\": 2\n  },\n  \"b\": 1\n}\n");
/// ```
pub fn to_canonical_json<T: Serialize>(doc: &T) -> Result<String> {
    let value = canonicalize(serde_json::to_value(doc)?);
    let mut json = serde_json::to_string_pretty(&value)?;
    json.push('\n');
    Ok(json)
}

/// Rebuilds `value` with every object's keys in sorted order.
///
/// `Value` is an owned tree, so the recursion depth is bounded by the nesting of the input.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Writes string content to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
/// Parent directories are created when missing.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> anyhow::Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
