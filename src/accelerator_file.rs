use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::models::AcceleratorEntry;

/// Entries parsed from an accelerator file.
#[derive(Debug, Default)]
pub struct AcceleratorFile {
    pub entries: Vec<AcceleratorEntry>,
    /// Entries dropped because they were not objects with string fields.
    pub malformed: usize,
}

pub fn load_accelerator_file(path: &Path) -> Result<AcceleratorFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read accelerator file: {}", path.display()))?;
    parse_accelerators(&content)
        .with_context(|| format!("Invalid accelerator file: {}", path.display()))
}

/// Parse `{"accelerators": [...]}`.
///
/// Only the top-level key is required. Entries that cannot be read as an
/// accelerator are logged and dropped; field presence is checked later by
/// the store pipeline.
pub fn parse_accelerators(content: &str) -> Result<AcceleratorFile> {
    let doc: Value = serde_json::from_str(content)?;
    let list = doc
        .get("accelerators")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow::anyhow!("missing top-level 'accelerators' array"))?;

    let mut file = AcceleratorFile::default();
    for raw in list {
        match serde_json::from_value::<AcceleratorEntry>(raw.clone()) {
            Ok(entry) => file.entries.push(entry),
            Err(e) => {
                warn!("Skipping malformed accelerator entry {}: {}", raw, e);
                file.malformed += 1;
            }
        }
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_order() {
        let file = parse_accelerators(
            r#"{"accelerators": [
                {"name": "A", "url": "https://a", "category": "data"},
                {"name": "B", "url": "https://b"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(file.entries.len(), 2);
        assert_eq!(file.entries[0].category.as_deref(), Some("data"));
        assert!(file.entries[1].category.is_none());
        assert_eq!(file.malformed, 0);
    }

    #[test]
    fn keeps_entries_missing_fields_for_later_skip() {
        let file =
            parse_accelerators(r#"{"accelerators": [{"name": "NoUrl"}, {"url": "https://x"}]}"#)
                .unwrap();
        assert_eq!(file.entries.len(), 2);
        assert!(file.entries.iter().all(|e| e.required_fields().is_none()));
    }

    #[test]
    fn drops_non_object_entries() {
        let file = parse_accelerators(
            r#"{"accelerators": ["oops", {"name": 42, "url": "https://x"}, {"name": "ok", "url": "u"}]}"#,
        )
        .unwrap();
        assert_eq!(file.entries.len(), 1);
        assert_eq!(file.malformed, 2);
    }

    #[test]
    fn missing_top_level_key_is_an_error() {
        let err = parse_accelerators(r#"{"items": []}"#).unwrap_err();
        assert!(err.to_string().contains("accelerators"));
    }

    #[test]
    fn load_reports_path_on_failure() {
        let err = load_accelerator_file(Path::new("/nonexistent/accelerators.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/accelerators.json"));
    }
}
