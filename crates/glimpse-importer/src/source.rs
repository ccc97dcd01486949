use crate::error::{ImportError, Result};
use serde_json::Value;
use std::path::Path;

/// Splits an import document into records.
///
/// The whole text is first read as one JSON value: an array yields its
/// elements, anything else is a single record. Text that is not one JSON
/// value is read as JSON Lines, skipping blank lines and lines starting with
/// `#`. A JSON Lines line that does not parse fails the whole load, so
/// nothing is inserted from a half-understood file.
pub fn parse_records(text: &str) -> Result<Vec<Value>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(single) => Ok(vec![single]),
        Err(_) => parse_json_lines(text),
    }
}

fn parse_json_lines(text: &str) -> Result<Vec<Value>> {
    let mut records = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let record = serde_json::from_str(line).map_err(|e| ImportError::InvalidLine {
            line: index + 1,
            reason: e.to_string(),
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Reads and parses an import file.
pub async fn load_file(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ImportError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    parse_records(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_has_no_records() {
        assert!(parse_records("").unwrap().is_empty());
        assert!(parse_records("  \n\t ").unwrap().is_empty());
    }

    #[test]
    fn single_object() {
        let records = parse_records(r#"{"name":"Ada"}"#).unwrap();
        assert_eq!(records, vec![json!({"name": "Ada"})]);
    }

    #[test]
    fn array_of_mixed_values() {
        let records = parse_records(r#"[1, {"x":true}]"#).unwrap();
        assert_eq!(records, vec![json!(1), json!({"x": true})]);
    }

    #[test]
    fn json_lines_skip_blank_and_comment_lines() {
        let records = parse_records("{\"a\":1}\n\n# comment\n{\"b\":2}").unwrap();
        assert_eq!(records, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn json_lines_keep_non_objects_for_the_importer_to_skip() {
        let records = parse_records("{\"a\":1}\n\"text\"\n[1,2]").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], json!("text"));
    }

    #[test]
    fn invalid_line_reports_its_number() {
        let err = parse_records("{\"a\":1}\n# fine\n{oops}\n{\"b\":2}").unwrap_err();
        assert!(matches!(err, ImportError::InvalidLine { line: 3, .. }));
    }

    #[test]
    fn line_numbers_count_leading_blank_lines() {
        let err = parse_records("\n\n{\"a\":1}\n{bad}").unwrap_err();
        assert!(matches!(err, ImportError::InvalidLine { line: 4, .. }));
    }

    #[test]
    fn windows_line_endings() {
        let records = parse_records("{\"a\":1}\r\n{\"b\":2}\r\n").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn load_missing_file() {
        let err = load_file("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }

    #[tokio::test]
    async fn load_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.json");
        tokio::fs::write(&path, r#"[{"a":1},{"b":2}]"#).await.unwrap();

        let records = load_file(&path).await.unwrap();
        assert_eq!(records.len(), 2);
    }
}
