//! JSON / JSONL billing export parser

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::{build_record, check_required, Column, DatasetParser, ParsedDataset};
use crate::types::{Result, TelcoError};

/// Parser for JSON arrays of row objects and JSONL (one object per line)
pub struct JsonDatasetParser;

/// Flatten a JSON cell to text; null becomes empty
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn into_object(value: Value, position: usize) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(TelcoError::Parse(format!(
            "row {} is not a JSON object",
            position + 1
        ))),
    }
}

fn read_rows(content: &str) -> Result<Vec<Map<String, Value>>> {
    let trimmed = content.trim_start();

    if trimmed.starts_with('[') {
        let rows: Vec<Value> = serde_json::from_str(trimmed)
            .map_err(|e| TelcoError::Parse(format!("invalid JSON array: {}", e)))?;
        return rows
            .into_iter()
            .enumerate()
            .map(|(i, v)| into_object(v, i))
            .collect();
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let value: Value = serde_json::from_str(line)
                .map_err(|e| TelcoError::Parse(format!("line {}: {}", i + 1, e)))?;
            into_object(value, i)
        })
        .collect()
}

impl DatasetParser for JsonDatasetParser {
    fn name(&self) -> &str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json", "jsonl"]
    }

    fn parse_str(&self, content: &str) -> Result<ParsedDataset> {
        let rows = read_rows(content)?;

        // Union of keys, in first-seen order
        let mut columns: Vec<String> = Vec::new();
        let mut resolved: HashMap<String, Option<Column>> = HashMap::new();
        for row in &rows {
            for key in row.keys() {
                if !resolved.contains_key(key) {
                    resolved.insert(key.clone(), Column::from_header(key));
                    columns.push(key.clone());
                }
            }
        }

        if !rows.is_empty() {
            let found: Vec<Column> = resolved.values().flatten().copied().collect();
            check_required(&found)?;
        }

        let records = rows
            .iter()
            .map(|row| {
                build_record(|column| {
                    row.iter()
                        .find(|(key, _)| resolved.get(*key).copied().flatten() == Some(column))
                        .map(|(_, value)| cell_text(value))
                })
            })
            .collect();

        Ok(ParsedDataset { columns, records })
    }
}
