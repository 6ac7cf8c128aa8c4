//! Excel workbook billing export parser

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use chrono::Datelike;

use super::{build_record, check_required, Column, DatasetParser, ParsedDataset};
use crate::services::normalizer::normalize;
use crate::services::period::PeriodKey;
use crate::types::{Result, TelcoError};

/// Sheet holding the billing lines; the first sheet is used when absent
pub const BILLING_SHEET: &str = "Base Facturación";

/// Parser for `.xlsx` / `.xls` workbooks
pub struct XlsxDatasetParser;

/// Flatten a cell to text. Date cells become month labels ("Jul-2025")
/// and error cells (`#N/A`, `#DIV/0!`) become empty.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .and_then(|dt| PeriodKey::from_year_month(dt.year() as u32, dt.month()))
            .map(|key| key.label())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

/// `Base Facturación` when present (accent and case insensitive), else the first sheet
fn pick_sheet(names: &[String]) -> Option<&String> {
    let wanted = normalize(BILLING_SHEET);
    names
        .iter()
        .find(|name| normalize(name) == wanted)
        .or_else(|| names.first())
}

impl DatasetParser for XlsxDatasetParser {
    fn name(&self) -> &str {
        "xlsx"
    }

    fn extensions(&self) -> &[&str] {
        &["xlsx", "xlsm", "xls"]
    }

    fn parse_str(&self, content: &str) -> Result<ParsedDataset> {
        self.parse_bytes(content.as_bytes())
    }

    fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedDataset> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let names = workbook.sheet_names();
        let sheet = pick_sheet(&names)
            .cloned()
            .ok_or_else(|| TelcoError::Schema("workbook has no sheets".into()))?;
        let range = workbook.worksheet_range(&sheet)?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(|c| cell_text(c).trim().to_string()).collect())
            .unwrap_or_default();

        // First occurrence wins when a header repeats
        let mut index: HashMap<Column, usize> = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header) {
                index.entry(column).or_insert(i);
            }
        }
        let found: Vec<Column> = index.keys().copied().collect();
        check_required(&found).map_err(|e| match e {
            TelcoError::Schema(msg) => TelcoError::Schema(format!("sheet '{}': {}", sheet, msg)),
            other => other,
        })?;

        let records = rows
            .filter(|row| !row.iter().all(|c| matches!(c, Data::Empty)))
            .map(|row| {
                build_record(|column| {
                    index
                        .get(&column)
                        .and_then(|i| row.get(*i))
                        .map(cell_text)
                })
            })
            .collect();

        Ok(ParsedDataset {
            columns: headers,
            records,
        })
    }
}
