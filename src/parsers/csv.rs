//! Delimited-text billing export parser

use std::collections::HashMap;

use super::{build_record, check_required, Column, DatasetParser, ParsedDataset};
use crate::types::Result;

/// Parser for CSV/TSV exports of the billing sheet
pub struct CsvDatasetParser;

/// Pick the delimiter that occurs most in the header line (`,` on ties)
fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    [b',', b';', b'\t']
        .into_iter()
        .max_by_key(|d| {
            let count = header.bytes().filter(|b| b == d).count();
            // prefer comma when counts are equal
            (count, *d == b',')
        })
        .unwrap_or(b',')
}

impl DatasetParser for CsvDatasetParser {
    fn name(&self) -> &str {
        "csv"
    }

    fn extensions(&self) -> &[&str] {
        &["csv", "tsv", "txt"]
    }

    fn parse_str(&self, content: &str) -> Result<ParsedDataset> {
        let mut reader = ::csv::ReaderBuilder::new()
            .delimiter(sniff_delimiter(content))
            .flexible(true)
            .trim(::csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        // First occurrence wins when a header repeats
        let mut index: HashMap<Column, usize> = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header) {
                index.entry(column).or_insert(i);
            }
        }
        let found: Vec<Column> = index.keys().copied().collect();
        check_required(&found)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            records.push(build_record(|column| {
                index
                    .get(&column)
                    .and_then(|i| row.get(*i))
                    .map(String::from)
            }));
        }

        Ok(ParsedDataset {
            columns: headers,
            records,
        })
    }
}
