//! Dataset parsers for billing exports

mod csv;
mod json;
mod xlsx;

pub use self::csv::CsvDatasetParser;
pub use self::json::JsonDatasetParser;
pub use self::xlsx::XlsxDatasetParser;

use crate::services::normalizer::normalize;
use crate::types::{coerce_amount, BillingRecord, Result, TelcoError};
use fs2::FileExt;
use rayon::prelude::*;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Named columns of the billing sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Client,
    Emitter,
    CustomerType,
    Period,
    Total,
    MobileLines,
    HomeInternet,
    AdditionalServices,
    AdjustmentNotes,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Self::Client,
        Self::Emitter,
        Self::CustomerType,
        Self::Period,
        Self::Total,
        Self::MobileLines,
        Self::HomeInternet,
        Self::AdditionalServices,
        Self::AdjustmentNotes,
    ];

    /// Header as it appears in the source sheet
    pub fn header(&self) -> &'static str {
        match self {
            Self::Client => "Cliente",
            Self::Emitter => "Emisora",
            Self::CustomerType => "Tipo de Cliente",
            Self::Period => "Periodo",
            Self::Total => "Total",
            Self::MobileLines => "Líneas móviles",
            Self::HomeInternet => "Internet hogar",
            Self::AdditionalServices => "Servicios adicionales",
            Self::AdjustmentNotes => "Notas de ajuste",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            Self::Client | Self::Emitter | Self::Period | Self::Total
        )
    }

    /// Match a source header regardless of case, accents and punctuation
    pub fn from_header(header: &str) -> Option<Self> {
        let wanted = normalize(header);
        Self::ALL
            .into_iter()
            .find(|column| normalize(column.header()) == wanted)
    }
}

/// Records and source headers of one parsed file
#[derive(Debug, Clone, Default)]
pub struct ParsedDataset {
    pub columns: Vec<String>,
    pub records: Vec<BillingRecord>,
}

/// Fail with a schema error when a required column is absent
pub(crate) fn check_required(found: &[Column]) -> Result<()> {
    let missing: Vec<&str> = Column::ALL
        .iter()
        .filter(|c| c.is_required() && !found.contains(c))
        .map(|c| c.header())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TelcoError::Schema(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

/// Build a record from a cell lookup; absent cells become "" / 0
pub(crate) fn build_record<F>(cell: F) -> BillingRecord
where
    F: Fn(Column) -> Option<String>,
{
    let text = |column| cell(column).map(|s| s.trim().to_string()).unwrap_or_default();
    let amount = |column| cell(column).map(|s| coerce_amount(&s)).unwrap_or(0.0);

    BillingRecord {
        client: text(Column::Client),
        emitter: text(Column::Emitter),
        customer_type: text(Column::CustomerType),
        period: text(Column::Period),
        total: amount(Column::Total),
        mobile_lines: amount(Column::MobileLines),
        home_internet: amount(Column::HomeInternet),
        additional_services: amount(Column::AdditionalServices),
        adjustment_notes: amount(Column::AdjustmentNotes),
    }
}

/// Trait for parsing billing datasets from a file format
pub trait DatasetParser: Send + Sync {
    /// Parser name (e.g., "csv")
    fn name(&self) -> &str;

    /// Lower-case file extensions handled by this parser
    fn extensions(&self) -> &[&str];

    /// Parse the full text of a dataset file
    fn parse_str(&self, content: &str) -> Result<ParsedDataset>;

    /// Parse raw file contents; text formats decode UTF-8 (lossy, BOM stripped)
    fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedDataset> {
        let content = String::from_utf8_lossy(bytes);
        self.parse_str(content.trim_start_matches('\u{feff}'))
    }

    /// Read a file under a shared lock and parse it
    fn parse_file(&self, path: &Path) -> Result<ParsedDataset> {
        let file = File::open(path)?;
        FileExt::lock_shared(&file)?;

        let mut bytes = Vec::new();
        let read = (&file).read_to_end(&mut bytes);
        let _ = FileExt::unlock(&file);
        read?;

        self.parse_bytes(&bytes).map_err(|e| match e {
            TelcoError::Schema(msg) => TelcoError::Schema(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }
}

/// Registry of available dataset parsers
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DatasetParser>>,
}

impl ParserRegistry {
    /// Create a new registry with default parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(CsvDatasetParser),
                Box::new(JsonDatasetParser),
                Box::new(XlsxDatasetParser),
            ],
        }
    }

    /// Get all registered parsers
    pub fn parsers(&self) -> &[Box<dyn DatasetParser>] {
        &self.parsers
    }

    /// Find the parser for a file by its extension
    pub fn for_path(&self, path: &Path) -> Option<&dyn DatasetParser> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.parsers
            .iter()
            .find(|p| p.extensions().contains(&ext.as_str()))
            .map(|p| p.as_ref())
    }

    /// Parse a dataset file, or every supported file of a directory.
    ///
    /// Directory files are parsed in parallel and concatenated in path order.
    /// Any failing file fails the whole load.
    pub fn parse_path(&self, path: &Path) -> Result<ParsedDataset> {
        let files = if path.is_dir() {
            self.collect_files(path)
        } else {
            vec![path.to_path_buf()]
        };

        if files.is_empty() {
            return Err(TelcoError::Config(format!(
                "no dataset files found in {}",
                path.display()
            )));
        }

        let parsed: Vec<ParsedDataset> = files
            .par_iter()
            .map(|file| {
                let parser = self.for_path(file).ok_or_else(|| {
                    TelcoError::Config(format!("unsupported dataset file: {}", file.display()))
                })?;
                parser.parse_file(file)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut merged = ParsedDataset::default();
        for dataset in parsed {
            if merged.columns.is_empty() {
                merged.columns = dataset.columns;
            }
            merged.records.extend(dataset.records);
        }
        Ok(merged)
    }

    /// Supported files directly inside `dir`, sorted by path
    fn collect_files(&self, dir: &Path) -> Vec<PathBuf> {
        let pattern = dir.join("*");
        let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
            .map(|paths| {
                paths
                    .filter_map(|e| e.ok())
                    .filter(|p| p.is_file() && self.for_path(p).is_some())
                    .collect()
            })
            .unwrap_or_default();
        files.sort();
        files
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn test_column_from_header_ignores_accents_and_case() {
        assert_eq!(Column::from_header("Líneas móviles"), Some(Column::MobileLines));
        assert_eq!(Column::from_header("LINEAS MOVILES"), Some(Column::MobileLines));
        assert_eq!(Column::from_header(" tipo de cliente "), Some(Column::CustomerType));
        assert_eq!(Column::from_header("Observaciones"), None);
    }

    #[test]
    fn test_check_required_lists_missing() {
        let err = check_required(&[Column::Client, Column::Total]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Emisora"));
        assert!(msg.contains("Periodo"));
        assert!(!msg.contains("Cliente"));
    }

    #[test]
    fn test_registry_for_path() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.parsers().len(), 3);
        assert_eq!(registry.for_path(Path::new("a/b.CSV")).map(|p| p.name()), Some("csv"));
        assert_eq!(registry.for_path(Path::new("b.jsonl")).map(|p| p.name()), Some("json"));
        assert_eq!(registry.for_path(Path::new("b.xlsx")).map(|p| p.name()), Some("xlsx"));
        assert_eq!(registry.for_path(Path::new("old.XLS")).map(|p| p.name()), Some("xlsx"));
        assert!(registry.for_path(Path::new("b.pdf")).is_none());
        assert!(registry.for_path(Path::new("noext")).is_none());
    }

    #[test]
    fn test_parse_path_single_file() {
        let registry = ParserRegistry::new();
        let dataset = registry.parse_path(&fixture("billing-sample.csv")).unwrap();
        assert_eq!(dataset.records.len(), 8);
        assert_eq!(dataset.columns[0], "Cliente");
    }

    #[test]
    fn test_parse_path_directory_concatenates_in_order() {
        let registry = ParserRegistry::new();
        let dataset = registry.parse_path(&fixture("multi")).unwrap();
        // 01-jun.csv (2) + 02-jul.jsonl (2)
        assert_eq!(dataset.records.len(), 4);
        assert_eq!(dataset.records[0].period, "Jun-2025");
        assert_eq!(dataset.records[3].period, "Jul-2025");
    }

    #[test]
    fn test_parse_path_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ParserRegistry::new();
        let err = registry.parse_path(dir.path()).unwrap_err();
        assert!(matches!(err, TelcoError::Config(_)));
    }

    #[test]
    fn test_parse_path_missing_file() {
        let registry = ParserRegistry::new();
        let err = registry.parse_path(&fixture("nonexistent.csv")).unwrap_err();
        assert!(matches!(err, TelcoError::Io(_)));
    }
}
