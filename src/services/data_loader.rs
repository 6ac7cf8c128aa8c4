//! Dataset loading service
//!
//! Resolves the configured dataset location and parses it into billing
//! records. The store calls this on startup and on every reload.

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::parsers::ParserRegistry;
use crate::services::config::Config;
use crate::types::{BillingRecord, Result};

/// Records read from one dataset source
#[derive(Debug, Clone, Default)]
pub struct LoadedDataset {
    pub source: PathBuf,
    /// Headers as they appear in the source
    pub columns: Vec<String>,
    pub records: Vec<BillingRecord>,
}

/// Anything able to produce a full dataset on demand
pub trait DatasetSource: Send + Sync {
    fn load(&self) -> Result<LoadedDataset>;
}

/// Loads the dataset from the filesystem
pub struct DataLoaderService {
    registry: ParserRegistry,
    config: Config,
}

impl DataLoaderService {
    pub fn new(config: Config) -> Self {
        Self {
            registry: ParserRegistry::new(),
            config,
        }
    }
}

impl DatasetSource for DataLoaderService {
    /// Resolve the path (on every call, so a file that appears later is
    /// picked up by the next reload) and parse it
    fn load(&self) -> Result<LoadedDataset> {
        let started = Instant::now();
        let source = self.config.resolve_dataset()?;
        let parsed = self.registry.parse_path(&source)?;

        info!(
            rows = parsed.records.len(),
            source = %source.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "dataset loaded"
        );

        Ok(LoadedDataset {
            source,
            columns: parsed.columns,
            records: parsed.records,
        })
    }
}
