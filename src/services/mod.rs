//! Services for loading, aggregating and answering questions about billing data

pub mod aggregator;
pub mod comparison;
pub mod config;
pub mod data_loader;
pub mod dispatcher;
pub mod formatter;
pub mod normalizer;
pub mod period;
pub mod store;

pub use aggregator::Aggregator;
pub use config::Config;
pub use data_loader::{DataLoaderService, DatasetSource, LoadedDataset};
pub use normalizer::normalize;
pub use store::{DatasetStore, Snapshot};
