//! Published dataset snapshot and atomic reload

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::services::data_loader::{DatasetSource, LoadedDataset};
use crate::services::dispatcher;
use crate::services::period::PeriodKey;
use crate::services::Aggregator;
use crate::types::{
    AggregateRow, Answer, BillingRecord, MetaReport, PeriodTotal, Result, StatusReport,
};

const LOADED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Records plus the four standing aggregate tables, built together
#[derive(Debug)]
pub struct Snapshot {
    pub version: u64,
    pub source: PathBuf,
    pub columns: Vec<String>,
    pub records: Vec<BillingRecord>,
    pub by_period: Vec<PeriodTotal>,
    pub by_emitter: Vec<AggregateRow>,
    pub by_service: Vec<AggregateRow>,
    /// Ranked descending, for top-N queries
    pub by_client: Vec<AggregateRow>,
    pub loaded_at: DateTime<Local>,
}

impl Snapshot {
    pub fn build(dataset: LoadedDataset, version: u64) -> Self {
        let records = dataset.records;

        let unparseable = records
            .iter()
            .filter(|r| PeriodKey::parse(&r.period).is_none())
            .count();
        if unparseable > 0 {
            warn!(
                rows = unparseable,
                "period labels without a recognizable month; excluded from comparisons"
            );
        }

        Self {
            version,
            source: dataset.source,
            columns: dataset.columns,
            by_period: Aggregator::totals_by_period(&records),
            by_emitter: Aggregator::totals_by_emitter(&records),
            by_service: Aggregator::totals_by_service(&records),
            by_client: Aggregator::totals_by_client(&records),
            records,
            loaded_at: Local::now(),
        }
    }

    pub fn loaded_at_label(&self) -> String {
        self.loaded_at.format(LOADED_AT_FORMAT).to_string()
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            ok: true,
            file: self.source.display().to_string(),
            rows: self.records.len(),
            loaded_at: self.loaded_at_label(),
            version: self.version,
        }
    }

    pub fn meta(&self) -> MetaReport {
        MetaReport {
            columns: self.columns.clone(),
            rows: self.records.len(),
            preview: self.records.iter().take(3).cloned().collect(),
            loaded_at: self.loaded_at_label(),
        }
    }
}

/// Process-wide dataset holder.
///
/// Readers clone the current `Arc<Snapshot>` and never see a partial reload;
/// reloads are serialized and swap the pointer in one step.
pub struct DatasetStore {
    source: Box<dyn DatasetSource>,
    current: RwLock<Arc<Snapshot>>,
    reload_lock: Mutex<()>,
}

impl DatasetStore {
    /// Load the initial snapshot from `source`
    pub fn open(source: Box<dyn DatasetSource>) -> Result<Self> {
        let snapshot = Snapshot::build(source.load()?, 1);
        Ok(Self {
            source,
            current: RwLock::new(Arc::new(snapshot)),
            reload_lock: Mutex::new(()),
        })
    }

    /// Current point-in-time snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        // The guarded value is an immutable Arc, so a poisoned lock is still consistent
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Rebuild the snapshot from the source and publish it.
    ///
    /// On failure the previous snapshot stays published.
    pub fn reload(&self) -> Result<Arc<Snapshot>> {
        let _serialized = self.reload_lock.lock().unwrap_or_else(|e| e.into_inner());

        let version = self.snapshot().version + 1;
        let fresh = Arc::new(Snapshot::build(self.source.load()?, version));

        {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            *current = Arc::clone(&fresh);
        }

        info!(
            version,
            rows = fresh.records.len(),
            "snapshot published"
        );
        Ok(fresh)
    }

    /// Answer a prompt against the current snapshot
    pub fn ask(&self, prompt: &str) -> Answer {
        dispatcher::ask(&self.snapshot(), prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::config::Config;
    use crate::services::data_loader::DataLoaderService;
    use crate::types::TelcoError;
    use std::fs;
    use std::sync::Barrier;
    use std::thread;

    /// In-memory source whose records can be replaced between loads
    struct SwapSource {
        records: Mutex<Option<Vec<BillingRecord>>>,
    }

    impl SwapSource {
        fn new(records: Vec<BillingRecord>) -> Self {
            Self {
                records: Mutex::new(Some(records)),
            }
        }
    }

    impl DatasetSource for Arc<SwapSource> {
        fn load(&self) -> Result<LoadedDataset> {
            let records = self
                .records
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| TelcoError::Dataset("source unavailable".into()))?;
            Ok(LoadedDataset {
                source: PathBuf::from("memory"),
                columns: vec!["Cliente".into(), "Total".into()],
                records,
            })
        }
    }

    fn record(client: &str, period: &str, total: f64) -> BillingRecord {
        BillingRecord {
            client: client.into(),
            emitter: "Online".into(),
            period: period.into(),
            total,
            mobile_lines: total,
            ..Default::default()
        }
    }

    #[test]
    fn test_open_builds_standing_tables() {
        let source = Arc::new(SwapSource::new(vec![
            record("ACME", "Jun-2025", 10.0),
            record("Beta", "Jul-2025", 30.0),
        ]));
        let store = DatasetStore::open(Box::new(source)).unwrap();
        let snapshot = store.snapshot();

        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.by_period.len(), 2);
        assert_eq!(snapshot.by_emitter.len(), 1);
        assert_eq!(snapshot.by_service.len(), 4);
        assert_eq!(snapshot.by_client[0].label, "Beta");
    }

    #[test]
    fn test_reload_replaces_all_tables() {
        let source = Arc::new(SwapSource::new(vec![record("ACME", "Jun-2025", 10.0)]));
        let store = DatasetStore::open(Box::new(Arc::clone(&source))).unwrap();
        let before = store.snapshot();

        *source.records.lock().unwrap() = Some(vec![
            record("Zeta", "Ago-2025", 7.0),
            record("Zeta", "Sep-2025", 9.0),
        ]);
        let after = store.reload().unwrap();

        assert_eq!(after.version, 2);
        assert!(after.by_client.iter().all(|r| r.label == "Zeta"));
        assert!(after.by_period.iter().all(|r| r.period != "Jun-2025"));
        assert!((after.by_service[0].total - 16.0).abs() < f64::EPSILON);
        // Readers holding the old snapshot keep a consistent view
        assert_eq!(before.by_client[0].label, "ACME");
        assert_eq!(store.snapshot().version, 2);
    }

    #[test]
    fn test_reload_failure_keeps_previous_snapshot() {
        let source = Arc::new(SwapSource::new(vec![record("ACME", "Jun-2025", 10.0)]));
        let store = DatasetStore::open(Box::new(Arc::clone(&source))).unwrap();

        *source.records.lock().unwrap() = None;
        assert!(store.reload().is_err());

        let snapshot = store.snapshot();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.records.len(), 1);
    }

    #[test]
    fn test_reload_identical_data_is_idempotent() {
        let records = vec![record("ACME", "Jun-2025", 10.0), record("Beta", "Jul-2025", 5.5)];
        let source = Arc::new(SwapSource::new(records));
        let store = DatasetStore::open(Box::new(source)).unwrap();

        let first = store.snapshot();
        let second = store.reload().unwrap();

        assert_eq!(first.by_period, second.by_period);
        assert_eq!(first.by_client, second.by_client);
        assert_eq!(first.by_service, second.by_service);
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let source = Arc::new(SwapSource::new(vec![record("ACME", "Jun-2025", 1.0)]));
        let store = Arc::new(DatasetStore::open(Box::new(Arc::clone(&source))).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = store.snapshot();
                        let records: f64 = snapshot.records.iter().map(|r| r.total).sum();
                        let clients: f64 = snapshot.by_client.iter().map(|r| r.total).sum();
                        assert!((records - clients).abs() < 1e-9);
                    }
                })
            })
            .collect();

        for n in 2..20 {
            *source.records.lock().unwrap() =
                Some((0..n).map(|i| record(&format!("C{}", i), "Jul-2025", i as f64)).collect());
            store.reload().unwrap();
        }

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.snapshot().version, 19);
    }

    #[test]
    fn test_concurrent_reloads_get_distinct_versions() {
        let source = Arc::new(SwapSource::new(vec![record("ACME", "Jun-2025", 1.0)]));
        let store = Arc::new(DatasetStore::open(Box::new(source)).unwrap());
        let start = Arc::new(Barrier::new(2));

        let reloaders: Vec<_> = (0..2)
            .map(|_| {
                let store = Arc::clone(&store);
                let start = Arc::clone(&start);
                thread::spawn(move || {
                    start.wait();
                    store.reload().unwrap().version
                })
            })
            .collect();

        let mut versions: Vec<u64> = reloaders.into_iter().map(|t| t.join().unwrap()).collect();
        versions.sort_unstable();

        assert_eq!(versions, vec![2, 3]);
        assert_eq!(store.snapshot().version, 3);
    }

    #[test]
    fn test_reload_from_rewritten_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ventas.csv");
        fs::write(
            &path,
            "Cliente,Emisora,Periodo,Total\nACME,Online,Jun-2025,100\nBeta,Online,Jun-2025,50\n",
        )
        .unwrap();

        let loader = DataLoaderService::new(Config {
            data_path: Some(path.clone()),
            ..Default::default()
        });
        let store = DatasetStore::open(Box::new(loader)).unwrap();
        assert_eq!(store.snapshot().by_client.len(), 2);

        fs::write(&path, "Cliente,Emisora,Periodo,Total\nNuevo,Sucursal,Jul-2025,75\n").unwrap();
        let snapshot = store.reload().unwrap();

        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.by_client[0].label, "Nuevo");
        assert_eq!(snapshot.by_emitter[0].label, "Sucursal");
        assert_eq!(snapshot.status().rows, 1);
    }

    #[test]
    fn test_status_and_meta() {
        let source = Arc::new(SwapSource::new(
            (0..5).map(|i| record("ACME", "Jul-2025", i as f64)).collect(),
        ));
        let store = DatasetStore::open(Box::new(source)).unwrap();
        let snapshot = store.snapshot();

        let status = snapshot.status();
        assert!(status.ok);
        assert_eq!(status.file, "memory");
        assert_eq!(status.rows, 5);
        assert_eq!(status.loaded_at.len(), 19);

        let meta = snapshot.meta();
        assert_eq!(meta.preview.len(), 3);
        assert_eq!(meta.columns, vec!["Cliente", "Total"]);
    }
}
