//! Aggregator service for computing billing statistics

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use rayon::prelude::*;

use crate::services::comparison::{compare, relative_variation};
use crate::services::period::PeriodKey;
use crate::types::{
    AggregateRow, BillingRecord, ClientVariation, ComparisonResult, DatasetTotals,
    EmitterVariation, LatestPeriodRanking, PeriodTotal, ServiceCategory, ServiceVariation,
};

/// Aggregator for computing billing statistics
pub struct Aggregator;

impl Aggregator {
    /// Sum totals by period label, ascending by PeriodKey.
    /// Labels that do not parse go last, ordered by label.
    pub fn totals_by_period(records: &[BillingRecord]) -> Vec<PeriodTotal> {
        period_totals(records.iter())
    }

    /// Sum totals by emitter, descending by total
    pub fn totals_by_emitter(records: &[BillingRecord]) -> Vec<AggregateRow> {
        ranked(sum_by(records.iter(), |r| &r.emitter))
    }

    /// Sum each service-category column across all records
    pub fn totals_by_service(records: &[BillingRecord]) -> Vec<AggregateRow> {
        ServiceCategory::ALL
            .iter()
            .map(|category| AggregateRow {
                label: category.label().to_string(),
                total: records.iter().map(|r| r.service_amount(*category)).sum(),
            })
            .collect()
    }

    /// Sum totals by client, descending by total
    pub fn totals_by_client(records: &[BillingRecord]) -> Vec<AggregateRow> {
        ranked(sum_by(records.iter(), |r| &r.client))
    }

    /// First `n` rows of a ranked table
    pub fn top_n(rows: &[AggregateRow], n: usize) -> &[AggregateRow] {
        &rows[..n.min(rows.len())]
    }

    /// Top `n` clients of the latest resolvable period, each compared with
    /// its own total in the immediately preceding period (0 if absent).
    ///
    /// Returns None when no period label resolves.
    pub fn top_clients_in_latest_period(
        records: &[BillingRecord],
        n: usize,
    ) -> Option<LatestPeriodRanking> {
        let mut labels: HashMap<PeriodKey, &str> = HashMap::new();
        let mut totals: HashMap<(&str, PeriodKey), f64> = HashMap::new();

        for record in records {
            let Some(key) = PeriodKey::parse(&record.period) else {
                continue;
            };
            labels.entry(key).or_insert(record.period.as_str());
            *totals.entry((record.client.as_str(), key)).or_insert(0.0) += record.total;
        }

        let keys: BTreeSet<PeriodKey> = labels.keys().copied().collect();
        let mut chronological = keys.iter().rev();
        let latest = *chronological.next()?;
        let previous = chronological.next().copied();

        let mut current: Vec<(&str, f64)> = totals
            .iter()
            .filter(|((_, key), _)| *key == latest)
            .map(|((client, _), total)| (*client, *total))
            .collect();
        current.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        current.truncate(n);

        let rows = current
            .into_iter()
            .map(|(client, total)| {
                let previous_total = previous
                    .and_then(|key| totals.get(&(client, key)).copied())
                    .unwrap_or(0.0);
                ClientVariation {
                    client: client.to_string(),
                    total,
                    previous_total,
                    relative_variation: relative_variation(total, previous_total),
                }
            })
            .collect();

        Some(LatestPeriodRanking {
            current_period: labels[&latest].to_string(),
            previous_period: previous.map(|key| labels[&key].to_string()),
            rows,
        })
    }

    /// Totals by period for clients whose name contains `fragment`
    /// (case-insensitive). Empty when no client matches.
    pub fn client_series(records: &[BillingRecord], fragment: &str) -> Vec<PeriodTotal> {
        let needle = fragment.to_lowercase();
        period_totals(
            records
                .iter()
                .filter(|r| r.client.to_lowercase().contains(&needle)),
        )
    }

    /// Month-over-month variation per emitter, descending by relative variation.
    /// Emitters with fewer than two resolvable periods are omitted.
    pub fn emitter_variation(records: &[BillingRecord]) -> Vec<EmitterVariation> {
        let mut groups: HashMap<&str, Vec<&BillingRecord>> = HashMap::new();
        for record in records {
            groups.entry(record.emitter.as_str()).or_default().push(record);
        }

        let mut result: Vec<EmitterVariation> = groups
            .into_par_iter()
            .filter_map(|(emitter, subset)| {
                let series = period_totals(subset.into_iter());
                compare(&series).map(|comparison| EmitterVariation {
                    emitter: emitter.to_string(),
                    comparison,
                })
            })
            .collect();

        result.sort_by(|a, b| {
            b.comparison
                .relative_variation
                .total_cmp(&a.comparison.relative_variation)
                .then_with(|| a.emitter.cmp(&b.emitter))
        });
        result
    }

    /// Month-over-month variation per service category over the whole dataset.
    /// Returns None with fewer than two resolvable periods.
    pub fn service_variation(records: &[BillingRecord]) -> Option<Vec<ServiceVariation>> {
        let mut by_label: HashMap<&str, [f64; 4]> = HashMap::new();
        for record in records {
            let sums = by_label.entry(record.period.as_str()).or_insert([0.0; 4]);
            for (slot, category) in sums.iter_mut().zip(ServiceCategory::ALL) {
                *slot += record.service_amount(category);
            }
        }

        ServiceCategory::ALL
            .iter()
            .enumerate()
            .map(|(i, category)| {
                let series: Vec<PeriodTotal> = by_label
                    .iter()
                    .map(|(label, sums)| PeriodTotal::new(*label, sums[i]))
                    .collect();
                compare(&series).map(|comparison| ServiceVariation {
                    category: category.label().to_string(),
                    comparison,
                })
            })
            .collect()
    }

    /// Month-over-month variation of the whole dataset, from its by-period table
    pub fn total_variation(by_period: &[PeriodTotal]) -> Option<ComparisonResult> {
        compare(by_period)
    }

    /// Row count, grand total and distinct clients
    pub fn totals(records: &[BillingRecord]) -> DatasetTotals {
        let clients: HashSet<&str> = records.iter().map(|r| r.client.as_str()).collect();
        DatasetTotals {
            row_count: records.len(),
            grand_total: records.iter().map(|r| r.total).sum(),
            distinct_clients: clients.len(),
        }
    }
}

fn sum_by<'a, F>(records: impl Iterator<Item = &'a BillingRecord>, dimension: F) -> HashMap<&'a str, f64>
where
    F: Fn(&'a BillingRecord) -> &'a String,
{
    let mut sums: HashMap<&str, f64> = HashMap::new();
    for record in records {
        *sums.entry(dimension(record).as_str()).or_insert(0.0) += record.total;
    }
    sums
}

fn ranked(sums: HashMap<&str, f64>) -> Vec<AggregateRow> {
    let mut rows: Vec<AggregateRow> = sums
        .into_iter()
        .map(|(label, total)| AggregateRow {
            label: label.to_string(),
            total,
        })
        .collect();
    rows.sort_by(|a, b| b.total.total_cmp(&a.total).then_with(|| a.label.cmp(&b.label)));
    rows
}

fn period_totals<'a>(records: impl Iterator<Item = &'a BillingRecord>) -> Vec<PeriodTotal> {
    let mut rows: Vec<PeriodTotal> = sum_by(records, |r| &r.period)
        .into_iter()
        .map(|(label, total)| PeriodTotal::new(label, total))
        .collect();

    rows.sort_by(|a, b| match (a.key, b.key) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.period.cmp(&b.period)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.period.cmp(&b.period),
    });
    rows
}
