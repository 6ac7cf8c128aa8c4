//! Month-over-month comparison between consecutive periods

use std::collections::BTreeMap;

use crate::services::period::PeriodKey;
use crate::types::{ComparisonResult, PeriodTotal};

/// Relative change; 0 when the previous value is exactly 0
pub fn relative_variation(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous
    }
}

/// Compare the two most recent resolvable periods.
///
/// Rows without a PeriodKey are ignored. Rows sharing a key are merged
/// (totals summed, first label kept). Returns None with fewer than two periods.
pub fn compare(rows: &[PeriodTotal]) -> Option<ComparisonResult> {
    let mut by_key: BTreeMap<PeriodKey, (&str, f64)> = BTreeMap::new();
    for row in rows {
        let Some(key) = row.key else {
            continue;
        };
        by_key
            .entry(key)
            .and_modify(|(_, total)| *total += row.total)
            .or_insert((row.period.as_str(), row.total));
    }

    let mut latest = by_key.values().rev();
    let (current_period, current_total) = *latest.next()?;
    let (previous_period, previous_total) = *latest.next()?;

    Some(ComparisonResult {
        current_period: current_period.to_string(),
        current_total,
        previous_period: previous_period.to_string(),
        previous_total,
        absolute_variation: current_total - previous_total,
        relative_variation: relative_variation(current_total, previous_total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_empty_and_single() {
        assert!(compare(&[]).is_none());
        assert!(compare(&[PeriodTotal::new("Jul-2025", 10.0)]).is_none());
    }

    #[test]
    fn test_compare_two_rows() {
        let rows = vec![
            PeriodTotal::new("Jun-2025", 100.0),
            PeriodTotal::new("Jul-2025", 150.0),
        ];
        let result = compare(&rows).unwrap();

        assert_eq!(result.current_period, "Jul-2025");
        assert_eq!(result.previous_period, "Jun-2025");
        assert!((result.absolute_variation - 50.0).abs() < f64::EPSILON);
        assert!((result.relative_variation - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compare_uses_chronology_not_input_order() {
        let rows = vec![
            PeriodTotal::new("Jul-2025", 150.0),
            PeriodTotal::new("ene-2025", 999.0),
            PeriodTotal::new("Jun-2025", 100.0),
        ];
        let result = compare(&rows).unwrap();
        assert_eq!(result.current_period, "Jul-2025");
        assert_eq!(result.previous_period, "Jun-2025");
    }

    #[test]
    fn test_compare_previous_zero_is_zero_variation() {
        let rows = vec![
            PeriodTotal::new("Jun-2025", 0.0),
            PeriodTotal::new("Jul-2025", 80.0),
        ];
        let result = compare(&rows).unwrap();
        assert!((result.absolute_variation - 80.0).abs() < f64::EPSILON);
        assert_eq!(result.relative_variation, 0.0);
    }

    #[test]
    fn test_compare_ignores_unparseable_labels() {
        let rows = vec![
            PeriodTotal::new("Jun-2025", 100.0),
            PeriodTotal::new("sin dato", 5000.0),
        ];
        assert!(compare(&rows).is_none());
    }

    #[test]
    fn test_compare_merges_same_month_spellings() {
        let rows = vec![
            PeriodTotal::new("Sep-2024", 40.0),
            PeriodTotal::new("sept. 2024", 60.0),
            PeriodTotal::new("ago-2024", 50.0),
        ];
        let result = compare(&rows).unwrap();
        assert_eq!(result.current_period, "Sep-2024");
        assert!((result.current_total - 100.0).abs() < f64::EPSILON);
        assert!((result.relative_variation - 1.0).abs() < f64::EPSILON);
    }
}
