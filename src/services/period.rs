//! Period label parsing
//!
//! Maps localized month labels ("Jul-2025", "sept. 2024") to a sortable key.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static RE_PERIOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z]{3,5})\.?\s*[-/]?\s*(\d{4})").unwrap());

const MONTH_LABELS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Chronological key of a period label: `year * 100 + month`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PeriodKey(u32);

impl PeriodKey {
    /// Parse a period label. Returns None when the label has no recognizable
    /// Spanish month abbreviation followed by a 4-digit year.
    pub fn parse(label: &str) -> Option<Self> {
        let folded = fold_vowels(&label.trim().to_lowercase());
        let caps = RE_PERIOD.captures(&folded)?;

        let month = month_number(&caps[1])?;
        let year: u32 = caps[2].parse().ok()?;

        Some(Self(year * 100 + month))
    }

    pub fn from_year_month(year: u32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self(year * 100 + month))
    }

    /// Canonical label for this month, e.g. "Jul-2025"
    pub fn label(&self) -> String {
        format!("{}-{}", MONTH_LABELS[(self.month() - 1) as usize], self.year())
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn year(&self) -> u32 {
        self.0 / 100
    }

    pub fn month(&self) -> u32 {
        self.0 % 100
    }
}

fn fold_vowels(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .collect()
}

/// "sept…" resolves on its 4-letter prefix, everything else on 3 letters
fn month_number(token: &str) -> Option<u32> {
    let prefix = if token.starts_with("sept") {
        &token[..4]
    } else {
        &token[..3]
    };

    let month = match prefix {
        "ene" => 1,
        "feb" => 2,
        "mar" => 3,
        "abr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "ago" => 8,
        "sep" | "sept" => 9,
        "oct" => 10,
        "nov" => 11,
        "dic" => 12,
        _ => return None,
    };
    Some(month)
}
