//! Intent dispatch
//!
//! Classifies a free-text prompt with an ordered list of keyword rules
//! (first match wins), extracts its parameters, computes the requested
//! aggregate or comparison and renders it as a text table.

use std::iter;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::services::comparison::compare;
use crate::services::formatter::{self, format_currency, format_percent, DEFAULT_DECIMALS};
use crate::services::normalizer::normalize;
use crate::services::store::Snapshot;
use crate::services::Aggregator;
use crate::types::{AggregateRow, Answer, ComparisonResult, DatasetSummary, PeriodTotal};

/// Row count used when a "top" prompt carries no number
pub const DEFAULT_TOP_N: usize = 5;

static RE_TOP_N: Lazy<Regex> = Lazy::new(|| Regex::new(r"top\s*([0-9]+)").unwrap());
static RE_CLIENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcliente(?:\s*:\s*|\s+)([\w\-#][\w\s\-#]*)").unwrap()
});

const COMPARISON_HEADERS: [&str; 6] = [
    "Periodo_Actual",
    "Total_Actual",
    "Periodo_Anterior",
    "Total_Anterior",
    "Var_Abs",
    "Var_%",
];

/// A prompt in both its original and normalized forms
#[derive(Debug, Clone)]
pub struct Query<'a> {
    pub raw: &'a str,
    pub text: String,
}

impl<'a> Query<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            text: normalize(raw),
        }
    }

    fn has(&self, keyword: &str) -> bool {
        self.text.contains(keyword)
    }

    fn has_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.has(k))
    }

    fn asks_variation(&self) -> bool {
        self.has_any(&["variac", "variacion"])
    }

    fn names_client(&self) -> bool {
        self.has("cliente") && client_name(self.raw).is_some()
    }

    /// Variation keyword present outside the client name ("Variaciones SRL" alone does not count)
    fn asks_client_variation(&self) -> bool {
        let Some(name) = client_name(self.raw) else {
            return false;
        };
        let rest = self.text.replacen(&normalize(&name), " ", 1);
        rest.contains("variac")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    TopClients,
    TopClientsLatestPeriod,
    TotalsByPeriod,
    EmitterVariation,
    TotalsByEmitter,
    ServiceVariation,
    TotalsByService,
    ClientVariation,
    ClientSeries,
    TotalVariation,
}

type Predicate = fn(&Query) -> bool;

fn asks_top_clients(q: &Query) -> bool {
    q.has("top") && q.has("cliente") && !q.has("ultimo")
}

fn asks_top_clients_latest(q: &Query) -> bool {
    q.has("top") && q.has("cliente") && q.has_any(&["ultimo", "mes"])
}

fn asks_monthly(q: &Query) -> bool {
    q.has_any(&["por mes", "total por mes", "mensual"])
}

fn mentions_emitter(q: &Query) -> bool {
    q.has_any(&["emisora", "canal"])
}

fn mentions_service(q: &Query) -> bool {
    q.has_any(&["servicio", "tipo"])
}

fn asks_emitter_variation(q: &Query) -> bool {
    mentions_emitter(q) && q.asks_variation()
}

fn asks_service_variation(q: &Query) -> bool {
    mentions_service(q) && q.asks_variation()
}

fn asks_client_variation(q: &Query) -> bool {
    q.names_client() && q.asks_client_variation()
}

fn names_client(q: &Query) -> bool {
    q.names_client()
}

fn asks_total_variation(q: &Query) -> bool {
    q.has_any(&["variac", "variacion", "mom"])
}

/// Rules in priority order
const RULES: &[(Predicate, Intent)] = &[
    (asks_top_clients, Intent::TopClients),
    (asks_top_clients_latest, Intent::TopClientsLatestPeriod),
    (asks_monthly, Intent::TotalsByPeriod),
    (asks_emitter_variation, Intent::EmitterVariation),
    (mentions_emitter, Intent::TotalsByEmitter),
    (asks_service_variation, Intent::ServiceVariation),
    (mentions_service, Intent::TotalsByService),
    (asks_client_variation, Intent::ClientVariation),
    (names_client, Intent::ClientSeries),
    (asks_total_variation, Intent::TotalVariation),
];

/// First matching intent, or None for the summary fallback
pub fn classify(query: &Query) -> Option<Intent> {
    RULES
        .iter()
        .find(|(matches, _)| matches(query))
        .map(|(_, intent)| *intent)
}

/// Row count from a "top N" phrase in normalized text; saturates on overflow
pub fn top_n(text: &str) -> usize {
    RE_TOP_N
        .captures(text)
        .map(|caps| caps[1].parse::<usize>().unwrap_or(usize::MAX))
        .unwrap_or(DEFAULT_TOP_N)
}

/// Client name following "cliente" in the original prompt, spelling preserved.
///
/// A variation keyword after the first name word ends the name; as the first
/// word it is part of it ("Variaciones SRL").
pub fn client_name(raw: &str) -> Option<String> {
    let caps = RE_CLIENT.captures(raw)?;
    let words: Vec<&str> = caps[1].split_whitespace().collect();
    let end = words
        .iter()
        .skip(1)
        .position(|word| normalize(word).starts_with("variac"))
        .map_or(words.len(), |i| i + 1);
    let name = words[..end].join(" ");

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Answer a prompt against one snapshot
pub fn ask(snapshot: &Snapshot, prompt: &str) -> Answer {
    let query = Query::new(prompt);
    let intent = classify(&query);
    debug!(?intent, text = %query.text, "prompt classified");

    match intent {
        Some(Intent::TopClients) => top_clients(snapshot, top_n(&query.text)),
        Some(Intent::TopClientsLatestPeriod) => {
            top_clients_latest_period(snapshot, top_n(&query.text))
        }
        Some(Intent::TotalsByPeriod) => Answer::table(
            "Total mensual:",
            &formatter::render(&["Periodo", "Total"], &period_rows(&snapshot.by_period)),
        ),
        Some(Intent::EmitterVariation) => emitter_variation(snapshot),
        Some(Intent::TotalsByEmitter) => Answer::table(
            "Ventas por emisora:",
            &formatter::render(&["Emisora", "Total"], &aggregate_rows(&snapshot.by_emitter)),
        ),
        Some(Intent::ServiceVariation) => service_variation(snapshot),
        Some(Intent::TotalsByService) => Answer::table(
            "Ventas por tipo de servicio:",
            &formatter::render(&["Servicio", "Importe"], &aggregate_rows(&snapshot.by_service)),
        ),
        Some(Intent::ClientVariation) | Some(Intent::ClientSeries) => {
            let name = client_name(query.raw).unwrap_or_default();
            debug!(client = %name, "client filter");
            client_answer(snapshot, &name, intent == Some(Intent::ClientVariation))
        }
        Some(Intent::TotalVariation) => total_variation(snapshot),
        None => summary(snapshot),
    }
}

fn money(value: f64) -> String {
    format_currency(value, DEFAULT_DECIMALS)
}

fn percent(value: f64) -> String {
    format_percent(value, DEFAULT_DECIMALS)
}

fn aggregate_rows(rows: &[AggregateRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| vec![r.label.clone(), money(r.total)])
        .collect()
}

fn period_rows(rows: &[PeriodTotal]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| vec![r.period.clone(), money(r.total)])
        .collect()
}

/// The six comparison cells, in `COMPARISON_HEADERS` order
fn comparison_cells(c: &ComparisonResult) -> Vec<String> {
    vec![
        c.current_period.clone(),
        money(c.current_total),
        c.previous_period.clone(),
        money(c.previous_total),
        money(c.absolute_variation),
        percent(c.relative_variation),
    ]
}

fn comparison_row(label: &str, c: &ComparisonResult) -> Vec<String> {
    iter::once(label.to_string())
        .chain(comparison_cells(c))
        .collect()
}

fn comparison_headers(label: &str) -> Vec<&str> {
    iter::once(label).chain(COMPARISON_HEADERS).collect()
}

fn top_clients(snapshot: &Snapshot, n: usize) -> Answer {
    let rows = aggregate_rows(Aggregator::top_n(&snapshot.by_client, n));
    Answer::table(
        &format!("Top {} clientes (acumulado):", n),
        &formatter::render(&["Cliente", "Facturado"], &rows),
    )
}

fn top_clients_latest_period(snapshot: &Snapshot, n: usize) -> Answer {
    let Some(ranking) = Aggregator::top_clients_in_latest_period(&snapshot.records, n) else {
        return Answer::message("No hay datos suficientes.");
    };

    let rows: Vec<Vec<String>> = ranking
        .rows
        .iter()
        .map(|r| vec![r.client.clone(), money(r.total), percent(r.relative_variation)])
        .collect();

    Answer::table(
        &format!(
            "Top {} clientes en {} (vs {}):",
            n,
            ranking.current_period,
            ranking.previous_period.as_deref().unwrap_or("—")
        ),
        &formatter::render(&["Cliente", "Facturado", "Variación %"], &rows),
    )
}

fn emitter_variation(snapshot: &Snapshot) -> Answer {
    let variations = Aggregator::emitter_variation(&snapshot.records);
    if variations.is_empty() {
        return Answer::message("No hay suficientes meses para variación por emisora.");
    }

    let rows: Vec<Vec<String>> = variations
        .iter()
        .map(|v| comparison_row(&v.emitter, &v.comparison))
        .collect();

    Answer::table(
        "Variación mensual por emisora (últimos 2 meses)",
        &formatter::render(&comparison_headers("Emisora"), &rows),
    )
}

fn service_variation(snapshot: &Snapshot) -> Answer {
    let Some(variations) = Aggregator::service_variation(&snapshot.records) else {
        return Answer::message("No hay suficientes meses para variación por servicio.");
    };

    let rows: Vec<Vec<String>> = variations
        .iter()
        .map(|v| comparison_row(&v.category, &v.comparison))
        .collect();

    Answer::table(
        "Variación mensual por servicio (últimos 2 meses)",
        &formatter::render(&comparison_headers("Servicio"), &rows),
    )
}

fn client_answer(snapshot: &Snapshot, name: &str, with_variation: bool) -> Answer {
    let series = Aggregator::client_series(&snapshot.records, name);
    if series.is_empty() {
        return Answer::message(format!("No se encontró el cliente: {}", name));
    }

    if !with_variation {
        return Answer::table(
            &format!("Cliente: {}", name),
            &formatter::render(&["Periodo", "Total"], &period_rows(&series)),
        );
    }

    match compare(&series) {
        Some(comparison) => Answer::table(
            &format!("Variación mensual — {}", name),
            &formatter::render(
                &comparison_headers("Cliente"),
                &[comparison_row(name, &comparison)],
            ),
        ),
        None => Answer::message(format!(
            "No hay suficientes meses para calcular variación de {}.",
            name
        )),
    }
}

fn total_variation(snapshot: &Snapshot) -> Answer {
    let Some(comparison) = Aggregator::total_variation(&snapshot.by_period) else {
        return Answer::message("No hay suficientes meses para calcular la variación.");
    };

    Answer::table(
        "Variación mensual total (últimos 2 meses)",
        &formatter::render(&COMPARISON_HEADERS, &[comparison_cells(&comparison)]),
    )
}

fn summary(snapshot: &Snapshot) -> Answer {
    let totals = Aggregator::totals(&snapshot.records);
    Answer::Summary {
        answer: DatasetSummary {
            rows: totals.row_count,
            total: money(totals.grand_total),
            distinct_clients: totals.distinct_clients,
            loaded_at: snapshot.loaded_at_label(),
        },
    }
}
