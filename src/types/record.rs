//! Billing record types

use serde::{Deserialize, Serialize};

/// One billing line of the dataset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BillingRecord {
    pub client: String,
    /// Billing emission source / channel
    pub emitter: String,
    pub customer_type: String,
    /// Localized month label, e.g. "Jul-2025"
    pub period: String,
    pub total: f64,
    pub mobile_lines: f64,
    pub home_internet: f64,
    pub additional_services: f64,
    pub adjustment_notes: f64,
}

impl BillingRecord {
    /// Amount billed under a single service category
    pub fn service_amount(&self, category: ServiceCategory) -> f64 {
        match category {
            ServiceCategory::MobileLines => self.mobile_lines,
            ServiceCategory::HomeInternet => self.home_internet,
            ServiceCategory::AdditionalServices => self.additional_services,
            ServiceCategory::AdjustmentNotes => self.adjustment_notes,
        }
    }
}

/// The four service-category columns of a billing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceCategory {
    MobileLines,
    HomeInternet,
    AdditionalServices,
    AdjustmentNotes,
}

impl ServiceCategory {
    /// All categories in display order
    pub const ALL: [ServiceCategory; 4] = [
        Self::MobileLines,
        Self::HomeInternet,
        Self::AdditionalServices,
        Self::AdjustmentNotes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::MobileLines => "Líneas móviles",
            Self::HomeInternet => "Internet hogar",
            Self::AdditionalServices => "Servicios adicionales",
            Self::AdjustmentNotes => "Notas de ajuste",
        }
    }
}

/// Coerce a raw numeric cell to f64.
///
/// Empty, non-numeric and non-finite cells become 0.0.
pub fn coerce_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
