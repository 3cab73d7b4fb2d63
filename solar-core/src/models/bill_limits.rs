use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The inputs a [`BillLimits`] answer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LimitsQuery {
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_bill_local_currency: Decimal,
    pub project_id: i64,
    pub tariff_category_id: i64,
}

/// Largest investment obtainable without exceeding 100% bill coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLimits {
    pub max_investment_usd: Decimal,
    pub max_investment_local_currency: Decimal,
    pub max_panels_allowed: u32,
    pub max_payback_years: Decimal,
    pub savings_per_panel_local_currency: Decimal,
}
