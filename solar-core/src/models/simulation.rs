use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SimulationMode;

/// Figures computed by the simulation service for one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    pub id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_location: String,
    #[serde(default)]
    pub tariff_category_name: String,
    #[serde(default)]
    pub user_email: Option<String>,
    pub simulation_type: SimulationMode,

    // Input echo
    #[serde(default)]
    pub monthly_consumption_kwh: Option<Decimal>,
    #[serde(default, alias = "coverage_percentage")]
    pub bill_coverage_percentage: Option<Decimal>,
    pub number_of_panels: u32,
    #[serde(default)]
    pub investment_amount_usd: Option<Decimal>,

    // Results
    pub total_investment_usd: Decimal,
    #[serde(alias = "total_investment_ars")]
    pub total_investment_local_currency: Decimal,
    pub installed_power_kw: Decimal,
    pub annual_generation_kwh: Decimal,
    pub monthly_generation_kwh: Decimal,
    #[serde(alias = "monthly_savings_ars")]
    pub monthly_savings_local_currency: Decimal,
    #[serde(alias = "annual_savings_ars")]
    pub annual_savings_local_currency: Decimal,
    pub payback_period_years: Decimal,
    pub coverage_achieved: Decimal,
    pub roi_annual: Decimal,
    pub exchange_rate_used: Decimal,

    pub created_at: DateTime<Utc>,
}

impl Simulation {
    pub fn monthly_savings_usd(&self) -> Option<Decimal> {
        (self.exchange_rate_used > Decimal::ZERO)
            .then(|| self.monthly_savings_local_currency / self.exchange_rate_used)
    }

    pub fn annual_savings_usd(&self) -> Option<Decimal> {
        (self.exchange_rate_used > Decimal::ZERO)
            .then(|| self.annual_savings_local_currency / self.exchange_rate_used)
    }
}

/// Compact listing entry, as returned for a visitor's simulation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub id: String,
    #[serde(default)]
    pub project_name: String,
    pub simulation_type: SimulationMode,
    pub total_investment_usd: Decimal,
    #[serde(alias = "monthly_savings_ars")]
    pub monthly_savings_local_currency: Decimal,
    pub payback_period_years: Decimal,
    pub roi_annual: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Simulation> for SimulationSummary {
    fn from(simulation: &Simulation) -> Self {
        Self {
            id: simulation.id.clone(),
            project_name: simulation.project_name.clone(),
            simulation_type: simulation.simulation_type,
            total_investment_usd: simulation.total_investment_usd,
            monthly_savings_local_currency: simulation.monthly_savings_local_currency,
            payback_period_years: simulation.payback_period_years,
            roi_annual: simulation.roi_annual,
            created_at: simulation.created_at,
        }
    }
}

/// Whether the project can still host the simulated installation. A
/// shortfall is a warning to show next to the results, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityCheck {
    pub has_capacity: bool,
    pub required_power_kw: Decimal,
    pub available_power_kw: Decimal,
    #[serde(default)]
    pub utilization_percentage: Decimal,
}

/// Response of `POST /simulations/create/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub simulation: Simulation,
    pub capacity_check: CapacityCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonProjectInfo {
    pub id: i64,
    pub name: String,
    pub available_power_kw: Decimal,
}

/// One scenario of a comparison, keyed by the mode and its input value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    #[serde(rename = "type")]
    pub mode: SimulationMode,
    pub parameter: Decimal,
    pub simulation: Simulation,
}

/// Response of `POST /simulations/compare/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResponse {
    pub project_info: ComparisonProjectInfo,
    pub comparison_results: Vec<ComparisonEntry>,
}

/// Averages over every stored simulation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub total_simulations: u64,
    pub average_investment_usd: Decimal,
    pub average_payback_years: Decimal,
    pub average_roi_annual: Decimal,
}
