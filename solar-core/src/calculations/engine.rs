//! Reference implementation of the simulation service's investment math.
//!
//! The remote service owns these figures; this engine reproduces them so the
//! offline backend can answer simulations and limit queries locally.
//!
//! # Model
//!
//! | Quantity              | Formula |
//! |-----------------------|---------|
//! | Installed power (kW)  | panels × panel Wp / 1000 |
//! | Annual generation     | kW × 1500 kWh/kWp × 0.85 performance ratio |
//! | Investment (USD)      | panels × price per panel, or W × price per Wp |
//! | Monthly savings       | monthly generation × blended tariff charge |
//! | Payback (years)       | investment (local) / annual savings, 999 when no savings |
//! | Annual ROI (%)        | annual savings / investment (local) × 100 |
//! | Coverage achieved (%) | monthly generation / monthly consumption × 100 |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use solar_core::calculations::SimulationEngine;
//! use solar_core::{Project, ProjectStatus, SimulationParameters, TariffCategory};
//!
//! let project = Project {
//!     id: 1,
//!     name: "Parque Solar Norte".to_string(),
//!     location: "Córdoba".to_string(),
//!     description: String::new(),
//!     status: ProjectStatus::Funding,
//!     total_power_installed_kw: dec!(500),
//!     available_power_kw: dec!(100),
//!     panel_power_wp: dec!(500),
//!     price_per_wp_usd: dec!(1.00),
//!     price_per_panel_usd: None,
//! };
//! let tariff = TariffCategory {
//!     id: 3,
//!     name: "Residencial".to_string(),
//!     code: "T1-R".to_string(),
//!     description: String::new(),
//!     energy_charge_peak: dec!(100),
//!     energy_charge_valley: dec!(100),
//!     fixed_charge_monthly: dec!(0),
//!     peak_percentage: dec!(30),
//! };
//!
//! let engine = SimulationEngine::new(&project, &tariff, dec!(1000)).unwrap();
//! let figures = engine
//!     .simulate(dec!(850), &SimulationParameters::PanelCount { number_of_panels: 8 })
//!     .unwrap();
//!
//! assert_eq!(figures.installed_power_kw, dec!(4.000));
//! assert_eq!(figures.monthly_generation_kwh, dec!(425.00));
//! assert_eq!(figures.total_investment_usd, dec!(4000.00));
//! assert_eq!(figures.coverage_achieved, dec!(50.00));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{percentage_of, round_half_up, whole_panels};
use crate::models::{
    BillLimits, CapacityCheck, Project, SimulationMode, SimulationParameters, TariffCategory,
};

/// Yearly kWh produced per installed kWp before losses.
pub const ANNUAL_GENERATION_FACTOR: Decimal = Decimal::from_parts(1500, 0, 0, false, 0);

/// Share of nominal generation that reaches the meter.
pub const PERFORMANCE_RATIO: Decimal = Decimal::from_parts(85, 0, 0, false, 2);

/// Local currency per USD used when no rate has been published.
pub const DEFAULT_EXCHANGE_RATE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Payback reported when an installation never saves anything.
pub const PAYBACK_SENTINEL_YEARS: Decimal = Decimal::from_parts(999, 0, 0, false, 0);

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Errors that can occur while running the engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("project panel power must be positive, got {0} Wp")]
    InvalidPanelPower(Decimal),

    #[error("exchange rate must be positive, got {0}")]
    InvalidExchangeRate(Decimal),

    #[error("project has no price per Wp or per panel")]
    MissingPrice,

    #[error("monthly consumption must be positive")]
    ZeroConsumption,

    #[error("coverage percentage {0} is outside 0-100")]
    CoverageOutOfRange(Decimal),

    #[error("inputs are too large to simulate")]
    Overflow,
}

/// Result of one engine run, rounded the way the service stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationFigures {
    pub mode: SimulationMode,
    pub monthly_consumption_kwh: Decimal,
    pub bill_coverage_percentage: Option<Decimal>,
    pub investment_amount_usd: Option<Decimal>,
    pub number_of_panels: u32,
    pub total_investment_usd: Decimal,
    pub total_investment_local_currency: Decimal,
    pub installed_power_kw: Decimal,
    pub annual_generation_kwh: Decimal,
    pub monthly_generation_kwh: Decimal,
    pub monthly_savings_local_currency: Decimal,
    pub annual_savings_local_currency: Decimal,
    pub payback_period_years: Decimal,
    pub coverage_achieved: Decimal,
    pub roi_annual: Decimal,
    pub exchange_rate_used: Decimal,
}

/// Calculator bound to one project, tariff and exchange rate.
#[derive(Debug, Clone)]
pub struct SimulationEngine<'a> {
    project: &'a Project,
    tariff: &'a TariffCategory,
    exchange_rate: Decimal,
}

impl<'a> SimulationEngine<'a> {
    /// # Errors
    ///
    /// - [`EngineError::InvalidPanelPower`] if the project's panel rating is not positive
    /// - [`EngineError::InvalidExchangeRate`] if `exchange_rate` is not positive
    pub fn new(
        project: &'a Project,
        tariff: &'a TariffCategory,
        exchange_rate: Decimal,
    ) -> Result<Self, EngineError> {
        if project.panel_power_wp <= Decimal::ZERO {
            return Err(EngineError::InvalidPanelPower(project.panel_power_wp));
        }
        if exchange_rate <= Decimal::ZERO {
            return Err(EngineError::InvalidExchangeRate(exchange_rate));
        }
        Ok(Self {
            project,
            tariff,
            exchange_rate,
        })
    }

    /// Runs the simulation matching `parameters`.
    pub fn simulate(
        &self,
        monthly_consumption_kwh: Decimal,
        parameters: &SimulationParameters,
    ) -> Result<SimulationFigures, EngineError> {
        match parameters {
            SimulationParameters::BillCoverage {
                bill_coverage_percentage,
            } => self.simulate_by_coverage(monthly_consumption_kwh, *bill_coverage_percentage),
            SimulationParameters::PanelCount { number_of_panels } => {
                self.simulate_by_panels(monthly_consumption_kwh, *number_of_panels)
            }
            SimulationParameters::InvestmentAmount {
                investment_amount_usd,
            } => self.simulate_by_investment(monthly_consumption_kwh, *investment_amount_usd),
        }
    }

    /// Sizes the installation so generation offsets `coverage_percentage` of
    /// the consumption, rounding to the nearest whole panel.
    pub fn simulate_by_coverage(
        &self,
        monthly_consumption_kwh: Decimal,
        coverage_percentage: Decimal,
    ) -> Result<SimulationFigures, EngineError> {
        if coverage_percentage < Decimal::ZERO || coverage_percentage > Decimal::ONE_HUNDRED {
            return Err(EngineError::CoverageOutOfRange(coverage_percentage));
        }
        let panels = whole_panels(
            self.panels_for_coverage(monthly_consumption_kwh, coverage_percentage)?,
            RoundingStrategy::MidpointAwayFromZero,
        );

        let mut figures = self.figures_for_panels(monthly_consumption_kwh, panels)?;
        figures.mode = SimulationMode::BillCoverage;
        figures.bill_coverage_percentage = Some(coverage_percentage);
        Ok(figures)
    }

    pub fn simulate_by_panels(
        &self,
        monthly_consumption_kwh: Decimal,
        number_of_panels: u32,
    ) -> Result<SimulationFigures, EngineError> {
        self.figures_for_panels(monthly_consumption_kwh, number_of_panels)
    }

    /// Buys as many whole panels as `investment_amount_usd` affords
    /// (nearest, ties to even) and reports the actual cost of those panels.
    pub fn simulate_by_investment(
        &self,
        monthly_consumption_kwh: Decimal,
        investment_amount_usd: Decimal,
    ) -> Result<SimulationFigures, EngineError> {
        let fractional_panels = match self.price_per_panel() {
            Some(price) => div(investment_amount_usd, price)?,
            None => {
                let price_per_wp = self.price_per_wp()?;
                div(div(investment_amount_usd, price_per_wp)?, self.project.panel_power_wp)?
            }
        };
        let panels = whole_panels(fractional_panels, RoundingStrategy::MidpointNearestEven);

        let mut figures = self.figures_for_panels(monthly_consumption_kwh, panels)?;
        figures.mode = SimulationMode::InvestmentAmount;
        figures.investment_amount_usd = Some(investment_amount_usd);
        Ok(figures)
    }

    /// Savings from `monthly_generation_kwh` displacing grid energy, split
    /// between peak and valley hours like the consumption.
    pub fn monthly_savings(
        &self,
        monthly_generation_kwh: Decimal,
    ) -> Result<Decimal, EngineError> {
        mul(monthly_generation_kwh, self.tariff.blended_energy_charge())
    }

    /// Compares the power a simulation needs with what the project has left.
    pub fn capacity_check(
        &self,
        required_power_kw: Decimal,
    ) -> CapacityCheck {
        let available = self.project.available_power_kw;
        CapacityCheck {
            has_capacity: required_power_kw <= available,
            required_power_kw,
            available_power_kw: available,
            utilization_percentage: round_half_up(percentage_of(required_power_kw, available)),
        }
    }

    /// Largest purchase that stays at or below 100% coverage of the
    /// consumption: the panel count is floored, never rounded up.
    pub fn bill_limits(
        &self,
        monthly_consumption_kwh: Decimal,
    ) -> Result<BillLimits, EngineError> {
        let panels = whole_panels(
            self.panels_for_coverage(monthly_consumption_kwh, Decimal::ONE_HUNDRED)?,
            RoundingStrategy::ToNegativeInfinity,
        );
        let figures = self.figures_for_panels(monthly_consumption_kwh, panels)?;

        let savings_per_panel = if panels == 0 {
            Decimal::ZERO
        } else {
            round_half_up(figures.monthly_savings_local_currency / Decimal::from(panels))
        };

        Ok(BillLimits {
            max_investment_usd: figures.total_investment_usd,
            max_investment_local_currency: figures.total_investment_local_currency,
            max_panels_allowed: panels,
            max_payback_years: figures.payback_period_years,
            savings_per_panel_local_currency: savings_per_panel,
        })
    }

    fn panel_power_kw(&self) -> Decimal {
        self.project.panel_power_wp / Decimal::ONE_THOUSAND
    }

    fn price_per_panel(&self) -> Option<Decimal> {
        self.project
            .price_per_panel_usd
            .filter(|price| *price > Decimal::ZERO)
    }

    fn price_per_wp(&self) -> Result<Decimal, EngineError> {
        if self.project.price_per_wp_usd > Decimal::ZERO {
            Ok(self.project.price_per_wp_usd)
        } else {
            Err(EngineError::MissingPrice)
        }
    }

    fn panels_for_coverage(
        &self,
        monthly_consumption_kwh: Decimal,
        coverage_percentage: Decimal,
    ) -> Result<Decimal, EngineError> {
        if monthly_consumption_kwh <= Decimal::ZERO {
            return Err(EngineError::ZeroConsumption);
        }
        let required_annual_generation = div(
            mul(mul(monthly_consumption_kwh, MONTHS_PER_YEAR)?, coverage_percentage)?,
            Decimal::ONE_HUNDRED,
        )?;
        let required_power_kw =
            div(required_annual_generation, ANNUAL_GENERATION_FACTOR * PERFORMANCE_RATIO)?;
        div(required_power_kw, self.panel_power_kw())
    }

    fn figures_for_panels(
        &self,
        monthly_consumption_kwh: Decimal,
        panels: u32,
    ) -> Result<SimulationFigures, EngineError> {
        if monthly_consumption_kwh <= Decimal::ZERO {
            return Err(EngineError::ZeroConsumption);
        }

        let panel_count = Decimal::from(panels);
        let installed_power_kw = mul(panel_count, self.panel_power_kw())?;
        let annual_generation = mul(
            mul(installed_power_kw, ANNUAL_GENERATION_FACTOR)?,
            PERFORMANCE_RATIO,
        )?;
        let monthly_generation = div(annual_generation, MONTHS_PER_YEAR)?;

        let investment_usd = match self.price_per_panel() {
            Some(price) => mul(panel_count, price)?,
            None => mul(mul(installed_power_kw, Decimal::ONE_THOUSAND)?, self.price_per_wp()?)?,
        };
        let investment_local = mul(investment_usd, self.exchange_rate)?;

        let monthly_savings = self.monthly_savings(monthly_generation)?;
        let annual_savings = mul(monthly_savings, MONTHS_PER_YEAR)?;

        let payback = if annual_savings > Decimal::ZERO {
            div(investment_local, annual_savings)?
        } else {
            PAYBACK_SENTINEL_YEARS
        };
        let roi = checked_percentage_of(annual_savings, investment_local)?;
        let coverage_achieved = checked_percentage_of(monthly_generation, monthly_consumption_kwh)?;

        Ok(SimulationFigures {
            mode: SimulationMode::PanelCount,
            monthly_consumption_kwh,
            bill_coverage_percentage: None,
            investment_amount_usd: None,
            number_of_panels: panels,
            total_investment_usd: round_half_up(investment_usd),
            total_investment_local_currency: round_half_up(investment_local),
            installed_power_kw: installed_power_kw
                .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero),
            annual_generation_kwh: round_half_up(annual_generation),
            monthly_generation_kwh: round_half_up(monthly_generation),
            monthly_savings_local_currency: round_half_up(monthly_savings),
            annual_savings_local_currency: round_half_up(annual_savings),
            payback_period_years: round_half_up(payback),
            coverage_achieved: round_half_up(coverage_achieved),
            roi_annual: round_half_up(roi),
            exchange_rate_used: self.exchange_rate,
        })
    }
}

fn mul(a: Decimal, b: Decimal) -> Result<Decimal, EngineError> {
    a.checked_mul(b).ok_or(EngineError::Overflow)
}

// Divisors are validated positive before they get here.
fn div(a: Decimal, b: Decimal) -> Result<Decimal, EngineError> {
    a.checked_div(b).ok_or(EngineError::Overflow)
}

fn checked_percentage_of(part: Decimal, whole: Decimal) -> Result<Decimal, EngineError> {
    if whole <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    mul(div(part, whole)?, Decimal::ONE_HUNDRED)
}
