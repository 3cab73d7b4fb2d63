use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{BillLimits, ProjectCapacity, SimulationMode};

pub const MIN_COVERAGE_PERCENTAGE: Decimal = Decimal::from_parts(10, 0, 0, false, 0);
pub const MAX_COVERAGE_PERCENTAGE: Decimal = Decimal::ONE_HUNDRED;

/// Range the active mode's input must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffectiveLimit {
    Unbounded,
    AtMost(Decimal),
    Between { min: Decimal, max: Decimal },
}

impl EffectiveLimit {
    /// Upper bound, if any.
    pub fn max(&self) -> Option<Decimal> {
        match self {
            Self::Unbounded => None,
            Self::AtMost(max) | Self::Between { max, .. } => Some(*max),
        }
    }

    pub fn admits(&self, value: Decimal) -> bool {
        match self {
            Self::Unbounded => true,
            Self::AtMost(max) => value <= *max,
            Self::Between { min, max } => *min <= value && value <= *max,
        }
    }
}

impl fmt::Display for EffectiveLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "no limit"),
            Self::AtMost(max) => write!(f, "at most {max}"),
            Self::Between { min, max } => write!(f, "between {min} and {max}"),
        }
    }
}

/// Combines project capacity and bill-derived limits into the bound for
/// `mode`.
///
/// | mode             | bound |
/// |------------------|-------|
/// | BillCoverage     | always 10 to 100 |
/// | PanelCount       | smaller of capacity panels and `max_panels_allowed` |
/// | InvestmentAmount | `max_investment_usd`, when limits are known |
pub fn resolve_effective_limit(
    capacity: Option<&ProjectCapacity>,
    limits: Option<&BillLimits>,
    mode: SimulationMode,
) -> EffectiveLimit {
    match mode {
        SimulationMode::BillCoverage => EffectiveLimit::Between {
            min: MIN_COVERAGE_PERCENTAGE,
            max: MAX_COVERAGE_PERCENTAGE,
        },
        SimulationMode::PanelCount => {
            let by_capacity = capacity.and_then(ProjectCapacity::max_panels_by_capacity);
            let by_bill = limits.map(|l| l.max_panels_allowed);
            let panels = match (by_capacity, by_bill) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            panels.map_or(EffectiveLimit::Unbounded, |n| {
                EffectiveLimit::AtMost(Decimal::from(n))
            })
        }
        SimulationMode::InvestmentAmount => limits
            .map_or(EffectiveLimit::Unbounded, |l| {
                EffectiveLimit::AtMost(l.max_investment_usd)
            }),
    }
}
