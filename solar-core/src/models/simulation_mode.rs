use std::fmt;

use serde::{Deserialize, Serialize};

/// How the visitor sizes a simulated investment. Exactly one is active at a
/// time on a [`SimulationDraft`](crate::draft::SimulationDraft).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SimulationMode {
    #[default]
    #[serde(rename = "bill_coverage", alias = "coverage")]
    BillCoverage,
    #[serde(rename = "panels", alias = "panel_count")]
    PanelCount,
    #[serde(rename = "investment", alias = "investment_amount")]
    InvestmentAmount,
}

impl SimulationMode {
    pub fn all() -> &'static [SimulationMode] {
        &[
            SimulationMode::BillCoverage,
            SimulationMode::PanelCount,
            SimulationMode::InvestmentAmount,
        ]
    }

    /// Wire name used by the simulation service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BillCoverage => "bill_coverage",
            Self::PanelCount => "panels",
            Self::InvestmentAmount => "investment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BillCoverage => "Bill coverage percentage",
            Self::PanelCount => "Number of panels",
            Self::InvestmentAmount => "Investment amount (USD)",
        }
    }

    /// Accepts the wire name plus the short aliases used on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bill_coverage" | "coverage" => Some(Self::BillCoverage),
            "panels" | "panel_count" => Some(Self::PanelCount),
            "investment" | "investment_amount" => Some(Self::InvestmentAmount),
            _ => None,
        }
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
