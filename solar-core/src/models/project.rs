use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::calculations::common::whole_panels;

/// Funding stage of a solar community project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Funding,
    Construction,
    Operational,
    #[serde(other)]
    Other,
}

impl ProjectStatus {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "funding" => Self::Funding,
            "construction" => Self::Construction,
            "operational" => Self::Operational,
            _ => Self::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Funding => "Funding",
            Self::Construction => "Under construction",
            Self::Operational => "Operational",
            Self::Other => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(alias = "total_power_installed")]
    pub total_power_installed_kw: Decimal,
    #[serde(alias = "available_power")]
    pub available_power_kw: Decimal,
    pub panel_power_wp: Decimal,
    pub price_per_wp_usd: Decimal,
    #[serde(default)]
    pub price_per_panel_usd: Option<Decimal>,
}

impl Project {
    pub fn capacity(&self) -> ProjectCapacity {
        ProjectCapacity {
            available_power_kw: self.available_power_kw,
            panel_power_wp: self.panel_power_wp,
        }
    }

    /// Share of the installed power still open to investment, in percent.
    pub fn available_power_percentage(&self) -> Decimal {
        if self.total_power_installed_kw <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.available_power_kw / self.total_power_installed_kw * Decimal::ONE_HUNDRED
    }
}

/// The part of a project that bounds how many panels can still be bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCapacity {
    pub available_power_kw: Decimal,
    pub panel_power_wp: Decimal,
}

impl ProjectCapacity {
    /// `floor(available_kw / (panel_wp / 1000))`, never less than one panel.
    ///
    /// Returns `None` when the panel rating is not positive, since no
    /// meaningful bound can be derived from it.
    pub fn max_panels_by_capacity(&self) -> Option<u32> {
        if self.panel_power_wp <= Decimal::ZERO {
            return None;
        }
        let panel_power_kw = self.panel_power_wp / Decimal::ONE_THOUSAND;
        let panels = whole_panels(
            self.available_power_kw / panel_power_kw,
            RoundingStrategy::ToNegativeInfinity,
        );
        Some(panels.max(1))
    }
}

/// Aggregate figures shown on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectStats {
    pub total_projects: u32,
    pub operational_projects: u32,
    pub funding_projects: u32,
    #[serde(alias = "total_power_installed_kwp")]
    pub total_power_installed_kw: Decimal,
    #[serde(alias = "total_power_available_kwp")]
    pub total_power_available_kw: Decimal,
}
