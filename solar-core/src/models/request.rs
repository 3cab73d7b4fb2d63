use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SimulationMode;

/// The single mode-specific input of a simulation request.
///
/// Serialized inline with the rest of [`SimulationRequest`], tagged by
/// `simulation_type`, so a request can never carry two sizing fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "simulation_type")]
pub enum SimulationParameters {
    #[serde(rename = "bill_coverage")]
    BillCoverage {
        #[serde(with = "rust_decimal::serde::float")]
        bill_coverage_percentage: Decimal,
    },
    #[serde(rename = "panels")]
    PanelCount { number_of_panels: u32 },
    #[serde(rename = "investment")]
    InvestmentAmount {
        #[serde(with = "rust_decimal::serde::float")]
        investment_amount_usd: Decimal,
    },
}

impl SimulationParameters {
    pub fn mode(&self) -> SimulationMode {
        match self {
            Self::BillCoverage { .. } => SimulationMode::BillCoverage,
            Self::PanelCount { .. } => SimulationMode::PanelCount,
            Self::InvestmentAmount { .. } => SimulationMode::InvestmentAmount,
        }
    }
}

/// Body of `POST /simulations/create/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub project_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_bill_local_currency: Decimal,
    pub tariff_category_id: i64,
    pub user_email: String,
    pub user_phone: String,
    #[serde(flatten)]
    pub parameters: SimulationParameters,
}

/// Body of `POST /simulations/compare/`: several scenarios for one bill.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparisonRequest {
    pub project_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_bill_local_currency: Decimal,
    pub tariff_category_id: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "float_list")]
    pub coverage_percentages: Vec<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub panel_quantities: Vec<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", with = "float_list")]
    pub investment_amounts: Vec<Decimal>,
}

/// `rust_decimal::serde::float` for a list of amounts.
mod float_list {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Float(#[serde(with = "rust_decimal::serde::float")] Decimal);

    pub fn serialize<S: Serializer>(
        values: &[Decimal],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|&value| Float(value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Decimal>, D::Error> {
        let values = Vec::<Float>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|Float(value)| value).collect())
    }
}

impl ComparisonRequest {
    pub fn has_scenarios(&self) -> bool {
        !(self.coverage_percentages.is_empty()
            && self.panel_quantities.is_empty()
            && self.investment_amounts.is_empty())
    }

    /// Every scenario as the parameters of an individual simulation, in
    /// coverage, panels, investment order.
    pub fn scenarios(&self) -> Vec<SimulationParameters> {
        let coverage = self.coverage_percentages.iter().map(|&p| {
            SimulationParameters::BillCoverage {
                bill_coverage_percentage: p,
            }
        });
        let panels = self
            .panel_quantities
            .iter()
            .map(|&n| SimulationParameters::PanelCount { number_of_panels: n });
        let investment = self.investment_amounts.iter().map(|&a| {
            SimulationParameters::InvestmentAmount {
                investment_amount_usd: a,
            }
        });
        coverage.chain(panels).chain(investment).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn panel_request_serializes_flat_with_type_tag() {
        let request = SimulationRequest {
            project_id: 2,
            monthly_bill_local_currency: dec!(42000.5),
            tariff_category_id: 1,
            user_email: "ana@example.com".to_string(),
            user_phone: "1123456789".to_string(),
            parameters: SimulationParameters::PanelCount { number_of_panels: 12 },
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "project_id": 2,
                "monthly_bill_local_currency": 42000.5,
                "tariff_category_id": 1,
                "user_email": "ana@example.com",
                "user_phone": "1123456789",
                "simulation_type": "panels",
                "number_of_panels": 12
            })
        );
    }

    #[test]
    fn comparison_request_omits_empty_scenario_lists() {
        let request = ComparisonRequest {
            project_id: 1,
            monthly_bill_local_currency: dec!(30000),
            tariff_category_id: 2,
            panel_quantities: vec![10, 20],
            ..Default::default()
        };

        let value = serde_json::to_value(&request).unwrap();

        assert!(value.get("coverage_percentages").is_none());
        assert!(value.get("investment_amounts").is_none());
        assert_eq!(value["panel_quantities"], json!([10, 20]));
    }

    #[test]
    fn comparison_amounts_serialize_as_numbers() {
        let request = ComparisonRequest {
            project_id: 1,
            monthly_bill_local_currency: dec!(30000),
            tariff_category_id: 2,
            coverage_percentages: vec![dec!(50), dec!(75.5)],
            investment_amounts: vec![dec!(5000)],
            ..Default::default()
        };

        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "project_id": 1,
                "monthly_bill_local_currency": 30000.0,
                "tariff_category_id": 2,
                "coverage_percentages": [50.0, 75.5],
                "investment_amounts": [5000.0]
            })
        );
        let back: ComparisonRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back.coverage_percentages, vec![dec!(50), dec!(75.5)]);
    }

    #[test]
    fn comparison_scenarios_keep_order() {
        let request = ComparisonRequest {
            coverage_percentages: vec![dec!(50)],
            panel_quantities: vec![8],
            investment_amounts: vec![dec!(5000)],
            ..Default::default()
        };

        let modes: Vec<_> = request.scenarios().iter().map(|s| s.mode()).collect();

        assert!(request.has_scenarios());
        assert_eq!(
            modes,
            vec![
                SimulationMode::BillCoverage,
                SimulationMode::PanelCount,
                SimulationMode::InvestmentAmount
            ]
        );
    }

    #[test]
    fn empty_comparison_has_no_scenarios() {
        assert!(!ComparisonRequest::default().has_scenarios());
    }
}
