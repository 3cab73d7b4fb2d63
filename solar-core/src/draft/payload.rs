use tracing::debug;

use crate::draft::SimulationDraft;
use crate::models::{SimulationMode, SimulationParameters, SimulationRequest};
use crate::validation::{FieldErrors, ValidationErrors};

/// Builds the `POST /simulations/create/` body for `project_id`.
///
/// Only the sizing field of the draft's active mode is carried over. Any
/// missing required value, including a mode field that never parsed,
/// blocks the request and is reported per field.
pub fn build_payload(
    project_id: i64,
    draft: &SimulationDraft,
) -> Result<SimulationRequest, ValidationErrors> {
    let mut errors = FieldErrors::new();

    if draft.monthly_bill_local_currency.is_none() {
        errors.push("monthly_bill_local_currency", "is required");
    }
    if draft.tariff_category_id.is_none() {
        errors.push("tariff_category_id", "is required");
    }
    if draft.contact_email.trim().is_empty() {
        errors.push("user_email", "is required");
    }
    if draft.contact_phone.trim().is_empty() {
        errors.push("user_phone", "is required");
    }

    let parameters = match draft.mode() {
        SimulationMode::BillCoverage => Some(SimulationParameters::BillCoverage {
            bill_coverage_percentage: draft.bill_coverage_percentage,
        }),
        SimulationMode::PanelCount => draft
            .number_of_panels
            .map(|number_of_panels| SimulationParameters::PanelCount { number_of_panels }),
        SimulationMode::InvestmentAmount => draft.investment_amount_usd.map(|investment_amount_usd| {
            SimulationParameters::InvestmentAmount {
                investment_amount_usd,
            }
        }),
    };
    if parameters.is_none() {
        errors.push(mode_field(draft.mode()), "is required");
    }

    match (
        draft.monthly_bill_local_currency,
        draft.tariff_category_id,
        parameters,
    ) {
        (Some(monthly_bill_local_currency), Some(tariff_category_id), Some(parameters))
            if errors.is_empty() =>
        {
            debug!(project_id, mode = %parameters.mode(), "built simulation payload");
            Ok(SimulationRequest {
                project_id,
                monthly_bill_local_currency,
                tariff_category_id,
                user_email: draft.contact_email.trim().to_string(),
                user_phone: draft.contact_phone.trim().to_string(),
                parameters,
            })
        }
        _ => Err(errors.into()),
    }
}

/// Request key that carries the sizing input of `mode`.
pub fn mode_field(mode: SimulationMode) -> &'static str {
    match mode {
        SimulationMode::BillCoverage => "bill_coverage_percentage",
        SimulationMode::PanelCount => "number_of_panels",
        SimulationMode::InvestmentAmount => "investment_amount_usd",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn complete_draft() -> SimulationDraft {
        let mut draft = SimulationDraft::new(Some("ana@example.com"));
        draft.monthly_bill_local_currency = Some(dec!(50000));
        draft.tariff_category_id = Some(3);
        draft.contact_phone = "1155554444".to_string();
        draft
    }

    #[test]
    fn coverage_draft_for_project_seven_builds_exact_body() {
        let draft = complete_draft();

        let request = build_payload(7, &draft).unwrap();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "project_id": 7,
                "monthly_bill_local_currency": 50000.0,
                "tariff_category_id": 3,
                "user_email": "ana@example.com",
                "user_phone": "1155554444",
                "simulation_type": "bill_coverage",
                "bill_coverage_percentage": 50.0,
            })
        );
    }

    #[test]
    fn investment_body_carries_no_other_mode_keys() {
        let mut draft = complete_draft();
        draft.set_mode(SimulationMode::InvestmentAmount);
        draft.investment_amount_usd = Some(dec!(2500));
        draft.bill_coverage_percentage = dec!(80);

        let body = serde_json::to_value(build_payload(7, &draft).unwrap()).unwrap();
        let object = body.as_object().unwrap();

        assert_eq!(object["simulation_type"], "investment");
        assert_eq!(object["investment_amount_usd"], 2500.0);
        assert!(!object.contains_key("bill_coverage_percentage"));
        assert!(!object.contains_key("number_of_panels"));
    }

    #[test]
    fn panels_body_carries_panel_count() {
        let mut draft = complete_draft();
        draft.set_mode(SimulationMode::PanelCount);
        draft.number_of_panels = Some(12);

        let request = build_payload(7, &draft).unwrap();

        assert_eq!(
            request.parameters,
            SimulationParameters::PanelCount {
                number_of_panels: 12
            }
        );
    }

    #[test]
    fn missing_mode_field_blocks_submission() {
        let mut draft = complete_draft();
        draft.set_mode(SimulationMode::PanelCount);

        let errors = build_payload(7, &draft).unwrap_err();

        assert_eq!(errors.message_for("number_of_panels"), Some("is required"));
        assert_eq!(errors.errors().len(), 1);
    }

    #[test]
    fn every_missing_field_is_reported() {
        let mut draft = SimulationDraft::default();
        draft.set_mode(SimulationMode::InvestmentAmount);

        let errors = build_payload(7, &draft).unwrap_err();

        for field in [
            "monthly_bill_local_currency",
            "tariff_category_id",
            "user_email",
            "user_phone",
            "investment_amount_usd",
        ] {
            assert!(errors.contains(field), "{field} should be reported");
        }
    }

    #[test]
    fn contact_fields_are_trimmed() {
        let mut draft = complete_draft();
        draft.contact_email = "  ana@example.com ".to_string();

        let request = build_payload(7, &draft).unwrap();

        assert_eq!(request.user_email, "ana@example.com");
    }
}
