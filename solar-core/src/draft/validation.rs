use rust_decimal::Decimal;

use crate::draft::{EffectiveLimit, SimulationDraft};
use crate::models::SimulationMode;
use crate::validation::{FieldErrors, ValidationErrors, is_valid_email};

const MIN_PHONE_LEN: usize = 8;

/// Checks every field of `draft` against the form rules and `limit`, the
/// bound currently in force for the active mode. All problems are
/// reported together.
pub fn validate_draft(
    draft: &SimulationDraft,
    limit: &EffectiveLimit,
) -> Result<(), ValidationErrors> {
    let mut errors = FieldErrors::new();

    let email = draft.contact_email.trim();
    if email.is_empty() {
        errors.push("user_email", "is required");
    } else if !is_valid_email(email) {
        errors.push("user_email", "is not a valid e-mail address");
    }
    errors.require_text("user_phone", &draft.contact_phone, MIN_PHONE_LEN);

    match draft.monthly_bill_local_currency {
        None => errors.push("monthly_bill_local_currency", "is required"),
        Some(bill) if bill < Decimal::ONE => {
            errors.push("monthly_bill_local_currency", "must be at least 1")
        }
        Some(_) => {}
    }
    if draft.tariff_category_id.is_none() {
        errors.push("tariff_category_id", "is required");
    }

    match draft.mode() {
        SimulationMode::BillCoverage => {
            let value = draft.bill_coverage_percentage;
            if !limit.admits(value) {
                errors.push(
                    "bill_coverage_percentage",
                    format!("must be {limit}"),
                );
            }
        }
        SimulationMode::PanelCount => match draft.number_of_panels {
            None => errors.push("number_of_panels", "is required"),
            Some(0) => errors.push("number_of_panels", "must be at least 1"),
            Some(n) if !limit.admits(Decimal::from(n)) => {
                errors.push("number_of_panels", format!("must be {limit}"))
            }
            Some(_) => {}
        },
        SimulationMode::InvestmentAmount => match draft.investment_amount_usd {
            None => errors.push("investment_amount_usd", "is required"),
            Some(amount) if amount < Decimal::ONE => {
                errors.push("investment_amount_usd", "must be at least 1 USD")
            }
            Some(amount) if !limit.admits(amount) => {
                errors.push("investment_amount_usd", format!("must be {limit} USD"))
            }
            Some(_) => {}
        },
    }

    errors.finish()
}
