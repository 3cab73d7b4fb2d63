use solar_core::SimulationDraft;
use solar_core::models::SimulationMode;

use crate::utils::parse_optional_decimal;

/// Simulation inputs as typed on the command line, before parsing.
#[derive(Debug, Clone, Default)]
pub struct SimulationForm {
    pub mode: SimulationMode,
    pub monthly_bill: String,
    pub tariff_category_id: Option<i64>,
    pub coverage: String,
    pub panels: String,
    pub investment: String,
    pub email: String,
    pub phone: String,
}

impl SimulationForm {
    /// Parses the text fields into a draft for `mode`.
    ///
    /// Only malformed numbers are reported here. Missing values and
    /// out-of-range values are left for draft validation, which knows the
    /// project's limits. A blank coverage keeps the draft default.
    pub fn to_draft(&self, session_email: Option<&str>) -> Result<SimulationDraft, Vec<String>> {
        let mut errors = Vec::new();
        let mut decimal = |field: &str, value: &str| {
            parse_optional_decimal(value).unwrap_or_else(|e| {
                errors.push(format!("{field}: {e}"));
                None
            })
        };

        let monthly_bill = decimal("monthly bill", &self.monthly_bill);
        let coverage = decimal("coverage", &self.coverage);
        let investment = decimal("investment", &self.investment);

        let panels = match self.panels.trim() {
            "" => None,
            text => match text.parse::<u32>() {
                Ok(n) => Some(n),
                Err(_) => {
                    errors.push(format!("panels: '{text}' is not a whole number"));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        let mut draft = SimulationDraft::new(session_email);
        draft.set_mode(self.mode);
        draft.monthly_bill_local_currency = monthly_bill;
        draft.tariff_category_id = self.tariff_category_id;
        if !self.email.trim().is_empty() {
            draft.contact_email = self.email.clone();
        }
        draft.contact_phone = self.phone.clone();

        match self.mode {
            SimulationMode::BillCoverage => {
                if let Some(coverage) = coverage {
                    draft.bill_coverage_percentage = coverage;
                }
            }
            SimulationMode::PanelCount => draft.number_of_panels = panels,
            SimulationMode::InvestmentAmount => draft.investment_amount_usd = investment,
        }
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn form(mode: SimulationMode) -> SimulationForm {
        SimulationForm {
            mode,
            monthly_bill: "50,000".to_string(),
            tariff_category_id: Some(3),
            coverage: "75".to_string(),
            panels: "12".to_string(),
            investment: "5000".to_string(),
            email: String::new(),
            phone: "1155554444".to_string(),
        }
    }

    #[test]
    fn only_the_active_mode_field_is_carried() {
        let draft = form(SimulationMode::PanelCount)
            .to_draft(Some("ana@example.com"))
            .unwrap();

        assert_eq!(draft.mode(), SimulationMode::PanelCount);
        assert_eq!(draft.monthly_bill_local_currency, Some(dec!(50000)));
        assert_eq!(draft.number_of_panels, Some(12));
        assert_eq!(draft.investment_amount_usd, None);
        assert_eq!(draft.bill_coverage_percentage, dec!(50));
        assert_eq!(draft.contact_email, "ana@example.com");
    }

    #[test]
    fn blank_coverage_keeps_default() {
        let mut form = form(SimulationMode::BillCoverage);
        form.coverage = String::new();

        let draft = form.to_draft(None).unwrap();

        assert_eq!(draft.bill_coverage_percentage, dec!(50));
    }

    #[test]
    fn explicit_email_beats_session() {
        let mut form = form(SimulationMode::InvestmentAmount);
        form.email = "otra@example.com".to_string();

        let draft = form.to_draft(Some("ana@example.com")).unwrap();

        assert_eq!(draft.contact_email, "otra@example.com");
        assert_eq!(draft.investment_amount_usd, Some(dec!(5000)));
    }

    #[test]
    fn malformed_numbers_are_all_reported() {
        let mut form = form(SimulationMode::PanelCount);
        form.monthly_bill = "mucho".to_string();
        form.panels = "8.5".to_string();

        let errors = form.to_draft(None).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("monthly bill"));
        assert!(errors[1].starts_with("panels"));
    }
}
