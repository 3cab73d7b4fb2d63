use rust_decimal::Decimal;
use tracing::debug;

use crate::models::SimulationMode;

/// Coverage percentage a fresh draft starts from.
pub const DEFAULT_COVERAGE_PERCENTAGE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// The visitor's in-progress simulation inputs.
///
/// Only the sizing field that belongs to [`SimulationDraft::mode`] carries
/// meaning; switching modes through [`SimulationDraft::set_mode`] returns
/// the other two to their defaults. For the same reason a draft cannot be
/// built from serialized data:
///
/// ```compile_fail
/// fn from_json<T: serde::de::DeserializeOwned>() {}
/// from_json::<solar_core::SimulationDraft>();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationDraft {
    mode: SimulationMode,
    pub monthly_bill_local_currency: Option<Decimal>,
    pub tariff_category_id: Option<i64>,
    pub bill_coverage_percentage: Decimal,
    pub number_of_panels: Option<u32>,
    pub investment_amount_usd: Option<Decimal>,
    pub contact_email: String,
    pub contact_phone: String,
}

impl Default for SimulationDraft {
    fn default() -> Self {
        Self {
            mode: SimulationMode::default(),
            monthly_bill_local_currency: None,
            tariff_category_id: None,
            bill_coverage_percentage: DEFAULT_COVERAGE_PERCENTAGE,
            number_of_panels: None,
            investment_amount_usd: None,
            contact_email: String::new(),
            contact_phone: String::new(),
        }
    }
}

impl SimulationDraft {
    /// A default draft with the contact e-mail prefilled from the session.
    pub fn new(session_email: Option<&str>) -> Self {
        Self {
            contact_email: session_email.unwrap_or_default().to_string(),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    /// Makes `mode` active and resets the sizing fields of every other mode.
    /// Selecting the active mode again leaves the draft untouched.
    pub fn set_mode(&mut self, mode: SimulationMode) {
        if mode == self.mode {
            return;
        }
        debug!(from = %self.mode, to = %mode, "switching simulation mode");

        if mode != SimulationMode::BillCoverage {
            self.bill_coverage_percentage = DEFAULT_COVERAGE_PERCENTAGE;
        }
        if mode != SimulationMode::PanelCount {
            self.number_of_panels = None;
        }
        if mode != SimulationMode::InvestmentAmount {
            self.investment_amount_usd = None;
        }
        self.mode = mode;
    }

    /// Back to defaults after a successful submission. The contact e-mail
    /// survives so the next simulation is attributed to the same visitor.
    pub fn reset(&mut self) {
        let email = std::mem::take(&mut self.contact_email);
        *self = Self {
            contact_email: email,
            ..Self::default()
        };
    }
}
