//! Process-wide state shared by the command handlers.
//!
//! Handlers that only need to read take one of the view traits, so the
//! places that can change the session are easy to find.

use solar_core::models::{ExchangeRate, Simulation, SimulationSummary};
use tracing::info;

/// Who the visitor is and what they have simulated so far.
pub trait SessionView {
    fn session_email(&self) -> Option<&str>;

    /// Newest first.
    fn user_simulations(&self) -> &[SimulationSummary];
}

/// The rate used to show local amounts in USD.
pub trait ExchangeRateView {
    fn exchange_rate(&self) -> Option<&ExchangeRate>;
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    session_email: Option<String>,
    exchange_rate: Option<ExchangeRate>,
    simulations: Vec<SimulationSummary>,
}

impl AppState {
    pub fn new(session_email: Option<&str>) -> Self {
        Self {
            session_email: session_email
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
            ..Default::default()
        }
    }

    pub fn set_exchange_rate(&mut self, rate: ExchangeRate) {
        self.exchange_rate = Some(rate);
    }

    /// Replaces the history with what the service returned for the session.
    pub fn set_user_simulations(&mut self, simulations: Vec<SimulationSummary>) {
        self.simulations = simulations;
    }

    /// Records a freshly created simulation. An e-mail on the simulation
    /// that differs from the session's becomes the session e-mail.
    pub fn record_simulation(&mut self, simulation: &Simulation) {
        if let Some(email) = simulation.user_email.as_deref().map(str::trim)
            && !email.is_empty()
            && self.session_email.as_deref() != Some(email)
        {
            info!(email, "session e-mail updated from simulation");
            self.session_email = Some(email.to_string());
        }
        self.simulations.insert(0, SimulationSummary::from(simulation));
    }
}

impl SessionView for AppState {
    fn session_email(&self) -> Option<&str> {
        self.session_email.as_deref()
    }

    fn user_simulations(&self) -> &[SimulationSummary] {
        &self.simulations
    }
}

impl ExchangeRateView for AppState {
    fn exchange_rate(&self) -> Option<&ExchangeRate> {
        self.exchange_rate.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use solar_core::models::SimulationMode;

    use super::*;

    fn simulation(id: &str, email: Option<&str>) -> Simulation {
        Simulation {
            id: id.to_string(),
            project_name: "Parque Solar Norte".to_string(),
            project_location: String::new(),
            tariff_category_name: String::new(),
            user_email: email.map(str::to_string),
            simulation_type: SimulationMode::PanelCount,
            monthly_consumption_kwh: None,
            bill_coverage_percentage: None,
            number_of_panels: 8,
            investment_amount_usd: None,
            total_investment_usd: Decimal::ZERO,
            total_investment_local_currency: Decimal::ZERO,
            installed_power_kw: Decimal::ZERO,
            annual_generation_kwh: Decimal::ZERO,
            monthly_generation_kwh: Decimal::ZERO,
            monthly_savings_local_currency: Decimal::ZERO,
            annual_savings_local_currency: Decimal::ZERO,
            payback_period_years: Decimal::ZERO,
            coverage_achieved: Decimal::ZERO,
            roi_annual: Decimal::ZERO,
            exchange_rate_used: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn blank_session_email_is_none() {
        assert_eq!(AppState::new(Some("  ")).session_email(), None);
    }

    #[test]
    fn new_email_replaces_session_and_simulation_is_prepended() {
        let mut state = AppState::new(Some("old@example.com"));
        state.record_simulation(&simulation("a", Some("old@example.com")));
        state.record_simulation(&simulation("b", Some("new@example.com")));

        assert_eq!(state.session_email(), Some("new@example.com"));
        let ids: Vec<&str> = state.user_simulations().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn simulation_without_email_keeps_session() {
        let mut state = AppState::new(Some("ana@example.com"));
        state.record_simulation(&simulation("a", None));

        assert_eq!(state.session_email(), Some("ana@example.com"));
        assert_eq!(state.user_simulations().len(), 1);
    }
}
