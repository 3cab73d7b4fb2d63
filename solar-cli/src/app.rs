//! Command handlers. Each one talks to the configured backend and returns
//! the text to print, so `main` only parses arguments and writes output.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use rust_decimal::Decimal;
use solar_core::draft::resolve_effective_limit;
use solar_core::models::{
    BillLimits, CapacityCheck, ComparisonRequest, ComparisonResponse, ContactMessage,
    NewsletterSubscription, Project, ProjectStats, Simulation, SimulationMode, SimulationStats,
    TariffCategory,
};
use solar_core::{ApiError, ServiceRegistry, SimulationApi, SimulationSession, SubmitError};
use solar_data::OfflineServiceFactory;
use solar_http::HttpServiceFactory;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::models::SimulationForm;
use crate::state::{AppState, ExchangeRateView, SessionView};
use crate::utils::{
    Currency, format_currency, format_energy, format_number, format_percentage, format_power,
};

/// Every backend this binary knows about.
pub fn build_registry() -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    registry.register(Box::new(HttpServiceFactory));
    registry.register(Box::new(OfflineServiceFactory));
    registry
}

pub async fn connect(config: &AppConfig) -> Result<Arc<dyn SimulationApi>> {
    let service = config.service_config();
    debug!(backend = %service.backend, endpoint = %service.endpoint, "connecting");
    let api = build_registry()
        .create(&service)
        .await
        .with_context(|| format!("cannot start the '{}' backend", service.backend))?;
    Ok(Arc::from(api))
}

/// Failures carry the text meant for the visitor.
fn api_error(err: ApiError) -> anyhow::Error {
    anyhow!(err.user_message())
}

/// Inputs of `solar compare`.
#[derive(Debug, Clone, Default)]
pub struct CompareArgs {
    pub project_id: i64,
    pub monthly_bill: Decimal,
    pub tariff_category_id: i64,
    pub coverages: Vec<Decimal>,
    pub panels: Vec<u32>,
    pub investments: Vec<Decimal>,
}

pub struct App {
    api: Arc<dyn SimulationApi>,
    state: AppState,
}

impl App {
    pub fn new(api: Arc<dyn SimulationApi>, session_email: Option<&str>) -> Self {
        Self {
            api,
            state: AppState::new(session_email),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The rate is only used for display, so a failure just leaves it unset.
    async fn load_exchange_rate(&mut self) {
        if self.state.exchange_rate().is_some() {
            return;
        }
        match self.api.current_exchange_rate().await {
            Ok(rate) => self.state.set_exchange_rate(rate),
            Err(err) => warn!(error = %err, "exchange rate unavailable"),
        }
    }

    pub async fn projects(&mut self, search: Option<&str>) -> Result<String> {
        let projects = self.api.list_projects(search).await.map_err(api_error)?;
        Ok(render_project_list(&projects))
    }

    pub async fn project(&mut self, id: i64) -> Result<String> {
        let project = self.api.get_project(id).await.map_err(api_error)?;
        self.load_exchange_rate().await;
        Ok(render_project(&project, &self.state))
    }

    pub async fn tariffs(&mut self) -> Result<String> {
        let tariffs = self.api.list_tariff_categories().await.map_err(api_error)?;
        Ok(render_tariffs(&tariffs))
    }

    /// Bill-derived limits for a project, plus the bound each mode ends up
    /// with once project capacity is taken into account.
    pub async fn limits(
        &mut self,
        project_id: i64,
        monthly_bill: Decimal,
        tariff_category_id: i64,
    ) -> Result<String> {
        let mut session = SimulationSession::new(Arc::clone(&self.api), None);
        session.load_project(project_id).await.map_err(api_error)?;
        {
            let draft = session.draft_mut();
            draft.monthly_bill_local_currency = Some(monthly_bill);
            draft.tariff_category_id = Some(tariff_category_id);
        }
        session.refresh_limits().await;

        let limits = session
            .limits()
            .context("no limits available for this bill and tariff")?;
        let capacity = session.project().map(Project::capacity);

        let mut out = render_limits(&limits);
        for &mode in SimulationMode::all() {
            let bound = resolve_effective_limit(capacity.as_ref(), Some(&limits), mode);
            let _ = writeln!(out, "  {:<26} {bound}", mode.label());
        }
        Ok(out)
    }

    /// Runs one simulation through a session: fetch the project and its
    /// limits, validate the draft, submit.
    pub async fn simulate(&mut self, project_id: i64, form: &SimulationForm) -> Result<String> {
        let draft = form
            .to_draft(self.state.session_email())
            .map_err(|errors| anyhow!(errors.join("\n")))?;

        let mut session = SimulationSession::new(Arc::clone(&self.api), self.state.session_email());
        session.load_project(project_id).await.map_err(api_error)?;
        *session.draft_mut() = draft;
        session.refresh_limits().await;
        debug!(limit = %session.effective_limit(), mode = %form.mode, "effective limit");

        let response = match session.submit().await {
            Ok(response) => response,
            Err(SubmitError::Invalid(errors)) => {
                let lines: Vec<String> = errors
                    .errors()
                    .iter()
                    .map(|e| format!("  {}: {}", e.field, e.message))
                    .collect();
                bail!("the simulation has invalid fields:\n{}", lines.join("\n"));
            }
            Err(SubmitError::Api(err)) => return Err(api_error(err)),
            Err(err) => return Err(err.into()),
        };

        self.state.record_simulation(&response.simulation);
        info!(simulation_id = %response.simulation.id, "simulation stored");

        let mut out = render_simulation(&response.simulation);
        if let Some(warning) = capacity_warning(&response.capacity_check) {
            let _ = writeln!(out, "\n{warning}");
        }
        Ok(out)
    }

    pub async fn compare(&mut self, args: CompareArgs) -> Result<String> {
        let request = ComparisonRequest {
            project_id: args.project_id,
            monthly_bill_local_currency: args.monthly_bill,
            tariff_category_id: args.tariff_category_id,
            coverage_percentages: args.coverages,
            panel_quantities: args.panels,
            investment_amounts: args.investments,
        };
        if !request.has_scenarios() {
            bail!("give at least one --coverage, --panels or --investment scenario");
        }
        let comparison = self
            .api
            .compare_simulations(&request)
            .await
            .map_err(api_error)?;
        Ok(render_comparison(&comparison))
    }

    /// Simulations stored for `email`, or for the session e-mail.
    pub async fn history(&mut self, email: Option<&str>) -> Result<String> {
        let email = email
            .or(self.state.session_email())
            .map(str::to_string)
            .context("no e-mail given; pass --email or set [session] email")?;
        let simulations = self
            .api
            .list_user_simulations(&email)
            .await
            .map_err(api_error)?;
        self.state.set_user_simulations(simulations);
        Ok(render_history(&email, &self.state))
    }

    pub async fn contact(&mut self, message: ContactMessage) -> Result<String> {
        message.validate()?;
        let ack = self
            .api
            .send_contact_message(&message)
            .await
            .map_err(api_error)?;
        Ok(ack
            .message
            .unwrap_or_else(|| "Message sent".to_string()))
    }

    pub async fn subscribe(&mut self, email: &str, name: Option<&str>) -> Result<String> {
        let subscription = NewsletterSubscription {
            email: email.trim().to_string(),
            name: name.map(str::to_string),
        };
        let ack = self
            .api
            .subscribe_newsletter(&subscription)
            .await
            .map_err(api_error)?;
        Ok(ack.message.unwrap_or_else(|| "Subscribed".to_string()))
    }

    pub async fn unsubscribe(&mut self, email: &str) -> Result<String> {
        let ack = self
            .api
            .unsubscribe_newsletter(email.trim())
            .await
            .map_err(api_error)?;
        Ok(ack.message.unwrap_or_else(|| "Unsubscribed".to_string()))
    }

    pub async fn stats(&mut self) -> Result<String> {
        let projects = self.api.project_stats().await.map_err(api_error)?;
        let simulations = self.api.simulation_stats().await.map_err(api_error)?;
        Ok(render_stats(&projects, &simulations))
    }
}

// ─── rendering ───────────────────────────────────────────────────────────────

pub fn render_project_list(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects found.\n".to_string();
    }
    let mut out = String::new();
    for p in projects {
        let _ = writeln!(
            out,
            "{:>4}  {:<32} {:<16} {:<18} {} available",
            p.id,
            p.name,
            p.location,
            p.status.label(),
            format_power(p.available_power_kw)
        );
    }
    out
}

pub fn render_project(project: &Project, rates: &impl ExchangeRateView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", project.name, project.location);
    if !project.description.is_empty() {
        let _ = writeln!(out, "{}", project.description);
    }
    let _ = writeln!(out, "Status:           {}", project.status.label());
    let _ = writeln!(
        out,
        "Installed power:  {}",
        format_power(project.total_power_installed_kw)
    );
    let _ = writeln!(
        out,
        "Available power:  {} ({})",
        format_power(project.available_power_kw),
        format_percentage(project.available_power_percentage())
    );
    let _ = writeln!(out, "Panel rating:     {} Wp", format_number(project.panel_power_wp, 0));

    let panel_price = project
        .price_per_panel_usd
        .unwrap_or(project.price_per_wp_usd * project.panel_power_wp);
    let local = rates
        .exchange_rate()
        .map(|rate| format!(" (~{})", format_currency(rate.to_local(panel_price), Currency::Local)))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "Panel price:      {}{local}",
        format_currency(panel_price, Currency::Usd)
    );

    if let Some(max) = project.capacity().max_panels_by_capacity() {
        let _ = writeln!(out, "Panels available: {max}");
    }
    out
}

pub fn render_tariffs(tariffs: &[TariffCategory]) -> String {
    let mut out = String::new();
    for t in tariffs {
        let _ = writeln!(
            out,
            "{:>4}  {:<8} {:<24} peak {} / valley {} per kWh, fixed {}",
            t.id,
            t.code,
            t.name,
            format_number(t.energy_charge_peak, 2),
            format_number(t.energy_charge_valley, 2),
            format_currency(t.fixed_charge_monthly, Currency::Local)
        );
    }
    out
}

pub fn render_limits(limits: &BillLimits) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Max panels:         {}", limits.max_panels_allowed);
    let _ = writeln!(
        out,
        "Max investment:     {} ({})",
        format_currency(limits.max_investment_usd, Currency::Usd),
        format_currency(limits.max_investment_local_currency, Currency::Local)
    );
    let _ = writeln!(
        out,
        "Payback at max:     {} years",
        format_number(limits.max_payback_years, 1)
    );
    let _ = writeln!(
        out,
        "Savings per panel:  {} / month",
        format_currency(limits.savings_per_panel_local_currency, Currency::Local)
    );
    let _ = writeln!(out, "Limits by mode:");
    out
}

pub fn render_simulation(simulation: &Simulation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Simulation {}", simulation.id);
    let _ = writeln!(out, "Project:            {}", simulation.project_name);
    let _ = writeln!(out, "Mode:               {}", simulation.simulation_type.label());
    let _ = writeln!(out, "Panels:             {}", simulation.number_of_panels);
    let _ = writeln!(
        out,
        "Installed power:    {}",
        format_power(simulation.installed_power_kw)
    );
    let _ = writeln!(
        out,
        "Generation:         {} / month, {} / year",
        format_energy(simulation.monthly_generation_kwh),
        format_energy(simulation.annual_generation_kwh)
    );
    let _ = writeln!(
        out,
        "Investment:         {} ({})",
        format_currency(simulation.total_investment_usd, Currency::Usd),
        format_currency(simulation.total_investment_local_currency, Currency::Local)
    );
    let usd = simulation
        .monthly_savings_usd()
        .map(|usd| format!(" ({})", format_currency(usd, Currency::Usd)))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "Monthly savings:    {}{usd}",
        format_currency(simulation.monthly_savings_local_currency, Currency::Local)
    );
    let _ = writeln!(
        out,
        "Annual savings:     {}",
        format_currency(simulation.annual_savings_local_currency, Currency::Local)
    );
    let _ = writeln!(
        out,
        "Bill coverage:      {}",
        format_percentage(simulation.coverage_achieved)
    );
    let _ = writeln!(
        out,
        "Payback:            {} years",
        format_number(simulation.payback_period_years, 1)
    );
    let _ = writeln!(out, "Annual ROI:         {}", format_percentage(simulation.roi_annual));
    out
}

/// Shown next to the results; an oversized simulation still succeeds.
pub fn capacity_warning(check: &CapacityCheck) -> Option<String> {
    (!check.has_capacity).then(|| {
        format!(
            "Warning: the required power ({}) exceeds what the project has available ({}).",
            format_power(check.required_power_kw),
            format_power(check.available_power_kw)
        )
    })
}

pub fn render_comparison(comparison: &ComparisonResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} available)",
        comparison.project_info.name,
        format_power(comparison.project_info.available_power_kw)
    );
    let _ = writeln!(
        out,
        "{:<14} {:>10} {:>7} {:>14} {:>16} {:>9}",
        "scenario", "value", "panels", "investment", "savings/month", "payback"
    );
    for entry in &comparison.comparison_results {
        let s = &entry.simulation;
        let _ = writeln!(
            out,
            "{:<14} {:>10} {:>7} {:>14} {:>16} {:>9}",
            entry.mode.as_str(),
            format_number(entry.parameter, 0),
            s.number_of_panels,
            format_currency(s.total_investment_usd, Currency::Usd),
            format_currency(s.monthly_savings_local_currency, Currency::Local),
            format_number(s.payback_period_years, 1)
        );
    }
    out
}

pub fn render_history(email: &str, session: &impl SessionView) -> String {
    let simulations = session.user_simulations();
    if simulations.is_empty() {
        return format!("No simulations for {email}.\n");
    }
    let mut out = String::new();
    let _ = writeln!(out, "Simulations for {email}:");
    for s in simulations {
        let _ = writeln!(
            out,
            "{}  {:<28} {:<14} {:>12}  payback {} years",
            s.created_at.format("%Y-%m-%d"),
            s.project_name,
            s.simulation_type.as_str(),
            format_currency(s.total_investment_usd, Currency::Usd),
            format_number(s.payback_period_years, 1)
        );
    }
    out
}

pub fn render_stats(projects: &ProjectStats, simulations: &SimulationStats) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Projects:        {} ({} operational, {} funding)",
        projects.total_projects, projects.operational_projects, projects.funding_projects
    );
    let _ = writeln!(
        out,
        "Installed:       {}",
        format_power(projects.total_power_installed_kw)
    );
    let _ = writeln!(
        out,
        "Available:       {}",
        format_power(projects.total_power_available_kw)
    );
    let _ = writeln!(out, "Simulations:     {}", simulations.total_simulations);
    let _ = writeln!(
        out,
        "Avg investment:  {}",
        format_currency(simulations.average_investment_usd, Currency::Usd)
    );
    let _ = writeln!(
        out,
        "Avg payback:     {} years",
        format_number(simulations.average_payback_years, 1)
    );
    let _ = writeln!(
        out,
        "Avg ROI:         {}",
        format_percentage(simulations.average_roi_annual)
    );
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn registry_knows_both_backends() {
        assert_eq!(build_registry().available_backends(), vec!["http", "offline"]);
    }

    #[test]
    fn capacity_warning_only_when_short() {
        let mut check = CapacityCheck {
            has_capacity: true,
            required_power_kw: dec!(150),
            available_power_kw: dec!(100),
            utilization_percentage: dec!(150),
        };
        assert_eq!(capacity_warning(&check), None);

        check.has_capacity = false;
        assert_eq!(
            capacity_warning(&check).as_deref(),
            Some(
                "Warning: the required power (150,0 kW) exceeds what the project has available (100,0 kW)."
            )
        );
    }

    #[test]
    fn empty_project_list_says_so() {
        assert_eq!(render_project_list(&[]), "No projects found.\n");
    }
}
