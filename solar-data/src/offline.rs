use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use solar_core::calculations::common::round_half_up;
use solar_core::calculations::{EngineError, SimulationEngine, SimulationFigures};
use solar_core::models::{
    Acknowledgement, BillLimits, ComparisonEntry, ComparisonProjectInfo, ComparisonRequest,
    ComparisonResponse, ContactMessage, ExchangeRate, LimitsQuery, NewsletterSubscription,
    Project, ProjectStats, ProjectStatus, Simulation, SimulationParameters, SimulationRequest,
    SimulationResponse, SimulationStats, SimulationSummary, TariffCategory,
};
use solar_core::validation::is_valid_email;
use solar_core::{ApiError, SimulationApi};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::Catalog;

/// [`SimulationApi`] answered locally from a [`Catalog`] and the reference
/// engine. Simulations and subscriptions live for the lifetime of the value.
pub struct OfflineSimulationApi {
    catalog: Catalog,
    simulations: Mutex<Vec<Simulation>>,
    subscribers: Mutex<Vec<NewsletterSubscription>>,
}

impl OfflineSimulationApi {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            simulations: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn project(&self, id: i64) -> Result<&Project, ApiError> {
        self.catalog.project(id).ok_or(ApiError::NotFound)
    }

    fn tariff(&self, id: i64) -> Result<&TariffCategory, ApiError> {
        self.catalog.tariff_category(id).ok_or(ApiError::NotFound)
    }

    fn engine<'a>(
        &'a self,
        project: &'a Project,
        tariff: &'a TariffCategory,
    ) -> Result<SimulationEngine<'a>, ApiError> {
        SimulationEngine::new(project, tariff, self.catalog.exchange_rate.current_rate)
            .map_err(engine_error)
    }

    fn simulations(&self) -> MutexGuard<'_, Vec<Simulation>> {
        self.simulations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers(&self) -> MutexGuard<'_, Vec<NewsletterSubscription>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn engine_error(err: EngineError) -> ApiError {
    ApiError::Validation(err.to_string())
}

/// Monthly kWh implied by `bill` under `tariff`.
fn consumption_for(
    tariff: &TariffCategory,
    bill: Decimal,
) -> Result<Decimal, ApiError> {
    if tariff.blended_energy_charge() <= Decimal::ZERO {
        return Err(ApiError::Validation(format!(
            "tariff category '{}' has no energy charge",
            tariff.code
        )));
    }
    match tariff.consumption_for_bill(bill) {
        Some(kwh) if kwh > Decimal::ZERO => Ok(kwh),
        Some(_) => Err(ApiError::Validation(
            "monthly bill does not exceed the tariff's fixed charge".to_string(),
        )),
        None => Err(engine_error(EngineError::Overflow)),
    }
}

fn to_simulation(
    figures: SimulationFigures,
    project: &Project,
    tariff: &TariffCategory,
    user_email: Option<String>,
) -> Simulation {
    Simulation {
        id: Uuid::new_v4().to_string(),
        project_name: project.name.clone(),
        project_location: project.location.clone(),
        tariff_category_name: tariff.name.clone(),
        user_email,
        simulation_type: figures.mode,
        monthly_consumption_kwh: Some(round_half_up(figures.monthly_consumption_kwh)),
        bill_coverage_percentage: figures.bill_coverage_percentage,
        number_of_panels: figures.number_of_panels,
        investment_amount_usd: figures.investment_amount_usd,
        total_investment_usd: figures.total_investment_usd,
        total_investment_local_currency: figures.total_investment_local_currency,
        installed_power_kw: figures.installed_power_kw,
        annual_generation_kwh: figures.annual_generation_kwh,
        monthly_generation_kwh: figures.monthly_generation_kwh,
        monthly_savings_local_currency: figures.monthly_savings_local_currency,
        annual_savings_local_currency: figures.annual_savings_local_currency,
        payback_period_years: figures.payback_period_years,
        coverage_achieved: figures.coverage_achieved,
        roi_annual: figures.roi_annual,
        exchange_rate_used: figures.exchange_rate_used,
        created_at: Utc::now(),
    }
}

fn average(values: impl Iterator<Item = Decimal>) -> Decimal {
    let (sum, count) = values.fold((Decimal::ZERO, 0u32), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        Decimal::ZERO
    } else {
        round_half_up(sum / Decimal::from(count))
    }
}

fn matches_search(
    project: &Project,
    needle: &str,
) -> bool {
    [&project.name, &project.description, &project.location]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

#[async_trait]
impl SimulationApi for OfflineSimulationApi {
    async fn list_projects(&self, search: Option<&str>) -> Result<Vec<Project>, ApiError> {
        let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        Ok(self
            .catalog
            .projects
            .iter()
            .filter(|p| needle.is_empty() || matches_search(p, &needle))
            .cloned()
            .collect())
    }

    async fn get_project(&self, id: i64) -> Result<Project, ApiError> {
        self.project(id).cloned()
    }

    async fn project_stats(&self) -> Result<ProjectStats, ApiError> {
        let projects = &self.catalog.projects;
        let count = |status: ProjectStatus| {
            projects.iter().filter(|p| p.status == status).count() as u32
        };
        Ok(ProjectStats {
            total_projects: projects.len() as u32,
            operational_projects: count(ProjectStatus::Operational),
            funding_projects: count(ProjectStatus::Funding),
            total_power_installed_kw: projects.iter().map(|p| p.total_power_installed_kw).sum(),
            total_power_available_kw: projects.iter().map(|p| p.available_power_kw).sum(),
        })
    }

    async fn list_tariff_categories(&self) -> Result<Vec<TariffCategory>, ApiError> {
        Ok(self.catalog.tariff_categories.clone())
    }

    async fn current_exchange_rate(&self) -> Result<ExchangeRate, ApiError> {
        Ok(self.catalog.exchange_rate.clone())
    }

    async fn calculate_limits(&self, query: &LimitsQuery) -> Result<BillLimits, ApiError> {
        let project = self.project(query.project_id)?;
        let tariff = self.tariff(query.tariff_category_id)?;
        let consumption = consumption_for(tariff, query.monthly_bill_local_currency)?;

        let limits = self
            .engine(project, tariff)?
            .bill_limits(consumption)
            .map_err(engine_error)?;
        debug!(?query, max_panels = limits.max_panels_allowed, "computed bill limits");
        Ok(limits)
    }

    async fn create_simulation(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResponse, ApiError> {
        if !is_valid_email(&request.user_email) {
            return Err(ApiError::Validation("user_email is not a valid address".to_string()));
        }
        let project = self.project(request.project_id)?;
        let tariff = self.tariff(request.tariff_category_id)?;
        let consumption = consumption_for(tariff, request.monthly_bill_local_currency)?;
        let engine = self.engine(project, tariff)?;

        let figures = engine
            .simulate(consumption, &request.parameters)
            .map_err(engine_error)?;
        let capacity_check = engine.capacity_check(figures.installed_power_kw);
        let simulation = to_simulation(figures, project, tariff, Some(request.user_email.clone()));

        info!(
            simulation_id = %simulation.id,
            project_id = project.id,
            panels = simulation.number_of_panels,
            "stored offline simulation"
        );
        self.simulations().push(simulation.clone());

        Ok(SimulationResponse {
            simulation,
            capacity_check,
        })
    }

    async fn compare_simulations(
        &self,
        request: &ComparisonRequest,
    ) -> Result<ComparisonResponse, ApiError> {
        if !request.has_scenarios() {
            return Err(ApiError::Validation(
                "provide at least one scenario to compare".to_string(),
            ));
        }
        let project = self.project(request.project_id)?;
        let tariff = self.tariff(request.tariff_category_id)?;
        let consumption = consumption_for(tariff, request.monthly_bill_local_currency)?;
        let engine = self.engine(project, tariff)?;

        let comparison_results = request
            .scenarios()
            .into_iter()
            .map(|parameters| {
                let figures = engine.simulate(consumption, &parameters).map_err(engine_error)?;
                let parameter = match parameters {
                    SimulationParameters::BillCoverage {
                        bill_coverage_percentage,
                    } => bill_coverage_percentage,
                    SimulationParameters::PanelCount { number_of_panels } => {
                        Decimal::from(number_of_panels)
                    }
                    SimulationParameters::InvestmentAmount {
                        investment_amount_usd,
                    } => investment_amount_usd,
                };
                Ok(ComparisonEntry {
                    mode: parameters.mode(),
                    parameter,
                    simulation: to_simulation(figures, project, tariff, None),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(ComparisonResponse {
            project_info: ComparisonProjectInfo {
                id: project.id,
                name: project.name.clone(),
                available_power_kw: project.available_power_kw,
            },
            comparison_results,
        })
    }

    async fn get_simulation(&self, id: &str) -> Result<Simulation, ApiError> {
        self.simulations()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn list_user_simulations(
        &self,
        email: &str,
    ) -> Result<Vec<SimulationSummary>, ApiError> {
        let email = email.trim();
        Ok(self
            .simulations()
            .iter()
            .rev()
            .filter(|s| s.user_email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email)))
            .map(SimulationSummary::from)
            .collect())
    }

    async fn simulation_stats(&self) -> Result<SimulationStats, ApiError> {
        let simulations = self.simulations();
        Ok(SimulationStats {
            total_simulations: simulations.len() as u64,
            average_investment_usd: average(simulations.iter().map(|s| s.total_investment_usd)),
            average_payback_years: average(simulations.iter().map(|s| s.payback_period_years)),
            average_roi_annual: average(simulations.iter().map(|s| s.roi_annual)),
        })
    }

    async fn send_contact_message(
        &self,
        message: &ContactMessage,
    ) -> Result<Acknowledgement, ApiError> {
        message
            .validate()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        info!(from = %message.email, subject = %message.subject, "contact message received");
        Ok(Acknowledgement {
            success: true,
            message: Some("Message received".to_string()),
        })
    }

    async fn subscribe_newsletter(
        &self,
        subscription: &NewsletterSubscription,
    ) -> Result<Acknowledgement, ApiError> {
        let email = subscription.email.trim();
        if !is_valid_email(email) {
            return Err(ApiError::Validation("email is not a valid address".to_string()));
        }

        let mut subscribers = self.subscribers();
        if subscribers.iter().any(|s| s.email.eq_ignore_ascii_case(email)) {
            return Ok(Acknowledgement {
                success: true,
                message: Some("Already subscribed".to_string()),
            });
        }
        subscribers.push(NewsletterSubscription {
            email: email.to_string(),
            name: subscription.name.clone(),
        });
        info!(email, "newsletter subscription added");
        Ok(Acknowledgement {
            success: true,
            message: Some("Subscribed".to_string()),
        })
    }

    async fn unsubscribe_newsletter(&self, email: &str) -> Result<Acknowledgement, ApiError> {
        let email = email.trim();
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|s| !s.email.eq_ignore_ascii_case(email));
        if subscribers.len() == before {
            return Err(ApiError::NotFound);
        }
        info!(email, "newsletter subscription removed");
        Ok(Acknowledgement {
            success: true,
            message: Some("Unsubscribed".to_string()),
        })
    }
}
