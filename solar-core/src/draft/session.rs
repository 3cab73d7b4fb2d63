use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::api::service::{ApiError, SimulationApi};
use crate::draft::{
    EffectiveLimit, LimitsFetcher, LimitsInputs, SimulationDraft, build_payload,
    resolve_effective_limit, validate_draft,
};
use crate::models::{BillLimits, Project, SimulationMode, SimulationResponse};
use crate::validation::ValidationErrors;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("no project selected")]
    NoProject,

    #[error("invalid simulation: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// One visitor simulating against one project.
pub struct SimulationSession {
    api: Arc<dyn SimulationApi>,
    project: Option<Project>,
    draft: SimulationDraft,
    limits: LimitsFetcher,
}

impl SimulationSession {
    pub fn new(api: Arc<dyn SimulationApi>, session_email: Option<&str>) -> Self {
        Self {
            limits: LimitsFetcher::new(api.clone()),
            api,
            project: None,
            draft: SimulationDraft::new(session_email),
        }
    }

    /// Fetches project `id` and makes it the simulation target.
    pub async fn load_project(&mut self, id: i64) -> Result<&Project, ApiError> {
        let project = self.api.get_project(id).await?;
        Ok(self.set_project(project))
    }

    pub fn set_project(&mut self, project: Project) -> &Project {
        debug!(project_id = project.id, name = %project.name, "project selected");
        self.project.insert(project)
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn draft(&self) -> &SimulationDraft {
        &self.draft
    }

    /// Direct access for input fields. The mode itself only changes through
    /// [`SimulationSession::set_mode`].
    pub fn draft_mut(&mut self) -> &mut SimulationDraft {
        &mut self.draft
    }

    pub fn set_mode(&mut self, mode: SimulationMode) {
        self.draft.set_mode(mode);
    }

    pub fn limits_inputs(&self) -> LimitsInputs {
        LimitsInputs {
            monthly_bill: self.draft.monthly_bill_local_currency,
            project_id: self.project.as_ref().map(|p| p.id),
            tariff_category_id: self.draft.tariff_category_id,
        }
    }

    /// Brings the bill-derived limits in line with the current draft.
    pub async fn refresh_limits(&self) {
        self.limits.refresh(&self.limits_inputs()).await;
    }

    /// Limits for the current bill, project and tariff. Limits fetched for
    /// any other combination are treated as absent.
    pub fn limits(&self) -> Option<BillLimits> {
        self.limits.limits(&self.limits_inputs())
    }

    pub fn limits_loading(&self) -> bool {
        self.limits.is_loading()
    }

    /// Handle for refreshing limits from another task.
    pub fn limits_fetcher(&self) -> LimitsFetcher {
        self.limits.clone()
    }

    pub fn effective_limit(&self) -> EffectiveLimit {
        let capacity = self.project.as_ref().map(Project::capacity);
        resolve_effective_limit(
            capacity.as_ref(),
            self.limits().as_ref(),
            self.draft.mode(),
        )
    }

    /// Validates the draft, sends it, and starts a fresh draft on success.
    /// On any failure the draft is left exactly as it was.
    pub async fn submit(&mut self) -> Result<SimulationResponse, SubmitError> {
        let project_id = self.project.as_ref().ok_or(SubmitError::NoProject)?.id;

        validate_draft(&self.draft, &self.effective_limit())?;
        let request = build_payload(project_id, &self.draft)?;

        let response = self.api.create_simulation(&request).await?;
        info!(
            simulation_id = %response.simulation.id,
            project_id,
            has_capacity = response.capacity_check.has_capacity,
            "simulation created"
        );

        self.draft.reset();
        self.limits.refresh(&self.limits_inputs()).await;
        Ok(response)
    }
}
