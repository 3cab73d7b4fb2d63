use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Acknowledgement, BillLimits, ComparisonRequest, ComparisonResponse, ContactMessage,
    ExchangeRate, LimitsQuery, NewsletterSubscription, Project, ProjectStats, Simulation,
    SimulationRequest, SimulationResponse, SimulationStats, SimulationSummary, TariffCategory,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Record not found")]
    NotFound,

    /// The service rejected the request body.
    #[error("{0}")]
    Validation(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Connection error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApiError {
    /// Text suitable for showing to the visitor as-is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Server { message, .. } => message.clone(),
            Self::NotFound => "The requested record does not exist".to_string(),
            Self::Transport(_) => {
                "Could not reach the simulation service, please try again".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Everything the client asks of the simulation platform.
#[async_trait]
pub trait SimulationApi: Send + Sync {
    // Projects
    async fn list_projects(&self, search: Option<&str>) -> Result<Vec<Project>, ApiError>;
    async fn get_project(&self, id: i64) -> Result<Project, ApiError>;
    async fn project_stats(&self) -> Result<ProjectStats, ApiError>;

    // Reference data
    async fn list_tariff_categories(&self) -> Result<Vec<TariffCategory>, ApiError>;
    async fn current_exchange_rate(&self) -> Result<ExchangeRate, ApiError>;

    // Simulations
    async fn calculate_limits(&self, query: &LimitsQuery) -> Result<BillLimits, ApiError>;

    async fn create_simulation(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResponse, ApiError>;

    async fn compare_simulations(
        &self,
        request: &ComparisonRequest,
    ) -> Result<ComparisonResponse, ApiError>;

    async fn get_simulation(&self, id: &str) -> Result<Simulation, ApiError>;
    async fn list_user_simulations(&self, email: &str) -> Result<Vec<SimulationSummary>, ApiError>;
    async fn simulation_stats(&self) -> Result<SimulationStats, ApiError>;

    // Contact and newsletter
    async fn send_contact_message(
        &self,
        message: &ContactMessage,
    ) -> Result<Acknowledgement, ApiError>;

    async fn subscribe_newsletter(
        &self,
        subscription: &NewsletterSubscription,
    ) -> Result<Acknowledgement, ApiError>;

    async fn unsubscribe_newsletter(&self, email: &str) -> Result<Acknowledgement, ApiError>;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn user_message_passes_service_text_through() {
        let err = ApiError::Server {
            status: 500,
            message: "Tariff category not found".to_string(),
        };
        assert_eq!(err.user_message(), "Tariff category not found");
        assert_eq!(
            ApiError::Validation("Bill must be positive".to_string()).user_message(),
            "Bill must be positive"
        );
    }

    #[test]
    fn user_message_hides_transport_details() {
        let err = ApiError::Transport("tcp connect error: refused".to_string());
        assert!(!err.user_message().contains("tcp"));
    }

    #[test]
    fn display_includes_status() {
        let err = ApiError::Server {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Server error (502): Bad Gateway");
    }
}
