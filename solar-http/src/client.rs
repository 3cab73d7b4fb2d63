use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use solar_core::models::{
    Acknowledgement, BillLimits, ComparisonRequest, ComparisonResponse, ContactMessage,
    ExchangeRate, LimitsQuery, NewsletterSubscription, Project, ProjectStats, Simulation,
    SimulationRequest, SimulationResponse, SimulationStats, SimulationSummary, TariffCategory,
};
use solar_core::{ApiError, SimulationApi};

use crate::error::error_for_status;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// List endpoints answer either a bare array or a paginated page.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Page { results: Vec<T> },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Page { results } => results,
            Self::Plain(items) => items,
        }
    }
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

/// [`SimulationApi`] backed by the platform's JSON REST service.
#[derive(Clone)]
pub struct HttpSimulationApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSimulationApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::Configuration(format!(
                "endpoint '{base_url}' must be an http(s) URL"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("solar-simulator/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;

        Ok(Self {
            base_url: base_url.to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `path` must start with `/`; the service expects trailing slashes.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        debug!(path, ?query, "GET");
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        decode(path, response).await
    }

    async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        decode(path, response).await
    }
}

fn transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Transport("request timed out".to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

async fn decode<T: DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    debug!(path, status = status.as_u16(), bytes = body.len(), "response");

    if !status.is_success() {
        return Err(error_for_status(status, &body));
    }
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{path}: {e}")))
}

#[async_trait]
impl SimulationApi for HttpSimulationApi {
    async fn list_projects(&self, search: Option<&str>) -> Result<Vec<Project>, ApiError> {
        let query: Vec<(&str, &str)> = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| vec![("search", s)])
            .unwrap_or_default();
        let listing: Listing<Project> = self.get("/projects/", &query).await?;
        Ok(listing.into_vec())
    }

    async fn get_project(&self, id: i64) -> Result<Project, ApiError> {
        self.get(&format!("/projects/{id}/"), &[]).await
    }

    async fn project_stats(&self) -> Result<ProjectStats, ApiError> {
        self.get("/projects/stats/", &[]).await
    }

    async fn list_tariff_categories(&self) -> Result<Vec<TariffCategory>, ApiError> {
        let listing: Listing<TariffCategory> = self.get("/tariff-categories/", &[]).await?;
        Ok(listing.into_vec())
    }

    async fn current_exchange_rate(&self) -> Result<ExchangeRate, ApiError> {
        self.get("/exchange-rate/current/", &[]).await
    }

    async fn calculate_limits(&self, query: &LimitsQuery) -> Result<BillLimits, ApiError> {
        self.post("/simulations/limits/", query).await
    }

    async fn create_simulation(
        &self,
        request: &SimulationRequest,
    ) -> Result<SimulationResponse, ApiError> {
        self.post("/simulations/create/", request).await
    }

    async fn compare_simulations(
        &self,
        request: &ComparisonRequest,
    ) -> Result<ComparisonResponse, ApiError> {
        self.post("/simulations/compare/", request).await
    }

    async fn get_simulation(&self, id: &str) -> Result<Simulation, ApiError> {
        self.get(&format!("/simulations/{id}/"), &[]).await
    }

    async fn list_user_simulations(
        &self,
        email: &str,
    ) -> Result<Vec<SimulationSummary>, ApiError> {
        let listing: Listing<SimulationSummary> =
            self.get("/simulations/user/", &[("email", email)]).await?;
        Ok(listing.into_vec())
    }

    async fn simulation_stats(&self) -> Result<SimulationStats, ApiError> {
        self.get("/simulations/stats/", &[]).await
    }

    async fn send_contact_message(
        &self,
        message: &ContactMessage,
    ) -> Result<Acknowledgement, ApiError> {
        self.post("/contact/", message).await
    }

    async fn subscribe_newsletter(
        &self,
        subscription: &NewsletterSubscription,
    ) -> Result<Acknowledgement, ApiError> {
        self.post("/newsletter/subscribe/", subscription).await
    }

    async fn unsubscribe_newsletter(&self, email: &str) -> Result<Acknowledgement, ApiError> {
        self.post("/newsletter/unsubscribe/", &EmailBody { email }).await
    }
}
