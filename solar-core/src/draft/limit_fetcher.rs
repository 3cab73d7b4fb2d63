//! Bill-derived limits, fetched in the background as the visitor types.
//!
//! Several fetches may be in flight when the bill changes quickly. Each
//! request is stamped with a generation number and only the completion
//! carrying the latest generation is applied, so a slow answer for an old
//! bill can never overwrite the limits of the current one.
//!
//! Cached limits are only served for the inputs they were fetched for. A
//! caller whose bill, project or tariff changed since the last request sees
//! no limits until it requests again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::api::service::{ApiError, SimulationApi};
use crate::models::{BillLimits, LimitsQuery};

/// The three inputs limits depend on, any of which may still be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitsInputs {
    pub monthly_bill: Option<Decimal>,
    pub project_id: Option<i64>,
    pub tariff_category_id: Option<i64>,
}

impl LimitsInputs {
    /// The query to send, when every input is present and the bill is positive.
    pub fn query(&self) -> Option<LimitsQuery> {
        let bill = self.monthly_bill.filter(|b| *b > Decimal::ZERO)?;
        Some(LimitsQuery {
            monthly_bill_local_currency: bill,
            project_id: self.project_id?,
            tariff_category_id: self.tariff_category_id?,
        })
    }
}

/// Proof that a fetch was issued; handed back on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitsTicket {
    generation: u64,
    query: LimitsQuery,
}

impl LimitsTicket {
    pub fn query(&self) -> &LimitsQuery {
        &self.query
    }
}

/// Cached limits plus the bookkeeping that rejects superseded answers.
#[derive(Debug, Default)]
pub struct BillLimitsCache {
    generation: u64,
    latest: Option<LimitsQuery>,
    limits: Option<BillLimits>,
    loading: bool,
}

impl BillLimitsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers interest in the limits for `inputs`.
    ///
    /// Returns a ticket when a fetch must be issued. Incomplete inputs clear
    /// the cache; the query already loaded or in flight needs no new fetch.
    pub fn request(&mut self, inputs: &LimitsInputs) -> Option<LimitsTicket> {
        let Some(query) = inputs.query() else {
            if self.latest.is_some() || self.limits.is_some() {
                debug!("limits inputs incomplete, clearing cached limits");
            }
            self.generation += 1;
            self.latest = None;
            self.limits = None;
            self.loading = false;
            return None;
        };

        if self.latest == Some(query) && (self.loading || self.limits.is_some()) {
            return None;
        }

        self.generation += 1;
        self.latest = Some(query);
        self.limits = None;
        self.loading = true;
        debug!(generation = self.generation, ?query, "requesting bill limits");

        Some(LimitsTicket {
            generation: self.generation,
            query,
        })
    }

    /// Applies the outcome of the fetch behind `ticket`. Returns `false`
    /// when a newer request superseded it and the outcome was dropped.
    pub fn complete(
        &mut self,
        ticket: LimitsTicket,
        outcome: Result<BillLimits, ApiError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                generation = ticket.generation,
                latest = self.generation,
                "discarding superseded limits response"
            );
            return false;
        }

        self.loading = false;
        match outcome {
            Ok(limits) => {
                debug!(max_panels = limits.max_panels_allowed, "bill limits updated");
                self.limits = Some(limits);
            }
            Err(err) => {
                warn!(error = %err, query = ?ticket.query, "could not fetch bill limits");
                self.limits = None;
            }
        }
        true
    }

    /// The limits for `inputs`, if they are the ones last fetched.
    pub fn limits(&self, inputs: &LimitsInputs) -> Option<&BillLimits> {
        match inputs.query() {
            Some(query) if self.latest == Some(query) => self.limits.as_ref(),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

/// Issues limit fetches against a [`SimulationApi`] and keeps the shared
/// cache current. Cloning shares the cache.
#[derive(Clone)]
pub struct LimitsFetcher {
    api: Arc<dyn SimulationApi>,
    cache: Arc<Mutex<BillLimitsCache>>,
}

impl LimitsFetcher {
    pub fn new(api: Arc<dyn SimulationApi>) -> Self {
        Self {
            api,
            cache: Arc::new(Mutex::new(BillLimitsCache::new())),
        }
    }

    /// Fetches limits for `inputs` unless they are incomplete or already
    /// current. Failures are logged and leave the cache empty.
    pub async fn refresh(&self, inputs: &LimitsInputs) {
        let Some(ticket) = self.lock().request(inputs) else {
            return;
        };

        let outcome = self.api.calculate_limits(ticket.query()).await;
        self.lock().complete(ticket, outcome);
    }

    pub fn limits(&self, inputs: &LimitsInputs) -> Option<BillLimits> {
        self.lock().limits(inputs).cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading()
    }

    fn lock(&self) -> MutexGuard<'_, BillLimitsCache> {
        // The cache holds plain data, so a poisoned lock is still usable.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tokio::sync::oneshot;

    use super::*;
    use crate::models::{
        Acknowledgement, ComparisonRequest, ComparisonResponse, ContactMessage, ExchangeRate,
        NewsletterSubscription, Project, ProjectStats, Simulation, SimulationRequest,
        SimulationResponse, SimulationStats, SimulationSummary, TariffCategory,
    };

    fn inputs(bill: Decimal) -> LimitsInputs {
        LimitsInputs {
            monthly_bill: Some(bill),
            project_id: Some(7),
            tariff_category_id: Some(3),
        }
    }

    fn limits(max_panels: u32) -> BillLimits {
        BillLimits {
            max_investment_usd: Decimal::from(max_panels) * dec!(500),
            max_investment_local_currency: Decimal::from(max_panels) * dec!(500000),
            max_panels_allowed: max_panels,
            max_payback_years: dec!(7.84),
            savings_per_panel_local_currency: dec!(5312.50),
        }
    }

    // =========================================================================
    // LimitsInputs
    // =========================================================================

    #[test]
    fn query_requires_positive_bill_and_both_ids() {
        assert!(inputs(dec!(50000)).query().is_some());
        assert_eq!(inputs(dec!(0)).query(), None);
        assert_eq!(inputs(dec!(-5)).query(), None);
        assert_eq!(
            LimitsInputs {
                tariff_category_id: None,
                ..inputs(dec!(50000))
            }
            .query(),
            None
        );
        assert_eq!(LimitsInputs::default().query(), None);
    }

    // =========================================================================
    // BillLimitsCache
    // =========================================================================

    #[test]
    fn incomplete_inputs_issue_nothing_and_clear_limits() {
        let mut cache = BillLimitsCache::new();
        let ticket = cache.request(&inputs(dec!(50000))).unwrap();
        cache.complete(ticket, Ok(limits(16)));
        assert!(cache.limits(&inputs(dec!(50000))).is_some());

        assert_eq!(cache.request(&inputs(dec!(0))), None);
        assert_eq!(cache.limits(&inputs(dec!(50000))), None);
        assert!(!cache.is_loading());
    }

    #[test]
    fn new_query_clears_stale_limits_immediately() {
        let mut cache = BillLimitsCache::new();
        let first = cache.request(&inputs(dec!(50000))).unwrap();
        cache.complete(first, Ok(limits(16)));

        let second = cache.request(&inputs(dec!(60000)));

        assert!(second.is_some());
        assert_eq!(cache.limits(&inputs(dec!(60000))), None);
        assert!(cache.is_loading());
    }

    #[test]
    fn identical_query_is_not_refetched() {
        let mut cache = BillLimitsCache::new();
        let ticket = cache.request(&inputs(dec!(50000))).unwrap();

        // in flight
        assert_eq!(cache.request(&inputs(dec!(50000))), None);

        cache.complete(ticket, Ok(limits(16)));

        // loaded
        assert_eq!(cache.request(&inputs(dec!(50000))), None);
        assert_eq!(cache.limits(&inputs(dec!(50000))), Some(&limits(16)));
    }

    #[test]
    fn limits_are_only_served_for_the_inputs_they_were_fetched_for() {
        let mut cache = BillLimitsCache::new();
        let ticket = cache.request(&inputs(dec!(50000))).unwrap();
        cache.complete(ticket, Ok(limits(16)));

        assert_eq!(cache.limits(&inputs(dec!(500000))), None);
        assert_eq!(
            cache.limits(&LimitsInputs {
                project_id: Some(8),
                ..inputs(dec!(50000))
            }),
            None
        );
        assert_eq!(
            cache.limits(&LimitsInputs {
                tariff_category_id: Some(4),
                ..inputs(dec!(50000))
            }),
            None
        );
        assert_eq!(cache.limits(&LimitsInputs::default()), None);
        assert_eq!(cache.limits(&inputs(dec!(50000))), Some(&limits(16)));
    }

    #[test]
    fn failed_query_can_be_retried_by_requesting_again() {
        let mut cache = BillLimitsCache::new();
        let ticket = cache.request(&inputs(dec!(50000))).unwrap();
        cache.complete(ticket, Err(ApiError::Transport("down".to_string())));

        assert!(cache.request(&inputs(dec!(50000))).is_some());
    }

    #[test]
    fn superseded_completion_is_discarded() {
        let mut cache = BillLimitsCache::new();
        let old = cache.request(&inputs(dec!(50000))).unwrap();
        let new = cache.request(&inputs(dec!(60000))).unwrap();

        assert!(cache.complete(new, Ok(limits(20))));
        assert!(!cache.complete(old, Ok(limits(16))));
        assert_eq!(cache.limits(&inputs(dec!(60000))), Some(&limits(20)));
        assert_eq!(cache.limits(&inputs(dec!(50000))), None);
    }

    #[test]
    fn completion_after_inputs_were_cleared_is_discarded() {
        let mut cache = BillLimitsCache::new();
        let ticket = cache.request(&inputs(dec!(50000))).unwrap();
        cache.request(&LimitsInputs::default());

        assert!(!cache.complete(ticket, Ok(limits(16))));
        assert_eq!(cache.limits(&inputs(dec!(50000))), None);
    }

    #[test]
    fn failure_clears_limits_and_loading() {
        let mut cache = BillLimitsCache::new();
        let ticket = cache.request(&inputs(dec!(50000))).unwrap();

        assert!(cache.complete(ticket, Err(ApiError::NotFound)));
        assert_eq!(cache.limits(&inputs(dec!(50000))), None);
        assert!(!cache.is_loading());
    }

    // =========================================================================
    // LimitsFetcher
    // =========================================================================

    /// Answers each limits call only once the test releases the gate
    /// registered for that bill amount.
    struct GatedApi {
        gates: Mutex<HashMap<Decimal, oneshot::Receiver<BillLimits>>>,
        calls: AtomicUsize,
    }

    impl GatedApi {
        fn new() -> Self {
            Self {
                gates: Mutex::new(HashMap::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn gate(&self, bill: Decimal) -> oneshot::Sender<BillLimits> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(bill, rx);
            tx
        }
    }

    #[async_trait]
    impl SimulationApi for GatedApi {
        async fn calculate_limits(&self, query: &LimitsQuery) -> Result<BillLimits, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rx = self
                .gates
                .lock()
                .unwrap()
                .remove(&query.monthly_bill_local_currency);
            match rx {
                Some(rx) => rx.await.map_err(|_| ApiError::Transport("gate dropped".into())),
                None => Err(ApiError::NotFound),
            }
        }

        async fn list_projects(&self, _search: Option<&str>) -> Result<Vec<Project>, ApiError> {
            unimplemented!()
        }
        async fn get_project(&self, _id: i64) -> Result<Project, ApiError> {
            unimplemented!()
        }
        async fn project_stats(&self) -> Result<ProjectStats, ApiError> {
            unimplemented!()
        }
        async fn list_tariff_categories(&self) -> Result<Vec<TariffCategory>, ApiError> {
            unimplemented!()
        }
        async fn current_exchange_rate(&self) -> Result<ExchangeRate, ApiError> {
            unimplemented!()
        }
        async fn create_simulation(
            &self,
            _request: &SimulationRequest,
        ) -> Result<SimulationResponse, ApiError> {
            unimplemented!()
        }
        async fn compare_simulations(
            &self,
            _request: &ComparisonRequest,
        ) -> Result<ComparisonResponse, ApiError> {
            unimplemented!()
        }
        async fn get_simulation(&self, _id: &str) -> Result<Simulation, ApiError> {
            unimplemented!()
        }
        async fn list_user_simulations(&self, _email: &str) -> Result<Vec<SimulationSummary>, ApiError> {
            unimplemented!()
        }
        async fn simulation_stats(&self) -> Result<SimulationStats, ApiError> {
            unimplemented!()
        }
        async fn send_contact_message(
            &self,
            _message: &ContactMessage,
        ) -> Result<Acknowledgement, ApiError> {
            unimplemented!()
        }
        async fn subscribe_newsletter(
            &self,
            _subscription: &NewsletterSubscription,
        ) -> Result<Acknowledgement, ApiError> {
            unimplemented!()
        }
        async fn unsubscribe_newsletter(&self, _email: &str) -> Result<Acknowledgement, ApiError> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn late_response_for_older_bill_does_not_win() {
        let api = Arc::new(GatedApi::new());
        let gate_t1 = api.gate(dec!(50000));
        let gate_t2 = api.gate(dec!(60000));
        let fetcher = LimitsFetcher::new(api.clone());

        let inputs_t1 = inputs(dec!(50000));
        let inputs_t2 = inputs(dec!(60000));

        let release = async {
            // Let both fetches reach the gates, then answer T2 before T1.
            tokio::task::yield_now().await;
            gate_t2.send(limits(20)).unwrap();
            tokio::task::yield_now().await;
            gate_t1.send(limits(16)).unwrap();
        };

        tokio::join!(
            fetcher.refresh(&inputs_t1),
            fetcher.refresh(&inputs_t2),
            release
        );

        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fetcher.limits(&inputs_t2), Some(limits(20)));
        assert!(!fetcher.is_loading());
    }

    #[tokio::test]
    async fn zero_bill_issues_no_fetch() {
        let api = Arc::new(GatedApi::new());
        let fetcher = LimitsFetcher::new(api.clone());

        fetcher.refresh(&inputs(dec!(0))).await;
        fetcher
            .refresh(&LimitsInputs {
                tariff_category_id: None,
                ..inputs(dec!(50000))
            })
            .await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.limits(&inputs(dec!(0))), None);
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_no_limits() {
        // no gate registered, so the stub answers NotFound
        let api = Arc::new(GatedApi::new());
        let fetcher = LimitsFetcher::new(api.clone());

        fetcher.refresh(&inputs(dec!(50000))).await;

        assert_eq!(fetcher.limits(&inputs(dec!(50000))), None);
        assert!(!fetcher.is_loading());
    }
}
