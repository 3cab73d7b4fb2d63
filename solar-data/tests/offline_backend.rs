//! The offline backend end to end: catalog fixtures loaded through the
//! registry, then driven by a simulation session.

use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use solar_core::models::{ProjectStatus, SimulationMode};
use solar_core::{EffectiveLimit, ServiceConfig, ServiceRegistry, SimulationApi, SimulationSession};
use solar_data::{Catalog, OfflineServiceFactory};

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

async fn api() -> Arc<dyn SimulationApi> {
    let mut registry = ServiceRegistry::new();
    registry.register(Box::new(OfflineServiceFactory));
    let config = ServiceConfig {
        backend: "offline".to_string(),
        endpoint: fixtures().display().to_string(),
        timeout_secs: 30,
    };
    Arc::from(registry.create(&config).await.unwrap())
}

#[test]
fn fixture_catalog_loads() {
    let catalog = Catalog::load_dir(&fixtures()).unwrap();

    assert_eq!(catalog.projects.len(), 3);
    assert_eq!(catalog.projects[2].status, ProjectStatus::Construction);
    assert_eq!(catalog.tariff_categories[1].peak_percentage, dec!(40));
    assert_eq!(catalog.exchange_rate.current_rate, dec!(1000.00));
}

#[tokio::test]
async fn project_stats_sum_the_catalog() {
    let stats = api().await.project_stats().await.unwrap();

    assert_eq!(stats.total_projects, 3);
    assert_eq!(stats.operational_projects, 1);
    assert_eq!(stats.funding_projects, 1);
    assert_eq!(stats.total_power_available_kw, dec!(1010.3));
}

#[tokio::test]
async fn session_submits_against_offline_backend() {
    let api = api().await;
    let mut session = SimulationSession::new(Arc::clone(&api), Some("ana@example.com"));
    session.load_project(7).await.unwrap();

    {
        let draft = session.draft_mut();
        draft.monthly_bill_local_currency = Some(dec!(85000));
        draft.tariff_category_id = Some(3);
        draft.contact_phone = "1155554444".to_string();
    }
    session.refresh_limits().await;

    // 85000 / 100 = 850 kWh, which full coverage meets with 16 panels,
    // well under the 200 the project still has room for
    assert_eq!(session.limits().unwrap().max_panels_allowed, 16);
    session.set_mode(SimulationMode::PanelCount);
    assert_eq!(session.effective_limit(), EffectiveLimit::AtMost(dec!(16)));
    session.set_mode(SimulationMode::BillCoverage);

    let response = session.submit().await.unwrap();

    assert_eq!(response.simulation.simulation_type, SimulationMode::BillCoverage);
    assert_eq!(response.simulation.number_of_panels, 8);
    assert_eq!(response.simulation.total_investment_usd, dec!(4000.00));

    let history = api.list_user_simulations("ana@example.com").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, response.simulation.id);
}

#[tokio::test]
async fn bill_below_fixed_charge_has_no_limits() {
    let api = api().await;
    let err = api
        .calculate_limits(&solar_core::models::LimitsQuery {
            monthly_bill_local_currency: dec!(2000),
            project_id: 7,
            tariff_category_id: 4,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, solar_core::ApiError::Validation(_)));
}
