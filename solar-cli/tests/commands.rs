//! Command handlers driven against the offline backend and the catalog
//! fixtures shipped with `solar-data`.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use solar_cli::app::{self, App, CompareArgs};
use solar_cli::config::{AppConfig, Overrides};
use solar_cli::models::SimulationForm;
use solar_cli::state::SessionView;
use solar_core::models::{ContactMessage, SimulationMode};

fn catalog_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../solar-data/tests/fixtures")
}

async fn offline_app(email: Option<&str>) -> App {
    let mut config = AppConfig::default();
    config.apply(Overrides {
        backend: Some("offline".to_string()),
        catalog_dir: Some(catalog_dir()),
        ..Default::default()
    });
    App::new(app::connect(&config).await.unwrap(), email)
}

fn coverage_form(bill: &str) -> SimulationForm {
    SimulationForm {
        mode: SimulationMode::BillCoverage,
        monthly_bill: bill.to_string(),
        tariff_category_id: Some(3),
        coverage: "50".to_string(),
        phone: "1155554444".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn unknown_backend_lists_the_available_ones() {
    let mut config = AppConfig::default();
    config.service.backend = "ftp".to_string();

    let err = app::connect(&config).await.err().unwrap();

    assert!(format!("{err:#}").contains(r#"available: ["http", "offline"]"#));
}

#[tokio::test]
async fn projects_search_filters_the_catalog() {
    let mut app = offline_app(None).await;

    let out = app.projects(Some("rosario")).await.unwrap();

    assert_eq!(out.lines().count(), 1);
    assert!(out.contains("Techo Comunitario Rosario"));
}

#[tokio::test]
async fn project_shows_local_price_from_exchange_rate() {
    let mut app = offline_app(None).await;

    let out = app.project(7).await.unwrap();

    assert!(out.contains("Panel price:      US$ 500 (~$ 500.000)"), "{out}");
    assert!(out.contains("Panels available: 200"));
}

#[tokio::test]
async fn limits_list_a_bound_per_mode() {
    let mut app = offline_app(None).await;

    let out = app.limits(7, dec!(85000), 3).await.unwrap();

    assert!(out.contains("Max panels:         16"), "{out}");
    assert!(out.contains("Number of panels           at most 16"), "{out}");
    assert!(out.contains("Bill coverage percentage   between 10 and 100"), "{out}");
}

#[tokio::test]
async fn simulate_records_into_session_and_history() {
    let mut app = offline_app(Some("ana@example.com")).await;

    let out = app.simulate(7, &coverage_form("85,000")).await.unwrap();

    assert!(out.contains("Panels:             8"), "{out}");
    assert!(!out.contains("Warning"));
    assert_eq!(app.state().user_simulations().len(), 1);

    let history = app.history(None).await.unwrap();
    assert!(history.starts_with("Simulations for ana@example.com:"));
    assert_eq!(history.lines().count(), 2);
}

#[tokio::test]
async fn simulate_reports_every_invalid_field() {
    let mut app = offline_app(None).await;
    let mut form = coverage_form("85000");
    form.phone = "123".to_string();

    let err = app.simulate(7, &form).await.unwrap_err().to_string();

    assert!(err.contains("user_email"), "{err}");
    assert!(err.contains("user_phone"), "{err}");
    assert!(app.state().user_simulations().is_empty());
}

#[tokio::test]
async fn panels_over_the_bill_limit_are_rejected_before_submitting() {
    let mut app = offline_app(Some("ana@example.com")).await;
    let form = SimulationForm {
        mode: SimulationMode::PanelCount,
        panels: "40".to_string(),
        ..coverage_form("85000")
    };

    let err = app.simulate(7, &form).await.unwrap_err().to_string();

    assert!(err.contains("number_of_panels"), "{err}");
    assert!(app.stats().await.unwrap().contains("Simulations:     0"));
}

#[tokio::test]
async fn compare_needs_a_scenario() {
    let mut app = offline_app(None).await;
    let args = CompareArgs {
        project_id: 7,
        monthly_bill: dec!(85000),
        tariff_category_id: 3,
        ..Default::default()
    };

    assert!(app.compare(args.clone()).await.is_err());

    let out = app
        .compare(CompareArgs {
            panels: vec![4, 8],
            ..args
        })
        .await
        .unwrap();
    assert_eq!(out.lines().count(), 4);
}

#[tokio::test]
async fn history_without_email_is_an_error() {
    let mut app = offline_app(None).await;
    assert!(app.history(None).await.is_err());
}

#[tokio::test]
async fn contact_is_validated_locally() {
    let mut app = offline_app(None).await;
    let message = ContactMessage {
        name: "Ana".to_string(),
        email: "ana@example.com".to_string(),
        phone: None,
        subject: "Hi".to_string(),
        message: "Quisiera saber más".to_string(),
    };

    let err = app.contact(message).await.unwrap_err().to_string();

    assert!(err.contains("subject"), "{err}");
}

#[tokio::test]
async fn newsletter_subscribe_then_unsubscribe() {
    let mut app = offline_app(None).await;

    assert_eq!(app.subscribe("ana@example.com", Some("Ana")).await.unwrap(), "Subscribed");
    assert_eq!(app.unsubscribe("ana@example.com").await.unwrap(), "Unsubscribed");
    assert!(app.unsubscribe("ana@example.com").await.is_err());
}
