//! CSV catalogs for the offline backend.
//!
//! A catalog directory holds up to three files. Column order does **not**
//! matter (headers are matched by name), whitespace around values is
//! trimmed, and every row must have the same number of columns as the
//! header.
//!
//! ### `projects.csv` (required)
//!
//! | Column                     | Required | Type    | Notes |
//! |----------------------------|----------|---------|-------|
//! | `id`                       | yes      | integer | unique |
//! | `name`                     | yes      | string  | |
//! | `location`                 | yes      | string  | |
//! | `description`              | no       | string  | |
//! | `status`                   | no       | string  | `funding`, `construction`, `operational` |
//! | `total_power_installed_kw` | yes      | decimal | |
//! | `available_power_kw`       | yes      | decimal | not above the installed power |
//! | `panel_power_wp`           | yes      | decimal | > 0 |
//! | `price_per_wp_usd`         | yes      | decimal | |
//! | `price_per_panel_usd`      | no       | decimal | empty cell for none |
//!
//! ### `tariff_categories.csv` (required)
//!
//! | Column                 | Required | Type    | Notes |
//! |------------------------|----------|---------|-------|
//! | `id`                   | yes      | integer | unique |
//! | `name`                 | yes      | string  | |
//! | `code`                 | yes      | string  | |
//! | `description`          | no       | string  | |
//! | `energy_charge_peak`   | yes      | decimal | per kWh |
//! | `energy_charge_valley` | yes      | decimal | per kWh |
//! | `fixed_charge_monthly` | yes      | decimal | |
//! | `peak_percentage`      | no       | decimal | defaults to 30 |
//!
//! ### `exchange_rates.csv` (optional)
//!
//! | Column   | Required | Type    | Notes |
//! |----------|----------|---------|-------|
//! | `date`   | yes      | date    | `YYYY-MM-DD`; the latest row wins |
//! | `rate`   | yes      | decimal | local currency per USD, > 0 |
//! | `source` | no       | string  | |
//!
//! Without an exchange-rate file the catalog uses
//! [`DEFAULT_EXCHANGE_RATE`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use solar_core::calculations::DEFAULT_EXCHANGE_RATE;
use solar_core::models::{ExchangeRate, Project, ProjectStatus, TariffCategory};
use tracing::{debug, info};

pub const PROJECTS_FILE: &str = "projects.csv";
pub const TARIFF_CATEGORIES_FILE: &str = "tariff_categories.csv";
pub const EXCHANGE_RATES_FILE: &str = "exchange_rates.csv";

// ---------------------------------------------------------------------------
// Rows as they appear in the files
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ProjectRow {
    id: i64,
    name: String,
    location: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: String,
    total_power_installed_kw: Decimal,
    available_power_kw: Decimal,
    panel_power_wp: Decimal,
    price_per_wp_usd: Decimal,
    price_per_panel_usd: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct TariffRow {
    id: i64,
    name: String,
    code: String,
    #[serde(default)]
    description: String,
    energy_charge_peak: Decimal,
    energy_charge_valley: Decimal,
    fixed_charge_monthly: Decimal,
    peak_percentage: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct ExchangeRateRow {
    date: NaiveDate,
    rate: Decimal,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    /// Bad structure, missing required column, or a cell of the wrong type.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `row` is 1-based (header = row 0).
    #[error("duplicate {kind} id {id} on row {row}")]
    DuplicateId {
        kind: &'static str,
        id: i64,
        row: usize,
    },

    #[error("invalid value on row {row}: {message}")]
    InvalidRow { row: usize, message: String },
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Reference data served by the offline backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub projects: Vec<Project>,
    pub tariff_categories: Vec<TariffCategory>,
    pub exchange_rate: ExchangeRate,
}

impl Catalog {
    /// Loads every catalog file found in `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogLoadError> {
        let projects = load_projects_from_str(&read(&dir.join(PROJECTS_FILE))?)?;
        let tariff_categories =
            load_tariff_categories_from_str(&read(&dir.join(TARIFF_CATEGORIES_FILE))?)?;

        let rates_path = dir.join(EXCHANGE_RATES_FILE);
        let exchange_rate = if rates_path.exists() {
            load_exchange_rate_from_str(&read(&rates_path)?)?
        } else {
            debug!(path = %rates_path.display(), "no exchange rate file, using default");
            None
        }
        .unwrap_or_else(default_exchange_rate);

        info!(
            dir = %dir.display(),
            projects = projects.len(),
            tariff_categories = tariff_categories.len(),
            exchange_rate = %exchange_rate.current_rate,
            "catalog loaded"
        );

        Ok(Self {
            projects,
            tariff_categories,
            exchange_rate,
        })
    }

    pub fn project(&self, id: i64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn tariff_category(&self, id: i64) -> Option<&TariffCategory> {
        self.tariff_categories.iter().find(|t| t.id == id)
    }
}

fn read(path: &Path) -> Result<String, CatalogLoadError> {
    std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn reader(input: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes())
}

fn default_exchange_rate() -> ExchangeRate {
    ExchangeRate {
        current_rate: DEFAULT_EXCHANGE_RATE,
        currency_pair: "USD/ARS".to_string(),
    }
}

/// Parses `projects.csv` contents. Rows are returned in file order.
pub fn load_projects_from_str(input: &str) -> Result<Vec<Project>, CatalogLoadError> {
    let mut seen = HashSet::new();
    reader(input)
        .deserialize::<ProjectRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            let row_number = idx + 1;
            if !seen.insert(row.id) {
                return Err(CatalogLoadError::DuplicateId {
                    kind: "project",
                    id: row.id,
                    row: row_number,
                });
            }
            convert_project(row, row_number)
        })
        .collect()
}

fn convert_project(
    row: ProjectRow,
    row_number: usize,
) -> Result<Project, CatalogLoadError> {
    let invalid = |message: &str| CatalogLoadError::InvalidRow {
        row: row_number,
        message: message.to_string(),
    };
    if row.panel_power_wp <= Decimal::ZERO {
        return Err(invalid("panel_power_wp must be positive"));
    }
    if row.available_power_kw < Decimal::ZERO
        || row.available_power_kw > row.total_power_installed_kw
    {
        return Err(invalid(
            "available_power_kw must be between 0 and total_power_installed_kw",
        ));
    }

    let status = if row.status.is_empty() {
        ProjectStatus::default()
    } else {
        ProjectStatus::parse(&row.status)
    };

    Ok(Project {
        id: row.id,
        name: row.name,
        location: row.location,
        description: row.description,
        status,
        total_power_installed_kw: row.total_power_installed_kw,
        available_power_kw: row.available_power_kw,
        panel_power_wp: row.panel_power_wp,
        price_per_wp_usd: row.price_per_wp_usd,
        price_per_panel_usd: row.price_per_panel_usd,
    })
}

/// Parses `tariff_categories.csv` contents. Rows are returned in file order.
pub fn load_tariff_categories_from_str(
    input: &str
) -> Result<Vec<TariffCategory>, CatalogLoadError> {
    let mut seen = HashSet::new();
    reader(input)
        .deserialize::<TariffRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            let row_number = idx + 1;
            if !seen.insert(row.id) {
                return Err(CatalogLoadError::DuplicateId {
                    kind: "tariff category",
                    id: row.id,
                    row: row_number,
                });
            }
            let peak_percentage = row.peak_percentage.unwrap_or(Decimal::from(30));
            if peak_percentage < Decimal::ZERO || peak_percentage > Decimal::ONE_HUNDRED {
                return Err(CatalogLoadError::InvalidRow {
                    row: row_number,
                    message: "peak_percentage must be between 0 and 100".to_string(),
                });
            }
            Ok(TariffCategory {
                id: row.id,
                name: row.name,
                code: row.code,
                description: row.description,
                energy_charge_peak: row.energy_charge_peak,
                energy_charge_valley: row.energy_charge_valley,
                fixed_charge_monthly: row.fixed_charge_monthly,
                peak_percentage,
            })
        })
        .collect()
}

/// The most recent rate in `exchange_rates.csv` contents, or `None` for a
/// file with no rows.
pub fn load_exchange_rate_from_str(input: &str) -> Result<Option<ExchangeRate>, CatalogLoadError> {
    let mut latest: Option<ExchangeRateRow> = None;
    for (idx, result) in reader(input).deserialize::<ExchangeRateRow>().enumerate() {
        let row = result?;
        if row.rate <= Decimal::ZERO {
            return Err(CatalogLoadError::InvalidRow {
                row: idx + 1,
                message: "rate must be positive".to_string(),
            });
        }
        if latest.as_ref().is_none_or(|l| row.date >= l.date) {
            latest = Some(row);
        }
    }

    Ok(latest.map(|row| ExchangeRate {
        current_rate: row.rate,
        currency_pair: "USD/ARS".to_string(),
    }))
}
