use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::debug;

use solar_cli::app::{self, App, CompareArgs};
use solar_cli::config::{AppConfig, Overrides};
use solar_cli::logging;
use solar_cli::models::SimulationForm;
use solar_cli::utils::parse_decimal;
use solar_core::models::{ContactMessage, SimulationMode};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Community solar investment simulator.
///
/// Browses projects and tariffs, computes how far a monthly bill lets a
/// visitor invest, and runs simulations against the platform's service or
/// an offline CSV catalog.
#[derive(Debug, Parser)]
#[command(name = "solar", version, about)]
struct Cli {
    /// Settings file. Missing is fine unless given explicitly.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend to use: `http` or `offline`.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Base URL of the simulation service.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Directory holding the offline CSV catalog.
    #[arg(long, global = true)]
    catalog_dir: Option<PathBuf>,

    /// Log level or `EnvFilter` directive (e.g. `debug`, `info,solar_http=trace`).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Keep logs off the terminal.
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Visitor e-mail for simulations and history.
    #[arg(long, global = true)]
    email: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Coverage,
    Panels,
    Investment,
}

impl From<ModeArg> for SimulationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Coverage => SimulationMode::BillCoverage,
            ModeArg::Panels => SimulationMode::PanelCount,
            ModeArg::Investment => SimulationMode::InvestmentAmount,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List projects, optionally filtered by name, description or location.
    Projects {
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one project.
    Project { id: i64 },
    /// List tariff categories.
    Tariffs,
    /// Investment limits for a monthly bill.
    Limits {
        #[arg(long)]
        project: i64,
        #[arg(long, value_parser = parse_decimal)]
        bill: Decimal,
        #[arg(long)]
        tariff: i64,
    },
    /// Run and store a simulation.
    Simulate {
        #[arg(long)]
        project: i64,
        #[arg(long, value_enum, default_value = "coverage")]
        mode: ModeArg,
        #[arg(long, default_value = "")]
        bill: String,
        #[arg(long)]
        tariff: Option<i64>,
        /// Bill coverage percentage (coverage mode).
        #[arg(long, default_value = "")]
        coverage: String,
        /// Number of panels (panels mode).
        #[arg(long, default_value = "")]
        panels: String,
        /// Investment in USD (investment mode).
        #[arg(long, default_value = "")]
        investment: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Compare several scenarios for one bill.
    Compare {
        #[arg(long)]
        project: i64,
        #[arg(long, value_parser = parse_decimal)]
        bill: Decimal,
        #[arg(long)]
        tariff: i64,
        #[arg(long = "coverage", value_parser = parse_decimal)]
        coverages: Vec<Decimal>,
        #[arg(long = "panels")]
        panels: Vec<u32>,
        #[arg(long = "investment", value_parser = parse_decimal)]
        investments: Vec<Decimal>,
    },
    /// Simulations stored for the session e-mail.
    History,
    /// Send a message to the platform team.
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },
    /// Subscribe the session e-mail to the newsletter.
    Subscribe {
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove the session e-mail from the newsletter.
    Unsubscribe,
    /// Platform-wide project and simulation figures.
    Stats,
}

const DEFAULT_CONFIG_FILE: &str = "solar.toml";

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let (path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let mut config = AppConfig::load(&path, required)?;
    config.apply(Overrides {
        backend: cli.backend.clone(),
        endpoint: cli.endpoint.clone(),
        catalog_dir: cli.catalog_dir.clone(),
        log_level: cli.log_level.clone(),
        log_file: cli.log_file.clone(),
        quiet: cli.quiet,
        email: cli.email.clone(),
    });
    Ok(config)
}

fn apply_logging(config: &AppConfig) -> Result<()> {
    if let Some(level) = &config.logging.level {
        logging::set_log_level(level)?;
    }
    logging::set_terminal_enabled(config.logging.terminal)?;
    if let Some(file) = &config.logging.file {
        logging::enable_file_logging(file)?;
    }
    Ok(())
}

fn session_email(config: &AppConfig) -> Result<&str> {
    config
        .session
        .email
        .as_deref()
        .context("no e-mail given; pass --email or set [session] email")
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    apply_logging(&config)?;
    debug!(?config, "configuration loaded");

    let api = app::connect(&config).await?;
    let mut app = App::new(api, config.session.email.as_deref());

    let output = match cli.command {
        Command::Projects { search } => app.projects(search.as_deref()).await?,
        Command::Project { id } => app.project(id).await?,
        Command::Tariffs => app.tariffs().await?,
        Command::Limits {
            project,
            bill,
            tariff,
        } => app.limits(project, bill, tariff).await?,
        Command::Simulate {
            project,
            mode,
            bill,
            tariff,
            coverage,
            panels,
            investment,
            phone,
        } => {
            let form = SimulationForm {
                mode: mode.into(),
                monthly_bill: bill,
                tariff_category_id: tariff,
                coverage,
                panels,
                investment,
                email: String::new(),
                phone,
            };
            app.simulate(project, &form).await?
        }
        Command::Compare {
            project,
            bill,
            tariff,
            coverages,
            panels,
            investments,
        } => {
            app.compare(CompareArgs {
                project_id: project,
                monthly_bill: bill,
                tariff_category_id: tariff,
                coverages,
                panels,
                investments,
            })
            .await?
        }
        Command::History => app.history(None).await?,
        Command::Contact {
            name,
            phone,
            subject,
            message,
        } => {
            let message = ContactMessage {
                name,
                email: session_email(&config)?.to_string(),
                phone,
                subject,
                message,
            };
            app.contact(message).await?
        }
        Command::Subscribe { name } => {
            app.subscribe(session_email(&config)?, name.as_deref())
                .await?
        }
        Command::Unsubscribe => app.unsubscribe(session_email(&config)?).await?,
        Command::Stats => app.stats().await?,
    };

    print!("{output}");
    Ok(())
}
