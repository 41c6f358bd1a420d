use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

mod assignments;
mod attendance;
mod auth;
mod config;
mod error;
mod forest;
mod loader;
mod models;
mod predictor;
mod report;

use auth::{CredentialVerifier, StaticCredentials};
use config::{Overrides, Settings};
use predictor::RiskPredictor;

#[derive(Parser)]
#[command(name = "smart-lms-assistant")]
#[command(
    about = "Attendance, assignment and pass/fail risk alerts for a single student",
    long_about = None
)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(flatten)]
    overrides: OverrideArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OverrideArgs {
    /// Required attendance fraction, e.g. 0.75
    #[arg(long, global = true)]
    threshold: Option<f64>,
    /// Days ahead that count as upcoming
    #[arg(long, global = true)]
    window_days: Option<i64>,
    /// Reference date (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
    /// Risk model artifact
    #[arg(long, global = true)]
    model: Option<PathBuf>,
    /// Directory holding the three CSV tables
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show attendance per course and flag shortfalls
    Attendance,
    /// Show overdue, urgent and upcoming assignments
    Alerts {
        /// Also list completed and far-off items
        #[arg(long)]
        all: bool,
    },
    /// Project pass/fail risk from the current metrics
    Risk,
    /// Log in and render the full dashboard
    Dashboard {
        #[arg(long)]
        user: Option<String>,
        #[arg(long, env = "LMS_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref(), cli.overrides)?;
    let reference_date = settings.reference_date();

    match cli.command {
        Commands::Attendance => {
            let courses = loader::load_attendance(&settings.attendance_csv)?;
            let evaluation =
                attendance::evaluate_attendance(&courses, settings.attendance_threshold)?;
            info!("{} of {} courses in shortfall", evaluation.shortfalls.len(), courses.len());

            println!(
                "Attendance (required {}):",
                report::format_percentage(settings.attendance_threshold)
            );
            for course in &evaluation.courses {
                let flag = if course.is_shortfall {
                    format!("SHORTFALL, attend {} more", course.classes_needed)
                } else {
                    "SAFE".to_string()
                };
                println!(
                    "- {} {}/{} ({}) {}",
                    course.course_code,
                    course.attended,
                    course.total_classes,
                    report::format_percentage(course.attendance_fraction),
                    flag
                );
            }
        }
        Commands::Alerts { all } => {
            let items = loader::load_assignments(&settings.assignments_csv)?;
            let alerts = if all {
                assignments::classify_assignments(
                    &items,
                    reference_date,
                    settings.alert_window_days,
                )
            } else {
                assignments::active_alerts(&items, reference_date, settings.alert_window_days)
            };
            info!("{} alerts from {} assignments", alerts.len(), items.len());

            if alerts.is_empty() {
                println!("No pending alerts as of {reference_date}.");
                return Ok(());
            }

            println!("Assignment alerts as of {reference_date}:");
            for alert in &alerts {
                println!(
                    "- [{}] {} {} due {} ({})",
                    alert.category.label(settings.alert_window_days),
                    alert.course_code,
                    alert.item_title,
                    alert.due_date,
                    report::format_days_remaining(alert.days_remaining)
                );
            }
        }
        Commands::Risk => {
            let verdict = predict_risk(&settings)?;
            println!("{}", verdict.status.label());
            println!("{}", verdict.message);
        }
        Commands::Dashboard {
            user,
            password,
            json,
            out,
        } => {
            let student = login(&settings, user.as_deref().unwrap_or(""), &password)?;
            let dashboard = build_dashboard(&settings, student)?;
            let rendered = if json {
                serde_json::to_string_pretty(&dashboard)?
            } else {
                report::build_dashboard(&dashboard)
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Dashboard written to {}.", path.display());
                }
                None => print!("{rendered}"),
            }
        }
    }

    Ok(())
}

fn load_settings(path: Option<&std::path::Path>, args: OverrideArgs) -> anyhow::Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::load_from_file(path)?,
        None => Settings::default(),
    };
    settings.apply(Overrides {
        threshold: args.threshold,
        window_days: args.window_days,
        today: args.today,
        model: args.model,
        data_dir: args.data_dir,
    });
    settings.validate()?;
    Ok(settings)
}

fn login(settings: &Settings, user: &str, password: &str) -> anyhow::Result<String> {
    let credentials = StaticCredentials::new(settings.users.clone());
    if credentials.is_empty() {
        warn!("no users configured; dashboard is not protected");
        return Ok(if user.is_empty() { "Student".to_string() } else { user.to_string() });
    }
    if !credentials.verify(user, password) {
        bail!("Incorrect User ID or Password. Please try again.");
    }
    info!("{user} logged in");
    Ok(user.to_string())
}

fn predict_risk(settings: &Settings) -> anyhow::Result<models::RiskVerdict> {
    let features = loader::load_risk_features(&settings.risk_csv)?;
    let predictor = RiskPredictor::from_artifact(&settings.model_path)?;
    if !predictor.is_available() {
        info!("reporting risk as unavailable");
    }
    let verdict = predictor.predict(&features).context("risk prediction failed")?;
    info!("risk verdict {:?}", verdict.status);
    Ok(verdict)
}

fn build_dashboard(settings: &Settings, student: String) -> anyhow::Result<report::Dashboard> {
    let reference_date = settings.reference_date();
    let courses = loader::load_attendance(&settings.attendance_csv)?;
    let items = loader::load_assignments(&settings.assignments_csv)?;

    Ok(report::Dashboard {
        portal_name: settings.portal_name.clone(),
        student,
        reference_date,
        attendance_threshold: settings.attendance_threshold,
        alert_window_days: settings.alert_window_days,
        attendance: attendance::evaluate_attendance(&courses, settings.attendance_threshold)?,
        alerts: assignments::active_alerts(&items, reference_date, settings.alert_window_days),
        risk: predict_risk(settings)?,
    })
}
