use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer};

use crate::assignments::{DEFAULT_ALERT_WINDOW_DAYS, URGENT_DAYS};
use crate::attendance::DEFAULT_ATTENDANCE_THRESHOLD;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub attendance_threshold: f64,
    pub alert_window_days: i64,
    /// Fixed "today"; the local calendar date when unset. Accepts a bare TOML date
    /// (`2024-06-10`) or a quoted one.
    #[serde(deserialize_with = "deserialize_reference_date")]
    pub reference_date: Option<NaiveDate>,
    pub model_path: PathBuf,
    pub attendance_csv: PathBuf,
    pub assignments_csv: PathBuf,
    pub risk_csv: PathBuf,
    pub portal_name: String,
    /// Identity to secret, checked by the dashboard login gate.
    pub users: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            attendance_threshold: DEFAULT_ATTENDANCE_THRESHOLD,
            alert_window_days: DEFAULT_ALERT_WINDOW_DAYS,
            reference_date: None,
            model_path: PathBuf::from("performance_predictor.json"),
            attendance_csv: PathBuf::from("attendance_data.csv"),
            assignments_csv: PathBuf::from("assignments_data.csv"),
            risk_csv: PathBuf::from("student_risk_data.csv"),
            portal_name: "Virtual Learning Portal".to_string(),
            users: BTreeMap::new(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub threshold: Option<f64>,
    pub window_days: Option<i64>,
    pub today: Option<NaiveDate>,
    pub model: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(threshold) = overrides.threshold {
            self.attendance_threshold = threshold;
        }
        if let Some(window_days) = overrides.window_days {
            self.alert_window_days = window_days;
        }
        if let Some(today) = overrides.today {
            self.reference_date = Some(today);
        }
        if let Some(model) = overrides.model {
            self.model_path = model;
        }
        if let Some(dir) = overrides.data_dir {
            self.attendance_csv = rebase(&dir, &self.attendance_csv);
            self.assignments_csv = rebase(&dir, &self.assignments_csv);
            self.risk_csv = rebase(&dir, &self.risk_csv);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.attendance_threshold > 0.0 && self.attendance_threshold <= 1.0) {
            bail!(
                "attendance_threshold must be in (0, 1], got {}",
                self.attendance_threshold
            );
        }
        if self.alert_window_days < URGENT_DAYS {
            bail!(
                "alert_window_days must be at least {URGENT_DAYS}, got {}",
                self.alert_window_days
            );
        }
        Ok(())
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(today)
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn deserialize_reference_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match toml::Value::deserialize(deserializer)? {
        toml::Value::String(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|err| D::Error::custom(format!("invalid reference_date `{text}`: {err}"))),
        toml::Value::Datetime(datetime) => match (datetime.date, datetime.time) {
            (Some(date), None) => NaiveDate::from_ymd_opt(
                i32::from(date.year),
                u32::from(date.month),
                u32::from(date.day),
            )
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid reference_date {datetime}"))),
            _ => Err(D::Error::custom(format!(
                "reference_date must be a calendar date, got {datetime}"
            ))),
        },
        other => Err(D::Error::custom(format!(
            "reference_date must be a date, got {}",
            other.type_str()
        ))),
    }
}

fn rebase(dir: &Path, path: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => dir.join(name),
        None => dir.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_constants() {
        let settings = Settings::default();
        assert_eq!(settings.attendance_threshold, 0.75);
        assert_eq!(settings.alert_window_days, 7);
        assert!(settings.reference_date.is_none());
        assert!(settings.users.is_empty());
        settings.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            attendance_threshold = 0.8
            reference_date = "2024-06-10"

            [users]
            "Urooj Hameed" = "12345"
            "#,
        )
        .unwrap();
        assert_eq!(settings.attendance_threshold, 0.8);
        assert_eq!(settings.alert_window_days, 7);
        assert_eq!(
            settings.reference_date(),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
        );
        assert_eq!(settings.users.get("Urooj Hameed").map(String::as_str), Some("12345"));
    }

    #[test]
    fn bare_toml_date_is_accepted() {
        let settings = Settings::from_toml("reference_date = 2024-06-10").unwrap();
        assert_eq!(
            settings.reference_date,
            Some(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap())
        );
    }

    #[test]
    fn reference_date_must_be_a_calendar_date() {
        assert!(Settings::from_toml("reference_date = 2024-06-10T08:00:00").is_err());
        assert!(Settings::from_toml(r#"reference_date = "10/06/2024""#).is_err());
        assert!(Settings::from_toml("reference_date = 20240610").is_err());
    }

    #[test]
    fn overrides_win_over_file() {
        let mut settings = Settings::from_toml("alert_window_days = 10").unwrap();
        settings.apply(Overrides {
            window_days: Some(5),
            data_dir: Some(PathBuf::from("data")),
            ..Overrides::default()
        });
        assert_eq!(settings.alert_window_days, 5);
        assert_eq!(settings.attendance_csv, PathBuf::from("data/attendance_data.csv"));
        assert_eq!(settings.risk_csv, PathBuf::from("data/student_risk_data.csv"));
        assert_eq!(settings.model_path, PathBuf::from("performance_predictor.json"));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        for threshold in [0.0, -0.5, 1.5, f64::NAN] {
            let settings = Settings {
                attendance_threshold: threshold,
                ..Settings::default()
            };
            assert!(settings.validate().is_err(), "{threshold}");
        }
    }

    #[test]
    fn rejects_window_shorter_than_urgent_bucket() {
        let settings = Settings {
            alert_window_days: 1,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn unset_reference_date_is_today() {
        assert_eq!(Settings::default().reference_date(), today());
    }

    #[test]
    fn shipped_sample_config_is_valid() {
        let settings = Settings::from_toml(include_str!("../data/lms.toml")).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.model_path, PathBuf::from("data/performance_predictor.json"));
        assert_eq!(settings.users.len(), 1);
        assert_eq!(
            settings.reference_date,
            Some(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap())
        );
    }
}
