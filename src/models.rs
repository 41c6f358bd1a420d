use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseAttendance {
    pub course_code: String,
    pub attended: u32,
    pub total_classes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceStatus {
    pub course_code: String,
    pub attended: u32,
    pub total_classes: u32,
    pub attendance_fraction: f64,
    pub is_shortfall: bool,
    pub classes_needed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionStatus {
    Submitted,
    Pending,
}

impl SubmissionStatus {
    pub fn parse(value: &str) -> Self {
        if value.trim() == "Submitted" {
            SubmissionStatus::Submitted
        } else {
            SubmissionStatus::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentItem {
    pub course_code: String,
    pub item_title: String,
    pub due_date: NaiveDate,
    pub status: SubmissionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCategory {
    Completed,
    Overdue,
    Urgent,
    Upcoming,
    Safe,
}

impl AlertCategory {
    /// Whether the item belongs on the alert list.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            AlertCategory::Overdue | AlertCategory::Urgent | AlertCategory::Upcoming
        )
    }

    pub fn label(self, window_days: i64) -> String {
        match self {
            AlertCategory::Completed => "COMPLETED".to_string(),
            AlertCategory::Overdue => "OVERDUE".to_string(),
            AlertCategory::Urgent => "URGENT (Due Today/Tomorrow)".to_string(),
            AlertCategory::Upcoming => format!("UPCOMING (Within {window_days} Days)"),
            AlertCategory::Safe => "SAFE (Plenty of Time)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentAlert {
    pub course_code: String,
    pub item_title: String,
    pub due_date: NaiveDate,
    pub status: SubmissionStatus,
    pub days_remaining: i64,
    pub category: AlertCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskFeatures {
    pub attendance_pct: f64,
    pub quiz_avg: f64,
    pub assignment_avg: f64,
    pub study_hours: f64,
}

impl RiskFeatures {
    /// Column order the classifier was trained on.
    pub const FEATURE_NAMES: [&'static str; 4] =
        ["Attendance_Pct", "Quiz_Avg", "Assignment_Avg", "Study_Hours"];

    pub fn to_vector(&self) -> [f64; 4] {
        [
            self.attendance_pct,
            self.quiz_avg,
            self.assignment_avg,
            self.study_hours,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskStatus {
    LowRisk,
    HighRisk,
    Unavailable,
}

impl RiskStatus {
    pub fn label(self) -> &'static str {
        match self {
            RiskStatus::LowRisk => "LOW RISK (Projected PASS)",
            RiskStatus::HighRisk => "HIGH RISK (Projected FAIL)",
            RiskStatus::Unavailable => "UNAVAILABLE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskVerdict {
    pub status: RiskStatus,
    pub pass_probability: Option<f64>,
    pub fail_probability: Option<f64>,
    pub message: String,
}
