use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;

use crate::attendance::AttendanceEvaluation;
use crate::models::{AssignmentAlert, RiskVerdict};

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub portal_name: String,
    pub student: String,
    pub reference_date: NaiveDate,
    pub attendance_threshold: f64,
    pub alert_window_days: i64,
    pub attendance: AttendanceEvaluation,
    pub alerts: Vec<AssignmentAlert>,
    pub risk: RiskVerdict,
}

/// Percentage rounded to two places, printed without trailing zeros: `0.6` is `60.0%`.
pub fn format_percentage(fraction: f64) -> String {
    let rounded = (fraction * 100.0 * 100.0).round() / 100.0;
    format!("{rounded:?}%")
}

pub fn format_days_remaining(days: i64) -> String {
    match days {
        0 => "Today".to_string(),
        -1 => "1 day ago".to_string(),
        1 => "1 day remaining".to_string(),
        d if d < 0 => format!("{} days ago", -d),
        d => format!("{d} days remaining"),
    }
}

pub fn build_dashboard(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Smart LMS Proactive Assistant");
    let _ = writeln!(
        output,
        "Welcome, **{}**. LMS: {} (as of {})",
        dashboard.student, dashboard.portal_name, dashboard.reference_date
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Risk Projection");
    let _ = writeln!(output, "**{}**", dashboard.risk.status.label());
    let _ = writeln!(output, "{}", dashboard.risk.message);
    let _ = writeln!(output);

    let _ = writeln!(
        output,
        "## Attendance Shortfall (required {})",
        format_percentage(dashboard.attendance_threshold)
    );
    if dashboard.attendance.shortfalls.is_empty() {
        let _ = writeln!(output, "All courses meet the attendance requirement.");
    } else {
        let _ = writeln!(output, "| Course | Attendance | Attended | Classes Needed |");
        let _ = writeln!(output, "|---|---|---|---|");
        for course in &dashboard.attendance.shortfalls {
            let _ = writeln!(
                output,
                "| {} | {} | {}/{} | {} |",
                course.course_code,
                format_percentage(course.attendance_fraction),
                course.attended,
                course.total_classes,
                course.classes_needed
            );
        }
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Assignment Alerts");
    if dashboard.alerts.is_empty() {
        let _ = writeln!(output, "No pending alerts.");
    } else {
        let _ = writeln!(output, "| Course | Item | Due | Alert | Days |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for alert in &dashboard.alerts {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                alert.course_code,
                alert.item_title,
                alert.due_date,
                alert.category.label(dashboard.alert_window_days),
                format_days_remaining(alert.days_remaining)
            );
        }
    }

    output
}
