use chrono::NaiveDate;
use log::debug;

use crate::models::{AlertCategory, AssignmentAlert, AssignmentItem, SubmissionStatus};

/// Items due within this many days (today included) are urgent.
pub const URGENT_DAYS: i64 = 2;
pub const DEFAULT_ALERT_WINDOW_DAYS: i64 = 7;

pub fn alert_category(
    status: SubmissionStatus,
    days_remaining: i64,
    window_days: i64,
) -> AlertCategory {
    if status == SubmissionStatus::Submitted {
        return AlertCategory::Completed;
    }

    match days_remaining {
        d if d < 0 => AlertCategory::Overdue,
        0..=URGENT_DAYS => AlertCategory::Urgent,
        d if d <= window_days => AlertCategory::Upcoming,
        _ => AlertCategory::Safe,
    }
}

/// Annotates every item against `reference_date`, keeping input order.
pub fn classify_assignments(
    items: &[AssignmentItem],
    reference_date: NaiveDate,
    window_days: i64,
) -> Vec<AssignmentAlert> {
    items
        .iter()
        .map(|item| {
            let days_remaining = (item.due_date - reference_date).num_days();
            let category = alert_category(item.status, days_remaining, window_days);
            debug!(
                "{} / {}: due {} ({} days) -> {:?}",
                item.course_code, item.item_title, item.due_date, days_remaining, category
            );
            AssignmentAlert {
                course_code: item.course_code.clone(),
                item_title: item.item_title.clone(),
                due_date: item.due_date,
                status: item.status,
                days_remaining,
                category,
            }
        })
        .collect()
}

/// Overdue, urgent and upcoming items, soonest due first.
pub fn active_alerts(
    items: &[AssignmentItem],
    reference_date: NaiveDate,
    window_days: i64,
) -> Vec<AssignmentAlert> {
    let mut alerts: Vec<AssignmentAlert> = classify_assignments(items, reference_date, window_days)
        .into_iter()
        .filter(|alert| alert.category.is_active())
        .collect();
    alerts.sort_by_key(|alert| alert.days_remaining);
    alerts
}
