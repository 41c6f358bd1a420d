use log::debug;
use serde::Serialize;

use crate::error::ValidationError;
use crate::models::{AttendanceStatus, CourseAttendance};

pub const DEFAULT_ATTENDANCE_THRESHOLD: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceEvaluation {
    pub courses: Vec<AttendanceStatus>,
    pub shortfalls: Vec<AttendanceStatus>,
}

/// Annotates every course and collects the ones below `threshold`, in input order.
pub fn evaluate_attendance(
    rows: &[CourseAttendance],
    threshold: f64,
) -> Result<AttendanceEvaluation, ValidationError> {
    let mut courses = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let status = evaluate_course(index + 1, row, threshold)?;
        debug!(
            "{}: {}/{} attended, shortfall {}, needs {}",
            status.course_code,
            status.attended,
            status.total_classes,
            status.is_shortfall,
            status.classes_needed
        );
        courses.push(status);
    }

    let shortfalls = courses
        .iter()
        .filter(|course| course.is_shortfall)
        .cloned()
        .collect();

    Ok(AttendanceEvaluation {
        courses,
        shortfalls,
    })
}

pub fn check_course(row: usize, course: &CourseAttendance) -> Result<(), ValidationError> {
    if course.total_classes == 0 {
        return Err(ValidationError::ZeroClasses {
            row,
            course_code: course.course_code.clone(),
        });
    }
    if course.attended > course.total_classes {
        return Err(ValidationError::AttendedExceedsTotal {
            row,
            course_code: course.course_code.clone(),
            attended: course.attended,
            total_classes: course.total_classes,
        });
    }
    Ok(())
}

fn evaluate_course(
    row: usize,
    course: &CourseAttendance,
    threshold: f64,
) -> Result<AttendanceStatus, ValidationError> {
    check_course(row, course)?;

    let attendance_fraction = course.attended as f64 / course.total_classes as f64;
    let is_shortfall = attendance_fraction < threshold;
    let classes_needed = if is_shortfall {
        remediation_count(course.attended, course.total_classes, threshold)
    } else {
        0
    };

    Ok(AttendanceStatus {
        course_code: course.course_code.clone(),
        attended: course.attended,
        total_classes: course.total_classes,
        attendance_fraction,
        is_shortfall,
        classes_needed,
    })
}

/// Classes still to attend to reach the threshold of the current total. Never below 1.
fn remediation_count(attended: u32, total_classes: u32, threshold: f64) -> u32 {
    let target = (total_classes as f64 * threshold).ceil() as i64;
    (target - attended as i64).max(1) as u32
}
