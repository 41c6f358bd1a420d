use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::attendance::check_course;
use crate::error::{LoadError, ValidationError};
use crate::models::{AssignmentItem, CourseAttendance, RiskFeatures, SubmissionStatus};

#[derive(Deserialize)]
struct AttendanceRow {
    #[serde(rename = "Course_Code")]
    course_code: String,
    #[serde(rename = "Attended")]
    attended: String,
    #[serde(rename = "Total_Classes")]
    total_classes: String,
}

#[derive(Deserialize)]
struct AssignmentRow {
    #[serde(rename = "Course_Code")]
    course_code: String,
    #[serde(rename = "Item_Title")]
    item_title: String,
    #[serde(rename = "Due_Date")]
    due_date: String,
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Deserialize)]
struct RiskRow {
    #[serde(rename = "Attendance_Pct")]
    attendance_pct: String,
    #[serde(rename = "Quiz_Avg")]
    quiz_avg: String,
    #[serde(rename = "Assignment_Avg")]
    assignment_avg: String,
    #[serde(rename = "Study_Hours")]
    study_hours: String,
}

pub fn load_attendance(path: &Path) -> Result<Vec<CourseAttendance>, LoadError> {
    let rows: Vec<AttendanceRow> =
        read_rows(path, &["Course_Code", "Attended", "Total_Classes"])?;

    let courses = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<CourseAttendance, ValidationError> {
            let course = CourseAttendance {
                course_code: row.course_code,
                attended: parse_count(index + 1, "Attended", &row.attended)?,
                total_classes: parse_count(index + 1, "Total_Classes", &row.total_classes)?,
            };
            check_course(index + 1, &course)?;
            Ok(course)
        })
        .collect::<Result<Vec<_>, ValidationError>>()
        .map_err(|source| invalid(path, source))?;

    info!("loaded {} courses from {}", courses.len(), path.display());
    Ok(courses)
}

pub fn load_assignments(path: &Path) -> Result<Vec<AssignmentItem>, LoadError> {
    let rows: Vec<AssignmentRow> =
        read_rows(path, &["Course_Code", "Item_Title", "Due_Date", "Status"])?;

    let items = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<AssignmentItem, ValidationError> {
            Ok(AssignmentItem {
                course_code: row.course_code,
                item_title: row.item_title,
                due_date: parse_due_date(index + 1, &row.due_date)?,
                status: SubmissionStatus::parse(&row.status),
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()
        .map_err(|source| invalid(path, source))?;

    info!("loaded {} assignments from {}", items.len(), path.display());
    Ok(items)
}

/// Reads the first row of the risk-feature table.
pub fn load_risk_features(path: &Path) -> Result<RiskFeatures, LoadError> {
    let rows: Vec<RiskRow> = read_rows(
        path,
        &["Attendance_Pct", "Quiz_Avg", "Assignment_Avg", "Study_Hours"],
    )?;

    if rows.len() > 1 {
        warn!(
            "{} has {} rows; only the first is used",
            path.display(),
            rows.len()
        );
    }
    let row = rows
        .first()
        .ok_or_else(|| invalid(path, ValidationError::Empty))?;

    parse_risk_row(row).map_err(|source| invalid(path, source))
}

fn parse_risk_row(row: &RiskRow) -> Result<RiskFeatures, ValidationError> {
    Ok(RiskFeatures {
        attendance_pct: parse_metric(1, "Attendance_Pct", &row.attendance_pct)?,
        quiz_avg: parse_metric(1, "Quiz_Avg", &row.quiz_avg)?,
        assignment_avg: parse_metric(1, "Assignment_Avg", &row.assignment_avg)?,
        study_hours: parse_metric(1, "Study_Hours", &row.study_hours)?,
    })
}

fn read_rows<T: DeserializeOwned>(
    path: &Path,
    columns: &[&'static str],
) -> Result<Vec<T>, LoadError> {
    let read_error = |source: csv::Error| LoadError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_error)?;

    let headers = reader.headers().map_err(read_error)?.clone();
    for column in columns {
        if !headers.iter().any(|header| header == *column) {
            return Err(invalid(path, ValidationError::MissingColumn(*column)));
        }
    }

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        rows.push(result.map_err(read_error)?);
    }
    Ok(rows)
}

fn invalid(path: &Path, source: ValidationError) -> LoadError {
    LoadError::Invalid {
        path: path.to_path_buf(),
        source,
    }
}

fn parse_count(row: usize, field: &'static str, value: &str) -> Result<u32, ValidationError> {
    value.parse::<u32>().map_err(|_| ValidationError::Field {
        row,
        field,
        reason: format!("expected a non-negative integer, got {value:?}"),
    })
}

fn parse_metric(row: usize, field: &'static str, value: &str) -> Result<f64, ValidationError> {
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(ValidationError::Field {
            row,
            field,
            reason: format!("expected a number, got {value:?}"),
        }),
    }
}

/// Accepts a plain date or a timestamp; timestamps are truncated to their calendar date.
fn parse_due_date(row: usize, value: &str) -> Result<NaiveDate, ValidationError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|timestamp| timestamp.date())
        .ok_or_else(|| ValidationError::Field {
            row,
            field: "Due_Date",
            reason: format!("expected YYYY-MM-DD, got {value:?}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn validation(err: LoadError) -> ValidationError {
        match err {
            LoadError::Invalid { source, .. } => source,
            other => panic!("expected validation failure, got {other}"),
        }
    }

    #[test]
    fn loads_attendance_rows() {
        let file = fixture("Course_Code,Attended,Total_Classes\nCS101, 30 ,50\nMA201,40,50\n");
        let courses = load_attendance(file.path()).unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].course_code, "CS101");
        assert_eq!(courses[0].attended, 30);
        assert_eq!(courses[1].total_classes, 50);
    }

    #[test]
    fn missing_column_is_named() {
        let file = fixture("Course_Code,Attended\nCS101,30\n");
        let err = validation(load_attendance(file.path()).unwrap_err());
        assert_eq!(err, ValidationError::MissingColumn("Total_Classes"));
    }

    #[test]
    fn non_numeric_count_names_row_and_field() {
        let file = fixture("Course_Code,Attended,Total_Classes\nCS101,30,50\nMA201,lots,50\n");
        let err = validation(load_attendance(file.path()).unwrap_err());
        assert!(matches!(
            err,
            ValidationError::Field { row: 2, field: "Attended", .. }
        ));
    }

    #[test]
    fn zero_total_classes_is_rejected_at_load() {
        let file = fixture("Course_Code,Attended,Total_Classes\nCS101,0,0\n");
        let err = validation(load_attendance(file.path()).unwrap_err());
        assert!(matches!(err, ValidationError::ZeroClasses { row: 1, .. }));
    }

    #[test]
    fn loads_assignments_with_mixed_date_formats() {
        let file = fixture(
            "Course_Code,Item_Title,Due_Date,Status\n\
             CS101,Lab 1,2024-06-09,Pending\n\
             CS101,Essay,2024-06-12 23:59:00,Submitted\n\
             MA201,Quiz,2024-06-15T09:00:00,Not Started\n",
        );
        let items = load_assignments(file.path()).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].due_date, NaiveDate::from_ymd_opt(2024, 6, 12).unwrap());
        assert_eq!(items[1].status, SubmissionStatus::Submitted);
        assert_eq!(items[2].due_date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(items[2].status, SubmissionStatus::Pending);
    }

    #[test]
    fn bad_due_date_is_rejected() {
        let file = fixture("Course_Code,Item_Title,Due_Date,Status\nCS101,Lab,next week,Pending\n");
        let err = validation(load_assignments(file.path()).unwrap_err());
        assert!(matches!(
            err,
            ValidationError::Field { row: 1, field: "Due_Date", .. }
        ));
    }

    #[test]
    fn uses_first_risk_row() {
        let file = fixture(
            "Attendance_Pct,Quiz_Avg,Assignment_Avg,Study_Hours\n68.5,55,61.25,3\n99,99,99,99\n",
        );
        let features = load_risk_features(file.path()).unwrap();
        assert_eq!(features.attendance_pct, 68.5);
        assert_eq!(features.assignment_avg, 61.25);
        assert_eq!(features.study_hours, 3.0);
    }

    #[test]
    fn empty_risk_table_is_rejected() {
        let file = fixture("Attendance_Pct,Quiz_Avg,Assignment_Avg,Study_Hours\n");
        let err = validation(load_risk_features(file.path()).unwrap_err());
        assert_eq!(err, ValidationError::Empty);
    }

    #[test]
    fn non_finite_risk_metric_is_rejected() {
        let file = fixture("Attendance_Pct,Quiz_Avg,Assignment_Avg,Study_Hours\n70,NaN,60,4\n");
        let err = validation(load_risk_features(file.path()).unwrap_err());
        assert!(matches!(
            err,
            ValidationError::Field { field: "Quiz_Avg", .. }
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_attendance(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }
}
