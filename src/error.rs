use std::path::PathBuf;

use thiserror::Error;

/// Malformed input rows. `row` is always the 1-based data row.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("missing column `{0}`")]
    MissingColumn(&'static str),
    #[error("row {row}: field `{field}`: {reason}")]
    Field {
        row: usize,
        field: &'static str,
        reason: String,
    },
    #[error("row {row}: course {course_code} has zero total classes")]
    ZeroClasses { row: usize, course_code: String },
    #[error(
        "row {row}: course {course_code} has {attended} attended out of {total_classes} classes"
    )]
    AttendedExceedsTotal {
        row: usize,
        course_code: String,
        attended: u32,
        total_classes: u32,
    },
    #[error("table has no rows")]
    Empty,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("model artifact {} is malformed: {reason}", .path.display())]
    MalformedArtifact { path: PathBuf, reason: String },
    #[error("classifier expects {expected} features, got {actual}")]
    FeatureShape { expected: usize, actual: usize },
    #[error("classifier returned {0} class probabilities, expected 2")]
    ProbabilityShape(usize),
    #[error("classifier returned probabilities {0:?}, expected two values in [0, 1] summing to 1")]
    ProbabilityRange(Vec<f64>),
    #[error("classifier returned unknown class label {0}")]
    UnknownClass(u8),
}
