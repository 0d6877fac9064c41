use std::path::PathBuf;

use thiserror::Error;

/// Every way a seating run can fail. All of them abort the run.
#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unreadable spreadsheet {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },

    #[error("Spreadsheet {path} is missing required column \"{column}\"")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid seating plan file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid seating configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Environment variable {key} is required in apply mode")]
    MissingEnv { key: String },

    #[error("Duplicate attendee names remain after rename resolution: {}", format_counts(.duplicates))]
    DuplicateNames { duplicates: Vec<(String, usize)> },

    #[error("Group \"{group}\" expected {expected} attendees, got {actual}")]
    GroupCountMismatch {
        group: String,
        expected: usize,
        actual: usize,
    },

    #[error("Group \"{group}\" cannot fill {table}: need {needed}, have {available}")]
    InsufficientAttendees {
        group: String,
        table: String,
        needed: usize,
        available: usize,
    },

    #[error("Attendees left unassigned after all plan segments: {}", format_leftovers(.leftovers))]
    UnassignedAttendees { leftovers: Vec<Leftover> },

    #[error("Unknown table \"{table}\" has {assigned} assignments but no configured capacity")]
    UnknownTable { table: String, assigned: usize },

    #[error("{table} is over capacity: {assigned} assigned, {capacity} seats")]
    OverCapacity {
        table: String,
        assigned: usize,
        capacity: usize,
    },

    #[error("Group \"{group}\" seated at {table}, outside zone \"{zone}\"")]
    ZoneViolation {
        group: String,
        zone: String,
        table: String,
    },

    #[error("{} attendees have no guest directory match: {}", .names.len(), .names.join(", "))]
    UnmatchedAttendees { names: Vec<String> },

    #[error("Guest directory write failed on batch {batch}: {reason}")]
    BatchWrite { batch: usize, reason: String },

    #[error("Guest directory request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Attendees still sitting in a group bucket once the plan is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leftover {
    pub group: String,
    pub names: Vec<String>,
}

pub type Result<T, E = AllocationError> = std::result::Result<T, E>;

fn format_counts(counts: &[(String, usize)]) -> String {
    counts
        .iter()
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_leftovers(leftovers: &[Leftover]) -> String {
    leftovers
        .iter()
        .map(|l| format!("group \"{}\" has {} [{}]", l.group, l.names.len(), l.names.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = AllocationError::GroupCountMismatch {
            group: "Work".into(),
            expected: 14,
            actual: 13,
        };
        assert_eq!(err.to_string(), "Group \"Work\" expected 14 attendees, got 13");

        let err = AllocationError::DuplicateNames {
            duplicates: vec![("robert kidd".into(), 2), ("stephen boyd".into(), 3)],
        };
        assert_eq!(
            err.to_string(),
            "Duplicate attendee names remain after rename resolution: robert kidd (2), stephen boyd (3)"
        );
    }
}
