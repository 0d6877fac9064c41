use serde::{Deserialize, Serialize};

/// One attendee row handed over by the loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendeeRecord {
    pub line_number: u64,
    pub first_name: String,
    pub last_name: String,
    pub group: String,
    pub full_name_norm: String,
    /// Attendance/meal values captured for fingerprinting, in configured column order
    pub status: Vec<String>,
}

impl AttendeeRecord {
    pub fn new(line_number: u64, first_name: &str, last_name: &str, group: &str) -> Self {
        let first_name = first_name.trim().to_string();
        let last_name = last_name.trim().to_string();
        let full_name_norm = normalize_name(&first_name, &last_name);
        Self {
            line_number,
            first_name,
            last_name,
            group: group.trim().to_string(),
            full_name_norm,
            status: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: Vec<String>) -> Self {
        self.status = status;
        self
    }

    /// Lowercased status values joined with `|`
    pub fn fingerprint(&self) -> String {
        self.status
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub(crate) fn set_last_name(&mut self, last_name: String) {
        self.full_name_norm = normalize_name(&self.first_name, &last_name);
        self.last_name = last_name;
    }
}

/// Lowercase, trimmed, whitespace-collapsed "first last"
pub fn normalize_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name, last_name)
        .split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Take `seats` attendees from `group` and seat them at `table`"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSegment {
    pub table: String,
    pub group: String,
    pub seats: usize,
}

impl PlanSegment {
    pub fn new(table: &str, group: &str, seats: usize) -> Self {
        Self {
            table: table.to_string(),
            group: group.to_string(),
            seats,
        }
    }
}

/// A seated attendee
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableAssignment {
    pub table_label: String,
    pub source_group: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name_norm: String,
    pub line_number: u64,
}

impl TableAssignment {
    pub fn seat(attendee: &AttendeeRecord, table: &str) -> Self {
        Self {
            table_label: table.to_string(),
            source_group: attendee.group.clone(),
            first_name: attendee.first_name.clone(),
            last_name: attendee.last_name.clone(),
            full_name_norm: attendee.full_name_norm.clone(),
            line_number: attendee.line_number,
        }
    }
}

/// Seats used at one table against its capacity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableTally {
    pub table: String,
    pub assigned: usize,
    pub capacity: usize,
    pub open_seats: usize,
}

impl TableTally {
    pub fn new(table: &str, assigned: usize, capacity: usize) -> Self {
        Self {
            table: table.to_string(),
            assigned,
            capacity,
            open_seats: capacity.saturating_sub(assigned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub group: String,
    pub count: usize,
}
