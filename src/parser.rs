use std::path::Path;

use csv::{Reader, StringRecord};
use tracing::{debug, info};

use crate::config::SeatingConfig;
use crate::error::{AllocationError, Result};
use crate::seating::AttendeeRecord;

const FIRST_NAME_COLUMN: &str = "First Name";
const LAST_NAME_COLUMN: &str = "Last Name";
const GROUP_COLUMN: &str = "Table Group";

/// Parses an RSVP answer, accepting the spellings the invite form produced
fn is_attending(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "y" | "attending" | "accepted" | "true" | "1"
    )
}

/// Finds a header by trimmed, case-insensitive name
fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn required_column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    find_column(headers, name).ok_or_else(|| AllocationError::MissingColumn {
        path: path.to_path_buf(),
        column: name.to_string(),
    })
}

/// Loads attending guests from the seating spreadsheet (CSV export)
///
/// # Arguments
/// * `csv_path` - Path to the CSV file
/// * `config` - Supplies the RSVP filter column and the status columns kept for fingerprinting
///
/// Line numbers are physical CSV lines, so the header is line 1 and the first guest is line 2.
pub fn load_attendees<P: AsRef<Path>>(csv_path: P, config: &SeatingConfig) -> Result<Vec<AttendeeRecord>> {
    let path = csv_path.as_ref();
    let csv_error = |source| AllocationError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = Reader::from_path(path).map_err(csv_error)?;
    let headers = reader.headers().map_err(csv_error)?.clone();

    let first_col = required_column(&headers, FIRST_NAME_COLUMN, path)?;
    let last_col = required_column(&headers, LAST_NAME_COLUMN, path)?;
    let group_col = required_column(&headers, GROUP_COLUMN, path)?;
    // Configured columns are as required as the name columns; `attending_column: null` opts out
    let attending_col = config
        .attending_column
        .as_deref()
        .map(|name| required_column(&headers, name, path))
        .transpose()?;
    let status_cols = config
        .fingerprint_columns
        .iter()
        .map(|name| required_column(&headers, name, path))
        .collect::<Result<Vec<usize>>>()?;

    let mut attendees = Vec::new();
    let mut skipped = 0;

    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let line_number = record.position().map(|p| p.line()).unwrap_or(0);

        let first_name = record.get(first_col).unwrap_or("");
        let last_name = record.get(last_col).unwrap_or("");

        // Skip blank rows left between sections of the sheet
        if first_name.trim().is_empty() && last_name.trim().is_empty() {
            continue;
        }

        if let Some(col) = attending_col {
            if !is_attending(record.get(col).unwrap_or("")) {
                debug!("Line {}: {} {} is not attending, skipping", line_number, first_name, last_name);
                skipped += 1;
                continue;
            }
        }

        let status = status_cols
            .iter()
            .map(|&col| record.get(col).unwrap_or("").trim().to_string())
            .collect();

        let group = record.get(group_col).unwrap_or("");
        attendees.push(AttendeeRecord::new(line_number, first_name, last_name, group).with_status(status));
    }

    info!(
        "Loaded {} attendees from {} ({} not attending)",
        attendees.len(),
        path.display(),
        skipped
    );

    Ok(attendees)
}
