use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::config::{RenameRule, RenameStrategy};
use crate::error::{AllocationError, Result};
use super::types::AttendeeRecord;

/// Why a rename rule picked (or skipped) a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameReason {
    /// Status fingerprint matched the related attendee, named by first name
    MatchedRelated(String),
    DefaultFirstRow,
    LatestRow,
    NoTwoDuplicateRows,
}

impl fmt::Display for RenameReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameReason::MatchedRelated(first) => write!(f, "matched_{}", first),
            RenameReason::DefaultFirstRow => write!(f, "default_first_row"),
            RenameReason::LatestRow => write!(f, "latest_row"),
            RenameReason::NoTwoDuplicateRows => write!(f, "no_two_duplicate_rows"),
        }
    }
}

impl Serialize for RenameReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Audit entry for one rename rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameAudit {
    pub name: String,
    pub applied: bool,
    pub line_number: Option<u64>,
    pub reason: RenameReason,
}

/// Runs every rename rule in order against the attendee list
pub fn resolve_name_conflicts(attendees: &mut [AttendeeRecord], rules: &[RenameRule]) -> Vec<RenameAudit> {
    rules
        .iter()
        .map(|rule| resolve_duplicate(attendees, rule))
        .collect()
}

/// Turns one of exactly two same-named attendees into "<last> Jr"
///
/// Any other number of matches leaves the list untouched and reports
/// `no_two_duplicate_rows`, so re-running on a resolved list is a no-op.
pub fn resolve_duplicate(attendees: &mut [AttendeeRecord], rule: &RenameRule) -> RenameAudit {
    let mut candidates: Vec<usize> = attendees
        .iter()
        .enumerate()
        .filter(|(_, a)| a.full_name_norm == rule.name)
        .map(|(i, _)| i)
        .collect();

    if candidates.len() != 2 {
        info!("Rename {}: {} rows found, nothing to do", rule.name, candidates.len());
        return RenameAudit {
            name: rule.name.clone(),
            applied: false,
            line_number: None,
            reason: RenameReason::NoTwoDuplicateRows,
        };
    }

    candidates.sort_by_key(|&i| attendees[i].line_number);

    let (junior, reason) = match &rule.strategy {
        RenameStrategy::LatestLineNumber => (candidates[1], RenameReason::LatestRow),
        RenameStrategy::ByRelatedFingerprint { related } => {
            let related_record = attendees.iter().find(|a| &a.full_name_norm == related);
            let matched = related_record.and_then(|r| {
                let fingerprint = r.fingerprint();
                // No status values means nothing to compare
                if fingerprint.chars().all(|c| c == '|') {
                    return None;
                }
                candidates
                    .iter()
                    .copied()
                    .find(|&i| attendees[i].fingerprint() == fingerprint)
            });

            match (matched, related_record) {
                (Some(index), Some(r)) => (index, RenameReason::MatchedRelated(r.first_name.to_lowercase())),
                _ => {
                    if related_record.is_none() {
                        warn!("Rename {}: related attendee {} not found, using first row", rule.name, related);
                    }
                    (candidates[0], RenameReason::DefaultFirstRow)
                }
            }
        }
    };

    let attendee = &mut attendees[junior];
    let last_name = format!("{} Jr", strip_junior(&attendee.last_name));
    attendee.set_last_name(last_name);

    info!(
        "Rename {}: line {} is now {} ({})",
        rule.name,
        attendee.line_number,
        attendee.display_name(),
        reason
    );

    RenameAudit {
        name: rule.name.clone(),
        applied: true,
        line_number: Some(attendee.line_number),
        reason,
    }
}

/// Drops a trailing "Jr" / "Jr." (and a comma before it) from a last name
fn strip_junior(last_name: &str) -> &str {
    let trimmed = last_name.trim_end();
    let mut parts = trimmed.rsplitn(2, char::is_whitespace);
    let tail = parts.next().unwrap_or("");
    match parts.next() {
        Some(head) if tail.trim_end_matches('.').eq_ignore_ascii_case("jr") => {
            head.trim_end().trim_end_matches(',').trim_end()
        }
        _ => trimmed,
    }
}

/// Fails if any normalized name still appears more than once
pub fn ensure_unique_names(attendees: &[AttendeeRecord]) -> Result<()> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for attendee in attendees {
        *counts.entry(attendee.full_name_norm.as_str()).or_insert(0) += 1;
    }

    let mut duplicates: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, count)| (name.to_string(), count))
        .collect();

    if duplicates.is_empty() {
        return Ok(());
    }

    duplicates.sort();
    Err(AllocationError::DuplicateNames { duplicates })
}
