pub mod types;
pub mod rename;
pub mod allocate;
pub mod validate;

pub use types::{normalize_name, AttendeeRecord, GroupCount, PlanSegment, TableAssignment, TableTally};
pub use rename::{ensure_unique_names, resolve_name_conflicts, RenameAudit, RenameReason};
pub use allocate::{allocate_tables, check_group_sizes, count_groups};
pub use validate::{check_capacities, check_zones};

use tracing::info;

use crate::config::SeatingConfig;
use crate::error::Result;

/// A validated seating chart
#[derive(Debug, Clone)]
pub struct SeatingOutcome {
    pub assignments: Vec<TableAssignment>,
    pub tables: Vec<TableTally>,
    pub groups: Vec<GroupCount>,
    pub renames: Vec<RenameAudit>,
}

/// Resolves duplicate names, seats everyone per the plan and validates the result
///
/// Stops at the first problem; nothing is returned unless every check passed.
pub fn plan_seating(mut attendees: Vec<AttendeeRecord>, config: &SeatingConfig) -> Result<SeatingOutcome> {
    config.check()?;

    let renames = resolve_name_conflicts(&mut attendees, &config.renames);
    ensure_unique_names(&attendees)?;

    check_group_sizes(&attendees, &config.expected_groups)?;
    let groups = count_groups(&attendees);

    let assignments = allocate_tables(&attendees, &config.plan)?;
    info!("Allocated {} attendees over {} plan segments", assignments.len(), config.plan.len());

    let tables = check_capacities(&assignments, config)?;
    check_zones(&assignments, config)?;

    Ok(SeatingOutcome {
        assignments,
        tables,
        groups,
        renames,
    })
}
