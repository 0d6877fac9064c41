use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::config::SeatingConfig;
use crate::error::{AllocationError, Result};
use super::types::{TableAssignment, TableTally};

/// Tallies seats per table and checks them against configured capacity
///
/// Returns one tally per configured table, in configuration order, empty tables included.
pub fn check_capacities(assignments: &[TableAssignment], config: &SeatingConfig) -> Result<Vec<TableTally>> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut seen_order: Vec<&str> = Vec::new();
    for assignment in assignments {
        let count = counts.entry(assignment.table_label.as_str()).or_insert_with(|| {
            seen_order.push(assignment.table_label.as_str());
            0
        });
        *count += 1;
    }

    for table in seen_order {
        let assigned = counts[table];
        match config.capacity_of(table) {
            None => {
                return Err(AllocationError::UnknownTable {
                    table: table.to_string(),
                    assigned,
                })
            }
            Some(capacity) if assigned > capacity => {
                return Err(AllocationError::OverCapacity {
                    table: table.to_string(),
                    assigned,
                    capacity,
                })
            }
            Some(_) => {}
        }
    }

    let tallies: Vec<TableTally> = config
        .tables
        .iter()
        .map(|t| TableTally::new(&t.table, counts.get(t.table.as_str()).copied().unwrap_or(0), t.seats))
        .collect();

    info!(
        "Capacity check passed: {} seats used across {} tables",
        assignments.len(),
        tallies.iter().filter(|t| t.assigned > 0).count()
    );

    Ok(tallies)
}

/// Checks every zone-restricted group landed only on tables inside its zones
pub fn check_zones(assignments: &[TableAssignment], config: &SeatingConfig) -> Result<()> {
    for rule in &config.zone_rules {
        let mut allowed: HashSet<&str> = HashSet::new();
        for name in &rule.zones {
            let zone = config.zone(name).ok_or_else(|| AllocationError::InvalidConfig {
                reason: format!("zone rule for group \"{}\" names unknown zone \"{}\"", rule.group, name),
            })?;
            allowed.extend(zone.tables.iter().map(String::as_str));
        }

        let mut tables: Vec<&str> = Vec::new();
        for assignment in assignments.iter().filter(|a| a.source_group == rule.group) {
            if !tables.contains(&assignment.table_label.as_str()) {
                tables.push(assignment.table_label.as_str());
            }
        }

        if let Some(table) = tables.into_iter().find(|t| !allowed.contains(t)) {
            return Err(AllocationError::ZoneViolation {
                group: rule.group.clone(),
                zone: rule.zones.join(" / "),
                table: table.to_string(),
            });
        }
    }

    info!("Zone check passed for {} constrained groups", config.zone_rules.len());
    Ok(())
}
