//! Writes table labels back to the guest directory.
//!
//! Every assignment has to resolve to exactly one directory guest before the first
//! write goes out. Writes are chunked to keep request bodies under the backend limit.
//! A failed batch stops the run, but batches already written stay written.

pub mod rest;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::NameAlias;
use crate::error::{AllocationError, Result};
use crate::seating::TableAssignment;

pub use rest::RestDirectory;

pub const APPLY_BATCH_SIZE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryGuest {
    pub id: String,
    pub full_name_norm: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableUpdate {
    pub id: String,
    pub table_label: String,
}

#[async_trait]
pub trait GuestDirectory: Send + Sync {
    async fn list_guests(&self) -> Result<Vec<DirectoryGuest>>;

    async fn update_tables(&self, batch: &[TableUpdate]) -> Result<()>;
}

/// Normalized directory names to guest ids
struct DirectoryIndex {
    ids: HashMap<String, Vec<String>>,
}

impl DirectoryIndex {
    fn new(guests: Vec<DirectoryGuest>) -> Self {
        let mut ids: HashMap<String, Vec<String>> = HashMap::new();
        for guest in guests {
            let key = normalize(&guest.full_name_norm);
            ids.entry(key).or_default().push(guest.id);
        }
        Self { ids }
    }

    /// A name only matches when exactly one directory guest carries it
    fn unique(&self, name: &str) -> Option<&str> {
        match self.ids.get(&normalize(name)).map(Vec::as_slice) {
            Some([id]) => Some(id.as_str()),
            Some(ids) if ids.len() > 1 => {
                warn!("{} matches {} directory guests, treating as unmatched", name, ids.len());
                None
            }
            _ => None,
        }
    }

    fn resolve(&self, name: &str, aliases: &[NameAlias]) -> Option<&str> {
        self.unique(name).or_else(|| {
            aliases_of(name, aliases)
                .into_iter()
                .find_map(|alias| self.unique(&alias))
        })
    }
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every alias paired with `name`, looking both ways
fn aliases_of(name: &str, aliases: &[NameAlias]) -> Vec<String> {
    let name = normalize(name);
    aliases
        .iter()
        .filter_map(|pair| {
            if normalize(&pair.name) == name {
                Some(pair.alias.clone())
            } else if normalize(&pair.alias) == name {
                Some(pair.name.clone())
            } else {
                None
            }
        })
        .collect()
}

/// Matches every assignment to a directory guest, failing with all unmatched names
pub fn match_assignments(
    assignments: &[TableAssignment],
    guests: Vec<DirectoryGuest>,
    aliases: &[NameAlias],
) -> Result<Vec<TableUpdate>> {
    let index = DirectoryIndex::new(guests);
    let mut updates = Vec::with_capacity(assignments.len());
    let mut unmatched = Vec::new();

    for assignment in assignments {
        match index.resolve(&assignment.full_name_norm, aliases) {
            Some(id) => updates.push(TableUpdate {
                id: id.to_string(),
                table_label: assignment.table_label.clone(),
            }),
            None => unmatched.push(assignment.full_name_norm.clone()),
        }
    }

    if !unmatched.is_empty() {
        return Err(AllocationError::UnmatchedAttendees { names: unmatched });
    }

    Ok(updates)
}

/// Writes every assignment's table to the directory, returning how many guests were updated
pub async fn apply_assignments(
    directory: &dyn GuestDirectory,
    assignments: &[TableAssignment],
    aliases: &[NameAlias],
) -> Result<usize> {
    let guests = directory.list_guests().await?;
    info!("Guest directory returned {} guests", guests.len());

    let updates = match_assignments(assignments, guests, aliases)?;

    let total_batches = updates.len().div_ceil(APPLY_BATCH_SIZE);
    for (batch, chunk) in updates.chunks(APPLY_BATCH_SIZE).enumerate() {
        directory
            .update_tables(chunk)
            .await
            .map_err(|e| AllocationError::BatchWrite {
                batch: batch + 1,
                reason: match e {
                    AllocationError::BatchWrite { reason, .. } => reason,
                    other => other.to_string(),
                },
            })?;
        info!("Wrote batch {}/{} ({} guests)", batch + 1, total_batches, chunk.len());
    }

    Ok(updates.len())
}
