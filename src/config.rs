use std::collections::HashSet;
use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AllocationError, Result};
use crate::seating::PlanSegment;

pub const DEFAULT_INPUT_PATH: &str = "data/reception_seating.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCapacity {
    pub table: String,
    pub seats: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupExpectation {
    pub group: String,
    pub expected: usize,
}

/// A named set of table labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub tables: Vec<String>,
}

/// Restricts a source group to the tables of the listed zones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRule {
    pub group: String,
    pub zones: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenameStrategy {
    /// The duplicate sharing the related attendee's status fingerprint is the junior
    ByRelatedFingerprint { related: String },
    /// The later row is the junior
    LatestLineNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRule {
    /// Normalized full name shared by the two duplicates
    pub name: String,
    pub strategy: RenameStrategy,
}

/// Spreadsheet name and directory name for the same person. Matched both ways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAlias {
    pub name: String,
    pub alias: String,
}

/// Static seating configuration for one reception
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingConfig {
    pub plan: Vec<PlanSegment>,
    pub tables: Vec<TableCapacity>,
    pub expected_groups: Vec<GroupExpectation>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub zone_rules: Vec<ZoneRule>,
    #[serde(default)]
    pub renames: Vec<RenameRule>,
    #[serde(default)]
    pub aliases: Vec<NameAlias>,
    #[serde(default = "default_attending_column")]
    pub attending_column: Option<String>,
    #[serde(default = "default_fingerprint_columns")]
    pub fingerprint_columns: Vec<String>,
}

fn default_attending_column() -> Option<String> {
    Some("Reception".to_string())
}

fn default_fingerprint_columns() -> Vec<String> {
    ["Welcome Party", "Ceremony", "Reception", "Meal"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

impl SeatingConfig {
    /// Loads a JSON plan file, or the built-in reception plan when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| AllocationError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let config: SeatingConfig =
                    serde_json::from_str(&raw).map_err(|source| AllocationError::ConfigParse {
                        path: path.to_path_buf(),
                        source,
                    })?;
                info!("Loaded seating plan from {}", path.display());
                config
            }
            None => {
                info!("No plan file given, using built-in reception plan");
                Self::reception()
            }
        };

        config.check()?;
        Ok(config)
    }

    /// The reception floor plan: 82 guests at the sweetheart table and eight rounds of ten,
    /// with Table 9 left open
    pub fn reception() -> Self {
        let plan = vec![
            PlanSegment::new("Sweetheart Table", "", 2),
            PlanSegment::new("Table 1", "Kara", 10),
            PlanSegment::new("Table 2", "Kara", 8),
            PlanSegment::new("Table 2", "Friends", 2),
            PlanSegment::new("Table 3", "Family", 10),
            PlanSegment::new("Table 4", "Family", 10),
            PlanSegment::new("Table 5", "Work", 10),
            PlanSegment::new("Table 6", "Work", 4),
            PlanSegment::new("Table 6", "College", 6),
            PlanSegment::new("Table 7", "College", 10),
            PlanSegment::new("Table 8", "Friends", 10),
        ];

        let mut tables = vec![TableCapacity {
            table: "Sweetheart Table".to_string(),
            seats: 2,
        }];
        tables.extend((1..=9).map(|n| TableCapacity {
            table: format!("Table {}", n),
            seats: 10,
        }));

        let expected_groups = [
            ("", 2),
            ("Kara", 18),
            ("Family", 20),
            ("Work", 14),
            ("College", 16),
            ("Friends", 12),
        ]
        .iter()
        .map(|(group, expected)| GroupExpectation {
            group: group.to_string(),
            expected: *expected,
        })
        .collect();

        let zone = |name: &str, tables: &[&str]| Zone {
            name: name.to_string(),
            tables: tables.iter().map(|t| t.to_string()).collect(),
        };
        let rule = |group: &str, zone: &str| ZoneRule {
            group: group.to_string(),
            zones: vec![zone.to_string()],
        };

        Self {
            plan,
            tables,
            expected_groups,
            zones: vec![
                zone("left zone", &["Table 5", "Table 6", "Table 7"]),
                zone("right cluster", &["Table 1", "Table 2", "Table 8"]),
            ],
            zone_rules: vec![
                rule("Work", "left zone"),
                rule("College", "left zone"),
                rule("Kara", "right cluster"),
            ],
            renames: vec![
                RenameRule {
                    name: "stephen boyd".to_string(),
                    strategy: RenameStrategy::ByRelatedFingerprint {
                        related: "sarah boyd".to_string(),
                    },
                },
                RenameRule {
                    name: "robert kidd".to_string(),
                    strategy: RenameStrategy::LatestLineNumber,
                },
            ],
            aliases: vec![NameAlias {
                name: "kate sullivan".to_string(),
                alias: "katherine sullivan".to_string(),
            }],
            attending_column: default_attending_column(),
            fingerprint_columns: default_fingerprint_columns(),
        }
    }

    /// Rejects configuration that can never produce a valid chart
    pub fn check(&self) -> Result<()> {
        let invalid = |reason: String| Err(AllocationError::InvalidConfig { reason });

        if let Some(segment) = self.plan.iter().find(|s| s.seats == 0) {
            return invalid(format!(
                "plan segment for group \"{}\" at {} has zero seats",
                segment.group, segment.table
            ));
        }

        let mut tables = HashSet::new();
        for capacity in &self.tables {
            if !tables.insert(capacity.table.as_str()) {
                return invalid(format!("table \"{}\" is listed twice", capacity.table));
            }
        }

        let mut groups = HashSet::new();
        for expectation in &self.expected_groups {
            if !groups.insert(expectation.group.as_str()) {
                return invalid(format!(
                    "group \"{}\" has more than one expected count",
                    expectation.group
                ));
            }
        }

        for rule in &self.zone_rules {
            if rule.zones.is_empty() {
                return invalid(format!("zone rule for group \"{}\" names no zones", rule.group));
            }
            for zone in &rule.zones {
                if !self.zones.iter().any(|z| &z.name == zone) {
                    return invalid(format!(
                        "zone rule for group \"{}\" names unknown zone \"{}\"",
                        rule.group, zone
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn capacity_of(&self, table: &str) -> Option<usize> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.seats)
    }

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }
}

/// Where the guest directory lives, loaded from the environment
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub url: String,
    pub api_key: String,
    pub table: String,
}

impl DirectoryConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: require("GUEST_DIRECTORY_URL")?,
            api_key: require("GUEST_DIRECTORY_KEY")?,
            table: try_load("GUEST_DIRECTORY_TABLE", "guests"),
        })
    }
}

fn require(key: &str) -> Result<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AllocationError::MissingEnv {
            key: key.to_string(),
        })
}

fn try_load(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_plan_is_consistent() {
        let config = SeatingConfig::reception();
        config.check().unwrap();

        let planned: usize = config.plan.iter().map(|s| s.seats).sum();
        let expected: usize = config.expected_groups.iter().map(|g| g.expected).sum();
        assert_eq!(planned, expected);

        for segment in &config.plan {
            assert!(config.capacity_of(&segment.table).is_some(), "{}", segment.table);
        }
    }

    #[test]
    fn rejects_rule_with_unknown_zone() {
        let mut config = SeatingConfig::reception();
        config.zone_rules.push(ZoneRule {
            group: "Family".into(),
            zones: vec!["patio".into()],
        });

        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("unknown zone \"patio\""), "{err}");
    }

    #[test]
    fn rejects_zero_seat_segment() {
        let mut config = SeatingConfig::reception();
        config.plan.push(PlanSegment::new("Table 9", "Work", 0));
        assert!(matches!(config.check(), Err(AllocationError::InvalidConfig { .. })));
    }

    #[test]
    fn loads_plan_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let json = r#"{
            "plan": [{ "table": "Table 1", "group": "Work", "seats": 2 }],
            "tables": [{ "table": "Table 1", "seats": 8 }],
            "expected_groups": [{ "group": "Work", "expected": 2 }],
            "renames": [{ "name": "robert kidd", "strategy": { "kind": "latest_line_number" } }]
        }"#;
        fs::write(&path, json).unwrap();

        let config = SeatingConfig::load(Some(&path)).unwrap();
        assert_eq!(config.plan, vec![PlanSegment::new("Table 1", "Work", 2)]);
        assert_eq!(config.renames[0].strategy, RenameStrategy::LatestLineNumber);
        assert_eq!(config.attending_column.as_deref(), Some("Reception"));
        assert!(config.zones.is_empty());
    }

    #[test]
    fn malformed_plan_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            SeatingConfig::load(Some(&path)),
            Err(AllocationError::ConfigParse { .. })
        ));
    }
}
