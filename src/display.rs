use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use csv::WriterBuilder;
use serde::Serialize;

use crate::error::{AllocationError, Result};
use crate::seating::{GroupCount, RenameAudit, SeatingOutcome, TableAssignment, TableTally};

pub const ASSIGNMENTS_FILE: &str = "seating_assignments.csv";
pub const SUMMARY_FILE: &str = "seating_summary.json";

/// Everything the JSON summary file records about one run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub input_path: String,
    pub total_assigned: usize,
    pub tables: Vec<TableTally>,
    pub groups: Vec<GroupCount>,
    pub apply: bool,
    pub updated_count: usize,
    pub renames: Vec<RenameAudit>,
    pub generated_at: String,
}

impl RunSummary {
    pub fn new(input_path: &Path, outcome: &SeatingOutcome, apply: bool, updated_count: usize) -> Self {
        Self {
            input_path: input_path.display().to_string(),
            total_assigned: outcome.assignments.len(),
            tables: outcome.tables.clone(),
            groups: outcome.groups.clone(),
            apply,
            updated_count,
            renames: outcome.renames.clone(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Paths of the report files written for a run
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub assignments: PathBuf,
    pub summary: PathBuf,
}

fn report_error(path: &Path) -> impl Fn(std::io::Error) -> AllocationError + '_ {
    move |source| AllocationError::Report {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes one row per seated attendee, in allocation order
pub fn write_assignments_csv(assignments: &[TableAssignment], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(report_error(path))?;
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(file);

    let csv_error = |e: csv::Error| AllocationError::Report {
        path: path.to_path_buf(),
        source: e.into(),
    };

    wtr.write_record(["tableLabel", "sourceGroup", "firstName", "lastName", "fullNameNorm", "lineNumber"])
        .map_err(csv_error)?;
    for a in assignments {
        let line = a.line_number.to_string();
        wtr.write_record([
            a.table_label.as_str(),
            a.source_group.as_str(),
            a.first_name.as_str(),
            a.last_name.as_str(),
            a.full_name_norm.as_str(),
            line.as_str(),
        ])
        .map_err(csv_error)?;
    }

    wtr.flush().map_err(report_error(path))?;
    Ok(())
}

pub fn write_summary_json(summary: &RunSummary, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(report_error(path))?;
    let json = serde_json::to_string_pretty(summary)?;
    writeln!(file, "{}", json).map_err(report_error(path))?;
    Ok(())
}

/// Writes both report files into `out_dir`, creating it if needed
pub fn write_reports(out_dir: &Path, summary: &RunSummary, assignments: &[TableAssignment]) -> Result<ReportPaths> {
    fs::create_dir_all(out_dir).map_err(report_error(out_dir))?;

    let paths = ReportPaths {
        assignments: out_dir.join(ASSIGNMENTS_FILE),
        summary: out_dir.join(SUMMARY_FILE),
    };
    write_assignments_csv(assignments, &paths.assignments)?;
    write_summary_json(summary, &paths.summary)?;

    Ok(paths)
}

/// Formats a group label, naming the sweetheart bucket
pub fn format_group(group: &str) -> &str {
    if group.is_empty() {
        "(sweetheart)"
    } else {
        group
    }
}

/// Prints the run summary in a readable format
pub fn print_summary(summary: &RunSummary, paths: &ReportPaths) {
    println!("\n=== Seating Plan ===");
    println!("Validated attendees: {}", summary.total_assigned);
    println!("Input: {}", summary.input_path);
    println!("Mode: {}", if summary.apply { "apply" } else { "dry-run" });

    println!("\nSeats by table:");
    for table in &summary.tables {
        println!(
            "  {:<18} {:>3}/{:<3} ({} open)",
            table.table, table.assigned, table.capacity, table.open_seats
        );
    }

    println!("\nAttendees by group:");
    for group in &summary.groups {
        println!("  {:<18} {:>3}", format_group(&group.group), group.count);
    }

    let applied: Vec<&RenameAudit> = summary.renames.iter().filter(|r| r.applied).collect();
    if !applied.is_empty() {
        println!("\nRenamed duplicates:");
        for rename in applied {
            println!(
                "  {} -> line {} ({})",
                rename.name,
                rename.line_number.unwrap_or(0),
                rename.reason
            );
        }
    }

    if summary.apply {
        println!("\nUpdated directory guests: {}", summary.updated_count);
    }

    println!("\nReports saved to:");
    println!("  - {}", paths.assignments.display());
    println!("  - {}", paths.summary.display());
}
