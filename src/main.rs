use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use reception_seating::config::{DirectoryConfig, DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_DIR};
use reception_seating::directory::{apply_assignments, RestDirectory};
use reception_seating::display::{print_summary, write_reports, RunSummary};
use reception_seating::parser::load_attendees;
use reception_seating::{plan_seating, Result, SeatingConfig};

/// Seat reception attendees from the RSVP spreadsheet
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Seating spreadsheet (CSV export)
    input_path: Option<PathBuf>,

    /// Seating spreadsheet, overrides the positional path
    #[arg(long = "input")]
    input: Option<PathBuf>,

    /// JSON seating plan replacing the built-in reception plan
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Directory for the assignment CSV and summary JSON
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    out_dir: PathBuf,

    /// Write table labels to the guest directory
    #[arg(long)]
    apply: bool,

    /// Never write to the guest directory, even with --apply
    #[arg(long)]
    dry_run: bool,
}

async fn run(args: Args) -> Result<()> {
    let input = args
        .input
        .or(args.input_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_PATH));
    let apply = args.apply && !args.dry_run;

    let config = SeatingConfig::load(args.plan.as_deref())?;

    // Fail on missing credentials before doing any work
    let directory = if apply {
        Some(RestDirectory::new(DirectoryConfig::from_env()?))
    } else {
        None
    };

    println!("Loading attendees from {}...", input.display());
    let attendees = load_attendees(&input, &config)?;

    let outcome = plan_seating(attendees, &config)?;

    let updated_count = match &directory {
        Some(directory) => {
            info!("Applying {} assignments to the guest directory", outcome.assignments.len());
            apply_assignments(directory, &outcome.assignments, &config.aliases).await?
        }
        None => 0,
    };

    let summary = RunSummary::new(&input, &outcome, apply, updated_count);
    let paths = write_reports(&args.out_dir, &summary, &outcome.assignments)?;
    print_summary(&summary, &paths);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
