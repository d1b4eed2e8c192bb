#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::uninlined_format_args)]

mod ingest;
mod ml;
mod report;
mod structs;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use structs::{KMeansModel, PunchcardError, Result, RiskThresholds, StandardScaler};

/// punchcard - employee attendance clustering pipeline
#[derive(Parser, Debug)]
#[command(name = "punchcard")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fit the scaler and k-means model on an attendance sheet and label it
    Train {
        /// Input CSV/TSV attendance sheet
        #[arg(short, long)]
        csv: PathBuf,

        /// Output directory for the labeled table
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Output directory for model artifacts and the fit summary
        #[arg(short, long, default_value = "./models")]
        model_dir: PathBuf,

        /// Random seed for k-means initialization
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Treat input as TSV instead of CSV
        #[arg(long)]
        tsv: bool,

        /// Dry run - compute everything, write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Label new records with previously fitted artifacts (never refits)
    Score {
        /// Input CSV/TSV attendance sheet
        #[arg(short, long)]
        csv: PathBuf,

        /// Directory holding scaler.json and kmeans_model.json
        #[arg(short, long, default_value = "./models")]
        model_dir: PathBuf,

        /// Where to write the labeled CSV
        #[arg(short, long, default_value = "./scored_attendance.csv")]
        output: PathBuf,

        /// Treat input as TSV instead of CSV
        #[arg(long)]
        tsv: bool,
    },

    /// Summarize a labeled table into the organization rollup
    Report {
        /// Labeled CSV produced by train or score
        #[arg(short, long)]
        labeled: PathBuf,

        /// Write the rollup as CSV here instead of printing a table
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Some(Commands::Train {
            csv,
            data_dir,
            model_dir,
            seed,
            tsv,
            dry_run,
        }) => run_train(&csv, &data_dir, &model_dir, seed, tsv, dry_run),

        Some(Commands::Score {
            csv,
            model_dir,
            output,
            tsv,
        }) => run_score(&csv, &model_dir, &output, tsv),

        Some(Commands::Report { labeled, output }) => run_report(&labeled, output.as_deref()),

        None => {
            eprintln!("No subcommand provided. Use 'punchcard train', 'punchcard score', or 'punchcard report'.");
            eprintln!("Run 'punchcard --help' for usage information.");
            std::process::exit(1);
        }
    }
}

/// Run the training phase: fit, label, persist
fn run_train(
    csv_path: &Path,
    data_dir: &Path,
    model_dir: &Path,
    seed: u64,
    tsv: bool,
    dry_run: bool,
) -> Result<()> {
    // Validate input
    if !csv_path.exists() {
        return Err(PunchcardError::Config(format!(
            "Attendance sheet not found: {}",
            csv_path.display()
        )));
    }

    // Parse the attendance sheet
    eprintln!("Training on: {}", csv_path.display());
    let records = ingest::read_attendance(csv_path, tsv)?;
    eprintln!("Loaded {} employees", records.len());

    // Run the training pipeline
    eprintln!("Deriving features and fitting k-means...");
    let outcome = ml::pipeline::run_train(records, seed)?;
    eprintln!(
        "Fitted k={} (seed {}), inertia {:.4}, {} cells imputed",
        outcome.model.k, outcome.model.seed, outcome.model.inertia, outcome.imputed_cells
    );
    for profile in &outcome.profiles {
        eprintln!(
            "  cluster {} ({}): {} employees",
            profile.cluster_id, profile.label, profile.size
        );
    }

    if dry_run {
        eprintln!("Dry run - not writing outputs");
        return Ok(());
    }

    // Write output files; everything is computed by this point, so a
    // failure above leaves prior artifacts untouched
    eprintln!("Writing output files...");
    std::fs::create_dir_all(data_dir)?;
    std::fs::create_dir_all(model_dir)?;

    let labeled_path = data_dir.join(ml::output::PROCESSED_FILE);
    let scaler_path = model_dir.join(ml::output::SCALER_FILE);
    let model_path = model_dir.join(ml::output::MODEL_FILE);

    ml::output::write_labeled_csv(&labeled_path, &outcome.labeled)?;
    outcome.scaler.save(&scaler_path)?;
    outcome.model.save(&model_path)?;
    let summary = ml::output::build_summary(csv_path, &outcome);
    ml::output::write_summary(model_dir, &summary)?;

    eprintln!("Output written:");
    eprintln!("  - {}", labeled_path.display());
    eprintln!("  - {}", scaler_path.display());
    eprintln!("  - {}", model_path.display());
    eprintln!("  - {}", model_dir.join(ml::output::SUMMARY_FILE).display());

    Ok(())
}

/// Run the scoring phase: load artifacts, label a new batch
fn run_score(csv_path: &Path, model_dir: &Path, output: &Path, tsv: bool) -> Result<()> {
    // Validate paths
    if !csv_path.exists() {
        return Err(PunchcardError::Config(format!(
            "Attendance sheet not found: {}",
            csv_path.display()
        )));
    }
    let scaler_path = model_dir.join(ml::output::SCALER_FILE);
    let model_path = model_dir.join(ml::output::MODEL_FILE);
    if !scaler_path.exists() || !model_path.exists() {
        return Err(PunchcardError::Config(format!(
            "Model artifacts not found in {} (run 'punchcard train' first)",
            model_dir.display()
        )));
    }

    // Load the fitted artifacts
    let scaler = StandardScaler::load(&scaler_path)?;
    let model = KMeansModel::load(&model_path)?;
    eprintln!(
        "Loaded artifacts from {} (k={}, seed {})",
        model_dir.display(),
        model.k,
        model.seed
    );

    eprintln!("Scoring: {}", csv_path.display());
    let records = ingest::read_attendance(csv_path, tsv)?;
    eprintln!("Loaded {} employees", records.len());

    let labeled = ml::pipeline::run_score(records, &scaler, &model)?;
    ml::output::write_labeled_csv(output, &labeled)?;
    eprintln!("Labeled table written to {}", output.display());

    Ok(())
}

/// Run the reporting phase over a labeled table
fn run_report(labeled_path: &Path, output: Option<&Path>) -> Result<()> {
    // Validate input
    if !labeled_path.exists() {
        return Err(PunchcardError::Config(format!(
            "Labeled table not found: {}",
            labeled_path.display()
        )));
    }

    let rows = ingest::read_labeled(labeled_path)?;
    eprintln!("Loaded {} labeled employees", rows.len());

    let summaries = report::organization_summary(&rows, &RiskThresholds::default());
    if let Some(path) = output {
        ml::output::write_csv_rows(path, &summaries)?;
        eprintln!("Rollup written to {}", path.display());
    } else {
        print!("{}", report::render_report(&rows, &summaries));
    }

    Ok(())
}
