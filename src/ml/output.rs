//! Output file writers for the training and scoring phases

use crate::structs::{LabeledEmployee, Result, TrainOutcome};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Labeled output table written after training
pub const PROCESSED_FILE: &str = "processed_attendance.csv";
/// Fitted k-means artifact
pub const MODEL_FILE: &str = "kmeans_model.json";
/// Fitted scaler artifact
pub const SCALER_FILE: &str = "scaler.json";
/// Human-readable run overview
pub const SUMMARY_FILE: &str = "summary.txt";

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("out"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write a file via a `.tmp` sibling and rename, so readers never observe
/// a half-written file
///
/// # Errors
/// Returns error if the write or the rename fails
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = tmp_path(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Write serde rows as CSV (atomic write); headers come from the row type
///
/// # Errors
/// Returns error if serialization or the write fails
pub fn write_csv_rows<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let tmp = tmp_path(path);
    let mut writer = csv::Writer::from_path(&tmp)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    drop(writer);
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Write the labeled employee table in the [`LabeledEmployee`] wire format
///
/// # Errors
/// Returns error if serialization or the write fails
pub fn write_labeled_csv(path: &Path, rows: &[LabeledEmployee]) -> Result<()> {
    write_csv_rows(path, rows)
}

/// Write `summary.txt` into the output directory
///
/// # Errors
/// Returns error if the file cannot be written
pub fn write_summary(output_dir: &Path, content: &str) -> Result<()> {
    write_atomic(&output_dir.join(SUMMARY_FILE), content)
}

/// Render the human-readable overview of one training run
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn build_summary(source: &Path, outcome: &TrainOutcome) -> String {
    use std::fmt::Write as _;

    let total = outcome.labeled.len();
    let mut content = String::from("Attendance clustering summary\n");
    let _ = writeln!(content, "Source: {}", source.display());
    let _ = writeln!(content, "Employees: {total}");
    let _ = writeln!(content, "Imputed cells: {}", outcome.imputed_cells);
    let _ = writeln!(
        content,
        "K-means: k={}, seed={}, inertia={:.4}",
        outcome.model.k, outcome.model.seed, outcome.model.inertia
    );
    content.push('\n');

    for profile in &outcome.profiles {
        let share = if total == 0 {
            0.0
        } else {
            profile.size as f64 / total as f64 * 100.0
        };
        let _ = writeln!(
            content,
            "Cluster {} ({}): {} employees ({share:.1}%)",
            profile.cluster_id, profile.label, profile.size
        );
        let _ = writeln!(
            content,
            "  in-time {:.2} hr, office {:.2} hr, efficiency {:.1}%, punctuality {:.2} hr, burnout {:.2} hr, leaves {:.1}",
            profile.mean_in_time_hr,
            profile.mean_office_hours,
            profile.mean_efficiency,
            profile.mean_punctuality,
            profile.mean_burnout_hours,
            profile.mean_total_leaves
        );
    }

    if !outcome.audit_warnings.is_empty() {
        content.push('\n');
        content.push_str("Warnings:\n");
        for warning in &outcome.audit_warnings {
            let _ = writeln!(content, "  {warning}");
        }
    }

    content
}
