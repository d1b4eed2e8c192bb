//! Dashboard-facing rollups over a labeled employee table

use crate::structs::{LabeledEmployee, OrgUnitSummary, RiskBucket, RiskThresholds};
use std::collections::BTreeMap;

/// Attendance rate from absenteeism days: two points off per day, clamped
/// to 0..=100
#[must_use]
pub fn attendance_rate(absenteeism_days: f64) -> f64 {
    (100.0 - 2.0 * absenteeism_days).clamp(0.0, 100.0)
}

/// Ratio columns sometimes arrive as fractions; anything at or below 1 is
/// treated as a fraction and shown as a percentage
#[must_use]
pub fn display_percentage(value: f64) -> f64 {
    if value <= 1.0 {
        value * 100.0
    } else {
        value
    }
}

/// Renumber a model cluster id into the dashboard's display order
#[must_use]
pub fn display_cluster(cluster_id: usize) -> Option<usize> {
    const DISPLAY_ORDER: [usize; 4] = [1, 3, 4, 2];
    DISPLAY_ORDER.get(cluster_id).copied()
}

/// Friendly department name for a designation code
#[must_use]
pub fn department_name(designation: &str) -> &'static str {
    match designation {
        "AL" => "Management",
        "TDS" => "Technical Delivery",
        "SSE" => "Senior Engineering",
        "SE" => "Software Engineering",
        _ => "Other",
    }
}

impl RiskBucket {
    /// Bucket a group by its mean efficiency and attendance percentages
    #[must_use]
    pub fn from_metrics(efficiency: f64, attendance: f64, thresholds: &RiskThresholds) -> Self {
        if efficiency < thresholds.high_efficiency_below
            || attendance < thresholds.high_attendance_below
        {
            Self::High
        } else if efficiency < thresholds.medium_efficiency_below
            || attendance < thresholds.medium_attendance_below
        {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Group labeled rows by (designation, account code) and aggregate each
/// group's headcount, mean efficiency, attendance rate, and risk bucket.
/// Groups come back sorted by key, so output order is stable.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn organization_summary(
    rows: &[LabeledEmployee],
    thresholds: &RiskThresholds,
) -> Vec<OrgUnitSummary> {
    let mut groups: BTreeMap<(String, String), Vec<&LabeledEmployee>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.designation.clone(), row.account_code.clone()))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|((designation, account_code), members)| {
            let n = members.len() as f64;
            let mean_efficiency = members.iter().map(|m| m.efficiency).sum::<f64>() / n;
            let mean_absenteeism = members.iter().map(|m| m.absenteeism_days).sum::<f64>() / n;

            let efficiency = display_percentage(mean_efficiency);
            let attendance = attendance_rate(mean_absenteeism);
            let burnout_risk = RiskBucket::from_metrics(efficiency, attendance, thresholds);

            OrgUnitSummary {
                department: format!("{} ({account_code})", department_name(&designation)),
                account_code,
                designation,
                employees: members.len(),
                efficiency,
                attendance,
                burnout_risk,
            }
        })
        .collect()
}

/// Render the rollup and the behavior mix as a stdout table
#[must_use]
pub fn render_report(rows: &[LabeledEmployee], summaries: &[OrgUnitSummary]) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36} {:>9} {:>11} {:>11} {:>7}",
        "Department", "Employees", "Efficiency", "Attendance", "Risk"
    );
    for unit in summaries {
        let _ = writeln!(
            out,
            "{:<36} {:>9} {:>10.1}% {:>10.1}% {:>7}",
            unit.department, unit.employees, unit.efficiency, unit.attendance, unit.burnout_risk
        );
    }

    // Display ids keep the dashboard's color ordering
    let mut mix: BTreeMap<usize, (String, usize)> = BTreeMap::new();
    for row in rows {
        if let Some(display) = display_cluster(row.cluster) {
            let entry = mix
                .entry(display)
                .or_insert_with(|| (row.behavior_type.clone(), 0));
            entry.1 += 1;
        }
    }
    out.push('\n');
    out.push_str("Behavior mix:\n");
    for (display, (label, count)) in mix {
        let _ = writeln!(out, "  [{display}] {label}: {count}");
    }

    out
}
