//! Consolidated public types for the punchcard crate
//!
//! This module contains all public structs, enums, and traits used across the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum PunchcardError {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input error: {0}")]
    Input(String),

    #[error("ML error: {0}")]
    Ml(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PunchcardError>;

// ============================================================================
// Input Types
// ============================================================================

/// One row of the raw attendance sheet, matched to the fixed column set by
/// header name. Duration-like columns stay as raw clock strings here; all
/// numeric interpretation happens during feature derivation.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "Fake_Id")]
    pub employee_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Designation")]
    pub designation: String,
    #[serde(rename = "Account_code")]
    pub account_code: String,
    #[serde(rename = "Recruitment_Type")]
    pub recruitment_type: String,
    #[serde(rename = "Avg_In_Tim")]
    pub avg_in_time: Option<String>,
    #[serde(rename = "Avg_Office_hr")]
    pub avg_office_hr: Option<String>,
    #[serde(rename = "Avg_Break_hr")]
    pub avg_break_hr: Option<String>,
    #[serde(rename = "Avg_OOO_hr")]
    pub avg_ooo_hr: Option<String>,
    #[serde(rename = "Avg_Bay_hr")]
    pub avg_bay_hr: Option<String>,
    #[serde(rename = "Avg_Cafeteria")]
    pub avg_cafeteria: Option<String>,
    #[serde(rename = "Half_Day", deserialize_with = "numeric_cell")]
    pub half_day: Option<f64>,
    #[serde(rename = "Full_Day", deserialize_with = "numeric_cell")]
    pub full_day: Option<f64>,
    #[serde(rename = "Online_Checkin", deserialize_with = "numeric_cell")]
    pub online_checkin: Option<f64>,
    #[serde(rename = "Unbilled")]
    pub unbilled: Option<String>,
    #[serde(rename = "Unallocated")]
    pub unallocated: Option<String>,
}

/// Count columns: empty cells are undefined, non-numeric cells fail the
/// file, and values that parse but are not finite count as undefined.
fn numeric_cell<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as _;

    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(cell) => {
            let value: f64 = cell
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid number '{cell}'")))?;
            Ok(value.is_finite().then_some(value))
        }
    }
}

// ============================================================================
// Feature Types
// ============================================================================

/// Numeric features derived from one attendance record.
///
/// `Option` fields are "undefined" until median imputation closes the gap;
/// the rest are always defined because their derivation rule zero-fills
/// missing inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeFeatures {
    pub avg_in_time_hr: Option<f64>,
    pub avg_office_hours: Option<f64>,
    pub avg_break_hours: Option<f64>,
    pub avg_ooo_hours: Option<f64>,
    pub bay_hours: Option<f64>,
    pub cafeteria_hours: Option<f64>,
    pub total_leaves: Option<f64>,
    pub online_checkin: Option<f64>,
    pub unbilled_flag: bool,
    pub unallocated_flag: bool,
    pub efficiency: f64,
    pub break_utilization: f64,
    pub punctuality: Option<f64>,
    pub absenteeism_days: f64,
    pub burnout_hours: f64,
}

/// Clustering features as a column-named table, one row per employee, with
/// undefined cells still visible. Row order matches the input order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub names: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl FeatureTable {
    /// Get number of rows (employees)
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Get number of feature columns
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    /// Get a feature column by index
    #[must_use]
    pub fn column(&self, index: usize) -> Option<Vec<Option<f64>>> {
        if index >= self.n_features() {
            return None;
        }
        Some(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Count undefined cells across the whole table
    #[must_use]
    pub fn undefined_cells(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| cell.is_none())
            .count()
    }
}

/// Dense numeric feature matrix (imputed, possibly standardized)
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    /// Feature names (column headers)
    pub names: Vec<String>,
    /// Row data as feature vectors
    pub data: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Get number of samples (rows)
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.data.len()
    }

    /// Get number of features (columns)
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    /// Get a feature column by index
    #[allow(dead_code)]
    #[must_use]
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.n_features() {
            return None;
        }
        Some(self.data.iter().map(|row| row[index]).collect())
    }

    /// Get a feature column by name
    #[allow(dead_code)]
    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.names.iter().position(|n| n == name)?;
        self.column(index)
    }

    /// Convert to flat `Vec<f64>` (row-major)
    #[must_use]
    pub fn to_flat(&self) -> Vec<f64> {
        self.data.iter().flatten().copied().collect()
    }
}

/// Fitted standardization parameters for the clustering features.
///
/// Carries the train-batch medians so the exact impute-then-standardize
/// transform can be replayed on new records without refitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub medians: Vec<f64>,
    pub means: Vec<f64>,
    pub std_devs: Vec<f64>,
}

// ============================================================================
// Clustering Types
// ============================================================================

/// The four fixed behavior archetypes, indexed by k-means cluster id.
///
/// The id-to-label table is static; an id is only meaningful alongside the
/// model artifact it was frozen into (see [`KMeansModel::labels`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorLabel {
    #[serde(rename = "Consistent Performer")]
    ConsistentPerformer,
    #[serde(rename = "Late Starter")]
    LateStarter,
    #[serde(rename = "Erratic / At-Risk")]
    ErraticAtRisk,
    #[serde(rename = "Silent Overworker")]
    SilentOverworker,
}

impl BehaviorLabel {
    /// Labels in cluster-id order: index `i` is the label for cluster `i`
    pub const ALL: [Self; 4] = [
        Self::ConsistentPerformer,
        Self::LateStarter,
        Self::ErraticAtRisk,
        Self::SilentOverworker,
    ];

    /// Static lookup from cluster id; `None` for ids outside the table
    #[must_use]
    pub fn from_cluster_id(id: usize) -> Option<Self> {
        Self::ALL.get(id).copied()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConsistentPerformer => "Consistent Performer",
            Self::LateStarter => "Late Starter",
            Self::ErraticAtRisk => "Erratic / At-Risk",
            Self::SilentOverworker => "Silent Overworker",
        }
    }
}

impl fmt::Display for BehaviorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portable fitted k-means model: enough state to assign new points to the
/// nearest centroid without the training library, plus the labels frozen
/// at fit time. Labels serialize as their display strings, so an artifact
/// naming an unknown archetype fails to load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeansModel {
    pub k: usize,
    pub seed: u64,
    /// Centroid coordinates in standardized feature space, k rows
    pub centroids: Vec<Vec<f64>>,
    pub inertia: f64,
    /// Label for cluster id `i` at `labels[i]`
    pub labels: Vec<BehaviorLabel>,
}

/// Per-cluster centroid characteristics over the imputed (unscaled)
/// features, used for the fit summary and the label-mapping audit.
#[derive(Debug, Clone)]
pub struct ClusterProfile {
    pub cluster_id: usize,
    pub label: BehaviorLabel,
    pub size: usize,
    pub mean_in_time_hr: f64,
    pub mean_office_hours: f64,
    pub mean_efficiency: f64,
    pub mean_punctuality: f64,
    pub mean_burnout_hours: f64,
    pub mean_total_leaves: f64,
}

// ============================================================================
// Output Types
// ============================================================================

/// One row of the labeled output table. The serde names and the field order
/// are the wire format downstream dashboards read; do not reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledEmployee {
    #[serde(rename = "Fake_Id")]
    pub employee_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Designation")]
    pub designation: String,
    #[serde(rename = "Account_code")]
    pub account_code: String,
    #[serde(rename = "Recruitment_Type")]
    pub recruitment_type: String,
    #[serde(rename = "Avg_In_Tim")]
    pub avg_in_time: Option<String>,
    #[serde(rename = "Avg_Office_hr")]
    pub avg_office_hr: Option<String>,
    #[serde(rename = "Avg_Break_hr")]
    pub avg_break_hr: Option<String>,
    #[serde(rename = "Avg_OOO_hr")]
    pub avg_ooo_hr: Option<String>,
    #[serde(rename = "Avg_Bay_hr")]
    pub avg_bay_hr: Option<String>,
    #[serde(rename = "Avg_Cafeteria")]
    pub avg_cafeteria: Option<String>,
    #[serde(rename = "Half_Day")]
    pub half_day: Option<f64>,
    #[serde(rename = "Full_Day")]
    pub full_day: Option<f64>,
    #[serde(rename = "Online_Checkin")]
    pub online_checkin: Option<f64>,
    #[serde(rename = "Unbilled")]
    pub unbilled: Option<String>,
    #[serde(rename = "Unallocated")]
    pub unallocated: Option<String>,
    pub avg_in_time_hr: Option<f64>,
    pub avg_office_hours: Option<f64>,
    pub avg_break_hours: Option<f64>,
    pub avg_ooo_hours: Option<f64>,
    pub total_leaves: Option<f64>,
    pub unbilled_flag: u8,
    pub unallocated_flag: u8,
    pub bay_hours: Option<f64>,
    pub cafeteria_hours: Option<f64>,
    pub efficiency: f64,
    pub break_utilization: f64,
    pub punctuality: Option<f64>,
    pub absenteeism_days: f64,
    pub burnout_hours: f64,
    #[serde(rename = "Cluster")]
    pub cluster: usize,
    #[serde(rename = "Behavior_Type")]
    pub behavior_type: String,
}

impl LabeledEmployee {
    /// Merge a raw record, its derived features, and its cluster assignment
    /// into one output row
    #[must_use]
    pub fn from_parts(
        record: AttendanceRecord,
        features: &EmployeeFeatures,
        cluster: usize,
        behavior_type: String,
    ) -> Self {
        Self {
            employee_id: record.employee_id,
            name: record.name,
            designation: record.designation,
            account_code: record.account_code,
            recruitment_type: record.recruitment_type,
            avg_in_time: record.avg_in_time,
            avg_office_hr: record.avg_office_hr,
            avg_break_hr: record.avg_break_hr,
            avg_ooo_hr: record.avg_ooo_hr,
            avg_bay_hr: record.avg_bay_hr,
            avg_cafeteria: record.avg_cafeteria,
            half_day: record.half_day,
            full_day: record.full_day,
            online_checkin: record.online_checkin,
            unbilled: record.unbilled,
            unallocated: record.unallocated,
            avg_in_time_hr: features.avg_in_time_hr,
            avg_office_hours: features.avg_office_hours,
            avg_break_hours: features.avg_break_hours,
            avg_ooo_hours: features.avg_ooo_hours,
            total_leaves: features.total_leaves,
            unbilled_flag: u8::from(features.unbilled_flag),
            unallocated_flag: u8::from(features.unallocated_flag),
            bay_hours: features.bay_hours,
            cafeteria_hours: features.cafeteria_hours,
            efficiency: features.efficiency,
            break_utilization: features.break_utilization,
            punctuality: features.punctuality,
            absenteeism_days: features.absenteeism_days,
            burnout_hours: features.burnout_hours,
            cluster,
            behavior_type,
        }
    }
}

/// Everything a successful training run produces, before anything is written
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub labeled: Vec<LabeledEmployee>,
    pub scaler: StandardScaler,
    pub model: KMeansModel,
    pub profiles: Vec<ClusterProfile>,
    pub audit_warnings: Vec<String>,
    pub imputed_cells: usize,
}

// ============================================================================
// Report Types
// ============================================================================

/// Burnout-risk bucket derived from efficiency and attendance percentages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl RiskBucket {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket boundaries, kept explicit rather than inlined at the comparison
/// sites. Defaults: High below 60% efficiency or 85% attendance, Medium
/// below 75% or 90%.
#[derive(Debug, Clone)]
pub struct RiskThresholds {
    pub high_efficiency_below: f64,
    pub high_attendance_below: f64,
    pub medium_efficiency_below: f64,
    pub medium_attendance_below: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high_efficiency_below: 60.0,
            high_attendance_below: 85.0,
            medium_efficiency_below: 75.0,
            medium_attendance_below: 90.0,
        }
    }
}

/// Aggregated view of one (designation, account) group in the labeled table
#[derive(Debug, Clone, Serialize)]
pub struct OrgUnitSummary {
    pub department: String,
    pub account_code: String,
    pub designation: String,
    pub employees: usize,
    pub efficiency: f64,
    pub attendance: f64,
    pub burnout_risk: RiskBucket,
}
