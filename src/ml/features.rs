use crate::structs::{AttendanceRecord, EmployeeFeatures, FeatureTable};

/// Nominal workday start, the anchor for the punctuality deviation
pub const NOMINAL_START_HR: f64 = 9.0;

/// Average office hours above this count toward burnout
pub const BURNOUT_THRESHOLD_HRS: f64 = 9.0;

/// Feature columns the clustering model trains on, in model order.
/// The scaler and the model artifacts both record this order; changing it
/// invalidates previously saved artifacts.
pub const CLUSTER_FEATURES: [&str; 12] = [
    "avg_in_time_hr",
    "avg_office_hours",
    "avg_break_hours",
    "avg_ooo_hours",
    "total_leaves",
    "Online_Checkin",
    "unbilled_flag",
    "unallocated_flag",
    "efficiency",
    "break_utilization",
    "punctuality",
    "burnout_hours",
];

/// Parse a clock-style duration string ("HH:MM", with an optional ignored
/// seconds part) into fractional hours. A bare number is taken as whole
/// hours. Returns `None` for empty, non-numeric, or non-finite input.
#[must_use]
pub fn parse_clock_hours(raw: &str) -> Option<f64> {
    let mut parts = raw.split(':');
    let hours: f64 = parts.next()?.trim().parse().ok()?;
    let minutes: f64 = match parts.next() {
        Some(m) => m.trim().parse().ok()?,
        None => 0.0,
    };
    let value = hours + minutes / 60.0;
    value.is_finite().then_some(value)
}

fn parse_opt_clock(raw: Option<&str>) -> Option<f64> {
    raw.and_then(parse_clock_hours)
}

/// Flag columns are set by trimmed, case-insensitive equality with one
/// marker word; anything else (including a missing cell) is unset.
fn flag_is_set(raw: Option<&str>, marker: &str) -> bool {
    raw.is_some_and(|s| s.trim().eq_ignore_ascii_case(marker))
}

/// Ratio that is exactly 0 when the denominator is missing or not
/// positive; a missing numerator counts as 0.
fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> f64 {
    match denominator {
        Some(d) if d > 0.0 => numerator.unwrap_or(0.0) / d,
        _ => 0.0,
    }
}

impl EmployeeFeatures {
    /// Derive the numeric feature set from one raw record.
    ///
    /// Pure per-row computation; no batch statistics are involved, so the
    /// result for a record never depends on the rest of the file.
    #[must_use]
    pub fn derive(record: &AttendanceRecord) -> Self {
        let avg_in_time_hr = parse_opt_clock(record.avg_in_time.as_deref());
        let avg_office_hours = parse_opt_clock(record.avg_office_hr.as_deref());
        let avg_break_hours = parse_opt_clock(record.avg_break_hr.as_deref());
        let avg_ooo_hours = parse_opt_clock(record.avg_ooo_hr.as_deref());
        let bay_hours = parse_opt_clock(record.avg_bay_hr.as_deref());
        let cafeteria_hours = parse_opt_clock(record.avg_cafeteria.as_deref());

        // Undefined if either leave count is missing; absenteeism below
        // zero-fills instead, so the two disagree on sparse rows on purpose
        let total_leaves = match (record.half_day, record.full_day) {
            (Some(half), Some(full)) => Some(half + full),
            _ => None,
        };

        let unbilled_flag = flag_is_set(record.unbilled.as_deref(), "unbilled");
        let unallocated_flag = flag_is_set(record.unallocated.as_deref(), "yes");

        // Efficiency reads as a percentage, break utilization as a ratio
        let efficiency = safe_ratio(bay_hours, avg_office_hours) * 100.0;
        let break_utilization = safe_ratio(avg_break_hours, avg_office_hours);

        let punctuality = avg_in_time_hr.map(|t| (t - NOMINAL_START_HR).abs());
        let absenteeism_days =
            record.full_day.unwrap_or(0.0) + 0.5 * record.half_day.unwrap_or(0.0);
        let burnout_hours = (avg_office_hours.unwrap_or(0.0) - BURNOUT_THRESHOLD_HRS).max(0.0);

        Self {
            avg_in_time_hr,
            avg_office_hours,
            avg_break_hours,
            avg_ooo_hours,
            bay_hours,
            cafeteria_hours,
            total_leaves,
            online_checkin: record.online_checkin,
            unbilled_flag,
            unallocated_flag,
            efficiency,
            break_utilization,
            punctuality,
            absenteeism_days,
            burnout_hours,
        }
    }

    /// The clustering features for this employee, in [`CLUSTER_FEATURES`]
    /// order, with undefined values still visible
    #[must_use]
    pub fn cluster_row(&self) -> Vec<Option<f64>> {
        vec![
            self.avg_in_time_hr,
            self.avg_office_hours,
            self.avg_break_hours,
            self.avg_ooo_hours,
            self.total_leaves,
            self.online_checkin,
            Some(f64::from(u8::from(self.unbilled_flag))),
            Some(f64::from(u8::from(self.unallocated_flag))),
            Some(self.efficiency),
            Some(self.break_utilization),
            self.punctuality,
            Some(self.burnout_hours),
        ]
    }
}

impl FeatureTable {
    /// Assemble the clustering table from per-employee features, preserving
    /// input order
    #[must_use]
    pub fn from_features(features: &[EmployeeFeatures]) -> Self {
        Self {
            names: CLUSTER_FEATURES.iter().map(|s| (*s).to_string()).collect(),
            rows: features.iter().map(EmployeeFeatures::cluster_row).collect(),
        }
    }
}
