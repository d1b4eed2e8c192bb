//! Attendance sheet ingestion and validation

use crate::structs::{AttendanceRecord, LabeledEmployee, PunchcardError, Result};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;

/// Columns the attendance sheet must carry; extra columns are ignored
pub const REQUIRED_COLUMNS: [&str; 16] = [
    "Fake_Id",
    "Name",
    "Designation",
    "Account_code",
    "Recruitment_Type",
    "Avg_In_Tim",
    "Avg_Office_hr",
    "Avg_Break_hr",
    "Avg_OOO_hr",
    "Avg_Bay_hr",
    "Avg_Cafeteria",
    "Half_Day",
    "Full_Day",
    "Online_Checkin",
    "Unbilled",
    "Unallocated",
];

/// Read and validate the raw attendance sheet.
///
/// Column matching is by header name, so column order and extra columns do
/// not matter. The whole file is rejected if required columns are missing,
/// if any `Fake_Id` repeats, or if there are no data rows.
///
/// # Errors
/// Returns error if the file cannot be parsed or fails validation
pub fn read_attendance(path: &Path, is_tsv: bool) -> Result<Vec<AttendanceRecord>> {
    let delimiter = if is_tsv { b'\t' } else { b',' };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)?;

    validate_headers(reader.headers()?)?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: AttendanceRecord = result?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(PunchcardError::Input(format!(
            "No employee rows in {}",
            path.display()
        )));
    }
    reject_duplicate_ids(&records)?;

    Ok(records)
}

fn validate_headers(headers: &csv::StringRecord) -> Result<()> {
    let present: HashSet<&str> = headers.iter().collect();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !present.contains(column))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PunchcardError::Input(format!(
            "Input sheet is missing required columns: {}",
            missing.join(", ")
        )))
    }
}

fn reject_duplicate_ids(records: &[AttendanceRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.employee_id.as_str()) {
            return Err(PunchcardError::Input(format!(
                "Duplicate Fake_Id '{}' in input",
                record.employee_id
            )));
        }
    }
    Ok(())
}

/// Read a labeled output table back, for reporting
///
/// # Errors
/// Returns error if the file cannot be parsed or has no rows
pub fn read_labeled(path: &Path) -> Result<Vec<LabeledEmployee>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows: Vec<LabeledEmployee> = reader
        .deserialize()
        .collect::<std::result::Result<_, csv::Error>>()?;

    if rows.is_empty() {
        return Err(PunchcardError::Input(format!(
            "No labeled rows in {}",
            path.display()
        )));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_HEADER: &str = "Fake_Id,Name,Designation,Account_code,Recruitment_Type,\
         Avg_In_Tim,Avg_Office_hr,Avg_Break_hr,Avg_OOO_hr,Avg_Bay_hr,Avg_Cafeteria,\
         Half_Day,Full_Day,Online_Checkin,Unbilled,Unallocated";

    fn create_test_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(content.as_bytes()).expect("write content");
        file
    }

    #[test]
    fn test_read_attendance_typed_fields() {
        let content = format!(
            "{FULL_HEADER}\n\
             E1,Alice,Engineer,A1,Lateral,09:30,09:45,01:00,00:15,08:00,00:30,1,2,3,Unbilled,No\n\
             E2,Bob,Analyst,A2,Campus,,,,,,,,,,,"
        );
        let file = create_test_file(&content);

        let records = read_attendance(file.path(), false).expect("read attendance");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].employee_id, "E1");
        assert_eq!(records[0].avg_in_time.as_deref(), Some("09:30"));
        assert_eq!(records[0].half_day, Some(1.0));
        assert_eq!(records[0].unbilled.as_deref(), Some("Unbilled"));

        // Fully blank row keeps identity but every measure is undefined
        assert_eq!(records[1].employee_id, "E2");
        assert_eq!(records[1].avg_in_time, None);
        assert_eq!(records[1].half_day, None);
        assert_eq!(records[1].unbilled, None);
    }

    #[test]
    fn test_read_attendance_tsv() {
        let content = format!(
            "{}\nE1\tAlice\tEngineer\tA1\tLateral\t09:30\t09:45\t01:00\t00:15\t08:00\t00:30\t1\t2\t3\t\t",
            FULL_HEADER.replace(',', "\t")
        );
        let file = create_test_file(&content);

        let records = read_attendance(file.path(), true).expect("read attendance");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].avg_office_hr.as_deref(), Some("09:45"));
    }

    #[test]
    fn test_missing_columns_are_all_named() {
        let content = "Fake_Id,Name\nE1,Alice";
        let file = create_test_file(content);

        let err = read_attendance(file.path(), false).expect_err("should fail");
        let message = err.to_string();
        assert!(message.contains("missing required columns"));
        assert!(message.contains("Designation"));
        assert!(message.contains("Unallocated"));
        assert!(!message.contains("Fake_Id,"));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let content = format!(
            "{FULL_HEADER},Shift\n\
             E1,Alice,Engineer,A1,Lateral,09:30,09:45,01:00,00:15,08:00,00:30,1,2,3,,No,Night"
        );
        let file = create_test_file(&content);

        let records = read_attendance(file.path(), false).expect("read attendance");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Alice");
    }

    #[test]
    fn test_duplicate_ids_are_fatal() {
        let content = format!(
            "{FULL_HEADER}\n\
             E1,Alice,Engineer,A1,Lateral,,,,,,,,,,,\n\
             E1,Bob,Analyst,A2,Campus,,,,,,,,,,,"
        );
        let file = create_test_file(&content);

        let err = read_attendance(file.path(), false).expect_err("should fail");
        assert!(err.to_string().contains("Duplicate Fake_Id 'E1'"));
    }

    #[test]
    fn test_header_only_file_is_rejected() {
        let file = create_test_file(FULL_HEADER);
        let err = read_attendance(file.path(), false).expect_err("should fail");
        assert!(err.to_string().contains("No employee rows"));
    }

    #[test]
    fn test_non_numeric_count_cell_is_fatal() {
        let content = format!(
            "{FULL_HEADER}\n\
             E1,Alice,Engineer,A1,Lateral,09:30,09:45,01:00,00:15,08:00,00:30,abc,2,3,,"
        );
        let file = create_test_file(&content);

        let err = read_attendance(file.path(), false).expect_err("should fail");
        assert!(err.to_string().contains("invalid number 'abc'"));
    }

    #[test]
    fn test_non_finite_count_cells_become_undefined() {
        let content = format!(
            "{FULL_HEADER}\n\
             E1,Alice,Engineer,A1,Lateral,09:30,09:45,01:00,00:15,08:00,00:30,nan,inf,3,,"
        );
        let file = create_test_file(&content);

        let records = read_attendance(file.path(), false).expect("read attendance");
        assert_eq!(records[0].half_day, None);
        assert_eq!(records[0].full_day, None);
        assert_eq!(records[0].online_checkin, Some(3.0));
    }

    #[test]
    fn test_read_labeled_rejects_empty_table() {
        let file = create_test_file("Fake_Id,Name\n");
        assert!(read_labeled(file.path()).is_err());
    }
}
