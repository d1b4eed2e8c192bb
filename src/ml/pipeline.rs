//! Training and scoring pipelines that tie feature engineering, scaling,
//! and clustering together

use crate::structs::{
    AttendanceRecord, EmployeeFeatures, FeatureTable, KMeansModel, LabeledEmployee, Result,
    StandardScaler, TrainOutcome,
};

/// Fit the scaler and the clustering model on one attendance batch and
/// label every employee in it.
///
/// All computation happens here; nothing is written to disk. Identical
/// input and seed give identical output.
///
/// # Errors
/// Returns error if scaling or clustering fails
pub fn run_train(records: Vec<AttendanceRecord>, seed: u64) -> Result<TrainOutcome> {
    let derived: Vec<EmployeeFeatures> = records.iter().map(EmployeeFeatures::derive).collect();
    let table = FeatureTable::from_features(&derived);
    let imputed_cells = table.undefined_cells();

    let scaler = StandardScaler::fit(&table)?;
    let imputed = scaler.impute(&table)?;
    let standardized = scaler.transform(&imputed)?;

    let model = super::clustering::fit_kmeans(&standardized, seed)?;
    let assignments = model.predict(&standardized)?;

    // Profiles read from the imputed matrix so the means are in real units
    let profiles = super::clustering::build_profiles(&model, &imputed, &assignments)?;
    let audit_warnings = super::clustering::audit_label_mapping(&profiles);
    for warning in &audit_warnings {
        eprintln!("Warning: {warning}");
    }

    let labeled = label_records(records, &derived, &assignments, &model)?;

    Ok(TrainOutcome {
        labeled,
        scaler,
        model,
        profiles,
        audit_warnings,
        imputed_cells,
    })
}

/// Label a new batch with previously fitted artifacts. The scaler's stored
/// medians close any gaps, so nothing is refit here.
///
/// # Errors
/// Returns error if the batch does not line up with the artifacts
pub fn run_score(
    records: Vec<AttendanceRecord>,
    scaler: &StandardScaler,
    model: &KMeansModel,
) -> Result<Vec<LabeledEmployee>> {
    let derived: Vec<EmployeeFeatures> = records.iter().map(EmployeeFeatures::derive).collect();
    let table = FeatureTable::from_features(&derived);

    let standardized = scaler.impute_and_transform(&table)?;
    let assignments = model.predict(&standardized)?;

    label_records(records, &derived, &assignments, model)
}

fn label_records(
    records: Vec<AttendanceRecord>,
    derived: &[EmployeeFeatures],
    assignments: &[usize],
    model: &KMeansModel,
) -> Result<Vec<LabeledEmployee>> {
    let mut labeled = Vec::with_capacity(records.len());
    for ((record, features), &cluster) in records
        .into_iter()
        .zip(derived.iter())
        .zip(assignments.iter())
    {
        let label = model.label_for(cluster)?.to_string();
        labeled.push(LabeledEmployee::from_parts(record, features, cluster, label));
    }
    Ok(labeled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::BehaviorLabel;

    #[allow(clippy::too_many_arguments)]
    fn record(
        id: &str,
        in_time: Option<&str>,
        office: Option<&str>,
        break_hr: Option<&str>,
        bay: Option<&str>,
        half: Option<f64>,
        full: Option<f64>,
        checkin: Option<f64>,
        unbilled: Option<&str>,
    ) -> AttendanceRecord {
        AttendanceRecord {
            employee_id: id.to_string(),
            name: format!("Employee {id}"),
            designation: "Engineer".to_string(),
            account_code: "ACC1".to_string(),
            recruitment_type: "Lateral".to_string(),
            avg_in_time: in_time.map(str::to_string),
            avg_office_hr: office.map(str::to_string),
            avg_break_hr: break_hr.map(str::to_string),
            avg_ooo_hr: Some("00:15".to_string()),
            avg_bay_hr: bay.map(str::to_string),
            avg_cafeteria: Some("00:30".to_string()),
            half_day: half,
            full_day: full,
            online_checkin: checkin,
            unbilled: unbilled.map(str::to_string),
            unallocated: None,
        }
    }

    /// Eight employees in four sharply distinct behavior patterns
    fn archetype_batch() -> Vec<AttendanceRecord> {
        vec![
            // Early, efficient, no leave
            record(
                "E1",
                Some("08:55"),
                Some("09:00"),
                Some("00:30"),
                Some("08:00"),
                Some(0.0),
                Some(0.0),
                Some(0.0),
                None,
            ),
            record(
                "E2",
                Some("09:00"),
                Some("09:00"),
                Some("00:30"),
                Some("08:00"),
                Some(0.0),
                Some(0.0),
                Some(0.0),
                None,
            ),
            // Very late arrivals
            record(
                "E3",
                Some("11:30"),
                Some("08:00"),
                Some("01:00"),
                Some("05:00"),
                Some(0.0),
                Some(1.0),
                Some(1.0),
                None,
            ),
            record(
                "E4",
                Some("11:25"),
                Some("08:00"),
                Some("01:00"),
                Some("05:00"),
                Some(0.0),
                Some(1.0),
                Some(1.0),
                None,
            ),
            // Sparse and absent: no in-time at all, heavy leave, unbilled
            record(
                "E5",
                None,
                Some("05:00"),
                Some("02:00"),
                Some("01:30"),
                Some(4.0),
                Some(6.0),
                Some(8.0),
                Some("Unbilled"),
            ),
            record(
                "E6",
                None,
                Some("05:00"),
                Some("02:00"),
                Some("01:30"),
                Some(4.0),
                Some(6.0),
                Some(8.0),
                Some("Unbilled"),
            ),
            // Overstaying
            record(
                "E7",
                Some("08:45"),
                Some("12:30"),
                Some("00:30"),
                Some("11:00"),
                Some(0.0),
                Some(0.0),
                Some(0.0),
                None,
            ),
            record(
                "E8",
                Some("08:50"),
                Some("12:30"),
                Some("00:30"),
                Some("11:00"),
                Some(0.0),
                Some(0.0),
                Some(0.0),
                None,
            ),
        ]
    }

    #[test]
    fn test_train_labels_every_employee() {
        let outcome = run_train(archetype_batch(), 42).expect("train");

        assert_eq!(outcome.labeled.len(), 8);
        for row in &outcome.labeled {
            assert!(row.cluster < 4);
            let label = BehaviorLabel::from_cluster_id(row.cluster).expect("label");
            assert_eq!(row.behavior_type, label.as_str());
        }
        // Four behavior pairs, four clusters
        let sizes: Vec<usize> = outcome.profiles.iter().map(|p| p.size).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 8);
        for pair in outcome.labeled.chunks(2) {
            assert_eq!(pair[0].cluster, pair[1].cluster);
        }
    }

    #[test]
    fn test_train_is_deterministic() {
        let first = run_train(archetype_batch(), 42).expect("train");
        let second = run_train(archetype_batch(), 42).expect("train");

        assert_eq!(first.model.centroids, second.model.centroids);
        let first_clusters: Vec<usize> = first.labeled.iter().map(|r| r.cluster).collect();
        let second_clusters: Vec<usize> = second.labeled.iter().map(|r| r.cluster).collect();
        assert_eq!(first_clusters, second_clusters);
        assert_eq!(first.scaler.medians, second.scaler.medians);
    }

    #[test]
    fn test_imputed_cells_are_counted_but_output_keeps_gaps() {
        let outcome = run_train(archetype_batch(), 42).expect("train");

        // E5 and E6 have no in-time: avg_in_time_hr and punctuality are
        // undefined for both, so at least 4 cells were imputed
        assert!(outcome.imputed_cells >= 4);
        let e5 = outcome
            .labeled
            .iter()
            .find(|r| r.employee_id == "E5")
            .expect("E5 row");
        assert_eq!(e5.avg_in_time_hr, None);
        assert_eq!(e5.punctuality, None);
        // Zero-filling policies still apply in the visible row
        assert!((e5.absenteeism_days - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_reproduces_training_assignments() {
        let outcome = run_train(archetype_batch(), 42).expect("train");
        let rescored =
            run_score(archetype_batch(), &outcome.scaler, &outcome.model).expect("score");

        assert_eq!(rescored.len(), outcome.labeled.len());
        for (scored, trained) in rescored.iter().zip(&outcome.labeled) {
            assert_eq!(scored.cluster, trained.cluster);
            assert_eq!(scored.behavior_type, trained.behavior_type);
        }
    }

    #[test]
    fn test_score_rejects_misaligned_scaler() {
        let outcome = run_train(archetype_batch(), 42).expect("train");
        let mut scaler = outcome.scaler;
        scaler.feature_names[0] = "something_else".to_string();

        assert!(run_score(archetype_batch(), &scaler, &outcome.model).is_err());
    }

    #[test]
    fn test_score_imputes_gaps_from_training_medians() {
        let outcome = run_train(archetype_batch(), 42).expect("train");

        // No row in this batch defines an in-time, so only the stored
        // train-batch medians can close the in-time and punctuality gaps
        let fresh = vec![
            // An overstayer like E7/E8, minus the in-time
            record(
                "S1",
                None,
                Some("12:30"),
                Some("00:30"),
                Some("11:00"),
                Some(0.0),
                Some(0.0),
                Some(0.0),
                None,
            ),
            // Identical to the sparse-and-absent pair E5/E6
            record(
                "S2",
                None,
                Some("05:00"),
                Some("02:00"),
                Some("01:30"),
                Some(4.0),
                Some(6.0),
                Some(8.0),
                Some("Unbilled"),
            ),
        ];
        let scored = run_score(fresh, &outcome.scaler, &outcome.model).expect("score");

        let trained = |id: &str| {
            outcome
                .labeled
                .iter()
                .find(|r| r.employee_id == id)
                .expect("trained row")
        };
        assert_eq!(scored[0].cluster, trained("E7").cluster);
        assert_eq!(scored[0].behavior_type, trained("E7").behavior_type);
        assert_eq!(scored[1].cluster, trained("E5").cluster);
        assert_eq!(scored[1].behavior_type, trained("E5").behavior_type);
        // The gaps are imputed for assignment only, never in the output row
        assert_eq!(scored[0].avg_in_time_hr, None);
        assert_eq!(scored[0].punctuality, None);
    }

    #[test]
    fn test_train_rejects_batch_smaller_than_k() {
        let records: Vec<AttendanceRecord> = archetype_batch().into_iter().take(3).collect();
        assert!(run_train(records, 42).is_err());
    }

    #[test]
    fn test_full_run_writes_valid_labeled_table() {
        let mk = |id: &str, in_time: &str, office: &str, bay: &str, full: f64| {
            record(
                id,
                Some(in_time),
                Some(office),
                Some("00:30"),
                Some(bay),
                Some(0.0),
                Some(full),
                Some(1.0),
                None,
            )
        };
        // Office hours span {0, 9, 12}; in-times span {7:00, 9:00, 11:00}
        let records = vec![
            mk("E1", "07:00", "0", "00:00", 0.0),
            mk("E2", "07:00", "0", "00:00", 0.0),
            mk("E3", "09:00", "9:00", "07:30", 0.0),
            mk("E4", "09:00", "9:00", "07:30", 0.0),
            mk("E5", "11:00", "12:00", "10:00", 2.0),
            mk("E6", "11:00", "12:00", "10:00", 2.0),
            mk("E7", "09:00", "12:00", "11:00", 0.0),
            mk("E8", "09:00", "12:00", "11:00", 0.0),
        ];

        let outcome = run_train(records.clone(), 42).expect("train");
        let again = run_train(records, 42).expect("train");
        let partition: Vec<usize> = outcome.labeled.iter().map(|r| r.cluster).collect();
        let partition_again: Vec<usize> = again.labeled.iter().map(|r| r.cluster).collect();
        assert_eq!(partition, partition_again);

        // Zero office hours pin efficiency and burnout at zero
        assert!((outcome.labeled[0].efficiency - 0.0).abs() < 1e-12);
        assert!((outcome.labeled[0].burnout_hours - 0.0).abs() < 1e-12);
        // An 11:00 arrival sits two hours off the nominal start
        let punctuality = outcome.labeled[4].punctuality.expect("punctuality");
        assert!((punctuality - 2.0).abs() < 1e-9);

        let dir = tempfile::TempDir::new().expect("create temp dir");
        let path = dir.path().join("processed_attendance.csv");
        crate::ml::output::write_labeled_csv(&path, &outcome.labeled).expect("write csv");

        let content = std::fs::read_to_string(&path).expect("read csv");
        let header = content.lines().next().expect("header line");
        assert_eq!(header.split(',').count(), 32);
        assert_eq!(content.lines().count(), 9);
        for row in &outcome.labeled {
            let known = BehaviorLabel::ALL
                .iter()
                .any(|label| label.as_str() == row.behavior_type);
            assert!(known, "unexpected label '{}'", row.behavior_type);
        }
    }
}
