use crate::ml::output;
use crate::structs::{
    BehaviorLabel, ClusterProfile, FeatureMatrix, KMeansModel, PunchcardError, Result,
};
use linfa::traits::Fit;
use linfa::DatasetBase;
use linfa_clustering::KMeans;
use ndarray::Array2;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::fs;
use std::path::Path;

/// Number of behavior archetypes; k is fixed to this, not configurable
pub const ARCHETYPE_COUNT: usize = 4;

/// Fit k-means on the standardized feature matrix.
///
/// The RNG is seeded, so the same matrix and seed always give the same
/// model. Label strings are frozen into the returned model in cluster-id
/// order.
///
/// # Errors
/// Returns error if there are fewer samples than clusters or the fit fails
pub fn fit_kmeans(matrix: &FeatureMatrix, seed: u64) -> Result<KMeansModel> {
    let n_samples = matrix.n_samples();
    if n_samples < ARCHETYPE_COUNT {
        return Err(PunchcardError::Ml(format!(
            "Cannot form {ARCHETYPE_COUNT} clusters from only {n_samples} employees"
        )));
    }

    // Convert to ndarray Array2
    let array = Array2::from_shape_vec((n_samples, matrix.n_features()), matrix.to_flat())
        .map_err(|e| PunchcardError::Ml(format!("Failed to create array: {e}")))?;
    let dataset = DatasetBase::from(array);

    // Run K-means with a reproducible initialization
    let rng = Xoshiro256Plus::seed_from_u64(seed);
    let fitted = KMeans::params_with_rng(ARCHETYPE_COUNT, rng)
        .max_n_iterations(100)
        .tolerance(1e-4)
        .fit(&dataset)
        .map_err(|e| PunchcardError::Ml(format!("K-means failed: {e}")))?;

    let centroids: Vec<Vec<f64>> = fitted
        .centroids()
        .outer_iter()
        .map(|row| row.to_vec())
        .collect();

    Ok(KMeansModel {
        k: ARCHETYPE_COUNT,
        seed,
        centroids,
        inertia: fitted.inertia(),
        labels: BehaviorLabel::ALL.to_vec(),
    })
}

impl KMeansModel {
    /// Assign each row to its nearest centroid (squared L2 distance)
    ///
    /// # Errors
    /// Returns error if the matrix width does not match the centroids
    pub fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<usize>> {
        let width = self
            .centroids
            .first()
            .map(Vec::len)
            .ok_or_else(|| PunchcardError::Ml("Model has no centroids".into()))?;
        if matrix.n_features() != width {
            return Err(PunchcardError::Ml(format!(
                "Matrix has {} features but the model expects {width}",
                matrix.n_features()
            )));
        }

        Ok(matrix
            .data
            .iter()
            .map(|row| nearest_centroid(row, &self.centroids))
            .collect())
    }

    /// Label frozen for a cluster id
    ///
    /// # Errors
    /// Returns error if the id has no label entry
    pub fn label_for(&self, cluster_id: usize) -> Result<BehaviorLabel> {
        self.labels.get(cluster_id).copied().ok_or_else(|| {
            PunchcardError::Ml(format!("Cluster id {cluster_id} has no label entry"))
        })
    }

    /// Persist as pretty JSON (atomic write)
    ///
    /// # Errors
    /// Returns error if serialization or the write fails
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        output::write_atomic(path, &json)
    }

    /// Load a previously saved model
    ///
    /// # Errors
    /// Returns error if the file is unreadable, not valid JSON, or
    /// internally inconsistent
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&raw)?;
        if model.k == 0 || model.centroids.len() != model.k || model.labels.len() != model.k {
            return Err(PunchcardError::Ml(format!(
                "Model artifact at {} is internally inconsistent",
                path.display()
            )));
        }
        let width = model.centroids[0].len();
        if width == 0 || model.centroids.iter().any(|c| c.len() != width) {
            return Err(PunchcardError::Ml(format!(
                "Model artifact at {} has ragged centroids",
                path.display()
            )));
        }
        Ok(model)
    }
}

fn nearest_centroid(row: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist: f64 = row
            .iter()
            .zip(centroid.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum();
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

/// Summarize each cluster over the imputed (unscaled) features, so the
/// means read in real units
///
/// # Errors
/// Returns error if assignments and rows disagree or a profile column is
/// missing from the matrix
#[allow(clippy::cast_precision_loss)]
pub fn build_profiles(
    model: &KMeansModel,
    features: &FeatureMatrix,
    assignments: &[usize],
) -> Result<Vec<ClusterProfile>> {
    if features.n_samples() != assignments.len() {
        return Err(PunchcardError::Ml(format!(
            "Have {} assignments for {} rows",
            assignments.len(),
            features.n_samples()
        )));
    }

    let col = |name: &str| -> Result<usize> {
        features
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| PunchcardError::Ml(format!("Missing feature column '{name}'")))
    };
    let in_time = col("avg_in_time_hr")?;
    let office = col("avg_office_hours")?;
    let leaves = col("total_leaves")?;
    let efficiency = col("efficiency")?;
    let punctuality = col("punctuality")?;
    let burnout = col("burnout_hours")?;

    let mut profiles = Vec::with_capacity(model.k);
    for cluster_id in 0..model.k {
        let members: Vec<&Vec<f64>> = features
            .data
            .iter()
            .zip(assignments)
            .filter(|(_, &assigned)| assigned == cluster_id)
            .map(|(row, _)| row)
            .collect();
        let size = members.len();
        let mean_of = |index: usize| -> f64 {
            if members.is_empty() {
                0.0
            } else {
                members.iter().map(|row| row[index]).sum::<f64>() / size as f64
            }
        };

        let label = BehaviorLabel::from_cluster_id(cluster_id).ok_or_else(|| {
            PunchcardError::Ml(format!("Cluster id {cluster_id} has no label entry"))
        })?;

        profiles.push(ClusterProfile {
            cluster_id,
            label,
            size,
            mean_in_time_hr: mean_of(in_time),
            mean_office_hours: mean_of(office),
            mean_efficiency: mean_of(efficiency),
            mean_punctuality: mean_of(punctuality),
            mean_burnout_hours: mean_of(burnout),
            mean_total_leaves: mean_of(leaves),
        });
    }

    Ok(profiles)
}

/// Sanity-check the static id-to-label table against what the clusters
/// actually look like. Late starters should lead on mean in-time, silent
/// overworkers on burnout, consistent performers on efficiency. Mismatches
/// produce warnings only; assignments and labels are never changed.
#[must_use]
pub fn audit_label_mapping(profiles: &[ClusterProfile]) -> Vec<String> {
    let occupied: Vec<&ClusterProfile> = profiles.iter().filter(|p| p.size > 0).collect();
    if occupied.len() < 2 {
        return Vec::new();
    }

    let checks: [(BehaviorLabel, &str, fn(&ClusterProfile) -> f64); 3] = [
        (BehaviorLabel::LateStarter, "mean in-time", |p| {
            p.mean_in_time_hr
        }),
        (BehaviorLabel::SilentOverworker, "mean burnout hours", |p| {
            p.mean_burnout_hours
        }),
        (BehaviorLabel::ConsistentPerformer, "mean efficiency", |p| {
            p.mean_efficiency
        }),
    ];

    let mut warnings = Vec::new();
    for (label, metric_name, metric) in checks {
        let Some(expected) = occupied.iter().copied().find(|p| p.label == label) else {
            continue;
        };
        let Some(leader) = occupied.iter().copied().max_by(|a, b| {
            metric(a)
                .partial_cmp(&metric(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        }) else {
            continue;
        };
        if metric(leader) > metric(expected) {
            warnings.push(format!(
                "label audit: expected '{label}' (cluster {}) to lead on {metric_name}, but cluster {} ('{}') does",
                expected.cluster_id, leader.cluster_id, leader.label
            ));
        }
    }
    warnings
}
