use crate::ml::{output, stats};
use crate::structs::{FeatureMatrix, FeatureTable, PunchcardError, Result, StandardScaler};
use std::fs;
use std::path::Path;

impl StandardScaler {
    /// Fit imputation medians and standardization moments on a training
    /// table. Medians come from the defined cells of each column; means and
    /// population std devs are then computed over the imputed column, which
    /// is exactly what `transform` will see.
    ///
    /// # Errors
    /// Returns error if the table is empty or any column has no defined
    /// values at all
    pub fn fit(table: &FeatureTable) -> Result<Self> {
        if table.n_rows() == 0 {
            return Err(PunchcardError::Ml(
                "Cannot fit scaler on an empty feature table".into(),
            ));
        }

        let mut medians = Vec::with_capacity(table.n_features());
        let mut means = Vec::with_capacity(table.n_features());
        let mut std_devs = Vec::with_capacity(table.n_features());

        for (index, name) in table.names.iter().enumerate() {
            let column = table
                .column(index)
                .ok_or_else(|| PunchcardError::Ml(format!("Missing feature column '{name}'")))?;
            let defined: Vec<f64> = column.iter().copied().flatten().collect();
            if defined.is_empty() {
                return Err(PunchcardError::Input(format!(
                    "Feature '{name}' has no defined values to impute from"
                )));
            }

            let median = stats::median(&defined)?;
            let filled: Vec<f64> = column.iter().map(|cell| cell.unwrap_or(median)).collect();
            medians.push(median);
            means.push(stats::mean(&filled)?);
            std_devs.push(stats::population_std_dev(&filled)?);
        }

        Ok(Self {
            feature_names: table.names.clone(),
            medians,
            means,
            std_devs,
        })
    }

    /// Fill undefined cells with the fitted medians, producing a dense matrix
    ///
    /// # Errors
    /// Returns error if the table columns do not match the fitted columns
    pub fn impute(&self, table: &FeatureTable) -> Result<FeatureMatrix> {
        self.check_alignment(&table.names)?;
        let data: Vec<Vec<f64>> = table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| cell.unwrap_or(self.medians[i]))
                    .collect()
            })
            .collect();

        Ok(FeatureMatrix {
            names: table.names.clone(),
            data,
        })
    }

    /// Standardize a dense matrix to (x - mean) / std. A zero-variance
    /// column divides by 1 instead, leaving it constant at 0.
    ///
    /// # Errors
    /// Returns error if the matrix columns do not match the fitted columns
    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        self.check_alignment(&matrix.names)?;
        let data: Vec<Vec<f64>> = matrix
            .data
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, &val)| {
                        let scale = if self.std_devs[i] == 0.0 {
                            1.0
                        } else {
                            self.std_devs[i]
                        };
                        (val - self.means[i]) / scale
                    })
                    .collect()
            })
            .collect();

        Ok(FeatureMatrix {
            names: matrix.names.clone(),
            data,
        })
    }

    /// Impute and standardize in one step
    ///
    /// # Errors
    /// Returns error if the table columns do not match the fitted columns
    pub fn impute_and_transform(&self, table: &FeatureTable) -> Result<FeatureMatrix> {
        let imputed = self.impute(table)?;
        self.transform(&imputed)
    }

    /// Persist as pretty JSON (atomic write)
    ///
    /// # Errors
    /// Returns error if serialization or the write fails
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        output::write_atomic(path, &json)
    }

    /// Load a previously saved scaler
    ///
    /// # Errors
    /// Returns error if the file is unreadable, not valid JSON, or
    /// internally inconsistent
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let scaler: Self = serde_json::from_str(&raw)?;
        let n = scaler.feature_names.len();
        if scaler.medians.len() != n || scaler.means.len() != n || scaler.std_devs.len() != n {
            return Err(PunchcardError::Ml(format!(
                "Scaler artifact at {} is internally inconsistent",
                path.display()
            )));
        }
        Ok(scaler)
    }

    fn check_alignment(&self, names: &[String]) -> Result<()> {
        if self.feature_names.as_slice() == names {
            Ok(())
        } else {
            Err(PunchcardError::Ml(format!(
                "Feature columns {names:?} do not match the fitted scaler columns {:?}",
                self.feature_names
            )))
        }
    }
}
