use crate::structs::{PunchcardError, Result};

/// Arithmetic mean
///
/// # Errors
/// Returns error if values is empty
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(PunchcardError::Ml(
            "Cannot calculate mean of empty data".into(),
        ));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by n, not n - 1)
///
/// # Errors
/// Returns error if values is empty
#[allow(clippy::cast_precision_loss)]
pub fn population_std_dev(values: &[f64]) -> Result<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(variance.sqrt())
}

/// Median as the linearly interpolated 50th percentile
///
/// # Errors
/// Returns error if values is empty
pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(PunchcardError::Ml(
            "Cannot calculate median of empty data".into(),
        ));
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(percentile(&sorted, 50.0))
}

/// Calculate percentile using linear interpolation
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let k = (p / 100.0) * (sorted.len() - 1) as f64;
    let f = k.floor() as usize;
    let c = k.ceil() as usize;

    if f == c {
        sorted[f]
    } else {
        let d0 = sorted[f] * (c as f64 - k);
        let d1 = sorted[c] * (k - f as f64);
        d0 + d1
    }
}
