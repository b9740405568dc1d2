//! Box constraints for the Levenberg-Marquardt algorithm.
//!
//! Bounds are stored as plain vectors. An empty vector leaves every component
//! unconstrained on that side, and a NaN entry leaves that single component
//! unconstrained. Trial points are clipped after the step is computed; the
//! step itself is not projected.

use crate::error::{NllsError, Result};
use ndarray::Array1;

fn side_len_ok(bound: &Array1<f64>, n: usize) -> bool {
    bound.is_empty() || bound.len() == n
}

/// Check that the bounds fit a problem with `n` parameters.
///
/// Each side must be empty or have exactly `n` entries, and where both sides
/// constrain a component the lower bound may not exceed the upper bound.
pub fn validate_bounds(lower: &Array1<f64>, upper: &Array1<f64>, n: usize) -> Result<()> {
    for (name, bound) in [("lower", lower), ("upper", upper)] {
        if !side_len_ok(bound, n) {
            return Err(NllsError::InvalidConfig(format!(
                "{} bound has {} entries, expected 0 or {}",
                name,
                bound.len(),
                n
            )));
        }
    }
    if lower.is_empty() || upper.is_empty() {
        return Ok(());
    }
    for (i, (lo, hi)) in lower.iter().zip(upper.iter()).enumerate() {
        if lo > hi {
            return Err(NllsError::InvalidConfig(format!(
                "lower bound {} exceeds upper bound {} for parameter {}",
                lo, hi, i
            )));
        }
    }
    Ok(())
}

/// Clip `x` in place: first to the upper bound, then to the lower bound.
///
/// NaN entries and empty bound vectors leave the corresponding side alone.
pub fn clip_to_bounds(x: &mut Array1<f64>, lower: &Array1<f64>, upper: &Array1<f64>) {
    if !upper.is_empty() {
        x.zip_mut_with(upper, |xi, &hi| {
            if !hi.is_nan() && *xi > hi {
                *xi = hi;
            }
        });
    }
    if !lower.is_empty() {
        x.zip_mut_with(lower, |xi, &lo| {
            if !lo.is_nan() && *xi < lo {
                *xi = lo;
            }
        });
    }
}

/// Whether every constrained component of `x` lies within its bounds.
pub fn is_within_bounds(x: &Array1<f64>, lower: &Array1<f64>, upper: &Array1<f64>) -> bool {
    let above_lower = lower.is_empty()
        || x.iter().zip(lower.iter()).all(|(xi, lo)| lo.is_nan() || xi >= lo);
    let below_upper = upper.is_empty()
        || x.iter().zip(upper.iter()).all(|(xi, hi)| hi.is_nan() || xi <= hi);
    above_lower && below_upper
}

/// Serde adapter encoding NaN bound entries as `null`.
///
/// JSON has no NaN, so unconstrained components travel as `null` and come
/// back as NaN.
pub(crate) mod nan_as_null {
    use ndarray::Array1;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bound: &Array1<f64>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: Vec<Option<f64>> = bound
            .iter()
            .map(|v| if v.is_nan() { None } else { Some(*v) })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Array1<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<Option<f64>>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
