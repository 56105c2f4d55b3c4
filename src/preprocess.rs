//! Repairing and scaling a descriptor vector before prediction.
//!
//! The fitted transforms (imputer and scaler) are learned elsewhere and read
//! from JSON; this module only applies them. Which repair is used depends on
//! how many descriptors failed:
//!
//! | Missing count       | Action                                  |
//! |---------------------|-----------------------------------------|
//! | 0                   | skip imputation                         |
//! | 1 ..= n / 2         | fill from the imputer's statistics      |
//! | more than n / 2     | set every missing value to 0            |
//!
//! Scaling always runs afterwards.
//!
//! ```
//! use stack_tox::preprocess::ImputationPlan;
//!
//! assert_eq!(ImputationPlan::decide(0, 61), ImputationPlan::Skip);
//! assert_eq!(ImputationPlan::decide(30, 61), ImputationPlan::Impute);
//! assert_eq!(ImputationPlan::decide(31, 61), ImputationPlan::ZeroFill);
//! ```

use std::io::{self, Write};

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors from applying the fitted transforms.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The vector length differs from what the transform was fitted on.
    #[error("{transform} expects {expected} features, got {found}")]
    DimensionMismatch {
        /// `imputer` or `scaler`.
        transform: &'static str,
        /// Fitted dimensionality.
        expected: usize,
        /// Length of the vector handed in.
        found: usize,
    },

    /// A missing value has no usable fill statistic.
    #[error("imputer has no statistic for feature {index}")]
    MissingStatistic {
        /// Feature position.
        index: usize,
    },

    /// Progress output could not be written.
    #[error("failed to write preprocessing progress")]
    Output(#[from] io::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Imputation policy
// ─────────────────────────────────────────────────────────────────────────────
/// How missing descriptors are repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputationPlan {
    /// More than half are missing: replace them with 0.
    ZeroFill,
    /// Some are missing: use the imputer.
    Impute,
    /// Nothing is missing.
    Skip,
}

impl ImputationPlan {
    /// Choose the repair for `missing` failures out of `n` descriptors.
    ///
    /// The threshold is `n / 2` with integer division, so 30 of 61 still
    /// imputes and 31 of 61 zero-fills.
    pub fn decide(missing: usize, n: usize) -> Self {
        if missing == 0 {
            ImputationPlan::Skip
        } else if missing > n / 2 {
            ImputationPlan::ZeroFill
        } else {
            ImputationPlan::Impute
        }
    }

    /// Progress line printed when this plan runs.
    pub fn message(self) -> &'static str {
        match self {
            ImputationPlan::ZeroFill => {
                "More than 50% descriptors missing — setting missing values to 0."
            }
            ImputationPlan::Impute => "Imputing missing descriptors...",
            ImputationPlan::Skip => "No missing descriptors, skipping imputation.",
        }
    }

    /// Apply the plan to `values` in place.
    pub fn apply(
        self,
        values: &mut Array1<f64>,
        missing: &[usize],
        imputer: &Imputer,
    ) -> Result<(), PreprocessError> {
        match self {
            ImputationPlan::ZeroFill => {
                for &index in missing {
                    if let Some(v) = values.get_mut(index) {
                        *v = 0.0;
                    }
                }
                Ok(())
            }
            ImputationPlan::Impute => imputer.transform(values),
            ImputationPlan::Skip => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Imputer
// ─────────────────────────────────────────────────────────────────────────────
/// Statistic the imputer was fitted with. Informational only: the fill
/// values are already in [`Imputer::statistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Column mean.
    #[default]
    Mean,
    /// Column median.
    Median,
    /// Most common value.
    MostFrequent,
    /// A fixed fill value.
    Constant,
}

/// Per-feature fill values for missing descriptors.
///
/// ```json
/// { "strategy": "median", "statistics": [46.07, -0.0014, 20.23] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputer {
    /// How the statistics were computed.
    #[serde(default)]
    pub strategy: ImputeStrategy,
    /// One fill value per feature.
    pub statistics: Vec<f64>,
}

impl Imputer {
    /// Number of features the imputer was fitted on.
    pub fn n_features(&self) -> usize {
        self.statistics.len()
    }

    /// Replace every NaN in `values` by its feature's statistic.
    pub fn transform(&self, values: &mut Array1<f64>) -> Result<(), PreprocessError> {
        check_dimension("imputer", self.n_features(), values.len())?;
        for (index, (v, &stat)) in values.iter_mut().zip(&self.statistics).enumerate() {
            if v.is_nan() {
                if !stat.is_finite() {
                    return Err(PreprocessError::MissingStatistic { index });
                }
                *v = stat;
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scaler
// ─────────────────────────────────────────────────────────────────────────────
/// A fitted feature scaler.
///
/// ```json
/// { "kind": "standard", "mean": [1.0, 2.0], "scale": [0.5, 4.0] }
/// { "kind": "min_max", "min": [0.0, -0.5], "scale": [0.1, 0.25] }
/// { "kind": "robust", "center": [3.0, 1.0], "scale": [2.0, 1.0] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `(x - mean) / scale`; either part may be absent.
    Standard {
        /// Per-feature mean.
        #[serde(default)]
        mean: Option<Vec<f64>>,
        /// Per-feature standard deviation.
        #[serde(default)]
        scale: Option<Vec<f64>>,
    },
    /// `x * scale + min`.
    MinMax {
        /// Per-feature offset.
        min: Vec<f64>,
        /// Per-feature factor.
        scale: Vec<f64>,
    },
    /// `(x - center) / scale`; either part may be absent.
    Robust {
        /// Per-feature median.
        #[serde(default)]
        center: Option<Vec<f64>>,
        /// Per-feature interquartile range.
        #[serde(default)]
        scale: Option<Vec<f64>>,
    },
}

impl Scaler {
    /// Fitted dimensionality, if the scaler carries any parameters.
    pub fn n_features(&self) -> Option<usize> {
        match self {
            Scaler::Standard { mean, scale } => mean.as_ref().or(scale.as_ref()).map(Vec::len),
            Scaler::MinMax { min, .. } => Some(min.len()),
            Scaler::Robust { center, scale } => {
                center.as_ref().or(scale.as_ref()).map(Vec::len)
            }
        }
    }

    /// Scale `values` in place.
    pub fn transform(&self, values: &mut Array1<f64>) -> Result<(), PreprocessError> {
        match self {
            Scaler::Standard { mean, scale } => {
                shift_and_divide(values, mean.as_deref(), scale.as_deref())
            }
            Scaler::Robust { center, scale } => {
                shift_and_divide(values, center.as_deref(), scale.as_deref())
            }
            Scaler::MinMax { min, scale } => {
                check_dimension("scaler", min.len(), values.len())?;
                check_dimension("scaler", scale.len(), values.len())?;
                for ((v, &lo), &s) in values.iter_mut().zip(min).zip(scale) {
                    *v = *v * s + lo;
                }
                Ok(())
            }
        }
    }
}

/// A zero scale means the feature was constant during fitting.
fn effective_scale(s: f64) -> f64 {
    if s == 0.0 {
        1.0
    } else {
        s
    }
}

fn shift_and_divide(
    values: &mut Array1<f64>,
    offset: Option<&[f64]>,
    scale: Option<&[f64]>,
) -> Result<(), PreprocessError> {
    if let Some(offset) = offset {
        check_dimension("scaler", offset.len(), values.len())?;
        for (v, &o) in values.iter_mut().zip(offset) {
            *v -= o;
        }
    }
    if let Some(scale) = scale {
        check_dimension("scaler", scale.len(), values.len())?;
        for (v, &s) in values.iter_mut().zip(scale) {
            *v /= effective_scale(s);
        }
    }
    Ok(())
}

fn check_dimension(
    transform: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), PreprocessError> {
    if expected == found {
        Ok(())
    } else {
        Err(PreprocessError::DimensionMismatch {
            transform,
            expected,
            found,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage entry point
// ─────────────────────────────────────────────────────────────────────────────
/// Turn raw descriptor values into the classifier input.
///
/// Infinite values become NaN, the [`ImputationPlan`] for `missing` is
/// applied, then the scaler. Progress lines go to `out`.
pub fn preprocess_descriptors<W: Write>(
    values: &[f64],
    missing: &[usize],
    imputer: &Imputer,
    scaler: &Scaler,
    out: &mut W,
) -> Result<Array1<f64>, PreprocessError> {
    let mut features: Array1<f64> = values
        .iter()
        .map(|&v| if v.is_infinite() { f64::NAN } else { v })
        .collect();

    let plan = ImputationPlan::decide(missing.len(), features.len());
    debug!(?plan, missing = missing.len(), n = features.len(), "imputation plan");
    writeln!(out, "{}", plan.message())?;
    plan.apply(&mut features, missing, imputer)?;

    writeln!(out, "Scaling descriptors...")?;
    scaler.transform(&mut features)?;
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn identity_imputer(statistics: Vec<f64>) -> Imputer {
        Imputer {
            strategy: ImputeStrategy::Mean,
            statistics,
        }
    }

    fn unit_scaler() -> Scaler {
        Scaler::Standard {
            mean: None,
            scale: None,
        }
    }

    #[test]
    fn plan_threshold_uses_integer_half() {
        assert_eq!(ImputationPlan::decide(0, 4), ImputationPlan::Skip);
        assert_eq!(ImputationPlan::decide(2, 4), ImputationPlan::Impute);
        assert_eq!(ImputationPlan::decide(3, 4), ImputationPlan::ZeroFill);
        assert_eq!(ImputationPlan::decide(2, 5), ImputationPlan::Impute);
        assert_eq!(ImputationPlan::decide(3, 5), ImputationPlan::ZeroFill);
        assert_eq!(ImputationPlan::decide(1, 1), ImputationPlan::ZeroFill);
    }

    #[test]
    fn imputer_fills_only_nan() {
        let imputer = identity_imputer(vec![10.0, 20.0, 30.0]);
        let mut x = array![1.0, f64::NAN, 3.0];
        imputer.transform(&mut x).unwrap();
        assert_eq!(x, array![1.0, 20.0, 3.0]);
    }

    #[test]
    fn imputer_rejects_nan_statistic_and_bad_length() {
        let imputer = identity_imputer(vec![1.0, f64::NAN]);
        let mut x = array![f64::NAN, f64::NAN];
        assert!(matches!(
            imputer.transform(&mut x),
            Err(PreprocessError::MissingStatistic { index: 1 })
        ));

        let mut short = array![1.0];
        assert!(matches!(
            imputer.transform(&mut short),
            Err(PreprocessError::DimensionMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn standard_scaler_treats_zero_scale_as_one() {
        let scaler = Scaler::Standard {
            mean: Some(vec![1.0, 5.0]),
            scale: Some(vec![2.0, 0.0]),
        };
        let mut x = array![3.0, 7.0];
        scaler.transform(&mut x).unwrap();
        assert_relative_eq!(x[0], 1.0);
        assert_relative_eq!(x[1], 2.0);
    }

    #[test]
    fn min_max_and_robust_scalers() {
        let min_max = Scaler::MinMax {
            min: vec![-1.0],
            scale: vec![0.5],
        };
        let mut x = array![4.0];
        min_max.transform(&mut x).unwrap();
        assert_relative_eq!(x[0], 1.0);

        let robust = Scaler::Robust {
            center: Some(vec![2.0]),
            scale: None,
        };
        let mut y = array![4.0];
        robust.transform(&mut y).unwrap();
        assert_relative_eq!(y[0], 2.0);
    }

    #[test]
    fn scaler_dimension_mismatch_is_an_error() {
        let scaler = Scaler::Standard {
            mean: Some(vec![0.0; 3]),
            scale: None,
        };
        let mut x = array![1.0, 2.0];
        assert!(matches!(
            scaler.transform(&mut x),
            Err(PreprocessError::DimensionMismatch { transform: "scaler", .. })
        ));
    }

    #[test]
    fn scaler_json_is_tagged_by_kind() {
        let scaler: Scaler =
            serde_json::from_str(r#"{"kind":"min_max","min":[0.0],"scale":[2.0]}"#).unwrap();
        assert_eq!(scaler.n_features(), Some(1));
        let standard: Scaler = serde_json::from_str(r#"{"kind":"standard"}"#).unwrap();
        assert_eq!(standard.n_features(), None);
        let imputer: Imputer = serde_json::from_str(r#"{"statistics":[1.5]}"#).unwrap();
        assert_eq!(imputer.strategy, ImputeStrategy::Mean);
    }

    #[test]
    fn zero_fill_when_most_values_missing() {
        let mut out = Vec::new();
        let values = [f64::NAN, f64::INFINITY, 2.0];
        let imputer = identity_imputer(vec![9.0, 9.0, 9.0]);
        let x = preprocess_descriptors(&values, &[0, 1], &imputer, &unit_scaler(), &mut out)
            .unwrap();
        assert_eq!(x, array![0.0, 0.0, 2.0]);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "More than 50% descriptors missing — setting missing values to 0.\nScaling descriptors...\n"
        );
    }

    #[test]
    fn infinite_values_are_imputed() {
        let mut out = Vec::new();
        let values = [1.0, f64::NEG_INFINITY, 3.0, 4.0];
        let imputer = identity_imputer(vec![0.0, 7.0, 0.0, 0.0]);
        let x = preprocess_descriptors(&values, &[1], &imputer, &unit_scaler(), &mut out)
            .unwrap();
        assert_eq!(x, array![1.0, 7.0, 3.0, 4.0]);
        assert!(String::from_utf8(out)
            .unwrap()
            .starts_with("Imputing missing descriptors...\n"));
    }
}
