//! Criterion weight generation
//!
//! Every strategy returns a [`WeightVector`]: non-negative, one entry per
//! criterion, summing to 1.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Result, SelectionError};

/// Lowest weight a requirement-based criterion can receive before renormalization
pub const REQUIREMENT_FLOOR: f64 = 0.1;

/// Normalized criterion weights
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightVector(Vec<f64>);

impl WeightVector {
    /// Renormalize raw non-negative weights so they sum to 1
    pub fn normalized(raw: Vec<f64>) -> Result<Self> {
        if let Some(bad) = raw.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(SelectionError::validation(format!(
                "weights must be non-negative finite numbers, got {}",
                bad
            )));
        }
        let sum: f64 = raw.iter().sum();
        if sum == 0.0 {
            return Err(SelectionError::configuration(
                "sum of weights cannot be zero",
            ));
        }
        Ok(Self(raw.into_iter().map(|w| w / sum).collect()))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Deref for WeightVector {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Equal weight for each of `n` criteria
pub fn uniform(n: usize) -> Result<WeightVector> {
    if n == 0 {
        return Err(SelectionError::configuration(
            "cannot generate weights for zero criteria",
        ));
    }
    WeightVector::normalized(vec![1.0; n])
}

/// Weights proportional to required levels, each floored at [`REQUIREMENT_FLOOR`]
pub fn requirement_based(required_levels: &[f64]) -> Result<WeightVector> {
    if required_levels.is_empty() {
        return Err(SelectionError::configuration(
            "cannot generate weights for zero criteria",
        ));
    }
    if required_levels.iter().any(|l| !l.is_finite()) {
        return Err(SelectionError::validation(
            "required levels must be finite numbers",
        ));
    }
    WeightVector::normalized(
        required_levels
            .iter()
            .map(|&level| level.max(REQUIREMENT_FLOOR))
            .collect(),
    )
}

/// Weights proportional to externally supplied importance scores
pub fn importance_based(importance: &[f64]) -> Result<WeightVector> {
    WeightVector::normalized(importance.to_vec())
}

/// `alpha * requirement_based + (1 - alpha) * importance_based`, renormalized
pub fn hybrid(required_levels: &[f64], importance: &[f64], alpha: f64) -> Result<WeightVector> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(SelectionError::configuration(format!(
            "hybrid alpha must be within [0, 1], got {}",
            alpha
        )));
    }
    if importance.len() != required_levels.len() {
        return Err(SelectionError::validation(format!(
            "importance scores length ({}) must match number of criteria ({})",
            importance.len(),
            required_levels.len()
        )));
    }
    let requirement = requirement_based(required_levels)?;
    let importance = importance_based(importance)?;
    WeightVector::normalized(
        requirement
            .iter()
            .zip(importance.iter())
            .map(|(r, i)| alpha * r + (1.0 - alpha) * i)
            .collect(),
    )
}

/// Strategy names accepted in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightStrategyKind {
    Uniform,
    RequirementBased,
    ImportanceBased,
    Hybrid,
}

impl WeightStrategyKind {
    pub fn all() -> &'static [WeightStrategyKind] {
        &[
            WeightStrategyKind::Uniform,
            WeightStrategyKind::RequirementBased,
            WeightStrategyKind::ImportanceBased,
            WeightStrategyKind::Hybrid,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeightStrategyKind::Uniform => "uniform",
            WeightStrategyKind::RequirementBased => "requirement_based",
            WeightStrategyKind::ImportanceBased => "importance_based",
            WeightStrategyKind::Hybrid => "hybrid",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            WeightStrategyKind::Uniform => "All skills weighted equally",
            WeightStrategyKind::RequirementBased => {
                "Skills weighted by required level (minimum 0.1)"
            }
            WeightStrategyKind::ImportanceBased => "Skills weighted by configured importance scores",
            WeightStrategyKind::Hybrid => "Blend of requirement-based and importance-based weights",
        }
    }
}

impl fmt::Display for WeightStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeightStrategyKind {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self> {
        WeightStrategyKind::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == s.trim().to_lowercase())
            .ok_or_else(|| {
                SelectionError::configuration(format!("unknown weight strategy: {}", s))
            })
    }
}

/// A fully parameterized weight strategy
#[derive(Debug, Clone, PartialEq)]
pub enum WeightStrategy {
    Uniform,
    RequirementBased,
    ImportanceBased { importance: Vec<f64> },
    Hybrid { importance: Vec<f64>, alpha: f64 },
}

impl WeightStrategy {
    pub fn kind(&self) -> WeightStrategyKind {
        match self {
            WeightStrategy::Uniform => WeightStrategyKind::Uniform,
            WeightStrategy::RequirementBased => WeightStrategyKind::RequirementBased,
            WeightStrategy::ImportanceBased { .. } => WeightStrategyKind::ImportanceBased,
            WeightStrategy::Hybrid { .. } => WeightStrategyKind::Hybrid,
        }
    }

    /// Weights for one activity given its required levels
    pub fn generate(&self, required_levels: &[f64]) -> Result<WeightVector> {
        match self {
            WeightStrategy::Uniform => uniform(required_levels.len()),
            WeightStrategy::RequirementBased => requirement_based(required_levels),
            WeightStrategy::ImportanceBased { importance } => {
                if importance.len() != required_levels.len() {
                    return Err(SelectionError::validation(format!(
                        "importance scores length ({}) must match number of criteria ({})",
                        importance.len(),
                        required_levels.len()
                    )));
                }
                importance_based(importance)
            }
            WeightStrategy::Hybrid { importance, alpha } => {
                hybrid(required_levels, importance, *alpha)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_normalized(w: &WeightVector) {
        assert!(w.iter().all(|&x| x >= 0.0));
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn uniform_weights_are_equal() {
        let w = uniform(4).unwrap();
        assert_eq!(w.as_slice(), &[0.25, 0.25, 0.25, 0.25]);
    }

    #[test]
    fn uniform_rejects_zero_criteria() {
        assert!(matches!(uniform(0), Err(SelectionError::Configuration(_))));
    }

    #[test]
    fn requirement_based_floors_zero_levels() {
        let w = requirement_based(&[0.0, 4.0, 5.9]).unwrap();
        assert_normalized(&w);
        assert!(w[0] > 0.0);
        assert!((w[0] - 0.1 / 10.0).abs() < 1e-12);
        assert!((w[1] - 0.4).abs() < 1e-12);
    }

    #[test]
    fn importance_based_rejects_zero_sum() {
        assert!(matches!(
            importance_based(&[0.0, 0.0]),
            Err(SelectionError::Configuration(_))
        ));
    }

    #[test]
    fn importance_based_rejects_negative_scores() {
        assert!(matches!(
            importance_based(&[1.0, -1.0]),
            Err(SelectionError::Validation(_))
        ));
    }

    #[test]
    fn hybrid_blends_strategies() {
        let required = [4.0, 1.0];
        let importance = [1.0, 3.0];
        let w = hybrid(&required, &importance, 0.5).unwrap();
        assert_normalized(&w);
        // requirement: [0.8, 0.2], importance: [0.25, 0.75]
        assert!((w[0] - 0.525).abs() < 1e-12);
        assert!((w[1] - 0.475).abs() < 1e-12);

        let all_requirement = hybrid(&required, &importance, 1.0).unwrap();
        let requirement = requirement_based(&required).unwrap();
        for (a, b) in all_requirement.iter().zip(requirement.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn hybrid_rejects_bad_alpha() {
        assert!(matches!(
            hybrid(&[1.0], &[1.0], 1.5),
            Err(SelectionError::Configuration(_))
        ));
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!(
            "requirement_based".parse::<WeightStrategyKind>().unwrap(),
            WeightStrategyKind::RequirementBased
        );
        assert!(matches!(
            "entropy".parse::<WeightStrategyKind>(),
            Err(SelectionError::Configuration(_))
        ));
    }

    #[test]
    fn importance_strategy_checks_length() {
        let strategy = WeightStrategy::ImportanceBased {
            importance: vec![1.0, 2.0],
        };
        assert!(matches!(
            strategy.generate(&[3.0, 3.0, 3.0]),
            Err(SelectionError::Validation(_))
        ));
    }
}
