//! TOPSIS (Technique for Order Preference by Similarity to Ideal Solution)
//! implementation for multi-criteria decision making
//!
//! The engine is a staged pipeline. Each step takes the record produced by the
//! previous one and returns a new immutable record:
//!
//! 1. [`normalize`] - vector normalization per criterion column
//! 2. [`apply_weights`] - weighted normalized matrix
//! 3. [`ideal_solutions`] - direction-aware ideal best / worst points
//! 4. [`distances`] - Euclidean distances to both ideal points
//! 5. [`proximity`] - proximity coefficient per alternative
//! 6. [`rank_order`] - descending order, ties kept in input order

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SelectionError};
use crate::model::DecisionMatrix;
use crate::optimization::criteria::Direction;

/// Substituted for a zero `E+ + E-` denominator in the standard formula
pub const DENOMINATOR_EPSILON: f64 = 1e-10;

/// Formula turning the two distances into a proximity coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityFormula {
    /// `S = E- / (E+ + E-)`
    Standard,
    /// `S = E- / E+`, rescaled so the best alternative scores 1
    Variant,
}

impl ProximityFormula {
    pub fn all() -> &'static [ProximityFormula] {
        &[ProximityFormula::Standard, ProximityFormula::Variant]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProximityFormula::Standard => "standard",
            ProximityFormula::Variant => "variant",
        }
    }
}

impl fmt::Display for ProximityFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProximityFormula {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(ProximityFormula::Standard),
            "variant" => Ok(ProximityFormula::Variant),
            _ => Err(SelectionError::configuration(format!(
                "unknown proximity formula: {}",
                s
            ))),
        }
    }
}

/// Step 1 output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedMatrix {
    pub values: Vec<Vec<f64>>,
    /// Euclidean norm used per column (1 where the column was all zero)
    pub column_norms: Vec<f64>,
}

/// Step 2 output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedMatrix {
    pub values: Vec<Vec<f64>>,
    pub weights: Vec<f64>,
}

/// Step 3 output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdealSolutions {
    pub best: Vec<f64>,
    pub worst: Vec<f64>,
}

/// Step 4 output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distances {
    pub to_best: Vec<f64>,
    pub to_worst: Vec<f64>,
}

/// Vector normalization: `r_ij = x_ij / sqrt(sum_i x_ij^2)`
pub fn normalize(matrix: &DecisionMatrix) -> NormalizedMatrix {
    let column_norms: Vec<f64> = (0..matrix.n_criteria())
        .map(|j| {
            let norm = matrix.column(j).map(|x| x * x).sum::<f64>().sqrt();
            if norm == 0.0 {
                1.0
            } else {
                norm
            }
        })
        .collect();

    let values = matrix
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(&column_norms)
                .map(|(x, norm)| x / norm)
                .collect()
        })
        .collect();

    NormalizedMatrix {
        values,
        column_norms,
    }
}

/// Weighted normalized matrix: `t_ij = w_j * r_ij`
pub fn apply_weights(normalized: &NormalizedMatrix, weights: &[f64]) -> WeightedMatrix {
    let values = normalized
        .values
        .iter()
        .map(|row| row.iter().zip(weights).map(|(r, w)| r * w).collect())
        .collect();
    WeightedMatrix {
        values,
        weights: weights.to_vec(),
    }
}

/// Ideal best (A+) and ideal worst (A-) per criterion
pub fn ideal_solutions(weighted: &WeightedMatrix, directions: &[Direction]) -> IdealSolutions {
    let mut best = Vec::with_capacity(directions.len());
    let mut worst = Vec::with_capacity(directions.len());

    for (j, direction) in directions.iter().enumerate() {
        let (min, max) = weighted
            .values
            .iter()
            .map(|row| row[j])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
                (lo.min(t), hi.max(t))
            });
        match direction {
            Direction::Beneficial => {
                best.push(max);
                worst.push(min);
            }
            Direction::Cost => {
                best.push(min);
                worst.push(max);
            }
        }
    }

    IdealSolutions { best, worst }
}

fn euclidean(row: &[f64], point: &[f64]) -> f64 {
    row.iter()
        .zip(point)
        .map(|(t, a)| (t - a).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// `E+_i` and `E-_i` for every alternative
pub fn distances(weighted: &WeightedMatrix, ideal: &IdealSolutions) -> Distances {
    let to_best = weighted
        .values
        .iter()
        .map(|row| euclidean(row, &ideal.best))
        .collect();
    let to_worst = weighted
        .values
        .iter()
        .map(|row| euclidean(row, &ideal.worst))
        .collect();
    Distances { to_best, to_worst }
}

/// Proximity coefficient per alternative (higher is better)
pub fn proximity(distances: &Distances, formula: ProximityFormula) -> Vec<f64> {
    match formula {
        ProximityFormula::Standard => distances
            .to_best
            .iter()
            .zip(&distances.to_worst)
            .map(|(plus, minus)| {
                let denominator = plus + minus;
                let denominator = if denominator == 0.0 {
                    DENOMINATOR_EPSILON
                } else {
                    denominator
                };
                minus / denominator
            })
            .collect(),
        ProximityFormula::Variant => {
            let max_to_best = distances.to_best.iter().copied().fold(0.0, f64::max);
            let raw: Vec<f64> = distances
                .to_best
                .iter()
                .zip(&distances.to_worst)
                .map(|(&plus, &minus)| {
                    if plus != 0.0 {
                        minus / plus
                    } else if max_to_best != 0.0 {
                        minus / max_to_best
                    } else {
                        // every alternative sits on the ideal best point
                        1.0
                    }
                })
                .collect();
            let max_raw = raw.iter().copied().fold(0.0, f64::max);
            if max_raw == 0.0 {
                raw
            } else {
                raw.into_iter().map(|r| r / max_raw).collect()
            }
        }
    }
}

/// Alternative indices from best to worst.
///
/// Stable sort on descending coefficient: exactly equal coefficients keep
/// their input order.
pub fn rank_order(coefficients: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..coefficients.len()).collect();
    order.sort_by(|&a, &b| {
        coefficients[b]
            .partial_cmp(&coefficients[a])
            .unwrap_or(Ordering::Equal)
    });
    order
}

/// Every intermediate record of one ranking run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopsisTrace {
    pub normalized: NormalizedMatrix,
    pub weighted: WeightedMatrix,
    pub ideal: IdealSolutions,
    pub distances: Distances,
    /// Proximity coefficients in input order
    pub coefficients: Vec<f64>,
    /// Alternative indices from best to worst
    pub ranking: Vec<usize>,
}

/// TOPSIS score for one alternative
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityResult {
    pub rank: usize,
    pub alternative_index: usize,
    pub alternative: String,
    pub coefficient: f64,
    pub percentage: f64,
    pub distance_to_best: f64,
    pub distance_to_worst: f64,
}

/// Inputs a ranking was produced with
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingMetadata {
    pub n_alternatives: usize,
    pub n_criteria: usize,
    pub proximity_formula: ProximityFormula,
    pub criteria_names: Vec<String>,
    pub weights: Vec<f64>,
    pub directions: Vec<Direction>,
}

/// Ranked alternatives plus the metadata and trace that produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingReport {
    pub ranked: Vec<ProximityResult>,
    pub metadata: RankingMetadata,
    pub trace: TopsisTrace,
}

impl RankingReport {
    /// Top-ranked alternative (reports always hold at least one alternative)
    pub fn best(&self) -> &ProximityResult {
        &self.ranked[0]
    }

    /// Coefficients in alternative input order
    pub fn coefficients(&self) -> &[f64] {
        &self.trace.coefficients
    }
}

/// TOPSIS ranking engine for a fixed proximity formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityRanker {
    formula: ProximityFormula,
}

impl ProximityRanker {
    pub fn new(formula: ProximityFormula) -> Self {
        Self { formula }
    }

    pub fn formula(&self) -> ProximityFormula {
        self.formula
    }

    fn validate(matrix: &DecisionMatrix, weights: &[f64], directions: &[Direction]) -> Result<()> {
        let n_criteria = matrix.n_criteria();
        if weights.len() != n_criteria {
            return Err(SelectionError::validation(format!(
                "weights length ({}) must match number of criteria ({})",
                weights.len(),
                n_criteria
            )));
        }
        if directions.len() != n_criteria {
            return Err(SelectionError::validation(format!(
                "criteria types length ({}) must match number of criteria ({})",
                directions.len(),
                n_criteria
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(SelectionError::validation(format!(
                "weights must be non-negative, got {}",
                w
            )));
        }
        if weights.iter().sum::<f64>() == 0.0 {
            return Err(SelectionError::validation("sum of weights cannot be zero"));
        }
        Ok(())
    }

    /// Run all pipeline steps and return every intermediate record
    pub fn run(
        &self,
        matrix: &DecisionMatrix,
        weights: &[f64],
        directions: &[Direction],
    ) -> Result<TopsisTrace> {
        Self::validate(matrix, weights, directions)?;

        let sum: f64 = weights.iter().sum();
        let weights: Vec<f64> = weights.iter().map(|w| w / sum).collect();

        let normalized = normalize(matrix);
        let weighted = apply_weights(&normalized, &weights);
        let ideal = ideal_solutions(&weighted, directions);
        let distances = distances(&weighted, &ideal);
        let coefficients = proximity(&distances, self.formula);
        let ranking = rank_order(&coefficients);

        debug!(
            alternatives = matrix.n_alternatives(),
            criteria = matrix.n_criteria(),
            formula = %self.formula,
            best = ranking[0],
            "TOPSIS run complete"
        );

        Ok(TopsisTrace {
            normalized,
            weighted,
            ideal,
            distances,
            coefficients,
            ranking,
        })
    }

    /// Rank with generated `Alt_i` / `Criterion_j` labels
    pub fn rank(
        &self,
        matrix: &DecisionMatrix,
        weights: &[f64],
        directions: &[Direction],
    ) -> Result<RankingReport> {
        let alternatives: Vec<String> = (1..=matrix.n_alternatives())
            .map(|i| format!("Alt_{}", i))
            .collect();
        let criteria: Vec<String> = (1..=matrix.n_criteria())
            .map(|j| format!("Criterion_{}", j))
            .collect();
        self.rank_labelled(matrix, weights, directions, &alternatives, &criteria)
    }

    /// Rank and attach alternative / criterion names to the result
    pub fn rank_labelled(
        &self,
        matrix: &DecisionMatrix,
        weights: &[f64],
        directions: &[Direction],
        alternative_names: &[String],
        criteria_names: &[String],
    ) -> Result<RankingReport> {
        if alternative_names.len() != matrix.n_alternatives() {
            return Err(SelectionError::validation(format!(
                "alternative names length ({}) must match number of alternatives ({})",
                alternative_names.len(),
                matrix.n_alternatives()
            )));
        }
        if criteria_names.len() != matrix.n_criteria() {
            return Err(SelectionError::validation(format!(
                "criteria names length ({}) must match number of criteria ({})",
                criteria_names.len(),
                matrix.n_criteria()
            )));
        }

        let trace = self.run(matrix, weights, directions)?;

        let ranked = trace
            .ranking
            .iter()
            .enumerate()
            .map(|(position, &idx)| {
                let coefficient = trace.coefficients[idx];
                ProximityResult {
                    rank: position + 1,
                    alternative_index: idx,
                    alternative: alternative_names[idx].clone(),
                    coefficient,
                    percentage: coefficient * 100.0,
                    distance_to_best: trace.distances.to_best[idx],
                    distance_to_worst: trace.distances.to_worst[idx],
                }
            })
            .collect();

        Ok(RankingReport {
            ranked,
            metadata: RankingMetadata {
                n_alternatives: matrix.n_alternatives(),
                n_criteria: matrix.n_criteria(),
                proximity_formula: self.formula,
                criteria_names: criteria_names.to_vec(),
                weights: trace.weighted.weights.clone(),
                directions: directions.to_vec(),
            },
            trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-4;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < TOL
    }

    fn scenario() -> DecisionMatrix {
        DecisionMatrix::new(vec![vec![4.0, 4.0], vec![2.0, 6.0]]).unwrap()
    }

    const BOTH_BENEFICIAL: [Direction; 2] = [Direction::Beneficial, Direction::Beneficial];

    #[test]
    fn two_by_two_scenario_matches_hand_computation() {
        let ranker = ProximityRanker::new(ProximityFormula::Standard);
        let trace = ranker.run(&scenario(), &[0.5, 0.5], &BOTH_BENEFICIAL).unwrap();

        let n = &trace.normalized.values;
        assert!(close(n[0][0], 0.8944) && close(n[1][0], 0.4472));
        assert!(close(n[0][1], 0.5547) && close(n[1][1], 0.8321));

        let t = &trace.weighted.values;
        assert!(close(t[0][0], 0.4472) && close(t[0][1], 0.2774));
        assert!(close(t[1][0], 0.2236) && close(t[1][1], 0.4160));

        assert!(close(trace.ideal.best[0], 0.4472) && close(trace.ideal.best[1], 0.4160));
        assert!(close(trace.ideal.worst[0], 0.2236) && close(trace.ideal.worst[1], 0.2774));

        assert!(close(trace.distances.to_best[0], 0.1386));
        assert!(close(trace.distances.to_worst[0], 0.2236));
        assert!(close(trace.distances.to_best[1], 0.2236));
        assert!(close(trace.distances.to_worst[1], 0.1386));

        assert!(close(trace.coefficients[0], 0.6172));
        assert!(close(trace.coefficients[1], 0.3828));
        assert_eq!(trace.ranking, vec![0, 1]);
    }

    #[test]
    fn ranked_results_carry_percentages_and_distances() {
        let ranker = ProximityRanker::new(ProximityFormula::Standard);
        let report = ranker.rank(&scenario(), &[0.5, 0.5], &BOTH_BENEFICIAL).unwrap();

        assert_eq!(report.best().alternative, "Alt_1");
        assert_eq!(report.best().rank, 1);
        assert!((report.best().percentage - 61.72).abs() < 5e-3);
        assert_eq!(report.ranked[1].alternative_index, 1);
        assert!(close(report.ranked[1].distance_to_best, 0.2236));
        assert_eq!(report.metadata.n_criteria, 2);
        assert_eq!(report.metadata.proximity_formula, ProximityFormula::Standard);
    }

    #[test]
    fn weights_are_renormalized() {
        let ranker = ProximityRanker::new(ProximityFormula::Standard);
        let a = ranker.run(&scenario(), &[1.0, 1.0], &BOTH_BENEFICIAL).unwrap();
        let b = ranker.run(&scenario(), &[0.5, 0.5], &BOTH_BENEFICIAL).unwrap();
        assert_eq!(a.weighted.weights, vec![0.5, 0.5]);
        assert_eq!(a.coefficients, b.coefficients);
    }

    #[test]
    fn cost_direction_swaps_ideal_points() {
        let ranker = ProximityRanker::new(ProximityFormula::Standard);
        let trace = ranker
            .run(&scenario(), &[0.5, 0.5], &[Direction::Cost, Direction::Cost])
            .unwrap();
        assert!(close(trace.ideal.best[0], 0.2236));
        assert!(close(trace.ideal.worst[0], 0.4472));
        assert!(close(trace.coefficients[0], 0.3828));
        assert_eq!(trace.ranking, vec![1, 0]);
    }

    #[test]
    fn zero_column_does_not_divide_by_zero() {
        let matrix = DecisionMatrix::new(vec![vec![0.0, 1.0], vec![0.0, 3.0]]).unwrap();
        let trace = ProximityRanker::new(ProximityFormula::Standard)
            .run(&matrix, &[0.5, 0.5], &BOTH_BENEFICIAL)
            .unwrap();
        assert_eq!(trace.normalized.column_norms[0], 1.0);
        assert_eq!(trace.normalized.values[0][0], 0.0);
        assert!(trace.coefficients.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn identical_alternatives_use_epsilon_and_keep_input_order() {
        let matrix = DecisionMatrix::new(vec![vec![2.0, 2.0]; 3]).unwrap();
        let trace = ProximityRanker::new(ProximityFormula::Standard)
            .run(&matrix, &[0.5, 0.5], &BOTH_BENEFICIAL)
            .unwrap();
        assert_eq!(trace.coefficients, vec![0.0, 0.0, 0.0]);
        assert_eq!(trace.ranking, vec![0, 1, 2]);
    }

    #[test]
    fn rank_order_keeps_ties_in_input_order() {
        assert_eq!(rank_order(&[0.2, 0.7, 0.2, 0.7, 0.1]), vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn variant_rescales_best_to_one() {
        let ranker = ProximityRanker::new(ProximityFormula::Variant);
        let trace = ranker.run(&scenario(), &[0.5, 0.5], &BOTH_BENEFICIAL).unwrap();
        // E+ and E- swap between the two alternatives
        let ratio = trace.distances.to_best[0] / trace.distances.to_worst[0];
        assert!(close(trace.coefficients[0], 1.0));
        assert!(close(trace.coefficients[1], ratio * ratio));
        assert!(close(trace.coefficients[1], 0.3846));
    }

    #[test]
    fn variant_handles_alternative_on_ideal_best() {
        // alternative 0 dominates on both criteria, so E+_0 = 0
        let matrix = DecisionMatrix::new(vec![vec![5.0, 5.0], vec![1.0, 2.0]]).unwrap();
        let trace = ProximityRanker::new(ProximityFormula::Variant)
            .run(&matrix, &[0.5, 0.5], &BOTH_BENEFICIAL)
            .unwrap();
        assert_eq!(trace.distances.to_best[0], 0.0);
        assert!(close(trace.coefficients[0], 1.0));
        assert_eq!(trace.coefficients[1], 0.0);
    }

    #[test]
    fn variant_all_on_ideal_best_scores_one() {
        let matrix = DecisionMatrix::new(vec![vec![3.0], vec![3.0]]).unwrap();
        let trace = ProximityRanker::new(ProximityFormula::Variant)
            .run(&matrix, &[1.0], &[Direction::Beneficial])
            .unwrap();
        assert_eq!(trace.coefficients, vec![1.0, 1.0]);
    }

    #[test]
    fn variant_all_zero_raw_stays_zero() {
        let distances = Distances {
            to_best: vec![0.5, 0.3],
            to_worst: vec![0.0, 0.0],
        };
        assert_eq!(proximity(&distances, ProximityFormula::Variant), vec![0.0, 0.0]);
    }

    #[test]
    fn mismatched_lengths_are_validation_errors() {
        let ranker = ProximityRanker::new(ProximityFormula::Standard);
        assert!(matches!(
            ranker.run(&scenario(), &[1.0], &BOTH_BENEFICIAL),
            Err(SelectionError::Validation(_))
        ));
        assert!(matches!(
            ranker.run(&scenario(), &[0.5, 0.5], &[Direction::Cost]),
            Err(SelectionError::Validation(_))
        ));
        assert!(matches!(
            ranker.rank_labelled(
                &scenario(),
                &[0.5, 0.5],
                &BOTH_BENEFICIAL,
                &["only".to_string()],
                &["a".to_string(), "b".to_string()]
            ),
            Err(SelectionError::Validation(_))
        ));
    }

    #[test]
    fn negative_or_zero_weights_are_rejected() {
        let ranker = ProximityRanker::new(ProximityFormula::Standard);
        assert!(matches!(
            ranker.run(&scenario(), &[1.5, -0.5], &BOTH_BENEFICIAL),
            Err(SelectionError::Validation(_))
        ));
        assert!(matches!(
            ranker.run(&scenario(), &[0.0, 0.0], &BOTH_BENEFICIAL),
            Err(SelectionError::Validation(_))
        ));
    }

    #[test]
    fn formula_names_parse() {
        assert_eq!("Variant".parse::<ProximityFormula>().unwrap(), ProximityFormula::Variant);
        assert!(matches!(
            "harmonic".parse::<ProximityFormula>(),
            Err(SelectionError::Configuration(_))
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn instance() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<f64>, Vec<Direction>)> {
        (2usize..7, 1usize..6).prop_flat_map(|(m, n)| {
            (
                prop::collection::vec(prop::collection::vec(0.0f64..5.0, n), m),
                prop::collection::vec(0.01f64..1.0, n),
                prop::collection::vec(
                    prop_oneof![Just(Direction::Beneficial), Just(Direction::Cost)],
                    n,
                ),
            )
        })
    }

    proptest! {
        #[test]
        fn normalized_columns_have_unit_norm((rows, _, _) in instance()) {
            let matrix = DecisionMatrix::new(rows).unwrap();
            let normalized = normalize(&matrix);
            for j in 0..matrix.n_criteria() {
                if matrix.column(j).any(|x| x != 0.0) {
                    let sum_sq: f64 = normalized.values.iter().map(|row| row[j].powi(2)).sum();
                    prop_assert!((sum_sq - 1.0).abs() < 1e-9);
                }
            }
        }

        #[test]
        fn standard_coefficients_within_unit_interval((rows, weights, directions) in instance()) {
            let matrix = DecisionMatrix::new(rows).unwrap();
            let trace = ProximityRanker::new(ProximityFormula::Standard)
                .run(&matrix, &weights, &directions)
                .unwrap();
            for c in &trace.coefficients {
                prop_assert!((0.0..=1.0).contains(c));
            }
        }

        #[test]
        fn variant_maximum_is_one((rows, weights, directions) in instance()) {
            let matrix = DecisionMatrix::new(rows).unwrap();
            let trace = ProximityRanker::new(ProximityFormula::Variant)
                .run(&matrix, &weights, &directions)
                .unwrap();
            let max = trace.coefficients.iter().copied().fold(0.0, f64::max);
            if max != 0.0 {
                prop_assert!((max - 1.0).abs() < 1e-9);
            }
        }

        #[test]
        fn raising_a_value_moves_coefficient_with_direction(
            (rows, weights, directions) in instance(),
            pick in any::<prop::sample::Index>(),
            crit in any::<prop::sample::Index>(),
            delta in 0.1f64..3.0,
        ) {
            let i = pick.index(rows.len());
            let j = crit.index(weights.len());
            let ranker = ProximityRanker::new(ProximityFormula::Standard);

            let before = ranker
                .run(&DecisionMatrix::new(rows.clone()).unwrap(), &weights, &directions)
                .unwrap()
                .coefficients[i];
            let mut raised = rows;
            raised[i][j] += delta;
            let after = ranker
                .run(&DecisionMatrix::new(raised).unwrap(), &weights, &directions)
                .unwrap()
                .coefficients[i];

            match directions[j] {
                Direction::Beneficial => prop_assert!(after >= before - 1e-9),
                Direction::Cost => prop_assert!(after <= before + 1e-9),
            }
        }
    }
}
