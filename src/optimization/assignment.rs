//! One-to-one assignment of alternatives to activities
//!
//! Maximizes the total proximity score over the activities × alternatives
//! [`ScoreMatrix`]. Square matrices are solved exactly with the Kuhn-Munkres
//! (Hungarian) method; rectangular ones fall back to a greedy heuristic.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, SelectionError};
use crate::model::ScoreMatrix;

/// Requested solving strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentMethod {
    /// Exact when square, heuristic otherwise
    Auto,
    Exact,
    Heuristic,
}

impl AssignmentMethod {
    pub fn name(&self) -> &'static str {
        match self {
            AssignmentMethod::Auto => "auto",
            AssignmentMethod::Exact => "exact",
            AssignmentMethod::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for AssignmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssignmentMethod {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(AssignmentMethod::Auto),
            "exact" | "hungarian" => Ok(AssignmentMethod::Exact),
            "heuristic" | "greedy" => Ok(AssignmentMethod::Heuristic),
            _ => Err(SelectionError::configuration(format!(
                "unknown assignment method: {} (expected auto, exact/hungarian or heuristic/greedy)",
                s
            ))),
        }
    }
}

/// Method that actually produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveMethod {
    Exact,
    Heuristic,
}

impl SolveMethod {
    pub fn label(&self) -> &'static str {
        match self {
            SolveMethod::Exact => "Hungarian (exact)",
            SolveMethod::Heuristic => "Greedy (heuristic)",
        }
    }
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveMethod::Exact => f.write_str("exact"),
            SolveMethod::Heuristic => f.write_str("heuristic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedPair {
    pub activity_index: usize,
    pub activity: String,
    pub alternative_index: usize,
    pub alternative: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentResult {
    /// Ordered by activity index
    pub pairs: Vec<AssignedPair>,
    pub total_score: f64,
    pub average_score: f64,
    pub method: SolveMethod,
    pub unassigned_alternatives: Vec<String>,
    pub unassigned_activities: Vec<String>,
}

impl AssignmentResult {
    fn from_pairs(matrix: &ScoreMatrix, mut pairs: Vec<(usize, usize)>, method: SolveMethod) -> Self {
        pairs.sort_unstable();

        let mut activity_used = vec![false; matrix.n_activities()];
        let mut alternative_used = vec![false; matrix.n_alternatives()];
        let pairs: Vec<AssignedPair> = pairs
            .into_iter()
            .map(|(i, j)| {
                activity_used[i] = true;
                alternative_used[j] = true;
                AssignedPair {
                    activity_index: i,
                    activity: matrix.activities()[i].clone(),
                    alternative_index: j,
                    alternative: matrix.alternatives()[j].clone(),
                    score: matrix.get(i, j),
                }
            })
            .collect();

        let total_score: f64 = pairs.iter().map(|p| p.score).sum();
        let average_score = if pairs.is_empty() {
            0.0
        } else {
            total_score / pairs.len() as f64
        };

        let unassigned = |used: &[bool], names: &[String]| -> Vec<String> {
            used.iter()
                .zip(names)
                .filter(|(used, _)| !**used)
                .map(|(_, name)| name.clone())
                .collect()
        };

        Self {
            unassigned_alternatives: unassigned(&alternative_used, matrix.alternatives()),
            unassigned_activities: unassigned(&activity_used, matrix.activities()),
            pairs,
            total_score,
            average_score,
            method,
        }
    }

    pub fn n_assignments(&self) -> usize {
        self.pairs.len()
    }

    /// Alternative assigned to `activity`, if any
    pub fn assigned_to(&self, activity: &str) -> Option<&AssignedPair> {
        self.pairs.iter().find(|p| p.activity == activity)
    }
}

/// Aggregate view of a solved assignment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentSummary {
    pub method: SolveMethod,
    pub n_activities: usize,
    pub n_alternatives: usize,
    pub n_assignments: usize,
    pub is_square: bool,
    pub total_score: f64,
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub n_unassigned_alternatives: usize,
    pub n_unassigned_activities: usize,
}

/// Kuhn-Munkres with row/column potentials on a square cost matrix.
///
/// Returns `assignment[row] = column` minimizing total cost. O(n^3).
fn hungarian_min_cost(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    // 1-based; index 0 is the virtual column / unmatched marker
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; n + 1];
    let mut p = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let cur = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }

            for j in 0..=n {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }

            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }

        // augment along the alternating path
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=n {
        if p[j] != 0 {
            assignment[p[j] - 1] = j - 1;
        }
    }
    assignment
}

/// Solver over one score matrix, `Unsolved` until a `solve*` call succeeds
#[derive(Debug, Clone)]
pub struct AssignmentSolver {
    matrix: ScoreMatrix,
    result: Option<AssignmentResult>,
}

impl AssignmentSolver {
    pub fn new(matrix: ScoreMatrix) -> Self {
        Self {
            matrix,
            result: None,
        }
    }

    pub fn matrix(&self) -> &ScoreMatrix {
        &self.matrix
    }

    pub fn is_solved(&self) -> bool {
        self.result.is_some()
    }

    /// Whether the exact method applies, with an explanation
    pub fn check_square(&self) -> (bool, String) {
        let (p, q) = (self.matrix.n_activities(), self.matrix.n_alternatives());
        if p == q {
            (
                true,
                format!("Square matrix ({}x{}): exact Hungarian assignment applies", p, q),
            )
        } else if p < q {
            (
                false,
                format!(
                    "Rectangular matrix ({}x{}): {} more alternatives than activities, {} alternatives will stay unassigned",
                    p,
                    q,
                    q - p,
                    q - p
                ),
            )
        } else {
            (
                false,
                format!(
                    "Rectangular matrix ({}x{}): {} more activities than alternatives, {} activities will stay unassigned",
                    p,
                    q,
                    p - q,
                    p - q
                ),
            )
        }
    }

    /// Maximum-weight perfect matching; square matrices only
    pub fn solve_exact(&mut self) -> Result<AssignmentResult> {
        let (square, explanation) = self.check_square();
        if !square {
            return Err(SelectionError::operation(format!(
                "exact assignment requires a square matrix. {}",
                explanation
            )));
        }

        let cost: Vec<Vec<f64>> = self
            .matrix
            .values()
            .iter()
            .map(|row| row.iter().map(|s| -s).collect())
            .collect();
        let pairs = hungarian_min_cost(&cost)
            .into_iter()
            .enumerate()
            .collect();

        let result = AssignmentResult::from_pairs(&self.matrix, pairs, SolveMethod::Exact);
        info!(
            assignments = result.n_assignments(),
            total = result.total_score,
            "exact assignment solved"
        );
        self.result = Some(result.clone());
        Ok(result)
    }

    /// Greedy highest-score-first matching; any shape
    pub fn solve_heuristic(&mut self) -> Result<AssignmentResult> {
        let (p, q) = (self.matrix.n_activities(), self.matrix.n_alternatives());

        let mut triples: Vec<(usize, usize, f64)> = Vec::with_capacity(p * q);
        for i in 0..p {
            for j in 0..q {
                triples.push((i, j, self.matrix.get(i, j)));
            }
        }
        // stable: equal scores keep (activity, alternative) enumeration order
        triples.sort_by(|a, b| b.2.total_cmp(&a.2));

        let target = p.min(q);
        let mut activity_done = vec![false; p];
        let mut alternative_done = vec![false; q];
        let mut pairs = Vec::with_capacity(target);

        for (i, j, _) in triples {
            if pairs.len() == target {
                break;
            }
            if activity_done[i] || alternative_done[j] {
                continue;
            }
            activity_done[i] = true;
            alternative_done[j] = true;
            pairs.push((i, j));
        }

        let result = AssignmentResult::from_pairs(&self.matrix, pairs, SolveMethod::Heuristic);
        info!(
            assignments = result.n_assignments(),
            total = result.total_score,
            unassigned_alternatives = result.unassigned_alternatives.len(),
            "heuristic assignment solved"
        );
        self.result = Some(result.clone());
        Ok(result)
    }

    pub fn solve(&mut self, method: AssignmentMethod) -> Result<AssignmentResult> {
        debug!(%method, square = self.matrix.is_square(), "solving assignment");
        match method {
            AssignmentMethod::Exact => self.solve_exact(),
            AssignmentMethod::Heuristic => self.solve_heuristic(),
            AssignmentMethod::Auto if self.matrix.is_square() => self.solve_exact(),
            AssignmentMethod::Auto => self.solve_heuristic(),
        }
    }

    pub fn result(&self) -> Result<&AssignmentResult> {
        self.result.as_ref().ok_or_else(|| {
            SelectionError::state("assignment has not been solved yet; call solve() first")
        })
    }

    /// 0/1 matrix, activities × alternatives
    pub fn assignment_matrix(&self) -> Result<Vec<Vec<u8>>> {
        let result = self.result()?;
        let mut matrix = vec![vec![0u8; self.matrix.n_alternatives()]; self.matrix.n_activities()];
        for pair in &result.pairs {
            matrix[pair.activity_index][pair.alternative_index] = 1;
        }
        Ok(matrix)
    }

    /// Score in assigned cells, 0 elsewhere
    pub fn assignment_scores(&self) -> Result<Vec<Vec<f64>>> {
        let result = self.result()?;
        let mut matrix =
            vec![vec![0.0f64; self.matrix.n_alternatives()]; self.matrix.n_activities()];
        for pair in &result.pairs {
            matrix[pair.activity_index][pair.alternative_index] = pair.score;
        }
        Ok(matrix)
    }

    pub fn summary(&self) -> Result<AssignmentSummary> {
        let result = self.result()?;
        let scores = result.pairs.iter().map(|p| p.score);
        let (min_score, max_score) = if result.pairs.is_empty() {
            (0.0, 0.0)
        } else {
            scores.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s), hi.max(s))
            })
        };
        Ok(AssignmentSummary {
            method: result.method,
            n_activities: self.matrix.n_activities(),
            n_alternatives: self.matrix.n_alternatives(),
            n_assignments: result.n_assignments(),
            is_square: self.matrix.is_square(),
            total_score: result.total_score,
            average_score: result.average_score,
            min_score,
            max_score,
            n_unassigned_alternatives: result.unassigned_alternatives.len(),
            n_unassigned_activities: result.unassigned_activities.len(),
        })
    }
}
