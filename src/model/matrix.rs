//! Numeric matrices consumed by the TOPSIS engine and the assignment solver.

use crate::error::{Result, SelectionError};

/// Alternatives (rows) scored on criteria (columns).
///
/// Always rectangular, non-empty on both axes, and free of negative or
/// non-finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionMatrix {
    rows: Vec<Vec<f64>>,
    n_criteria: usize,
}

impl DecisionMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(SelectionError::validation("decision matrix has no alternatives"));
        }
        let n_criteria = rows[0].len();
        if n_criteria == 0 {
            return Err(SelectionError::validation("decision matrix has no criteria"));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_criteria {
                return Err(SelectionError::validation(format!(
                    "decision matrix row {} has {} values, expected {}",
                    i,
                    row.len(),
                    n_criteria
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(SelectionError::validation(format!(
                        "decision matrix value at ({}, {}) must be a non-negative finite number, got {}",
                        i, j, value
                    )));
                }
            }
        }
        Ok(Self { rows, n_criteria })
    }

    pub fn n_alternatives(&self) -> usize {
        self.rows.len()
    }

    pub fn n_criteria(&self) -> usize {
        self.n_criteria
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.rows[i]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    /// Values of criterion `j` across all alternatives, in row order.
    pub fn column(&self, j: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |row| row[j])
    }
}

/// Proximity coefficients, one row per activity and one column per alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    activities: Vec<String>,
    alternatives: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl ScoreMatrix {
    pub fn new(
        activities: Vec<String>,
        alternatives: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if values.len() != activities.len() {
            return Err(SelectionError::validation(format!(
                "score matrix has {} rows but {} activity names",
                values.len(),
                activities.len()
            )));
        }
        for (i, row) in values.iter().enumerate() {
            if row.len() != alternatives.len() {
                return Err(SelectionError::validation(format!(
                    "score matrix row '{}' has {} values but there are {} alternatives",
                    activities[i],
                    row.len(),
                    alternatives.len()
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(SelectionError::validation(format!(
                    "score for ('{}', '{}') is not a finite number",
                    activities[i], alternatives[j]
                )));
            }
        }
        Ok(Self {
            activities,
            alternatives,
            values,
        })
    }

    /// Builds a matrix with generated `Activity_i` / `Alt_j` labels.
    pub fn unlabelled(values: Vec<Vec<f64>>) -> Result<Self> {
        let n_alternatives = values.first().map_or(0, Vec::len);
        let activities = (1..=values.len()).map(|i| format!("Activity_{}", i)).collect();
        let alternatives = (1..=n_alternatives).map(|j| format!("Alt_{}", j)).collect();
        Self::new(activities, alternatives, values)
    }

    pub fn activities(&self) -> &[String] {
        &self.activities
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn n_activities(&self) -> usize {
        self.activities.len()
    }

    pub fn n_alternatives(&self) -> usize {
        self.alternatives.len()
    }

    pub fn get(&self, activity: usize, alternative: usize) -> f64 {
        self.values[activity][alternative]
    }

    pub fn is_square(&self) -> bool {
        self.n_activities() == self.n_alternatives()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_matrix_accepts_rectangular_data() {
        let m = DecisionMatrix::new(vec![vec![4.0, 4.0], vec![2.0, 6.0]]).unwrap();
        assert_eq!(m.n_alternatives(), 2);
        assert_eq!(m.n_criteria(), 2);
        assert_eq!(m.column(1).collect::<Vec<_>>(), vec![4.0, 6.0]);
    }

    #[test]
    fn decision_matrix_rejects_ragged_rows() {
        let err = DecisionMatrix::new(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, SelectionError::Validation(_)));
    }

    #[test]
    fn decision_matrix_rejects_negative_values() {
        let err = DecisionMatrix::new(vec![vec![1.0, -0.5]]).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn decision_matrix_rejects_empty() {
        assert!(DecisionMatrix::new(vec![]).is_err());
        assert!(DecisionMatrix::new(vec![vec![]]).is_err());
    }

    #[test]
    fn score_matrix_checks_labels() {
        let err = ScoreMatrix::new(
            vec!["A".into()],
            vec!["P1".into(), "P2".into()],
            vec![vec![0.5]],
        )
        .unwrap_err();
        assert!(matches!(err, SelectionError::Validation(_)));
    }

    #[test]
    fn score_matrix_rejects_nan() {
        assert!(ScoreMatrix::unlabelled(vec![vec![0.1, f64::NAN]]).is_err());
    }

    #[test]
    fn unlabelled_score_matrix_generates_names() {
        let m = ScoreMatrix::unlabelled(vec![vec![0.1, 0.2, 0.3]]).unwrap();
        assert_eq!(m.activities(), &["Activity_1".to_string()]);
        assert_eq!(m.alternatives().len(), 3);
        assert!(!m.is_square());
    }

    #[test]
    fn empty_score_matrix_is_square() {
        let m = ScoreMatrix::unlabelled(vec![]).unwrap();
        assert!(m.is_square());
    }
}
