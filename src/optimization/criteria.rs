//! Criterion direction classification
//!
//! A skill becomes a beneficial criterion (higher level preferred) when the
//! activity requires it at or above the threshold, and a cost criterion
//! (lower level acceptable) otherwise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SelectionError};

/// Preference direction of a criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Higher values are preferred
    Beneficial,
    /// Lower values are preferred
    Cost,
}

impl Direction {
    /// Parse the numeric tag used in tabular exports (1 = beneficial, 0 = cost)
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Direction::Beneficial),
            0 => Ok(Direction::Cost),
            other => Err(SelectionError::validation(format!(
                "criterion type must be 0 (cost) or 1 (beneficial), got {}",
                other
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Beneficial => "Beneficial (Maximize)",
            Direction::Cost => "Cost (Minimize)",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Beneficial => write!(f, "beneficial"),
            Direction::Cost => write!(f, "cost"),
        }
    }
}

impl FromStr for Direction {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "beneficial" | "max" => Ok(Direction::Beneficial),
            "0" | "cost" | "non_beneficial" | "min" => Ok(Direction::Cost),
            other => Err(SelectionError::validation(format!(
                "unknown criterion type '{}'",
                other
            ))),
        }
    }
}

/// Direction per criterion: beneficial iff the required level reaches the threshold.
pub fn classify(required_levels: &[f64], threshold: f64) -> Vec<Direction> {
    required_levels
        .iter()
        .map(|&level| {
            if level >= threshold {
                Direction::Beneficial
            } else {
                Direction::Cost
            }
        })
        .collect()
}

/// Per-criterion classification detail for reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionInfo {
    pub skill_name: String,
    pub required_level: f64,
    pub direction: Direction,
    pub reasoning: String,
}

/// Summary of an activity's requirement profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequirementAnalysis {
    pub total_skills: usize,
    pub n_beneficial: usize,
    pub n_cost: usize,
    pub percentage_beneficial: f64,
    pub percentage_cost: f64,
    pub beneficial_skills: Vec<String>,
    pub cost_skills: Vec<String>,
    pub avg_required_level: f64,
    pub min_required_level: f64,
    pub max_required_level: f64,
    pub threshold_used: f64,
}

/// Threshold configuration as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdInfo {
    pub threshold: f64,
    pub min_level: f64,
    pub max_level: f64,
    pub beneficial_range: String,
    pub cost_range: String,
}

/// Threshold-based classifier bound to a valid skill level range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriteriaClassifier {
    threshold: f64,
    min_level: f64,
    max_level: f64,
}

impl CriteriaClassifier {
    /// Create a classifier, rejecting a threshold outside `[min_level, max_level]`
    pub fn new(threshold: f64, min_level: f64, max_level: f64) -> Result<Self> {
        if !min_level.is_finite() || !max_level.is_finite() || min_level > max_level {
            return Err(SelectionError::configuration(format!(
                "invalid skill level range [{}, {}]",
                min_level, max_level
            )));
        }
        Self::check_threshold(threshold, min_level, max_level)?;
        Ok(Self {
            threshold,
            min_level,
            max_level,
        })
    }

    fn check_threshold(threshold: f64, min_level: f64, max_level: f64) -> Result<()> {
        if !(min_level..=max_level).contains(&threshold) {
            return Err(SelectionError::configuration(format!(
                "threshold {} must be between min_threshold {} and max_threshold {}",
                threshold, min_level, max_level
            )));
        }
        Ok(())
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn min_level(&self) -> f64 {
        self.min_level
    }

    pub fn max_level(&self) -> f64 {
        self.max_level
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        Self::check_threshold(threshold, self.min_level, self.max_level)?;
        self.threshold = threshold;
        Ok(())
    }

    pub fn classify(&self, required_levels: &[f64]) -> Vec<Direction> {
        classify(required_levels, self.threshold)
    }

    /// Check that every value lies within the configured level range
    pub fn validate_levels<I>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut lowest = f64::INFINITY;
        let mut highest = f64::NEG_INFINITY;
        for value in values {
            if !value.is_finite() {
                return Err(SelectionError::validation(format!(
                    "skill level {} is not a finite number",
                    value
                )));
            }
            lowest = lowest.min(value);
            highest = highest.max(value);
        }
        if lowest < self.min_level {
            return Err(SelectionError::validation(format!(
                "minimum skill level {} is below min_threshold {}",
                lowest, self.min_level
            )));
        }
        if highest > self.max_level {
            return Err(SelectionError::validation(format!(
                "maximum skill level {} exceeds max_threshold {}",
                highest, self.max_level
            )));
        }
        Ok(())
    }

    pub fn criteria_info(&self, skill_names: &[String], required_levels: &[f64]) -> Vec<CriterionInfo> {
        skill_names
            .iter()
            .zip(required_levels)
            .zip(self.classify(required_levels))
            .map(|((name, &level), direction)| {
                CriterionInfo {
                    skill_name: name.clone(),
                    required_level: level,
                    direction,
                    reasoning: self.reasoning(level, direction),
                }
            })
            .collect()
    }

    fn reasoning(&self, level: f64, direction: Direction) -> String {
        match direction {
            Direction::Beneficial => format!(
                "Required level {} >= threshold {}: higher skill levels are preferred",
                level, self.threshold
            ),
            Direction::Cost => format!(
                "Required level {} < threshold {}: lower skill levels are acceptable",
                level, self.threshold
            ),
        }
    }

    pub fn analyze(&self, skill_names: &[String], required_levels: &[f64]) -> RequirementAnalysis {
        let directions = self.classify(required_levels);
        let mut beneficial_skills = Vec::new();
        let mut cost_skills = Vec::new();
        for (name, direction) in skill_names.iter().zip(&directions) {
            match direction {
                Direction::Beneficial => beneficial_skills.push(name.clone()),
                Direction::Cost => cost_skills.push(name.clone()),
            }
        }
        let total = directions.len();
        let pct = |count: usize| {
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            }
        };
        let (min_required_level, max_required_level) = required_levels
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let avg_required_level = if total == 0 {
            0.0
        } else {
            required_levels.iter().sum::<f64>() / total as f64
        };

        RequirementAnalysis {
            total_skills: total,
            n_beneficial: beneficial_skills.len(),
            n_cost: cost_skills.len(),
            percentage_beneficial: pct(beneficial_skills.len()),
            percentage_cost: pct(cost_skills.len()),
            beneficial_skills,
            cost_skills,
            avg_required_level,
            min_required_level,
            max_required_level,
            threshold_used: self.threshold,
        }
    }

    pub fn threshold_info(&self) -> ThresholdInfo {
        ThresholdInfo {
            threshold: self.threshold,
            min_level: self.min_level,
            max_level: self.max_level,
            beneficial_range: format!(">= {}", self.threshold),
            cost_range: format!("< {}", self.threshold),
        }
    }
}
