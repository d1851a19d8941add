//! Labelled skill tables (profiles × skills, activities × skills).

use std::collections::{BTreeSet, HashSet};

use crate::error::{Result, SelectionError};
use crate::model::DecisionMatrix;

/// A named matrix of skill levels.
///
/// `index_label` is the header of the name column ("Profile" or "Activity").
#[derive(Debug, Clone, PartialEq)]
pub struct SkillTable {
    index_label: String,
    names: Vec<String>,
    skills: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl SkillTable {
    pub fn new(
        index_label: impl Into<String>,
        names: Vec<String>,
        skills: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let index_label = index_label.into();
        if let Some(dup) = first_duplicate(&names) {
            return Err(SelectionError::validation(format!(
                "duplicate {} name '{}'",
                index_label.to_lowercase(),
                dup
            )));
        }
        if let Some(dup) = first_duplicate(&skills) {
            return Err(SelectionError::validation(format!(
                "duplicate skill column '{}'",
                dup
            )));
        }
        if values.len() != names.len() {
            return Err(SelectionError::validation(format!(
                "{} table has {} names but {} rows",
                index_label,
                names.len(),
                values.len()
            )));
        }
        for (name, row) in names.iter().zip(&values) {
            if row.len() != skills.len() {
                return Err(SelectionError::validation(format!(
                    "{} '{}' has {} values but there are {} skills",
                    index_label,
                    name,
                    row.len(),
                    skills.len()
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(SelectionError::validation(format!(
                    "{} '{}' has a non-numeric skill value",
                    index_label, name
                )));
            }
        }
        Ok(Self {
            index_label,
            names,
            skills,
            values,
        })
    }

    pub fn index_label(&self) -> &str {
        &self.index_label
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn row_by_name(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| self.values[i].as_slice())
    }

    /// Every cell of the table, row by row.
    pub fn cells(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flat_map(|row| row.iter().copied())
    }

    /// Fails unless both tables cover exactly the same skill set (order ignored).
    pub fn ensure_same_skills(&self, other: &SkillTable) -> Result<()> {
        let mine: BTreeSet<&str> = self.skills.iter().map(String::as_str).collect();
        let theirs: BTreeSet<&str> = other.skills.iter().map(String::as_str).collect();
        if mine == theirs {
            return Ok(());
        }
        let mut msg = format!(
            "skill columns must match between {} and {} tables",
            self.index_label.to_lowercase(),
            other.index_label.to_lowercase()
        );
        let missing_in_other: Vec<&str> = mine.difference(&theirs).copied().collect();
        let missing_in_self: Vec<&str> = theirs.difference(&mine).copied().collect();
        if !missing_in_other.is_empty() {
            msg.push_str(&format!(
                "; missing in {}: {}",
                other.index_label.to_lowercase(),
                missing_in_other.join(", ")
            ));
        }
        if !missing_in_self.is_empty() {
            msg.push_str(&format!(
                "; missing in {}: {}",
                self.index_label.to_lowercase(),
                missing_in_self.join(", ")
            ));
        }
        Err(SelectionError::validation(msg))
    }

    /// Returns a copy whose columns follow `skills` order.
    pub fn aligned_to(&self, skills: &[String]) -> Result<SkillTable> {
        let mut order = Vec::with_capacity(skills.len());
        for skill in skills {
            let j = self.skills.iter().position(|s| s == skill).ok_or_else(|| {
                SelectionError::validation(format!(
                    "skill '{}' missing in {} table",
                    skill,
                    self.index_label.to_lowercase()
                ))
            })?;
            order.push(j);
        }
        if order.len() != self.skills.len() {
            return Err(SelectionError::validation(format!(
                "{} table has {} skills, cannot align to {}",
                self.index_label,
                self.skills.len(),
                skills.len()
            )));
        }
        let values = self
            .values
            .iter()
            .map(|row| order.iter().map(|&j| row[j]).collect())
            .collect();
        Ok(SkillTable {
            index_label: self.index_label.clone(),
            names: self.names.clone(),
            skills: skills.to_vec(),
            values,
        })
    }

    pub fn to_decision_matrix(&self) -> Result<DecisionMatrix> {
        DecisionMatrix::new(self.values.clone())
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .find(|item| !seen.insert(item.as_str()))
        .map(String::as_str)
}
