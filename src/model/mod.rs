//! In-memory data model shared by the ranking engine and the assignment solver.

pub mod matrix;
pub mod skill_table;

pub use matrix::{DecisionMatrix, ScoreMatrix};
pub use skill_table::SkillTable;
