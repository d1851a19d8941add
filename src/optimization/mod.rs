//! Decision-making core: criteria classification, weighting, TOPSIS ranking
//! and one-to-one assignment.

pub mod assignment;
pub mod criteria;
pub mod topsis;
pub mod weights;

pub use assignment::{AssignmentMethod, AssignmentResult, AssignmentSolver, SolveMethod};
pub use criteria::{CriteriaClassifier, Direction};
pub use topsis::{ProximityFormula, ProximityRanker, RankingReport};
pub use weights::{WeightStrategy, WeightStrategyKind, WeightVector};
