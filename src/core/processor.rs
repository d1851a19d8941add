//! Runs the TOPSIS ranker once per activity and collects the score matrix.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, SelectionError};
use crate::model::{DecisionMatrix, ScoreMatrix, SkillTable};
use crate::optimization::criteria::{CriterionInfo, RequirementAnalysis};
use crate::optimization::topsis::ProximityResult;
use crate::optimization::{
    CriteriaClassifier, Direction, ProximityFormula, ProximityRanker, RankingReport,
    WeightStrategy, WeightStrategyKind, WeightVector,
};

/// Ranking of every profile for one activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityRanking {
    pub activity: String,
    pub required_levels: Vec<f64>,
    pub directions: Vec<Direction>,
    pub strategy: WeightStrategyKind,
    pub weights: WeightVector,
    pub report: RankingReport,
}

impl ActivityRanking {
    /// First `n` ranked profiles (fewer if there are not that many)
    pub fn top(&self, n: usize) -> &[ProximityResult] {
        let end = n.min(self.report.ranked.len());
        &self.report.ranked[..end]
    }

    pub fn best(&self) -> &ProximityResult {
        self.report.best()
    }
}

/// Best profile for one activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestMatch {
    pub activity: String,
    pub profile: String,
    pub coefficient: f64,
}

/// One row of the top-N ranking matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub activity: String,
    /// `"name (0.xxxx)"` cells, best first
    pub entries: Vec<String>,
}

/// Profiles × activities ranking orchestrator
#[derive(Debug, Clone)]
pub struct ProfileProcessor {
    profiles: SkillTable,
    activities: SkillTable,
    matrix: DecisionMatrix,
    classifier: CriteriaClassifier,
    ranker: ProximityRanker,
    /// Indexed like `activities`
    results: Vec<Option<ActivityRanking>>,
}

impl ProfileProcessor {
    /// Validates skill sets and value ranges; activity columns are reordered
    /// to the profile skill order.
    pub fn new(
        profiles: SkillTable,
        activities: SkillTable,
        classifier: CriteriaClassifier,
        formula: ProximityFormula,
    ) -> Result<Self> {
        profiles.ensure_same_skills(&activities)?;
        classifier.validate_levels(profiles.cells())?;
        classifier.validate_levels(activities.cells())?;

        let activities = activities.aligned_to(profiles.skills())?;
        let matrix = profiles.to_decision_matrix()?;

        info!(
            profiles = profiles.len(),
            activities = activities.len(),
            skills = profiles.skills().len(),
            formula = %formula,
            "profile processor initialized"
        );

        Ok(Self {
            results: vec![None; activities.len()],
            profiles,
            activities,
            matrix,
            classifier,
            ranker: ProximityRanker::new(formula),
        })
    }

    pub fn profiles(&self) -> &SkillTable {
        &self.profiles
    }

    pub fn activities(&self) -> &SkillTable {
        &self.activities
    }

    pub fn skills(&self) -> &[String] {
        self.profiles.skills()
    }

    pub fn classifier(&self) -> &CriteriaClassifier {
        &self.classifier
    }

    pub fn formula(&self) -> ProximityFormula {
        self.ranker.formula()
    }

    fn activity_index(&self, activity: &str) -> Result<usize> {
        self.activities.position(activity).ok_or_else(|| {
            SelectionError::validation(format!(
                "activity '{}' not found; available activities: {}",
                activity,
                self.activities.names().join(", ")
            ))
        })
    }

    pub fn required_levels(&self, activity: &str) -> Result<&[f64]> {
        let idx = self.activity_index(activity)?;
        Ok(&self.activities.values()[idx])
    }

    pub fn criteria_info(&self, activity: &str) -> Result<Vec<CriterionInfo>> {
        let required = self.required_levels(activity)?;
        Ok(self.classifier.criteria_info(self.skills(), required))
    }

    pub fn analyze(&self, activity: &str) -> Result<RequirementAnalysis> {
        let required = self.required_levels(activity)?;
        Ok(self.classifier.analyze(self.skills(), required))
    }

    fn rank_activity(&self, idx: usize, strategy: &WeightStrategy) -> Result<ActivityRanking> {
        let activity = &self.activities.names()[idx];
        let required = &self.activities.values()[idx];

        let directions = self.classifier.classify(required);
        let weights = strategy.generate(required)?;
        let report = self.ranker.rank_labelled(
            &self.matrix,
            &weights,
            &directions,
            self.profiles.names(),
            self.skills(),
        )?;

        debug!(
            activity = %activity,
            best = %report.best().alternative,
            coefficient = report.best().coefficient,
            "activity ranked"
        );

        Ok(ActivityRanking {
            activity: activity.clone(),
            required_levels: required.clone(),
            directions,
            strategy: strategy.kind(),
            weights,
            report,
        })
    }

    /// Rank every profile for one activity; replaces any earlier result for it
    pub fn process_activity(
        &mut self,
        activity: &str,
        strategy: &WeightStrategy,
    ) -> Result<&ActivityRanking> {
        let idx = self.activity_index(activity)?;
        let ranking = self.rank_activity(idx, strategy)?;
        Ok(self.results[idx].insert(ranking))
    }

    /// Rank every activity. Nothing is stored unless all of them succeed.
    pub fn process_all_activities(&mut self, strategy: &WeightStrategy) -> Result<usize> {
        self.process_all_activities_with(strategy, |_| {})
    }

    /// Same as [`ProfileProcessor::process_all_activities`], calling `on_ranked`
    /// with each activity name as it completes
    pub fn process_all_activities_with<F>(
        &mut self,
        strategy: &WeightStrategy,
        mut on_ranked: F,
    ) -> Result<usize>
    where
        F: FnMut(&str),
    {
        let mut rankings = Vec::with_capacity(self.activities.len());
        for idx in 0..self.activities.len() {
            let ranking = self.rank_activity(idx, strategy)?;
            on_ranked(&ranking.activity);
            rankings.push(Some(ranking));
        }
        self.results = rankings;
        info!(activities = self.results.len(), strategy = %strategy.kind(), "all activities ranked");
        Ok(self.results.len())
    }

    /// Processed activities in activity table order
    pub fn rankings(&self) -> impl Iterator<Item = &ActivityRanking> {
        self.results.iter().flatten()
    }

    pub fn ranking(&self, activity: &str) -> Option<&ActivityRanking> {
        self.activities
            .position(activity)
            .and_then(|idx| self.results[idx].as_ref())
    }

    pub fn n_processed(&self) -> usize {
        self.rankings().count()
    }

    fn ensure_processed(&self) -> Result<()> {
        if self.n_processed() == 0 {
            return Err(SelectionError::state(
                "no activities have been processed yet; run process_activity or process_all_activities first",
            ));
        }
        Ok(())
    }

    /// Top-N `"name (0.xxxx)"` entries per processed activity
    pub fn ranking_matrix(&self, top_n: usize) -> Result<Vec<RankingRow>> {
        self.ensure_processed()?;
        Ok(self
            .rankings()
            .map(|ranking| RankingRow {
                activity: ranking.activity.clone(),
                entries: ranking
                    .top(top_n)
                    .iter()
                    .map(|r| format!("{} ({:.4})", r.alternative, r.coefficient))
                    .collect(),
            })
            .collect())
    }

    /// Processed activities × profiles coefficients, profiles in input order
    pub fn score_matrix(&self) -> Result<ScoreMatrix> {
        self.ensure_processed()?;
        let (activities, values): (Vec<String>, Vec<Vec<f64>>) = self
            .rankings()
            .map(|ranking| (ranking.activity.clone(), ranking.report.coefficients().to_vec()))
            .unzip();
        ScoreMatrix::new(activities, self.profiles.names().to_vec(), values)
    }

    pub fn best_per_activity(&self) -> Result<Vec<BestMatch>> {
        self.ensure_processed()?;
        Ok(self
            .rankings()
            .map(|ranking| BestMatch {
                activity: ranking.activity.clone(),
                profile: ranking.best().alternative.clone(),
                coefficient: ranking.best().coefficient,
            })
            .collect())
    }
}
