//! Command entry points: ranking, assignment, formula comparison, dataset
//! generation and benchmarking.

pub mod config;
pub mod processor;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::benchmark::{host_description, PerformanceBenchmark};
use crate::error::{Result, SelectionError};
use crate::model::SkillTable;
use crate::optimization::{
    AssignmentMethod, AssignmentResult, AssignmentSolver, CriteriaClassifier, ProximityFormula,
    WeightStrategy,
};
use crate::ui::report;
use crate::utils::csv_io::{
    load_score_matrix, load_skill_table, safe_file_name, save_with, write_assignment,
    write_ranking_matrix, write_score_matrix,
};
use crate::utils::dataset::{generate_pair, write_pair, DatasetSpec};

use config::SelectionConfig;
use processor::ProfileProcessor;

pub const FULL_RESULTS_FILE: &str = "full_results_matrix.csv";
pub const RANKING_MATRIX_FILE: &str = "ranking_matrix.csv";
pub const ASSIGNMENT_FILE: &str = "optimal_assignment.csv";

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map_err(|e| SelectionError::configuration(format!("progress bar template: {}", e)))?
        .progress_chars("##-");
    pb.set_style(style);
    Ok(pb)
}

/// Everything a `rank` run produced
#[derive(Debug)]
pub struct SelectionOutcome {
    pub processor: ProfileProcessor,
    pub assignment: Option<AssignmentResult>,
    pub written: Vec<PathBuf>,
}

/// Load both tables, rank one or all activities, save results and (when every
/// activity was ranked and assignment is enabled) solve the assignment.
pub fn run_selection(
    config: &SelectionConfig,
    activity: Option<&str>,
    details: bool,
) -> Result<SelectionOutcome> {
    let resolved = config.resolve()?;
    report::print_header();
    report::print_config_summary(config, &resolved);

    let profiles = load_skill_table(&config.data.profiles_file)?;
    let activities = load_skill_table(&config.data.activities_file)?;
    println!(
        "\n{} {} profiles, {} activities, {} skills",
        "Loaded".bold().green(),
        profiles.len(),
        activities.len(),
        profiles.skills().len()
    );

    let mut processor = ProfileProcessor::new(
        profiles,
        activities,
        resolved.classifier,
        resolved.proximity_formula,
    )?;
    let strategy = config.weight_strategy(resolved.weight_strategy, processor.skills())?;
    let top_n = config.output_settings.top_n_profiles;

    match activity {
        Some(name) => {
            let ranking = processor.process_activity(name, &strategy)?;
            report::print_activity_ranking(ranking, None);
        }
        None => {
            let pb = progress_bar(processor.activities().len() as u64)?;
            processor.process_all_activities_with(&strategy, |name| {
                pb.set_message(name.to_string());
                pb.inc(1);
            })?;
            pb.finish_with_message("all activities ranked");
        }
    }

    if details || config.output_settings.verbose {
        for ranking in processor.rankings() {
            let info = processor.criteria_info(&ranking.activity)?;
            let analysis = processor.analyze(&ranking.activity)?;
            report::print_criteria_details(&ranking.activity, &info, &analysis);
            report::print_trace(ranking, processor.skills());
        }
    }

    report::print_best_per_activity(&processor.best_per_activity()?, &resolved.classifier, processor.formula());
    report::print_ranking_matrix(&processor.ranking_matrix(top_n)?);

    let rankings_dir = config.rankings_dir();
    let mut written = save_results(&processor, &rankings_dir, top_n)?;

    let mut assignment = None;
    if activity.is_none() && config.assignment_settings.enabled {
        let mut solver = AssignmentSolver::new(processor.score_matrix()?);
        let (square, explanation) = solver.check_square();
        if !square {
            warn!("{}", explanation);
        }
        println!("\n{}", explanation.dimmed());
        let result = solver.solve(resolved.assignment_method)?;
        report::print_assignment(&result);

        let path = rankings_dir.join(ASSIGNMENT_FILE);
        save_with(&path, |w| write_assignment(w, &result))?;
        written.push(path);
        assignment = Some(result);
    }

    report::print_written(&written);
    Ok(SelectionOutcome {
        processor,
        assignment,
        written,
    })
}

/// Write the full results matrix, the top-N ranking matrix and one text
/// report per processed activity into `dir`
pub fn save_results(processor: &ProfileProcessor, dir: &Path, top_n: usize) -> Result<Vec<PathBuf>> {
    let reports = report_file_names(processor)?;
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let scores = processor.score_matrix()?;
    let path = dir.join(FULL_RESULTS_FILE);
    save_with(&path, |w| write_score_matrix(w, &scores))?;
    written.push(path);

    let rows = processor.ranking_matrix(top_n)?;
    let path = dir.join(RANKING_MATRIX_FILE);
    save_with(&path, |w| write_ranking_matrix(w, &rows))?;
    written.push(path);

    for (ranking, file_name) in processor.rankings().zip(reports) {
        let path = dir.join(file_name);
        fs::write(&path, report::ranking_text(ranking))?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "results saved");
    Ok(written)
}

/// `ranking_<activity>.txt` per processed activity; two activities that map
/// to the same file name are rejected
fn report_file_names(processor: &ProfileProcessor) -> Result<Vec<String>> {
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    let mut names = Vec::new();
    for ranking in processor.rankings() {
        let name = format!("ranking_{}.txt", safe_file_name(&ranking.activity));
        if let Some(previous) = seen.insert(name.clone(), &ranking.activity) {
            return Err(SelectionError::validation(format!(
                "activities '{}' and '{}' would both be saved as {}",
                previous, ranking.activity, name
            )));
        }
        names.push(name);
    }
    Ok(names)
}

/// Solve the assignment for a saved `full_results_matrix.csv`
pub fn run_assignment(
    scores_path: &Path,
    method: AssignmentMethod,
    output: Option<&Path>,
) -> Result<AssignmentResult> {
    let scores = load_score_matrix(scores_path)?;
    let mut solver = AssignmentSolver::new(scores);
    let (_, explanation) = solver.check_square();
    println!("{}", explanation.dimmed());

    let result = solver.solve(method)?;
    report::print_assignment(&result);

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => scores_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(ASSIGNMENT_FILE),
    };
    save_with(&path, |w| write_assignment(w, &result))?;
    report::print_written(&[path]);
    Ok(result)
}

/// Assignment produced under one proximity formula
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaOutcome {
    pub formula: ProximityFormula,
    pub result: AssignmentResult,
}

/// Activity whose assigned profile depends on the formula
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentDifference {
    pub activity: String,
    /// Assigned profile per formula, in [`FormulaComparison::outcomes`] order
    pub profiles: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaComparison {
    pub outcomes: Vec<FormulaOutcome>,
    pub differences: Vec<AssignmentDifference>,
}

/// Rank and assign with every proximity formula on the same data
pub fn compare_formulas(
    profiles: &SkillTable,
    activities: &SkillTable,
    classifier: CriteriaClassifier,
    strategy: &WeightStrategy,
    method: AssignmentMethod,
) -> Result<FormulaComparison> {
    let mut outcomes = Vec::new();
    for &formula in ProximityFormula::all() {
        let mut processor =
            ProfileProcessor::new(profiles.clone(), activities.clone(), classifier, formula)?;
        processor.process_all_activities(strategy)?;
        let result = AssignmentSolver::new(processor.score_matrix()?).solve(method)?;
        outcomes.push(FormulaOutcome { formula, result });
    }

    let differences = activities
        .names()
        .iter()
        .filter_map(|activity| {
            let profiles: Vec<Option<String>> = outcomes
                .iter()
                .map(|o| o.result.assigned_to(activity).map(|p| p.alternative.clone()))
                .collect();
            let differs = profiles.windows(2).any(|w| w[0] != w[1]);
            differs.then(|| AssignmentDifference {
                activity: activity.clone(),
                profiles,
            })
        })
        .collect();

    Ok(FormulaComparison {
        outcomes,
        differences,
    })
}

pub fn run_formula_comparison(config: &SelectionConfig) -> Result<FormulaComparison> {
    let resolved = config.resolve()?;
    report::print_header();

    let profiles = load_skill_table(&config.data.profiles_file)?;
    let activities = load_skill_table(&config.data.activities_file)?;
    let strategy = config.weight_strategy(resolved.weight_strategy, profiles.skills())?;

    let comparison = compare_formulas(
        &profiles,
        &activities,
        resolved.classifier,
        &strategy,
        resolved.assignment_method,
    )?;
    report::print_formula_comparison(&comparison);
    Ok(comparison)
}

/// Generate and write a random dataset pair
pub fn run_generate(spec: &DatasetSpec, dir: &Path, prefix: &str) -> Result<(PathBuf, PathBuf)> {
    let (profiles, activities) = generate_pair(spec)?;
    let paths = write_pair(dir, prefix, &profiles, &activities)?;
    report::print_dataset_summary(&profiles, &activities);
    report::print_written(&[paths.0.clone(), paths.1.clone()]);
    Ok(paths)
}

/// Time every case and print a comparison table; optionally save a CSV report
pub fn run_benchmark(
    cases: &[DatasetSpec],
    formula: ProximityFormula,
    repeats: usize,
    report_path: Option<&Path>,
) -> Result<PerformanceBenchmark> {
    let mut bench = PerformanceBenchmark::new(formula, repeats)?;
    report::print_header();
    println!("{} {}", "Host:".bold(), host_description());
    println!(
        "{} {} case(s), {} repeat(s), {} formula",
        "Benchmark:".bold(),
        cases.len(),
        repeats,
        formula
    );

    let pb = progress_bar(cases.len() as u64)?;
    for spec in cases {
        pb.set_message(format!(
            "{}x{}x{}",
            spec.n_profiles, spec.n_activities, spec.n_skills
        ));
        bench.run_case(spec)?;
        pb.inc(1);
    }
    pb.finish_with_message("benchmark complete");

    report::print_benchmark(bench.records());
    if let Some(path) = report_path {
        bench.save_csv(path)?;
        report::print_written(&[path.to_path_buf()]);
    }
    Ok(bench)
}
