//! End-to-end runs over files on disk.

use std::fs;

use tempfile::tempdir;
use topsis_assign::core::config::{ConfigOverrides, SelectionConfig};
use topsis_assign::core::{save_results, ASSIGNMENT_FILE, FULL_RESULTS_FILE, RANKING_MATRIX_FILE};
use topsis_assign::model::ScoreMatrix;
use topsis_assign::optimization::{
    AssignmentMethod, AssignmentSolver, CriteriaClassifier, Direction, ProximityFormula,
    ProximityRanker, SolveMethod, WeightStrategy,
};
use topsis_assign::utils::csv_io::{load_score_matrix, load_skill_table};
use topsis_assign::utils::dataset::{generate_pair, write_pair, DatasetSpec};
use topsis_assign::{run_assignment, run_selection, ProfileProcessor, SelectionError};

const PROFILES: &str = "\
Profile,Rust,SQL,Ops
Alice,4.5,3.0,2.0
Bob,2.0,5.0,3.5
Carol,3.0,2.5,4.5
";

const ACTIVITIES: &str = "\
Activity,Ops,SQL,Rust
Backend Dev,2.0,3.5,4.5
Data/Reporting,1.0,5.0,2.0
Platform Ops,5.0,2.0,3.0
";

fn write_inputs(dir: &std::path::Path) -> SelectionConfig {
    let profiles = dir.join("profiles.csv");
    let activities = dir.join("activities.csv");
    fs::write(&profiles, PROFILES).unwrap();
    fs::write(&activities, ACTIVITIES).unwrap();

    let mut config = SelectionConfig::default();
    config.apply_overrides(&ConfigOverrides {
        profiles_file: Some(profiles),
        activities_file: Some(activities),
        output_dir: Some(dir.join("out")),
        ..Default::default()
    });
    config
}

#[test]
fn two_alternative_scenario_ranks_and_assigns_first() {
    let matrix = topsis_assign::model::DecisionMatrix::new(vec![vec![4.0, 4.0], vec![2.0, 6.0]])
        .unwrap();
    let report = ProximityRanker::new(ProximityFormula::Standard)
        .rank(&matrix, &[0.5, 0.5], &[Direction::Beneficial, Direction::Beneficial])
        .unwrap();
    assert_eq!(report.best().alternative_index, 0);
    assert!((report.best().coefficient - 0.6172).abs() < 1e-4);

    // second activity built so the exact solver has a unique optimum
    let coefficients = report.coefficients().to_vec();
    let scores = ScoreMatrix::unlabelled(vec![coefficients, vec![0.0, 0.5]]).unwrap();
    let mut solver = AssignmentSolver::new(scores);
    let result = solver.solve(AssignmentMethod::Exact).unwrap();
    assert_eq!(result.pairs[0].alternative_index, 0);
    assert_eq!(result.method, SolveMethod::Exact);
}

#[test]
fn rank_command_writes_every_result_file() {
    let dir = tempdir().unwrap();
    let config = write_inputs(dir.path());

    let outcome = run_selection(&config, None, true).unwrap();
    let rankings = dir.path().join("out").join("rankings");

    for name in [FULL_RESULTS_FILE, RANKING_MATRIX_FILE, ASSIGNMENT_FILE] {
        assert!(rankings.join(name).exists(), "{} missing", name);
    }
    assert!(rankings.join("ranking_Backend_Dev.txt").exists());
    assert!(rankings.join("ranking_Data_Reporting.txt").exists());
    assert_eq!(outcome.written.len(), 6);

    let assignment = outcome.assignment.unwrap();
    assert_eq!(assignment.method, SolveMethod::Exact);
    assert_eq!(assignment.n_assignments(), 3);

    let saved = load_score_matrix(&rankings.join(FULL_RESULTS_FILE)).unwrap();
    let live = outcome.processor.score_matrix().unwrap();
    assert_eq!(saved.activities(), live.activities());
    assert_eq!(saved.alternatives(), live.alternatives());
    for i in 0..live.n_activities() {
        for j in 0..live.n_alternatives() {
            assert!((saved.get(i, j) - live.get(i, j)).abs() < 1e-6);
        }
    }

    let text = fs::read_to_string(rankings.join(ASSIGNMENT_FILE)).unwrap();
    assert!(text.starts_with("Activity,Assigned_Profile,Score\n"));
    assert!(text.contains("Method,EXACT,"));
}

#[test]
fn single_activity_run_skips_assignment() {
    let dir = tempdir().unwrap();
    let config = write_inputs(dir.path());

    let outcome = run_selection(&config, Some("Platform Ops"), false).unwrap();
    assert!(outcome.assignment.is_none());
    assert_eq!(outcome.processor.n_processed(), 1);
    assert_eq!(
        outcome.processor.ranking("Platform Ops").unwrap().best().alternative,
        "Carol"
    );
}

#[test]
fn unknown_activity_fails_without_output() {
    let dir = tempdir().unwrap();
    let config = write_inputs(dir.path());
    let err = run_selection(&config, Some("Marketing"), false).unwrap_err();
    assert!(matches!(err, SelectionError::Validation(_)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn assign_command_reads_saved_matrix() {
    let dir = tempdir().unwrap();
    let scores = dir.path().join("scores.csv");
    fs::write(&scores, "Activity,P1,P2,P3\nA,0.9,0.8,0.1\nB,0.8,0.1,0.2\n").unwrap();

    let result = run_assignment(&scores, AssignmentMethod::Auto, None).unwrap();
    assert_eq!(result.method, SolveMethod::Heuristic);
    assert_eq!(result.unassigned_alternatives, vec!["P2".to_string()]);
    assert!(dir.path().join(ASSIGNMENT_FILE).exists());

    let err = run_assignment(&scores, AssignmentMethod::Exact, None).unwrap_err();
    assert!(matches!(err, SelectionError::Operation(_)));
}

#[test]
fn mismatched_skill_sets_are_reported() {
    let dir = tempdir().unwrap();
    let mut config = write_inputs(dir.path());
    let activities = dir.path().join("bad_activities.csv");
    fs::write(&activities, "Activity,Rust,SQL,Go\nX,1,2,3\n").unwrap();
    config.data.activities_file = activities;

    let err = run_selection(&config, None, false).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("missing in activity: Ops"), "{}", msg);
    assert!(msg.contains("missing in profile: Go"), "{}", msg);
}

#[test]
fn config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "threshold_settings": { "threshold": 2.0, "min_threshold": 0.0, "max_threshold": 5.0 },
            "topsis_settings": { "proximity_formula": "variant" },
            "weight_settings": { "strategy": "hybrid", "importance_scores": { "Rust": 2, "SQL": 1, "Ops": 1 }, "alpha": 0.25 },
            "assignment_settings": { "enabled": false, "method": "greedy" }
        }"#,
    )
    .unwrap();

    let config = SelectionConfig::load(&path).unwrap();
    let resolved = config.resolve().unwrap();
    assert_eq!(resolved.proximity_formula, ProximityFormula::Variant);
    assert_eq!(resolved.assignment_method, AssignmentMethod::Heuristic);
    assert!(!config.assignment_settings.enabled);

    let skills = vec!["Rust".to_string(), "SQL".to_string(), "Ops".to_string()];
    match config.weight_strategy(resolved.weight_strategy, &skills).unwrap() {
        WeightStrategy::Hybrid { importance, alpha } => {
            assert_eq!(importance, vec![2.0, 1.0, 1.0]);
            assert_eq!(alpha, 0.25);
        }
        other => panic!("unexpected strategy {:?}", other),
    }

    let missing = SelectionConfig::load_or_default(&dir.path().join("absent.json")).unwrap();
    assert_eq!(missing, SelectionConfig::default());
    assert!(matches!(
        SelectionConfig::load(&dir.path().join("absent.json")),
        Err(SelectionError::Io(_))
    ));
}

#[test]
fn generated_dataset_loads_and_processes() {
    let dir = tempdir().unwrap();
    let spec = DatasetSpec::new(12, 12, 6).with_seed(3);
    let (profiles, activities) = generate_pair(&spec).unwrap();
    let (p_path, a_path) = write_pair(dir.path(), "bench", &profiles, &activities).unwrap();
    assert!(p_path.ends_with("bench_profiles.csv"));

    let loaded_profiles = load_skill_table(&p_path).unwrap();
    let loaded_activities = load_skill_table(&a_path).unwrap();
    assert_eq!(loaded_profiles, profiles);

    let classifier = CriteriaClassifier::new(3.0, 0.0, 5.0).unwrap();
    let mut processor = ProfileProcessor::new(
        loaded_profiles,
        loaded_activities,
        classifier,
        ProximityFormula::Variant,
    )
    .unwrap();
    processor
        .process_all_activities(&WeightStrategy::RequirementBased)
        .unwrap();

    let written = save_results(&processor, &dir.path().join("rankings"), 3).unwrap();
    assert_eq!(written.len(), 2 + 12);

    let mut solver = AssignmentSolver::new(processor.score_matrix().unwrap());
    let exact = solver.solve(AssignmentMethod::Auto).unwrap().total_score;
    let greedy = solver.solve(AssignmentMethod::Heuristic).unwrap().total_score;
    assert!(exact >= greedy - 1e-9);
}
