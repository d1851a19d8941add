//! Console reports and the per-activity text report.

use std::fmt::Write as _;
use std::path::PathBuf;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::benchmark::BenchmarkRecord;
use crate::core::config::{ResolvedSettings, SelectionConfig};
use crate::core::processor::{ActivityRanking, BestMatch, RankingRow};
use crate::core::FormulaComparison;
use crate::model::SkillTable;
use crate::optimization::criteria::{CriterionInfo, RequirementAnalysis};
use crate::optimization::{AssignmentResult, CriteriaClassifier, Direction, ProximityFormula};
use crate::stats::format_seconds;
use crate::VERSION;

const WIDTH: usize = 80;

fn separator() -> String {
    "=".repeat(WIDTH)
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn numeric(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

pub fn section(title: &str) {
    println!("\n{}", separator());
    println!("{:^80}", title.bold().cyan());
    println!("{}", separator());
}

pub fn print_header() {
    section(&format!("TOPSIS PROFILE SELECTION v{}", VERSION));
}

pub fn print_config_summary(config: &SelectionConfig, resolved: &ResolvedSettings) {
    println!("{}", "Configuration".bold().yellow());
    println!("━━━━━━━━━━━━━");
    println!("  Profiles file:     {}", config.data.profiles_file.display());
    println!("  Activities file:   {}", config.data.activities_file.display());
    println!("  Output directory:  {}", config.data.output_dir.display());
    let info = resolved.classifier.threshold_info();
    println!(
        "  Threshold:         {} in [{}, {}]",
        info.threshold, info.min_level, info.max_level
    );
    println!(
        "  Criteria:          beneficial {}, cost {}",
        info.beneficial_range, info.cost_range
    );
    println!("  Proximity formula: {}", resolved.proximity_formula);
    println!(
        "  Weight strategy:   {} ({})",
        resolved.weight_strategy,
        resolved.weight_strategy.description()
    );
    if config.assignment_settings.enabled {
        println!("  Assignment method: {}", resolved.assignment_method);
    } else {
        println!("  Assignment method: {}", "disabled".dimmed());
    }
}

fn ranking_table(ranking: &ActivityRanking, limit: Option<usize>) -> Table {
    let mut table = new_table(vec!["Rank", "Profile", "Coefficient", "Percentage", "E+", "E-"]);
    let shown = limit.map_or(ranking.report.ranked.as_slice(), |n| ranking.top(n));
    for r in shown {
        let profile = if r.rank == 1 {
            Cell::new(&r.alternative).fg(Color::Green)
        } else {
            Cell::new(&r.alternative)
        };
        table.add_row(vec![
            numeric(r.rank.to_string()),
            profile,
            numeric(format!("{:.6}", r.coefficient)),
            numeric(format!("{:.2}%", r.percentage)),
            numeric(format!("{:.4}", r.distance_to_best)),
            numeric(format!("{:.4}", r.distance_to_worst)),
        ]);
    }
    table
}

pub fn print_activity_ranking(ranking: &ActivityRanking, limit: Option<usize>) {
    section(&format!("Activity: {}", ranking.activity));
    let best = ranking.best();
    println!(
        "{} {} ({:.6}, {:.2}%)",
        "Best profile:".bold(),
        best.alternative.green().bold(),
        best.coefficient,
        best.percentage
    );
    println!("{}", ranking_table(ranking, limit));
}

pub fn print_criteria_details(activity: &str, info: &[CriterionInfo], analysis: &RequirementAnalysis) {
    println!("\n{} {}", "Criteria analysis:".bold().yellow(), activity);
    let mut table = new_table(vec!["Skill", "Required", "Direction", "Reasoning"]);
    for c in info {
        let direction = match c.direction {
            Direction::Beneficial => Cell::new(c.direction.label()).fg(Color::Green),
            Direction::Cost => Cell::new(c.direction.label()).fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(&c.skill_name),
            numeric(format!("{:.1}", c.required_level)),
            direction,
            Cell::new(&c.reasoning),
        ]);
    }
    println!("{}", table);
    println!(
        "  {} beneficial ({:.1}%), {} cost ({:.1}%); required level avg {:.2}, range [{:.1}, {:.1}]",
        analysis.n_beneficial,
        analysis.percentage_beneficial,
        analysis.n_cost,
        analysis.percentage_cost,
        analysis.avg_required_level,
        analysis.min_required_level,
        analysis.max_required_level
    );
}

/// Weights, ideal points and column norms used for one activity
pub fn print_trace(ranking: &ActivityRanking, skills: &[String]) {
    let trace = &ranking.report.trace;
    let mut table = new_table(vec!["Skill", "Weight", "Column norm", "Ideal best", "Ideal worst"]);
    for (j, skill) in skills.iter().enumerate() {
        table.add_row(vec![
            Cell::new(skill),
            numeric(format!("{:.4}", trace.weighted.weights[j])),
            numeric(format!("{:.4}", trace.normalized.column_norms[j])),
            numeric(format!("{:.4}", trace.ideal.best[j])),
            numeric(format!("{:.4}", trace.ideal.worst[j])),
        ]);
    }
    println!("{}", table);
}

pub fn print_best_per_activity(
    best: &[BestMatch],
    classifier: &CriteriaClassifier,
    formula: ProximityFormula,
) {
    section("PROFILE SELECTION SUMMARY");
    println!(
        "  Threshold {} in [{}, {}], {} formula",
        classifier.threshold(),
        classifier.min_level(),
        classifier.max_level(),
        formula
    );
    let mut table = new_table(vec!["Activity", "Best profile", "Coefficient"]);
    for b in best {
        table.add_row(vec![
            Cell::new(&b.activity),
            Cell::new(&b.profile).fg(Color::Green),
            numeric(format!("{:.6}", b.coefficient)),
        ]);
    }
    println!("{}", table);
}

pub fn print_ranking_matrix(rows: &[RankingRow]) {
    let width = rows.iter().map(|r| r.entries.len()).max().unwrap_or(0);
    let mut header = vec!["Activity".to_string()];
    header.extend((1..=width).map(|rank| format!("Rank {}", rank)));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    for row in rows {
        let mut cells = vec![Cell::new(&row.activity)];
        cells.extend(row.entries.iter().map(Cell::new));
        table.add_row(cells);
    }
    println!("\n{}", "Ranking matrix".bold().yellow());
    println!("{}", table);
}

pub fn print_assignment(result: &AssignmentResult) {
    section(&format!(
        "OPTIMAL ASSIGNMENT - {}",
        result.method.label().to_uppercase()
    ));
    println!("  Number of assignments: {}", result.n_assignments());
    println!("  Sum of proximity values: {:.6}", result.total_score);
    println!("  Average proximity:       {:.6}", result.average_score);

    let mut pairs: Vec<_> = result.pairs.iter().collect();
    pairs.sort_by(|a, b| a.activity.cmp(&b.activity));
    let mut table = new_table(vec!["Activity", "Profile", "Score"]);
    for pair in pairs {
        table.add_row(vec![
            Cell::new(&pair.activity),
            Cell::new(&pair.alternative).fg(Color::Green),
            numeric(format!("{:.6}", pair.score)),
        ]);
    }
    println!("{}", table);

    if !result.unassigned_alternatives.is_empty() {
        println!(
            "{} ({}): {}",
            "Unassigned profiles".yellow(),
            result.unassigned_alternatives.len(),
            result.unassigned_alternatives.join(", ")
        );
    }
    if !result.unassigned_activities.is_empty() {
        println!(
            "{} ({}): {}",
            "Unassigned activities".yellow(),
            result.unassigned_activities.len(),
            result.unassigned_activities.join(", ")
        );
    }
}

pub fn print_formula_comparison(comparison: &FormulaComparison) {
    section("PROXIMITY FORMULA COMPARISON");
    let mut table = new_table(vec!["Formula", "Method", "Assignments", "Total", "Average"]);
    for outcome in &comparison.outcomes {
        table.add_row(vec![
            Cell::new(outcome.formula),
            Cell::new(outcome.result.method),
            numeric(outcome.result.n_assignments().to_string()),
            numeric(format!("{:.6}", outcome.result.total_score)),
            numeric(format!("{:.6}", outcome.result.average_score)),
        ]);
    }
    println!("{}", table);

    if comparison.differences.is_empty() {
        println!("{}", "Both formulas produce the same assignment".green());
        return;
    }

    let mut header = vec!["Activity".to_string()];
    header.extend(comparison.outcomes.iter().map(|o| o.formula.to_string()));
    let mut diff = Table::new();
    diff.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    for d in &comparison.differences {
        let mut cells = vec![Cell::new(&d.activity)];
        cells.extend(
            d.profiles
                .iter()
                .map(|p| Cell::new(p.as_deref().unwrap_or("-"))),
        );
        diff.add_row(cells);
    }
    println!(
        "\n{} {} activities assigned differently",
        "Differences:".bold().yellow(),
        comparison.differences.len()
    );
    println!("{}", diff);
}

fn table_stats(table: &SkillTable) -> (f64, f64, f64) {
    let (min, max, sum, count) = table.cells().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0, 0usize),
        |(lo, hi, sum, n), v| (lo.min(v), hi.max(v), sum + v, n + 1),
    );
    let mean = if count == 0 { 0.0 } else { sum / count as f64 };
    (min, max, mean)
}

pub fn print_dataset_summary(profiles: &SkillTable, activities: &SkillTable) {
    for table in [profiles, activities] {
        let (min, max, mean) = table_stats(table);
        println!(
            "  {} {}: {} x {} skills, range [{:.1}, {:.1}], mean {:.2}",
            "[OK]".green(),
            table.index_label(),
            table.len(),
            table.skills().len(),
            min,
            max,
            mean
        );
    }
}

pub fn print_benchmark(records: &[BenchmarkRecord]) {
    section("BENCHMARK COMPARISON REPORT");
    let mut table = new_table(vec![
        "Dataset",
        "Cells",
        "Generation",
        "Init",
        "TOPSIS (mean)",
        "TOPSIS (median)",
        "TOPSIS (stdev)",
        "Assignment",
        "Total",
        "Peak memory",
        "Per activity",
        "Throughput",
    ]);
    let mut sorted: Vec<&BenchmarkRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.total_cells);
    for r in sorted {
        table.add_row(vec![
            Cell::new(r.label()),
            numeric(r.total_cells.to_string()),
            numeric(r.generation.display_mean()),
            numeric(r.initialization.display_mean()),
            numeric(r.ranking.display_mean()),
            numeric(format_seconds(r.ranking.median)),
            numeric(format_seconds(r.ranking.stdev)),
            numeric(
                r.assignment
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |a| a.display_mean()),
            ),
            numeric(format_seconds(r.total_time())),
            numeric(format!("{:.1} MB", r.peak_memory_mb)),
            numeric(format!("{:.2} ms", r.per_activity_ms())),
            numeric(format!("{:.1} act/s", r.throughput())),
        ]);
    }
    println!("{}", table);
}

pub fn print_written(paths: &[PathBuf]) {
    println!("\n{}", "Files written:".bold());
    for path in paths {
        println!("  - {}", path.display());
    }
}

/// Plain-text report saved as `ranking_<activity>.txt`
pub fn ranking_text(ranking: &ActivityRanking) -> String {
    let best = ranking.best();
    let rule = "-".repeat(WIDTH);
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = writeln!(out, "{}", separator());
    let _ = writeln!(out, "Activity: {}", ranking.activity);
    let _ = writeln!(out, "{}\n", separator());
    let _ = writeln!(out, "Best Profile: {}", best.alternative);
    let _ = writeln!(
        out,
        "Best Coefficient: {:.6} ({:.2}%)\n",
        best.coefficient, best.percentage
    );
    let _ = writeln!(out, "Complete Ranking:");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "{:<6} {:<30} {:<15} {:<15}",
        "Rank", "Profile", "Coefficient", "Percentage"
    );
    let _ = writeln!(out, "{}", rule);
    for r in &ranking.report.ranked {
        let _ = writeln!(
            out,
            "{:<6} {:<30} {:<15.6} {:.2}%",
            r.rank, r.alternative, r.coefficient, r.percentage
        );
    }
    out
}
