//! Performance benchmark over generated datasets
//!
//! Each case times four phases over `repeats` runs: data generation,
//! processor initialization, ranking of every activity, and (square cases
//! only) exact assignment. Resident memory of this process is sampled with
//! `sysinfo` after every run.

use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{info, warn};

use crate::core::processor::ProfileProcessor;
use crate::error::{Result, SelectionError};
use crate::optimization::{
    AssignmentMethod, AssignmentSolver, CriteriaClassifier, ProximityFormula, WeightStrategy,
};
use crate::stats::TimingSummary;
use crate::utils::csv_io::save_with;
use crate::utils::dataset::{generate_pair, DatasetSpec, LEVEL_RANGE};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Timings and memory for one dataset size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    pub n_profiles: usize,
    pub n_activities: usize,
    pub n_skills: usize,
    pub total_cells: usize,
    pub proximity_formula: ProximityFormula,
    pub generation: TimingSummary,
    pub initialization: TimingSummary,
    pub ranking: TimingSummary,
    pub assignment: Option<TimingSummary>,
    pub peak_memory_mb: f64,
}

impl BenchmarkRecord {
    /// Sum of the mean phase timings
    pub fn total_time(&self) -> f64 {
        self.generation.mean
            + self.initialization.mean
            + self.ranking.mean
            + self.assignment.as_ref().map_or(0.0, |a| a.mean)
    }

    pub fn per_activity_ms(&self) -> f64 {
        self.ranking.mean / self.n_activities as f64 * 1e3
    }

    /// Activities ranked per second
    pub fn throughput(&self) -> f64 {
        if self.ranking.mean > 0.0 {
            self.n_activities as f64 / self.ranking.mean
        } else {
            f64::INFINITY
        }
    }

    pub fn label(&self) -> String {
        format!("{}x{}x{}", self.n_profiles, self.n_activities, self.n_skills)
    }
}

/// Collects [`BenchmarkRecord`]s for a fixed formula and repeat count
pub struct PerformanceBenchmark {
    formula: ProximityFormula,
    repeats: usize,
    system: System,
    pid: Option<Pid>,
    records: Vec<BenchmarkRecord>,
}

impl PerformanceBenchmark {
    pub fn new(formula: ProximityFormula, repeats: usize) -> Result<Self> {
        if repeats == 0 {
            return Err(SelectionError::configuration(
                "benchmark repeats must be at least 1",
            ));
        }
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("process id unavailable, memory will be reported as 0: {}", e);
                None
            }
        };
        Ok(Self {
            formula,
            repeats,
            system: System::new(),
            pid,
            records: Vec::new(),
        })
    }

    /// Resident memory of this process in MB (0 when unavailable)
    pub fn memory_mb(&mut self) -> f64 {
        let Some(pid) = self.pid else {
            return 0.0;
        };
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        self.system
            .process(pid)
            .map_or(0.0, |p| p.memory() as f64 / BYTES_PER_MB)
    }

    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }

    pub fn run_case(&mut self, spec: &DatasetSpec) -> Result<&BenchmarkRecord> {
        let classifier = CriteriaClassifier::new(3.0, LEVEL_RANGE.0, LEVEL_RANGE.1)?;
        let square = spec.n_profiles == spec.n_activities;

        let mut generation = Vec::with_capacity(self.repeats);
        let mut initialization = Vec::with_capacity(self.repeats);
        let mut ranking = Vec::with_capacity(self.repeats);
        let mut assignment = Vec::with_capacity(self.repeats);
        let mut peak_memory_mb = self.memory_mb();

        for run in 0..self.repeats {
            let start = Instant::now();
            let (profiles, activities) = generate_pair(spec)?;
            generation.push(start.elapsed().as_secs_f64());

            let start = Instant::now();
            let mut processor =
                ProfileProcessor::new(profiles, activities, classifier, self.formula)?;
            initialization.push(start.elapsed().as_secs_f64());

            let start = Instant::now();
            processor.process_all_activities(&WeightStrategy::Uniform)?;
            ranking.push(start.elapsed().as_secs_f64());

            if square {
                let start = Instant::now();
                let mut solver = AssignmentSolver::new(processor.score_matrix()?);
                solver.solve(AssignmentMethod::Exact)?;
                assignment.push(start.elapsed().as_secs_f64());
            }

            peak_memory_mb = peak_memory_mb.max(self.memory_mb());
            info!(case = %format!("{}x{}x{}", spec.n_profiles, spec.n_activities, spec.n_skills), run = run + 1, "benchmark run complete");
        }

        let summarize = |samples: &[f64]| {
            TimingSummary::from_samples(samples)
                .ok_or_else(|| SelectionError::operation("benchmark produced no timing samples"))
        };

        let record = BenchmarkRecord {
            n_profiles: spec.n_profiles,
            n_activities: spec.n_activities,
            n_skills: spec.n_skills,
            total_cells: spec.total_cells(),
            proximity_formula: self.formula,
            generation: summarize(&generation)?,
            initialization: summarize(&initialization)?,
            ranking: summarize(&ranking)?,
            assignment: TimingSummary::from_samples(&assignment),
            peak_memory_mb,
        };
        self.records.push(record);
        let index = self.records.len() - 1;
        Ok(&self.records[index])
    }

    /// Write one CSV row per record, ordered by total cell count
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        let mut records: Vec<&BenchmarkRecord> = self.records.iter().collect();
        records.sort_by_key(|r| r.total_cells);

        save_with(path, |writer| {
            let mut wtr = csv::Writer::from_writer(writer);
            wtr.write_record([
                "n_profiles",
                "n_activities",
                "n_skills",
                "total_cells",
                "proximity_formula",
                "generation_mean_s",
                "init_mean_s",
                "topsis_mean_s",
                "topsis_median_s",
                "topsis_stdev_s",
                "topsis_min_s",
                "topsis_max_s",
                "assignment_mean_s",
                "total_time_s",
                "peak_memory_mb",
                "per_activity_ms",
                "throughput_act_per_s",
            ])?;
            for r in records {
                wtr.write_record(&[
                    r.n_profiles.to_string(),
                    r.n_activities.to_string(),
                    r.n_skills.to_string(),
                    r.total_cells.to_string(),
                    r.proximity_formula.to_string(),
                    format!("{:.6}", r.generation.mean),
                    format!("{:.6}", r.initialization.mean),
                    format!("{:.6}", r.ranking.mean),
                    format!("{:.6}", r.ranking.median),
                    format!("{:.6}", r.ranking.stdev),
                    format!("{:.6}", r.ranking.min),
                    format!("{:.6}", r.ranking.max),
                    r.assignment
                        .as_ref()
                        .map_or_else(String::new, |a| format!("{:.6}", a.mean)),
                    format!("{:.6}", r.total_time()),
                    format!("{:.1}", r.peak_memory_mb),
                    format!("{:.3}", r.per_activity_ms()),
                    format!("{:.1}", r.throughput()),
                ])?;
            }
            wtr.flush()?;
            Ok(())
        })
    }
}

/// One-line description of the host, e.g. `Ubuntu 22.04 (64-bit)`
pub fn host_description() -> String {
    let info = os_info::get();
    format!("{} {} ({})", info.os_type(), info.version(), info.bitness())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_repeats_is_configuration_error() {
        assert!(matches!(
            PerformanceBenchmark::new(ProximityFormula::Standard, 0),
            Err(SelectionError::Configuration(_))
        ));
    }

    #[test]
    fn square_case_times_assignment() {
        let mut bench = PerformanceBenchmark::new(ProximityFormula::Variant, 2).unwrap();
        let record = bench.run_case(&DatasetSpec::new(6, 6, 4)).unwrap().clone();
        assert_eq!(record.ranking.samples, 2);
        assert!(record.assignment.is_some());
        assert_eq!(record.total_cells, 48);
        assert_eq!(record.label(), "6x6x4");
        assert!(record.total_time() >= record.ranking.mean);
    }

    #[test]
    fn rectangular_case_skips_assignment() {
        let mut bench = PerformanceBenchmark::new(ProximityFormula::Standard, 1).unwrap();
        let record = bench.run_case(&DatasetSpec::new(8, 3, 4)).unwrap();
        assert!(record.assignment.is_none());
        assert_eq!(bench.records().len(), 1);
    }

    #[test]
    fn host_description_is_not_empty() {
        assert!(!host_description().trim().is_empty());
    }
}
