//! topsis-assign
//!
//! Ranks profiles against activities with TOPSIS and assigns one profile per
//! activity.
//!
//! # Commands
//!
//! - `rank`: rank profiles for one or all activities, save results, solve the assignment
//! - `assign`: solve the assignment for a saved full results matrix
//! - `compare-formulas`: compare standard and variant proximity formulas
//! - `generate`: write a random profiles/activities dataset
//! - `benchmark`: time the pipeline on generated datasets

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::*;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use topsis_assign::core::config::{ConfigOverrides, SelectionConfig};
use topsis_assign::optimization::{AssignmentMethod, ProximityFormula};
use topsis_assign::utils::dataset::DatasetSpec;
use topsis_assign::{
    run_assignment, run_benchmark, run_formula_comparison, run_generate, run_selection, Result,
    VERSION,
};

#[derive(Parser)]
#[command(name = "topsis-assign")]
#[command(version = VERSION)]
#[command(about = "TOPSIS profile selection with optimal profile/activity assignment")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Configuration file plus the overrides shared by `rank` and `compare-formulas`
#[derive(Args)]
struct ConfigArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Profiles CSV file (overrides config)
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Activities CSV file (overrides config)
    #[arg(long)]
    activities: Option<PathBuf>,

    /// Skill level threshold (overrides config)
    #[arg(long)]
    threshold: Option<f64>,

    /// Minimum skill level (overrides config)
    #[arg(long)]
    min_threshold: Option<f64>,

    /// Maximum skill level (overrides config)
    #[arg(long)]
    max_threshold: Option<f64>,

    /// uniform, requirement_based, importance_based or hybrid (overrides config)
    #[arg(long)]
    weight_strategy: Option<String>,

    /// auto, exact (hungarian) or heuristic (greedy) (overrides config)
    #[arg(long)]
    assignment_method: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank profiles for every activity (or one) and solve the assignment
    Rank {
        #[command(flatten)]
        config: ConfigArgs,

        /// standard or variant (overrides config)
        #[arg(long)]
        proximity_formula: Option<String>,

        /// Process only this activity
        #[arg(long)]
        activity: Option<String>,

        /// Skip the optimal assignment
        #[arg(long)]
        no_assign: bool,

        /// Print criteria analysis and TOPSIS details per activity
        #[arg(long)]
        details: bool,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Solve the assignment for a saved full results matrix
    Assign {
        /// Activities x profiles coefficients CSV
        #[arg(default_value = "data/output/rankings/full_results_matrix.csv")]
        scores: PathBuf,

        /// auto, exact (hungarian) or heuristic (greedy)
        #[arg(short, long, default_value = "auto")]
        method: String,

        /// Output CSV (default: optimal_assignment.csv next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare the standard and variant proximity formulas
    CompareFormulas {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Generate a random profiles/activities dataset
    Generate {
        #[arg(long, default_value_t = 100)]
        n_profiles: usize,

        #[arg(long, default_value_t = 100)]
        n_activities: usize,

        #[arg(long, default_value_t = 20)]
        n_skills: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(short, long, default_value = "data/input")]
        output_dir: PathBuf,

        /// File name prefix: <prefix>_profiles.csv, <prefix>_activities.csv
        #[arg(long, default_value = "large")]
        prefix: String,
    },
    /// Time the pipeline on generated datasets
    Benchmark {
        /// Dataset sizes as PROFILESxACTIVITIESxSKILLS
        #[arg(long = "size", value_parser = parse_size, default_values = ["100x100x20", "500x500x30"])]
        sizes: Vec<DatasetSpec>,

        /// Runs per size
        #[arg(long, default_value_t = 3)]
        repeats: usize,

        /// standard or variant
        #[arg(long, default_value = "variant")]
        proximity_formula: String,

        /// Write a CSV report here
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn parse_size(s: &str) -> std::result::Result<DatasetSpec, String> {
    let parts: Vec<usize> = s
        .split('x')
        .map(|p| p.trim().parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("invalid size '{}': {}", s, e))?;
    match parts.as_slice() {
        [p, a, k] if *p > 0 && *a > 0 && *k > 0 => Ok(DatasetSpec::new(*p, *a, *k)),
        _ => Err(format!(
            "invalid size '{}': expected three positive numbers like 100x100x20",
            s
        )),
    }
}

fn load_config(args: ConfigArgs, mut overrides: ConfigOverrides) -> Result<SelectionConfig> {
    let mut config = SelectionConfig::load_or_default(&args.config)?;
    overrides.profiles_file = args.profiles;
    overrides.activities_file = args.activities;
    overrides.threshold = args.threshold;
    overrides.min_threshold = args.min_threshold;
    overrides.max_threshold = args.max_threshold;
    overrides.weight_strategy = args.weight_strategy;
    overrides.assignment_method = args.assignment_method;
    config.apply_overrides(&overrides);
    debug!(?config, "effective configuration");
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Rank {
            config,
            proximity_formula,
            activity,
            no_assign,
            details,
            output,
        } => {
            let config = load_config(
                config,
                ConfigOverrides {
                    proximity_formula,
                    output_dir: output,
                    no_assign,
                    verbose: cli.verbose > 0,
                    ..Default::default()
                },
            )?;
            run_selection(&config, activity.as_deref(), details)?;
        }
        Commands::Assign {
            scores,
            method,
            output,
        } => {
            let method: AssignmentMethod = method.parse()?;
            run_assignment(&scores, method, output.as_deref())?;
        }
        Commands::CompareFormulas { config } => {
            let config = load_config(config, ConfigOverrides::default())?;
            run_formula_comparison(&config)?;
        }
        Commands::Generate {
            n_profiles,
            n_activities,
            n_skills,
            seed,
            output_dir,
            prefix,
        } => {
            let spec = DatasetSpec::new(n_profiles, n_activities, n_skills).with_seed(seed);
            run_generate(&spec, &output_dir, &prefix)?;
        }
        Commands::Benchmark {
            sizes,
            repeats,
            proximity_formula,
            report,
        } => {
            let formula: ProximityFormula = proximity_formula.parse()?;
            run_benchmark(&sizes, formula, repeats, report.as_deref())?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".bold().red(), e);
        std::process::exit(1);
    }
}
