//! JSON configuration with validated fields and command-line overrides.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SelectionError};
use crate::optimization::{
    AssignmentMethod, CriteriaClassifier, ProximityFormula, WeightStrategy, WeightStrategyKind,
};

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSettings {
    pub profiles_file: PathBuf,
    pub activities_file: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            profiles_file: PathBuf::from("data/input/profiles.csv"),
            activities_file: PathBuf::from("data/input/activities.csv"),
            output_dir: PathBuf::from("data/output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdSettings {
    #[serde(deserialize_with = "validate_finite_f64")]
    pub threshold: f64,
    #[serde(deserialize_with = "validate_finite_f64")]
    pub min_threshold: f64,
    #[serde(deserialize_with = "validate_finite_f64")]
    pub max_threshold: f64,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            min_threshold: 0.0,
            max_threshold: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TopsisSettings {
    pub proximity_formula: String,
}

impl Default for TopsisSettings {
    fn default() -> Self {
        Self {
            proximity_formula: ProximityFormula::Standard.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeightSettings {
    pub strategy: String,
    /// Skill name -> importance score, used by `importance_based` and `hybrid`
    pub importance_scores: BTreeMap<String, f64>,
    #[serde(deserialize_with = "validate_finite_f64")]
    pub alpha: f64,
}

impl Default for WeightSettings {
    fn default() -> Self {
        Self {
            strategy: WeightStrategyKind::Uniform.to_string(),
            importance_scores: BTreeMap::new(),
            alpha: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AssignmentSettings {
    pub enabled: bool,
    pub method: String,
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            method: AssignmentMethod::Auto.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub verbose: bool,
    #[serde(deserialize_with = "validate_positive_usize")]
    pub top_n_profiles: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            top_n_profiles: 3,
        }
    }
}

/// Top-level `config.json`; every section falls back to its defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub data: DataSettings,
    pub threshold_settings: ThresholdSettings,
    pub topsis_settings: TopsisSettings,
    pub weight_settings: WeightSettings,
    pub assignment_settings: AssignmentSettings,
    pub output_settings: OutputSettings,
}

fn validate_finite_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("Value must be a finite number"))
    }
}

fn validate_positive_usize<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = usize::deserialize(deserializer)?;
    if value > 0 {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("Value must be positive"))
    }
}

/// Values given on the command line; `None` keeps the file value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub profiles_file: Option<PathBuf>,
    pub activities_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub min_threshold: Option<f64>,
    pub max_threshold: Option<f64>,
    pub weight_strategy: Option<String>,
    pub proximity_formula: Option<String>,
    pub assignment_method: Option<String>,
    pub no_assign: bool,
    pub verbose: bool,
}

/// Name-valued settings resolved into their enums
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub classifier: CriteriaClassifier,
    pub proximity_formula: ProximityFormula,
    pub weight_strategy: WeightStrategyKind,
    pub assignment_method: AssignmentMethod,
}

impl SelectionConfig {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Like [`SelectionConfig::load`], but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "configuration file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(path) = &overrides.profiles_file {
            self.data.profiles_file = path.clone();
        }
        if let Some(path) = &overrides.activities_file {
            self.data.activities_file = path.clone();
        }
        if let Some(path) = &overrides.output_dir {
            self.data.output_dir = path.clone();
        }
        if let Some(threshold) = overrides.threshold {
            self.threshold_settings.threshold = threshold;
        }
        if let Some(min) = overrides.min_threshold {
            self.threshold_settings.min_threshold = min;
        }
        if let Some(max) = overrides.max_threshold {
            self.threshold_settings.max_threshold = max;
        }
        if let Some(strategy) = &overrides.weight_strategy {
            self.weight_settings.strategy = strategy.clone();
        }
        if let Some(formula) = &overrides.proximity_formula {
            self.topsis_settings.proximity_formula = formula.clone();
        }
        if let Some(method) = &overrides.assignment_method {
            self.assignment_settings.method = method.clone();
        }
        if overrides.no_assign {
            self.assignment_settings.enabled = false;
        }
        if overrides.verbose {
            self.output_settings.verbose = true;
        }
    }

    /// Parse every name-valued setting and check the threshold range
    pub fn resolve(&self) -> Result<ResolvedSettings> {
        let t = &self.threshold_settings;
        Ok(ResolvedSettings {
            classifier: CriteriaClassifier::new(t.threshold, t.min_threshold, t.max_threshold)?,
            proximity_formula: self.topsis_settings.proximity_formula.parse()?,
            weight_strategy: self.weight_settings.strategy.parse()?,
            assignment_method: self.assignment_settings.method.parse()?,
        })
    }

    /// Build a parameterized strategy, aligning importance scores to `skills`
    pub fn weight_strategy(&self, kind: WeightStrategyKind, skills: &[String]) -> Result<WeightStrategy> {
        let importance = || -> Result<Vec<f64>> {
            skills
                .iter()
                .map(|skill| {
                    self.weight_settings
                        .importance_scores
                        .get(skill)
                        .copied()
                        .ok_or_else(|| {
                            SelectionError::validation(format!(
                                "importance score missing for skill '{}'",
                                skill
                            ))
                        })
                })
                .collect()
        };

        Ok(match kind {
            WeightStrategyKind::Uniform => WeightStrategy::Uniform,
            WeightStrategyKind::RequirementBased => WeightStrategy::RequirementBased,
            WeightStrategyKind::ImportanceBased => WeightStrategy::ImportanceBased {
                importance: importance()?,
            },
            WeightStrategyKind::Hybrid => {
                let alpha = self.weight_settings.alpha;
                if !(0.0..=1.0).contains(&alpha) {
                    return Err(SelectionError::configuration(format!(
                        "hybrid alpha must be within [0, 1], got {}",
                        alpha
                    )));
                }
                WeightStrategy::Hybrid {
                    importance: importance()?,
                    alpha,
                }
            }
        })
    }

    /// `<output_dir>/rankings`
    pub fn rankings_dir(&self) -> PathBuf {
        self.data.output_dir.join("rankings")
    }
}
