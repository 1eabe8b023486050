//! Configuration types for multi-objective swarm optimization.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One end of a parameter's range.
///
/// The JSON literal decides the parameter type: `true`/`false` is boolean,
/// `3` is an integer and `3.0` is a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Bound {
    /// Numeric value of the bound (`false` = 0, `true` = 1).
    pub fn value(&self) -> f64 {
        match *self {
            Bound::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Bound::Int(i) => i as f64,
            Bound::Float(f) => f,
        }
    }
}

impl From<bool> for Bound {
    fn from(value: bool) -> Self {
        Bound::Bool(value)
    }
}

impl From<i64> for Bound {
    fn from(value: i64) -> Self {
        Bound::Int(value)
    }
}

impl From<i32> for Bound {
    fn from(value: i32) -> Self {
        Bound::Int(value as i64)
    }
}

impl From<f64> for Bound {
    fn from(value: f64) -> Self {
        Bound::Float(value)
    }
}

/// Optimization direction of a single objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
}

impl Direction {
    /// Map a raw objective value into minimization space.
    #[inline]
    pub fn normalize(self, value: f64) -> f64 {
        match self {
            Direction::Minimize => value,
            Direction::Maximize => -value,
        }
    }
}

/// Which bound the boundary initialization places particles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundarySide {
    #[default]
    Lower,
    Upper,
}

/// How initial particle positions are drawn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InitializationMode {
    /// Independent uniform draw per dimension within bounds.
    #[default]
    Random,
    /// Normal draw around `center` with per-dimension `spread`, clamped to bounds.
    Gaussian { center: Vec<f64>, spread: Vec<f64> },
    /// Every particle starts on the same bound.
    Boundary {
        #[serde(default)]
        side: BoundarySide,
    },
}

/// Leader selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    /// Uniform draw over archive entries.
    #[default]
    Random,
    /// Probability inversely proportional to crowding distance.
    LowerWeightedCrowdingDistance,
    /// Probability proportional to crowding distance.
    HigherWeightedCrowdingDistance,
    /// Particle `i` at iteration `t` follows entry `(i + t) mod |archive|`.
    RoundRobin,
}

/// Topology selection and its tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    #[serde(default)]
    pub kind: TopologyKind,
    /// Finite distance substituted for boundary (infinite-distance) entries
    /// when computing sampling weights.
    #[serde(default = "default_boundary_distance")]
    pub boundary_distance: f64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            kind: TopologyKind::default(),
            boundary_distance: default_boundary_distance(),
        }
    }
}

impl From<TopologyKind> for TopologyConfig {
    fn from(kind: TopologyKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }
}

fn default_boundary_distance() -> f64 {
    10.0
}

/// Stagnation-triggered scatter of particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplorationConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Iterations without personal-best improvement before a particle scatters.
    #[serde(default = "default_stagnation_threshold")]
    pub stagnation_threshold: usize,
    /// Chance that a stagnant particle actually scatters (1.0 = always).
    #[serde(default = "default_exploration_probability")]
    pub probability: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stagnation_threshold: default_stagnation_threshold(),
            probability: default_exploration_probability(),
        }
    }
}

fn default_stagnation_threshold() -> usize {
    10
}
fn default_exploration_probability() -> f64 {
    1.0
}

/// History and checkpoint output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Root directory for `history/` CSVs and `checkpoint.json`.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Record per-iteration particle and Pareto-front snapshots.
    #[serde(default)]
    pub save_history: bool,
    /// Save a checkpoint every N completed iterations (0 disables).
    #[serde(default)]
    pub checkpoint_interval: usize,
}

impl PersistenceConfig {
    /// Path of the periodic checkpoint file, if a working directory is set.
    pub fn checkpoint_path(&self) -> Option<PathBuf> {
        self.working_dir.as_ref().map(|d| d.join("checkpoint.json"))
    }

    /// Directory holding per-iteration history CSVs.
    pub fn history_dir(&self) -> Option<PathBuf> {
        self.working_dir.as_ref().map(|d| d.join("history"))
    }
}

/// Top-level swarm configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Lower bound per parameter.
    #[serde(default)]
    pub lower_bounds: Vec<Bound>,
    /// Upper bound per parameter.
    #[serde(default)]
    pub upper_bounds: Vec<Bound>,
    /// Swarm size.
    #[serde(default = "default_num_particles")]
    pub num_particles: usize,
    /// Velocity carry-over factor `w`.
    #[serde(default = "default_inertia_weight")]
    pub inertia_weight: f64,
    /// Pull toward the personal best `c1`.
    #[serde(default = "default_coefficient")]
    pub cognitive_coefficient: f64,
    /// Pull toward the leader `c2`.
    #[serde(default = "default_coefficient")]
    pub social_coefficient: f64,
    #[serde(default)]
    pub initialization: InitializationMode,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub exploration: ExplorationConfig,
    /// Archive capacity; crowded entries are pruned beyond it.
    #[serde(default)]
    pub max_archive_size: Option<usize>,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            lower_bounds: vec![Bound::Float(0.0); 2],
            upper_bounds: vec![Bound::Float(1.0); 2],
            num_particles: default_num_particles(),
            inertia_weight: default_inertia_weight(),
            cognitive_coefficient: default_coefficient(),
            social_coefficient: default_coefficient(),
            initialization: InitializationMode::default(),
            topology: TopologyConfig::default(),
            exploration: ExplorationConfig::default(),
            max_archive_size: None,
            random_seed: None,
            persistence: PersistenceConfig::default(),
        }
    }
}

fn default_num_particles() -> usize {
    50
}
fn default_inertia_weight() -> f64 {
    0.5
}
fn default_coefficient() -> f64 {
    1.0
}

impl SwarmConfig {
    /// Build a configuration from bounds, leaving everything else at defaults.
    pub fn with_bounds<L, U>(lower: L, upper: U) -> Self
    where
        L: IntoIterator,
        L::Item: Into<Bound>,
        U: IntoIterator,
        U::Item: Into<Bound>,
    {
        Self {
            lower_bounds: lower.into_iter().map(Into::into).collect(),
            upper_bounds: upper.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Validate scalar parameters.
    ///
    /// Bounds are checked by `ParameterSpace::new`, which also applies the
    /// non-fatal length and type fallbacks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_particles == 0 {
            return Err(ConfigError::NoParticles);
        }

        let check_coefficient = |value: f64, name: &str| {
            if !value.is_finite() || value < 0.0 {
                Err(ConfigError::InvalidCoefficient(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )))
            } else {
                Ok(())
            }
        };
        check_coefficient(self.inertia_weight, "inertia_weight")?;
        check_coefficient(self.cognitive_coefficient, "cognitive_coefficient")?;
        check_coefficient(self.social_coefficient, "social_coefficient")?;

        if let InitializationMode::Gaussian { spread, center } = &self.initialization {
            if let Some(s) = spread.iter().find(|s| !s.is_finite() || **s < 0.0) {
                return Err(ConfigError::InvalidGaussian(format!(
                    "spread must be finite and non-negative, got {}",
                    s
                )));
            }
            if center.iter().any(|c| !c.is_finite()) {
                return Err(ConfigError::InvalidGaussian(
                    "center must be finite".to_string(),
                ));
            }
        }

        let boundary = self.topology.boundary_distance;
        if !boundary.is_finite() || boundary <= 0.0 {
            return Err(ConfigError::InvalidCoefficient(format!(
                "boundary_distance must be finite and positive, got {}",
                boundary
            )));
        }

        if self.exploration.enabled && self.exploration.stagnation_threshold == 0 {
            return Err(ConfigError::InvalidStagnationThreshold);
        }
        if !(0.0..=1.0).contains(&self.exploration.probability) {
            return Err(ConfigError::InvalidProbability(self.exploration.probability));
        }

        if self.max_archive_size == Some(0) {
            return Err(ConfigError::InvalidArchiveSize);
        }

        let persistence = &self.persistence;
        if persistence.checkpoint_interval > 0 && persistence.working_dir.is_none() {
            return Err(ConfigError::CheckpointWithoutWorkingDir(
                persistence.checkpoint_interval,
            ));
        }

        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Swarm must contain at least one particle")]
    NoParticles,
    #[error("Parameter space has no dimensions")]
    EmptySpace,
    #[error("Parameter {index}: lower bound {lower} exceeds upper bound {upper}")]
    InvertedBounds { index: usize, lower: f64, upper: f64 },
    #[error("Parameter {index}: bounds [{lower}, {upper}] do not span a finite range")]
    UnboundedParameter { index: usize, lower: f64, upper: f64 },
    #[error("Problem has {expected} dimensions, bounds have {lower} lower and {upper} upper")]
    DimensionMismatch {
        expected: usize,
        lower: usize,
        upper: usize,
    },
    #[error("checkpoint_interval {0} requires a working_dir")]
    CheckpointWithoutWorkingDir(usize),
    #[error("Invalid coefficient: {0}")]
    InvalidCoefficient(String),
    #[error("Invalid gaussian initialization: {0}")]
    InvalidGaussian(String),
    #[error("Stagnation threshold must be positive when exploration is enabled")]
    InvalidStagnationThreshold,
    #[error("Exploration probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
    #[error("Maximum archive size must be positive")]
    InvalidArchiveSize,
    #[error("Batch size must be positive")]
    InvalidBatchSize,
    #[error("Number of objectives must be positive")]
    NoObjectives,
    #[error("Number of directions ({got}) does not match number of objectives ({expected})")]
    DirectionCountMismatch { expected: usize, got: usize },
    #[error("Number of objective names ({got}) does not match number of objectives ({expected})")]
    NameCountMismatch { expected: usize, got: usize },
}
