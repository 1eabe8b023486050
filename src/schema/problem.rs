//! Benchmark problem selection for command-line runs.

use serde::{Deserialize, Serialize};

use super::SwarmConfig;

/// Built-in multi-objective test problems.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum BenchmarkProblem {
    /// Binh and Korn: `4x² + 4y²` and `(x-5)² + (y-5)²` on `[0,5] x [0,3]`.
    #[default]
    BinhKorn,
    /// ZDT1 with a convex front, `dimensions` parameters on `[0,1]`.
    Zdt1 {
        #[serde(default = "default_zdt_dimensions")]
        dimensions: usize,
    },
    /// Schaffer N.1: `x²` and `(x-2)²` on `[-10, 10]`.
    SchafferN1,
}

fn default_zdt_dimensions() -> usize {
    30
}

/// A command-line run: problem plus swarm settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub problem: BenchmarkProblem,
    /// Swarm settings. Bounds left empty are filled from the problem.
    pub swarm: SwarmConfig,
    /// Iterations to run when not given on the command line.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
}

fn default_iterations() -> usize {
    100
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            problem: BenchmarkProblem::default(),
            swarm: SwarmConfig {
                lower_bounds: Vec::new(),
                upper_bounds: Vec::new(),
                random_seed: Some(42),
                ..Default::default()
            },
            iterations: default_iterations(),
        }
    }
}
