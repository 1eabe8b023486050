//! Pareto Swarm - Multi-objective particle swarm optimization.
//!
//! This crate searches a bounded space of boolean, integer and real
//! parameters for the Pareto-optimal trade-offs of several objectives. A
//! swarm of particles is steered by an archive of non-dominated solutions
//! whose crowding distances decide which leaders the particles follow.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Serializable configuration (`SwarmConfig`, bounds, topology)
//! - `compute`: Parameter space, particles, archive, evaluators and the engine
//! - `persistence`: Checkpoint files and per-iteration history export
//!
//! # Example
//!
//! ```rust,no_run
//! use pareto_swarm::{
//!     compute::{ElementwiseEvaluator, MopsoEngine, Objective},
//!     schema::SwarmConfig,
//! };
//!
//! // Two competing objectives over [0, 5] x [0, 5]
//! let evaluator = ElementwiseEvaluator::new(|x: &[f64]| {
//!     vec![
//!         4.0 * x[0] * x[0] + 4.0 * x[1] * x[1],
//!         (x[0] - 5.0).powi(2) + (x[1] - 5.0).powi(2),
//!     ]
//! });
//! let objective = Objective::new(evaluator, 2).unwrap();
//!
//! let config = SwarmConfig {
//!     num_particles: 50,
//!     random_seed: Some(42),
//!     ..SwarmConfig::with_bounds([0.0, 0.0], [5.0, 5.0])
//! };
//!
//! let mut engine = MopsoEngine::new(config, objective).unwrap();
//! let front = engine.optimize(100).unwrap();
//!
//! println!("Pareto front size after 100 iterations: {}", front.len());
//! ```

pub mod compute;
pub mod persistence;
pub mod schema;

// Re-export commonly used types
pub use compute::{MopsoEngine, Objective, ParetoArchive, SwarmState};
pub use schema::{Bound, Direction, SwarmConfig};
