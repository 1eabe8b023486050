//! Compute module - Swarm dynamics, the Pareto archive and the optimization engine.

mod archive;
mod benchmarks;
mod dominance;
mod engine;
mod objective;
mod particle;
mod rng;
mod space;
mod topology;

pub mod metrics;

pub use archive::*;
pub use dominance::*;
pub use engine::*;
pub use objective::*;
pub use particle::*;
pub use rng::*;
pub use space::*;
pub use topology::*;
