//! The multi-objective particle swarm engine.
//!
//! One iteration of [`MopsoEngine::step`]:
//!
//! 1. evaluate every particle position (in particle order)
//! 2. update personal bests
//! 3. fold the evaluated batch into the Pareto archive
//! 4. select a leader for every particle
//! 5. update velocities and move
//! 6. scatter stagnant particles when exploration is enabled
//! 7. advance the iteration counter
//! 8. run the history and checkpoint hooks
//!
//! All randomness comes from one [`SwarmRng`] owned by the engine and is
//! consumed in a fixed order: leader selection for every particle first,
//! then the velocity update (particle-major, dimension-minor, `r1` before
//! `r2`), then exploration (a probability draw when the exploration
//! probability is below one, then the new position). A failed evaluation
//! returns before anything is mutated.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::persistence::{
    ArchiveRecord, IterationRecord, ParticleRecord, PersistenceError, load_state, save_state,
};
use crate::schema::{ConfigError, SwarmConfig};

use super::archive::ParetoArchive;
use super::metrics;
use super::objective::{EvaluationError, Objective};
use super::particle::{Particle, UpdateCoefficients};
use super::rng::SwarmRng;
use super::space::ParameterSpace;
use super::topology::Topology;

/// Errors that abort an iteration or a run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    /// Fresh, reset or restored; no `optimize` call in progress.
    Initialized,
    Running,
    /// The last `optimize` call reached its target.
    Completed,
    /// The last `optimize` call was cancelled.
    Stopped,
}

/// Everything needed to continue a run with an identical trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmState {
    pub iteration: usize,
    pub particles: Vec<Particle>,
    pub archive: ParetoArchive,
    pub rng: SwarmRng,
}

/// Result of [`MopsoEngine::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// State restored; the run continues from `iteration`.
    Resumed { iteration: usize },
    /// Nothing usable was found; the engine was reinitialized from its seed.
    Fresh,
}

/// Multi-objective particle swarm optimizer.
pub struct MopsoEngine {
    config: SwarmConfig,
    objective: Objective,
    space: ParameterSpace,
    topology: Topology,
    coefficients: UpdateCoefficients,
    seed: u64,
    rng: SwarmRng,
    particles: Vec<Particle>,
    archive: ParetoArchive,
    iteration: usize,
    history: Vec<IterationRecord>,
    phase: EnginePhase,
    cancelled: Arc<AtomicBool>,
}

impl MopsoEngine {
    /// Validate the configuration and initialize the swarm.
    pub fn new(config: SwarmConfig, objective: Objective) -> Result<Self, ConfigError> {
        config.validate()?;
        let space = ParameterSpace::new(&config.lower_bounds, &config.upper_bounds)?;
        space.check_initialization(&config.initialization)?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        let archive = ParetoArchive::new(objective.directions().to_vec(), config.max_archive_size);

        let mut engine = Self {
            topology: Topology::new(&config.topology),
            coefficients: UpdateCoefficients::from(&config),
            config,
            objective,
            space,
            seed,
            rng: SwarmRng::new(seed),
            particles: Vec::new(),
            archive,
            iteration: 0,
            history: Vec::new(),
            phase: EnginePhase::Initialized,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        engine.reset();
        Ok(engine)
    }

    /// Share an externally owned cancellation flag.
    pub fn with_cancel_handle(mut self, handle: Arc<AtomicBool>) -> Self {
        self.cancelled = handle;
        self
    }

    /// Get cancellation handle.
    ///
    /// Setting it stops `optimize` once the iteration in flight completes.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Reinitialize the swarm from the configured seed and clear history.
    pub fn reset(&mut self) {
        let mut rng = SwarmRng::new(self.seed);
        let positions = self.space.initial_positions(
            &self.config.initialization,
            self.config.num_particles,
            &mut rng,
        );

        self.rng = rng;
        self.particles = positions.into_iter().map(Particle::new).collect();
        self.archive = ParetoArchive::new(
            self.objective.directions().to_vec(),
            self.config.max_archive_size,
        );
        self.iteration = 0;
        self.history.clear();
        self.phase = EnginePhase::Initialized;
    }

    /// Run one iteration.
    pub fn step(&mut self) -> Result<(), EngineError> {
        let positions: Vec<Vec<f64>> = self.particles.iter().map(|p| p.position.clone()).collect();
        let fitnesses = self.objective.evaluate(&positions)?;

        let directions = self.objective.directions();
        for (particle, fitness) in self.particles.iter_mut().zip(&fitnesses) {
            particle.record_evaluation(fitness, directions);
        }

        self.archive.fold(
            positions
                .iter()
                .map(Vec::as_slice)
                .zip(fitnesses.iter().map(Vec::as_slice)),
        );

        log::debug!(
            "Iteration {}: evaluated {} positions ({}), archive size {}",
            self.iteration,
            positions.len(),
            self.objective.evaluator_name(),
            self.archive.len()
        );

        let record = self
            .config
            .persistence
            .save_history
            .then(|| self.iteration_record(&positions, &fitnesses));

        self.move_particles();
        self.explore();
        self.iteration += 1;

        self.run_hooks(record)
    }

    /// Leader selection for every particle, then the velocity update.
    fn move_particles(&mut self) {
        let mut leaders = Vec::with_capacity(self.particles.len());
        for (i, particle) in self.particles.iter().enumerate() {
            let leader = self
                .topology
                .select(i, self.iteration, &self.archive, &mut self.rng)
                .map_or_else(|| particle.best_position.clone(), |e| e.position.clone());
            leaders.push(leader);
        }

        for (particle, leader) in self.particles.iter_mut().zip(&leaders) {
            particle.update_velocity(leader, &self.coefficients, &mut self.rng);
            particle.apply_velocity(&self.space);
        }
    }

    /// Scatter particles whose personal best has stagnated.
    fn explore(&mut self) {
        let exploration = self.config.exploration;
        if !exploration.enabled {
            return;
        }

        let mut scattered = 0;
        for particle in &mut self.particles {
            if particle.stagnation < exploration.stagnation_threshold {
                continue;
            }
            if exploration.probability < 1.0 && !self.rng.chance(exploration.probability) {
                continue;
            }
            particle.scatter(self.space.random_position(&mut self.rng));
            scattered += 1;
        }

        if scattered > 0 {
            log::debug!("Iteration {}: scattered {} particles", self.iteration, scattered);
        }
    }

    fn iteration_record(&self, positions: &[Vec<f64>], fitnesses: &[Vec<f64>]) -> IterationRecord {
        IterationRecord {
            iteration: self.iteration,
            particles: positions
                .iter()
                .zip(fitnesses)
                .enumerate()
                .map(|(id, (position, fitness))| ParticleRecord {
                    id,
                    position: position.clone(),
                    fitness: fitness.clone(),
                })
                .collect(),
            archive: self
                .archive
                .iter()
                .map(|e| ArchiveRecord {
                    position: e.position.clone(),
                    fitness: e.fitness.clone(),
                    crowding_distance: e.crowding_distance,
                })
                .collect(),
        }
    }

    fn run_hooks(&mut self, record: Option<IterationRecord>) -> Result<(), EngineError> {
        let persistence = &self.config.persistence;

        if let Some(record) = record {
            if let Some(dir) = persistence.history_dir() {
                record.write_csv(&dir, self.objective.names())?;
            }
            self.history.push(record);
        }

        let interval = persistence.checkpoint_interval;
        if interval > 0
            && self.iteration % interval == 0
            && let Some(path) = persistence.checkpoint_path()
        {
            self.save(&path)?;
        }

        Ok(())
    }

    /// Step until the iteration counter reaches `target_iterations`.
    ///
    /// Does nothing when the counter is already there (for example after
    /// resuming from a later checkpoint). Cancellation is checked between
    /// iterations; a cancelled run ends in [`EnginePhase::Stopped`].
    pub fn optimize(&mut self, target_iterations: usize) -> Result<&ParetoArchive, EngineError> {
        if self.iteration >= target_iterations {
            log::info!(
                "Iteration {} already reached target {}, nothing to do",
                self.iteration,
                target_iterations
            );
            self.phase = EnginePhase::Completed;
            return Ok(&self.archive);
        }

        log::info!(
            "Optimizing iterations {}..{} with {} particles over {} dimensions ({} evaluator)",
            self.iteration,
            target_iterations,
            self.particles.len(),
            self.space.dimensions(),
            self.objective.evaluator_name()
        );
        self.phase = EnginePhase::Running;

        while self.iteration < target_iterations {
            if self.cancelled.load(Ordering::Relaxed) {
                log::info!("Optimization cancelled at iteration {}", self.iteration);
                self.phase = EnginePhase::Stopped;
                return Ok(&self.archive);
            }
            self.step()?;
        }

        self.phase = EnginePhase::Completed;
        log::info!(
            "Optimization finished at iteration {} with {} Pareto solutions",
            self.iteration,
            self.archive.len()
        );
        Ok(&self.archive)
    }

    /// Copy of the resumable state.
    pub fn snapshot(&self) -> SwarmState {
        SwarmState {
            iteration: self.iteration,
            particles: self.particles.clone(),
            archive: self.archive.clone(),
            rng: self.rng.clone(),
        }
    }

    /// Replace the swarm with `state`.
    ///
    /// The state must match this engine's swarm size, dimensionality,
    /// objective count and archive settings.
    pub fn restore(&mut self, state: SwarmState) -> Result<(), PersistenceError> {
        self.check_compatible(&state)?;

        self.iteration = state.iteration;
        self.particles = state.particles;
        self.archive = state.archive;
        self.rng = state.rng;
        self.phase = EnginePhase::Initialized;
        Ok(())
    }

    fn check_compatible(&self, state: &SwarmState) -> Result<(), PersistenceError> {
        let incompatible = |reason: String| Err(PersistenceError::Incompatible(reason));

        if state.particles.len() != self.config.num_particles {
            return incompatible(format!(
                "{} particles, expected {}",
                state.particles.len(),
                self.config.num_particles
            ));
        }

        let dims = self.space.dimensions();
        let objectives = self.objective.num_objectives();
        for (i, p) in state.particles.iter().enumerate() {
            let widths_ok = p.position.len() == dims
                && p.velocity.len() == dims
                && p.best_position.len() == dims
                && p.fitness.as_ref().is_none_or(|f| f.len() == objectives)
                && p.best_fitness.as_ref().is_none_or(|f| f.len() == objectives);
            if !widths_ok {
                return incompatible(format!("particle {} does not match the problem shape", i));
            }
            if !self.space.contains(&p.position) || !self.space.contains(&p.best_position) {
                return incompatible(format!("particle {} lies outside the parameter bounds", i));
            }
        }

        if state.archive.directions() != self.objective.directions() {
            return incompatible("archive objective directions differ".to_string());
        }
        if state.archive.max_size() != self.config.max_archive_size {
            return incompatible(format!(
                "archive capacity {:?}, expected {:?}",
                state.archive.max_size(),
                self.config.max_archive_size
            ));
        }
        if state
            .archive
            .iter()
            .any(|e| e.position.len() != dims || e.fitness.len() != objectives)
        {
            return incompatible("archive entry does not match the problem shape".to_string());
        }
        if state.archive.iter().any(|e| !self.space.contains(&e.position)) {
            return incompatible("archive entry lies outside the parameter bounds".to_string());
        }

        Ok(())
    }

    /// Write a checkpoint to `path`.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        save_state(path, &self.snapshot())?;
        log::info!("Saved checkpoint at iteration {} to {}", self.iteration, path.display());
        Ok(())
    }

    /// Resume from a checkpoint at `path`.
    ///
    /// A missing, unreadable or incompatible checkpoint is not an error: it
    /// is logged and the engine starts over from its seed.
    pub fn load(&mut self, path: &Path) -> LoadOutcome {
        let result = load_state::<SwarmState>(path).and_then(|state| self.restore(state));
        match result {
            Ok(()) => {
                log::info!("Resumed from {} at iteration {}", path.display(), self.iteration);
                LoadOutcome::Resumed {
                    iteration: self.iteration,
                }
            }
            Err(e) => {
                log::warn!("Could not resume from {}: {}; starting fresh", path.display(), e);
                self.reset();
                LoadOutcome::Fresh
            }
        }
    }

    /// Generational distance of the archive to the objective's true Pareto
    /// front, sampled with `samples` points when it is a generator.
    pub fn generational_distance(&self, samples: usize) -> Option<f64> {
        let reference = self.objective.true_pareto()?.points(samples);
        metrics::generational_distance(
            &self.archive.fitnesses(),
            &reference,
            self.objective.directions(),
        )
    }

    /// Inverted generational distance against the true Pareto front.
    pub fn inverted_generational_distance(&self, samples: usize) -> Option<f64> {
        let reference = self.objective.true_pareto()?.points(samples);
        metrics::inverted_generational_distance(
            &self.archive.fitnesses(),
            &reference,
            self.objective.directions(),
        )
    }

    /// Hypervolume of the archive bounded by `reference_point`.
    pub fn hypervolume(&self, reference_point: &[f64]) -> f64 {
        metrics::hypervolume(
            &self.archive.fitnesses(),
            reference_point,
            self.objective.directions(),
        )
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn archive(&self) -> &ParetoArchive {
        &self.archive
    }

    /// Recorded iterations; empty unless history saving is enabled.
    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Seed the swarm was (or will be, on reset) initialized from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::dominance::dominates;
    use crate::compute::objective::{BatchEvaluator, ElementwiseEvaluator, ReferenceFront};
    use crate::schema::{
        Bound, Direction, ExplorationConfig, PersistenceConfig, TopologyConfig, TopologyKind,
    };
    use std::fs;
    use tempfile::tempdir;

    fn two_objectives(p: &[f64]) -> Vec<f64> {
        vec![
            4.0 * p[0] * p[0] + 4.0 * p[1] * p[1],
            (p[0] - 5.0).powi(2) + (p[1] - 5.0).powi(2),
        ]
    }

    fn objective() -> Objective {
        Objective::new(ElementwiseEvaluator::new(two_objectives), 2).unwrap()
    }

    fn config(num_particles: usize, seed: u64) -> SwarmConfig {
        SwarmConfig {
            num_particles,
            random_seed: Some(seed),
            ..SwarmConfig::with_bounds([0.0, 0.0], [5.0, 5.0])
        }
    }

    fn assert_mutually_non_dominated(archive: &ParetoArchive) {
        for a in archive.iter() {
            for b in archive.iter() {
                assert!(!dominates(&a.fitness, &b.fitness, archive.directions()));
            }
        }
    }

    #[test]
    fn test_engine_creation() {
        let engine = MopsoEngine::new(config(20, 1), objective()).unwrap();
        assert_eq!(engine.particles().len(), 20);
        assert_eq!(engine.iteration(), 0);
        assert_eq!(engine.phase(), EnginePhase::Initialized);
        assert!(engine.archive().is_empty());
        assert!(engine.particles().iter().all(|p| engine.space().contains(&p.position)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad = SwarmConfig {
            num_particles: 0,
            ..config(1, 0)
        };
        assert!(matches!(
            MopsoEngine::new(bad, objective()),
            Err(ConfigError::NoParticles)
        ));

        let inverted = SwarmConfig::with_bounds([5.0], [1.0]);
        assert!(matches!(
            MopsoEngine::new(inverted, objective()),
            Err(ConfigError::InvertedBounds { index: 0, .. })
        ));

        let wide = SwarmConfig::with_bounds([-1e308, 0.0], [1e308, 1.0]);
        assert!(matches!(
            MopsoEngine::new(wide, objective()),
            Err(ConfigError::UnboundedParameter { index: 0, .. })
        ));

        let mut orphan_checkpoint = config(4, 0);
        orphan_checkpoint.persistence.checkpoint_interval = 3;
        assert!(matches!(
            MopsoEngine::new(orphan_checkpoint, objective()),
            Err(ConfigError::CheckpointWithoutWorkingDir(3))
        ));
    }

    #[test]
    fn test_optimize_two_objective_problem() {
        let mut engine = MopsoEngine::new(config(50, 42), objective()).unwrap();
        let archive = engine.optimize(100).unwrap();

        assert!(!archive.is_empty());
        assert_mutually_non_dominated(archive);
        let space = engine.space();
        assert!(engine.archive().iter().all(|e| space.contains(&e.position)));
        assert!(engine.particles().iter().all(|p| space.contains(&p.position)));
        assert_eq!(engine.iteration(), 100);
        assert_eq!(engine.phase(), EnginePhase::Completed);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let mut a = MopsoEngine::new(config(15, 9), objective()).unwrap();
        let mut b = MopsoEngine::new(config(15, 9), objective()).unwrap();
        a.optimize(20).unwrap();
        b.optimize(20).unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_resume_matches_uninterrupted_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let mut cfg = config(12, 2024);
        cfg.topology = TopologyConfig::from(TopologyKind::LowerWeightedCrowdingDistance);
        cfg.exploration = ExplorationConfig {
            enabled: true,
            stagnation_threshold: 3,
            probability: 0.5,
        };
        cfg.max_archive_size = Some(8);

        let mut first = MopsoEngine::new(cfg.clone(), objective()).unwrap();
        first.optimize(15).unwrap();
        first.save(&path).unwrap();

        let mut resumed = MopsoEngine::new(cfg.clone(), objective()).unwrap();
        assert_eq!(resumed.load(&path), LoadOutcome::Resumed { iteration: 15 });
        assert_eq!(resumed.snapshot(), first.snapshot());
        resumed.optimize(30).unwrap();

        let mut straight = MopsoEngine::new(cfg, objective()).unwrap();
        straight.optimize(30).unwrap();

        assert_eq!(resumed.snapshot(), straight.snapshot());
    }

    #[test]
    fn test_optimize_is_noop_past_target() {
        let mut engine = MopsoEngine::new(config(10, 3), objective()).unwrap();
        engine.optimize(5).unwrap();
        let before = engine.snapshot();

        engine.optimize(3).unwrap();
        engine.optimize(5).unwrap();
        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.iteration(), 5);
    }

    #[test]
    fn test_failed_evaluation_leaves_state_unchanged() {
        let fail = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fail);
        let evaluator = ElementwiseEvaluator::new(move |p: &[f64]| {
            if flag.load(Ordering::Relaxed) {
                Err("solver diverged".to_string())
            } else {
                Ok(two_objectives(p))
            }
        });
        let objective = Objective::new(evaluator, 2).unwrap();
        let mut engine = MopsoEngine::new(config(10, 5), objective).unwrap();
        engine.optimize(3).unwrap();

        fail.store(true, Ordering::Relaxed);
        let before = engine.snapshot();
        let err = engine.step().unwrap_err();
        assert!(matches!(err, EngineError::Evaluation(EvaluationError::Objective(_))));
        assert_eq!(engine.snapshot(), before);
        assert_eq!(engine.iteration(), 3);
    }

    #[test]
    fn test_wrong_fitness_shape_is_an_error() {
        let evaluator = BatchEvaluator::new(|ps: &[Vec<f64>]| vec![vec![0.0, 0.0]; ps.len() - 1]);
        let objective = Objective::new(evaluator, 2).unwrap();
        let mut engine = MopsoEngine::new(config(4, 0), objective).unwrap();
        assert!(matches!(
            engine.step(),
            Err(EngineError::Evaluation(EvaluationError::RowCount { expected: 4, got: 3 }))
        ));
        assert_eq!(engine.iteration(), 0);
    }

    #[test]
    fn test_exploration_scatters_stagnant_particles() {
        let flat = Objective::new(ElementwiseEvaluator::new(|_: &[f64]| vec![1.0, 1.0]), 2).unwrap();
        let mut cfg = config(8, 13);
        cfg.exploration = ExplorationConfig {
            enabled: true,
            stagnation_threshold: 2,
            probability: 1.0,
        };
        let mut engine = MopsoEngine::new(cfg, flat).unwrap();

        // First evaluation sets the personal best, the second stagnates.
        engine.step().unwrap();
        engine.step().unwrap();
        assert!(engine.particles().iter().all(|p| p.stagnation == 1));

        // The third reaches the threshold and scatters everyone.
        engine.step().unwrap();
        for p in engine.particles() {
            assert_eq!(p.stagnation, 0);
            assert!(p.velocity.iter().all(|&v| v == 0.0));
            assert!(engine.space().contains(&p.position));
        }
    }

    #[test]
    fn test_exploration_disabled_keeps_counting() {
        let flat = Objective::new(ElementwiseEvaluator::new(|_: &[f64]| vec![1.0, 1.0]), 2).unwrap();
        let mut engine = MopsoEngine::new(config(4, 13), flat).unwrap();
        engine.optimize(5).unwrap();
        assert!(engine.particles().iter().all(|p| p.stagnation == 4));
    }

    #[test]
    fn test_maximize_directions() {
        let evaluator = ElementwiseEvaluator::new(|p: &[f64]| vec![p[0], p[0]]);
        let objective = Objective::new(evaluator, 2)
            .unwrap()
            .with_directions(vec![Direction::Maximize, Direction::Maximize])
            .unwrap();
        let cfg = SwarmConfig {
            num_particles: 10,
            random_seed: Some(8),
            ..SwarmConfig::with_bounds([0.0], [1.0])
        };
        let mut engine = MopsoEngine::new(cfg, objective).unwrap();
        engine.optimize(20).unwrap();

        assert_eq!(engine.archive().len(), 1);
        let best = engine.archive().entries()[0].fitness[0];
        for p in engine.particles() {
            assert!(p.best_fitness.as_ref().unwrap()[0] <= best);
        }
    }

    #[test]
    fn test_round_robin_and_bounded_archive() {
        let mut cfg = config(20, 77);
        cfg.topology = TopologyConfig::from(TopologyKind::RoundRobin);
        cfg.max_archive_size = Some(5);
        let mut engine = MopsoEngine::new(cfg, objective()).unwrap();
        engine.optimize(25).unwrap();
        assert!(engine.archive().len() <= 5);
        assert_mutually_non_dominated(engine.archive());
    }

    #[test]
    fn test_mixed_parameter_types() {
        let cfg = SwarmConfig {
            num_particles: 10,
            random_seed: Some(4),
            ..SwarmConfig::with_bounds(
                [Bound::Bool(false), Bound::Int(0), Bound::Float(0.0)],
                [Bound::Bool(true), Bound::Int(10), Bound::Float(1.0)],
            )
        };
        let evaluator =
            ElementwiseEvaluator::new(|p: &[f64]| vec![p[0] + p[1] + p[2], 12.0 - p[1] - p[2]]);
        let objective = Objective::new(evaluator, 2).unwrap();
        let mut engine = MopsoEngine::new(cfg, objective).unwrap();
        engine.optimize(10).unwrap();

        for p in engine.particles() {
            assert!(p.position[0] == 0.0 || p.position[0] == 1.0);
            assert_eq!(p.position[1], p.position[1].round());
        }
    }

    #[test]
    fn test_history_enabled() {
        let dir = tempdir().unwrap();
        let mut cfg = config(6, 21);
        cfg.persistence = PersistenceConfig {
            working_dir: Some(dir.path().to_path_buf()),
            save_history: true,
            checkpoint_interval: 0,
        };
        let mut engine = MopsoEngine::new(cfg, objective()).unwrap();
        engine.optimize(4).unwrap();

        let history = engine.history();
        assert_eq!(history.len(), 4);
        for (i, record) in history.iter().enumerate() {
            assert_eq!(record.iteration, i);
            assert_eq!(record.particles.len(), 6);
            assert!(!record.archive.is_empty());

            let history_dir = dir.path().join("history");
            assert!(IterationRecord::particles_path(&history_dir, i).exists());
            assert!(IterationRecord::archive_path(&history_dir, i).exists());
        }
        assert!(!dir.path().join("checkpoint.json").exists());
    }

    #[test]
    fn test_history_disabled() {
        let dir = tempdir().unwrap();
        let mut cfg = config(6, 21);
        cfg.persistence.working_dir = Some(dir.path().to_path_buf());
        let mut engine = MopsoEngine::new(cfg, objective()).unwrap();
        engine.optimize(4).unwrap();

        assert!(engine.history().is_empty());
        assert!(!dir.path().join("history").exists());
    }

    #[test]
    fn test_periodic_checkpoint() {
        let dir = tempdir().unwrap();
        let mut cfg = config(6, 31);
        cfg.persistence = PersistenceConfig {
            working_dir: Some(dir.path().to_path_buf()),
            save_history: false,
            checkpoint_interval: 2,
        };
        let mut engine = MopsoEngine::new(cfg.clone(), objective()).unwrap();
        engine.optimize(5).unwrap();

        let path = cfg.persistence.checkpoint_path().unwrap();
        assert!(path.exists());

        let mut resumed = MopsoEngine::new(cfg, objective()).unwrap();
        assert_eq!(resumed.load(&path), LoadOutcome::Resumed { iteration: 4 });
    }

    #[test]
    fn test_corrupt_checkpoint_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        fs::write(&path, "not json").unwrap();

        let mut engine = MopsoEngine::new(config(8, 17), objective()).unwrap();
        engine.optimize(3).unwrap();
        assert_eq!(engine.load(&path), LoadOutcome::Fresh);

        let fresh = MopsoEngine::new(config(8, 17), objective()).unwrap();
        assert_eq!(engine.snapshot(), fresh.snapshot());
        assert_eq!(engine.phase(), EnginePhase::Initialized);

        assert_eq!(engine.load(&dir.path().join("missing.json")), LoadOutcome::Fresh);
    }

    #[test]
    fn test_incompatible_checkpoint_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        let mut large = MopsoEngine::new(config(10, 1), objective()).unwrap();
        large.optimize(2).unwrap();
        large.save(&path).unwrap();

        let mut small = MopsoEngine::new(config(5, 1), objective()).unwrap();
        assert_eq!(small.load(&path), LoadOutcome::Fresh);
        assert_eq!(small.iteration(), 0);

        let state = large.snapshot();
        assert!(matches!(
            small.restore(state),
            Err(PersistenceError::Incompatible(_))
        ));
    }

    #[test]
    fn test_out_of_bounds_checkpoint_rejected() {
        let mut engine = MopsoEngine::new(config(6, 11), objective()).unwrap();
        engine.optimize(3).unwrap();

        let mut stray_particle = engine.snapshot();
        stray_particle.particles[2].position[1] = 7.5;
        assert!(matches!(
            engine.restore(stray_particle),
            Err(PersistenceError::Incompatible(_))
        ));

        let mut stray_best = engine.snapshot();
        stray_best.particles[0].best_position[0] = -1.0;
        assert!(matches!(
            engine.restore(stray_best),
            Err(PersistenceError::Incompatible(_))
        ));

        let dir = tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        engine.save(&path).unwrap();
        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["archive"]["entries"][0]["position"][0] = serde_json::json!(99.0);
        fs::write(&path, json.to_string()).unwrap();

        assert_eq!(engine.load(&path), LoadOutcome::Fresh);
        assert_eq!(engine.iteration(), 0);
    }

    #[test]
    fn test_cancel_before_start() {
        let mut engine = MopsoEngine::new(config(5, 2), objective()).unwrap();
        engine.cancel_handle().store(true, Ordering::Relaxed);
        engine.optimize(10).unwrap();
        assert_eq!(engine.iteration(), 0);
        assert_eq!(engine.phase(), EnginePhase::Stopped);
    }

    #[test]
    fn test_cancel_finishes_current_iteration() {
        let cancel = Arc::new(AtomicBool::new(false));
        let trigger = Arc::clone(&cancel);
        let evaluator = ElementwiseEvaluator::new(move |p: &[f64]| {
            trigger.store(true, Ordering::Relaxed);
            two_objectives(p)
        });
        let objective = Objective::new(evaluator, 2).unwrap();
        let mut engine = MopsoEngine::new(config(5, 2), objective)
            .unwrap()
            .with_cancel_handle(cancel);

        engine.optimize(10).unwrap();
        assert_eq!(engine.iteration(), 1);
        assert_eq!(engine.phase(), EnginePhase::Stopped);
    }

    #[test]
    fn test_metrics_against_true_front() {
        let evaluator = ElementwiseEvaluator::new(|p: &[f64]| vec![p[0] * p[0], (p[0] - 2.0).powi(2)]);
        let front = ReferenceFront::Generator(Box::new(|n| {
            (0..n)
                .map(|i| {
                    let x = 2.0 * i as f64 / (n - 1) as f64;
                    vec![x * x, (x - 2.0).powi(2)]
                })
                .collect()
        }));
        let objective = Objective::new(evaluator, 2).unwrap().with_true_pareto(front);
        let cfg = SwarmConfig {
            num_particles: 20,
            random_seed: Some(6),
            ..SwarmConfig::with_bounds([-10.0], [10.0])
        };
        let mut engine = MopsoEngine::new(cfg, objective).unwrap();
        assert_eq!(engine.generational_distance(100), None);

        engine.optimize(30).unwrap();
        let gd = engine.generational_distance(100).unwrap();
        let igd = engine.inverted_generational_distance(100).unwrap();
        assert!(gd.is_finite() && gd >= 0.0);
        assert!(igd.is_finite() && igd >= 0.0);
        assert!(engine.hypervolume(&[5.0, 5.0]) >= 0.0);
    }
}
