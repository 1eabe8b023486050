//! Objective evaluation: the evaluator protocol and its implementations.
//!
//! Every evaluator maps an ordered list of positions to fitness vectors in
//! the same order, whatever its internal concurrency:
//!
//! - [`BatchEvaluator`]: one call with the whole list
//! - [`ElementwiseEvaluator`]: one call per position, optionally on the rayon pool
//! - [`AsyncElementwiseEvaluator`]: one future per position, gathered in order
//! - [`AsyncBatchEvaluator`]: one future per fixed-size chunk, flattened in order
//!
//! A [`CompositeEvaluator`] runs several evaluators over the same positions
//! and concatenates their fitness columns.
//!
//! Async variants drive their futures with `pollster`, so objective futures
//! must not depend on a specific runtime's reactor.

use std::fmt;
use std::future::Future;

use futures::future::join_all;
use rayon::prelude::*;

use crate::schema::{ConfigError, Direction};

/// Errors raised while evaluating objectives.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("Objective function failed: {0}")]
    Objective(String),
    #[error("Evaluator returned {got} fitness vectors for {expected} positions")]
    RowCount { expected: usize, got: usize },
    #[error("Fitness vector {row} has {got} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("Fitness vector {row} contains NaN")]
    NotANumber { row: usize },
}

/// Conversion of an objective function's return value into one fitness vector.
pub trait IntoFitness {
    fn into_fitness(self) -> Result<Vec<f64>, EvaluationError>;
}

impl IntoFitness for Vec<f64> {
    fn into_fitness(self) -> Result<Vec<f64>, EvaluationError> {
        Ok(self)
    }
}

impl<E: fmt::Display> IntoFitness for Result<Vec<f64>, E> {
    fn into_fitness(self) -> Result<Vec<f64>, EvaluationError> {
        self.map_err(|e| EvaluationError::Objective(e.to_string()))
    }
}

/// Conversion of a batch objective's return value into a fitness matrix.
pub trait IntoFitnessMatrix {
    fn into_fitness_matrix(self) -> Result<Vec<Vec<f64>>, EvaluationError>;
}

impl IntoFitnessMatrix for Vec<Vec<f64>> {
    fn into_fitness_matrix(self) -> Result<Vec<Vec<f64>>, EvaluationError> {
        Ok(self)
    }
}

impl<E: fmt::Display> IntoFitnessMatrix for Result<Vec<Vec<f64>>, E> {
    fn into_fitness_matrix(self) -> Result<Vec<Vec<f64>>, EvaluationError> {
        self.map_err(|e| EvaluationError::Objective(e.to_string()))
    }
}

/// Maps positions to fitness vectors, preserving input order.
pub trait Evaluator {
    fn evaluate(&self, positions: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EvaluationError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// One call per iteration with the full position list.
pub struct BatchEvaluator<F> {
    func: F,
}

impl<F, R> BatchEvaluator<F>
where
    F: Fn(&[Vec<f64>]) -> R,
    R: IntoFitnessMatrix,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, R> Evaluator for BatchEvaluator<F>
where
    F: Fn(&[Vec<f64>]) -> R,
    R: IntoFitnessMatrix,
{
    fn evaluate(&self, positions: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EvaluationError> {
        (self.func)(positions).into_fitness_matrix()
    }

    fn name(&self) -> &'static str {
        "batch"
    }
}

/// One call per position.
pub struct ElementwiseEvaluator<F> {
    func: F,
    parallel: bool,
}

impl<F, R> ElementwiseEvaluator<F>
where
    F: Fn(&[f64]) -> R + Sync,
    R: IntoFitness + Send,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            parallel: false,
        }
    }

    /// Evaluate positions on the rayon thread pool.
    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }
}

impl<F, R> Evaluator for ElementwiseEvaluator<F>
where
    F: Fn(&[f64]) -> R + Sync,
    R: IntoFitness + Send,
{
    fn evaluate(&self, positions: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EvaluationError> {
        if self.parallel {
            positions
                .par_iter()
                .map(|p| (self.func)(p).into_fitness())
                .collect()
        } else {
            positions
                .iter()
                .map(|p| (self.func)(p).into_fitness())
                .collect()
        }
    }

    fn name(&self) -> &'static str {
        if self.parallel {
            "elementwise-parallel"
        } else {
            "elementwise"
        }
    }
}

/// One concurrently polled future per position.
pub struct AsyncElementwiseEvaluator<F> {
    func: F,
}

impl<F, Fut> AsyncElementwiseEvaluator<F>
where
    F: Fn(Vec<f64>) -> Fut,
    Fut: Future,
    Fut::Output: IntoFitness,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Evaluator for AsyncElementwiseEvaluator<F>
where
    F: Fn(Vec<f64>) -> Fut,
    Fut: Future,
    Fut::Output: IntoFitness,
{
    fn evaluate(&self, positions: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EvaluationError> {
        let tasks: Vec<Fut> = positions.iter().map(|p| (self.func)(p.clone())).collect();
        pollster::block_on(join_all(tasks))
            .into_iter()
            .map(IntoFitness::into_fitness)
            .collect()
    }

    fn name(&self) -> &'static str {
        "async-elementwise"
    }
}

/// One concurrently polled future per chunk of `batch_size` positions.
///
/// The final chunk is shorter when the count is not a multiple of the batch
/// size.
pub struct AsyncBatchEvaluator<F> {
    func: F,
    batch_size: usize,
}

impl<F, Fut> AsyncBatchEvaluator<F>
where
    F: Fn(Vec<Vec<f64>>) -> Fut,
    Fut: Future,
    Fut::Output: IntoFitnessMatrix,
{
    pub fn new(batch_size: usize, func: F) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        Ok(Self { func, batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl<F, Fut> Evaluator for AsyncBatchEvaluator<F>
where
    F: Fn(Vec<Vec<f64>>) -> Fut,
    Fut: Future,
    Fut::Output: IntoFitnessMatrix,
{
    fn evaluate(&self, positions: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EvaluationError> {
        let chunks: Vec<&[Vec<f64>]> = positions.chunks(self.batch_size).collect();
        let tasks: Vec<Fut> = chunks
            .iter()
            .map(|chunk| (self.func)(chunk.to_vec()))
            .collect();

        let mut fitnesses = Vec::with_capacity(positions.len());
        for (chunk, output) in chunks.iter().zip(pollster::block_on(join_all(tasks))) {
            let rows = output.into_fitness_matrix()?;
            let expected = chunk.len();
            if rows.len() != expected {
                return Err(EvaluationError::RowCount {
                    expected,
                    got: rows.len(),
                });
            }
            fitnesses.extend(rows);
        }
        Ok(fitnesses)
    }

    fn name(&self) -> &'static str {
        "async-batch"
    }
}

/// Several evaluators whose fitness columns are concatenated in order.
///
/// Each part declares how many columns it produces; the composite width is
/// their sum.
pub struct CompositeEvaluator {
    parts: Vec<(Box<dyn Evaluator>, usize)>,
}

impl CompositeEvaluator {
    pub fn new(
        parts: impl IntoIterator<Item = (Box<dyn Evaluator>, usize)>,
    ) -> Result<Self, ConfigError> {
        let parts: Vec<_> = parts.into_iter().collect();
        if parts.is_empty() || parts.iter().any(|(_, width)| *width == 0) {
            return Err(ConfigError::NoObjectives);
        }
        Ok(Self { parts })
    }

    /// Total number of fitness columns.
    pub fn width(&self) -> usize {
        self.parts.iter().map(|(_, width)| width).sum()
    }
}

impl Evaluator for CompositeEvaluator {
    fn evaluate(&self, positions: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EvaluationError> {
        let mut fitnesses = vec![Vec::with_capacity(self.width()); positions.len()];

        for (evaluator, width) in &self.parts {
            let rows = evaluator.evaluate(positions)?;
            if rows.len() != positions.len() {
                return Err(EvaluationError::RowCount {
                    expected: positions.len(),
                    got: rows.len(),
                });
            }
            for (row, (fitness, columns)) in fitnesses.iter_mut().zip(rows).enumerate() {
                if columns.len() != *width {
                    return Err(EvaluationError::RowWidth {
                        row,
                        expected: *width,
                        got: columns.len(),
                    });
                }
                fitness.extend(columns);
            }
        }
        Ok(fitnesses)
    }

    fn name(&self) -> &'static str {
        "composite"
    }
}

/// Reference Pareto set used by quality metrics.
pub enum ReferenceFront {
    /// Fixed list of fitness vectors.
    Points(Vec<Vec<f64>>),
    /// Produces `n` reference fitness vectors on request.
    Generator(Box<dyn Fn(usize) -> Vec<Vec<f64>>>),
}

impl ReferenceFront {
    /// Materialize the reference set (`samples` is used by generators only).
    pub fn points(&self, samples: usize) -> Vec<Vec<f64>> {
        match self {
            ReferenceFront::Points(points) => points.clone(),
            ReferenceFront::Generator(generate) => generate(samples),
        }
    }
}

impl fmt::Debug for ReferenceFront {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceFront::Points(points) => write!(f, "Points({} vectors)", points.len()),
            ReferenceFront::Generator(_) => write!(f, "Generator"),
        }
    }
}

/// An evaluator together with its objective metadata.
pub struct Objective {
    evaluator: Box<dyn Evaluator>,
    num_objectives: usize,
    names: Vec<String>,
    directions: Vec<Direction>,
    true_pareto: Option<ReferenceFront>,
}

impl Objective {
    /// Wrap an evaluator producing `num_objectives` values per position.
    ///
    /// Names default to `objective_0, objective_1, …` and every objective
    /// is minimized.
    pub fn new<E: Evaluator + 'static>(
        evaluator: E,
        num_objectives: usize,
    ) -> Result<Self, ConfigError> {
        if num_objectives == 0 {
            return Err(ConfigError::NoObjectives);
        }
        Ok(Self {
            evaluator: Box::new(evaluator),
            num_objectives,
            names: (0..num_objectives).map(|i| format!("objective_{}", i)).collect(),
            directions: vec![Direction::Minimize; num_objectives],
            true_pareto: None,
        })
    }

    /// Concatenate the columns of several evaluators into one objective.
    ///
    /// The objective count is the sum of the declared part widths.
    pub fn from_evaluators(
        parts: impl IntoIterator<Item = (Box<dyn Evaluator>, usize)>,
    ) -> Result<Self, ConfigError> {
        let composite = CompositeEvaluator::new(parts)?;
        let width = composite.width();
        Self::new(composite, width)
    }

    /// Set per-objective directions; the count must match.
    pub fn with_directions(mut self, directions: Vec<Direction>) -> Result<Self, ConfigError> {
        if directions.len() != self.num_objectives {
            return Err(ConfigError::DirectionCountMismatch {
                expected: self.num_objectives,
                got: directions.len(),
            });
        }
        self.directions = directions;
        Ok(self)
    }

    /// Set objective names; the count must match.
    pub fn with_names<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self, ConfigError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.num_objectives {
            return Err(ConfigError::NameCountMismatch {
                expected: self.num_objectives,
                got: names.len(),
            });
        }
        self.names = names;
        Ok(self)
    }

    /// Attach a reference Pareto set for quality metrics.
    pub fn with_true_pareto(mut self, front: ReferenceFront) -> Self {
        self.true_pareto = Some(front);
        self
    }

    /// Evaluate positions and check the shape of the result.
    pub fn evaluate(&self, positions: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, EvaluationError> {
        let fitnesses = self.evaluator.evaluate(positions)?;

        if fitnesses.len() != positions.len() {
            return Err(EvaluationError::RowCount {
                expected: positions.len(),
                got: fitnesses.len(),
            });
        }
        for (row, fitness) in fitnesses.iter().enumerate() {
            if fitness.len() != self.num_objectives {
                return Err(EvaluationError::RowWidth {
                    row,
                    expected: self.num_objectives,
                    got: fitness.len(),
                });
            }
            if fitness.iter().any(|v| v.is_nan()) {
                return Err(EvaluationError::NotANumber { row });
            }
        }
        Ok(fitnesses)
    }

    pub fn num_objectives(&self) -> usize {
        self.num_objectives
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    pub fn true_pareto(&self) -> Option<&ReferenceFront> {
        self.true_pareto.as_ref()
    }

    /// Name of the underlying evaluator variant.
    pub fn evaluator_name(&self) -> &'static str {
        self.evaluator.name()
    }
}

impl fmt::Debug for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Objective")
            .field("evaluator", &self.evaluator.name())
            .field("num_objectives", &self.num_objectives)
            .field("names", &self.names)
            .field("directions", &self.directions)
            .field("true_pareto", &self.true_pareto)
            .finish()
    }
}
