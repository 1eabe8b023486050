//! Analytic multi-objective test problems.

use crate::schema::{BenchmarkProblem, Bound, ConfigError, RunConfig};

use super::objective::{ElementwiseEvaluator, Objective, ReferenceFront};

impl BenchmarkProblem {
    /// Number of decision variables.
    pub fn dimensions(&self) -> usize {
        match self {
            BenchmarkProblem::BinhKorn => 2,
            BenchmarkProblem::Zdt1 { dimensions } => *dimensions,
            BenchmarkProblem::SchafferN1 => 1,
        }
    }

    /// Lower and upper bounds of the decision space.
    pub fn bounds(&self) -> (Vec<Bound>, Vec<Bound>) {
        match self {
            BenchmarkProblem::BinhKorn => (
                vec![Bound::Float(0.0), Bound::Float(0.0)],
                vec![Bound::Float(5.0), Bound::Float(3.0)],
            ),
            BenchmarkProblem::Zdt1 { dimensions } => (
                vec![Bound::Float(0.0); *dimensions],
                vec![Bound::Float(1.0); *dimensions],
            ),
            BenchmarkProblem::SchafferN1 => (vec![Bound::Float(-10.0)], vec![Bound::Float(10.0)]),
        }
    }

    /// Objective values at `x` (both minimized).
    pub fn evaluate(&self, x: &[f64]) -> Vec<f64> {
        match self {
            BenchmarkProblem::BinhKorn => {
                let (a, b) = (x[0], x[1]);
                vec![
                    4.0 * a * a + 4.0 * b * b,
                    (a - 5.0).powi(2) + (b - 5.0).powi(2),
                ]
            }
            BenchmarkProblem::Zdt1 { .. } => {
                let f1 = x[0];
                let g = zdt_g(&x[1..]);
                vec![f1, g * (1.0 - (f1 / g).sqrt())]
            }
            BenchmarkProblem::SchafferN1 => vec![x[0] * x[0], (x[0] - 2.0).powi(2)],
        }
    }

    /// `samples` points spread along the analytic Pareto front.
    pub fn pareto_front(&self, samples: usize) -> Vec<Vec<f64>> {
        let t = |i: usize| {
            if samples > 1 {
                i as f64 / (samples - 1) as f64
            } else {
                0.0
            }
        };

        (0..samples)
            .map(|i| match self {
                // Pareto set: x = y on [0, 3], then y = 3 for x in [3, 5].
                BenchmarkProblem::BinhKorn => {
                    let a = 5.0 * t(i);
                    self.evaluate(&[a, a.min(3.0)])
                }
                BenchmarkProblem::Zdt1 { .. } => {
                    let f1 = t(i);
                    vec![f1, 1.0 - f1.sqrt()]
                }
                BenchmarkProblem::SchafferN1 => self.evaluate(&[2.0 * t(i)]),
            })
            .collect()
    }

    /// A point dominated by the whole front, for hypervolume.
    pub fn reference_point(&self) -> Vec<f64> {
        match self {
            BenchmarkProblem::BinhKorn => vec![140.0, 55.0],
            BenchmarkProblem::Zdt1 { .. } => vec![1.1, 1.1],
            BenchmarkProblem::SchafferN1 => vec![4.4, 4.4],
        }
    }

    /// Objective with names and the analytic front attached.
    ///
    /// Positions are evaluated on the rayon pool. A position whose length
    /// differs from [`dimensions`](Self::dimensions) fails the evaluation.
    pub fn objective(self) -> Result<Objective, ConfigError> {
        let dimensions = self.dimensions();
        let evaluator = ElementwiseEvaluator::new(move |x: &[f64]| {
            if x.len() != dimensions || x.is_empty() {
                return Err(format!(
                    "{:?} takes {} parameters, got {}",
                    self,
                    dimensions,
                    x.len()
                ));
            }
            Ok(self.evaluate(x))
        })
        .parallel();
        let front = ReferenceFront::Generator(Box::new(move |n| self.pareto_front(n)));

        Ok(Objective::new(evaluator, 2)?
            .with_names(["f1", "f2"])?
            .with_true_pareto(front))
    }
}

impl RunConfig {
    /// Fill empty swarm bounds from the problem, or check that the given
    /// bounds have one entry per problem dimension.
    pub fn resolve_bounds(&mut self) -> Result<(), ConfigError> {
        let swarm = &mut self.swarm;
        if swarm.lower_bounds.is_empty() && swarm.upper_bounds.is_empty() {
            (swarm.lower_bounds, swarm.upper_bounds) = self.problem.bounds();
        }

        let expected = self.problem.dimensions();
        if swarm.lower_bounds.len() != expected || swarm.upper_bounds.len() != expected {
            return Err(ConfigError::DimensionMismatch {
                expected,
                lower: swarm.lower_bounds.len(),
                upper: swarm.upper_bounds.len(),
            });
        }
        Ok(())
    }
}

fn zdt_g(tail: &[f64]) -> f64 {
    if tail.is_empty() {
        return 1.0;
    }
    1.0 + 9.0 * tail.iter().sum::<f64>() / tail.len() as f64
}
