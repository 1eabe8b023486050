//! Particle state and the velocity/position update rule.

use serde::{Deserialize, Serialize};

use crate::schema::{Direction, SwarmConfig};

use super::dominance::dominates;
use super::rng::SwarmRng;
use super::space::ParameterSpace;

/// Scalars of the velocity update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateCoefficients {
    /// Inertia weight `w`.
    pub inertia: f64,
    /// Cognitive coefficient `c1`.
    pub cognitive: f64,
    /// Social coefficient `c2`.
    pub social: f64,
}

impl From<&SwarmConfig> for UpdateCoefficients {
    fn from(config: &SwarmConfig) -> Self {
        Self {
            inertia: config.inertia_weight,
            cognitive: config.cognitive_coefficient,
            social: config.social_coefficient,
        }
    }
}

/// A member of the swarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    /// Fitness of the most recently evaluated position.
    pub fitness: Option<Vec<f64>>,
    pub best_position: Vec<f64>,
    pub best_fitness: Option<Vec<f64>>,
    /// Iterations since the personal best last improved.
    pub stagnation: usize,
}

impl Particle {
    /// Particle at rest at `position`, with no evaluation yet.
    pub fn new(position: Vec<f64>) -> Self {
        Self {
            velocity: vec![0.0; position.len()],
            best_position: position.clone(),
            position,
            fitness: None,
            best_fitness: None,
            stagnation: 0,
        }
    }

    /// Record the fitness of the current position and update the personal best.
    ///
    /// The personal best is replaced only when the new fitness dominates it
    /// (or none exists yet); ties keep the old one. Returns true on
    /// replacement.
    pub fn record_evaluation(&mut self, fitness: &[f64], directions: &[Direction]) -> bool {
        self.fitness = Some(fitness.to_vec());

        let improved = match &self.best_fitness {
            None => true,
            Some(best) => dominates(fitness, best, directions),
        };

        if improved {
            self.best_fitness = Some(fitness.to_vec());
            self.best_position.clone_from(&self.position);
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }
        improved
    }

    /// Velocity update toward the personal best and `leader`.
    ///
    /// Draws `r1` then `r2` per dimension.
    pub fn update_velocity(
        &mut self,
        leader: &[f64],
        coefficients: &UpdateCoefficients,
        rng: &mut SwarmRng,
    ) {
        for (d, v) in self.velocity.iter_mut().enumerate() {
            let r1 = rng.unit();
            let r2 = rng.unit();
            let x = self.position[d];
            *v = coefficients.inertia * *v
                + coefficients.cognitive * r1 * (self.best_position[d] - x)
                + coefficients.social * r2 * (leader[d] - x);
        }
    }

    /// Move by the current velocity.
    ///
    /// A dimension that leaves its bounds is clamped and its velocity
    /// zeroed; the result is then cast to the dimension's type.
    pub fn apply_velocity(&mut self, space: &ParameterSpace) {
        for ((x, v), param) in self
            .position
            .iter_mut()
            .zip(self.velocity.iter_mut())
            .zip(space.parameters())
        {
            let (clamped, hit) = param.clamp(*x + *v);
            if hit {
                *v = 0.0;
            }
            *x = param.cast(clamped);
        }
    }

    /// Reinitialize the position for exploration.
    ///
    /// Velocity and stagnation reset; the personal best is kept.
    pub fn scatter(&mut self, position: Vec<f64>) {
        self.position = position;
        self.velocity.iter_mut().for_each(|v| *v = 0.0);
        self.stagnation = 0;
    }
}
