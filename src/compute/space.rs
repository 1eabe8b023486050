//! Bounded parameter space with per-dimension type inference.
//!
//! Each dimension's type is decided once, at construction, from the JSON
//! representation of its bounds using the ordering `bool < int < float`:
//! a bound written as a float (even `5.0`) makes the dimension float, an
//! integer bound makes it at least int, and only two boolean bounds give a
//! boolean dimension. Positions are always stored as `f64`; integer and
//! boolean dimensions hold integral values.

use serde::{Deserialize, Serialize};

use crate::schema::{Bound, BoundarySide, ConfigError, InitializationMode};

use super::rng::SwarmRng;

/// Inferred type of a parameter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Bool,
    Int,
    Float,
}

impl ParamType {
    /// Type carried by a single bound literal.
    pub fn of(bound: &Bound) -> Self {
        match bound {
            Bound::Bool(_) => ParamType::Bool,
            Bound::Int(_) => ParamType::Int,
            Bound::Float(_) => ParamType::Float,
        }
    }

    /// Most permissive type of a bound pair.
    pub fn infer(lower: &Bound, upper: &Bound) -> Self {
        Self::of(lower).max(Self::of(upper))
    }
}

/// A single dimension of the search space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub index: usize,
    pub kind: ParamType,
    pub lower: f64,
    pub upper: f64,
}

impl Parameter {
    /// Cast a value to this dimension's type.
    ///
    /// Integers round to nearest; booleans snap to whichever bound is on the
    /// value's side of the midpoint.
    pub fn cast(&self, value: f64) -> f64 {
        match self.kind {
            ParamType::Float => value,
            ParamType::Int => value.round().clamp(self.lower, self.upper),
            ParamType::Bool => {
                if value >= 0.5 * (self.lower + self.upper) {
                    self.upper
                } else {
                    self.lower
                }
            }
        }
    }

    /// Clamp into bounds. Returns the value and whether clamping happened.
    #[inline]
    pub fn clamp(&self, value: f64) -> (f64, bool) {
        if value < self.lower {
            (self.lower, true)
        } else if value > self.upper {
            (self.upper, true)
        } else {
            (value, false)
        }
    }

    /// Check that a value lies within bounds.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Uniform draw within bounds, respecting the type.
    fn sample(&self, rng: &mut SwarmRng) -> f64 {
        match self.kind {
            ParamType::Float => rng.uniform(self.lower, self.upper),
            ParamType::Int => rng.integer(self.lower as i64, self.upper as i64) as f64,
            ParamType::Bool => {
                if rng.coin() {
                    self.upper
                } else {
                    self.lower
                }
            }
        }
    }
}

/// The bounded search space of the swarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    parameters: Vec<Parameter>,
}

impl ParameterSpace {
    /// Build the space from bound lists.
    ///
    /// Mismatched lengths truncate both lists to the shorter one and
    /// per-dimension type disagreements widen to the more permissive type;
    /// both only log a warning.
    pub fn new(lower_bounds: &[Bound], upper_bounds: &[Bound]) -> Result<Self, ConfigError> {
        if lower_bounds.len() != upper_bounds.len() {
            log::warn!(
                "Lower bounds ({}) and upper bounds ({}) differ in length; truncating to {}",
                lower_bounds.len(),
                upper_bounds.len(),
                lower_bounds.len().min(upper_bounds.len())
            );
        }

        let parameters = lower_bounds
            .iter()
            .zip(upper_bounds.iter())
            .enumerate()
            .map(|(index, (lower, upper))| {
                let kind = ParamType::infer(lower, upper);
                if ParamType::of(lower) != ParamType::of(upper) {
                    log::warn!(
                        "Parameter {}: bounds {:?} and {:?} differ in type; using {:?}",
                        index,
                        lower,
                        upper,
                        kind
                    );
                }

                let (lo, hi) = (lower.value(), upper.value());
                if lo.is_nan() || hi.is_nan() || lo > hi {
                    return Err(ConfigError::InvertedBounds {
                        index,
                        lower: lo,
                        upper: hi,
                    });
                }
                if !lo.is_finite() || !hi.is_finite() || !(hi - lo).is_finite() {
                    return Err(ConfigError::UnboundedParameter {
                        index,
                        lower: lo,
                        upper: hi,
                    });
                }

                Ok(Parameter {
                    index,
                    kind,
                    lower: lo,
                    upper: hi,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if parameters.is_empty() {
            return Err(ConfigError::EmptySpace);
        }

        Ok(Self { parameters })
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.parameters.len()
    }

    /// All parameters in index order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn lower_bounds(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.lower).collect()
    }

    pub fn upper_bounds(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.upper).collect()
    }

    /// Check that a position has the right length and lies within bounds.
    pub fn contains(&self, position: &[f64]) -> bool {
        position.len() == self.parameters.len()
            && self
                .parameters
                .iter()
                .zip(position)
                .all(|(p, &x)| p.contains(x))
    }

    /// Independent uniform draw per dimension.
    pub fn random_position(&self, rng: &mut SwarmRng) -> Vec<f64> {
        self.parameters.iter().map(|p| p.sample(rng)).collect()
    }

    /// Normal draw around `center`, clamped to bounds and cast.
    pub fn gaussian_position(&self, center: &[f64], spread: &[f64], rng: &mut SwarmRng) -> Vec<f64> {
        self.parameters
            .iter()
            .zip(center.iter().zip(spread))
            .map(|(p, (&c, &s))| p.cast(p.clamp(rng.normal(c, s)).0))
            .collect()
    }

    /// Every dimension at the chosen bound.
    pub fn boundary_position(&self, side: BoundarySide) -> Vec<f64> {
        match side {
            BoundarySide::Lower => self.lower_bounds(),
            BoundarySide::Upper => self.upper_bounds(),
        }
    }

    /// Check that an initialization mode fits this space.
    pub fn check_initialization(&self, mode: &InitializationMode) -> Result<(), ConfigError> {
        if let InitializationMode::Gaussian { center, spread } = mode {
            let dims = self.dimensions();
            if center.len() != dims || spread.len() != dims {
                return Err(ConfigError::InvalidGaussian(format!(
                    "center ({}) and spread ({}) must both have {} entries",
                    center.len(),
                    spread.len(),
                    dims
                )));
            }
        }
        Ok(())
    }

    /// Initial positions for `count` particles.
    ///
    /// Draws are particle-major, dimension-minor.
    pub fn initial_positions(
        &self,
        mode: &InitializationMode,
        count: usize,
        rng: &mut SwarmRng,
    ) -> Vec<Vec<f64>> {
        (0..count)
            .map(|_| match mode {
                InitializationMode::Random => self.random_position(rng),
                InitializationMode::Gaussian { center, spread } => {
                    self.gaussian_position(center, spread, rng)
                }
                InitializationMode::Boundary { side } => self.boundary_position(*side),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SwarmConfig;
    use proptest::prelude::*;

    fn float_space(lower: &[f64], upper: &[f64]) -> ParameterSpace {
        let lo: Vec<Bound> = lower.iter().map(|&v| Bound::Float(v)).collect();
        let hi: Vec<Bound> = upper.iter().map(|&v| Bound::Float(v)).collect();
        ParameterSpace::new(&lo, &hi).unwrap()
    }

    fn bound_strategy() -> impl Strategy<Value = Bound> {
        prop_oneof![
            any::<bool>().prop_map(Bound::Bool),
            (-100i64..100).prop_map(Bound::Int),
            (-100.0f64..100.0).prop_map(Bound::Float),
        ]
    }

    proptest! {
        #[test]
        fn prop_type_inference(lower in bound_strategy(), upper in bound_strategy()) {
            let kind = ParamType::infer(&lower, &upper);
            let is_float = |b: &Bound| matches!(b, Bound::Float(_));
            let is_int = |b: &Bound| matches!(b, Bound::Int(_));
            let both_bool = matches!((lower, upper), (Bound::Bool(_), Bound::Bool(_)));

            prop_assert_eq!(kind == ParamType::Bool, both_bool);
            prop_assert_eq!(
                kind == ParamType::Int,
                !is_float(&lower) && !is_float(&upper) && (is_int(&lower) || is_int(&upper))
            );
            prop_assert_eq!(kind == ParamType::Float, is_float(&lower) || is_float(&upper));
        }

        #[test]
        fn prop_random_positions_within_bounds(seed in any::<u64>()) {
            let space = ParameterSpace::new(
                &[Bound::Float(-1.0), Bound::Int(0), Bound::Bool(false)],
                &[Bound::Float(2.0), Bound::Int(9), Bound::Bool(true)],
            ).unwrap();
            let mut rng = SwarmRng::new(seed);
            for position in space.initial_positions(&InitializationMode::Random, 20, &mut rng) {
                prop_assert!(space.contains(&position));
                prop_assert_eq!(position[1].fract(), 0.0);
                prop_assert!(position[2] == 0.0 || position[2] == 1.0);
            }
        }
    }

    #[test]
    fn test_integral_float_bound_is_float() {
        let space = ParameterSpace::new(&[Bound::Int(0)], &[Bound::Float(5.0)]).unwrap();
        assert_eq!(space.parameters()[0].kind, ParamType::Float);
    }

    #[test]
    fn test_length_mismatch_truncates() {
        let space = ParameterSpace::new(
            &[Bound::Float(0.0), Bound::Float(0.0), Bound::Float(0.0)],
            &[Bound::Float(1.0), Bound::Float(1.0)],
        )
        .unwrap();
        assert_eq!(space.dimensions(), 2);
    }

    #[test]
    fn test_rejects_empty_and_inverted() {
        assert!(matches!(
            ParameterSpace::new(&[], &[Bound::Float(1.0)]),
            Err(ConfigError::EmptySpace)
        ));
        assert!(matches!(
            ParameterSpace::new(&[Bound::Float(2.0)], &[Bound::Float(1.0)]),
            Err(ConfigError::InvertedBounds { index: 0, .. })
        ));
    }

    #[test]
    fn test_rejects_unbounded_ranges() {
        let wide: SwarmConfig = serde_json::from_str(
            r#"{"lower_bounds": [-1e308], "upper_bounds": [1e308]}"#,
        )
        .unwrap();
        assert!(matches!(
            ParameterSpace::new(&wide.lower_bounds, &wide.upper_bounds),
            Err(ConfigError::UnboundedParameter { index: 0, .. })
        ));
        assert!(matches!(
            ParameterSpace::new(
                &[Bound::Float(0.0), Bound::Float(0.0)],
                &[Bound::Float(1.0), Bound::Float(f64::INFINITY)],
            ),
            Err(ConfigError::UnboundedParameter { index: 1, .. })
        ));
        assert!(ParameterSpace::new(&[Bound::Float(-1e300)], &[Bound::Float(1e300)]).is_ok());
    }

    #[test]
    fn test_cast() {
        let space = ParameterSpace::new(
            &[Bound::Int(0), Bound::Bool(false)],
            &[Bound::Int(10), Bound::Bool(true)],
        )
        .unwrap();
        let int = space.parameters()[0];
        let boolean = space.parameters()[1];

        assert_eq!(int.cast(3.4), 3.0);
        assert_eq!(int.cast(3.6), 4.0);
        assert_eq!(boolean.cast(0.49), 0.0);
        assert_eq!(boolean.cast(0.5), 1.0);
    }

    #[test]
    fn test_gaussian_clamps() {
        let space = float_space(&[0.0, 0.0], &[1.0, 1.0]);
        let mut rng = SwarmRng::new(5);
        let mode = InitializationMode::Gaussian {
            center: vec![0.9, 0.1],
            spread: vec![5.0, 5.0],
        };
        for position in space.initial_positions(&mode, 100, &mut rng) {
            assert!(space.contains(&position));
        }
    }

    #[test]
    fn test_gaussian_length_checked() {
        let space = float_space(&[0.0, 0.0], &[1.0, 1.0]);
        let mode = InitializationMode::Gaussian {
            center: vec![0.5],
            spread: vec![0.1, 0.1],
        };
        assert!(space.check_initialization(&mode).is_err());
    }

    #[test]
    fn test_boundary_initialization() {
        let space = float_space(&[0.0, -1.0], &[5.0, 3.0]);
        let mut rng = SwarmRng::new(0);
        let mode = InitializationMode::Boundary {
            side: BoundarySide::Upper,
        };
        let positions = space.initial_positions(&mode, 4, &mut rng);
        assert!(positions.iter().all(|p| p == &vec![5.0, 3.0]));
    }
}
