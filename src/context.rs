//! Sources of initial parameter values.
//!
//! Explicit user values are layered over random values with a
//! [`ChainedContext`], so randomness only fills the gaps.

use std::collections::HashMap;

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::{
    error::{HmcError, Result},
    model::Model,
};

/// Resolves initial values by parameter name.
pub trait InitContext {
    /// All constrained values of the continuous parameter `name`.
    fn values(&self, name: &str) -> Option<&[f64]>;

    /// All values of the discrete parameter `name`.
    fn int_values(&self, _name: &str) -> Option<&[i64]> {
        None
    }

    fn contains(&self, name: &str) -> bool {
        self.values(name).is_some() || self.int_values(name).is_some()
    }

    /// A single value of a continuous parameter.
    fn resolve(&self, name: &str, index: usize) -> Option<f64> {
        self.values(name).and_then(|values| values.get(index).copied())
    }
}

/// Values supplied by the caller. May cover only some parameters.
#[derive(Debug, Clone, Default)]
pub struct ExplicitContext {
    values: HashMap<String, Vec<f64>>,
    int_values: HashMap<String, Vec<i64>>,
}

impl ExplicitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name, values);
        self
    }

    pub fn with_int_values(mut self, name: impl Into<String>, values: Vec<i64>) -> Self {
        self.int_values.insert(name.into(), values);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.values.insert(name.into(), values);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.int_values.is_empty()
    }
}

impl InitContext for ExplicitContext {
    fn values(&self, name: &str) -> Option<&[f64]> {
        self.values.get(name).map(|values| values.as_slice())
    }

    fn int_values(&self, name: &str) -> Option<&[i64]> {
        self.int_values.get(name).map(|values| values.as_slice())
    }
}

/// Uniform random values for every continuous parameter of a model.
///
/// The draws happen on the unconstrained scale in `[-radius, radius]`,
/// one per unconstrained coordinate in canonical order, and are then
/// mapped to the constrained scale by the model. All coordinates are
/// drawn up front, so the amount of randomness consumed does not depend
/// on which values end up being used.
#[derive(Debug, Clone)]
pub struct RandomContext {
    values: HashMap<String, Vec<f64>>,
    radius: f64,
}

impl RandomContext {
    pub fn new<M, R>(model: &M, rng: &mut R, radius: f64) -> Result<Self>
    where
        M: Model + ?Sized,
        R: Rng + ?Sized,
    {
        if !(radius.is_finite() && radius >= 0.) {
            return Err(HmcError::InvalidInitRadius(radius));
        }
        let dist = Uniform::new_inclusive(-radius, radius)
            .map_err(|_| HmcError::InvalidInitRadius(radius))?;

        let unconstrained: Vec<f64> = (0..model.dim()).map(|_| dist.sample(&mut *rng)).collect();
        let mut constrained = vec![0f64; model.num_constrained()];
        model.constrain(&unconstrained, &mut constrained)?;

        let mut values = HashMap::new();
        let mut rest = constrained.as_slice();
        for spec in model.params() {
            if spec.size > rest.len() {
                return Err(HmcError::DimensionMismatch {
                    expected: spec.size,
                    found: rest.len(),
                });
            }
            let (head, tail) = rest.split_at(spec.size);
            values.insert(spec.name, head.to_vec());
            rest = tail;
        }

        Ok(RandomContext { values, radius })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl InitContext for RandomContext {
    fn values(&self, name: &str) -> Option<&[f64]> {
        self.values.get(name).map(|values| values.as_slice())
    }
}

/// Layers of contexts, tried in order. The first layer that knows a
/// parameter provides all of its values.
#[derive(Default)]
pub struct ChainedContext<'a> {
    layers: Vec<&'a dyn InitContext>,
}

impl<'a> ChainedContext<'a> {
    pub fn new(primary: &'a dyn InitContext, fallback: &'a dyn InitContext) -> Self {
        ChainedContext {
            layers: vec![primary, fallback],
        }
    }

    /// Add a layer with lower priority than all existing layers.
    pub fn push(&mut self, layer: &'a dyn InitContext) {
        self.layers.push(layer);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl InitContext for ChainedContext<'_> {
    fn values(&self, name: &str) -> Option<&[f64]> {
        self.layers.iter().find_map(|layer| layer.values(name))
    }

    fn int_values(&self, name: &str) -> Option<&[i64]> {
        self.layers.iter().find_map(|layer| layer.int_values(name))
    }
}
