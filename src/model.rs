//! The model capability consumed by the samplers and the gradient test.

use std::fmt::Debug;

use anyhow::bail;

use crate::{
    context::InitContext,
    error::{HmcError, LogpError, Result},
    writer::Writer,
};

/// Name and number of values of a parameter block, in the canonical
/// parameter order of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub size: usize,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        ParamSpec {
            name: name.into(),
            size,
        }
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self::new(name, 1)
    }
}

/// Initial values in the unconstrained space of a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitPoint {
    pub continuous: Vec<f64>,
    pub discrete: Vec<i64>,
}

/// A log density with gradient on an unconstrained space, together with
/// the transformation between that space and the user facing parameters.
pub trait Model {
    type LogpError: Debug + Send + Sync + LogpError + 'static;

    /// Number of unconstrained continuous parameters.
    fn dim(&self) -> usize;

    /// Continuous parameters in canonical order, on the constrained scale.
    fn params(&self) -> Vec<ParamSpec>;

    /// Discrete parameters in canonical order.
    fn int_params(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    /// Compute the unnormalized log density and store its gradient
    /// (computed by reverse mode autodiff) in `gradient`.
    fn logp(
        &mut self,
        position: &[f64],
        gradient: &mut [f64],
    ) -> std::result::Result<f64, Self::LogpError>;

    /// The log density without its gradient.
    fn log_density(&mut self, position: &[f64]) -> std::result::Result<f64, Self::LogpError> {
        let mut gradient = vec![0f64; position.len()];
        self.logp(position, &mut gradient)
    }

    /// Total number of constrained continuous values.
    fn num_constrained(&self) -> usize {
        self.params().iter().map(|spec| spec.size).sum()
    }

    /// Map an unconstrained vector to constrained parameter values,
    /// laid out in the order of `params`.
    fn constrain(&self, unconstrained: &[f64], constrained: &mut [f64]) -> anyhow::Result<()> {
        if unconstrained.len() != constrained.len() {
            bail!(
                "Cannot copy {} unconstrained values into {} parameters",
                unconstrained.len(),
                constrained.len()
            );
        }
        constrained.copy_from_slice(unconstrained);
        Ok(())
    }

    /// Inverse of `constrain`. Human readable notes about the
    /// transformation go to `messages`.
    fn unconstrain(
        &self,
        constrained: &[f64],
        unconstrained: &mut [f64],
        _messages: &mut dyn Writer,
    ) -> anyhow::Result<()> {
        if unconstrained.len() != constrained.len() {
            bail!(
                "Cannot copy {} parameter values into {} unconstrained values",
                constrained.len(),
                unconstrained.len()
            );
        }
        unconstrained.copy_from_slice(constrained);
        Ok(())
    }

    /// Read every parameter from `context` and move it to the
    /// unconstrained space.
    fn transform_inits(
        &self,
        context: &dyn InitContext,
        messages: &mut dyn Writer,
    ) -> Result<InitPoint> {
        let mut constrained = Vec::with_capacity(self.num_constrained());
        for spec in self.params() {
            let values = context
                .values(&spec.name)
                .ok_or_else(|| HmcError::MissingInit(spec.name.clone()))?;
            check_size(&spec, values.len())?;
            constrained.extend_from_slice(values);
        }

        let mut discrete = Vec::new();
        for spec in self.int_params() {
            let values = context
                .int_values(&spec.name)
                .ok_or_else(|| HmcError::MissingInit(spec.name.clone()))?;
            check_size(&spec, values.len())?;
            discrete.extend_from_slice(values);
        }

        let mut continuous = vec![0f64; self.dim()];
        self.unconstrain(&constrained, &mut continuous, messages)?;
        Ok(InitPoint {
            continuous,
            discrete,
        })
    }
}

fn check_size(spec: &ParamSpec, found: usize) -> Result<()> {
    if found != spec.size {
        return Err(HmcError::InitSize {
            name: spec.name.clone(),
            expected: spec.size,
            found,
        });
    }
    Ok(())
}
