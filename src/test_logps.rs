//! Small models and mock capabilities for the unit tests.

use anyhow::bail;
use rand::Rng;
use rand_distr::StandardNormal;
use thiserror::Error;

use crate::{
    error::{HmcError, LogpError, Result},
    hamiltonian::Hamiltonian,
    integrator::Integrator,
    model::{Model, ParamSpec},
    state::PhaseSpacePoint,
    writer::Writer,
};

#[derive(Error, Debug)]
pub enum TestLogpError {
    #[error("Position is outside of the support")]
    OutsideSupport,
}

impl LogpError for TestLogpError {
    fn is_recoverable(&self) -> bool {
        true
    }
}

/// `logp(q) = sum(q^2)`, optionally with a wrong gradient entry.
#[derive(Clone, Debug)]
pub struct QuadraticModel {
    params: Vec<ParamSpec>,
    int_params: Vec<ParamSpec>,
    gradient_error: Option<(usize, f64)>,
}

impl QuadraticModel {
    pub fn new(dim: usize) -> Self {
        QuadraticModel {
            params: vec![ParamSpec::new("q", dim)],
            int_params: Vec::new(),
            gradient_error: None,
        }
    }

    pub fn with_extra_param(mut self, name: &str, size: usize) -> Self {
        self.params.push(ParamSpec::new(name, size));
        self
    }

    pub fn with_int_param(mut self, name: &str) -> Self {
        self.int_params.push(ParamSpec::scalar(name));
        self
    }

    pub fn with_gradient_error(mut self, index: usize, offset: f64) -> Self {
        self.gradient_error = Some((index, offset));
        self
    }
}

impl Model for QuadraticModel {
    type LogpError = TestLogpError;

    fn dim(&self) -> usize {
        self.params.iter().map(|spec| spec.size).sum()
    }

    fn params(&self) -> Vec<ParamSpec> {
        self.params.clone()
    }

    fn int_params(&self) -> Vec<ParamSpec> {
        self.int_params.clone()
    }

    fn logp(
        &mut self,
        position: &[f64],
        gradient: &mut [f64],
    ) -> std::result::Result<f64, TestLogpError> {
        let mut logp = 0f64;
        for (&x, g) in position.iter().zip(gradient.iter_mut()) {
            logp += x * x;
            *g = 2. * x;
        }
        if let Some((index, offset)) = self.gradient_error {
            gradient[index] += offset;
        }
        Ok(logp)
    }
}

#[derive(Clone, Debug)]
pub struct NormalLogp {
    dim: usize,
    mu: f64,
}

impl NormalLogp {
    pub fn new(dim: usize, mu: f64) -> NormalLogp {
        NormalLogp { dim, mu }
    }
}

impl Model for NormalLogp {
    type LogpError = TestLogpError;

    fn dim(&self) -> usize {
        self.dim
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::new("x", self.dim)]
    }

    fn logp(
        &mut self,
        position: &[f64],
        gradient: &mut [f64],
    ) -> std::result::Result<f64, TestLogpError> {
        let n = position.len();
        assert!(gradient.len() == n);

        let mut logp = 0f64;
        for (p, g) in position.iter().zip(gradient.iter_mut()) {
            let val = self.mu - p;
            logp -= val * val / 2.;
            *g = val;
        }
        Ok(logp)
    }
}

/// A positive scale parameter, sampled on the log scale.
#[derive(Clone, Debug)]
pub struct PositiveModel;

impl Model for PositiveModel {
    type LogpError = TestLogpError;

    fn dim(&self) -> usize {
        1
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::scalar("sigma")]
    }

    fn logp(
        &mut self,
        position: &[f64],
        gradient: &mut [f64],
    ) -> std::result::Result<f64, TestLogpError> {
        gradient[0] = -position[0];
        Ok(-position[0] * position[0] / 2.)
    }

    fn constrain(&self, unconstrained: &[f64], constrained: &mut [f64]) -> anyhow::Result<()> {
        constrained[0] = unconstrained[0].exp();
        Ok(())
    }

    fn unconstrain(
        &self,
        constrained: &[f64],
        unconstrained: &mut [f64],
        messages: &mut dyn Writer,
    ) -> anyhow::Result<()> {
        if constrained[0] <= 0. {
            bail!("sigma must be positive, got {}", constrained[0]);
        }
        messages.write_line("sigma is log transformed");
        unconstrained[0] = constrained[0].ln();
        Ok(())
    }
}

/// `logp(x) = ln(x)`, which fails for non-positive `x`.
#[derive(Clone, Debug)]
pub struct LogModel;

impl Model for LogModel {
    type LogpError = TestLogpError;

    fn dim(&self) -> usize {
        1
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::scalar("x")]
    }

    fn logp(
        &mut self,
        position: &[f64],
        gradient: &mut [f64],
    ) -> std::result::Result<f64, TestLogpError> {
        if position[0] <= 0. {
            return Err(TestLogpError::OutsideSupport);
        }
        gradient[0] = 1. / position[0];
        Ok(position[0].ln())
    }
}

/// Unit mass matrix.
pub struct UnitHamiltonian;

impl<M: Model> Hamiltonian<M> for UnitHamiltonian {
    fn kinetic_energy(&self, z: &PhaseSpacePoint) -> f64 {
        z.p.iter().map(|p| p * p).sum::<f64>() / 2.
    }

    fn sample_momentum<R: Rng + ?Sized>(&self, z: &mut PhaseSpacePoint, rng: &mut R) {
        z.p.iter_mut().for_each(|p| *p = rng.sample(StandardNormal));
    }
}

/// No kinetic energy and a momentum that never changes.
pub struct MockHamiltonian;

impl<M: Model> Hamiltonian<M> for MockHamiltonian {
    fn kinetic_energy(&self, _z: &PhaseSpacePoint) -> f64 {
        0.
    }

    fn sample_momentum<R: Rng + ?Sized>(&self, _z: &mut PhaseSpacePoint, _rng: &mut R) {}
}

/// Leaves the point where it is.
pub struct MockIntegrator;

impl<M: Model, H: Hamiltonian<M>> Integrator<M, H> for MockIntegrator {
    fn evolve(
        &mut self,
        _model: &mut M,
        _z: &mut PhaseSpacePoint,
        _hamiltonian: &H,
        _epsilon: f64,
    ) -> Result<()> {
        Ok(())
    }
}

/// Leapfrog for a unit mass matrix.
pub struct Leapfrog;

impl<M: Model, H: Hamiltonian<M>> Integrator<M, H> for Leapfrog {
    fn evolve(
        &mut self,
        model: &mut M,
        z: &mut PhaseSpacePoint,
        _hamiltonian: &H,
        epsilon: f64,
    ) -> Result<()> {
        for (p, g) in z.p.iter_mut().zip(z.g.iter()) {
            *p -= epsilon / 2. * g;
        }
        for (q, p) in z.q.iter_mut().zip(z.p.iter()) {
            *q += epsilon * p;
        }
        z.update_potential_gradient(model)?;
        for (p, g) in z.p.iter_mut().zip(z.g.iter()) {
            *p -= epsilon / 2. * g;
        }
        Ok(())
    }
}

/// Raises the potential energy by one on every step, so no step size is
/// ever accepted.
pub struct DriftIntegrator;

impl<M: Model, H: Hamiltonian<M>> Integrator<M, H> for DriftIntegrator {
    fn evolve(
        &mut self,
        _model: &mut M,
        z: &mut PhaseSpacePoint,
        _hamiltonian: &H,
        _epsilon: f64,
    ) -> Result<()> {
        z.potential_energy += 1.;
        Ok(())
    }
}

/// Moves the point and then fails with an unrecoverable error.
pub struct FailingIntegrator;

impl<M: Model, H: Hamiltonian<M>> Integrator<M, H> for FailingIntegrator {
    fn evolve(
        &mut self,
        _model: &mut M,
        z: &mut PhaseSpacePoint,
        _hamiltonian: &H,
        _epsilon: f64,
    ) -> Result<()> {
        z.q[0] = 99.;
        Err(HmcError::LogpFailure {
            recoverable: false,
            source: Box::new(TestLogpError::OutsideSupport),
        })
    }
}
