//! State shared by all Hamiltonian samplers.
//!
//! [`BaseHmc`] is a plain record holding the model, the hamiltonian, the
//! integrator, the random generator, the current point in phase space and
//! the step size. Concrete samplers embed it and implement
//! [`HmcSampler::transition`].

use rand::Rng;

use crate::{
    error::{HmcError, Result},
    hamiltonian::Hamiltonian,
    integrator::Integrator,
    model::Model,
    state::{PhaseSpacePoint, Sample},
    stepsize::StepSizeConfig,
    writer::Writer,
};

/// Step size initialization gives up above this value.
const MAX_INIT_STEP_SIZE: f64 = 1e7;

/// Mutable access to all parts of a sampler at once, for transitions.
pub struct HmcParts<'a, M, H, I, R> {
    pub model: &'a mut M,
    pub hamiltonian: &'a mut H,
    pub integrator: &'a mut I,
    pub rng: &'a mut R,
    pub z: &'a mut PhaseSpacePoint,
    pub step_size: &'a mut StepSizeConfig,
}

pub struct BaseHmc<M, H, I, R> {
    name: String,
    model: M,
    hamiltonian: H,
    integrator: I,
    rng: R,
    z: PhaseSpacePoint,
    step_size: StepSizeConfig,
    seeded: bool,
}

impl<M, H, I, R> BaseHmc<M, H, I, R>
where
    M: Model,
    H: Hamiltonian<M>,
    I: Integrator<M, H>,
    R: Rng,
{
    pub fn new(name: impl Into<String>, model: M, hamiltonian: H, integrator: I, rng: R) -> Self {
        let z = PhaseSpacePoint::new(model.dim());
        BaseHmc {
            name: name.into(),
            model,
            hamiltonian,
            integrator,
            rng,
            z,
            step_size: StepSizeConfig::default(),
            seeded: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn z(&self) -> &PhaseSpacePoint {
        &self.z
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn hamiltonian(&self) -> &H {
        &self.hamiltonian
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn parts_mut(&mut self) -> HmcParts<'_, M, H, I, R> {
        HmcParts {
            model: &mut self.model,
            hamiltonian: &mut self.hamiltonian,
            integrator: &mut self.integrator,
            rng: &mut self.rng,
            z: &mut self.z,
            step_size: &mut self.step_size,
        }
    }

    /// Move the sampler to `q`.
    ///
    /// Potential energy and gradient are not recomputed, samplers that
    /// need them at the new position have to evaluate the model first.
    pub fn seed(&mut self, q: &[f64]) -> Result<()> {
        self.z.set_position(q)?;
        self.seeded = true;
        log::debug!("Seeded {} at {:?}", self.name, q);
        Ok(())
    }

    pub fn nominal_step_size(&self) -> f64 {
        self.step_size.nominal()
    }

    pub fn current_step_size(&self) -> f64 {
        self.step_size.current()
    }

    pub fn step_size_jitter(&self) -> f64 {
        self.step_size.jitter()
    }

    /// Values that are not positive are ignored.
    pub fn set_nominal_step_size(&mut self, value: f64) -> f64 {
        self.step_size.set_nominal(value)
    }

    /// Values outside of `[0, 1]` are ignored.
    pub fn set_step_size_jitter(&mut self, value: f64) -> f64 {
        self.step_size.set_jitter(value)
    }

    /// Draw the (possibly jittered) step size of the next transition.
    pub fn sample_step_size(&mut self) -> f64 {
        self.step_size.sample(&mut self.rng)
    }

    /// Search for a nominal step size around the acceptance threshold of
    /// a single integration step, starting at the current position.
    ///
    /// The step size is doubled while a trial step is accepted with
    /// probability above 0.8 and halved while it is below. The position
    /// is restored afterwards. On error the nominal step size is restored
    /// as well.
    pub fn init_step_size(&mut self) -> Result<()> {
        let nominal = self.step_size.nominal();
        if nominal == 0. || nominal > MAX_INIT_STEP_SIZE || nominal.is_nan() {
            return Ok(());
        }

        let z_init = self.z.clone();
        let result = self.search_step_size(&z_init);
        self.z.clone_from(&z_init);

        match result {
            Ok(()) => {
                log::debug!(
                    "Initialized step size of {} to {}",
                    self.name,
                    self.step_size.nominal()
                );
                Ok(())
            }
            Err(err) => {
                *self.step_size.nominal_mut() = nominal;
                Err(err)
            }
        }
    }

    // Leaves `z` at the last trial point, callers restore it.
    fn search_step_size(&mut self, z_init: &PhaseSpacePoint) -> Result<()> {
        let threshold = 0.8f64.ln();
        let increase = self.trial_energy_change()? > threshold;

        loop {
            self.z.clone_from(z_init);
            let delta = self.trial_energy_change()?;

            if increase && !(delta > threshold) {
                return Ok(());
            }
            if !increase && !(delta < threshold) {
                return Ok(());
            }

            let nominal = self.step_size.nominal_mut();
            if increase {
                *nominal *= 2.;
            } else {
                *nominal *= 0.5;
            }

            if *nominal > MAX_INIT_STEP_SIZE {
                return Err(HmcError::ImproperPosterior);
            }
            if *nominal == 0. {
                return Err(HmcError::NoAcceptableStepSize);
            }
        }
    }

    // H0 - H1 for one integration step from the current position with
    // fresh momentum. Points where the model is not finite count as an
    // infinite energy.
    fn trial_energy_change(&mut self) -> Result<f64> {
        self.hamiltonian.sample_momentum(&mut self.z, &mut self.rng);
        self.hamiltonian.init(&mut self.model, &mut self.z)?;
        let h0 = self.hamiltonian.total_energy(&self.z);

        let step = self.step_size.nominal();
        let h = match self
            .integrator
            .evolve(&mut self.model, &mut self.z, &self.hamiltonian, step)
        {
            Ok(()) => self.hamiltonian.total_energy(&self.z),
            Err(HmcError::NonFiniteLogp { .. }) | Err(HmcError::NonFiniteGradient { .. }) => {
                f64::INFINITY
            }
            Err(HmcError::LogpFailure {
                recoverable: true, ..
            }) => f64::INFINITY,
            Err(err) => return Err(err),
        };
        let h = if h.is_nan() { f64::INFINITY } else { h };
        Ok(h0 - h)
    }

    pub fn write_sampler_state(&self, writer: &mut dyn Writer) {
        writer.write_line(&format!("Step size = {}", self.step_size.nominal()));
    }

    pub fn write_sampler_param_names(&self, names: &mut Vec<String>) {
        names.push("stepsize__".to_string());
    }

    pub fn write_sampler_params(&self, values: &mut Vec<f64>) {
        values.push(self.step_size.current());
    }

    /// Names of the momentum and gradient columns of a diagnostic file,
    /// given the names of the unconstrained coordinates.
    pub fn sampler_diagnostic_names(&self, model_names: &[String], names: &mut Vec<String>) {
        names.extend(model_names.iter().map(|name| format!("p_{name}")));
        names.extend(model_names.iter().map(|name| format!("g_{name}")));
    }

    pub fn sampler_diagnostics(&self, values: &mut Vec<f64>) {
        values.extend_from_slice(&self.z.p);
        values.extend_from_slice(&self.z.g);
    }
}

/// A Hamiltonian sampler built on [`BaseHmc`].
pub trait HmcSampler {
    type Model: Model;
    type Hamiltonian: Hamiltonian<Self::Model>;
    type Integrator: Integrator<Self::Model, Self::Hamiltonian>;
    type Rng: Rng;

    fn base(&self) -> &BaseHmc<Self::Model, Self::Hamiltonian, Self::Integrator, Self::Rng>;

    fn base_mut(
        &mut self,
    ) -> &mut BaseHmc<Self::Model, Self::Hamiltonian, Self::Integrator, Self::Rng>;

    /// Perform one Markov transition starting at `current`.
    ///
    /// Only meaningful after the sampler has been seeded.
    fn transition(&mut self, current: &Sample) -> Result<Sample>;

    /// Names of sampler specific tuning statistics.
    fn sampler_param_names(&self, _names: &mut Vec<String>) {}

    /// Values of sampler specific tuning statistics.
    fn sampler_params(&self, _values: &mut Vec<f64>) {}

    fn seed(&mut self, q: &[f64]) -> Result<()> {
        self.base_mut().seed(q)
    }

    fn write_sampler_state(&self, writer: &mut dyn Writer) {
        self.base().write_sampler_state(writer)
    }

    fn sample_step_size(&mut self) -> f64 {
        self.base_mut().sample_step_size()
    }

    fn init_step_size(&mut self) -> Result<()> {
        self.base_mut().init_step_size()
    }
}
