use rand::Rng;

/// Step size of the integrator.
///
/// The setters ignore invalid values and keep the previous setting. They
/// return the value in effect after the call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSizeConfig {
    nominal: f64,
    current: f64,
    jitter: f64,
}

impl Default for StepSizeConfig {
    fn default() -> StepSizeConfig {
        StepSizeConfig {
            nominal: 0.1,
            current: 0.1,
            jitter: 0.,
        }
    }
}

impl StepSizeConfig {
    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    pub fn set_nominal(&mut self, value: f64) -> f64 {
        if value > 0. {
            self.nominal = value;
        }
        self.nominal
    }

    /// Jitter is the relative width of the uniform step size perturbation
    /// and must lie in `[0, 1]`.
    pub fn set_jitter(&mut self, value: f64) -> f64 {
        if (0. ..=1.).contains(&value) {
            self.jitter = value;
        }
        self.jitter
    }

    /// Draw the step size for the next transition.
    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        self.current = self.nominal;
        if self.jitter > 0. {
            let u: f64 = rng.random();
            self.current *= 1. + self.jitter * (2. * u - 1.);
        }
        self.current
    }

    // Used by step size initialization, which may push the nominal step
    // size to zero or beyond the valid range before giving up.
    pub(crate) fn nominal_mut(&mut self) -> &mut f64 {
        &mut self.nominal
    }
}
