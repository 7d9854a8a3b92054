use crate::{
    error::{HmcError, Result},
    model::Model,
};

/// A point in phase space.
///
/// `g` is the gradient of the potential energy `V = -logp`, not of the
/// log density. Both `g` and `potential_energy` go stale as soon as `q`
/// is changed and have to be refreshed with `update_potential_gradient`.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSpacePoint {
    pub q: Box<[f64]>,
    pub p: Box<[f64]>,
    pub g: Box<[f64]>,
    pub potential_energy: f64,
}

impl PhaseSpacePoint {
    pub fn new(dim: usize) -> Self {
        PhaseSpacePoint {
            q: vec![0f64; dim].into(),
            p: vec![0f64; dim].into(),
            g: vec![0f64; dim].into(),
            potential_energy: 0.,
        }
    }

    pub fn dim(&self) -> usize {
        self.q.len()
    }

    /// Overwrite the position. The length must match the dimension.
    pub fn set_position(&mut self, position: &[f64]) -> Result<()> {
        if position.len() != self.dim() {
            return Err(HmcError::DimensionMismatch {
                expected: self.dim(),
                found: position.len(),
            });
        }
        self.q.copy_from_slice(position);
        Ok(())
    }

    /// Evaluate the model at `q` and store potential energy and gradient.
    pub fn update_potential_gradient<M: Model + ?Sized>(&mut self, model: &mut M) -> Result<()> {
        let logp = model.logp(&self.q, &mut self.g).map_err(HmcError::logp)?;
        if !logp.is_finite() {
            return Err(HmcError::NonFiniteLogp {
                position: self.q.clone(),
            });
        }
        if !self.g.iter().all(|x| x.is_finite()) {
            return Err(HmcError::NonFiniteGradient {
                position: self.q.clone(),
            });
        }
        self.potential_energy = -logp;
        self.g.iter_mut().for_each(|g| *g = -*g);
        Ok(())
    }
}

/// A draw of a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub cont_params: Box<[f64]>,
    pub log_prob: f64,
    pub accept_stat: f64,
}

impl Sample {
    pub fn new(cont_params: impl Into<Box<[f64]>>, log_prob: f64, accept_stat: f64) -> Self {
        Sample {
            cont_params: cont_params.into(),
            log_prob,
            accept_stat,
        }
    }
}
