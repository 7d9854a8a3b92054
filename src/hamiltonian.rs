use rand::Rng;

use crate::{error::Result, model::Model, state::PhaseSpacePoint};

/// The hamiltonian defined by the potential energy and the kinetic energy
///
/// The potential energy is always `-logp` of the model, so implementations
/// only provide the kinetic part and the momentum distribution.
pub trait Hamiltonian<M: Model> {
    /// Kinetic energy of the momentum stored in `z`.
    fn kinetic_energy(&self, z: &PhaseSpacePoint) -> f64;

    /// Draw a new momentum into `z.p`.
    fn sample_momentum<R: Rng + ?Sized>(&self, z: &mut PhaseSpacePoint, rng: &mut R);

    fn total_energy(&self, z: &PhaseSpacePoint) -> f64 {
        self.kinetic_energy(z) + z.potential_energy
    }

    /// Refresh potential energy and gradient at the position of `z`.
    fn init(&mut self, model: &mut M, z: &mut PhaseSpacePoint) -> Result<()> {
        z.update_potential_gradient(model)
    }
}
