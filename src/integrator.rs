use crate::{error::Result, hamiltonian::Hamiltonian, model::Model, state::PhaseSpacePoint};

/// Moves a point along the flow of a hamiltonian.
pub trait Integrator<M: Model, H: Hamiltonian<M>> {
    /// Perform one integration step of size `epsilon`, leaving `z` with
    /// an up to date potential energy and gradient.
    fn evolve(
        &mut self,
        model: &mut M,
        z: &mut PhaseSpacePoint,
        hamiltonian: &H,
        epsilon: f64,
    ) -> Result<()>;
}
