//! Building blocks shared by Hamiltonian Monte Carlo samplers: phase space
//! state, step size handling, reproducible per chain initialization and a
//! finite difference check of model gradients.

pub(crate) mod base_hmc;
pub(crate) mod context;
pub(crate) mod diagnose;
pub(crate) mod error;
pub(crate) mod hamiltonian;
pub(crate) mod integrator;
pub(crate) mod model;
pub(crate) mod rng;
pub(crate) mod state;
pub(crate) mod stepsize;
pub(crate) mod writer;

#[cfg(test)]
pub(crate) mod test_logps;

pub use base_hmc::{BaseHmc, HmcParts, HmcSampler};
pub use context::{ChainedContext, ExplicitContext, InitContext, RandomContext};
pub use diagnose::{
    check_gradients, diagnose, finite_diff_grad, test_gradients, DiagnoseSettings, GradientEntry,
    GradientTest,
};
pub use error::{HmcError, LogpError, Result};
pub use hamiltonian::Hamiltonian;
pub use integrator::Integrator;
pub use model::{InitPoint, Model, ParamSpec};
pub use rng::{advance_chain, chain_rng, ChainRng, Discard, DISCARD_STRIDE, MAX_CHAIN};
pub use state::{PhaseSpacePoint, Sample};
pub use stepsize::StepSizeConfig;
pub use writer::{NullWriter, StreamWriter, Writer};
