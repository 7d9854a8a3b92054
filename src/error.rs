use thiserror::Error;

/// Errors that happen when we evaluate the logp and gradient function
pub trait LogpError: std::error::Error {
    /// Unrecoverable errors stop the chain, recoverable errors can be
    /// treated as divergences by a concrete sampler.
    fn is_recoverable(&self) -> bool;
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HmcError {
    #[error("Chain number {0} is invalid, chains are numbered from 1 to {max}", max = crate::rng::MAX_CHAIN)]
    InvalidChain(u64),
    #[error("Expected a vector of length {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("No initial value for parameter {0}")]
    MissingInit(String),
    #[error("Initial value for parameter {name} has {found} values, expected {expected}")]
    InitSize {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Initialization radius must be finite and non-negative, got {0}")]
    InvalidInitRadius(f64),
    #[error("Finite difference epsilon must be finite and positive, got {0}")]
    InvalidEpsilon(f64),
    #[error("Gradient error tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
    #[error("Log density is not finite at {position:?}")]
    NonFiniteLogp { position: Box<[f64]> },
    #[error("Gradient is not finite at {position:?}")]
    NonFiniteGradient { position: Box<[f64]> },
    #[error("Logp function returned error (recoverable: {recoverable})")]
    LogpFailure {
        recoverable: bool,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error(transparent)]
    Transform(#[from] anyhow::Error),
    #[error("Posterior is improper. Please check your model.")]
    ImproperPosterior,
    #[error("No acceptably small step size could be found. Perhaps the posterior is not continuous?")]
    NoAcceptableStepSize,
}

impl HmcError {
    pub(crate) fn logp<E>(err: E) -> HmcError
    where
        E: LogpError + Send + Sync + 'static,
    {
        HmcError::LogpFailure {
            recoverable: err.is_recoverable(),
            source: Box::new(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, HmcError>;
