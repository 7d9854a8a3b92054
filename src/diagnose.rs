//! Check the gradient of a model against finite differences.
//!
//! A wrong gradient does not make sampling fail, it silently produces
//! wrong draws. Comparing the reverse mode gradient with a centered finite
//! difference at a (random or user supplied) initial point catches most
//! of these bugs before an expensive sampling run.

use anyhow::Context;
use itertools::izip;

use crate::{
    context::{ChainedContext, InitContext, RandomContext},
    error::{HmcError, Result},
    model::Model,
    rng::chain_rng,
    writer::Writer,
};

/// Settings for a gradient test run.
#[derive(Debug, Clone, Copy)]
pub struct DiagnoseSettings {
    /// Seed of the random stream shared by all chains.
    pub seed: u64,
    /// Chain number, starting at 1. Selects the part of the stream used
    /// for random initial values.
    pub chain: u64,
    /// Parameters without user values are drawn uniformly from
    /// `[-init_radius, init_radius]` on the unconstrained scale.
    pub init_radius: f64,
    /// Perturbation used for the finite differences.
    pub epsilon: f64,
    /// Largest absolute difference between the two gradients that
    /// still counts as a match.
    pub error: f64,
}

impl Default for DiagnoseSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            chain: 1,
            init_radius: 2.,
            epsilon: 1e-6,
            error: 1e-6,
        }
    }
}

/// Comparison of both gradients for one unconstrained coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientEntry {
    pub index: usize,
    pub value: f64,
    pub model: f64,
    pub finite_diff: f64,
    /// Signed `model - finite_diff`, as shown in the result table. The
    /// tolerance and the parameter records use [`GradientEntry::abs_error`].
    pub error: f64,
}

impl GradientEntry {
    pub fn abs_error(&self) -> f64 {
        self.error.abs()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradientTest {
    pub log_prob: f64,
    pub entries: Vec<GradientEntry>,
    pub tolerance: f64,
}

impl GradientTest {
    /// Coordinates where the gradients differ by more than the tolerance.
    pub fn failures(&self) -> impl Iterator<Item = &GradientEntry> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.abs_error() > self.tolerance)
    }

    pub fn num_failed(&self) -> usize {
        self.failures().count()
    }
}

fn check_epsilon(epsilon: f64) -> Result<()> {
    if !(epsilon.is_finite() && epsilon > 0.) {
        return Err(HmcError::InvalidEpsilon(epsilon));
    }
    Ok(())
}

fn check_tolerance(error: f64) -> Result<()> {
    if !(error.is_finite() && error >= 0.) {
        return Err(HmcError::InvalidTolerance(error));
    }
    Ok(())
}

fn finite_log_density<M: Model + ?Sized>(model: &mut M, position: &[f64]) -> Result<f64> {
    let logp = model.log_density(position).map_err(HmcError::logp)?;
    if !logp.is_finite() {
        return Err(HmcError::NonFiniteLogp {
            position: position.into(),
        });
    }
    Ok(logp)
}

/// Centered finite difference approximation of the gradient of the log
/// density at `position`.
pub fn finite_diff_grad<M: Model + ?Sized>(
    model: &mut M,
    position: &[f64],
    epsilon: f64,
) -> Result<Vec<f64>> {
    check_epsilon(epsilon)?;
    let mut perturbed = position.to_vec();
    let mut grad = Vec::with_capacity(position.len());
    for (i, &x) in position.iter().enumerate() {
        perturbed[i] = x + epsilon;
        let logp_plus = finite_log_density(model, &perturbed)?;
        perturbed[i] = x - epsilon;
        let logp_minus = finite_log_density(model, &perturbed)?;
        perturbed[i] = x;
        grad.push((logp_plus - logp_minus) / (2. * epsilon));
    }
    Ok(grad)
}

/// Compare the model gradient at `position` with finite differences and
/// write a table of the results.
pub fn test_gradients<M: Model + ?Sized>(
    model: &mut M,
    position: &[f64],
    epsilon: f64,
    error: f64,
    writer: &mut dyn Writer,
) -> Result<GradientTest> {
    check_epsilon(epsilon)?;
    check_tolerance(error)?;
    if position.len() != model.dim() {
        return Err(HmcError::DimensionMismatch {
            expected: model.dim(),
            found: position.len(),
        });
    }

    let mut gradient = vec![0f64; position.len()];
    let log_prob = model.logp(position, &mut gradient).map_err(HmcError::logp)?;
    if !log_prob.is_finite() {
        return Err(HmcError::NonFiniteLogp {
            position: position.into(),
        });
    }
    if !gradient.iter().all(|g| g.is_finite()) {
        return Err(HmcError::NonFiniteGradient {
            position: position.into(),
        });
    }

    let finite_diff = finite_diff_grad(model, position, epsilon)?;

    let entries: Vec<GradientEntry> = izip!(position, &gradient, &finite_diff)
        .enumerate()
        .map(|(index, (&value, &analytic, &finite_diff))| GradientEntry {
            index,
            value,
            model: analytic,
            finite_diff,
            error: analytic - finite_diff,
        })
        .collect();

    writer.write_blank();
    writer.write_line(&format!(" Log probability={log_prob}"));
    writer.write_blank();
    writer.write_line(&format!(
        "{:>10}{:>16}{:>16}{:>16}{:>16}",
        "param idx", "value", "model", "finite diff", "error"
    ));
    for entry in entries.iter() {
        writer.write_line(&format!(
            "{:>10}{:>16.6}{:>16.6}{:>16.6}{:>16.6e}",
            entry.index, entry.value, entry.model, entry.finite_diff, entry.error
        ));
    }
    writer.write_blank();

    let test = GradientTest {
        log_prob,
        entries,
        tolerance: error,
    };
    log::info!(
        "Gradient test: {} of {} parameters differ by more than {}",
        test.num_failed(),
        test.entries.len(),
        error
    );
    Ok(test)
}

/// Run a gradient test at the initial point of a chain.
///
/// Parameters missing from `init` are drawn from the stream of
/// `settings.chain`. Transformation notes, the `TEST GRADIENT MODE` banner
/// and the result table go to `message_writer`; `parameter_writer` gets
/// one comma separated record per parameter, ending in the absolute
/// difference of both gradients.
pub fn check_gradients<M: Model + ?Sized>(
    model: &mut M,
    init: &dyn InitContext,
    settings: &DiagnoseSettings,
    message_writer: &mut dyn Writer,
    parameter_writer: &mut dyn Writer,
) -> anyhow::Result<GradientTest> {
    let mut rng = chain_rng(settings.seed, settings.chain)
        .context("Failed to set up the random stream of the chain")?;
    let random = RandomContext::new(&*model, &mut rng, settings.init_radius)
        .context("Failed to draw random initial values")?;
    let context = ChainedContext::new(init, &random);

    let inits = model
        .transform_inits(&context, message_writer)
        .context("Failed to transform initial values")?;

    message_writer.write_line("TEST GRADIENT MODE");

    let test = test_gradients(
        model,
        &inits.continuous,
        settings.epsilon,
        settings.error,
        message_writer,
    )
    .context("Failed to evaluate the gradient test")?;

    parameter_writer.write_line("param_idx,value,model,finite_diff,abs_error");
    for entry in test.entries.iter() {
        parameter_writer.write_line(&format!(
            "{},{},{},{},{}",
            entry.index,
            entry.value,
            entry.model,
            entry.finite_diff,
            entry.abs_error()
        ));
    }

    Ok(test)
}

/// Like [`check_gradients`], but only returns the number of parameters
/// whose gradients do not match.
pub fn diagnose<M: Model + ?Sized>(
    model: &mut M,
    init: &dyn InitContext,
    settings: &DiagnoseSettings,
    message_writer: &mut dyn Writer,
    parameter_writer: &mut dyn Writer,
) -> anyhow::Result<usize> {
    let test = check_gradients(model, init, settings, message_writer, parameter_writer)?;
    Ok(test.num_failed())
}
