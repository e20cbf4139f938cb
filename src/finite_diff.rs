/*!
Finite-difference gradients, used to check automatic differentiation.

Nothing in the evaluation path uses these; they exist to validate a model's
gradient against its density.
*/

use crate::callbacks::{Interrupt, Logger, Messages};
use crate::error::{EvalError, Result};
use crate::log_prob::log_prob;
use crate::log_prob_grad::log_prob_grad;
use crate::mode::LogDensityMode;
use crate::model::Model;

/// Default perturbation size.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Default tolerance for [`test_gradients`].
pub const DEFAULT_ERROR: f64 = 1e-6;

/// Central finite-difference gradient of `log_prob` at `params_r`.
///
/// `interrupt` is polled once per coordinate; a stop request ends the
/// computation with [`EvalError::Interrupted`].
pub fn finite_diff_grad<M: Model>(
    model: &M,
    interrupt: &dyn Interrupt,
    params_r: &[f64],
    params_i: &[i32],
    mode: LogDensityMode,
    epsilon: f64,
    mut msgs: Messages<'_>,
) -> Result<Vec<f64>> {
    let n = model.num_params_r().min(params_r.len());
    let mut perturbed = params_r.to_vec();
    let mut grad = Vec::with_capacity(n);

    for k in 0..n {
        if interrupt.check() {
            return Err(EvalError::Interrupted);
        }
        perturbed[k] = params_r[k] + epsilon;
        let plus = log_prob(model, &perturbed, params_i, mode, msgs.reborrow())?;
        perturbed[k] = params_r[k] - epsilon;
        let minus = log_prob(model, &perturbed, params_i, mode, msgs.reborrow())?;
        perturbed[k] = params_r[k];
        grad.push((plus - minus) / (2.0 * epsilon));
    }
    Ok(grad)
}

/// Compares the model's gradient with finite differences and logs a table
/// through `logger`.
///
/// Returns the number of coordinates whose absolute difference exceeds `error`.
#[allow(clippy::too_many_arguments)]
pub fn test_gradients<M: Model>(
    model: &M,
    params_r: &[f64],
    params_i: &[i32],
    mode: LogDensityMode,
    epsilon: f64,
    error: f64,
    interrupt: &dyn Interrupt,
    logger: &dyn Logger,
) -> Result<usize> {
    let mut captured = String::new();
    let mut grad = Vec::new();
    let lp = log_prob_grad(
        model,
        params_r,
        params_i,
        &mut grad,
        mode,
        Messages::to(&mut captured),
    );
    let checked = lp.and_then(|lp| {
        let fd = finite_diff_grad(
            model,
            interrupt,
            params_r,
            params_i,
            mode,
            epsilon,
            Messages::to(&mut captured),
        )?;
        Ok((lp, fd))
    });
    if !captured.is_empty() {
        logger.info(&captured);
    }
    let (lp, fd) = checked?;

    logger.info(&format!(
        " Log probability={} ({}, epsilon={}, error={})",
        lp, mode, epsilon, error
    ));
    logger.info("");
    logger.info(&format!(
        " {:>10} {:>16} {:>16} {:>16} {:>16}",
        "param idx", "value", "model", "finite diff", "error"
    ));

    let mut failed = 0;
    for (k, (g, f)) in grad.iter().zip(&fd).enumerate() {
        let diff = g - f;
        if diff.abs() > error {
            failed += 1;
        }
        logger.info(&format!(
            " {:>10} {:>16.6} {:>16.6} {:>16.6} {:>16.6}",
            k, params_r[k], g, f, diff
        ));
    }
    if failed > 0 {
        log::warn!(
            "{}: {} of {} gradient coordinates differ from finite differences by more than {}",
            model.model_name(),
            failed,
            grad.len(),
            error
        );
    }
    Ok(failed)
}
