/*!
Log-density evaluation in any of the four [`LogDensityMode`]s.

Templated models are evaluated at the dual scalar type inside an arena scope,
so terms the model drops under `propto` are dropped exactly as they would be
during a gradient evaluation; the arena is recovered before returning.
Virtual models are called through the specialized entry point for the mode,
with no arena involved.
*/

use crate::autodiff::{with_thread_arena, Arena, Scalar};
use crate::callbacks::{Diagnostics, Logger, Messages};
use crate::error::Result;
use crate::mode::LogDensityMode;
use crate::model::{DensityStrategy, Model, TemplatedDensity, VirtualModel};
use crate::vector::ParamVector;
use ndarray::Array1;

/// Log density of `model` at `params_r` in `mode`.
///
/// `params_i` holds discrete parameters (usually empty). Text the density
/// writes goes to `msgs`. Errors raised by the density are returned unchanged.
///
/// # Panics
///
/// If a templated model is given fewer than `num_params_r` values.
pub fn log_prob<M, P>(
    model: &M,
    params_r: &P,
    params_i: &[i32],
    mode: LogDensityMode,
    msgs: Messages<'_>,
) -> Result<f64>
where
    M: Model,
    P: ParamVector + ?Sized,
{
    log_prob_with(model, params_r, params_i, mode, Diagnostics::Stream(msgs))
}

/// Like [`log_prob`], but text produced by the density is collected and sent
/// to `logger` as a single info message, also when evaluation fails.
pub fn log_prob_logged<M, P>(
    model: &M,
    params_r: &P,
    params_i: &[i32],
    mode: LogDensityMode,
    logger: &dyn Logger,
) -> Result<f64>
where
    M: Model,
    P: ParamVector + ?Sized,
{
    log_prob_with(model, params_r, params_i, mode, Diagnostics::Logger(logger))
}

/// Log density up to a constant, with or without the Jacobian term.
pub fn log_prob_propto<M, P>(
    model: &M,
    params_r: &P,
    params_i: &[i32],
    jacobian: bool,
    msgs: Messages<'_>,
) -> Result<f64>
where
    M: Model,
    P: ParamVector + ?Sized,
{
    log_prob(
        model,
        params_r,
        params_i,
        LogDensityMode::new(true, jacobian),
        msgs,
    )
}

/// [`log_prob`] with an explicit diagnostics route.
pub fn log_prob_with<M, P>(
    model: &M,
    params_r: &P,
    params_i: &[i32],
    mode: LogDensityMode,
    diagnostics: Diagnostics<'_>,
) -> Result<f64>
where
    M: Model,
    P: ParamVector + ?Sized,
{
    <M::Density as DensityStrategy<M>>::log_prob(model, params_r, params_i, mode, diagnostics)
}

pub(crate) fn templated<M, P>(
    model: &M,
    params_r: &P,
    params_i: &[i32],
    mode: LogDensityMode,
    diagnostics: Diagnostics<'_>,
) -> Result<f64>
where
    M: TemplatedDensity,
    P: ParamVector + ?Sized,
{
    with_thread_arena(|arena| templated_in(arena, model, params_r, params_i, mode, diagnostics))
}

fn templated_in<M, P>(
    arena: &Arena,
    model: &M,
    params_r: &P,
    params_i: &[i32],
    mode: LogDensityMode,
    diagnostics: Diagnostics<'_>,
) -> Result<f64>
where
    M: TemplatedDensity,
    P: ParamVector + ?Sized,
{
    let params = params_r.as_flat();
    let n = checked_len(model, &params);
    let scope = arena.scope();
    let vars = scope.vars(&params[..n]);
    let lp = with_diagnostics(diagnostics, |msgs| {
        dispatch_mode(model, &vars, params_i, mode, msgs)
    })?;
    Ok(lp.value())
}

/// Number of real parameters `model` reads from `params`.
pub(crate) fn checked_len<M: TemplatedDensity>(model: &M, params: &[f64]) -> usize {
    let n = model.num_params_r();
    assert!(
        params.len() >= n,
        "model `{}` needs {} parameters, got {}",
        model.model_name(),
        n,
        params.len()
    );
    n
}

/// Instantiates the templated density for the runtime `mode`.
pub(crate) fn dispatch_mode<M, T>(
    model: &M,
    params_r: &[T],
    params_i: &[i32],
    mode: LogDensityMode,
    msgs: &mut Messages<'_>,
) -> Result<T>
where
    M: TemplatedDensity,
    T: Scalar,
{
    match (mode.propto, mode.jacobian) {
        (false, false) => model.log_prob::<T, false, false>(params_r, params_i, msgs),
        (false, true) => model.log_prob::<T, false, true>(params_r, params_i, msgs),
        (true, false) => model.log_prob::<T, true, false>(params_r, params_i, msgs),
        (true, true) => model.log_prob::<T, true, true>(params_r, params_i, msgs),
    }
}

/// Runs `f` with the message stream `diagnostics` asks for.
///
/// With a logger, anything `f` writes is forwarded as one info message after
/// `f` returns, on success and on error alike; nothing is sent if `f` wrote
/// nothing.
pub(crate) fn with_diagnostics<R>(
    diagnostics: Diagnostics<'_>,
    f: impl FnOnce(&mut Messages<'_>) -> Result<R>,
) -> Result<R> {
    match diagnostics {
        Diagnostics::Stream(mut msgs) => f(&mut msgs),
        Diagnostics::Logger(logger) => {
            let mut captured = String::new();
            let result = f(&mut Messages::to(&mut captured));
            if !captured.is_empty() {
                logger.info(&captured);
            }
            result
        }
    }
}

pub(crate) fn virtual_flat<M: VirtualModel + ?Sized>(
    model: &M,
    params_r: &[f64],
    mode: LogDensityMode,
    msgs: &mut Messages<'_>,
) -> Result<f64> {
    match (mode.propto, mode.jacobian) {
        (false, false) => model.log_prob(params_r, msgs),
        (false, true) => model.log_prob_jacobian(params_r, msgs),
        (true, false) => model.log_prob_propto(params_r, msgs),
        (true, true) => model.log_prob_propto_jacobian(params_r, msgs),
    }
}

pub(crate) fn virtual_dense<M: VirtualModel + ?Sized>(
    model: &M,
    params_r: &Array1<f64>,
    mode: LogDensityMode,
    msgs: &mut Messages<'_>,
) -> Result<f64> {
    match (mode.propto, mode.jacobian) {
        (false, false) => model.log_prob_dense(params_r, msgs),
        (false, true) => model.log_prob_jacobian_dense(params_r, msgs),
        (true, false) => model.log_prob_propto_dense(params_r, msgs),
        (true, true) => model.log_prob_propto_jacobian_dense(params_r, msgs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::StreamLogger;
    use crate::error::EvalError;
    use std::fmt::Write;

    #[test]
    fn test_with_diagnostics_flushes_on_error() {
        let logger = StreamLogger::new(String::new());
        let result: Result<f64> = with_diagnostics(Diagnostics::Logger(&logger), |msgs| {
            let _ = write!(msgs, "about to fail");
            Err(EvalError::domain("boom"))
        });
        assert!(matches!(result, Err(EvalError::Domain(ref m)) if m == "boom"));
        assert_eq!(logger.into_inner(), "[info] about to fail\n");
    }

    #[test]
    fn test_with_diagnostics_skips_empty_capture() {
        let logger = StreamLogger::new(String::new());
        let value = with_diagnostics(Diagnostics::Logger(&logger), |_msgs| Ok(1.0)).unwrap();
        assert_eq!(value, 1.0);
        assert!(logger.into_inner().is_empty());
    }

    #[test]
    fn test_with_diagnostics_stream_passthrough() {
        let mut out = String::new();
        with_diagnostics(Diagnostics::Stream(Messages::to(&mut out)), |msgs| {
            let _ = write!(msgs, "hi");
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "hi");
    }
}
