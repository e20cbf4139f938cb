/*!
Log density and gradient in one call.

For templated models the parameters are lifted to [`Var`]s in a fresh
[`ArenaScope`], the density is evaluated once at the dual type, and a single
reverse sweep fills the gradient. The scope recovers the arena when it is
dropped, so the arena is back at its pre-call size after every call, including
calls where the density returned an error.

Virtual models are handed straight to their own
[`VirtualModel::log_prob_grad`]; no arena is touched. With a logger, text
either kind of model writes is forwarded the same way.

The caller's gradient buffer is only written after a successful evaluation.

[`Var`]: crate::autodiff::Var
[`ArenaScope`]: crate::autodiff::ArenaScope
[`VirtualModel::log_prob_grad`]: crate::model::VirtualModel::log_prob_grad
*/

use crate::autodiff::{with_thread_arena, Arena};
use crate::callbacks::{Diagnostics, Logger, Messages};
use crate::error::Result;
use crate::log_prob::{checked_len, dispatch_mode, with_diagnostics};
use crate::mode::LogDensityMode;
use crate::model::{DensityStrategy, Model, TemplatedDensity};
use crate::vector::{GradientBuffer, ParamVector};

/// Log density of `model` at `params_r` in `mode`; `gradient` is overwritten
/// with one partial derivative per parameter, in parameter order.
///
/// Uses this thread's default arena.
///
/// # Panics
///
/// If a templated model is given fewer than `num_params_r` values.
pub fn log_prob_grad<M, P>(
    model: &M,
    params_r: &P,
    params_i: &[i32],
    gradient: &mut P::Gradient,
    mode: LogDensityMode,
    msgs: Messages<'_>,
) -> Result<f64>
where
    M: Model,
    P: ParamVector + ?Sized,
{
    with_thread_arena(|arena| {
        log_prob_grad_in(
            arena,
            model,
            params_r,
            params_i,
            gradient,
            mode,
            Diagnostics::Stream(msgs),
        )
    })
}

/// Like [`log_prob_grad`], but text produced by the density is sent
/// to `logger` as one info message, also when evaluation fails.
pub fn log_prob_grad_logged<M, P>(
    model: &M,
    params_r: &P,
    params_i: &[i32],
    gradient: &mut P::Gradient,
    mode: LogDensityMode,
    logger: &dyn Logger,
) -> Result<f64>
where
    M: Model,
    P: ParamVector + ?Sized,
{
    with_thread_arena(|arena| {
        log_prob_grad_in(
            arena,
            model,
            params_r,
            params_i,
            gradient,
            mode,
            Diagnostics::Logger(logger),
        )
    })
}

/// [`log_prob_grad`] on an explicit arena.
pub fn log_prob_grad_in<M, P>(
    arena: &Arena,
    model: &M,
    params_r: &P,
    params_i: &[i32],
    gradient: &mut P::Gradient,
    mode: LogDensityMode,
    diagnostics: Diagnostics<'_>,
) -> Result<f64>
where
    M: Model,
    P: ParamVector + ?Sized,
{
    <M::Density as DensityStrategy<M>>::log_prob_grad(
        model,
        arena,
        params_r,
        params_i,
        gradient,
        mode,
        diagnostics,
    )
}

pub(crate) fn templated<M, P>(
    model: &M,
    arena: &Arena,
    params_r: &P,
    params_i: &[i32],
    gradient: &mut P::Gradient,
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

    let grad = scope.gradient(&lp, &vars);
    log::debug!(
        "{}: gradient over {} parameters recorded {} arena nodes",
        model.model_name(),
        n,
        arena.len() - scope.mark()
    );
    gradient.overwrite(&grad);
    Ok(lp.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::Scalar;
    use crate::context::VarContext;
    use crate::error::EvalError;
    use crate::model::{ModelBase, Templated};
    use approx::assert_abs_diff_eq;
    use rand::RngCore;

    /// f(x) = -sum(x_i^2) / 2, failing whenever x[0] is negative.
    struct HalfSquare;

    impl ModelBase for HalfSquare {
        fn model_name(&self) -> String {
            "half_square".into()
        }
        fn num_params_r(&self) -> usize {
            2
        }
        fn param_names(&self) -> Vec<String> {
            vec!["x".into()]
        }
        fn dims(&self) -> Vec<Vec<usize>> {
            vec![vec![2]]
        }
        fn constrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> {
            vec!["x.1".into(), "x.2".into()]
        }
        fn unconstrained_param_names(&self, tp: bool, gq: bool) -> Vec<String> {
            self.constrained_param_names(tp, gq)
        }
        fn transform_inits(
            &self,
            context: &dyn VarContext,
            _msgs: &mut Messages<'_>,
        ) -> Result<Vec<f64>> {
            context.vals_r_checked("x", 2)
        }
        fn write_array(
            &self,
            _rng: &mut dyn RngCore,
            params_r: &[f64],
            _tp: bool,
            _gq: bool,
            _msgs: &mut Messages<'_>,
        ) -> Result<Vec<f64>> {
            Ok(params_r.to_vec())
        }
    }

    impl TemplatedDensity for HalfSquare {
        fn log_prob<T: Scalar, const PROPTO: bool, const JACOBIAN: bool>(
            &self,
            params_r: &[T],
            _params_i: &[i32],
            _msgs: &mut Messages<'_>,
        ) -> Result<T> {
            if params_r[0].primal() < 0.0 {
                return Err(EvalError::domain("x[0] must be non-negative"));
            }
            let sq: T = params_r.iter().map(|&x| x * x).sum();
            Ok(-sq / T::constant(2.0))
        }
    }

    impl Model for HalfSquare {
        type Density = Templated;
    }

    #[test]
    fn test_explicit_arena_gradient() {
        let arena = Arena::new();
        let mut grad = Vec::new();
        let lp = log_prob_grad_in(
            &arena,
            &HalfSquare,
            &vec![1.0, -2.0, 99.0],
            &[],
            &mut grad,
            LogDensityMode::PLAIN,
            Diagnostics::default(),
        )
        .unwrap();
        assert_abs_diff_eq!(lp, -2.5);
        assert_eq!(grad, vec![-1.0, 2.0]);
        assert!(arena.is_empty());
        assert_eq!(arena.recoveries(), 1);
    }

    #[test]
    fn test_error_recovers_arena_and_keeps_gradient() {
        let arena = Arena::new();
        let mut grad = vec![7.0, 7.0];
        let err = log_prob_grad_in(
            &arena,
            &HalfSquare,
            &vec![-1.0, 0.0],
            &[],
            &mut grad,
            LogDensityMode::PLAIN,
            Diagnostics::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::Domain(_)));
        assert!(arena.is_empty());
        assert_eq!(arena.recoveries(), 1);
        assert_eq!(grad, vec![7.0, 7.0]);
    }

    #[test]
    #[should_panic(expected = "needs 2 parameters")]
    fn test_short_input_panics() {
        let mut grad = Vec::new();
        let _ = log_prob_grad(
            &HalfSquare,
            &vec![1.0],
            &[],
            &mut grad,
            LogDensityMode::PLAIN,
            Messages::none(),
        );
    }
}
