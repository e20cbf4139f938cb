/*!
A templated model viewed as a plain function of its parameters.

[`ModelFunctional`] fixes the mode to `propto = true, jacobian = true` and
exposes the density at any [`Scalar`] type, which is what generic
differentiation and optimization code expects.
*/

use crate::autodiff::{with_thread_arena, Scalar};
use crate::callbacks::{Logger, Messages};
use crate::error::{EvalError, Result};
use crate::log_prob_grad::log_prob_grad;
use crate::mode::LogDensityMode;
use crate::model::{density_kind, DensityKind, DensityStrategy, Model};

/// Non-owning adapter from a templated model to `f(x) -> log p(x)`.
pub struct ModelFunctional<'m, 'w, M> {
    model: &'m M,
    msgs: Messages<'w>,
}

impl<'m, 'w, M: Model> ModelFunctional<'m, 'w, M> {
    /// Mode every call evaluates in.
    pub const MODE: LogDensityMode = LogDensityMode::PROPTO_JACOBIAN;

    /// Binds `model` and the stream its density writes to.
    ///
    /// Fails with [`EvalError::CapabilityMismatch`] for virtual models, which
    /// have no density generic over the scalar type. Nothing is written to
    /// `msgs` in that case.
    pub fn new(model: &'m M, msgs: Messages<'w>) -> Result<Self> {
        match density_kind::<M>() {
            DensityKind::Templated => Ok(Self { model, msgs }),
            found => Err(EvalError::CapabilityMismatch {
                model: model.model_name(),
                operation: "ModelFunctional",
                required: DensityKind::Templated,
                found,
            }),
        }
    }

    pub fn model(&self) -> &M {
        self.model
    }

    /// Log density (up to a constant, with Jacobian) at `x`.
    pub fn call<T: Scalar>(&mut self, x: &[T]) -> Result<T> {
        <M::Density as DensityStrategy<M>>::log_prob_scalar(
            self.model,
            x,
            &[],
            Self::MODE,
            &mut self.msgs,
        )
    }
}

/// Value and gradient of `model` at `x` in the functional's mode.
///
/// Templated models are differentiated through [`ModelFunctional`]; virtual
/// models supply their own gradient. Text written by the density is sent to
/// `logger` as one info message, also when evaluation fails. Errors are
/// returned unchanged and are not logged.
pub fn gradient<M: Model>(model: &M, x: &[f64], logger: &dyn Logger) -> Result<(f64, Vec<f64>)> {
    let mut captured = String::new();
    let result = match density_kind::<M>() {
        DensityKind::Templated => functional_gradient(model, x, Messages::to(&mut captured)),
        DensityKind::Virtual => {
            let mut grad = Vec::new();
            log_prob_grad(
                model,
                x,
                &[],
                &mut grad,
                LogDensityMode::PROPTO_JACOBIAN,
                Messages::to(&mut captured),
            )
            .map(|lp| (lp, grad))
        }
    };
    if !captured.is_empty() {
        logger.info(&captured);
    }
    result
}

fn functional_gradient<M: Model>(
    model: &M,
    x: &[f64],
    msgs: Messages<'_>,
) -> Result<(f64, Vec<f64>)> {
    let mut f = ModelFunctional::new(model, msgs)?;
    with_thread_arena(|arena| {
        let scope = arena.scope();
        let vars = scope.vars(x);
        let fx = f.call(&vars)?;
        let grad = scope.gradient(&fx, &vars);
        Ok((fx.value(), grad))
    })
}
