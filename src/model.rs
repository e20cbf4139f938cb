/*!
Model capability sets and the classifier that picks an evaluation strategy.

A model implements [`ModelBase`] plus exactly one density interface:

- [`TemplatedDensity`]: one density generic over the `(propto, jacobian)` flags
  and over the scalar type. Gradients come from evaluating it at [`Var`].
- [`VirtualModel`]: four already-specialized real-valued densities and a
  combined value-and-gradient entry point that differentiates internally.

The choice is made once, at the `impl Model` site, through the associated
[`Model::Density`] type. Naming [`Templated`] for a model that is not a
[`TemplatedDensity`] (or [`Virtual`] for one that is not a [`VirtualModel`]) is
a compile error, and no evaluation re-checks it.

```rust
use general_logp::prelude::*;

struct StdNormal;

impl ModelBase for StdNormal {
    fn model_name(&self) -> String { "std_normal".into() }
    fn num_params_r(&self) -> usize { 1 }
    fn param_names(&self) -> Vec<String> { vec!["x".into()] }
    fn dims(&self) -> Vec<Vec<usize>> { vec![vec![]] }
    fn constrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> { vec!["x".into()] }
    fn unconstrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> { vec!["x".into()] }
    fn transform_inits(&self, ctx: &dyn VarContext, _msgs: &mut Messages<'_>) -> Result<Vec<f64>> {
        ctx.vals_r_checked("x", 1)
    }
    fn write_array(
        &self,
        _rng: &mut dyn rand::RngCore,
        params_r: &[f64],
        _tp: bool,
        _gq: bool,
        _msgs: &mut Messages<'_>,
    ) -> Result<Vec<f64>> {
        Ok(params_r[..1].to_vec())
    }
}

impl TemplatedDensity for StdNormal {
    fn log_prob<T: Scalar, const PROPTO: bool, const JACOBIAN: bool>(
        &self,
        params_r: &[T],
        _params_i: &[i32],
        _msgs: &mut Messages<'_>,
    ) -> Result<T> {
        let x = params_r[0];
        let mut lp = -T::constant(0.5) * x * x;
        if !PROPTO {
            lp -= T::constant(0.5 * (2.0 * std::f64::consts::PI).ln());
        }
        Ok(lp)
    }
}

impl Model for StdNormal {
    type Density = Templated;
}

let mut grad = Vec::new();
let lp = log_prob_grad(&StdNormal, &vec![1.0], &[], &mut grad, LogDensityMode::PROPTO, Messages::none()).unwrap();
assert_eq!(lp, -0.5);
assert_eq!(grad, vec![-1.0]);
```

[`Var`]: crate::autodiff::Var
*/

use crate::autodiff::{Arena, Scalar};
use crate::callbacks::{Diagnostics, Messages};
use crate::context::VarContext;
use crate::error::{EvalError, Result};
use crate::mode::LogDensityMode;
use crate::vector::ParamVector;
use crate::{log_prob, log_prob_grad};
use ndarray::Array1;
use rand::RngCore;
use std::fmt;

/// Metadata and transforms every model provides, whatever its density interface.
pub trait ModelBase {
    fn model_name(&self) -> String;

    /// Free-form build information.
    fn model_compile_info(&self) -> Vec<String> {
        Vec::new()
    }

    /// Number of continuous unconstrained parameters. Fixed for the model's lifetime.
    fn num_params_r(&self) -> usize;

    /// Number of discrete parameters.
    fn num_params_i(&self) -> usize {
        0
    }

    /// Inclusive value range of discrete parameter `idx`.
    fn param_range_i(&self, idx: usize) -> Result<(i32, i32)> {
        Err(EvalError::OutOfRange {
            index: idx,
            len: self.num_params_i(),
        })
    }

    /// Declared parameter names, one per declared quantity.
    fn param_names(&self) -> Vec<String>;

    /// Dimensions of each declared quantity, in [`ModelBase::param_names`] order.
    fn dims(&self) -> Vec<Vec<usize>>;

    /// Flat constrained names, optionally including transformed parameters
    /// and generated quantities.
    fn constrained_param_names(&self, include_tparams: bool, include_gqs: bool) -> Vec<String>;

    /// Flat unconstrained names.
    fn unconstrained_param_names(&self, include_tparams: bool, include_gqs: bool)
        -> Vec<String>;

    /// Reads constrained values from `context` and maps them to an
    /// unconstrained parameter vector.
    fn transform_inits(&self, context: &dyn VarContext, msgs: &mut Messages<'_>)
        -> Result<Vec<f64>>;

    /// Maps unconstrained values to constrained ones, optionally appending
    /// transformed parameters and generated quantities drawn with `rng`.
    fn write_array(
        &self,
        rng: &mut dyn RngCore,
        params_r: &[f64],
        include_tparams: bool,
        include_gqs: bool,
        msgs: &mut Messages<'_>,
    ) -> Result<Vec<f64>>;
}

/// A single density generic over the mode flags and the scalar type.
pub trait TemplatedDensity: ModelBase {
    /// Log density at `params_r` (length [`ModelBase::num_params_r`]).
    ///
    /// `PROPTO` drops terms that are constant in the parameters; `JACOBIAN`
    /// adds the log-Jacobian of the unconstraining transform.
    fn log_prob<T: Scalar, const PROPTO: bool, const JACOBIAN: bool>(
        &self,
        params_r: &[T],
        params_i: &[i32],
        msgs: &mut Messages<'_>,
    ) -> Result<T>;
}

/// Already-specialized real-valued entry points.
///
/// Only [`VirtualModel::log_prob`] and [`VirtualModel::log_prob_grad`] are
/// required. By default the Jacobian and propto variants fall back to the
/// plain density, and `log_prob_propto_jacobian` falls back to
/// `log_prob_jacobian`; models override whichever differ. Every dense entry
/// point defaults to its flat counterpart.
pub trait VirtualModel: ModelBase {
    fn log_prob(&self, params_r: &[f64], msgs: &mut Messages<'_>) -> Result<f64>;

    fn log_prob_jacobian(&self, params_r: &[f64], msgs: &mut Messages<'_>) -> Result<f64> {
        self.log_prob(params_r, msgs)
    }

    fn log_prob_propto(&self, params_r: &[f64], msgs: &mut Messages<'_>) -> Result<f64> {
        self.log_prob(params_r, msgs)
    }

    fn log_prob_propto_jacobian(&self, params_r: &[f64], msgs: &mut Messages<'_>) -> Result<f64> {
        self.log_prob_jacobian(params_r, msgs)
    }

    fn log_prob_dense(&self, params_r: &Array1<f64>, msgs: &mut Messages<'_>) -> Result<f64> {
        self.log_prob(&params_r.to_vec(), msgs)
    }

    fn log_prob_jacobian_dense(
        &self,
        params_r: &Array1<f64>,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        self.log_prob_jacobian(&params_r.to_vec(), msgs)
    }

    fn log_prob_propto_dense(
        &self,
        params_r: &Array1<f64>,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        self.log_prob_propto(&params_r.to_vec(), msgs)
    }

    fn log_prob_propto_jacobian_dense(
        &self,
        params_r: &Array1<f64>,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        self.log_prob_propto_jacobian(&params_r.to_vec(), msgs)
    }

    /// Log density and its gradient; `gradient` is resized to
    /// [`ModelBase::num_params_r`] and overwritten.
    fn log_prob_grad(
        &self,
        params_r: &[f64],
        gradient: &mut Vec<f64>,
        propto: bool,
        jacobian: bool,
        msgs: &mut Messages<'_>,
    ) -> Result<f64>;

    fn log_prob_grad_dense(
        &self,
        params_r: &Array1<f64>,
        gradient: &mut Array1<f64>,
        propto: bool,
        jacobian: bool,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        let mut flat = Vec::with_capacity(params_r.len());
        let lp = self.log_prob_grad(&params_r.to_vec(), &mut flat, propto, jacobian, msgs)?;
        *gradient = Array1::from(flat);
        Ok(lp)
    }
}

/// The two evaluation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DensityKind {
    Templated,
    Virtual,
}

impl fmt::Display for DensityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DensityKind::Templated => f.write_str("templated"),
            DensityKind::Virtual => f.write_str("virtual"),
        }
    }
}

/// A model registered with its evaluation strategy.
pub trait Model: ModelBase + Sized {
    /// [`Templated`] or [`Virtual`].
    type Density: DensityStrategy<Self>;
}

/// The strategy `M` was registered with.
pub fn density_kind<M: Model>() -> DensityKind {
    <M::Density as DensityStrategy<M>>::KIND
}

/// How evaluations are carried out for models of type `M`.
///
/// Implemented only by [`Templated`] and [`Virtual`].
pub trait DensityStrategy<M: ModelBase> {
    const KIND: DensityKind;

    fn log_prob<P: ParamVector + ?Sized>(
        model: &M,
        params_r: &P,
        params_i: &[i32],
        mode: LogDensityMode,
        diagnostics: Diagnostics<'_>,
    ) -> Result<f64>;

    fn log_prob_grad<P: ParamVector + ?Sized>(
        model: &M,
        arena: &Arena,
        params_r: &P,
        params_i: &[i32],
        gradient: &mut P::Gradient,
        mode: LogDensityMode,
        diagnostics: Diagnostics<'_>,
    ) -> Result<f64>;

    /// Log density at an arbitrary scalar type.
    fn log_prob_scalar<T: Scalar>(
        model: &M,
        params_r: &[T],
        params_i: &[i32],
        mode: LogDensityMode,
        msgs: &mut Messages<'_>,
    ) -> Result<T>;
}

/// Strategy for [`TemplatedDensity`] models.
#[derive(Debug, Clone, Copy, Default)]
pub struct Templated;

/// Strategy for [`VirtualModel`] models.
#[derive(Debug, Clone, Copy, Default)]
pub struct Virtual;

impl<M: TemplatedDensity> DensityStrategy<M> for Templated {
    const KIND: DensityKind = DensityKind::Templated;

    fn log_prob<P: ParamVector + ?Sized>(
        model: &M,
        params_r: &P,
        params_i: &[i32],
        mode: LogDensityMode,
        diagnostics: Diagnostics<'_>,
    ) -> Result<f64> {
        log_prob::templated(model, params_r, params_i, mode, diagnostics)
    }

    fn log_prob_grad<P: ParamVector + ?Sized>(
        model: &M,
        arena: &Arena,
        params_r: &P,
        params_i: &[i32],
        gradient: &mut P::Gradient,
        mode: LogDensityMode,
        diagnostics: Diagnostics<'_>,
    ) -> Result<f64> {
        log_prob_grad::templated(model, arena, params_r, params_i, gradient, mode, diagnostics)
    }

    fn log_prob_scalar<T: Scalar>(
        model: &M,
        params_r: &[T],
        params_i: &[i32],
        mode: LogDensityMode,
        msgs: &mut Messages<'_>,
    ) -> Result<T> {
        log_prob::dispatch_mode(model, params_r, params_i, mode, msgs)
    }
}

impl<M: VirtualModel> DensityStrategy<M> for Virtual {
    const KIND: DensityKind = DensityKind::Virtual;

    fn log_prob<P: ParamVector + ?Sized>(
        model: &M,
        params_r: &P,
        _params_i: &[i32],
        mode: LogDensityMode,
        diagnostics: Diagnostics<'_>,
    ) -> Result<f64> {
        log_prob::with_diagnostics(diagnostics, |msgs| {
            params_r.virtual_log_prob(model, mode, msgs)
        })
    }

    fn log_prob_grad<P: ParamVector + ?Sized>(
        model: &M,
        _arena: &Arena,
        params_r: &P,
        _params_i: &[i32],
        gradient: &mut P::Gradient,
        mode: LogDensityMode,
        diagnostics: Diagnostics<'_>,
    ) -> Result<f64> {
        log_prob::with_diagnostics(diagnostics, |msgs| {
            params_r.virtual_log_prob_grad(model, gradient, mode, msgs)
        })
    }

    fn log_prob_scalar<T: Scalar>(
        model: &M,
        _params_r: &[T],
        _params_i: &[i32],
        _mode: LogDensityMode,
        _msgs: &mut Messages<'_>,
    ) -> Result<T> {
        Err(EvalError::Configuration {
            model: model.model_name(),
            capability: "a log density generic over the scalar type",
        })
    }
}
