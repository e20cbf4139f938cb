//! # General LogP
//!
//! Log-density and gradient evaluation for statistical models, as needed by
//! gradient-based samplers and optimizers such as **NUTS**, **HMC** and **L-BFGS**.
//!
//! ## Getting Started
//!
//! To use this library, add it to your project:
//! ```bash
//! cargo add general-logp
//! ```
//!
//! A model provides its metadata through [`ModelBase`] and its density through
//! exactly one of two interfaces, chosen once when the model implements [`Model`]:
//! 1. **Templated density** ([`TemplatedDensity`], registered as [`Templated`]): one
//!    density written against the [`Scalar`](autodiff::Scalar) trait. The library
//!    evaluates it at the dual number type and differentiates it for you.
//! 2. **Virtual interface** ([`VirtualModel`], registered as [`Virtual`]): four
//!    specialized densities plus your own value-and-gradient routine. The library
//!    only routes calls to them.
//!
//! Either way, [`log_prob()`] returns the log density in one of the four
//! [`LogDensityMode`]s and [`log_prob_grad()`] returns it together with the gradient.
//!
//! ## Example 1: A Templated Density With a Jacobian
//!
//! ```rust
//! use general_logp::prelude::*;
//!
//! /// Half-normal scale parameter, sampled on the log scale.
//! struct Scale;
//!
//! impl ModelBase for Scale {
//!     fn model_name(&self) -> String { "scale".into() }
//!     fn num_params_r(&self) -> usize { 1 }
//!     fn param_names(&self) -> Vec<String> { vec!["sigma".into()] }
//!     fn dims(&self) -> Vec<Vec<usize>> { vec![vec![]] }
//!     fn constrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> {
//!         vec!["sigma".into()]
//!     }
//!     fn unconstrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> {
//!         vec!["sigma".into()]
//!     }
//!     fn transform_inits(&self, ctx: &dyn VarContext, _msgs: &mut Messages<'_>) -> Result<Vec<f64>> {
//!         Ok(ctx.vals_r_checked("sigma", 1)?.iter().map(|s| s.ln()).collect())
//!     }
//!     fn write_array(
//!         &self,
//!         _rng: &mut dyn rand::RngCore,
//!         params_r: &[f64],
//!         _tp: bool,
//!         _gq: bool,
//!         _msgs: &mut Messages<'_>,
//!     ) -> Result<Vec<f64>> {
//!         Ok(vec![params_r[0].exp()])
//!     }
//! }
//!
//! impl TemplatedDensity for Scale {
//!     fn log_prob<T: Scalar, const PROPTO: bool, const JACOBIAN: bool>(
//!         &self,
//!         params_r: &[T],
//!         _params_i: &[i32],
//!         _msgs: &mut Messages<'_>,
//!     ) -> Result<T> {
//!         let log_sigma = params_r[0];
//!         let sigma = log_sigma.exp();
//!         let mut lp = -T::constant(0.5) * sigma * sigma;
//!         if !PROPTO {
//!             lp += T::constant((2.0 / std::f64::consts::PI).sqrt().ln());
//!         }
//!         if JACOBIAN {
//!             lp += log_sigma;
//!         }
//!         Ok(lp)
//!     }
//! }
//!
//! impl Model for Scale {
//!     type Density = Templated;
//! }
//!
//! // d/du [-exp(2u)/2 + u] at u = 0 is -1 + 1.
//! let mut grad = Vec::new();
//! let lp = log_prob_grad(
//!     &Scale,
//!     &vec![0.0],
//!     &[],
//!     &mut grad,
//!     LogDensityMode::PROPTO_JACOBIAN,
//!     Messages::none(),
//! )
//! .unwrap();
//! assert_eq!(lp, -0.5);
//! assert_eq!(grad, vec![0.0]);
//! ```
//!
//! ## Example 2: A Virtual Model With Its Own Gradient
//!
//! ```rust
//! use general_logp::prelude::*;
//! use ndarray::arr1;
//!
//! /// f(x, y) = -(100 (y - x^2)^2 + (1 - x)^2)
//! struct Rosenbrock;
//!
//! impl ModelBase for Rosenbrock {
//!     fn model_name(&self) -> String { "rosenbrock".into() }
//!     fn num_params_r(&self) -> usize { 2 }
//!     fn param_names(&self) -> Vec<String> { vec!["xy".into()] }
//!     fn dims(&self) -> Vec<Vec<usize>> { vec![vec![2]] }
//!     fn constrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> {
//!         vec!["xy.1".into(), "xy.2".into()]
//!     }
//!     fn unconstrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> {
//!         vec!["xy.1".into(), "xy.2".into()]
//!     }
//!     fn transform_inits(&self, ctx: &dyn VarContext, _msgs: &mut Messages<'_>) -> Result<Vec<f64>> {
//!         ctx.vals_r_checked("xy", 2)
//!     }
//!     fn write_array(
//!         &self,
//!         _rng: &mut dyn rand::RngCore,
//!         params_r: &[f64],
//!         _tp: bool,
//!         _gq: bool,
//!         _msgs: &mut Messages<'_>,
//!     ) -> Result<Vec<f64>> {
//!         Ok(params_r[..2].to_vec())
//!     }
//! }
//!
//! impl VirtualModel for Rosenbrock {
//!     fn log_prob(&self, p: &[f64], _msgs: &mut Messages<'_>) -> Result<f64> {
//!         let (x, y) = (p[0], p[1]);
//!         Ok(-(100.0 * (y - x * x).powi(2) + (1.0 - x).powi(2)))
//!     }
//!
//!     fn log_prob_grad(
//!         &self,
//!         p: &[f64],
//!         gradient: &mut Vec<f64>,
//!         _propto: bool,
//!         _jacobian: bool,
//!         msgs: &mut Messages<'_>,
//!     ) -> Result<f64> {
//!         let (x, y) = (p[0], p[1]);
//!         *gradient = vec![
//!             400.0 * x * (y - x * x) + 2.0 * (1.0 - x),
//!             -200.0 * (y - x * x),
//!         ];
//!         self.log_prob(p, msgs)
//!     }
//! }
//!
//! impl Model for Rosenbrock {
//!     type Density = Virtual;
//! }
//!
//! // Dense parameters go through the dense entry points.
//! let mut grad = ndarray::Array1::zeros(2);
//! let lp = log_prob_grad(
//!     &Rosenbrock,
//!     &arr1(&[0.5, 0.5]),
//!     &[],
//!     &mut grad,
//!     LogDensityMode::PLAIN,
//!     Messages::none(),
//! )
//! .unwrap();
//! assert_eq!(lp, -6.5);
//! assert_eq!(grad, arr1(&[51.0, -50.0]));
//! ```
//!
//! ## Example 3: Checking a Gradient Against Finite Differences
//!
//! ```rust
//! use general_logp::prelude::*;
//! # struct StdNormal;
//! # impl ModelBase for StdNormal {
//! #     fn model_name(&self) -> String { "std_normal".into() }
//! #     fn num_params_r(&self) -> usize { 2 }
//! #     fn param_names(&self) -> Vec<String> { vec!["z".into()] }
//! #     fn dims(&self) -> Vec<Vec<usize>> { vec![vec![2]] }
//! #     fn constrained_param_names(&self, _: bool, _: bool) -> Vec<String> { vec!["z.1".into(), "z.2".into()] }
//! #     fn unconstrained_param_names(&self, _: bool, _: bool) -> Vec<String> { vec!["z.1".into(), "z.2".into()] }
//! #     fn transform_inits(&self, c: &dyn VarContext, _: &mut Messages<'_>) -> Result<Vec<f64>> { c.vals_r_checked("z", 2) }
//! #     fn write_array(&self, _: &mut dyn rand::RngCore, p: &[f64], _: bool, _: bool, _: &mut Messages<'_>) -> Result<Vec<f64>> { Ok(p.to_vec()) }
//! # }
//! # impl TemplatedDensity for StdNormal {
//! #     fn log_prob<T: Scalar, const PROPTO: bool, const JACOBIAN: bool>(&self, p: &[T], _: &[i32], _: &mut Messages<'_>) -> Result<T> {
//! #         Ok(p.iter().map(|&z| -T::constant(0.5) * z * z).sum())
//! #     }
//! # }
//! # impl Model for StdNormal { type Density = Templated; }
//!
//! let failed = test_gradients(
//!     &StdNormal,
//!     &[0.3, -1.2],
//!     &[],
//!     LogDensityMode::PLAIN,
//!     DEFAULT_EPSILON,
//!     DEFAULT_ERROR,
//!     &NoInterrupt,
//!     &LogLogger,
//! )
//! .unwrap();
//! assert_eq!(failed, 0);
//!
//! // The same model as a plain function for generic optimizers.
//! let (value, grad) = gradient(&StdNormal, &[1.0, 0.0], &NoopLogger).unwrap();
//! assert_eq!(value, -0.5);
//! assert_eq!(grad, vec![-1.0, 0.0]);
//! ```
//!
//! See `demos/` for runnable versions of these examples.
//!
//! ## Features
//! - **Type-Level Dispatch** between templated and virtual densities, with no per-call checks
//! - **Reverse-Mode Autodiff** on a scoped arena that is recovered on every exit path
//! - **Flat and Dense Parameters** (`Vec<f64>`, `[f64]`, `ndarray::Array1<f64>`)
//! - **Diagnostics** routed to a message stream or a leveled [`Logger`](callbacks::Logger)
//! - **Optional JSON** variable contexts (feature `json`)

pub mod autodiff;
pub mod callbacks;
pub mod context;
pub mod draws;
pub mod error;
pub mod finite_diff;
pub mod functional;
pub mod log_prob;
pub mod log_prob_grad;
pub mod mode;
pub mod model;
pub mod vector;

pub use error::{EvalError, Result};
pub use functional::{gradient, ModelFunctional};
pub use log_prob::{log_prob, log_prob_logged, log_prob_propto, log_prob_with};
pub use log_prob_grad::{log_prob_grad, log_prob_grad_in, log_prob_grad_logged};
pub use mode::LogDensityMode;
pub use model::{
    DensityKind, Model, ModelBase, Templated, TemplatedDensity, Virtual, VirtualModel,
};

/// Everything needed to write and evaluate a model.
pub mod prelude {
    pub use crate::autodiff::{Arena, Scalar};
    pub use crate::callbacks::{
        Diagnostics, Interrupt, LogLogger, Logger, MemoryWriter, Messages, NoInterrupt,
        NoopLogger, StreamLogger, Writer,
    };
    pub use crate::context::{MemoryContext, VarContext};
    pub use crate::draws::{random_inits, write_draw, DEFAULT_INIT_RADIUS};
    pub use crate::error::{EvalError, Result};
    pub use crate::finite_diff::{finite_diff_grad, test_gradients, DEFAULT_EPSILON, DEFAULT_ERROR};
    pub use crate::functional::{gradient, ModelFunctional};
    pub use crate::log_prob::{log_prob, log_prob_logged, log_prob_propto, log_prob_with};
    pub use crate::log_prob_grad::{log_prob_grad, log_prob_grad_in, log_prob_grad_logged};
    pub use crate::mode::LogDensityMode;
    pub use crate::model::{
        density_kind, DensityKind, Model, ModelBase, Templated, TemplatedDensity, Virtual,
        VirtualModel,
    };
}
