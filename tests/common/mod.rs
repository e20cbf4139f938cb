//! Models shared by the integration tests.
#![allow(dead_code)]

use general_logp::prelude::*;
use ndarray::Array1;
use rand::RngCore;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;
use std::fmt::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Routes `log` output to the test harness.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Two-dimensional Rosenbrock density
/// f(x, y) = -(100 (y - x^2)^2 + (1 - x)^2).
///
/// Only the required entry points are implemented, so every mode falls back
/// to the plain density.
pub struct Rosenbrock;

impl ModelBase for Rosenbrock {
    fn model_name(&self) -> String {
        "rosenbrock".into()
    }

    fn num_params_r(&self) -> usize {
        2
    }

    fn param_names(&self) -> Vec<String> {
        vec!["xy".into()]
    }

    fn dims(&self) -> Vec<Vec<usize>> {
        vec![vec![2]]
    }

    fn constrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> {
        vec!["xy.1".into(), "xy.2".into()]
    }

    fn unconstrained_param_names(&self, tp: bool, gq: bool) -> Vec<String> {
        self.constrained_param_names(tp, gq)
    }

    fn transform_inits(&self, context: &dyn VarContext, _msgs: &mut Messages<'_>) -> Result<Vec<f64>> {
        context.vals_r_checked("xy", 2)
    }

    fn write_array(
        &self,
        _rng: &mut dyn RngCore,
        params_r: &[f64],
        _tp: bool,
        _gq: bool,
        _msgs: &mut Messages<'_>,
    ) -> Result<Vec<f64>> {
        Ok(params_r[..2].to_vec())
    }
}

impl VirtualModel for Rosenbrock {
    fn log_prob(&self, params_r: &[f64], _msgs: &mut Messages<'_>) -> Result<f64> {
        let (x, y) = (params_r[0], params_r[1]);
        Ok(-(100.0 * (y - x * x).powi(2) + (1.0 - x).powi(2)))
    }

    fn log_prob_grad(
        &self,
        params_r: &[f64],
        gradient: &mut Vec<f64>,
        _propto: bool,
        _jacobian: bool,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        let (x, y) = (params_r[0], params_r[1]);
        gradient.clear();
        gradient.push(400.0 * x * (y - x * x) + 2.0 * (1.0 - x));
        gradient.push(-200.0 * (y - x * x));
        self.log_prob(params_r, msgs)
    }
}

impl Model for Rosenbrock {
    type Density = Virtual;
}

/// Virtual model whose entry points return distinct constants: 1, 2, 3, 4 for
/// the flat plain, Jacobian, propto and propto-Jacobian densities and ten
/// times that for the dense ones. Each entry point writes its name to the
/// message stream.
pub struct Mock;

impl Mock {
    /// Value the flat entry point for `mode` returns.
    pub fn flat_value(mode: LogDensityMode) -> f64 {
        match (mode.propto, mode.jacobian) {
            (false, false) => 1.0,
            (false, true) => 2.0,
            (true, false) => 3.0,
            (true, true) => 4.0,
        }
    }

    /// Value the dense entry point for `mode` returns.
    pub fn dense_value(mode: LogDensityMode) -> f64 {
        10.0 * Self::flat_value(mode)
    }
}

impl ModelBase for Mock {
    fn model_name(&self) -> String {
        "mock".into()
    }

    fn model_compile_info(&self) -> Vec<String> {
        vec!["mock build".into()]
    }

    fn num_params_r(&self) -> usize {
        1
    }

    fn param_names(&self) -> Vec<String> {
        vec!["theta".into()]
    }

    fn dims(&self) -> Vec<Vec<usize>> {
        vec![vec![]]
    }

    fn constrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> {
        vec!["theta".into()]
    }

    fn unconstrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> {
        vec!["theta".into()]
    }

    fn transform_inits(&self, context: &dyn VarContext, _msgs: &mut Messages<'_>) -> Result<Vec<f64>> {
        context.vals_r_checked("theta", 1)
    }

    fn write_array(
        &self,
        _rng: &mut dyn RngCore,
        params_r: &[f64],
        _tp: bool,
        _gq: bool,
        _msgs: &mut Messages<'_>,
    ) -> Result<Vec<f64>> {
        Ok(params_r[..1].to_vec())
    }
}

impl VirtualModel for Mock {
    fn log_prob(&self, _params_r: &[f64], msgs: &mut Messages<'_>) -> Result<f64> {
        let _ = write!(msgs, "log_prob;");
        Ok(1.0)
    }

    fn log_prob_jacobian(&self, _params_r: &[f64], msgs: &mut Messages<'_>) -> Result<f64> {
        let _ = write!(msgs, "log_prob_jacobian;");
        Ok(2.0)
    }

    fn log_prob_propto(&self, _params_r: &[f64], msgs: &mut Messages<'_>) -> Result<f64> {
        let _ = write!(msgs, "log_prob_propto;");
        Ok(3.0)
    }

    fn log_prob_propto_jacobian(&self, _params_r: &[f64], msgs: &mut Messages<'_>) -> Result<f64> {
        let _ = write!(msgs, "log_prob_propto_jacobian;");
        Ok(4.0)
    }

    fn log_prob_dense(&self, _params_r: &Array1<f64>, _msgs: &mut Messages<'_>) -> Result<f64> {
        Ok(10.0)
    }

    fn log_prob_jacobian_dense(&self, _params_r: &Array1<f64>, _msgs: &mut Messages<'_>) -> Result<f64> {
        Ok(20.0)
    }

    fn log_prob_propto_dense(&self, _params_r: &Array1<f64>, _msgs: &mut Messages<'_>) -> Result<f64> {
        Ok(30.0)
    }

    fn log_prob_propto_jacobian_dense(
        &self,
        _params_r: &Array1<f64>,
        _msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        Ok(40.0)
    }

    /// Gradient is `[propto, jacobian]` as 0/1 flags.
    fn log_prob_grad(
        &self,
        params_r: &[f64],
        gradient: &mut Vec<f64>,
        propto: bool,
        jacobian: bool,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        *gradient = vec![propto as u8 as f64, jacobian as u8 as f64];
        mock_flat(self, params_r, LogDensityMode::new(propto, jacobian), msgs)
    }

    fn log_prob_grad_dense(
        &self,
        _params_r: &Array1<f64>,
        gradient: &mut Array1<f64>,
        propto: bool,
        jacobian: bool,
        _msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        *gradient = Array1::from(vec![10.0 * propto as u8 as f64, 10.0 * jacobian as u8 as f64]);
        Ok(Mock::dense_value(LogDensityMode::new(propto, jacobian)))
    }
}

impl Model for Mock {
    type Density = Virtual;
}

/// Calls the flat `Mock` entry point for `mode` directly.
pub fn mock_flat(
    mock: &Mock,
    params_r: &[f64],
    mode: LogDensityMode,
    msgs: &mut Messages<'_>,
) -> Result<f64> {
    match (mode.propto, mode.jacobian) {
        (false, false) => VirtualModel::log_prob(mock, params_r, msgs),
        (false, true) => mock.log_prob_jacobian(params_r, msgs),
        (true, false) => mock.log_prob_propto(params_r, msgs),
        (true, true) => mock.log_prob_propto_jacobian(params_r, msgs),
    }
}

/// `y_n ~ normal(mu, sigma)` with `sigma` sampled as `log_sigma`.
///
/// Transformed parameter: `variance`. Generated quantity: `y_rep`, a draw
/// from `normal(mu, sigma)`. When `chatty` is set the density reports its
/// scale on the message stream.
pub struct NormalScale {
    pub y: Vec<f64>,
    pub chatty: bool,
}

impl NormalScale {
    pub fn new(y: Vec<f64>) -> Self {
        Self { y, chatty: false }
    }

    pub fn chatty(mut self) -> Self {
        self.chatty = true;
        self
    }

    /// Closed-form log density at `(mu, log_sigma)`.
    pub fn expected(&self, mu: f64, log_sigma: f64, mode: LogDensityMode) -> f64 {
        let sigma = log_sigma.exp();
        let n = self.y.len() as f64;
        let ss: f64 = self.y.iter().map(|y| (y - mu).powi(2)).sum();
        let mut lp = -0.5 * ss / (sigma * sigma) - n * log_sigma;
        if !mode.propto {
            lp -= 0.5 * n * (2.0 * PI).ln();
        }
        if mode.jacobian {
            lp += log_sigma;
        }
        lp
    }

    /// Closed-form gradient with respect to `(mu, log_sigma)`.
    pub fn expected_grad(&self, mu: f64, log_sigma: f64, mode: LogDensityMode) -> Vec<f64> {
        let sigma2 = (2.0 * log_sigma).exp();
        let n = self.y.len() as f64;
        let s: f64 = self.y.iter().map(|y| y - mu).sum();
        let ss: f64 = self.y.iter().map(|y| (y - mu).powi(2)).sum();
        let jac = if mode.jacobian { 1.0 } else { 0.0 };
        vec![s / sigma2, ss / sigma2 - n + jac]
    }
}

impl ModelBase for NormalScale {
    fn model_name(&self) -> String {
        "normal_scale".into()
    }

    fn num_params_r(&self) -> usize {
        2
    }

    fn param_names(&self) -> Vec<String> {
        vec!["mu".into(), "sigma".into(), "variance".into(), "y_rep".into()]
    }

    fn dims(&self) -> Vec<Vec<usize>> {
        vec![vec![], vec![], vec![], vec![]]
    }

    fn constrained_param_names(&self, include_tparams: bool, include_gqs: bool) -> Vec<String> {
        let mut names = vec!["mu".to_string(), "sigma".to_string()];
        if include_tparams {
            names.push("variance".into());
        }
        if include_gqs {
            names.push("y_rep".into());
        }
        names
    }

    fn unconstrained_param_names(&self, include_tparams: bool, include_gqs: bool) -> Vec<String> {
        let mut names = vec!["mu".to_string(), "log_sigma".to_string()];
        if include_tparams {
            names.push("variance".into());
        }
        if include_gqs {
            names.push("y_rep".into());
        }
        names
    }

    fn transform_inits(&self, context: &dyn VarContext, _msgs: &mut Messages<'_>) -> Result<Vec<f64>> {
        let mu = context.vals_r_checked("mu", 1)?[0];
        let sigma = context.vals_r_checked("sigma", 1)?[0];
        if sigma <= 0.0 {
            return Err(EvalError::domain(format!("sigma must be positive, got {}", sigma)));
        }
        Ok(vec![mu, sigma.ln()])
    }

    fn write_array(
        &self,
        rng: &mut dyn RngCore,
        params_r: &[f64],
        include_tparams: bool,
        include_gqs: bool,
        _msgs: &mut Messages<'_>,
    ) -> Result<Vec<f64>> {
        let mu = params_r[0];
        let sigma = params_r[1].exp();
        let mut out = vec![mu, sigma];
        if include_tparams {
            out.push(sigma * sigma);
        }
        if include_gqs {
            let normal = Normal::new(mu, sigma).map_err(|e| EvalError::domain(e.to_string()))?;
            out.push(normal.sample(rng));
        }
        Ok(out)
    }
}

impl TemplatedDensity for NormalScale {
    fn log_prob<T: Scalar, const PROPTO: bool, const JACOBIAN: bool>(
        &self,
        params_r: &[T],
        _params_i: &[i32],
        msgs: &mut Messages<'_>,
    ) -> Result<T> {
        let mu = params_r[0];
        let log_sigma = params_r[1];
        let sigma = log_sigma.exp();
        if self.chatty {
            let _ = write!(msgs, "sigma = {:.3}", sigma.primal());
        }

        let n = self.y.len() as f64;
        let mut lp = -log_sigma * T::constant(n);
        for &y in &self.y {
            let z = (T::constant(y) - mu) / sigma;
            lp -= T::constant(0.5) * z * z;
        }
        if !PROPTO {
            lp -= T::constant(0.5 * n * (2.0 * PI).ln());
        }
        if JACOBIAN {
            lp += log_sigma;
        }
        Ok(lp)
    }
}

impl Model for NormalScale {
    type Density = Templated;
}

/// Templated model `-x^2` that writes a message and then fails whenever
/// `x > limit`.
pub struct Failing {
    pub limit: f64,
}

impl ModelBase for Failing {
    fn model_name(&self) -> String {
        "failing".into()
    }

    fn num_params_r(&self) -> usize {
        1
    }

    fn param_names(&self) -> Vec<String> {
        vec!["x".into()]
    }

    fn dims(&self) -> Vec<Vec<usize>> {
        vec![vec![]]
    }

    fn constrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> {
        vec!["x".into()]
    }

    fn unconstrained_param_names(&self, _tp: bool, _gq: bool) -> Vec<String> {
        vec!["x".into()]
    }

    fn transform_inits(&self, context: &dyn VarContext, _msgs: &mut Messages<'_>) -> Result<Vec<f64>> {
        context.vals_r_checked("x", 1)
    }

    fn write_array(
        &self,
        _rng: &mut dyn RngCore,
        params_r: &[f64],
        _tp: bool,
        _gq: bool,
        _msgs: &mut Messages<'_>,
    ) -> Result<Vec<f64>> {
        if params_r[0] > self.limit {
            return Err(EvalError::domain("x is above the limit"));
        }
        Ok(params_r[..1].to_vec())
    }
}

impl TemplatedDensity for Failing {
    fn log_prob<T: Scalar, const PROPTO: bool, const JACOBIAN: bool>(
        &self,
        params_r: &[T],
        _params_i: &[i32],
        msgs: &mut Messages<'_>,
    ) -> Result<T> {
        let x = params_r[0];
        let lp = -(x * x);
        if x.primal() > self.limit {
            let _ = write!(msgs, "x = {} is above {}", x.primal(), self.limit);
            return Err(EvalError::domain("x is above the limit"));
        }
        Ok(lp)
    }
}

impl Model for Failing {
    type Density = Templated;
}
