//! Evaluates a Rosenbrock density with a hand-written gradient in every mode,
//! for flat and dense parameters, then checks it against finite differences.

use general_logp::prelude::*;
use ndarray::arr1;
use rand::RngCore;
use std::error::Error;

/// f(x, y) = -(a - x)^2 - b (y - x^2)^2
struct Rosenbrock {
    a: f64,
    b: f64,
}

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
    fn log_prob(&self, p: &[f64], _msgs: &mut Messages<'_>) -> Result<f64> {
        let (x, y) = (p[0], p[1]);
        Ok(-(self.a - x).powi(2) - self.b * (y - x * x).powi(2))
    }

    fn log_prob_grad(
        &self,
        p: &[f64],
        gradient: &mut Vec<f64>,
        _propto: bool,
        _jacobian: bool,
        msgs: &mut Messages<'_>,
    ) -> Result<f64> {
        let (x, y) = (p[0], p[1]);
        *gradient = vec![
            2.0 * (self.a - x) + 4.0 * self.b * x * (y - x * x),
            -2.0 * self.b * (y - x * x),
        ];
        self.log_prob(p, msgs)
    }
}

impl Model for Rosenbrock {
    type Density = Virtual;
}

fn main() -> std::result::Result<(), Box<dyn Error>> {
    env_logger::init();

    let target = Rosenbrock { a: 1.0, b: 100.0 };
    let ctx = MemoryContext::new().with_vector("xy", vec![0.5, 0.5]);
    let params = target.transform_inits(&ctx, &mut Messages::none())?;

    for mode in LogDensityMode::ALL {
        let mut flat = Vec::new();
        let lp = log_prob_grad(&target, &params, &[], &mut flat, mode, Messages::none())?;

        let mut dense = ndarray::Array1::zeros(2);
        let lp_dense = log_prob_grad(&target, &arr1(&params), &[], &mut dense, mode, Messages::none())?;

        println!("{mode}: lp = {lp} (dense {lp_dense}), grad = {flat:?} (dense {dense})");
    }

    let failed = test_gradients(
        &target,
        &params,
        &[],
        LogDensityMode::PLAIN,
        DEFAULT_EPSILON,
        1e-4,
        &NoInterrupt,
        &StdoutLogger,
    )?;
    println!("{failed} coordinate(s) disagree with finite differences");
    Ok(())
}

/// Prints every message on its own line.
struct StdoutLogger;

impl Logger for StdoutLogger {
    fn debug(&self, message: &str) {
        println!("{message}");
    }
    fn info(&self, message: &str) {
        println!("{message}");
    }
    fn warn(&self, message: &str) {
        println!("{message}");
    }
    fn error(&self, message: &str) {
        eprintln!("{message}");
    }
    fn fatal(&self, message: &str) {
        eprintln!("{message}");
    }
}
