//! Walks a templated model with a constrained scale parameter through seeding
//! unconstrained values from a variable context, evaluating the density and its
//! exact gradient in every mode, and writing constrained draws with a generated
//! quantity.

use general_logp::prelude::*;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::error::Error;
use std::f64::consts::PI;
use std::fmt::Write as _;

/// `y_n ~ normal(mu, sigma)`, `sigma > 0` sampled on the log scale.
struct NormalScale {
    y: Vec<f64>,
}

impl ModelBase for NormalScale {
    fn model_name(&self) -> String {
        "normal_scale".into()
    }

    fn num_params_r(&self) -> usize {
        2
    }

    fn param_names(&self) -> Vec<String> {
        vec!["mu".into(), "sigma".into(), "y_rep".into()]
    }

    fn dims(&self) -> Vec<Vec<usize>> {
        vec![vec![], vec![], vec![]]
    }

    fn constrained_param_names(&self, _tp: bool, include_gqs: bool) -> Vec<String> {
        let mut names = vec!["mu".to_string(), "sigma".to_string()];
        if include_gqs {
            names.push("y_rep".into());
        }
        names
    }

    fn unconstrained_param_names(&self, _tp: bool, include_gqs: bool) -> Vec<String> {
        let mut names = vec!["mu".to_string(), "log_sigma".to_string()];
        if include_gqs {
            names.push("y_rep".into());
        }
        names
    }

    fn transform_inits(&self, context: &dyn VarContext, _msgs: &mut Messages<'_>) -> Result<Vec<f64>> {
        let mu = context.vals_r_checked("mu", 1)?[0];
        let sigma = context.vals_r_checked("sigma", 1)?[0];
        Ok(vec![mu, sigma.ln()])
    }

    fn write_array(
        &self,
        rng: &mut dyn RngCore,
        params_r: &[f64],
        _tp: bool,
        include_gqs: bool,
        _msgs: &mut Messages<'_>,
    ) -> Result<Vec<f64>> {
        let (mu, sigma) = (params_r[0], params_r[1].exp());
        let mut out = vec![mu, sigma];
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
        let (mu, log_sigma) = (params_r[0], params_r[1]);
        let sigma = log_sigma.exp();
        if sigma.primal() < 1e-3 {
            let _ = write!(msgs, "sigma = {:e} is close to zero", sigma.primal());
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

fn main() -> std::result::Result<(), Box<dyn Error>> {
    env_logger::init();

    let model = NormalScale {
        y: vec![2.1, 1.7, 2.9, 2.4, 1.2],
    };
    let ctx = MemoryContext::new()
        .with_scalar("mu", 2.0)
        .with_scalar("sigma", 0.5);
    let params = model.transform_inits(&ctx, &mut Messages::none())?;

    for mode in LogDensityMode::ALL {
        let mut grad = Vec::new();
        let lp = log_prob_grad_logged(&model, &params, &[], &mut grad, mode, &LogLogger)?;
        println!("{mode}: lp = {lp:.4}, grad = [{:.4}, {:.4}]", grad[0], grad[1]);
    }

    // Ask for a tiny scale to see the density's warning routed to the logger.
    let tiny = vec![2.0, -9.0];
    let lp = log_prob_logged(&model, &tiny, &[], LogDensityMode::PLAIN, &LogLogger)?;
    println!("lp at log_sigma = -9: {lp:.1}");

    let mut rng = SmallRng::seed_from_u64(42);
    let mut writer = MemoryWriter::default();
    for _ in 0..3 {
        let inits = random_inits(&model, &mut rng, DEFAULT_INIT_RADIUS)?;
        write_draw(&model, &mut rng, &inits, false, true, &mut writer, Messages::none())?;
    }
    println!("{}", writer.names.join("\t"));
    for row in &writer.rows {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:.3}")).collect();
        println!("{}", cells.join("\t"));
    }
    Ok(())
}
