/*!
Constrained draws and random initial values.
*/

use crate::callbacks::{Messages, Writer};
use crate::error::{EvalError, Result};
use crate::model::ModelBase;
use rand::RngCore;
use rand_distr::{Distribution, Uniform};

/// Default half-width of the interval [`random_inits`] draws from.
pub const DEFAULT_INIT_RADIUS: f64 = 2.0;

/// Writes the constrained names header and one constrained draw at
/// `params_r` through `writer`.
///
/// Returns the values that were written. If `write_array` fails, nothing is
/// written and the error is returned.
pub fn write_draw<M: ModelBase + ?Sized>(
    model: &M,
    rng: &mut dyn RngCore,
    params_r: &[f64],
    include_tparams: bool,
    include_gqs: bool,
    writer: &mut dyn Writer,
    mut msgs: Messages<'_>,
) -> Result<Vec<f64>> {
    let values = model.write_array(rng, params_r, include_tparams, include_gqs, &mut msgs)?;
    let names = model.constrained_param_names(include_tparams, include_gqs);
    if names.len() != values.len() {
        log::debug!(
            "{}: write_array returned {} values for {} names",
            model.model_name(),
            values.len(),
            names.len()
        );
    }
    writer.names(&names);
    writer.values(&values);
    Ok(values)
}

/// Unconstrained initial values drawn uniformly from `[-radius, radius)`,
/// one per continuous parameter.
///
/// Fails with [`EvalError::Domain`] unless `radius` is positive and finite.
pub fn random_inits<M: ModelBase + ?Sized>(
    model: &M,
    rng: &mut dyn RngCore,
    radius: f64,
) -> Result<Vec<f64>> {
    let uniform = Uniform::new(-radius, radius).map_err(|e| {
        EvalError::domain(format!("invalid initialization radius {}: {}", radius, e))
    })?;
    Ok((0..model.num_params_r())
        .map(|_| uniform.sample(&mut *rng))
        .collect())
}
