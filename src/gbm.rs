use rand::Rng;
use rand_distr::StandardNormal;

use crate::config::ProcessParams;
use crate::error::{ModelError, Result};

/// Draw `sample_count` independent terminal values of a geometric Brownian
/// motion:
///
/// S_T = S0 · exp[(μ − σ²/2)·T + σ·√T·Z],  Z ~ N(0, 1) i.i.d.
///
/// E[S_T] = S0 · exp(μT). Values are strictly positive and finite; nothing is
/// clamped. A draw that underflows to zero or overflows to infinity, which
/// only happens for extreme `volatility × horizon`, fails the whole call.
pub fn sample_terminal(params: &ProcessParams, rng: &mut impl Rng) -> Result<Vec<f64>> {
    params.validate()?;
    let drift_term = (params.drift - 0.5 * params.volatility * params.volatility) * params.horizon;
    let diffusion = params.volatility * params.horizon.sqrt();
    (0..params.sample_count)
        .map(|_| {
            let z: f64 = rng.sample(StandardNormal);
            let value = params.initial_value * (drift_term + diffusion * z).exp();
            if value > 0.0 && value.is_finite() {
                Ok(value)
            } else {
                Err(ModelError::InvalidParameter(format!(
                    "terminal value {value} out of range; volatility {} over horizon {} is too large",
                    params.volatility, params.horizon
                )))
            }
        })
        .collect()
}
