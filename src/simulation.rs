use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{EXPECTED_LOSS_RATIO, ProcessParams};
use crate::error::Result;
use crate::gbm::sample_terminal;
use crate::profit::{claims_scaled_profit, empirical_loss_ratio, quota_share_profit};
use crate::types::{Insurer, RetentionVector, Triple};

/// One profit sequence per insurer, `sample_count` draws each.
pub type InsurerProfits = Triple<Vec<f64>>;

/// One premium sequence and one claims sequence (base = 70% of premium S0),
/// reused by all three insurers; only the retention differs. Models a common
/// market shock driving every insurer's outcome.
pub fn simulate_shared_premium(
    params: &ProcessParams,
    retentions: &RetentionVector,
    rng: &mut impl Rng,
) -> Result<InsurerProfits> {
    let premiums = sample_terminal(params, rng)?;
    let claims =
        sample_terminal(&params.with_initial_value(params.initial_value * EXPECTED_LOSS_RATIO), rng)?;

    Ok(Triple::new(
        quota_share_profit(&premiums, &claims, retentions.get(Insurer::A))?,
        quota_share_profit(&premiums, &claims, retentions.get(Insurer::B))?,
        quota_share_profit(&premiums, &claims, retentions.get(Insurer::C))?,
    ))
}

/// An independent premium/claims pair per insurer, each started from that
/// insurer's own premium base. `base.initial_value` is ignored; every other
/// process parameter is shared.
///
/// Draw order is A premium, A claims, B premium, B claims, C premium, C claims.
pub fn simulate_independent_premiums(
    initial_premiums: Triple<f64>,
    base: &ProcessParams,
    retentions: &RetentionVector,
    rng: &mut impl Rng,
) -> Result<InsurerProfits> {
    let mut simulate_one = |insurer: Insurer| -> Result<Vec<f64>> {
        let s0 = initial_premiums[insurer];
        let premiums = sample_terminal(&base.with_initial_value(s0), rng)?;
        let claims = sample_terminal(&base.with_initial_value(s0 * EXPECTED_LOSS_RATIO), rng)?;
        quota_share_profit(&premiums, &claims, retentions.get(insurer))
    };
    Ok(Triple::new(
        simulate_one(Insurer::A)?,
        simulate_one(Insurer::B)?,
        simulate_one(Insurer::C)?,
    ))
}

/// Claims-only formulation: a single claims draw (base = 70% of S0) scaled
/// per insurer by `1 − quota`, where `quotas` are the ceded shares.
/// Premiums are not modelled, so this is not comparable with the two
/// margin-based engines above.
pub fn simulate_claims_scaled(
    params: &ProcessParams,
    quotas: Triple<f64>,
    rng: &mut impl Rng,
) -> Result<InsurerProfits> {
    let claims =
        sample_terminal(&params.with_initial_value(params.initial_value * EXPECTED_LOSS_RATIO), rng)?;
    Ok(Triple::new(
        claims_scaled_profit(&claims, quotas.a)?,
        claims_scaled_profit(&claims, quotas.b)?,
        claims_scaled_profit(&claims, quotas.c)?,
    ))
}

/// Draw one premium sequence and one claims sequence (base = 70% of S0) and
/// report mean claims over mean premiums. Should sit near 0.7; the spread
/// shows the GBM noise around the fixed expected loss ratio.
pub fn sample_loss_ratio(params: &ProcessParams, rng: &mut impl Rng) -> Result<f64> {
    let premiums = sample_terminal(params, rng)?;
    let claims =
        sample_terminal(&params.with_initial_value(params.initial_value * EXPECTED_LOSS_RATIO), rng)?;
    Ok(empirical_loss_ratio(&premiums, &claims))
}

/// How premiums are generated for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PremiumModel {
    /// All insurers share one premium base and one set of draws.
    Shared { initial_premium: f64 },
    /// Each insurer has its own premium base and independent draws.
    Independent { initial_premiums: Triple<f64> },
}

impl PremiumModel {
    /// Dispatch to the matching engine. `base.initial_value` is replaced by
    /// the model's premium base(s).
    pub fn simulate(
        &self,
        base: &ProcessParams,
        retentions: &RetentionVector,
        rng: &mut impl Rng,
    ) -> Result<InsurerProfits> {
        match *self {
            PremiumModel::Shared { initial_premium } => {
                simulate_shared_premium(&base.with_initial_value(initial_premium), retentions, rng)
            }
            PremiumModel::Independent { initial_premiums } => {
                simulate_independent_premiums(initial_premiums, base, retentions, rng)
            }
        }
    }

    /// Validate premium bases before any draws are made.
    pub fn validate(&self, base: &ProcessParams) -> Result<()> {
        match *self {
            PremiumModel::Shared { initial_premium } => {
                base.with_initial_value(initial_premium).validate()
            }
            PremiumModel::Independent { initial_premiums } => {
                for &s0 in initial_premiums.iter() {
                    base.with_initial_value(s0).validate()?;
                }
                Ok(())
            }
        }
    }
}
