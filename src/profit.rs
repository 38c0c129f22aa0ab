//! Quota-share profit formulas.
//!
//! Two formulations are in use and they are not interchangeable:
//!
//! * [`quota_share_profit`]: the insurer keeps `retention` of both premium
//!   and claims, so profit is `retention × (premium − claim)`.
//! * [`claims_scaled_profit`]: premiums are not modelled; a single claims
//!   draw is scaled by the retained share `1 − quota`. Nothing is subtracted.

use crate::error::{ModelError, Result, ensure_all_finite};
use crate::types::check_retention;

/// `retention × (premium − claim)` elementwise.
pub fn quota_share_profit(premiums: &[f64], claims: &[f64], retention: f64) -> Result<Vec<f64>> {
    check_retention(retention)?;
    if premiums.len() != claims.len() {
        return Err(ModelError::InvalidParameter(format!(
            "premium and claim sequences differ in length: {} vs {}",
            premiums.len(),
            claims.len()
        )));
    }
    ensure_all_finite("premiums", premiums)?;
    ensure_all_finite("claims", claims)?;
    Ok(premiums.iter().zip(claims).map(|(p, c)| retention * (p - c)).collect())
}

/// `(1 − quota) × claim` elementwise, where `quota` is the ceded share.
pub fn claims_scaled_profit(claims: &[f64], quota: f64) -> Result<Vec<f64>> {
    check_retention(quota)?;
    ensure_all_finite("claims", claims)?;
    let retained = 1.0 - quota;
    Ok(claims.iter().map(|c| retained * c).collect())
}

/// Mean claims over mean premiums. Zero if there is no premium.
pub fn empirical_loss_ratio(premiums: &[f64], claims: &[f64]) -> f64 {
    let total_premium: f64 = premiums.iter().sum();
    if total_premium == 0.0 || premiums.is_empty() || claims.is_empty() {
        return 0.0;
    }
    let mean_premium = total_premium / premiums.len() as f64;
    let mean_claims = claims.iter().sum::<f64>() / claims.len() as f64;
    mean_claims / mean_premium
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;

    const PREMIUMS: [f64; 3] = [1000.0, 1200.0, 800.0];
    const CLAIMS: [f64; 3] = [700.0, 840.0, 560.0];

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_relative_eq!(*a, *e, epsilon = 1e-9);
        }
    }

    #[test]
    fn full_retention_keeps_whole_margin() {
        let profit = quota_share_profit(&PREMIUMS, &CLAIMS, 1.0).unwrap();
        assert_all_close(&profit, &[300.0, 360.0, 240.0]);
    }

    #[test]
    fn thirty_percent_retention() {
        let profit = quota_share_profit(&PREMIUMS, &CLAIMS, 0.3).unwrap();
        assert_all_close(&profit, &[90.0, 108.0, 72.0]);
    }

    #[test]
    fn zero_retention_cedes_everything() {
        let profit = quota_share_profit(&PREMIUMS, &CLAIMS, 0.0).unwrap();
        assert_all_close(&profit, &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn retention_outside_unit_interval_fails() {
        assert!(matches!(
            quota_share_profit(&PREMIUMS, &CLAIMS, 1.5),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            quota_share_profit(&PREMIUMS, &CLAIMS, -0.01),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn mismatched_lengths_fail() {
        assert!(quota_share_profit(&PREMIUMS, &CLAIMS[..2], 0.5).is_err());
    }

    #[test]
    fn claims_scaled_variant_never_subtracts() {
        let profit = claims_scaled_profit(&CLAIMS, 0.7).unwrap();
        assert_all_close(&profit, &[210.0, 252.0, 168.0]);
        // Same inputs through the margin formula give a different answer.
        let margin = quota_share_profit(&PREMIUMS, &CLAIMS, 0.3).unwrap();
        assert_ne!(profit, margin);
    }

    #[test]
    fn claims_scaled_rejects_bad_quota() {
        assert!(claims_scaled_profit(&CLAIMS, 2.0).is_err());
    }

    #[test]
    fn non_finite_draws_are_rejected() {
        assert!(matches!(
            quota_share_profit(&[f64::NAN, f64::INFINITY], &[700.0, 700.0], 0.5),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            quota_share_profit(&[1000.0, 1000.0], &[700.0, f64::NEG_INFINITY], 0.5),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            claims_scaled_profit(&[f64::NAN], 0.5),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn loss_ratio_of_fixed_sequences() {
        assert_relative_eq!(empirical_loss_ratio(&PREMIUMS, &CLAIMS), 0.7, epsilon = 1e-12);
        assert_eq!(empirical_loss_ratio(&[], &CLAIMS), 0.0);
    }

    proptest! {
        #[test]
        fn profit_is_linear_in_retention(
            pairs in prop::collection::vec((0.0f64..1e4, 0.0f64..1e4), 1..50),
            r in 0.0f64..=1.0,
        ) {
            let (premiums, claims): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let profit = quota_share_profit(&premiums, &claims, r).unwrap();
            for ((p, c), x) in premiums.iter().zip(&claims).zip(&profit) {
                prop_assert!((x - r * (p - c)).abs() < 1e-9);
            }
        }
    }
}
