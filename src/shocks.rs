use serde::Serialize;

use crate::error::{ModelError, Result};
use crate::scr::RiskModule::{Counterparty, Health, Life, Market, NonLife};
use crate::scr::{RiskModule, RiskModuleVector, aggregate_scr, round2};

/// A named stress test: multiplies the named modules' charges, leaves the
/// rest untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShockScenario {
    pub id: &'static str,
    pub description: &'static str,
    pub multipliers: &'static [(RiskModule, f64)],
}

impl ShockScenario {
    /// 1.0 for modules the scenario does not name.
    pub fn multiplier(&self, module: RiskModule) -> f64 {
        self.multipliers
            .iter()
            .find(|(m, _)| *m == module)
            .map(|&(_, k)| k)
            .unwrap_or(1.0)
    }

    /// Shocked copy of `values`. Operational is made explicit only if the
    /// scenario names it.
    pub fn apply(&self, values: &RiskModuleVector) -> RiskModuleVector {
        let mut out = *values;
        for &(module, k) in self.multipliers {
            out.set(module, values.get(module) * k);
        }
        out
    }
}

pub const SHOCK_CATALOGUE: [ShockScenario; 17] = [
    // ── Market ──────────────────────────────────────────────────────────────
    ShockScenario {
        id: "market_interest_up",
        description: "Upward interest-rate shock",
        multipliers: &[(Market, 1.085)],
    },
    ShockScenario {
        id: "market_interest_down",
        description: "Downward interest-rate shock",
        multipliers: &[(Market, 1.12)],
    },
    ShockScenario {
        id: "market_equity_type1",
        description: "Equity fall, listed EEA/OECD equities",
        multipliers: &[(Market, 1.39)],
    },
    ShockScenario {
        id: "market_equity_type2",
        description: "Equity fall, other equities",
        multipliers: &[(Market, 1.49)],
    },
    ShockScenario {
        id: "market_property",
        description: "Property value fall",
        multipliers: &[(Market, 1.25)],
    },
    ShockScenario {
        id: "market_spread",
        description: "Credit spread widening",
        multipliers: &[(Market, 1.15)],
    },
    ShockScenario {
        id: "market_currency",
        description: "Adverse currency move",
        multipliers: &[(Market, 1.25)],
    },
    // ── Life ────────────────────────────────────────────────────────────────
    ShockScenario {
        id: "life_mortality",
        description: "Permanent rise in mortality rates",
        multipliers: &[(Life, 1.15)],
    },
    ShockScenario {
        id: "life_longevity",
        description: "Permanent fall in mortality rates",
        multipliers: &[(Life, 1.20)],
    },
    ShockScenario {
        id: "life_lapse",
        description: "Mass lapse",
        multipliers: &[(Life, 1.40)],
    },
    ShockScenario {
        id: "life_catastrophe",
        description: "One-year mortality spike",
        multipliers: &[(Life, 1.10)],
    },
    // ── Health ──────────────────────────────────────────────────────────────
    ShockScenario {
        id: "health_pandemic",
        description: "Pandemic morbidity shock",
        multipliers: &[(Health, 1.30)],
    },
    // ── Non-life ────────────────────────────────────────────────────────────
    ShockScenario {
        id: "nonlife_catastrophe",
        description: "Natural catastrophe loss",
        multipliers: &[(NonLife, 1.50)],
    },
    ShockScenario {
        id: "nonlife_reserve",
        description: "Reserve deterioration",
        multipliers: &[(NonLife, 1.20)],
    },
    // ── Combined crises ─────────────────────────────────────────────────────
    ShockScenario {
        id: "crisis_financial",
        description: "Financial crisis: market crash with counterparty defaults",
        multipliers: &[(Market, 1.45), (Counterparty, 1.30)],
    },
    ShockScenario {
        id: "crisis_pandemic",
        description: "Pandemic: health and life claims with market stress",
        multipliers: &[(Market, 1.15), (Life, 1.20), (Health, 1.35)],
    },
    ShockScenario {
        id: "crisis_natcat",
        description: "Major natural catastrophe with reinsurer default",
        multipliers: &[(Market, 1.05), (Counterparty, 1.20), (NonLife, 1.60)],
    },
];

pub fn find_scenario(id: &str) -> Result<&'static ShockScenario> {
    SHOCK_CATALOGUE
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| ModelError::UnknownScenario(id.to_string()))
}

/// Capital impact of one scenario. Every number is rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShockReport {
    pub scenario: String,
    pub original_scr: f64,
    pub stressed_scr: f64,
    pub impact_amount: f64,
    /// (stressed − original) / original × 100; 0 when original is 0.
    pub impact_pct: f64,
    pub stressed_values: RiskModuleVector,
    pub stressed_bscr: f64,
}

pub fn apply_shock(values: &RiskModuleVector, scenario_id: &str) -> Result<ShockReport> {
    let scenario = find_scenario(scenario_id)?;
    let original = aggregate_scr(values)?;
    let stressed_values = scenario.apply(values);
    let stressed = aggregate_scr(&stressed_values)?;

    let impact_amount = stressed.scr - original.scr;
    let impact_pct =
        if original.scr == 0.0 { 0.0 } else { impact_amount / original.scr * 100.0 };

    Ok(ShockReport {
        scenario: scenario.id.to_string(),
        original_scr: round2(original.scr),
        stressed_scr: round2(stressed.scr),
        impact_amount: round2(impact_amount),
        impact_pct: round2(impact_pct),
        stressed_values: stressed_values.rounded(),
        stressed_bscr: round2(stressed.bscr),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::scr::RiskModule;

    #[test]
    fn catalogue_ids_are_unique() {
        let ids: HashSet<&str> = SHOCK_CATALOGUE.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), SHOCK_CATALOGUE.len());
    }

    #[test]
    fn catalogue_has_fourteen_single_and_three_combined_shocks() {
        let single = SHOCK_CATALOGUE.iter().filter(|s| s.multipliers.len() == 1).count();
        let combined = SHOCK_CATALOGUE.iter().filter(|s| s.multipliers.len() > 1).count();
        assert_eq!((single, combined), (14, 3));
        for s in SHOCK_CATALOGUE.iter().filter(|s| s.multipliers.len() > 1) {
            assert!(s.id.starts_with("crisis_"), "{} should be a crisis scenario", s.id);
        }
    }

    #[test]
    fn interest_up_multiplier_is_exact() {
        let s = find_scenario("market_interest_up").unwrap();
        assert_eq!(s.multiplier(RiskModule::Market), 1.085);
        assert_eq!(s.multiplier(RiskModule::Life), 1.0);
    }

    #[test]
    fn unknown_scenario_is_rejected() {
        let values = RiskModuleVector::default();
        let before = values;
        let err = apply_shock(&values, "market_meteor").unwrap_err();
        assert_eq!(err, ModelError::UnknownScenario("market_meteor".to_string()));
        assert_eq!(values, before);
    }

    #[test]
    fn interest_up_end_to_end() {
        let values = RiskModuleVector::default();
        let report = apply_shock(&values, "market_interest_up").unwrap();

        assert_eq!(report.scenario, "market_interest_up");
        assert!(report.stressed_scr > report.original_scr);
        assert_eq!(report.original_scr, 109.6);
        assert_eq!(report.stressed_scr, 113.01);
        assert_eq!(report.stressed_bscr, 98.01);
        assert_eq!(report.impact_amount, 3.4);
        assert_eq!(report.impact_pct, 3.11);

        let stressed = report.stressed_values;
        assert_eq!(stressed.market, 54.25);
        assert_eq!(stressed.life, values.life);
        assert_eq!(stressed.health, values.health);
        assert_eq!(stressed.nonlife, values.nonlife);
        assert_eq!(stressed.counterparty, values.counterparty);
        assert_eq!(stressed.operational, values.operational);
    }

    #[test]
    fn impact_sign_follows_scr_change_for_every_scenario() {
        let values = RiskModuleVector::default();
        for scenario in &SHOCK_CATALOGUE {
            let report = apply_shock(&values, scenario.id).unwrap();
            let delta = report.stressed_scr - report.original_scr;
            assert_eq!(
                report.impact_pct.signum(),
                delta.signum(),
                "{}: pct {} vs delta {delta}",
                scenario.id,
                report.impact_pct
            );
        }
    }

    #[test]
    fn zero_baseline_reports_zero_pct() {
        let report = apply_shock(&RiskModuleVector::zero(), "crisis_financial").unwrap();
        assert_eq!(report.original_scr, 0.0);
        assert_eq!(report.impact_pct, 0.0);
    }

    #[test]
    fn combined_crisis_shocks_every_named_module() {
        let values = RiskModuleVector::default();
        let report = apply_shock(&values, "crisis_natcat").unwrap();
        assert_eq!(report.stressed_values.nonlife, 64.0);
        assert_eq!(report.stressed_values.counterparty, 12.0);
        assert_eq!(report.stressed_values.market, 52.5);
        assert_eq!(report.stressed_values.life, 30.0);
    }
}
