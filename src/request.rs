//! Request and response records exchanged with an outside caller (the CLI,
//! or any transport layer). Field names and defaults match the JSON the
//! caller sends.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::analysis::mean_profits;
use crate::config::{DEFAULT_INITIAL_PREMIUM, SimulationConfig};
use crate::equilibrium::{EquilibriumSearcher, SearchOutcome};
use crate::error::Result;
use crate::scr::{DEFAULT_OPERATIONAL, RiskModuleVector, ScrBreakdown, aggregate_scr};
use crate::shocks::{ShockReport, apply_shock};
use crate::simulation::PremiumModel;
use crate::types::{RetentionVector, Triple};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Simulate the caller's retentions.
    #[default]
    Classic,
    /// Search the configured grid and simulate the best retentions found.
    Equilibrium,
}

fn default_premium() -> f64 {
    DEFAULT_INITIAL_PREMIUM
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(default)]
    pub retention_a: f64,
    #[serde(default)]
    pub retention_b: f64,
    #[serde(default)]
    pub retention_c: f64,
    #[serde(default = "default_premium")]
    pub initial_premium_a: f64,
    #[serde(default = "default_premium")]
    pub initial_premium_b: f64,
    #[serde(default = "default_premium")]
    pub initial_premium_c: f64,
    #[serde(default)]
    pub scenario: Scenario,
}

impl SimulationRequest {
    pub fn initial_premiums(&self) -> Triple<f64> {
        Triple::new(self.initial_premium_a, self.initial_premium_b, self.initial_premium_c)
    }

    /// Equal premium bases share one set of draws; otherwise each insurer
    /// gets its own.
    pub fn premium_model(&self) -> PremiumModel {
        let p = self.initial_premiums();
        if p.a == p.b && p.b == p.c {
            PremiumModel::Shared { initial_premium: p.a }
        } else {
            PremiumModel::Independent { initial_premiums: p }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResponse {
    pub scenario: Scenario,
    pub retentions: RetentionVector,
    /// `None` when an equilibrium search found no admissible point.
    pub profit_a: Option<f64>,
    pub profit_b: Option<f64>,
    pub profit_c: Option<f64>,
    pub degenerate: bool,
}

impl SimulationResponse {
    fn with_profits(scenario: Scenario, retentions: RetentionVector, means: Triple<f64>) -> Self {
        SimulationResponse {
            scenario,
            retentions,
            profit_a: Some(means.a),
            profit_b: Some(means.b),
            profit_c: Some(means.c),
            degenerate: false,
        }
    }
}

/// Run a simulation request. Classic requests whose retentions sum above 1
/// are rejected with `ConstraintViolation`. Equilibrium requests ignore the
/// request's retentions; the search seed is drawn from `rng`.
pub fn run_simulation(
    request: &SimulationRequest,
    config: &SimulationConfig,
    rng: &mut impl Rng,
) -> Result<SimulationResponse> {
    let premiums = request.premium_model();
    match request.scenario {
        Scenario::Classic => {
            let retentions =
                RetentionVector::new(request.retention_a, request.retention_b, request.retention_c)?;
            retentions.ensure_feasible()?;
            let base = config.process_params(request.initial_premium_a);
            premiums.validate(&base)?;
            let profits = premiums.simulate(&base, &retentions, rng)?;
            Ok(SimulationResponse::with_profits(
                Scenario::Classic,
                retentions,
                mean_profits(&profits),
            ))
        }
        Scenario::Equilibrium => {
            let searcher = EquilibriumSearcher::from_config(config, premiums)?;
            let report = searcher.search(rng.random())?;
            Ok(match report.outcome {
                SearchOutcome::Optimum(best) => SimulationResponse::with_profits(
                    Scenario::Equilibrium,
                    best.retentions,
                    best.mean_profits,
                ),
                SearchOutcome::Degenerate { retentions } => SimulationResponse {
                    scenario: Scenario::Equilibrium,
                    retentions,
                    profit_a: None,
                    profit_b: None,
                    profit_c: None,
                    degenerate: true,
                },
            })
        }
    }
}

fn default_market() -> f64 {
    50.0
}
fn default_life() -> f64 {
    30.0
}
fn default_health() -> f64 {
    20.0
}
fn default_nonlife() -> f64 {
    40.0
}
fn default_counterparty() -> f64 {
    10.0
}
fn default_operational() -> f64 {
    DEFAULT_OPERATIONAL
}

/// Capital charges with the reference defaults for any field left out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrRequest {
    #[serde(default = "default_market")]
    pub market: f64,
    #[serde(default = "default_life")]
    pub life: f64,
    #[serde(default = "default_health")]
    pub health: f64,
    #[serde(default = "default_nonlife")]
    pub nonlife: f64,
    #[serde(default = "default_counterparty")]
    pub counterparty: f64,
    #[serde(default = "default_operational")]
    pub operational: f64,
}

impl Default for ScrRequest {
    fn default() -> Self {
        ScrRequest::from(RiskModuleVector::default())
    }
}

impl From<RiskModuleVector> for ScrRequest {
    fn from(v: RiskModuleVector) -> Self {
        ScrRequest {
            market: v.market,
            life: v.life,
            health: v.health,
            nonlife: v.nonlife,
            counterparty: v.counterparty,
            operational: v.operational.unwrap_or(DEFAULT_OPERATIONAL),
        }
    }
}

impl From<ScrRequest> for RiskModuleVector {
    fn from(r: ScrRequest) -> Self {
        RiskModuleVector {
            market: r.market,
            life: r.life,
            health: r.health,
            nonlife: r.nonlife,
            counterparty: r.counterparty,
            operational: Some(r.operational),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockRequest {
    #[serde(flatten)]
    pub values: ScrRequest,
    pub scenario_id: String,
}

/// `{bscr, operational, scr}` rounded to two decimals.
pub fn run_scr(request: &ScrRequest) -> Result<ScrBreakdown> {
    Ok(aggregate_scr(&RiskModuleVector::from(*request))?.rounded())
}

pub fn run_shock(request: &ShockRequest) -> Result<ShockReport> {
    apply_shock(&RiskModuleVector::from(request.values), &request.scenario_id)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::error::ModelError;

    fn config() -> SimulationConfig {
        SimulationConfig { sample_count: 200, ..SimulationConfig::canonical() }
    }

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    #[test]
    fn request_defaults_fill_premiums_and_scenario() {
        let req: SimulationRequest =
            serde_json::from_str(r#"{"retention_a":0.3,"retention_b":0.4,"retention_c":0.3}"#).unwrap();
        assert_eq!(req.initial_premiums(), Triple::new(1000.0, 1000.0, 1000.0));
        assert_eq!(req.scenario, Scenario::Classic);
        assert_eq!(req.premium_model(), PremiumModel::Shared { initial_premium: 1000.0 });
    }

    #[test]
    fn distinct_premiums_select_independent_model() {
        let req: SimulationRequest = serde_json::from_str(
            r#"{"retention_a":0.3,"retention_b":0.3,"retention_c":0.3,"initial_premium_a":1500}"#,
        )
        .unwrap();
        assert!(matches!(req.premium_model(), PremiumModel::Independent { .. }));
    }

    #[test]
    fn classic_request_returns_mean_profits() {
        let req: SimulationRequest =
            serde_json::from_str(r#"{"retention_a":0.3,"retention_b":0.4,"retention_c":0.3}"#).unwrap();
        let resp = run_simulation(&req, &config(), &mut rng()).unwrap();
        assert!(!resp.degenerate);
        let (a, b) = (resp.profit_a.unwrap(), resp.profit_b.unwrap());
        assert!(b > a, "higher retention must earn more: {a} vs {b}");
    }

    #[test]
    fn over_allocated_classic_request_is_rejected() {
        let req: SimulationRequest =
            serde_json::from_str(r#"{"retention_a":0.5,"retention_b":0.4,"retention_c":0.3}"#).unwrap();
        let err = run_simulation(&req, &config(), &mut rng()).unwrap_err();
        assert!(matches!(err, ModelError::ConstraintViolation(_)));
    }

    #[test]
    fn out_of_range_retention_is_invalid_not_a_constraint_breach() {
        let req: SimulationRequest = serde_json::from_str(r#"{"retention_a":1.5}"#).unwrap();
        let err = run_simulation(&req, &config(), &mut rng()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter(_)));
    }

    #[test]
    fn equilibrium_request_returns_feasible_retentions() {
        let req: SimulationRequest = serde_json::from_str(r#"{"scenario":"equilibrium"}"#).unwrap();
        let mut cfg = config();
        cfg.sample_count = 20;
        let resp = run_simulation(&req, &cfg, &mut rng()).unwrap();
        assert_eq!(resp.scenario, Scenario::Equilibrium);
        assert!(resp.retentions.is_feasible());
        assert!(resp.retentions.satisfies_floor(0.05));
        assert!(resp.profit_a.is_some());
    }

    #[test]
    fn equilibrium_request_reports_degenerate_fallback() {
        let req: SimulationRequest = serde_json::from_str(r#"{"scenario":"equilibrium"}"#).unwrap();
        let mut cfg = config();
        cfg.sample_count = 5;
        cfg.search.fairness_floor = Some(0.5);
        let resp = run_simulation(&req, &cfg, &mut rng()).unwrap();
        assert!(resp.degenerate);
        assert_eq!(resp.profit_a, None);
    }

    #[test]
    fn scr_request_defaults() {
        let req: ScrRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, ScrRequest::default());
        let out = run_scr(&req).unwrap();
        assert_eq!(out.scr, 109.6);
        assert_eq!(out.operational, 15.0);
    }

    #[test]
    fn shock_request_flattens_charges() {
        let req: ShockRequest =
            serde_json::from_str(r#"{"market":100,"scenario_id":"market_interest_up"}"#).unwrap();
        assert_eq!(req.values.market, 100.0);
        assert_eq!(req.values.life, 30.0);
        let report = run_shock(&req).unwrap();
        assert_eq!(report.stressed_values.market, 108.5);

        let bad = ShockRequest { values: ScrRequest::default(), scenario_id: "nope".into() };
        assert!(matches!(run_shock(&bad), Err(ModelError::UnknownScenario(_))));
    }
}
