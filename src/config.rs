use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result, ensure_finite};
use crate::types::Triple;

/// Claims are drawn from the same GBM family as premiums, started at this
/// fraction of the premium's initial value (a 70% expected loss ratio).
pub const EXPECTED_LOSS_RATIO: f64 = 0.7;

pub const DEFAULT_INITIAL_PREMIUM: f64 = 1000.0;
pub const DEFAULT_DRIFT: f64 = 0.05;
pub const DEFAULT_VOLATILITY: f64 = 0.2;
pub const DEFAULT_HORIZON: f64 = 1.0;
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

pub const DEFAULT_FAIRNESS_WEIGHT: f64 = 0.1;
pub const DEFAULT_FAIRNESS_FLOOR: f64 = 0.05;

/// Parameters of one GBM terminal-value draw. Immutable input to every
/// simulation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessParams {
    /// S0; must be > 0.
    pub initial_value: f64,
    /// μ, annualised.
    pub drift: f64,
    /// σ, annualised; must be ≥ 0.
    pub volatility: f64,
    /// T in years; must be > 0.
    pub horizon: f64,
    /// Number of Monte Carlo draws; must be > 0.
    pub sample_count: usize,
}

impl ProcessParams {
    /// Reference premium process: S0 = 1000, μ = 5%, σ = 20%, one year, 1000 draws.
    pub fn canonical() -> Self {
        ProcessParams {
            initial_value: DEFAULT_INITIAL_PREMIUM,
            drift: DEFAULT_DRIFT,
            volatility: DEFAULT_VOLATILITY,
            horizon: DEFAULT_HORIZON,
            sample_count: DEFAULT_SAMPLE_COUNT,
        }
    }

    /// Same process started from a different value (e.g. the claims base).
    pub fn with_initial_value(self, initial_value: f64) -> Self {
        ProcessParams { initial_value, ..self }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_finite("initial_value", self.initial_value)?;
        ensure_finite("drift", self.drift)?;
        ensure_finite("volatility", self.volatility)?;
        ensure_finite("horizon", self.horizon)?;
        if self.initial_value <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "initial_value must be > 0, got {}",
                self.initial_value
            )));
        }
        if self.volatility < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "volatility must be >= 0, got {}",
                self.volatility
            )));
        }
        if self.horizon <= 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "horizon must be > 0, got {}",
                self.horizon
            )));
        }
        if self.sample_count == 0 {
            return Err(ModelError::InvalidParameter("sample_count must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Which scalar the equilibrium search maximises over mean profits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// meanA + meanB + meanC.
    TotalProfit,
    /// total + fairness_weight × min(meanA, meanB, meanC).
    #[default]
    WelfareWithFairness,
    /// min(meanA, meanB, meanC).
    Egalitarian,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidate retention rates tried for every insurer.
    pub grid: Vec<f64>,
    /// Minimum retention per insurer; grid points below it are excluded.
    pub fairness_floor: Option<f64>,
    pub fairness_weight: f64,
    pub objective: ObjectiveKind,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            grid: retention_grid(10),
            fairness_floor: Some(DEFAULT_FAIRNESS_FLOOR),
            fairness_weight: DEFAULT_FAIRNESS_WEIGHT,
            objective: ObjectiveKind::WelfareWithFairness,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid.is_empty() {
            return Err(ModelError::InvalidParameter("retention grid is empty".to_string()));
        }
        for &r in &self.grid {
            crate::types::check_retention(r)?;
        }
        if let Some(floor) = self.fairness_floor {
            ensure_finite("fairness_floor", floor)?;
            if floor < 0.0 {
                return Err(ModelError::InvalidParameter(format!(
                    "fairness_floor must be >= 0, got {floor}"
                )));
            }
        }
        ensure_finite("fairness_weight", self.fairness_weight)
    }
}

/// `steps + 1` evenly spaced rates from 0 to 1 inclusive.
/// `retention_grid(10)` is the reference grid {0.0, 0.1, …, 1.0}.
pub fn retention_grid(steps: u32) -> Vec<f64> {
    if steps == 0 {
        return vec![0.0];
    }
    (0..=steps).map(|i| i as f64 / steps as f64).collect()
}

/// Process-wide settings for the CLI. Every field has a default, so a JSON
/// override file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub drift: f64,
    pub volatility: f64,
    pub horizon: f64,
    pub sample_count: usize,
    pub initial_premiums: Triple<f64>,
    pub search: SearchConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::canonical()
    }
}

impl SimulationConfig {
    pub fn canonical() -> Self {
        SimulationConfig {
            seed: 42,
            drift: DEFAULT_DRIFT,
            volatility: DEFAULT_VOLATILITY,
            horizon: DEFAULT_HORIZON,
            sample_count: DEFAULT_SAMPLE_COUNT,
            initial_premiums: Triple::new(
                DEFAULT_INITIAL_PREMIUM,
                DEFAULT_INITIAL_PREMIUM,
                DEFAULT_INITIAL_PREMIUM,
            ),
            search: SearchConfig::default(),
        }
    }

    /// Process parameters for a premium sequence starting at `initial_value`.
    pub fn process_params(&self, initial_value: f64) -> ProcessParams {
        ProcessParams {
            initial_value,
            drift: self.drift,
            volatility: self.volatility,
            horizon: self.horizon,
            sample_count: self.sample_count,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for &s0 in self.initial_premiums.iter() {
            self.process_params(s0).validate()?;
        }
        self.search.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_grid_has_eleven_points() {
        let grid = retention_grid(10);
        assert_eq!(grid.len(), 11);
        assert_eq!(grid[0], 0.0);
        assert_eq!(grid[3], 0.3);
        assert_eq!(grid[10], 1.0);
    }

    #[test]
    fn canonical_process_is_valid() {
        assert!(ProcessParams::canonical().validate().is_ok());
        assert!(SimulationConfig::canonical().validate().is_ok());
    }

    #[test]
    fn non_positive_inputs_are_rejected() {
        let p = ProcessParams::canonical();
        for bad in [
            p.with_initial_value(0.0),
            p.with_initial_value(-5.0),
            ProcessParams { horizon: 0.0, ..p },
            ProcessParams { sample_count: 0, ..p },
            ProcessParams { volatility: -0.1, ..p },
            ProcessParams { drift: f64::NAN, ..p },
        ] {
            assert!(
                matches!(bad.validate(), Err(ModelError::InvalidParameter(_))),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg: SimulationConfig =
            serde_json::from_str(r#"{ "seed": 7, "search": { "fairness_floor": null } }"#).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.search.fairness_floor, None);
        assert_eq!(cfg.search.grid.len(), 11);
        assert_eq!(cfg.sample_count, DEFAULT_SAMPLE_COUNT);
    }

    #[test]
    fn empty_grid_is_rejected() {
        let search = SearchConfig { grid: vec![], ..SearchConfig::default() };
        assert!(search.validate().is_err());
    }
}
