//! Solvency capital aggregation.
//!
//! BSCR = √(Σᵢ Σⱼ ρ(i, j) · vᵢ · vⱼ) over the five basic modules, then
//! SCR = BSCR + operational. Pure functions over a constant correlation
//! table; full precision internally, rounding only in reports.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result, ensure_finite};

pub const DEFAULT_OPERATIONAL: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskModule {
    Market,
    Counterparty,
    Life,
    Health,
    NonLife,
    Operational,
}

impl RiskModule {
    /// Modules entering the BSCR correlation, in [`CORRELATION`] order.
    pub const BASIC: [RiskModule; 5] = [
        RiskModule::Market,
        RiskModule::Counterparty,
        RiskModule::Life,
        RiskModule::Health,
        RiskModule::NonLife,
    ];

    pub const ALL: [RiskModule; 6] = [
        RiskModule::Market,
        RiskModule::Counterparty,
        RiskModule::Life,
        RiskModule::Health,
        RiskModule::NonLife,
        RiskModule::Operational,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RiskModule::Market => "market",
            RiskModule::Counterparty => "counterparty",
            RiskModule::Life => "life",
            RiskModule::Health => "health",
            RiskModule::NonLife => "nonlife",
            RiskModule::Operational => "operational",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        RiskModule::ALL.into_iter().find(|m| m.name() == name)
    }

    fn basic_index(self) -> Option<usize> {
        RiskModule::BASIC.iter().position(|&m| m == self)
    }
}

/// Symmetric, unit diagonal. Rows/columns: market, counterparty, life,
/// health, nonlife.
pub const CORRELATION: [[f64; 5]; 5] = [
    [1.00, 0.25, 0.25, 0.25, 0.25],
    [0.25, 1.00, 0.25, 0.25, 0.50],
    [0.25, 0.25, 1.00, 0.25, 0.00],
    [0.25, 0.25, 0.25, 1.00, 0.00],
    [0.25, 0.50, 0.00, 0.00, 1.00],
];

/// ρ(a, b); `None` if either module is operational.
pub fn correlation(a: RiskModule, b: RiskModule) -> Option<f64> {
    Some(CORRELATION[a.basic_index()?][b.basic_index()?])
}

/// Capital charge per risk module. Operational falls back to
/// [`DEFAULT_OPERATIONAL`] when absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskModuleVector {
    pub market: f64,
    pub life: f64,
    pub health: f64,
    pub nonlife: f64,
    pub counterparty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational: Option<f64>,
}

impl Default for RiskModuleVector {
    fn default() -> Self {
        RiskModuleVector {
            market: 50.0,
            life: 30.0,
            health: 20.0,
            nonlife: 40.0,
            counterparty: 10.0,
            operational: Some(DEFAULT_OPERATIONAL),
        }
    }
}

impl RiskModuleVector {
    pub fn zero() -> Self {
        RiskModuleVector {
            market: 0.0,
            life: 0.0,
            health: 0.0,
            nonlife: 0.0,
            counterparty: 0.0,
            operational: Some(0.0),
        }
    }

    pub fn get(&self, module: RiskModule) -> f64 {
        match module {
            RiskModule::Market => self.market,
            RiskModule::Counterparty => self.counterparty,
            RiskModule::Life => self.life,
            RiskModule::Health => self.health,
            RiskModule::NonLife => self.nonlife,
            RiskModule::Operational => self.operational.unwrap_or(DEFAULT_OPERATIONAL),
        }
    }

    pub fn set(&mut self, module: RiskModule, value: f64) {
        match module {
            RiskModule::Market => self.market = value,
            RiskModule::Counterparty => self.counterparty = value,
            RiskModule::Life => self.life = value,
            RiskModule::Health => self.health = value,
            RiskModule::NonLife => self.nonlife = value,
            RiskModule::Operational => self.operational = Some(value),
        }
    }

    /// Every charge finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for module in RiskModule::ALL {
            let v = self.get(module);
            ensure_finite(module.name(), v)?;
            if v < 0.0 {
                return Err(ModelError::InvalidParameter(format!(
                    "{} charge must be >= 0, got {v}",
                    module.name()
                )));
            }
        }
        Ok(())
    }

    /// Copy with every charge rounded to two decimals and operational made
    /// explicit.
    pub fn rounded(&self) -> Self {
        let mut out = *self;
        for module in RiskModule::ALL {
            out.set(module, round2(self.get(module)));
        }
        out
    }
}

/// √(Σᵢ Σⱼ ρ(i, j) · vᵢ · vⱼ) over the five basic modules. Operational is
/// ignored. The double sum is clamped at 0 before the root.
pub fn aggregate_bscr(values: &RiskModuleVector) -> Result<f64> {
    values.validate()?;
    let mut sum = 0.0;
    for a in RiskModule::BASIC {
        for b in RiskModule::BASIC {
            let rho = correlation(a, b).unwrap_or(0.0);
            sum += rho * values.get(a) * values.get(b);
        }
    }
    Ok(sum.max(0.0).sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrBreakdown {
    pub bscr: f64,
    pub operational: f64,
    pub scr: f64,
}

impl ScrBreakdown {
    pub fn rounded(&self) -> Self {
        ScrBreakdown {
            bscr: round2(self.bscr),
            operational: round2(self.operational),
            scr: round2(self.scr),
        }
    }
}

/// SCR = BSCR + operational.
pub fn aggregate_scr(values: &RiskModuleVector) -> Result<ScrBreakdown> {
    let bscr = aggregate_bscr(values)?;
    let operational = values.get(RiskModule::Operational);
    Ok(ScrBreakdown { bscr, operational, scr: bscr + operational })
}

/// Round half away from zero to two decimals.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
