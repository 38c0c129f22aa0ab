//! Constrained welfare search over a discrete retention grid.
//!
//! Every combination in the cube `grid³` is tried in the order A-outer,
//! B-middle, C-inner. Combinations whose retentions sum above 1, or that fall
//! below the fairness floor, are skipped. Each survivor is simulated once,
//! reduced to mean profits and scored by an [`Objective`]; the first maximum
//! encountered wins.
//!
//! The result maximises the objective under the constraints. It is not a
//! verified Nash equilibrium: no best-response or unilateral-deviation check
//! is made.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::mean_profits;
use crate::config::{ObjectiveKind, ProcessParams, SearchConfig, SimulationConfig};
use crate::error::Result;
use crate::simulation::PremiumModel;
use crate::types::{RetentionVector, Triple};

/// Returned when no grid point passes the feasibility and floor checks.
/// A placeholder split, not an equilibrium.
pub const FALLBACK_RETENTIONS: RetentionVector = RetentionVector::new_unchecked(0.33, 0.33, 0.34);

/// Scalar score of a mean-profit triple. Higher is better.
pub trait Objective: Send + Sync {
    fn evaluate(&self, mean_profits: &Triple<f64>) -> f64;
}

impl<F> Objective for F
where
    F: Fn(&Triple<f64>) -> f64 + Send + Sync,
{
    fn evaluate(&self, mean_profits: &Triple<f64>) -> f64 {
        self(mean_profits)
    }
}

/// Aggregate welfare: meanA + meanB + meanC.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalProfit;

impl Objective for TotalProfit {
    fn evaluate(&self, mean_profits: &Triple<f64>) -> f64 {
        mean_profits.sum()
    }
}

/// Aggregate welfare plus a bonus on the worst-off insurer, discouraging
/// allocations where one party captures nearly all the surplus.
#[derive(Debug, Clone, Copy)]
pub struct WelfareWithFairness {
    pub fairness_weight: f64,
}

impl Objective for WelfareWithFairness {
    fn evaluate(&self, mean_profits: &Triple<f64>) -> f64 {
        mean_profits.sum() + self.fairness_weight * mean_profits.min()
    }
}

/// Max-min: the worst-off insurer's mean profit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Egalitarian;

impl Objective for Egalitarian {
    fn evaluate(&self, mean_profits: &Triple<f64>) -> f64 {
        mean_profits.min()
    }
}

/// Objective chosen at runtime from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredObjective {
    pub kind: ObjectiveKind,
    pub fairness_weight: f64,
}

impl Objective for ConfiguredObjective {
    fn evaluate(&self, mean_profits: &Triple<f64>) -> f64 {
        match self.kind {
            ObjectiveKind::TotalProfit => TotalProfit.evaluate(mean_profits),
            ObjectiveKind::WelfareWithFairness => {
                WelfareWithFairness { fairness_weight: self.fairness_weight }.evaluate(mean_profits)
            }
            ObjectiveKind::Egalitarian => Egalitarian.evaluate(mean_profits),
        }
    }
}

impl ObjectiveKind {
    pub fn build(self, fairness_weight: f64) -> ConfiguredObjective {
        ConfiguredObjective { kind: self, fairness_weight }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquilibriumCandidate {
    pub retentions: RetentionVector,
    pub mean_profits: Triple<f64>,
    pub objective: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    Optimum(EquilibriumCandidate),
    /// Every combination was excluded. The retentions are
    /// [`FALLBACK_RETENTIONS`] and there are no associated profits.
    Degenerate { retentions: RetentionVector },
}

impl SearchOutcome {
    pub fn retentions(&self) -> RetentionVector {
        match self {
            SearchOutcome::Optimum(c) => c.retentions,
            SearchOutcome::Degenerate { retentions } => *retentions,
        }
    }

    pub fn candidate(&self) -> Option<&EquilibriumCandidate> {
        match self {
            SearchOutcome::Optimum(c) => Some(c),
            SearchOutcome::Degenerate { .. } => None,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, SearchOutcome::Degenerate { .. })
    }
}

/// How the grid cube was partitioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub combinations: usize,
    pub evaluated: usize,
    /// Retentions summing above 1.
    pub infeasible: usize,
    /// Feasible, but some retention below the fairness floor.
    pub below_floor: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub stats: SearchStats,
}

pub struct EquilibriumSearcher<O: Objective> {
    grid: Vec<f64>,
    fairness_floor: Option<f64>,
    objective: O,
    process: ProcessParams,
    premiums: PremiumModel,
}

impl EquilibriumSearcher<ConfiguredObjective> {
    /// Searcher with the objective, grid and floor named in `config`.
    pub fn from_config(config: &SimulationConfig, premiums: PremiumModel) -> Result<Self> {
        let objective = config.search.objective.build(config.search.fairness_weight);
        EquilibriumSearcher::new(
            &config.search,
            objective,
            config.process_params(config.initial_premiums.a),
            premiums,
        )
    }
}

impl<O: Objective> EquilibriumSearcher<O> {
    /// `search.objective` and `search.fairness_weight` are ignored in favour
    /// of `objective`. `process.initial_value` is replaced by the premium
    /// model's base(s).
    pub fn new(
        search: &SearchConfig,
        objective: O,
        process: ProcessParams,
        premiums: PremiumModel,
    ) -> Result<Self> {
        search.validate()?;
        premiums.validate(&process)?;
        Ok(EquilibriumSearcher {
            grid: search.grid.clone(),
            fairness_floor: search.fairness_floor,
            objective,
            process,
            premiums,
        })
    }

    /// Simulate one retention vector and score it. The sum constraint is not
    /// checked here.
    pub fn evaluate(
        &self,
        retentions: &RetentionVector,
        rng: &mut impl Rng,
    ) -> Result<EquilibriumCandidate> {
        let profits = self.premiums.simulate(&self.process, retentions, rng)?;
        let mean_profits = mean_profits(&profits);
        Ok(EquilibriumCandidate {
            retentions: *retentions,
            mean_profits,
            objective: self.objective.evaluate(&mean_profits),
        })
    }

    /// Exhaustive sequential search. Combination `i` of the cube draws from
    /// ChaCha20 stream `i` of `seed`, so results do not depend on which
    /// combinations were skipped or on evaluation order.
    pub fn search(&self, seed: u64) -> Result<SearchReport> {
        let (admissible, stats) = self.admissible_combinations()?;
        let mut best: Option<EquilibriumCandidate> = None;
        for (index, retentions) in admissible {
            let candidate = self.evaluate(&retentions, &mut combination_rng(seed, index))?;
            if best.as_ref().is_none_or(|b| candidate.objective > b.objective) {
                best = Some(candidate);
            }
        }
        Ok(finish(best, stats))
    }

    /// Same result as [`search`](Self::search), with combinations evaluated
    /// on the rayon pool. Ties resolve to the lowest cube index.
    pub fn search_par(&self, seed: u64) -> Result<SearchReport> {
        let (admissible, stats) = self.admissible_combinations()?;
        let scored: Vec<(usize, EquilibriumCandidate)> = admissible
            .par_iter()
            .map(|&(index, retentions)| {
                self.evaluate(&retentions, &mut combination_rng(seed, index))
                    .map(|candidate| (index, candidate))
            })
            .collect::<Result<_>>()?;

        let best = scored
            .into_iter()
            .reduce(|best, next| if next.1.objective > best.1.objective { next } else { best })
            .map(|(_, candidate)| candidate);
        Ok(finish(best, stats))
    }

    /// Cube combinations in canonical order with their cube index, minus the
    /// infeasible and below-floor ones.
    fn admissible_combinations(&self) -> Result<(Vec<(usize, RetentionVector)>, SearchStats)> {
        let n = self.grid.len();
        let mut stats = SearchStats { combinations: n * n * n, ..SearchStats::default() };
        let mut admissible = Vec::new();
        for (i, &a) in self.grid.iter().enumerate() {
            for (j, &b) in self.grid.iter().enumerate() {
                for (k, &c) in self.grid.iter().enumerate() {
                    let retentions = RetentionVector::new(a, b, c)?;
                    if !retentions.is_feasible() {
                        stats.infeasible += 1;
                        continue;
                    }
                    if let Some(floor) = self.fairness_floor
                        && !retentions.satisfies_floor(floor)
                    {
                        stats.below_floor += 1;
                        continue;
                    }
                    admissible.push(((i * n + j) * n + k, retentions));
                }
            }
        }
        stats.evaluated = admissible.len();
        Ok((admissible, stats))
    }
}

fn combination_rng(seed: u64, index: usize) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

fn finish(best: Option<EquilibriumCandidate>, stats: SearchStats) -> SearchReport {
    let outcome = match best {
        Some(candidate) => SearchOutcome::Optimum(candidate),
        None => SearchOutcome::Degenerate { retentions: FALLBACK_RETENTIONS },
    };
    SearchReport { outcome, stats }
}
