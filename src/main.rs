use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

use nashshield::analysis::{ProfitSummary, summarize};
use nashshield::config::{ObjectiveKind, SimulationConfig, retention_grid};
use nashshield::equilibrium::EquilibriumSearcher;
use nashshield::request::{
    Scenario, ScrRequest, ShockRequest, SimulationRequest, run_scr, run_shock, run_simulation,
};
use nashshield::shocks::SHOCK_CATALOGUE;
use nashshield::simulation::{sample_loss_ratio, simulate_claims_scaled};
use nashshield::types::{RetentionVector, Triple};

#[derive(Parser)]
#[command(name = "nashshield", about = "Quota-share reinsurance simulation and solvency capital tools")]
struct Cli {
    /// JSON file overriding fields of the canonical configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Random seed (overrides the configuration).
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Monte Carlo draws per simulation (overrides the configuration).
    #[arg(long, global = true)]
    samples: Option<usize>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mean profit per insurer for chosen retentions, or for the searched optimum.
    Simulate {
        /// Retention rates for insurers A, B, C.
        #[arg(long, num_args = 3, value_names = ["A", "B", "C"], default_values_t = vec![0.0, 0.0, 0.0])]
        retentions: Vec<f64>,
        /// Initial premiums for insurers A, B, C.
        #[arg(long, num_args = 3, value_names = ["A", "B", "C"])]
        premiums: Option<Vec<f64>>,
        #[arg(long, value_enum, default_value_t = Scenario::Classic)]
        scenario: Scenario,
        /// Print full distribution summaries and a loss-ratio check instead of
        /// means. Classic scenario only.
        #[arg(long)]
        summary: bool,
    },
    /// Claims-only formulation: one claims draw scaled by (1 − quota) per insurer.
    ClaimsScaled {
        /// Ceded quotas for insurers A, B, C.
        #[arg(long, num_args = 3, value_names = ["A", "B", "C"], required = true)]
        quotas: Vec<f64>,
        #[arg(long, default_value_t = 1000.0)]
        premium: f64,
    },
    /// Exhaustive grid search for the welfare-maximising retentions.
    Equilibrium {
        #[arg(long, num_args = 3, value_names = ["A", "B", "C"])]
        premiums: Option<Vec<f64>>,
        /// Grid resolution: rates k/steps for k = 0..=steps.
        #[arg(long)]
        steps: Option<u32>,
        /// Minimum retention per insurer.
        #[arg(long, conflicts_with = "no_floor")]
        floor: Option<f64>,
        /// Search without a fairness floor.
        #[arg(long)]
        no_floor: bool,
        #[arg(long, value_enum)]
        objective: Option<ObjectiveKind>,
        #[arg(long)]
        fairness_weight: Option<f64>,
        /// Evaluate combinations on all cores.
        #[arg(long)]
        parallel: bool,
    },
    /// Basic and total solvency capital requirement.
    Scr {
        #[command(flatten)]
        charges: Charges,
    },
    /// Capital impact of a named stress scenario.
    Shock {
        scenario_id: String,
        #[command(flatten)]
        charges: Charges,
    },
    /// List the stress scenario catalogue.
    Scenarios,
}

#[derive(Args)]
struct Charges {
    #[arg(long, default_value_t = 50.0)]
    market: f64,
    #[arg(long, default_value_t = 30.0)]
    life: f64,
    #[arg(long, default_value_t = 20.0)]
    health: f64,
    #[arg(long, default_value_t = 40.0)]
    nonlife: f64,
    #[arg(long, default_value_t = 10.0)]
    counterparty: f64,
    #[arg(long, default_value_t = 15.0)]
    operational: f64,
}

impl From<Charges> for ScrRequest {
    fn from(c: Charges) -> Self {
        ScrRequest {
            market: c.market,
            life: c.life,
            health: c.health,
            nonlife: c.nonlife,
            counterparty: c.counterparty,
            operational: c.operational,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            serde_json::from_str::<SimulationConfig>(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SimulationConfig::canonical(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(n) = cli.samples {
        config.sample_count = n;
    }
    config.validate()?;
    debug!("configuration: {config:?}");

    let mut rng = ChaCha20Rng::seed_from_u64(config.seed);

    match cli.command {
        Command::Simulate { retentions, premiums, scenario, summary } => {
            let premiums = triple(premiums.as_deref(), config.initial_premiums)?;
            let request = SimulationRequest {
                retention_a: retentions[0],
                retention_b: retentions[1],
                retention_c: retentions[2],
                initial_premium_a: premiums.a,
                initial_premium_b: premiums.b,
                initial_premium_c: premiums.c,
                scenario,
            };
            info!(
                "simulate {scenario:?}: retentions {retentions:?}, premiums {:?}, {} draws, seed {}",
                premiums.into_array(),
                config.sample_count,
                config.seed
            );

            check_summary_scenario(summary, scenario)?;
            if summary {
                let r = RetentionVector::new(retentions[0], retentions[1], retentions[2])?;
                r.ensure_feasible()?;
                let base = config.process_params(premiums.a);
                let profits = request.premium_model().simulate(&base, &r, &mut rng)?;
                let report = ClassicSummary {
                    retentions: r,
                    ceded: r.ceded(),
                    loss_ratio: sample_loss_ratio(&base, &mut rng)?,
                    profits: summarize(&profits).context("empty profit sample")?,
                };
                debug!("check-draw loss ratio {:.4}", report.loss_ratio);
                print_json(&report)?;
            } else {
                let response = run_simulation(&request, &config, &mut rng)?;
                if response.degenerate {
                    warn!(
                        "no admissible grid point; returning placeholder split {:?}",
                        response.retentions
                    );
                }
                print_json(&response)?;
            }
        }

        Command::ClaimsScaled { quotas, premium } => {
            let q = Triple::new(quotas[0], quotas[1], quotas[2]);
            info!("claims-scaled: quotas {quotas:?}, premium base {premium}");
            let profits = simulate_claims_scaled(&config.process_params(premium), q, &mut rng)?;
            print_json(&summarize(&profits).context("empty profit sample")?)?;
        }

        Command::Equilibrium {
            premiums,
            steps,
            floor,
            no_floor,
            objective,
            fairness_weight,
            parallel,
        } => {
            if let Some(steps) = steps {
                config.search.grid = retention_grid(steps);
            }
            if no_floor {
                config.search.fairness_floor = None;
            } else if floor.is_some() {
                config.search.fairness_floor = floor;
            }
            if let Some(kind) = objective {
                config.search.objective = kind;
            }
            if let Some(w) = fairness_weight {
                config.search.fairness_weight = w;
            }
            let premiums = triple(premiums.as_deref(), config.initial_premiums)?;
            let request = SimulationRequest {
                retention_a: 0.0,
                retention_b: 0.0,
                retention_c: 0.0,
                initial_premium_a: premiums.a,
                initial_premium_b: premiums.b,
                initial_premium_c: premiums.c,
                scenario: Scenario::Equilibrium,
            };

            let searcher = EquilibriumSearcher::from_config(&config, request.premium_model())?;
            info!(
                "equilibrium search: {} grid points, floor {:?}, objective {:?}, parallel {parallel}",
                config.search.grid.len(),
                config.search.fairness_floor,
                config.search.objective
            );
            let report =
                if parallel { searcher.search_par(config.seed)? } else { searcher.search(config.seed)? };
            info!(
                "evaluated {} of {} combinations ({} infeasible, {} below floor)",
                report.stats.evaluated,
                report.stats.combinations,
                report.stats.infeasible,
                report.stats.below_floor
            );
            if report.outcome.is_degenerate() {
                warn!("no admissible grid point; returning placeholder split");
            }
            print_json(&report)?;
        }

        Command::Scr { charges } => {
            let request = ScrRequest::from(charges);
            info!("scr: {request:?}");
            print_json(&run_scr(&request)?)?;
        }

        Command::Shock { scenario_id, charges } => {
            let request = ShockRequest { values: ScrRequest::from(charges), scenario_id };
            info!("shock {}: {:?}", request.scenario_id, request.values);
            print_json(&run_shock(&request)?)?;
        }

        Command::Scenarios => {
            for scenario in &SHOCK_CATALOGUE {
                println!("{:<22} {}", scenario.id, scenario.description);
            }
        }
    }

    Ok(())
}

/// Distribution summaries for a caller-chosen split. `loss_ratio` comes from a
/// fresh premium/claims draw at insurer A's base, taken after the profit run.
#[derive(Serialize)]
struct ClassicSummary {
    retentions: RetentionVector,
    ceded: f64,
    loss_ratio: f64,
    profits: Triple<ProfitSummary>,
}

fn check_summary_scenario(summary: bool, scenario: Scenario) -> anyhow::Result<()> {
    if summary && scenario != Scenario::Classic {
        bail!("--summary applies to the classic scenario only, got {scenario:?}");
    }
    Ok(())
}

fn triple(values: Option<&[f64]>, default: Triple<f64>) -> anyhow::Result<Triple<f64>> {
    match values {
        None => Ok(default),
        Some([a, b, c]) => Ok(Triple::new(*a, *b, *c)),
        Some(other) => bail!("expected three values, got {}", other.len()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulate_flags(args: &[&str]) -> (bool, Scenario) {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Simulate { summary, scenario, .. } => (summary, scenario),
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn summary_with_equilibrium_scenario_is_rejected() {
        let (summary, scenario) =
            simulate_flags(&["nashshield", "simulate", "--summary", "--scenario", "equilibrium"]);
        assert!(check_summary_scenario(summary, scenario).is_err());
    }

    #[test]
    fn summary_with_classic_scenario_is_accepted() {
        let (summary, scenario) = simulate_flags(&["nashshield", "simulate", "--summary"]);
        assert!(check_summary_scenario(summary, scenario).is_ok());
        let (summary, scenario) =
            simulate_flags(&["nashshield", "simulate", "--scenario", "equilibrium"]);
        assert!(check_summary_scenario(summary, scenario).is_ok());
    }

    #[test]
    fn three_retentions_are_parsed() {
        let cli =
            Cli::try_parse_from(["nashshield", "simulate", "--retentions", "0.3", "0.3", "0.4"]).unwrap();
        match cli.command {
            Command::Simulate { retentions, .. } => assert_eq!(retentions, vec![0.3, 0.3, 0.4]),
            _ => panic!("expected simulate"),
        }
    }
}
