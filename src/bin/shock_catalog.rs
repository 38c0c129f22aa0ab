use std::collections::BTreeMap;
use std::env;

use nashshield::scr::{RiskModule, RiskModuleVector};
use nashshield::shocks::{SHOCK_CATALOGUE, apply_shock};

fn main() {
    env_logger::init();

    // Optional module filter, e.g. `shock_catalog market`.
    let filter: Option<RiskModule> = env::args().nth(1).map(|name| {
        RiskModule::from_name(&name).unwrap_or_else(|| {
            eprintln!("error: unknown risk module {name}");
            std::process::exit(1);
        })
    });

    let baseline = RiskModuleVector::default();

    // Write NDJSON to stdout: one line per scenario with its impact on the default charges.
    let mut written = 0;
    for scenario in &SHOCK_CATALOGUE {
        if let Some(module) = filter
            && scenario.multiplier(module) == 1.0
        {
            continue;
        }
        let report = match apply_shock(&baseline, scenario.id) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {}: {e}", scenario.id);
                std::process::exit(1);
            }
        };
        let line = serde_json::json!({
            "scenario": scenario,
            "impact": report,
        });
        println!("{line}");
        written += 1;
    }
    log::info!("wrote {written} scenarios");

    // Per-module summary to stderr.
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut max_multiplier: BTreeMap<&str, f64> = BTreeMap::new();
    for scenario in &SHOCK_CATALOGUE {
        for &(module, k) in scenario.multipliers {
            *counts.entry(module.name()).or_insert(0) += 1;
            let cur = max_multiplier.entry(module.name()).or_insert(1.0);
            if k > *cur {
                *cur = k;
            }
        }
    }
    eprintln!("shock_catalog: {} scenarios", SHOCK_CATALOGUE.len());
    for (module, n) in &counts {
        eprintln!("  module={module:<13} scenarios={n:>2}  max_multiplier={:.3}", max_multiplier[module]);
    }
}
