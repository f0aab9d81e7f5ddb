#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a scripted campaign with the wanderer equilibrium installed.

mod scenario;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use wanderer_tweaks_system_equilibrium::RetirementStrategy;

use crate::{scenario::Scenario, session::Session};

/// Plays a campaign scenario and reports the state of the wanderer pool.
#[derive(Debug, Parser)]
#[command(name = "wanderer-tweaks", version, about)]
struct Args {
    /// Scenario file to load; the built-in defaults are used when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Overrides the number of weeks to play.
    #[arg(long)]
    weeks: Option<u32>,
    /// Overrides the seeds of both the campaign and the controller.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides how surplus wanderers are retired.
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,
    /// Displays the daily wanderer census.
    #[arg(long)]
    diagnostics: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    /// Removes retirees from the campaign.
    Kill,
    /// Keeps retirees alive but out of circulation.
    Disable,
}

impl From<StrategyArg> for RetirementStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Kill => Self::Kill,
            StrategyArg::Disable => Self::Disable,
        }
    }
}

impl Args {
    fn scenario(&self) -> Result<Scenario> {
        let mut scenario = match &self.scenario {
            Some(path) => Scenario::load(path)?,
            None => Scenario::default(),
        };

        if let Some(weeks) = self.weeks {
            scenario.weeks = weeks;
        }
        if let Some(seed) = self.seed {
            scenario.campaign.rng_seed = seed;
            scenario.equilibrium = scenario.equilibrium.with_rng_seed(seed);
        }
        if let Some(strategy) = self.strategy {
            scenario.equilibrium = scenario.equilibrium.with_strategy(strategy.into());
        }
        if self.diagnostics {
            scenario.equilibrium = scenario.equilibrium.with_diagnostics(true);
        }
        Ok(scenario)
    }
}

/// Entry point for the Wanderer Tweaks command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let scenario = args.scenario()?;
    let mut session = Session::from_scenario(&scenario)?;
    session.play(&scenario)?;
    println!("{}", session.summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_scenario() {
        let args = Args::parse_from([
            "wanderer-tweaks",
            "--weeks",
            "3",
            "--seed",
            "42",
            "--strategy",
            "disable",
            "--diagnostics",
        ]);

        let scenario = args.scenario().expect("default scenario");
        assert_eq!(scenario.weeks, 3);
        assert_eq!(scenario.campaign.rng_seed, 42);
        assert_eq!(scenario.equilibrium.rng_seed(), 42);
        assert_eq!(scenario.equilibrium.strategy(), RetirementStrategy::Disable);
        assert!(scenario.equilibrium.diagnostics());
    }

    #[test]
    fn missing_scenario_file_is_an_error() {
        let args = Args::parse_from(["wanderer-tweaks", "--scenario", "does/not/exist.toml"]);
        assert!(args.scenario().is_err());
    }
}
