//! Drives a campaign and the equilibrium controller through a scripted session.

use std::fmt;

use anyhow::{Context, Result};
use tracing::{debug, info};
use wanderer_tweaks_core::Command;
use wanderer_tweaks_system_equilibrium::{
    CadenceLatch, CountingLatch, Equilibrium, WandererCensus,
};
use wanderer_tweaks_world::{self as world, query, World};

use crate::scenario::Scenario;

const DAYS_PER_WEEK: u32 = 7;

/// Host campaign paired with the controller registered against it.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    equilibrium: Equilibrium,
    log: Vec<Command>,
}

impl Session {
    /// Builds the campaign and registers the controller.
    pub(crate) fn from_scenario(scenario: &Scenario) -> Result<Self> {
        let world = World::from_setup(scenario.campaign.clone())
            .context("failed to build campaign from scenario")?;
        Ok(Self {
            world,
            equilibrium: Equilibrium::new(scenario.equilibrium),
            log: Vec::new(),
        })
    }

    /// Launches the session and plays every scripted week.
    pub(crate) fn play(&mut self, scenario: &Scenario) -> Result<()> {
        self.dispatch(Command::LaunchSession)?;

        for week in 1..=scenario.weeks {
            for _ in 0..DAYS_PER_WEEK {
                self.dispatch(Command::AdvanceDay)?;
            }
            if scenario.promotes_after(week) {
                let clan = query::player_clan(&self.world);
                self.dispatch(Command::IncreaseClanTier { clan })?;
            }
            if scenario.visit_settlements {
                self.visit(week)?;
            }
        }
        Ok(())
    }

    fn visit(&mut self, week: u32) -> Result<()> {
        let settlements = query::settlements(&self.world);
        if settlements.is_empty() {
            return Ok(());
        }
        let settlement = settlements[week as usize % settlements.len()];
        self.dispatch(Command::EnterSettlement {
            party: query::player_party(&self.world),
            settlement,
            hero: Some(query::player_hero(&self.world)),
        })
    }

    /// Applies a command, then pumps events and controller commands until both sides settle.
    fn dispatch(&mut self, command: Command) -> Result<()> {
        let mut pending = vec![command];

        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }

            let mut commands = Vec::new();
            self.equilibrium
                .handle(&events, &self.world, &mut commands)
                .context("controller failed to bind against the campaign")?;
            if !commands.is_empty() {
                debug!(
                    day = query::day(&self.world),
                    commands = commands.len(),
                    "controller responded"
                );
            }
            self.log.extend(commands.iter().cloned());
            pending = commands;
        }
        Ok(())
    }

    /// Captures the end-of-session state.
    #[must_use]
    pub(crate) fn summary(&self) -> Summary {
        let summary = Summary {
            day: query::day(&self.world),
            census: WandererCensus::take(&query::hero_view(&self.world)),
            target: self.equilibrium.target_wanderer_count(),
            counting: self.equilibrium.counting(),
            cadence: self.equilibrium.cadence(),
            retired: self
                .log
                .iter()
                .filter(|command| {
                    matches!(
                        command,
                        Command::KillByRemove { .. } | Command::RemoveFromHeroList { .. }
                    )
                })
                .count(),
            messages: query::messages(&self.world).len(),
        };
        info!(day = summary.day, retired = summary.retired, "session finished");
        summary
    }
}

/// End-of-session report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) day: u32,
    pub(crate) census: WandererCensus,
    pub(crate) target: usize,
    pub(crate) counting: CountingLatch,
    pub(crate) cadence: CadenceLatch,
    pub(crate) retired: usize,
    pub(crate) messages: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "day {}", self.day)?;
        writeln!(f, "{}", self.census.message())?;
        writeln!(f, "target pool: {}", self.target)?;
        writeln!(f, "counting: {:?}, cadence: {:?}", self.counting, self.cadence)?;
        write!(f, "retired: {}, messages: {}", self.retired, self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(text: &str) -> Summary {
        let scenario = Scenario::parse(text).expect("valid scenario");
        let mut session = Session::from_scenario(&scenario).expect("valid campaign");
        session.play(&scenario).expect("session plays");
        session.summary()
    }

    #[test]
    fn empty_session_only_launches() {
        let summary = play("weeks = 0");

        assert_eq!(summary.day, 0);
        assert_eq!(summary.target, 11);
        assert_eq!(summary.counting, CountingLatch::Counting);
        assert_eq!(summary.retired, 0);
    }

    #[test]
    fn latched_pool_retires_two_wanderers_each_week() {
        let summary = play(
            r#"
            weeks = 2

            [campaign]
            template_count = 1
            target_companion_number = 1.0
            spawn_frequency_weeks = 50.0
            wanderers = [{}, {}, {}, {}, {}]
            "#,
        );

        assert_eq!(summary.day, 14);
        assert_eq!(summary.target, 2);
        assert_eq!(summary.counting, CountingLatch::Latched);
        assert_eq!(summary.retired, 4);
        assert_eq!(summary.census.available, 1);
    }

    #[test]
    fn scripted_promotion_accelerates_cadence() {
        let summary = play(
            r#"
            weeks = 3
            tier_increase_weeks = [1]
            "#,
        );

        assert_eq!(summary.cadence, CadenceLatch::Fast);
    }

    #[test]
    fn diagnostics_fill_the_message_log() {
        let summary = play(
            r#"
            weeks = 1

            [equilibrium]
            diagnostics = true
            "#,
        );

        assert_eq!(summary.messages, 7);
    }

    #[test]
    fn missing_settlements_are_reported() {
        let scenario = Scenario::parse("[campaign]\nsettlement_count = 0").expect("parse");
        assert!(Session::from_scenario(&scenario).is_err());
    }

    #[test]
    fn summary_lists_the_census() {
        let text = play("weeks = 1").to_string();

        assert!(text.starts_with("day 7\n"));
        assert!(text.contains("Equilibrium: wanderers available/alive/total="));
    }
}
