//! Scenario files describing a scripted campaign.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use wanderer_tweaks_system_equilibrium::Config;
use wanderer_tweaks_world::CampaignSetup;

/// Campaign, controller configuration and the script driving a session.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Number of weeks to simulate after the session launches.
    pub(crate) weeks: u32,
    /// Weeks at whose end the player's clan gains a tier, counted from one.
    pub(crate) tier_increase_weeks: Vec<u32>,
    /// Whether the player visits a settlement at the end of every week.
    pub(crate) visit_settlements: bool,
    /// Host campaign parameters.
    pub(crate) campaign: CampaignSetup,
    /// Controller configuration.
    pub(crate) equilibrium: Config,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            weeks: 52,
            tier_increase_weeks: Vec::new(),
            visit_settlements: true,
            campaign: CampaignSetup::default(),
            equilibrium: Config::default(),
        }
    }
}

impl Scenario {
    /// Reads a scenario from a TOML file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Parses a scenario from TOML text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse scenario TOML")
    }

    /// Reports whether the player's clan gains a tier at the end of the given week.
    #[must_use]
    pub(crate) fn promotes_after(&self, week: u32) -> bool {
        self.tier_increase_weeks.contains(&week)
    }
}
