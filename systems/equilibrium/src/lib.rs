#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Equilibrium controller keeping the wanderer pool at its target size.
//!
//! The controller binds to the host's urban characters and last-seen
//! internals when the session launches, tops up the host's own weekly spawn
//! once the player's clan is established, and retires the oldest available
//! wanderers every week once the pool reached its target.

mod binding;
mod diagnostics;
mod last_seen;
mod retirement;

pub use binding::{BindingError, Bindings};
pub use diagnostics::WandererCensus;
pub use retirement::RetirementStrategy;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::{debug, info, warn};
use wanderer_tweaks_core::{CampaignContext, Command, Event, EventKind, FieldSlot, HeroId};

/// Configuration parameters required to construct the controller.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    wanderers_to_spawn: u32,
    spawn_more_tier: u32,
    settlement_cooldown_weeks: f32,
    accelerated_spawn_frequency_weeks: f32,
    strategy: RetirementStrategy,
    diagnostics: bool,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration using the default policy with the provided strategy and seed.
    #[must_use]
    pub const fn new(strategy: RetirementStrategy, rng_seed: u64) -> Self {
        Self {
            wanderers_to_spawn: 2,
            spawn_more_tier: 2,
            settlement_cooldown_weeks: 2.0,
            accelerated_spawn_frequency_weeks: 0.0,
            strategy,
            diagnostics: false,
            rng_seed,
        }
    }

    /// Enables or disables the daily census message.
    #[must_use]
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Replaces the retirement strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: RetirementStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replaces the seed used for template selection.
    #[must_use]
    pub fn with_rng_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = rng_seed;
        self
    }

    /// Wanderers spawned per week, and retired per week once the pool is full.
    #[must_use]
    pub const fn wanderers_to_spawn(&self) -> u32 {
        self.wanderers_to_spawn
    }

    /// Player clan tier from which the controller spawns extra wanderers.
    #[must_use]
    pub const fn spawn_more_tier(&self) -> u32 {
        self.spawn_more_tier
    }

    /// Retirement strategy.
    #[must_use]
    pub const fn strategy(&self) -> RetirementStrategy {
        self.strategy
    }

    /// Whether the daily census message is shown.
    #[must_use]
    pub const fn diagnostics(&self) -> bool {
        self.diagnostics
    }

    /// Seed used for template selection.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(RetirementStrategy::Kill, 0x9e37_79b9_7f4a_7c15)
    }
}

/// Whether newly created wanderers are still being counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountingLatch {
    /// The pool is below target; every new wanderer is counted.
    Counting,
    /// The pool reached its target. Never reverts within a session.
    Latched,
}

/// Whether the host's spawn cadence has been accelerated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CadenceLatch {
    /// The host spawns at its own pace.
    Slow,
    /// The host spawns every week. Never reverts within a session.
    Fast,
}

/// Event-driven controller that keeps the wanderer pool in equilibrium.
#[derive(Debug)]
pub struct Equilibrium {
    config: Config,
    rng: ChaCha8Rng,
    bindings: Option<Bindings>,
    available_wanderer_count: usize,
    target_wanderer_count: usize,
    counting: CountingLatch,
    cadence: CadenceLatch,
}

impl Equilibrium {
    /// Creates an unbound controller using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            bindings: None,
            available_wanderer_count: 0,
            target_wanderer_count: 0,
            counting: CountingLatch::Counting,
            cadence: CadenceLatch::Slow,
        }
    }

    /// Configuration the controller was created with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Host internals resolved at session launch, if any.
    #[must_use]
    pub fn bindings(&self) -> Option<&Bindings> {
        self.bindings.as_ref()
    }

    /// Reports whether the session launch has been processed.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bindings.is_some()
    }

    /// Available wanderers counted so far.
    #[must_use]
    pub const fn available_wanderer_count(&self) -> usize {
        self.available_wanderer_count
    }

    /// Pool size the controller maintains.
    #[must_use]
    pub const fn target_wanderer_count(&self) -> usize {
        self.target_wanderer_count
    }

    /// State of the arrival counter.
    #[must_use]
    pub const fn counting(&self) -> CountingLatch {
        self.counting
    }

    /// State of the host's spawn cadence.
    #[must_use]
    pub const fn cadence(&self) -> CadenceLatch {
        self.cadence
    }

    /// Reports whether the pool reached its target.
    #[must_use]
    pub fn shall_retire(&self) -> bool {
        self.is_bound() && self.available_wanderer_count >= self.target_wanderer_count
    }

    /// Reports whether the player's clan is established enough for extra spawns.
    #[must_use]
    pub fn shall_spawn_more<C>(&self, campaign: &C) -> bool
    where
        C: CampaignContext + ?Sized,
    {
        campaign.clan_tier(campaign.player_clan()) >= self.config.spawn_more_tier
    }

    /// Reports whether events of the given kind are currently delivered to the controller.
    ///
    /// Hero creation and clan tier subscriptions only exist between binding
    /// and their respective latch; once dropped they never come back.
    #[must_use]
    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::SessionLaunched | EventKind::WeeklyTick | EventKind::SettlementEntered => {
                true
            }
            EventKind::DailyTick => self.config.diagnostics,
            EventKind::HeroCreated => self.is_bound() && self.counting == CountingLatch::Counting,
            EventKind::ClanTierIncreased => self.is_bound() && self.cadence == CadenceLatch::Slow,
            EventKind::HeroKilled | EventKind::SettlementLeft => false,
        }
    }

    /// Consumes host events and emits the commands that keep the pool in equilibrium.
    ///
    /// Subscriptions are re-checked for every event, so a latch that trips
    /// halfway through a batch stops delivery of the rest of it. Binding
    /// failures abort the call; the controller then stays unbound.
    pub fn handle<C>(
        &mut self,
        events: &[Event],
        campaign: &C,
        out: &mut Vec<Command>,
    ) -> Result<(), BindingError>
    where
        C: CampaignContext + ?Sized,
    {
        for event in events {
            if !self.is_subscribed(event.kind()) {
                continue;
            }

            match event {
                Event::SessionLaunched => self.bind(campaign, out)?,
                Event::WeeklyTick => self.weekly_tick(campaign, out),
                Event::HeroCreated { hero, .. } => self.hero_created(*hero, campaign),
                Event::ClanTierIncreased { .. } => self.clan_tier_increased(campaign, out),
                Event::SettlementEntered { hero, .. } => {
                    if let Some(bindings) = &self.bindings {
                        last_seen::patch(campaign, bindings.heroes_to_check(), *hero, out);
                    }
                }
                Event::DailyTick => diagnostics::report(campaign, out),
                Event::HeroKilled { .. } | Event::SettlementLeft { .. } => {}
            }
        }
        Ok(())
    }

    fn bind<C>(&mut self, campaign: &C, out: &mut Vec<Command>) -> Result<(), BindingError>
    where
        C: CampaignContext + ?Sized,
    {
        if self.bindings.is_some() {
            warn!("session launched twice; keeping the existing bindings");
            return Ok(());
        }

        let bindings = Bindings::resolve(campaign, self.config.strategy)?;
        self.target_wanderer_count = bindings.target_wanderer_count();
        self.available_wanderer_count = campaign
            .heroes()
            .iter()
            .filter(|hero| hero.is_available_wanderer())
            .count();
        if self.available_wanderer_count >= self.target_wanderer_count {
            self.counting = CountingLatch::Latched;
        }

        out.push(Command::WriteFloatField {
            slot: bindings.settlement_cooldown(),
            value: self.config.settlement_cooldown_weeks,
        });
        let spawn_frequency = bindings.spawn_frequency();
        info!(
            templates = bindings.templates().len(),
            target = self.target_wanderer_count,
            available = self.available_wanderer_count,
            strategy = ?self.config.strategy,
            "wanderer equilibrium bound"
        );
        self.bindings = Some(bindings);

        if self.shall_spawn_more(campaign) {
            self.accelerate_spawning(spawn_frequency, out);
        }
        Ok(())
    }

    fn weekly_tick<C>(&mut self, campaign: &C, out: &mut Vec<Command>)
    where
        C: CampaignContext + ?Sized,
    {
        let spawn_more = self.shall_spawn_more(campaign);
        let retire = self.shall_retire();
        let Some(bindings) = &self.bindings else {
            debug!("weekly tick before session launch ignored");
            return;
        };

        if spawn_more {
            // The host spawns one wanderer per cycle on its own.
            let extra = self.config.wanderers_to_spawn.saturating_sub(1);
            for _ in 0..extra {
                let Some(template) = bindings.templates().choose(&mut self.rng) else {
                    warn!("no companion templates to spawn from");
                    break;
                };
                out.push(Command::CreateCompanion {
                    template: *template,
                });
            }
            debug!(extra, "extra wanderers requested");
        }

        if retire {
            let heroes = campaign.heroes();
            let retirees =
                retirement::select_retirees(&heroes, self.config.wanderers_to_spawn as usize);
            retirement::retire(bindings.retirement(), &retirees, out);
        }
    }

    fn hero_created<C>(&mut self, hero: HeroId, campaign: &C)
    where
        C: CampaignContext + ?Sized,
    {
        if !campaign.hero(hero).is_some_and(|hero| hero.is_wanderer) {
            return;
        }

        self.available_wanderer_count += 1;
        if self.shall_retire() {
            self.counting = CountingLatch::Latched;
            info!(
                available = self.available_wanderer_count,
                "wanderer pool reached its target; arrivals no longer counted"
            );
        }
    }

    fn clan_tier_increased<C>(&mut self, campaign: &C, out: &mut Vec<Command>)
    where
        C: CampaignContext + ?Sized,
    {
        if !self.shall_spawn_more(campaign) {
            return;
        }
        if let Some(slot) = self.bindings.as_ref().map(Bindings::spawn_frequency) {
            self.accelerate_spawning(slot, out);
        }
    }

    fn accelerate_spawning(&mut self, slot: FieldSlot, out: &mut Vec<Command>) {
        out.push(Command::WriteFloatField {
            slot,
            value: self.config.accelerated_spawn_frequency_weeks,
        });
        self.cadence = CadenceLatch::Fast;
        info!(
            weeks = self.config.accelerated_spawn_frequency_weeks,
            "wanderer spawn cadence accelerated"
        );
    }
}
