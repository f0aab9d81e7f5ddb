#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative campaign state hosting the Wanderer Tweaks controller.
//!
//! The world owns every hero, clan and settlement, runs the built-in
//! behaviours that spawn, place and track wanderers, and broadcasts events
//! after each command it executes.

mod fields;

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use wanderer_tweaks_core::{
    Behavior, CampaignContext, ClanId, Command, Event, FieldSlot, FieldValue, HeroId,
    HeroSnapshot, HeroState, HeroView, PartyId, SettlementId, TemplateId,
};

const PLAYER_HERO: HeroId = HeroId::new(0);
const PLAYER_CLAN: ClanId = ClanId::new(0);
const PLAYER_PARTY: PartyId = PartyId::new(0);
const DAYS_PER_WEEK: u32 = 7;

/// Parameters used to populate a fresh campaign.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CampaignSetup {
    /// Number of companion templates published at session launch.
    pub template_count: u32,
    /// Target size of the wanderer pool configured on the urban characters behaviour.
    pub target_companion_number: f32,
    /// Weeks between two companions spawned by the urban characters behaviour.
    pub spawn_frequency_weeks: f32,
    /// Weeks a settlement waits before hosting another newly placed companion.
    pub settlement_cooldown_weeks: f32,
    /// Number of settlements on the map.
    pub settlement_count: u32,
    /// Tier of the player's clan at the start of the campaign.
    pub player_clan_tier: u32,
    /// Wanderers present before the session launches, oldest first.
    pub wanderers: Vec<WandererSeed>,
    /// Seed driving every random choice made by the host.
    pub rng_seed: u64,
}

impl Default for CampaignSetup {
    fn default() -> Self {
        Self {
            template_count: 5,
            target_companion_number: 6.4,
            spawn_frequency_weeks: 6.0,
            settlement_cooldown_weeks: 6.0,
            settlement_count: 4,
            player_clan_tier: 1,
            wanderers: Vec::new(),
            rng_seed: 0x5eed_cafe_f00d_d00d,
        }
    }
}

/// Description of a wanderer present when the campaign starts.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WandererSeed {
    /// Lifecycle state of the wanderer.
    pub state: HeroState,
    /// Whether the wanderer already serves the player's clan.
    pub hired: bool,
    /// Settlement the wanderer calls home.
    pub home: Option<SettlementId>,
    /// Settlement the wanderer currently stays in.
    pub staying_in: Option<SettlementId>,
}

impl Default for WandererSeed {
    fn default() -> Self {
        Self {
            state: HeroState::Active,
            hired: false,
            home: Some(SettlementId::new(0)),
            staying_in: None,
        }
    }
}

/// Reasons a [`CampaignSetup`] cannot be turned into a world.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SetupError {
    /// The map must contain at least one settlement.
    #[error("campaign requires at least one settlement")]
    NoSettlements,
    /// A wanderer seed references a settlement that does not exist.
    #[error("wanderer seed {index} references unknown settlement {settlement:?}")]
    UnknownSettlement {
        /// Position of the offending seed.
        index: usize,
        /// Settlement that could not be found.
        settlement: SettlementId,
    },
}

/// Cached record describing where a hero was last seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LastSeenRecord {
    /// Settlement the record refers to.
    pub settlement: SettlementId,
    /// Whether the hero was seen near the settlement rather than in it.
    pub is_nearby: bool,
}

/// Represents the authoritative campaign state.
#[derive(Debug)]
pub struct World {
    heroes: Vec<Hero>,
    clans: Vec<Clan>,
    settlements: Vec<Settlement>,
    urban: UrbanCharacters,
    last_seen: LastSeenUpdater,
    messages: Vec<String>,
    day: u32,
    launched: bool,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a campaign populated from the default setup.
    #[must_use]
    pub fn new() -> Self {
        Self::build(CampaignSetup::default())
    }

    /// Creates a campaign populated from the provided setup.
    pub fn from_setup(setup: CampaignSetup) -> Result<Self, SetupError> {
        if setup.settlement_count == 0 {
            return Err(SetupError::NoSettlements);
        }

        for (index, seed) in setup.wanderers.iter().enumerate() {
            for settlement in [seed.home, seed.staying_in].into_iter().flatten() {
                if settlement.get() >= setup.settlement_count {
                    return Err(SetupError::UnknownSettlement { index, settlement });
                }
            }
        }

        Ok(Self::build(setup))
    }

    fn build(setup: CampaignSetup) -> Self {
        let mut world = Self {
            heroes: vec![Hero::player()],
            clans: vec![Clan {
                id: PLAYER_CLAN,
                tier: setup.player_clan_tier,
            }],
            settlements: (0..setup.settlement_count)
                .map(|index| Settlement::new(SettlementId::new(index)))
                .collect(),
            urban: UrbanCharacters {
                pending_templates: (0..setup.template_count).map(TemplateId::new).collect(),
                companion_templates: Vec::new(),
                companions: Vec::new(),
                target_companion_number: setup.target_companion_number,
                spawn_frequency_weeks: setup.spawn_frequency_weeks,
                settlement_cooldown_weeks: setup.settlement_cooldown_weeks,
                weeks_since_spawn: 0.0,
            },
            last_seen: LastSeenUpdater::default(),
            messages: Vec::new(),
            day: 0,
            launched: false,
            rng: ChaCha8Rng::seed_from_u64(setup.rng_seed),
        };

        for seed in setup.wanderers {
            let id = world.next_hero_id();
            let companion_of = seed.hired.then_some(PLAYER_CLAN);
            let staying_in = seed.staying_in;
            world.heroes.push(Hero {
                id,
                is_wanderer: true,
                is_human_player: false,
                template: None,
                companion_of,
                state: seed.state,
                staying_in,
                home: seed.home,
                last_seen_place: staying_in,
                cached_last_seen: None,
            });
            if companion_of.is_none() {
                world.urban.companions.push(id);
            }
            if let Some(settlement) = staying_in.and_then(|place| world.settlement_mut(place)) {
                settlement.notables.push(id);
            }
        }

        world
    }

    fn next_hero_id(&self) -> HeroId {
        HeroId::new(self.heroes.len() as u32)
    }

    fn hero_mut(&mut self, id: HeroId) -> Option<&mut Hero> {
        self.heroes.get_mut(id.get() as usize)
    }

    fn hero_ref(&self, id: HeroId) -> Option<&Hero> {
        self.heroes.get(id.get() as usize)
    }

    fn settlement_mut(&mut self, id: SettlementId) -> Option<&mut Settlement> {
        self.settlements.get_mut(id.get() as usize)
    }

    fn week(&self) -> u32 {
        self.day / DAYS_PER_WEEK
    }

    fn launch_session(&mut self, out_events: &mut Vec<Event>) {
        if self.launched {
            warn!("session already launched");
            return;
        }

        self.launched = true;
        self.urban.companion_templates = std::mem::take(&mut self.urban.pending_templates);
        self.last_seen.heroes_to_check = self
            .heroes
            .iter()
            .filter(|hero| hero.state != HeroState::Dead)
            .map(|hero| hero.id)
            .collect();
        info!(
            templates = self.urban.companion_templates.len(),
            heroes = self.heroes.len(),
            "campaign session launched"
        );
        out_events.push(Event::SessionLaunched);
    }

    fn advance_day(&mut self, out_events: &mut Vec<Event>) {
        self.day = self.day.saturating_add(1);
        out_events.push(Event::DailyTick);

        if self.day % DAYS_PER_WEEK == 0 {
            self.spawn_weekly_companion(out_events);
            out_events.push(Event::WeeklyTick);
        }
    }

    fn spawn_weekly_companion(&mut self, out_events: &mut Vec<Event>) {
        self.urban.weeks_since_spawn += 1.0;
        if self.urban.weeks_since_spawn < self.urban.spawn_frequency_weeks {
            return;
        }

        let Some(template) = self.urban.companion_templates.choose(&mut self.rng).copied() else {
            return;
        };
        self.urban.weeks_since_spawn = 0.0;
        let hero = self.create_companion(template, out_events);
        debug!(%hero, template = template.get(), "weekly companion spawned");
    }

    fn create_companion(&mut self, template: TemplateId, out_events: &mut Vec<Event>) -> HeroId {
        let id = self.next_hero_id();
        let home = if self.settlements.is_empty() {
            None
        } else {
            let index = self.rng.gen_range(0..self.settlements.len());
            Some(self.settlements[index].id)
        };

        self.heroes.push(Hero {
            id,
            is_wanderer: true,
            is_human_player: false,
            template: Some(template),
            companion_of: None,
            state: HeroState::NotSpawned,
            staying_in: None,
            home,
            last_seen_place: None,
            cached_last_seen: None,
        });
        self.urban.companions.push(id);
        if self.launched {
            self.last_seen.heroes_to_check.push(id);
        }

        out_events.push(Event::HeroCreated {
            hero: id,
            is_natural: false,
        });
        id
    }

    fn enter_settlement(
        &mut self,
        party: PartyId,
        settlement: SettlementId,
        hero: Option<HeroId>,
        out_events: &mut Vec<Event>,
    ) {
        if self.settlement_mut(settlement).is_none() {
            warn!(settlement = settlement.get(), "unknown settlement entered");
            return;
        }

        let entrant_is_player = hero
            .and_then(|id| self.hero_ref(id))
            .is_some_and(|hero| hero.is_human_player);

        if entrant_is_player {
            if let Some(player) = self.hero_mut(PLAYER_HERO) {
                player.last_seen_place = Some(settlement);
            }
            self.place_wanderer(settlement);
            self.sync_last_seen();
        }

        out_events.push(Event::SettlementEntered {
            party,
            settlement,
            hero,
        });
    }

    fn place_wanderer(&mut self, settlement: SettlementId) {
        let week = self.week();
        let cooldown = self.urban.settlement_cooldown_weeks;
        let eligible = self
            .settlements
            .get(settlement.get() as usize)
            .is_some_and(|entry| {
                entry
                    .last_companion_week
                    .map_or(true, |last| (week - last) as f32 >= cooldown)
            });
        if !eligible {
            return;
        }

        let unplaced = |hero: &&Hero| hero.state == HeroState::NotSpawned && hero.is_wanderer;
        let candidates: Vec<&Hero> = self
            .urban
            .companions
            .iter()
            .filter_map(|id| self.heroes.get(id.get() as usize))
            .filter(unplaced)
            .collect();
        let chosen = candidates
            .iter()
            .find(|hero| hero.home == Some(settlement))
            .or_else(|| candidates.first())
            .map(|hero| hero.id);
        let Some(id) = chosen else {
            return;
        };

        if let Some(hero) = self.hero_mut(id) {
            hero.state = HeroState::Active;
            hero.staying_in = Some(settlement);
            hero.last_seen_place = Some(settlement);
        }
        if let Some(entry) = self.settlement_mut(settlement) {
            entry.notables.push(id);
            entry.last_companion_week = Some(week);
        }
        debug!(hero = %id, settlement = settlement.get(), "wanderer placed");
    }

    fn sync_last_seen(&mut self) {
        for index in 0..self.last_seen.heroes_to_check.len() {
            let id = self.last_seen.heroes_to_check[index];
            let Some(hero) = self.hero_mut(id) else {
                continue;
            };
            let record = if hero.state == HeroState::NotSpawned {
                hero.home
            } else {
                hero.staying_in.or(hero.last_seen_place)
            };
            if let Some(settlement) = record {
                hero.cached_last_seen = Some(LastSeenRecord {
                    settlement,
                    is_nearby: false,
                });
            }
        }
    }

    fn increase_clan_tier(&mut self, clan: ClanId, out_events: &mut Vec<Event>) {
        let Some(entry) = self.clans.iter_mut().find(|entry| entry.id == clan) else {
            warn!(clan = clan.get(), "tier increase for unknown clan");
            return;
        };
        entry.tier = entry.tier.saturating_add(1);
        info!(clan = clan.get(), tier = entry.tier, "clan tier increased");
        out_events.push(Event::ClanTierIncreased {
            clan,
            tier: entry.tier,
        });
    }

    fn recruit_companion(&mut self, id: HeroId, clan: ClanId, out_events: &mut Vec<Event>) {
        let available = self
            .hero_ref(id)
            .is_some_and(|hero| hero.snapshot().is_available_wanderer());
        if !available {
            warn!(hero = %id, "hero cannot be recruited");
            return;
        }

        self.leave_settlement(id, out_events);
        if let Some(hero) = self.hero_mut(id) {
            hero.companion_of = Some(clan);
            hero.state = HeroState::Active;
        }
        self.urban.companions.retain(|companion| *companion != id);
        debug!(hero = %id, clan = clan.get(), "companion recruited");
    }

    fn change_hero_state(&mut self, id: HeroId, state: HeroState) {
        match self.hero_mut(id) {
            Some(hero) => hero.state = state,
            None => warn!(hero = %id, "state change for unknown hero"),
        }
    }

    fn leave_settlement(&mut self, id: HeroId, out_events: &mut Vec<Event>) {
        let Some(settlement) = self.hero_mut(id).and_then(|hero| hero.staying_in.take()) else {
            return;
        };
        if let Some(entry) = self.settlement_mut(settlement) {
            entry.notables.retain(|notable| *notable != id);
        }
        out_events.push(Event::SettlementLeft {
            hero: id,
            settlement,
        });
    }

    fn kill_by_remove(&mut self, id: HeroId, out_events: &mut Vec<Event>) {
        let Some(hero) = self.hero_mut(id) else {
            warn!(hero = %id, "kill requested for unknown hero");
            return;
        };
        if hero.state == HeroState::Dead {
            return;
        }

        // Settlement notables are left untouched; callers must leave first.
        hero.state = HeroState::Dead;
        self.urban.companions.retain(|companion| *companion != id);
        self.last_seen.heroes_to_check.retain(|checked| *checked != id);
        debug!(hero = %id, "hero removed from play");
        out_events.push(Event::HeroKilled { hero: id });
    }

    fn write_float_field(&mut self, slot: FieldSlot, value: f32) {
        if fields::write_float(self, slot, value) {
            debug!(slot = slot.index(), value, "float field written");
        } else {
            warn!(slot = slot.index(), "float write to non-scalar slot ignored");
        }
    }

    fn remove_from_hero_list(&mut self, slot: FieldSlot, id: HeroId) {
        match fields::hero_list_mut(self, slot) {
            Some(list) => list.retain(|entry| *entry != id),
            None => warn!(slot = slot.index(), "hero list removal on non-list slot ignored"),
        }
    }

    fn cache_last_seen(&mut self, id: HeroId, settlement: SettlementId, is_nearby: bool) {
        if let Some(hero) = self.hero_mut(id) {
            hero.cached_last_seen = Some(LastSeenRecord {
                settlement,
                is_nearby,
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignContext for World {
    fn heroes(&self) -> HeroView {
        query::hero_view(self)
    }

    fn hero(&self, id: HeroId) -> Option<HeroSnapshot> {
        self.hero_ref(id).map(Hero::snapshot)
    }

    fn player_clan(&self) -> ClanId {
        PLAYER_CLAN
    }

    fn clan_tier(&self, clan: ClanId) -> u32 {
        query::clan_tier(self, clan)
    }

    fn lookup_field(&self, behavior: Behavior, name: &str) -> Option<FieldSlot> {
        fields::lookup(behavior, name)
    }

    fn field(&self, slot: FieldSlot) -> Option<FieldValue<'_>> {
        fields::read(self, slot)
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LaunchSession => world.launch_session(out_events),
        Command::AdvanceDay => world.advance_day(out_events),
        Command::EnterSettlement {
            party,
            settlement,
            hero,
        } => world.enter_settlement(party, settlement, hero, out_events),
        Command::IncreaseClanTier { clan } => world.increase_clan_tier(clan, out_events),
        Command::RecruitCompanion { hero, clan } => world.recruit_companion(hero, clan, out_events),
        Command::CreateCompanion { template } => {
            let hero = world.create_companion(template, out_events);
            debug!(%hero, template = template.get(), "companion created on request");
        }
        Command::ChangeHeroState { hero, state } => world.change_hero_state(hero, state),
        Command::LeaveSettlement { hero } => world.leave_settlement(hero, out_events),
        Command::KillByRemove { hero } => world.kill_by_remove(hero, out_events),
        Command::WriteFloatField { slot, value } => world.write_float_field(slot, value),
        Command::RemoveFromHeroList { slot, hero } => world.remove_from_hero_list(slot, hero),
        Command::CacheLastSeen {
            hero,
            settlement,
            is_nearby,
        } => world.cache_last_seen(hero, settlement, is_nearby),
        Command::DisplayMessage { text } => {
            info!(target: "messages", "{text}");
            world.messages.push(text);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{Hero, LastSeenRecord, World, PLAYER_CLAN, PLAYER_HERO, PLAYER_PARTY};
    use wanderer_tweaks_core::{ClanId, HeroId, HeroView, PartyId, SettlementId, TemplateId};

    /// Captures a read-only view of every hero, oldest first.
    #[must_use]
    pub fn hero_view(world: &World) -> HeroView {
        HeroView::from_snapshots(world.heroes.iter().map(Hero::snapshot).collect())
    }

    /// Hero controlled by the human player.
    #[must_use]
    pub fn player_hero(_world: &World) -> HeroId {
        PLAYER_HERO
    }

    /// Party led by the human player.
    #[must_use]
    pub fn player_party(_world: &World) -> PartyId {
        PLAYER_PARTY
    }

    /// Clan led by the human player.
    #[must_use]
    pub fn player_clan(_world: &World) -> ClanId {
        PLAYER_CLAN
    }

    /// Current tier of a clan; unknown clans report tier zero.
    #[must_use]
    pub fn clan_tier(world: &World, clan: ClanId) -> u32 {
        world
            .clans
            .iter()
            .find(|entry| entry.id == clan)
            .map_or(0, |entry| entry.tier)
    }

    /// Every settlement on the map, in id order.
    #[must_use]
    pub fn settlements(world: &World) -> Vec<SettlementId> {
        world.settlements.iter().map(|entry| entry.id).collect()
    }

    /// Heroes listed as staying in a settlement.
    #[must_use]
    pub fn settlement_notables(world: &World, settlement: SettlementId) -> &[HeroId] {
        world
            .settlements
            .get(settlement.get() as usize)
            .map(|entry| entry.notables.as_slice())
            .unwrap_or(&[])
    }

    /// Templates the urban characters behaviour spawns companions from.
    #[must_use]
    pub fn companion_templates(world: &World) -> &[TemplateId] {
        &world.urban.companion_templates
    }

    /// Template a hero was created from, if it was created by a behaviour.
    #[must_use]
    pub fn hero_template(world: &World, hero: HeroId) -> Option<TemplateId> {
        world.hero_ref(hero).and_then(|hero| hero.template)
    }

    /// Wanderers tracked by the urban characters behaviour.
    #[must_use]
    pub fn companions(world: &World) -> &[HeroId] {
        &world.urban.companions
    }

    /// Heroes whose last-seen record is refreshed by the tracker.
    #[must_use]
    pub fn heroes_to_check(world: &World) -> &[HeroId] {
        &world.last_seen.heroes_to_check
    }

    /// Weeks between two companions spawned by the urban characters behaviour.
    #[must_use]
    pub fn spawn_frequency_weeks(world: &World) -> f32 {
        world.urban.spawn_frequency_weeks
    }

    /// Weeks a settlement waits before hosting another placed companion.
    #[must_use]
    pub fn settlement_cooldown_weeks(world: &World) -> f32 {
        world.urban.settlement_cooldown_weeks
    }

    /// Cached last-seen record of a hero.
    #[must_use]
    pub fn cached_last_seen(world: &World, hero: HeroId) -> Option<LastSeenRecord> {
        world.hero_ref(hero).and_then(|hero| hero.cached_last_seen)
    }

    /// Messages shown on the player's message channel, oldest first.
    #[must_use]
    pub fn messages(world: &World) -> &[String] {
        &world.messages
    }

    /// Number of days elapsed since the campaign started.
    #[must_use]
    pub fn day(world: &World) -> u32 {
        world.day
    }
}

#[derive(Clone, Debug)]
struct Hero {
    id: HeroId,
    is_wanderer: bool,
    is_human_player: bool,
    template: Option<TemplateId>,
    companion_of: Option<ClanId>,
    state: HeroState,
    staying_in: Option<SettlementId>,
    home: Option<SettlementId>,
    last_seen_place: Option<SettlementId>,
    cached_last_seen: Option<LastSeenRecord>,
}

impl Hero {
    fn player() -> Self {
        Self {
            id: PLAYER_HERO,
            is_wanderer: false,
            is_human_player: true,
            template: None,
            companion_of: None,
            state: HeroState::Active,
            staying_in: None,
            home: None,
            last_seen_place: None,
            cached_last_seen: None,
        }
    }

    fn snapshot(&self) -> HeroSnapshot {
        HeroSnapshot {
            id: self.id,
            is_wanderer: self.is_wanderer,
            is_human_player: self.is_human_player,
            companion_of: self.companion_of,
            state: self.state,
            staying_in_settlement: self.staying_in,
            home_settlement: self.home,
            last_seen_place: self.last_seen_place,
        }
    }
}

#[derive(Clone, Debug)]
struct Clan {
    id: ClanId,
    tier: u32,
}

#[derive(Clone, Debug)]
struct Settlement {
    id: SettlementId,
    notables: Vec<HeroId>,
    last_companion_week: Option<u32>,
}

impl Settlement {
    fn new(id: SettlementId) -> Self {
        Self {
            id,
            notables: Vec::new(),
            last_companion_week: None,
        }
    }
}

#[derive(Clone, Debug)]
struct UrbanCharacters {
    pending_templates: Vec<TemplateId>,
    companion_templates: Vec<TemplateId>,
    companions: Vec<HeroId>,
    target_companion_number: f32,
    spawn_frequency_weeks: f32,
    settlement_cooldown_weeks: f32,
    weeks_since_spawn: f32,
}

#[derive(Clone, Debug, Default)]
struct LastSeenUpdater {
    heroes_to_check: Vec<HeroId>,
}
