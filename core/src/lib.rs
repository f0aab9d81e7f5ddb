#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wanderer Tweaks campaign controller.
//!
//! This crate defines the message surface that connects the campaign host and
//! the systems installed into it. Systems receive [`Event`] values broadcast by
//! the host, inspect host state through the read-only [`CampaignContext`]
//! handle, and respond exclusively with [`Command`] values that the host
//! executes through its `apply` entry point.
//!
//! Some host state is not part of its public surface. The host publishes such
//! state through a name-keyed field table ([`CampaignContext::lookup_field`]).
//! A lookup yields a [`FieldSlot`] that can be dereferenced cheaply afterwards
//! with [`CampaignContext::field`], so systems resolve names once and never on
//! hot paths.

use serde::{Deserialize, Serialize};

/// Unique identifier assigned to a hero.
///
/// The host allocates identifiers in increasing order, so comparing two ids
/// compares the creation time of their heroes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeroId(u32);

impl HeroId {
    /// Creates a new hero identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for HeroId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hero#{}", self.0)
    }
}

/// Identifier of a character template companions are created from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(u32);

impl TemplateId {
    /// Creates a new template identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a settlement (town, castle or village).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SettlementId(u32);

impl SettlementId {
    /// Creates a new settlement identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a clan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClanId(u32);

impl ClanId {
    /// Creates a new clan identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a mobile party travelling the campaign map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyId(u32);

impl PartyId {
    /// Creates a new party identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Lifecycle state of a hero as tracked by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroState {
    /// Created but not yet placed anywhere in the world.
    NotSpawned,
    /// Placed in the world and taking part in the simulation.
    Active,
    /// Removed from play without being killed.
    Disabled,
    /// Dead.
    Dead,
}

/// Host behaviours that publish part of their internal state by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Behavior {
    /// Behaviour that spawns wanderers and places them into settlements.
    UrbanCharacters,
    /// Behaviour that maintains cached last-seen records for heroes.
    HeroLastSeenUpdater,
}

/// Resolved handle to a named host field.
///
/// Slots are opaque: only the host that produced one knows what it refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldSlot(u16);

impl FieldSlot {
    /// Creates a slot wrapping the provided host-specific index.
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Host-specific index wrapped by the slot.
    #[must_use]
    pub const fn index(&self) -> u16 {
        self.0
    }
}

/// Borrowed value of a named host field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue<'a> {
    /// Scalar tuning parameter.
    Float(f32),
    /// List of character templates.
    Templates(&'a [TemplateId]),
    /// List of heroes.
    Heroes(&'a [HeroId]),
}

impl FieldValue<'_> {
    /// Shape of the value, used to validate bindings.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Float(_) => FieldKind::Float,
            Self::Templates(_) => FieldKind::Templates,
            Self::Heroes(_) => FieldKind::Heroes,
        }
    }
}

/// Shape of a named host field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Scalar tuning parameter.
    Float,
    /// List of character templates.
    Templates,
    /// List of heroes.
    Heroes,
}

/// Commands that express all permissible campaign mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Launches the campaign session, completing the host's late initialization.
    LaunchSession,
    /// Advances the campaign calendar by one day.
    AdvanceDay,
    /// Moves a party into a settlement.
    EnterSettlement {
        /// Party entering the settlement.
        party: PartyId,
        /// Settlement being entered.
        settlement: SettlementId,
        /// Hero leading the party, if the host knows one.
        hero: Option<HeroId>,
    },
    /// Raises the tier of a clan by one.
    IncreaseClanTier {
        /// Clan being promoted.
        clan: ClanId,
    },
    /// Hires a wanderer as a companion of a clan.
    RecruitCompanion {
        /// Wanderer being hired.
        hero: HeroId,
        /// Clan the wanderer joins.
        clan: ClanId,
    },
    /// Requests that the urban characters behaviour create a companion.
    CreateCompanion {
        /// Template the companion is created from.
        template: TemplateId,
    },
    /// Moves a hero into a new lifecycle state.
    ChangeHeroState {
        /// Hero being updated.
        hero: HeroId,
        /// State the hero enters.
        state: HeroState,
    },
    /// Makes a single hero leave the settlement it is staying in.
    LeaveSettlement {
        /// Hero leaving the settlement.
        hero: HeroId,
    },
    /// Kills a hero by removing it from play.
    KillByRemove {
        /// Hero being removed.
        hero: HeroId,
    },
    /// Overwrites a scalar host field.
    WriteFloatField {
        /// Slot previously resolved through the field table.
        slot: FieldSlot,
        /// Value written into the field.
        value: f32,
    },
    /// Removes a hero from a hero list host field.
    RemoveFromHeroList {
        /// Slot previously resolved through the field table.
        slot: FieldSlot,
        /// Hero removed from the list.
        hero: HeroId,
    },
    /// Overwrites the cached last-seen record of a hero.
    CacheLastSeen {
        /// Hero whose record is overwritten.
        hero: HeroId,
        /// Settlement the hero was last seen at or near.
        settlement: SettlementId,
        /// Whether the hero was seen near the settlement rather than in it.
        is_nearby: bool,
    },
    /// Shows a message on the player's message channel.
    DisplayMessage {
        /// Message text.
        text: String,
    },
}

/// Events broadcast by the host after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The session finished its late initialization phase.
    SessionLaunched,
    /// A campaign day elapsed.
    DailyTick,
    /// A campaign week elapsed.
    WeeklyTick,
    /// A hero was created.
    HeroCreated {
        /// Newly created hero.
        hero: HeroId,
        /// Whether the hero was born rather than created by a behaviour.
        is_natural: bool,
    },
    /// A hero was killed.
    HeroKilled {
        /// Hero that died.
        hero: HeroId,
    },
    /// A clan reached a new tier.
    ClanTierIncreased {
        /// Clan that was promoted.
        clan: ClanId,
        /// Tier reached by the clan.
        tier: u32,
    },
    /// A party entered a settlement.
    ///
    /// The host may broadcast this event without a leading hero.
    SettlementEntered {
        /// Party that entered the settlement.
        party: PartyId,
        /// Settlement that was entered.
        settlement: SettlementId,
        /// Hero leading the party, if any.
        hero: Option<HeroId>,
    },
    /// A hero left the settlement it was staying in.
    SettlementLeft {
        /// Hero that left.
        hero: HeroId,
        /// Settlement that was left.
        settlement: SettlementId,
    },
}

impl Event {
    /// Kind of the event, used for subscription checks.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::SessionLaunched => EventKind::SessionLaunched,
            Self::DailyTick => EventKind::DailyTick,
            Self::WeeklyTick => EventKind::WeeklyTick,
            Self::HeroCreated { .. } => EventKind::HeroCreated,
            Self::HeroKilled { .. } => EventKind::HeroKilled,
            Self::ClanTierIncreased { .. } => EventKind::ClanTierIncreased,
            Self::SettlementEntered { .. } => EventKind::SettlementEntered,
            Self::SettlementLeft { .. } => EventKind::SettlementLeft,
        }
    }
}

/// Payload-free discriminant of [`Event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// See [`Event::SessionLaunched`].
    SessionLaunched,
    /// See [`Event::DailyTick`].
    DailyTick,
    /// See [`Event::WeeklyTick`].
    WeeklyTick,
    /// See [`Event::HeroCreated`].
    HeroCreated,
    /// See [`Event::HeroKilled`].
    HeroKilled,
    /// See [`Event::ClanTierIncreased`].
    ClanTierIncreased,
    /// See [`Event::SettlementEntered`].
    SettlementEntered,
    /// See [`Event::SettlementLeft`].
    SettlementLeft,
}

/// Immutable representation of a single hero's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeroSnapshot {
    /// Unique identifier assigned to the hero.
    pub id: HeroId,
    /// Whether the hero is a recruitable wanderer.
    pub is_wanderer: bool,
    /// Whether the hero is controlled by the human player.
    pub is_human_player: bool,
    /// Clan the hero serves as a companion, if any.
    pub companion_of: Option<ClanId>,
    /// Lifecycle state of the hero.
    pub state: HeroState,
    /// Settlement the hero currently stays in as a notable guest.
    pub staying_in_settlement: Option<SettlementId>,
    /// Settlement the hero calls home.
    pub home_settlement: Option<SettlementId>,
    /// Settlement the hero was last observed at.
    pub last_seen_place: Option<SettlementId>,
}

impl HeroSnapshot {
    /// Reports whether the hero is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.state == HeroState::Dead
    }

    /// Reports whether the hero is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    /// Reports whether the hero has been disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.state == HeroState::Disabled
    }

    /// Reports whether the hero has not been placed into the world yet.
    #[must_use]
    pub fn is_not_spawned(&self) -> bool {
        self.state == HeroState::NotSpawned
    }

    /// Wanderer that nobody hired and that is neither disabled nor dead.
    #[must_use]
    pub fn is_available_wanderer(&self) -> bool {
        self.is_wanderer && self.companion_of.is_none() && !self.is_disabled() && !self.is_dead()
    }
}

/// Read-only snapshot describing every hero known to the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeroView {
    snapshots: Vec<HeroSnapshot>,
}

impl HeroView {
    /// Creates a new hero view from the provided snapshots.
    ///
    /// Snapshots are ordered by id, which is creation order.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<HeroSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots, oldest hero first.
    pub fn iter(&self) -> impl Iterator<Item = &HeroSnapshot> {
        self.snapshots.iter()
    }

    /// Number of heroes captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no heroes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<HeroSnapshot> {
        self.snapshots
    }
}

/// Read-only handle onto the running campaign.
///
/// Systems receive the handle on every call instead of holding on to it, so
/// the host stays free to mutate itself between dispatches.
pub trait CampaignContext {
    /// Captures every hero known to the campaign, oldest first.
    fn heroes(&self) -> HeroView;

    /// Captures a single hero.
    fn hero(&self, id: HeroId) -> Option<HeroSnapshot>;

    /// Clan controlled by the human player.
    fn player_clan(&self) -> ClanId;

    /// Current tier of a clan; unknown clans report tier zero.
    fn clan_tier(&self, clan: ClanId) -> u32;

    /// Resolves a named field of a host behaviour.
    ///
    /// This is the slow path: callers are expected to resolve each name once
    /// and keep the returned slot.
    fn lookup_field(&self, behavior: Behavior, name: &str) -> Option<FieldSlot>;

    /// Reads a previously resolved field.
    fn field(&self, slot: FieldSlot) -> Option<FieldValue<'_>>;
}

#[cfg(test)]
mod tests {
    use super::{
        ClanId, Event, EventKind, FieldKind, FieldValue, HeroId, HeroSnapshot, HeroState,
        HeroView, SettlementId, TemplateId,
    };

    fn wanderer(id: u32, state: HeroState) -> HeroSnapshot {
        HeroSnapshot {
            id: HeroId::new(id),
            is_wanderer: true,
            is_human_player: false,
            companion_of: None,
            state,
            staying_in_settlement: None,
            home_settlement: Some(SettlementId::new(0)),
            last_seen_place: None,
        }
    }

    #[test]
    fn available_wanderer_requires_every_condition() {
        assert!(wanderer(1, HeroState::Active).is_available_wanderer());
        assert!(wanderer(1, HeroState::NotSpawned).is_available_wanderer());
        assert!(!wanderer(1, HeroState::Disabled).is_available_wanderer());
        assert!(!wanderer(1, HeroState::Dead).is_available_wanderer());

        let mut hired = wanderer(1, HeroState::Active);
        hired.companion_of = Some(ClanId::new(0));
        assert!(!hired.is_available_wanderer());

        let mut lord = wanderer(1, HeroState::Active);
        lord.is_wanderer = false;
        assert!(!lord.is_available_wanderer());
    }

    #[test]
    fn hero_view_orders_by_creation() {
        let view = HeroView::from_snapshots(vec![
            wanderer(7, HeroState::Active),
            wanderer(2, HeroState::Active),
            wanderer(4, HeroState::NotSpawned),
        ]);
        assert_eq!(view.len(), 3);
        let ids: Vec<u32> = view.into_vec().iter().map(|hero| hero.id.get()).collect();
        assert_eq!(ids, vec![2, 4, 7]);
    }

    #[test]
    fn field_value_reports_its_shape() {
        let templates = [TemplateId::new(1)];
        let heroes = [HeroId::new(3)];
        assert_eq!(FieldValue::Float(2.0).kind(), FieldKind::Float);
        assert_eq!(
            FieldValue::Templates(&templates).kind(),
            FieldKind::Templates
        );
        assert_eq!(FieldValue::Heroes(&heroes).kind(), FieldKind::Heroes);
    }

    #[test]
    fn event_kind_ignores_payload() {
        let with_hero = Event::SettlementEntered {
            party: super::PartyId::new(0),
            settlement: SettlementId::new(1),
            hero: Some(HeroId::new(0)),
        };
        let without_hero = Event::SettlementEntered {
            party: super::PartyId::new(0),
            settlement: SettlementId::new(1),
            hero: None,
        };
        assert_eq!(with_hero.kind(), EventKind::SettlementEntered);
        assert_eq!(with_hero.kind(), without_hero.kind());
    }

    #[test]
    fn hero_state_reads_from_snake_case_toml() {
        #[derive(serde::Deserialize)]
        struct Entry {
            state: HeroState,
        }

        let entry: Entry = toml::from_str("state = \"not_spawned\"").expect("parse");
        assert_eq!(entry.state, HeroState::NotSpawned);
    }
}
