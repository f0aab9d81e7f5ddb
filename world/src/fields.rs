//! Name-keyed table exposing behaviour internals that are not part of the public query surface.

use crate::World;
use wanderer_tweaks_core::{Behavior, FieldSlot, FieldValue, HeroId};

const COMPANION_TEMPLATES: FieldSlot = FieldSlot::new(0);
const COMPANIONS: FieldSlot = FieldSlot::new(1);
const TARGET_COMPANION_NUMBER: FieldSlot = FieldSlot::new(2);
const SPAWN_FREQUENCY: FieldSlot = FieldSlot::new(3);
const SETTLEMENT_COOLDOWN: FieldSlot = FieldSlot::new(4);
const HEROES_TO_CHECK: FieldSlot = FieldSlot::new(5);

const FIELD_TABLE: [(Behavior, &str, FieldSlot); 6] = [
    (
        Behavior::UrbanCharacters,
        "companion_templates",
        COMPANION_TEMPLATES,
    ),
    (Behavior::UrbanCharacters, "companions", COMPANIONS),
    (
        Behavior::UrbanCharacters,
        "target_companion_number",
        TARGET_COMPANION_NUMBER,
    ),
    (
        Behavior::UrbanCharacters,
        "random_companion_spawn_frequency_in_weeks",
        SPAWN_FREQUENCY,
    ),
    (
        Behavior::UrbanCharacters,
        "companion_spawn_cooldown_for_settlement_in_weeks",
        SETTLEMENT_COOLDOWN,
    ),
    (
        Behavior::HeroLastSeenUpdater,
        "heroes_to_check",
        HEROES_TO_CHECK,
    ),
];

/// Resolves a behaviour field by name.
pub(crate) fn lookup(behavior: Behavior, name: &str) -> Option<FieldSlot> {
    FIELD_TABLE
        .iter()
        .find(|(owner, field, _)| *owner == behavior && *field == name)
        .map(|(_, _, slot)| *slot)
}

/// Reads the field behind a resolved slot.
pub(crate) fn read(world: &World, slot: FieldSlot) -> Option<FieldValue<'_>> {
    let urban = &world.urban;
    let value = match slot {
        COMPANION_TEMPLATES => FieldValue::Templates(&urban.companion_templates),
        COMPANIONS => FieldValue::Heroes(&urban.companions),
        TARGET_COMPANION_NUMBER => FieldValue::Float(urban.target_companion_number),
        SPAWN_FREQUENCY => FieldValue::Float(urban.spawn_frequency_weeks),
        SETTLEMENT_COOLDOWN => FieldValue::Float(urban.settlement_cooldown_weeks),
        HEROES_TO_CHECK => FieldValue::Heroes(&world.last_seen.heroes_to_check),
        _ => return None,
    };
    Some(value)
}

/// Overwrites a scalar field. Returns `false` when the slot is not a scalar.
pub(crate) fn write_float(world: &mut World, slot: FieldSlot, value: f32) -> bool {
    let urban = &mut world.urban;
    let field = match slot {
        TARGET_COMPANION_NUMBER => &mut urban.target_companion_number,
        SPAWN_FREQUENCY => &mut urban.spawn_frequency_weeks,
        SETTLEMENT_COOLDOWN => &mut urban.settlement_cooldown_weeks,
        _ => return false,
    };
    *field = value;
    true
}

/// Mutable access to a hero list field.
pub(crate) fn hero_list_mut(world: &mut World, slot: FieldSlot) -> Option<&mut Vec<HeroId>> {
    match slot {
        COMPANIONS => Some(&mut world.urban.companions),
        HEROES_TO_CHECK => Some(&mut world.last_seen.heroes_to_check),
        _ => None,
    }
}
