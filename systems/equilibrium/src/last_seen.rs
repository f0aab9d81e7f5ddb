//! Corrects the last-seen records the host caches for wanderers that were never placed.
//!
//! On every player settlement entry the host's tracker caches the home
//! settlement of an unplaced wanderer with `is_nearby = false`, which reads
//! as "last seen at" a place the wanderer never visited. The patch rewrites
//! those records with `is_nearby = true`.

use tracing::{debug, warn};
use wanderer_tweaks_core::{CampaignContext, Command, FieldSlot, FieldValue, HeroId};

pub(crate) fn patch<C>(
    campaign: &C,
    heroes_to_check: FieldSlot,
    entrant: Option<HeroId>,
    out: &mut Vec<Command>,
) where
    C: CampaignContext + ?Sized,
{
    // The host broadcasts some entries without a leading hero.
    let entrant_is_player = entrant
        .and_then(|id| campaign.hero(id))
        .is_some_and(|hero| hero.is_human_player);
    if !entrant_is_player {
        return;
    }

    let Some(FieldValue::Heroes(heroes)) = campaign.field(heroes_to_check) else {
        warn!(slot = heroes_to_check.index(), "tracked hero list unavailable");
        return;
    };

    let mut patched = 0usize;
    for hero in heroes.iter().filter_map(|id| campaign.hero(*id)) {
        if !hero.is_wanderer || !hero.is_not_spawned() {
            continue;
        }
        let Some(settlement) = hero.last_seen_place.or(hero.home_settlement) else {
            continue;
        };
        out.push(Command::CacheLastSeen {
            hero: hero.id,
            settlement,
            is_nearby: true,
        });
        patched += 1;
    }

    debug!(patched, "last-seen records patched");
}
