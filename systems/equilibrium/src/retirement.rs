//! Safe retirement of surplus wanderers.

use serde::Deserialize;
use tracing::debug;
use wanderer_tweaks_core::{Command, FieldSlot, HeroSnapshot, HeroState, HeroView};

/// How surplus wanderers are taken out of the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetirementStrategy {
    /// Kill the wanderer by removal. The host's death hook detaches it from
    /// the companions list.
    #[default]
    Kill,
    /// Disable the wanderer and detach it from the companions list by hand.
    Disable,
}

/// Strategy paired with the host slots it needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Retirement {
    Kill,
    Disable { companions: FieldSlot },
}

/// Oldest available wanderers, at most `count` of them.
pub(crate) fn select_retirees(heroes: &HeroView, count: usize) -> Vec<HeroSnapshot> {
    heroes
        .iter()
        .filter(|hero| hero.is_available_wanderer())
        .take(count)
        .cloned()
        .collect()
}

/// Emits the commands retiring every provided hero.
pub(crate) fn retire(retirement: Retirement, retirees: &[HeroSnapshot], out: &mut Vec<Command>) {
    for hero in retirees {
        match retirement {
            Retirement::Kill => {
                leave_settlement(hero, out);
                out.push(Command::KillByRemove { hero: hero.id });
            }
            Retirement::Disable { companions } => {
                out.push(Command::ChangeHeroState {
                    hero: hero.id,
                    state: HeroState::Disabled,
                });
                leave_settlement(hero, out);
                out.push(Command::RemoveFromHeroList {
                    slot: companions,
                    hero: hero.id,
                });
                out.push(Command::DisplayMessage {
                    text: format!("\"Retired\" wanderer {}", hero.id),
                });
            }
        }
        debug!(hero = %hero.id, state = ?hero.state, "wanderer retired");
    }
}

// Removal does not evict the hero from the settlement's notables, so leave first.
// Wanderers that were never placed have nothing to leave.
fn leave_settlement(hero: &HeroSnapshot, out: &mut Vec<Command>) {
    if hero.staying_in_settlement.is_some() {
        out.push(Command::LeaveSettlement { hero: hero.id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wanderer_tweaks_core::{ClanId, HeroId, SettlementId};

    fn wanderer(id: u32) -> HeroSnapshot {
        HeroSnapshot {
            id: HeroId::new(id),
            is_wanderer: true,
            is_human_player: false,
            companion_of: None,
            state: HeroState::Active,
            staying_in_settlement: None,
            home_settlement: Some(SettlementId::new(0)),
            last_seen_place: None,
        }
    }

    #[test]
    fn selection_skips_untouchable_heroes() {
        let mut hired = wanderer(1);
        hired.companion_of = Some(ClanId::new(0));
        let mut disabled = wanderer(2);
        disabled.state = HeroState::Disabled;
        let mut dead = wanderer(3);
        dead.state = HeroState::Dead;
        let view = HeroView::from_snapshots(vec![
            wanderer(6),
            hired,
            disabled,
            dead,
            wanderer(5),
            wanderer(4),
        ]);

        let ids: Vec<u32> = select_retirees(&view, 2)
            .iter()
            .map(|hero| hero.id.get())
            .collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[test]
    fn selection_is_capped_by_eligible_heroes() {
        let view = HeroView::from_snapshots(vec![wanderer(3)]);
        assert_eq!(select_retirees(&view, 2).len(), 1);
        assert!(select_retirees(&HeroView::default(), 2).is_empty());
    }

    #[test]
    fn unplaced_wanderer_is_killed_without_leaving() {
        let mut limbo = wanderer(8);
        limbo.state = HeroState::NotSpawned;
        let mut out = Vec::new();
        retire(Retirement::Kill, &[limbo], &mut out);
        assert_eq!(
            out,
            vec![Command::KillByRemove {
                hero: HeroId::new(8)
            }]
        );
    }

    #[test]
    fn disable_strategy_detaches_by_hand() {
        let mut staying = wanderer(2);
        staying.staying_in_settlement = Some(SettlementId::new(1));
        let slot = FieldSlot::new(7);
        let mut out = Vec::new();
        retire(Retirement::Disable { companions: slot }, &[staying], &mut out);

        let hero = HeroId::new(2);
        assert_eq!(
            out,
            vec![
                Command::ChangeHeroState {
                    hero,
                    state: HeroState::Disabled,
                },
                Command::LeaveSettlement { hero },
                Command::RemoveFromHeroList { slot, hero },
                Command::DisplayMessage {
                    text: "\"Retired\" wanderer hero#2".to_owned(),
                },
            ]
        );
    }
}
