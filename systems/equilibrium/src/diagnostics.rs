//! Daily wanderer head count shown on the message channel.

use tracing::debug;
use wanderer_tweaks_core::{CampaignContext, Command, HeroView};

/// Wanderer counts at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WandererCensus {
    /// Wanderers ever created, dead ones included.
    pub total: usize,
    /// Wanderers still alive.
    pub alive: usize,
    /// Wanderers that are available and untouched.
    pub available: usize,
}

impl WandererCensus {
    /// Counts the wanderers captured by a hero view.
    #[must_use]
    pub fn take(heroes: &HeroView) -> Self {
        heroes
            .iter()
            .filter(|hero| hero.is_wanderer)
            .fold(Self::default(), |census, hero| Self {
                total: census.total + 1,
                alive: census.alive + usize::from(hero.is_alive()),
                available: census.available + usize::from(hero.is_available_wanderer()),
            })
    }

    /// Human-readable summary.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Equilibrium: wanderers available/alive/total={}/{}/{}",
            self.available, self.alive, self.total
        )
    }
}

pub(crate) fn report<C>(campaign: &C, out: &mut Vec<Command>)
where
    C: CampaignContext + ?Sized,
{
    let census = WandererCensus::take(&campaign.heroes());
    debug!(
        available = census.available,
        alive = census.alive,
        total = census.total,
        "wanderer census"
    );
    out.push(Command::DisplayMessage {
        text: census.message(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use wanderer_tweaks_core::{ClanId, HeroId, HeroSnapshot, HeroState};

    fn hero(id: u32, is_wanderer: bool, state: HeroState) -> HeroSnapshot {
        HeroSnapshot {
            id: HeroId::new(id),
            is_wanderer,
            is_human_player: false,
            companion_of: None,
            state,
            staying_in_settlement: None,
            home_settlement: None,
            last_seen_place: None,
        }
    }

    #[test]
    fn census_counts_only_wanderers() {
        let mut hired = hero(4, true, HeroState::Active);
        hired.companion_of = Some(ClanId::new(0));
        let view = HeroView::from_snapshots(vec![
            hero(0, false, HeroState::Active),
            hero(1, true, HeroState::Active),
            hero(2, true, HeroState::Dead),
            hero(3, true, HeroState::Disabled),
            hired,
        ]);

        let census = WandererCensus::take(&view);
        assert_eq!(
            census,
            WandererCensus {
                total: 4,
                alive: 3,
                available: 1,
            }
        );
        assert_eq!(
            census.message(),
            "Equilibrium: wanderers available/alive/total=1/3/4"
        );
    }
}
