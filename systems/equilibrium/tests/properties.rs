use proptest::prelude::*;
use wanderer_tweaks_core::Command;
use wanderer_tweaks_system_equilibrium::{CadenceLatch, Config, CountingLatch, Equilibrium};
use wanderer_tweaks_world::{self as world, query, CampaignSetup, WandererSeed, World};

#[derive(Clone, Copy, Debug)]
enum Step {
    Day,
    Promote,
    VisitSettlement(u32),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => Just(Step::Day),
        1 => Just(Step::Promote),
        1 => (0u32..4).prop_map(Step::VisitSettlement),
    ]
}

fn dispatch(world: &mut World, equilibrium: &mut Equilibrium, command: Command) {
    let mut pending = vec![command];
    while !pending.is_empty() {
        let mut events = Vec::new();
        for command in pending.drain(..) {
            world::apply(world, command, &mut events);
        }
        let mut commands = Vec::new();
        equilibrium
            .handle(&events, &*world, &mut commands)
            .expect("bindings resolve against the in-memory host");
        pending = commands;
    }
}

proptest! {
    #[test]
    fn target_counts_templates_plus_truncated_pool(
        template_count in 0u32..12,
        pool in 0.0f32..40.0,
        wanderers in 0usize..8,
    ) {
        let mut world = World::from_setup(CampaignSetup {
            template_count,
            target_companion_number: pool,
            wanderers: vec![WandererSeed::default(); wanderers],
            ..CampaignSetup::default()
        })
        .expect("valid setup");
        let mut equilibrium = Equilibrium::new(Config::default());

        dispatch(&mut world, &mut equilibrium, Command::LaunchSession);

        prop_assert_eq!(
            equilibrium.target_wanderer_count(),
            template_count as usize + pool.floor() as usize
        );
        prop_assert_eq!(equilibrium.available_wanderer_count(), wanderers);
    }

    #[test]
    fn latches_never_reopen(
        wanderers in 0usize..14,
        tier in 0u32..3,
        steps in prop::collection::vec(step(), 1..160),
    ) {
        let mut world = World::from_setup(CampaignSetup {
            player_clan_tier: tier,
            spawn_frequency_weeks: 1.0,
            wanderers: vec![WandererSeed::default(); wanderers],
            ..CampaignSetup::default()
        })
        .expect("valid setup");
        let mut equilibrium = Equilibrium::new(Config::default());
        dispatch(&mut world, &mut equilibrium, Command::LaunchSession);

        let mut latched_at: Option<usize> = None;
        let mut fast = false;
        for step in steps {
            let command = match step {
                Step::Day => Command::AdvanceDay,
                Step::Promote => Command::IncreaseClanTier { clan: query::player_clan(&world) },
                Step::VisitSettlement(settlement) => Command::EnterSettlement {
                    party: query::player_party(&world),
                    settlement: wanderer_tweaks_core::SettlementId::new(settlement),
                    hero: Some(query::player_hero(&world)),
                },
            };
            dispatch(&mut world, &mut equilibrium, command);

            match (latched_at, equilibrium.counting()) {
                (Some(count), latch) => {
                    prop_assert_eq!(latch, CountingLatch::Latched);
                    prop_assert_eq!(equilibrium.available_wanderer_count(), count);
                }
                (None, CountingLatch::Latched) => {
                    prop_assert!(equilibrium.shall_retire());
                    latched_at = Some(equilibrium.available_wanderer_count());
                }
                (None, CountingLatch::Counting) => {}
            }

            if fast {
                prop_assert_eq!(equilibrium.cadence(), CadenceLatch::Fast);
            }
            fast = equilibrium.cadence() == CadenceLatch::Fast;
        }
    }
}
