//! Property tests for the health and death pipeline.
//!
//! Random sequences of damage, kills, state changes and ceiling changes are
//! applied to a player and an enemy spawned in a real world. After every
//! step health stays within its ceiling, zero health means dead, and each
//! entity has died at most once.

use glam::Vec2;
use proptest::prelude::*;
use skirmish_core::prelude::*;

#[derive(Debug, Clone)]
enum HealthOp {
    Damage(bool, u32),
    Kill(bool),
    SetState(bool, LifecycleState),
    SetMaxHealth(bool, u32),
    Update(bool),
}

fn state_strategy() -> impl Strategy<Value = LifecycleState> {
    prop_oneof![
        Just(LifecycleState::Idle),
        Just(LifecycleState::Moving),
        Just(LifecycleState::Attacking),
        Just(LifecycleState::Dead),
    ]
}

fn op_strategy() -> impl Strategy<Value = HealthOp> {
    prop_oneof![
        4 => (any::<bool>(), 0u32..70).prop_map(|(p, n)| HealthOp::Damage(p, n)),
        1 => any::<bool>().prop_map(HealthOp::Kill),
        2 => (any::<bool>(), state_strategy()).prop_map(|(p, s)| HealthOp::SetState(p, s)),
        2 => (any::<bool>(), 1u32..300).prop_map(|(p, n)| HealthOp::SetMaxHealth(p, n)),
        1 => any::<bool>().prop_map(HealthOp::Update),
    ]
}

fn sim_entity(world: &mut World, handle: EntityHandle) -> &mut dyn SimEntity {
    world
        .get_mut(handle)
        .expect("entities are never despawned here")
        .as_sim_mut()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn health_stays_clamped_and_death_fires_once(
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let mut world = World::new();
        let player = world.spawn(Player::new(Vec2::ZERO, PlayerConfig::default()));
        let enemy = world.spawn(EnemyAgent::new(Vec2::new(40.0, 0.0), &EnemyConfig::default()));
        let mut events = EventLog::new();

        for op in ops {
            let pick = |is_player: bool| if is_player { player } else { enemy };
            match op {
                HealthOp::Damage(p, amount) => {
                    let victim = world
                        .get_mut(pick(p))
                        .and_then(Entity::as_damageable_mut)
                        .expect("players and enemies take damage");
                    victim.take_damage(amount, &mut events);
                }
                HealthOp::Kill(p) => sim_entity(&mut world, pick(p)).kill(&mut events),
                HealthOp::SetState(p, state) => {
                    sim_entity(&mut world, pick(p)).set_state(state, &mut events);
                }
                HealthOp::SetMaxHealth(p, max) => {
                    sim_entity(&mut world, pick(p)).actor_mut().set_max_health(max);
                }
                HealthOp::Update(p) => {
                    sim_entity(&mut world, pick(p)).update(1.0 / 60.0, &mut events);
                }
            }

            for handle in [player, enemy] {
                let actor = world.get(handle).expect("still spawned").actor();
                let deaths = events.deaths().filter(|&e| e == handle).count();
                prop_assert!(actor.health() <= actor.max_health());
                prop_assert!(deaths <= 1, "{} died {} times", handle, deaths);
                if actor.health() == 0 {
                    prop_assert!(actor.is_dead(), "{} at zero health but {}", handle, actor.state());
                }
                prop_assert_eq!(actor.is_dead(), deaths == 1);
            }
        }
    }

    #[test]
    fn dead_actors_ignore_later_damage(
        first in 100u32..400,
        rest in prop::collection::vec(0u32..100, 0..10),
    ) {
        let mut player = Player::new(Vec2::ZERO, PlayerConfig::default());
        let mut events = EventLog::new();
        player.take_damage(first, &mut events);
        prop_assert!(player.actor().is_dead());
        let logged = events.len();

        for amount in rest {
            player.take_damage(amount, &mut events);
            prop_assert!(!player.accepts_damage());
        }
        prop_assert_eq!(events.len(), logged);
        prop_assert_eq!(player.actor().health(), 0);
    }
}
