use std::collections::HashSet;

use glam::{IVec2, Vec2};
use maze_chase::config::GhostConfig;
use maze_chase::constants::RAW_BOARD;
use maze_chase::ghost::policy::{
    candidate_directions, choose_relative, next_perimeter_direction, GhostPilot, MovementStyle, PilotEnv, StyleChoice,
};
use maze_chase::ghost::state::{ghost_speed, ContactOutcome, GhostMachine, GhostSignal, GhostState};
use maze_chase::map::direction::Direction;
use maze_chase::map::flags::AgentKind;
use maze_chase::movement::stepper::{AgentMotion, StepOutcome};
use maze_chase::power::{PowerPhase, PowerTimer};
use pretty_assertions::assert_eq;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use speculoos::prelude::*;
use strum::IntoEnumIterator;

mod common;

use common::GhostRig;

fn roaming_config() -> GhostConfig {
    GhostConfig {
        start_in_spawn: false,
        ..GhostConfig::default()
    }
}

mod state_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn double_enter_dead_has_no_effect() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(9, 10);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let mut machine = GhostMachine::new(&roaming_config(), 5.4, start);

        machine.start(&mut rig.env(), agent, &mut motion);
        machine.enter_scared(agent);
        machine.take_signals();

        assert!(machine.enter_dead(&mut rig.env(), agent, &mut motion));
        let tween = rig.tweener.get(agent).copied();

        assert!(!machine.enter_dead(&mut rig.env(), agent, &mut motion));
        assert_eq!(machine.state(), GhostState::Dead);
        assert_eq!(rig.tweener.get(agent).copied(), tween);

        let deaths = machine
            .take_signals()
            .into_iter()
            .filter(|signal| matches!(signal, GhostSignal::EnteredDead { .. }))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn spawn_ghost_walks_out_of_the_house() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(8, 7);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let mut machine = GhostMachine::new(&GhostConfig::default(), 5.4, start);

        machine.start(&mut rig.env(), agent, &mut motion);
        assert_eq!(machine.state(), GhostState::Spawn);
        assert_that(&machine.queued()).is_greater_than(0);
        assert!(machine.overrides_policy(&rig.tweener, agent));

        rig.run(2.0, &mut machine, agent, &mut motion);

        assert_eq!(machine.state(), GhostState::Normal);
        assert_eq!(motion.cell, IVec2::new(9, 9));
        assert!(!machine.overrides_policy(&rig.tweener, agent));
        assert_that(&machine.take_signals()).contains(GhostSignal::ExitedHouse);
    }

    #[test]
    fn spawn_exit_settles_into_power_state() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(8, 7);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let mut machine = GhostMachine::new(&GhostConfig::default(), 5.4, start);

        machine.start(&mut rig.env(), agent, &mut motion);
        rig.power_remaining = 8.0;
        rig.run(2.0, &mut machine, agent, &mut motion);

        assert_eq!(machine.state(), GhostState::Scared);
    }

    #[test]
    fn missing_exit_zone_starts_roaming() {
        let mut rig = GhostRig::new(common::grid_from(&common::CORRIDOR_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(5, 1);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let mut machine = GhostMachine::new(&GhostConfig::default(), 5.4, start);

        machine.start(&mut rig.env(), agent, &mut motion);

        assert_eq!(machine.state(), GhostState::Normal);
        assert!(!machine.overrides_policy(&rig.tweener, agent));
    }

    #[test]
    fn dead_ghost_returns_home_then_leaves() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(9, 10);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let mut machine = GhostMachine::new(&roaming_config(), 5.4, start);

        machine.start(&mut rig.env(), agent, &mut motion);
        machine.enter_scared(agent);
        machine.enter_dead(&mut rig.env(), agent, &mut motion);
        machine.take_signals();

        assert_eq!(motion.cell, IVec2::new(8, 8));
        let duration = rig.tweener.get(agent).map(|t| t.duration);
        assert_eq!(duration, Some(3.0));

        rig.run(2.9, &mut machine, agent, &mut motion);
        assert_eq!(machine.state(), GhostState::Dead);

        rig.run(2.0, &mut machine, agent, &mut motion);
        assert_eq!(machine.state(), GhostState::Normal);
        assert_eq!(motion.cell, IVec2::new(9, 9));

        let signals = machine.take_signals();
        assert_that(&signals).contains(GhostSignal::Respawned(GhostState::Normal));
        assert_that(&signals).contains(GhostSignal::ExitedHouse);
    }

    #[test]
    fn contact_outcomes_follow_state() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(9, 10);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let mut machine = GhostMachine::new(&roaming_config(), 5.4, start);
        machine.start(&mut rig.env(), agent, &mut motion);

        assert_eq!(
            machine.on_player_contact(&mut rig.env(), agent, &mut motion),
            ContactOutcome::PlayerCaught
        );

        machine.on_power(agent, PowerPhase::Started);
        assert_eq!(
            machine.on_player_contact(&mut rig.env(), agent, &mut motion),
            ContactOutcome::GhostEaten { points: 300 }
        );
        assert_eq!(
            machine.on_player_contact(&mut rig.env(), agent, &mut motion),
            ContactOutcome::Ignored
        );
    }

    #[test]
    fn frozen_ghost_ignores_transitions() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(9, 10);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let mut machine = GhostMachine::new(&roaming_config(), 5.4, start);
        machine.start(&mut rig.env(), agent, &mut motion);

        machine.freeze(&mut rig.tweener, agent);
        assert!(!machine.enter_scared(agent));
        assert!(!machine.enter_dead(&mut rig.env(), agent, &mut motion));
        assert_eq!(machine.state(), GhostState::Normal);

        machine.resume(&mut rig.env(), agent, &mut motion);
        assert!(machine.enter_scared(agent));
    }

    #[test]
    fn reset_returns_to_start_cell() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(10, 7);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let mut machine = GhostMachine::new(&GhostConfig::default(), 5.4, start);
        machine.start(&mut rig.env(), agent, &mut motion);
        rig.run(2.0, &mut machine, agent, &mut motion);
        assert_eq!(machine.state(), GhostState::Normal);

        machine.freeze(&mut rig.tweener, agent);
        machine.reset(&mut rig.env(), agent, &mut motion);

        assert_eq!(motion.cell, start);
        assert_eq!(machine.state(), GhostState::Spawn);
        assert!(!machine.is_frozen());
    }

    #[test]
    fn vulnerable_and_dead_ghosts_move_at_half_speed() {
        assert_eq!(ghost_speed(6.0, GhostState::Normal), 6.0);
        assert_eq!(ghost_speed(6.0, GhostState::Spawn), 6.0);
        assert_eq!(ghost_speed(6.0, GhostState::Scared), 3.0);
        assert_eq!(ghost_speed(6.0, GhostState::Recovering), 3.0);
        assert_eq!(ghost_speed(6.0, GhostState::Dead), 3.0);
    }
}

mod power_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn power_window_phases_at_seven_and_ten_seconds() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(9, 10);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let mut machine = GhostMachine::new(&roaming_config(), 5.4, start);
        machine.start(&mut rig.env(), agent, &mut motion);

        let mut timer = PowerTimer::new(10.0, 3.0);
        machine.on_power(agent, timer.start());
        assert_eq!(machine.state(), GhostState::Scared);

        let phases = timer.advance(7.0);
        assert_eq!(phases.as_slice(), &[PowerPhase::Warning]);
        for phase in phases {
            machine.on_power(agent, phase);
        }
        assert_eq!(machine.state(), GhostState::Recovering);

        let phases = timer.advance(3.0);
        assert_eq!(phases.as_slice(), &[PowerPhase::Ended]);
        for phase in phases {
            machine.on_power(agent, phase);
        }
        assert_eq!(machine.state(), GhostState::Normal);
        assert!(!timer.is_active());
    }

    #[test]
    fn restarting_power_rearms_the_warning() {
        let mut timer = PowerTimer::new(10.0, 3.0);
        timer.start();
        timer.advance(8.0);
        timer.start();
        assert_eq!(timer.remaining(), 10.0);
        assert_eq!(timer.advance(7.5).as_slice(), &[PowerPhase::Warning]);
    }

    #[test]
    fn dead_ghost_ignores_power_start() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(9, 10);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let mut machine = GhostMachine::new(&roaming_config(), 5.4, start);
        machine.start(&mut rig.env(), agent, &mut motion);
        machine.enter_scared(agent);
        machine.enter_dead(&mut rig.env(), agent, &mut motion);

        machine.on_power(agent, PowerPhase::Started);
        assert_eq!(machine.state(), GhostState::Dead);
    }
}

mod policy_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn toward_target_picks_a_strictly_closer_neighbor() {
        let grid = common::open_grid(6, 6);
        let cell = IVec2::ZERO;
        let target = grid.grid_to_world(IVec2::new(5, 5));
        let current = grid.grid_to_world(cell).distance(target);

        for seed in 0..32 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let candidates = candidate_directions(&grid, cell, Direction::Right, AgentKind::Ghost);
            let dir = choose_relative(&grid, cell, &candidates, target, false, &mut rng).expect("a direction");
            let next = grid.grid_to_world(cell + dir.as_ivec2()).distance(target);
            assert!(next < current, "seed {seed}: {dir:?} does not approach the target");
        }
    }

    #[test]
    fn away_from_target_never_approaches() {
        let grid = common::open_grid(6, 6);
        let cell = IVec2::new(2, 2);
        let target = grid.grid_to_world(IVec2::new(3, 2));
        let current = grid.grid_to_world(cell).distance(target);

        for seed in 0..32 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let candidates = candidate_directions(&grid, cell, Direction::Up, AgentKind::Ghost);
            let dir = choose_relative(&grid, cell, &candidates, target, true, &mut rng).unwrap();
            let next = grid.grid_to_world(cell + dir.as_ivec2()).distance(target);
            assert!(next >= current);
        }
    }

    #[test]
    fn reverse_only_when_it_is_the_only_way() {
        let grid = common::grid_from(&["#####", "#...#", "#####"]);
        let middle = candidate_directions(&grid, IVec2::new(2, 1), Direction::Right, AgentKind::Ghost);
        assert_eq!(middle.as_slice(), &[Direction::Right]);

        let dead_end = candidate_directions(&grid, IVec2::new(3, 1), Direction::Right, AgentKind::Ghost);
        assert_eq!(dead_end.as_slice(), &[Direction::Left]);
    }

    #[test]
    fn perimeter_prefers_right_turn() {
        let grid = common::open_grid(4, 4);
        // Heading up the left edge: a right turn would leave the perimeter, so keep going.
        assert_eq!(
            next_perimeter_direction(&grid, IVec2::new(0, 1), Direction::Up, AgentKind::Ghost),
            Some(Direction::Up)
        );
        // Top-left corner heading up: turn right along the top edge.
        assert_eq!(
            next_perimeter_direction(&grid, IVec2::new(0, 3), Direction::Up, AgentKind::Ghost),
            Some(Direction::Right)
        );
    }

    #[test]
    fn vulnerable_ghosts_flee_whatever_their_style() {
        let pilot = GhostPilot::new(&GhostConfig::default(), MovementStyle::Perimeter, 0.0);
        assert_eq!(pilot.effective_style(GhostState::Scared), MovementStyle::AwayFromTarget);
        assert_eq!(pilot.effective_style(GhostState::Recovering), MovementStyle::AwayFromTarget);
        assert_eq!(pilot.effective_style(GhostState::Normal), MovementStyle::Perimeter);
    }

    #[test]
    fn fixed_style_choice_is_kept() {
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(
            StyleChoice::Fixed(MovementStyle::SpeedBoost).resolve(&mut rng),
            MovementStyle::SpeedBoost
        );
    }

    #[test]
    fn pilot_waits_while_a_route_is_active() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(8, 7);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let config = GhostConfig::with_style(MovementStyle::Random);
        let mut machine = GhostMachine::new(&config, 5.4, start);
        let mut pilot = GhostPilot::new(&config, MovementStyle::Random, 0.0);
        let mut rng = SmallRng::seed_from_u64(1);

        machine.start(&mut rig.env(), agent, &mut motion);
        let mut env = PilotEnv {
            grid: &rig.grid,
            tweener: &mut rig.tweener,
            now: 1.0,
            target: Some(Vec2::ZERO),
        };
        assert_eq!(pilot.tick(&mut env, &mut machine, agent, &mut motion, &mut rng), None);
        assert_eq!(motion.cell, start);
    }

    #[test]
    fn perimeter_pilot_heads_for_the_ring() {
        let mut rig = GhostRig::new(common::grid_from(&RAW_BOARD));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(9, 10);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let config = GhostConfig {
            start_in_spawn: false,
            ..GhostConfig::with_style(MovementStyle::Perimeter)
        };
        let mut machine = GhostMachine::new(&config, 5.4, start);
        let mut pilot = GhostPilot::new(&config, MovementStyle::Perimeter, 0.0);
        let mut rng = SmallRng::seed_from_u64(1);
        machine.start(&mut rig.env(), agent, &mut motion);

        let mut reached = false;
        for _ in 0..600 {
            rig.now += common::FRAME;
            for sample in rig.tweener.update(rig.now) {
                motion.apply(&sample);
            }
            let mut env = PilotEnv {
                grid: &rig.grid,
                tweener: &mut rig.tweener,
                now: rig.now,
                target: None,
            };
            pilot.tick(&mut env, &mut machine, agent, &mut motion, &mut rng);
            if rig.grid.is_perimeter(motion.cell, AgentKind::Ghost) {
                reached = true;
                break;
            }
        }

        assert!(reached, "ghost never reached the perimeter");
    }

    /// A walled 9x9 room whose only interior wall is a single stub at (4, 4).
    const STUB_ROOM: [&str; 9] = [
        "#########",
        "#.......#",
        "#.......#",
        "#.......#",
        "#...#...#",
        "#.......#",
        "#.......#",
        "#.......#",
        "#########",
    ];

    fn roaming_pilot(style: MovementStyle, config: GhostConfig) -> (GhostMachine, GhostPilot) {
        let config = GhostConfig {
            start_in_spawn: false,
            style: StyleChoice::Fixed(style),
            ..config
        };
        (
            GhostMachine::new(&config, 5.4, IVec2::ZERO),
            GhostPilot::new(&config, style, 0.0),
        )
    }

    #[test]
    fn perimeter_walks_around_an_interior_stub() {
        let grid = common::grid_from(&STUB_ROOM);
        // Below the stub: straight is the wall, neither side is perimeter, so turn right.
        assert_eq!(
            next_perimeter_direction(&grid, IVec2::new(4, 3), Direction::Up, AgentKind::Ghost),
            Some(Direction::Right)
        );
    }

    #[test]
    fn perimeter_pilot_escapes_an_interior_stub() {
        let mut rig = GhostRig::new(common::grid_from(&STUB_ROOM));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(4, 2);
        let mut motion = AgentMotion::at(&rig.grid, start);
        motion.facing = Direction::Up;
        let (mut machine, mut pilot) = roaming_pilot(MovementStyle::Perimeter, GhostConfig::default());
        let mut rng = SmallRng::seed_from_u64(1);
        machine.start(&mut rig.env(), agent, &mut motion);

        let mut visited = HashSet::new();
        for _ in 0..600 {
            rig.now += common::FRAME;
            for sample in rig.tweener.update(rig.now) {
                motion.apply(&sample);
            }
            let mut env = PilotEnv {
                grid: &rig.grid,
                tweener: &mut rig.tweener,
                now: rig.now,
                target: None,
            };
            pilot.tick(&mut env, &mut machine, agent, &mut motion, &mut rng);
            visited.insert(motion.cell);
        }

        assert_that(&visited.len()).is_greater_than(10);
        assert!(visited.contains(&IVec2::new(7, 1)), "ghost never reached the outer wall: {visited:?}");
    }

    #[test]
    fn dash_snaps_to_a_walkable_cell_after_cooldown() {
        let mut rig = GhostRig::new(common::open_grid(7, 7));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let start = IVec2::new(3, 3);
        let mut motion = AgentMotion::at(&rig.grid, start);
        let config = GhostConfig {
            teleport_cooldown: 0.5,
            ..GhostConfig::default()
        };
        let (mut machine, mut pilot) = roaming_pilot(MovementStyle::RandomTeleport, config);
        let mut rng = SmallRng::seed_from_u64(9);
        machine.start(&mut rig.env(), agent, &mut motion);
        machine.take_signals();

        // Before the cooldown the ghost just wanders one step.
        let mut env = PilotEnv {
            grid: &rig.grid,
            tweener: &mut rig.tweener,
            now: 0.1,
            target: None,
        };
        let outcome = pilot.tick(&mut env, &mut machine, agent, &mut motion, &mut rng);
        assert!(matches!(outcome, Some(StepOutcome::Moved(_))), "{outcome:?}");
        assert!(rig.tweener.exists(agent));

        rig.tweener.cancel(agent);
        motion.position = rig.grid.grid_to_world(motion.cell);
        machine.take_signals();

        let mut env = PilotEnv {
            grid: &rig.grid,
            tweener: &mut rig.tweener,
            now: 0.6,
            target: None,
        };
        let outcome = pilot.tick(&mut env, &mut machine, agent, &mut motion, &mut rng);

        let Some(StepOutcome::Teleported { exit, .. }) = outcome else {
            panic!("expected a dash, got {outcome:?}");
        };
        assert_eq!(motion.cell, exit);
        assert_eq!(motion.position, rig.grid.grid_to_world(exit));
        assert!(rig.grid.is_walkable_for_ghost(exit));
        assert!(!rig.tweener.exists(agent));
        assert_that(&machine.take_signals()).contains(GhostSignal::Dashed(exit));
    }

    #[test]
    fn speed_burst_halves_step_time_until_it_expires() {
        let mut rig = GhostRig::new(common::open_grid(7, 7));
        let (_world, entities) = common::create_entities(1);
        let agent = entities[0];
        let center = IVec2::new(3, 3);
        let config = GhostConfig {
            boost_cooldown: 1.0,
            boost_duration: 0.5,
            boost_multiplier: 2.0,
            ..GhostConfig::default()
        };
        let (mut machine, mut pilot) = roaming_pilot(MovementStyle::SpeedBoost, config);
        let mut rng = SmallRng::seed_from_u64(4);
        let mut motion = AgentMotion::at(&rig.grid, center);
        machine.start(&mut rig.env(), agent, &mut motion);

        let mut step_duration = |rig: &mut GhostRig, pilot: &mut GhostPilot, now: f32| {
            let mut motion = AgentMotion::at(&rig.grid, center);
            let mut env = PilotEnv {
                grid: &rig.grid,
                tweener: &mut rig.tweener,
                now,
                target: None,
            };
            let outcome = pilot.tick(&mut env, &mut machine, agent, &mut motion, &mut rng);
            assert!(matches!(outcome, Some(StepOutcome::Moved(_))), "{outcome:?}");
            let duration = rig.tweener.get(agent).map(|tween| tween.duration).unwrap();
            rig.tweener.cancel(agent);
            duration
        };

        let normal = step_duration(&mut rig, &mut pilot, 0.5);
        assert!(!pilot.is_boosted());

        let boosted = step_duration(&mut rig, &mut pilot, 1.2);
        assert!(pilot.is_boosted());
        assert!((boosted - normal / 2.0).abs() < 1e-5, "boosted {boosted}, normal {normal}");

        // Past the burst, but still inside the next cooldown.
        let after = step_duration(&mut rig, &mut pilot, 1.9);
        assert!(!pilot.is_boosted());
        assert!((after - normal).abs() < 1e-5);
    }

    #[test]
    fn random_style_choice_resolves_to_several_styles() {
        let styles: HashSet<MovementStyle> = (0..64)
            .map(|seed| StyleChoice::Random.resolve(&mut SmallRng::seed_from_u64(seed)))
            .collect();

        for style in &styles {
            assert!(MovementStyle::iter().any(|known| known == *style));
        }
        assert_that(&styles.len()).is_greater_than(1);
    }
}
