use bevy_ecs::{
    entity::Entity,
    event::EventWriter,
    query::{With, Without},
    system::{Query, Res, ResMut},
};
use tracing::trace;

use crate::ghost::policy::{GhostPilot, PilotEnv};
use crate::ghost::state::{GhostEnv, GhostMachine, GhostSignal, GhostZones};
use crate::map::grid::Grid;
use crate::movement::stepper::AgentMotion;
use crate::movement::tween::Tweener;
use crate::power::PowerTimer;
use crate::systems::components::{GameClock, GameRng, PlayerControlled, ScoreResource};
use crate::systems::events::GhostEvent;

/// Advances each ghost's forced routes: leaving the house and returning after death.
pub fn ghost_state_system(
    grid: Res<Grid>,
    zones: Res<GhostZones>,
    clock: Res<GameClock>,
    timer: Res<PowerTimer>,
    mut tweener: ResMut<Tweener>,
    mut ghosts: Query<(Entity, &mut GhostMachine, &mut AgentMotion)>,
) {
    let mut env = GhostEnv {
        grid: &grid,
        zones: &zones,
        tweener: &mut tweener,
        now: clock.elapsed,
        power_remaining: timer.remaining(),
        recover_threshold: timer.recover_threshold(),
    };
    for (entity, mut machine, mut motion) in ghosts.iter_mut() {
        machine.tick(&mut env, entity, &mut motion);
    }
}

/// Lets each roaming ghost pick its next step, using the player as the target.
pub fn ghost_ai_system(
    grid: Res<Grid>,
    clock: Res<GameClock>,
    mut tweener: ResMut<Tweener>,
    mut rng: ResMut<GameRng>,
    players: Query<&AgentMotion, With<PlayerControlled>>,
    mut ghosts: Query<(Entity, &mut GhostPilot, &mut GhostMachine, &mut AgentMotion), Without<PlayerControlled>>,
) {
    let target = players.iter().next().map(|motion| motion.position);
    let mut env = PilotEnv {
        grid: &grid,
        tweener: &mut tweener,
        now: clock.elapsed,
        target,
    };
    for (entity, mut pilot, mut machine, mut motion) in ghosts.iter_mut() {
        pilot.tick(&mut env, &mut machine, entity, &mut motion, &mut rng.0);
    }
}

/// Drains ghost signals into events, scoring eaten ghosts on the way.
pub fn ghost_signal_system(
    mut ghosts: Query<(Entity, &mut GhostMachine)>,
    mut score: ResMut<ScoreResource>,
    mut events: EventWriter<GhostEvent>,
) {
    for (entity, mut machine) in ghosts.iter_mut() {
        for signal in machine.take_signals() {
            if let GhostSignal::EnteredDead { points } = signal {
                score.0 += points;
                trace!(ghost = ?entity, points, total = score.0, "Ghost kill scored");
            }
            events.write(GhostEvent { ghost: entity, signal });
        }
    }
}
