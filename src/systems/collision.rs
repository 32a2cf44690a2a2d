use bevy_ecs::{
    entity::Entity,
    event::EventWriter,
    query::{With, Without},
    system::{Query, Res, ResMut},
};
use tracing::{debug, info};

use crate::ghost::state::{ContactOutcome, GhostEnv, GhostMachine, GhostZones};
use crate::map::grid::Grid;
use crate::movement::stepper::AgentMotion;
use crate::movement::tween::Tweener;
use crate::power::PowerTimer;
use crate::systems::components::{Frozen, GameClock, LevelSettings, PlayerControlled};
use crate::systems::events::PlayerCaught;

/// Resolves touches between the player and ghosts.
///
/// Two agents touch when their world positions are closer than the contact radius.
/// At most one catch is reported per tick.
#[allow(clippy::too_many_arguments)]
pub fn contact_system(
    grid: Res<Grid>,
    zones: Res<GhostZones>,
    settings: Res<LevelSettings>,
    clock: Res<GameClock>,
    timer: Res<PowerTimer>,
    mut tweener: ResMut<Tweener>,
    players: Query<&AgentMotion, (With<PlayerControlled>, Without<Frozen>)>,
    mut ghosts: Query<(Entity, &mut GhostMachine, &mut AgentMotion), Without<PlayerControlled>>,
    mut caught: EventWriter<PlayerCaught>,
) {
    let radius = settings.0.contact_radius * grid.cell_size();
    let mut env = GhostEnv {
        grid: &grid,
        zones: &zones,
        tweener: &mut tweener,
        now: clock.elapsed,
        power_remaining: timer.remaining(),
        recover_threshold: timer.recover_threshold(),
    };

    for player in players.iter() {
        for (entity, mut machine, mut motion) in ghosts.iter_mut() {
            if player.position.distance(motion.position) >= radius {
                continue;
            }
            match machine.on_player_contact(&mut env, entity, &mut motion) {
                ContactOutcome::GhostEaten { points } => {
                    debug!(ghost = ?entity, points, "Ghost eaten");
                }
                ContactOutcome::PlayerCaught => {
                    info!(ghost = ?entity, "Player caught");
                    caught.write(PlayerCaught { ghost: entity });
                    return;
                }
                ContactOutcome::Ignored => {}
            }
        }
    }
}
