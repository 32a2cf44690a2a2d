use bevy_ecs::{
    entity::Entity,
    event::EventReader,
    query::{With, Without},
    system::{Query, Res, ResMut},
};
use tracing::trace;

use crate::map::grid::Grid;
use crate::movement::stepper::{AgentMotion, Mover};
use crate::movement::tween::Tweener;
use crate::player::PlayerMover;
use crate::systems::components::{Frozen, GameClock, PlayerControlled};
use crate::systems::events::GameCommand;

/// Applies queued input commands to the player.
pub fn player_control_system(
    mut commands: EventReader<GameCommand>,
    mut players: Query<&mut PlayerMover, With<PlayerControlled>>,
) {
    for command in commands.read() {
        match *command {
            GameCommand::MovePlayer(direction) => {
                for mut player in players.iter_mut() {
                    trace!(?direction, "Player input buffered");
                    player.steer(direction);
                }
            }
        }
    }
}

/// Starts the player's next step whenever the previous one has finished.
pub fn player_movement_system(
    grid: Res<Grid>,
    clock: Res<GameClock>,
    mut tweener: ResMut<Tweener>,
    mut players: Query<(Entity, &mut PlayerMover, &mut AgentMotion), (With<PlayerControlled>, Without<Frozen>)>,
) {
    let mut mover = Mover::new(&grid, &mut tweener, clock.elapsed);
    for (entity, mut player, mut motion) in players.iter_mut() {
        player.tick(&mut mover, entity, &mut motion);
    }
}
